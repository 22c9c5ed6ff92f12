//! Reference expressions produced by method bodies.
//!
//! A method body never sees live data. It is handed a
//! [`Header`](crate::header::Header) whose attributes are [`Ref`]s, and it
//! returns an [`Expr`] tree describing how the host should compute the
//! result. The tree encodes directly to JSON:
//!
//! | Expression | JSON |
//! |------------|------|
//! | reference | `{"/test/app/net": []}` |
//! | parameter | `{"$inputs": []}` |
//! | GET | `{"<subject>": [key]}` |
//! | PUT | `{"<subject>": [key, value]}` |
//! | POST | `{"<subject>": {"param": ...}}` |
//! | conditional | `{"/state/scalar/ref/if": [cond, then, else]}` |

use std::fmt;

use serde_json::{Map, Value};

use crate::encode::{class_form, ToJson};
use crate::error::UriError;
use crate::scalar::Scalar;
use crate::uri::{Id, Uri};

/// Class path of a conditional expression.
pub const IF_CLASS: &str = "/state/scalar/ref/if";

/// What a [`Ref`] points at.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Subject {
    Link(Uri),
    Param(String, Vec<Id>),
}

/// An addressable pointer: an absolute URI or a method parameter, plus an
/// optional path into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ref {
    subject: Subject,
}

impl Ref {
    /// A reference to the entity at `uri`.
    #[must_use]
    pub fn to(uri: Uri) -> Self {
        Self {
            subject: Subject::Link(uri),
        }
    }

    /// A reference to the method parameter `name`.
    pub fn param(name: impl Into<String>) -> Self {
        Self {
            subject: Subject::Param(name.into(), Vec::new()),
        }
    }

    /// The URI this reference resolves to, or `None` for a parameter reference.
    #[must_use]
    pub fn uri(&self) -> Option<&Uri> {
        match &self.subject {
            Subject::Link(uri) => Some(uri),
            Subject::Param(..) => None,
        }
    }

    /// The parameter this reference reads, or `None` for a URI reference.
    #[must_use]
    pub fn param_name(&self) -> Option<&str> {
        match &self.subject {
            Subject::Param(name, _) => Some(name),
            Subject::Link(_) => None,
        }
    }

    /// A reference one path segment deeper, e.g. a method of the referenced entity.
    ///
    /// # Errors
    ///
    /// Returns [`UriError`] if `segment` is not a valid path segment.
    pub fn join(&self, segment: &str) -> Result<Self, UriError> {
        let segment: Id = segment.parse()?;
        let subject = match &self.subject {
            Subject::Link(uri) => Subject::Link(uri.append(&segment)),
            Subject::Param(name, path) => {
                let mut path = path.clone();
                path.push(segment);
                Subject::Param(name.clone(), path)
            }
        };

        Ok(Self { subject })
    }

    /// `GET subject[key]`.
    pub fn get(&self, key: impl Into<Expr>) -> Expr {
        Expr::Get {
            subject: self.clone(),
            key: Box::new(key.into()),
        }
    }

    /// `PUT subject[key] = value`.
    pub fn put(&self, key: impl Into<Expr>, value: impl Into<Expr>) -> Expr {
        Expr::Put {
            subject: self.clone(),
            key: Box::new(key.into()),
            value: Box::new(value.into()),
        }
    }

    /// `POST subject(params)`.
    pub fn post<I, K, V>(&self, params: I) -> Expr
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Expr>,
    {
        Expr::Post {
            subject: self.clone(),
            params: params
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subject {
            Subject::Link(uri) => fmt::Display::fmt(uri, f),
            Subject::Param(name, path) => {
                write!(f, "${name}")?;
                for segment in path {
                    write!(f, "/{segment}")?;
                }
                Ok(())
            }
        }
    }
}

/// A method body: an unevaluated expression over references and literals.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal value.
    Scalar(Scalar),
    /// A bare reference.
    Ref(Ref),
    /// Read from a subject.
    Get {
        /// What is read.
        subject: Ref,
        /// The key read.
        key: Box<Expr>,
    },
    /// Write to a subject.
    Put {
        /// What is written.
        subject: Ref,
        /// The key written.
        key: Box<Expr>,
        /// The value written.
        value: Box<Expr>,
    },
    /// Invoke a subject with named parameters.
    Post {
        /// What is invoked.
        subject: Ref,
        /// Parameters in declaration order.
        params: Vec<(String, Expr)>,
    },
    /// Choose between two branches.
    If {
        /// The condition.
        cond: Box<Expr>,
        /// Evaluated if the condition holds.
        then: Box<Expr>,
        /// Evaluated otherwise.
        or_else: Box<Expr>,
    },
    /// An ordered tuple of expressions.
    Tuple(Vec<Expr>),
}

impl Expr {
    /// Builds a conditional.
    pub fn cond(cond: impl Into<Expr>, then: impl Into<Expr>, or_else: impl Into<Expr>) -> Self {
        Self::If {
            cond: Box::new(cond.into()),
            then: Box::new(then.into()),
            or_else: Box::new(or_else.into()),
        }
    }

    /// Builds a tuple.
    pub fn tuple<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Expr>,
    {
        Self::Tuple(items.into_iter().map(Into::into).collect())
    }

    /// Every reference in this expression, depth first.
    #[must_use]
    pub fn refs(&self) -> Vec<&Ref> {
        let mut refs = Vec::new();
        self.collect_refs(&mut refs);
        refs
    }

    fn collect_refs<'a>(&'a self, refs: &mut Vec<&'a Ref>) {
        match self {
            Self::Scalar(_) => {}
            Self::Ref(r) => refs.push(r),
            Self::Get { subject, key } => {
                refs.push(subject);
                key.collect_refs(refs);
            }
            Self::Put {
                subject,
                key,
                value,
            } => {
                refs.push(subject);
                key.collect_refs(refs);
                value.collect_refs(refs);
            }
            Self::Post { subject, params } => {
                refs.push(subject);
                for (_, param) in params {
                    param.collect_refs(refs);
                }
            }
            Self::If {
                cond,
                then,
                or_else,
            } => {
                cond.collect_refs(refs);
                then.collect_refs(refs);
                or_else.collect_refs(refs);
            }
            Self::Tuple(items) => {
                for item in items {
                    item.collect_refs(refs);
                }
            }
        }
    }
}

impl ToJson for Expr {
    fn to_json(&self) -> Value {
        match self {
            Self::Scalar(scalar) => scalar.to_json(),
            Self::Ref(r) => class_form(r.to_string(), Value::Array(Vec::new())),
            Self::Get { subject, key } => {
                class_form(subject.to_string(), Value::Array(vec![key.to_json()]))
            }
            Self::Put {
                subject,
                key,
                value,
            } => class_form(
                subject.to_string(),
                Value::Array(vec![key.to_json(), value.to_json()]),
            ),
            Self::Post { subject, params } => {
                let params = params
                    .iter()
                    .map(|(name, value)| (name.clone(), value.to_json()))
                    .collect::<Map<_, _>>();
                class_form(subject.to_string(), Value::Object(params))
            }
            Self::If {
                cond,
                then,
                or_else,
            } => class_form(
                IF_CLASS,
                Value::Array(vec![cond.to_json(), then.to_json(), or_else.to_json()]),
            ),
            Self::Tuple(items) => Value::Array(items.iter().map(ToJson::to_json).collect()),
        }
    }
}

impl From<Ref> for Expr {
    fn from(r: Ref) -> Self {
        Self::Ref(r)
    }
}

impl From<Scalar> for Expr {
    fn from(scalar: Scalar) -> Self {
        Self::Scalar(scalar)
    }
}

macro_rules! expr_from_scalar {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Expr {
                fn from(value: $t) -> Self {
                    Self::Scalar(Scalar::from(value))
                }
            }
        )*
    };
}

expr_from_scalar!(bool, i32, i64, f64, &str, String);
