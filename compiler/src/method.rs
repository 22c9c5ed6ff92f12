//! Method stubs: declared methods whose bodies are resolved against a header.
//!
//! A stub is created when a unit is declared and resolved exactly once per
//! compile, with the unit's [`Header`] as `self`. The body only ever sees
//! references, so the resolved form describes how to compute a result, not
//! a cached value.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::encode::{class_form, ToJson};
use crate::error::{CompileError, Result};
use crate::expr::{Expr, Ref};
use crate::header::Header;

/// The request method a stub answers to. Passed through to the host verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    /// Read-only.
    Get,
    /// Idempotent write.
    Put,
    /// Side-effecting call.
    Post,
    /// Removal.
    Delete,
}

impl Verb {
    /// The lowercase verb name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Put => "put",
            Self::Post => "post",
            Self::Delete => "delete",
        }
    }

    /// The class path of an op definition with this verb.
    #[must_use]
    pub fn path(self) -> String {
        format!("/state/scalar/op/{}", self.as_str())
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type Body = dyn Fn(&Header) -> Result<Expr> + Send + Sync;

/// A declared, unexecuted method.
#[derive(Clone)]
pub struct MethodStub {
    verb: Verb,
    params: Vec<String>,
    body: Arc<Body>,
}

impl MethodStub {
    /// Declares a method with the given verb, parameter names and body.
    pub fn new<I, P, F>(verb: Verb, params: I, body: F) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
        F: Fn(&Header) -> Result<Expr> + Send + Sync + 'static,
    {
        Self {
            verb,
            params: params.into_iter().map(Into::into).collect(),
            body: Arc::new(body),
        }
    }

    /// A parameterless GET method.
    pub fn get<F>(body: F) -> Self
    where
        F: Fn(&Header) -> Result<Expr> + Send + Sync + 'static,
    {
        Self::new(Verb::Get, Vec::<String>::new(), body)
    }

    /// A POST method taking the named parameters.
    pub fn post<I, P, F>(params: I, body: F) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
        F: Fn(&Header) -> Result<Expr> + Send + Sync + 'static,
    {
        Self::new(Verb::Post, params, body)
    }

    /// The request verb.
    #[must_use]
    pub fn verb(&self) -> Verb {
        self.verb
    }

    /// The declared parameter names.
    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Evaluates the body against `header` and encodes the resulting op definition
    /// as `{"/state/scalar/op/<verb>": [[params...], body]}`.
    ///
    /// # Errors
    ///
    /// - Propagates any error raised by the body, typically
    ///   [`CompileError::UnknownAttribute`].
    /// - [`CompileError::UnknownParameter`] if the body reads a parameter
    ///   the method does not declare.
    pub fn resolve(&self, header: &Header) -> Result<Value> {
        let body = (self.body)(header)?;

        if let Some(name) = body
            .refs()
            .into_iter()
            .filter_map(Ref::param_name)
            .find(|name| !self.params.iter().any(|p| p.as_str() == *name))
        {
            return Err(CompileError::UnknownParameter {
                unit: header.uri().clone(),
                name: name.to_owned(),
            });
        }

        let params = self.params.iter().cloned().map(Value::String).collect();
        Ok(class_form(
            self.verb.path(),
            Value::Array(vec![Value::Array(params), body.to_json()]),
        ))
    }
}

impl fmt::Debug for MethodStub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodStub")
            .field("verb", &self.verb)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Member;
    use crate::state::State;
    use serde_json::json;

    #[test]
    fn resolves_against_header_references() {
        let members = vec![("count".to_owned(), Member::from(State::from(0)))];
        let header = Header::build(&"/test/app".parse().unwrap(), &members).unwrap();

        let stub = MethodStub::get(|this| Ok(this.get("count")?.into()));
        assert_eq!(
            stub.resolve(&header).unwrap(),
            json!({"/state/scalar/op/get": [[], {"/test/app/count": []}]})
        );
    }

    #[test]
    fn passes_params_and_verb_through() {
        let header = Header::build(&"/test/app".parse().unwrap(), &[]).unwrap();
        let stub = MethodStub::new(Verb::Delete, ["key"], |_| Ok(Ref::param("key").into()));
        assert_eq!(stub.verb(), Verb::Delete);
        assert_eq!(
            stub.resolve(&header).unwrap(),
            json!({"/state/scalar/op/delete": [["key"], {"$key": []}]})
        );
    }

    #[test]
    fn body_errors_propagate() {
        let header = Header::build(&"/test/app".parse().unwrap(), &[]).unwrap();
        let stub = MethodStub::get(|this| Ok(this.get("missing")?.into()));
        assert!(matches!(
            stub.resolve(&header),
            Err(crate::CompileError::UnknownAttribute { .. })
        ));
    }

    #[test]
    fn undeclared_parameters_are_rejected() {
        let header = Header::build(&"/test/app".parse().unwrap(), &[]).unwrap();
        let stub = MethodStub::post(["x"], |_| {
            Ok(Expr::tuple([Ref::param("x"), Ref::param("y")]))
        });
        assert!(matches!(
            stub.resolve(&header),
            Err(CompileError::UnknownParameter { name, .. }) if name == "y"
        ));
    }
}
