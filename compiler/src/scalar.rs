//! Immutable, inert values.

use std::collections::BTreeMap;

use serde_json::{Map, Number, Value};

use crate::encode::{class_form, ToJson};
use crate::uri::Uri;

/// Class path under which a [`Scalar::Link`] is encoded.
pub const LINK_CLASS: &str = "/state/scalar/value/link";

/// An immutable value: a number, a string, a link, or a tuple or map of scalars.
///
/// Scalars may appear in any unit. They never change independently of
/// their declaration, so they never need a Chain.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// The absence of a value.
    None,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A floating-point number. Non-finite values encode as `null`.
    Float(f64),
    /// A string.
    String(String),
    /// An address of another entity.
    Link(Uri),
    /// An ordered tuple of scalars.
    Tuple(Vec<Scalar>),
    /// A map of scalars, keyed by name.
    Map(BTreeMap<String, Scalar>),
}

impl Scalar {
    /// Builds a tuple from anything convertible to scalars.
    pub fn tuple<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Scalar>,
    {
        Self::Tuple(items.into_iter().map(Into::into).collect())
    }

    /// Builds a map from `(name, value)` pairs.
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Scalar>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl ToJson for Scalar {
    fn to_json(&self) -> Value {
        match self {
            Self::None => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::from(*i),
            Self::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
            Self::String(s) => Value::String(s.clone()),
            Self::Link(uri) => class_form(LINK_CLASS, Value::String(uri.to_string())),
            Self::Tuple(items) => Value::Array(items.iter().map(ToJson::to_json).collect()),
            Self::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect::<Map<_, _>>(),
            ),
        }
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Scalar {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<u32> for Scalar {
    fn from(i: u32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Scalar {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Uri> for Scalar {
    fn from(uri: Uri) -> Self {
        Self::Link(uri)
    }
}

impl From<Vec<Scalar>> for Scalar {
    fn from(items: Vec<Scalar>) -> Self {
        Self::Tuple(items)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::None, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn encodes_primitives() {
        assert_eq!(Scalar::None.to_json(), Value::Null);
        assert_eq!(Scalar::from(true).to_json(), json!(true));
        assert_eq!(Scalar::from(25).to_json(), json!(25));
        assert_eq!(Scalar::from(0.1).to_json(), json!(0.1));
        assert_eq!(Scalar::from("relu").to_json(), json!("relu"));
        assert_eq!(Scalar::from(Option::<i64>::None), Scalar::None);
    }

    #[test]
    fn non_finite_floats_encode_as_null() {
        assert_eq!(Scalar::Float(f64::NAN).to_json(), Value::Null);
        assert_eq!(Scalar::Float(f64::INFINITY).to_json(), Value::Null);
    }

    #[test]
    fn encodes_links_as_class_form() {
        let link = Scalar::Link("/test/app".parse().unwrap());
        assert_eq!(
            link.to_json(),
            json!({"/state/scalar/value/link": "/test/app"})
        );
    }

    #[test]
    fn encodes_composites() {
        let column = Scalar::tuple([Scalar::from("email"), Scalar::from(250)]);
        assert_eq!(column.to_json(), json!(["email", 250]));

        let shape = Scalar::map([("weights", Scalar::tuple([2, 2])), ("bias", Scalar::tuple([2]))]);
        assert_eq!(shape.to_json(), json!({"weights": [2, 2], "bias": [2]}));
    }
}
