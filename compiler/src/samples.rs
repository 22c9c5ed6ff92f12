//! A catalog of reference units.
//!
//! These mirror the applications a host is typically tested against: a
//! neural-net App whose network lives in a Sync chain, an auth service App
//! exporting a `User` model, and a Library of layer models. The build client,
//! the crate example and the integration tests compile them.

use serde_json::json;

use crate::chain::Chain;
use crate::error::UriError;
use crate::expr::{Expr, Ref};
use crate::method::{MethodStub, Verb};
use crate::model::{App, Library, Member, Model, Unit};
use crate::scalar::Scalar;
use crate::state::{Collection, Instance};
use crate::uri::Uri;

/// The native base class of every catalog model.
const OBJECT: &str = "/state/object";

/// Hidden layer sizes and activations of the neural-net App.
const LAYERS: [(u32, u32, &str); 2] = [(2, 2, "relu"), (2, 1, "sigmoid")];

/// A neural-net App at `/test/app` whose network lives in a Sync chain.
///
/// # Errors
///
/// Returns [`UriError`] only if a built-in URI fails to parse.
pub fn neural_net_app() -> Result<App, UriError> {
    let mut net = Instance::new(OBJECT.parse()?);
    for (i, (input, output, activation)) in LAYERS.into_iter().enumerate() {
        let layer = Instance::new("/test/lib/ml/Layer".parse()?)
            .with("weights", Collection::dense(&[input, output], "f64"))
            .with("bias", Collection::dense(&[output], "f64"))
            .with("activation", activation);
        net = net.with(format!("layer_{i}"), layer);
    }

    Ok(App::new("/test/app".parse()?)
        .member("learning_rate", Scalar::from(0.1))
        .member("batch_size", Member::constant(json!(25)))
        .member("net", Chain::sync(net))
        .member("up", MethodStub::get(|_| Ok(true.into())))
        .member(
            "train",
            MethodStub::post(["inputs", "labels"], |this| {
                Ok(this.get("net")?.join("train")?.post([
                    ("inputs", Expr::from(Ref::param("inputs"))),
                    ("labels", Ref::param("labels").into()),
                    ("learning_rate", this.get("learning_rate")?.into()),
                ]))
            }),
        ))
}

/// The `User` model: a table row schema of `(name, type, max_len)` columns.
///
/// # Errors
///
/// Returns [`UriError`] only if a built-in URI fails to parse.
pub fn user_model() -> Result<Model, UriError> {
    Ok(Model::new("User")
        .subclass_of(OBJECT.parse()?)
        .member("schema", user_schema())
        .member(
            "display_name",
            MethodStub::get(|this| Ok(this.get("schema")?.get(Scalar::Int(0)))),
        ))
}

fn user_schema() -> Scalar {
    let column = |name: &str, dtype: &str| {
        Scalar::tuple([Scalar::from(name), Scalar::from(dtype), Scalar::from(250)])
    };

    Scalar::tuple([
        column("name", "/state/scalar/value/string"),
        column("email", "/state/scalar/value/email"),
        column("password_hash", "/state/scalar/value/id"),
    ])
}

/// An auth service App at `/test/auth` exporting [`user_model`].
///
/// # Errors
///
/// Returns [`UriError`] only if a built-in URI fails to parse.
pub fn auth_service() -> Result<App, UriError> {
    Ok(App::new("/test/auth".parse()?)
        .export(user_model()?)
        .member("users", Chain::block(Collection::table(user_schema())))
        .member(
            "create_user",
            MethodStub::post(["name", "email", "password"], |this| {
                let users = this.get("users")?;
                Ok(Expr::cond(
                    users.join("contains")?.post([("key", Ref::param("email"))]),
                    Scalar::from("an account already exists for this email"),
                    users.put(
                        Ref::param("email"),
                        Expr::tuple([Ref::param("name"), Ref::param("password").join("hash")?]),
                    ),
                ))
            }),
        )
        .member(
            "delete_user",
            MethodStub::new(Verb::Delete, ["email"], |this| {
                Ok(this.get("users")?.join("delete")?.post([("key", Ref::param("email"))]))
            }),
        ))
}

/// An ML Library at `/test/lib/ml` exporting a base `Layer` model, a
/// `ReluLayer` that extends it, and a `Sigmoid` activation.
///
/// # Errors
///
/// Returns [`UriError`] only if a built-in URI fails to parse.
pub fn ml_library() -> Result<Library, UriError> {
    let root: Uri = "/test/lib/ml".parse()?;

    let sigmoid = Model::new("Sigmoid")
        .subclass_of(OBJECT.parse()?)
        .member(
            "forward",
            MethodStub::post(["inputs"], |_| {
                Ok(Ref::param("inputs").join("sigmoid")?.into())
            }),
        )
        .member(
            "backward",
            MethodStub::post(["inputs"], |this| {
                Ok(this.get("forward")?.post([("inputs", Ref::param("inputs"))]))
            }),
        );

    let layer = Model::new("Layer")
        .at("/test/lib/ml/Layer".parse()?)
        .subclass_of(OBJECT.parse()?)
        .member("activation", Scalar::from("sigmoid"))
        .member(
            "forward",
            MethodStub::post(["x"], |this| {
                Ok(this.get("activation")?.join("forward")?.post([("inputs", Ref::param("x"))]))
            }),
        );

    let relu = Model::new("ReluLayer")
        .extends(&layer)
        .member("activation", Scalar::from("relu"))
        .member("leak", Scalar::from(0.0));

    Ok(Library::new(root)
        .member("version", Member::constant(json!("0.1.0")))
        .export(sigmoid)
        .export(layer)
        .export(relu))
}

/// Every catalog unit, in a fixed order.
///
/// # Errors
///
/// Returns [`UriError`] only if a built-in URI fails to parse.
pub fn catalog() -> Result<Vec<Box<dyn Unit>>, UriError> {
    Ok(vec![
        Box::new(neural_net_app()?) as Box<dyn Unit>,
        Box::new(auth_service()?),
        Box::new(ml_library()?),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile_with_diagnostics;

    #[test]
    fn catalog_compiles_cleanly() {
        for unit in catalog().unwrap() {
            let compilation = compile_with_diagnostics(unit.as_ref()).unwrap();
            assert_eq!(compilation.diagnostics.warning_count(), 0, "{}", compilation.document.key());
        }
    }

    #[test]
    fn catalog_addresses_are_distinct() {
        let units = catalog().unwrap();
        let mut uris: Vec<_> = units.iter().filter_map(|u| u.uri().cloned()).collect();
        uris.sort();
        uris.dedup();
        assert_eq!(uris.len(), units.len());
    }
}
