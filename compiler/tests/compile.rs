//! End-to-end compiles of the reference catalog and of hand-built units.

use chainform::{
    compile, compile_with_diagnostics, samples, App, Chain, Collection, CompileError, Export,
    Instance, Library, MethodStub, Model, Scalar, Unit, Uri,
};
use serde_json::{json, Value};

fn uri(s: &str) -> Uri {
    s.parse().unwrap()
}

fn top_key(value: &Value) -> &str {
    let object = value.as_object().unwrap();
    assert_eq!(object.len(), 1, "expected a single top-level key");
    object.keys().next().unwrap()
}

/// The single top-level key of every compiled unit is its URI.
#[test]
fn top_level_key_is_unit_uri() {
    for unit in samples::catalog().unwrap() {
        let doc = compile(unit.as_ref()).unwrap().to_json();
        assert_eq!(top_key(&doc), unit.uri().unwrap().to_string());
    }
}

/// Each export appears under its name, keyed by `parent/name`.
#[test]
fn exports_are_nested_under_parent_uri() {
    for unit in samples::catalog().unwrap() {
        let doc = compile(unit.as_ref()).unwrap();
        let parent = unit.uri().unwrap();

        for export in unit.exports() {
            let Export::Model(model) = export else {
                panic!("catalog exports only models");
            };
            let nested = doc.get(model.name()).unwrap();
            assert_eq!(top_key(nested), format!("{parent}/{}", model.name()));
        }
    }
}

#[test]
fn neural_net_app_references_its_chain() {
    let doc = compile(&samples::neural_net_app().unwrap()).unwrap();

    assert_eq!(doc.get("batch_size"), Some(&json!(25)));
    assert_eq!(doc.get("learning_rate"), Some(&json!(0.1)));
    assert!(doc.get("net").unwrap().get("/state/chain/sync").is_some());
    assert_eq!(
        doc.get("up"),
        Some(&json!({"/state/scalar/op/get": [[], true]}))
    );
    assert_eq!(
        doc.get("train"),
        Some(&json!({"/state/scalar/op/post": [
            ["inputs", "labels"],
            {"/test/app/net/train": {
                "inputs": {"$inputs": []},
                "labels": {"$labels": []},
                "learning_rate": {"/test/app/learning_rate": []}
            }}
        ]}))
    );
}

#[test]
fn auth_service_exports_user() {
    let doc = compile(&samples::auth_service().unwrap()).unwrap();
    let user = &doc.get("User").unwrap()["/test/auth/User"];

    assert_eq!(user["schema"][0], json!(["name", "/state/scalar/value/string", 250]));
    assert_eq!(
        user["display_name"],
        json!({"/state/scalar/op/get": [[], {"/test/auth/User/schema": [0]}]})
    );
    assert!(doc.get("users").unwrap().get("/state/chain/block").is_some());
}

#[test]
fn derived_layer_overrides_base_members() {
    let doc = compile(&samples::ml_library().unwrap()).unwrap();
    let relu = &doc.get("ReluLayer").unwrap()["/test/lib/ml/ReluLayer"];

    assert_eq!(relu["activation"], json!("relu"));
    assert_eq!(relu["leak"], json!(0.0));
    assert_eq!(
        relu["forward"],
        json!({"/state/scalar/op/post": [
            ["x"],
            {"/test/lib/ml/ReluLayer/activation/forward": {"inputs": {"$x": []}}}
        ]})
    );
}

/// A Library exporting one stateless Model compiles to the documented nesting.
#[test]
fn library_exporting_one_model() {
    let lib = Library::new(uri("/test/lib"))
        .export(Model::new("Point").member("x", Scalar::from(0)).member("y", Scalar::from(0)));

    assert_eq!(
        compile(&lib).unwrap().to_json(),
        json!({"/test/lib": {"Point": {"/test/lib/Point": {"x": 0, "y": 0}}}})
    );
}

#[test]
fn app_mutable_field_must_be_chained() {
    let chained = App::new(uri("/test/app")).member("cache", Chain::sync(Collection::btree(Scalar::None)));
    assert!(compile(&chained).is_ok());

    let unwrapped = App::new(uri("/test/app")).member("cache", Collection::btree(Scalar::None));
    assert!(matches!(
        compile(&unwrapped),
        Err(CompileError::MutableStateOutsideChain { .. })
    ));
}

#[test]
fn scalars_never_trip_mutability() {
    let tuple = Scalar::tuple([Scalar::from(1), Scalar::from("a")]);
    let app = App::new(uri("/test/app")).member("t", tuple.clone());
    let lib = Library::new(uri("/test/lib")).member("t", tuple.clone());
    let model = Model::new("M").at(uri("/test/M")).member("t", tuple);

    assert!(compile(&app).is_ok());
    assert!(compile(&lib).is_ok());
    assert!(compile(&model).is_ok());
}

#[test]
fn errors_name_the_offending_member() {
    let lib = Library::new(uri("/test/lib")).member("rows", Instance::new(uri("/state/object")));
    let err = compile(&lib).unwrap_err();
    let message = err.to_string();

    assert!(message.contains("/test/lib"), "{message}");
    assert!(message.contains("rows"), "{message}");
}

#[test]
fn method_referencing_unknown_member_fails() {
    let app = App::new(uri("/test/app"))
        .member("broken", MethodStub::get(|this| Ok(this.get("missing")?.into())));
    assert!(matches!(
        compile(&app),
        Err(CompileError::UnknownAttribute { name, .. }) if name == "missing"
    ));
}

#[test]
fn catalog_reports_no_warnings() {
    for unit in samples::catalog().unwrap() {
        let compilation = compile_with_diagnostics(unit.as_ref()).unwrap();
        assert_eq!(compilation.diagnostics.warning_count(), 0);
    }
}
