//! Export resolution: addressing and compiling the models a unit re-publishes.
//!
//! Each export is addressed at `parent/name`. A model that already declares
//! a URI must declare exactly that one; a model without one is compiled at
//! the derived address. The model itself is never modified.

use std::collections::HashSet;

use crate::compiler::Session;
use crate::diagnostic::Diagnostic;
use crate::document::CompiledDocument;
use crate::error::{CompileError, Result};
use crate::model::{Export, Model, Unit};
use crate::state::State;
use crate::uri::{Id, Uri};

/// Root of the host's native class namespace.
const NATIVE_ROOT: &str = "state";

/// Computes the URI of export `name` under `parent`, checking it against a declared URI.
///
/// # Errors
///
/// Returns [`CompileError::UriMismatch`] if `declared` is set and differs
/// from `parent/name`.
pub fn expected_uri(parent: &Uri, name: &Id, declared: Option<&Uri>) -> Result<Uri> {
    let expected = parent.append(name);
    match declared {
        Some(declared) if *declared != expected => Err(CompileError::UriMismatch {
            unit: parent.clone(),
            name: name.clone(),
            expected,
            declared: declared.clone(),
        }),
        _ => Ok(expected),
    }
}

/// Validates and compiles every export of the unit at `parent`, in declaration order.
pub(crate) fn resolve(
    session: &mut Session,
    parent: &Uri,
    exports: &[Export],
) -> Result<Vec<(Id, CompiledDocument)>> {
    let mut seen = HashSet::with_capacity(exports.len());
    let mut fragments = Vec::with_capacity(exports.len());

    for export in exports {
        let model = match export {
            Export::Model(model) => model,
            Export::State(state) => {
                return Err(CompileError::InvalidExport {
                    unit: parent.clone(),
                    entry: describe(state),
                })
            }
        };

        let name: Id = model.name().parse().map_err(|e| CompileError::InvalidExport {
            unit: parent.clone(),
            entry: format!("model {:?} ({e})", model.name()),
        })?;

        if !seen.insert(name.clone()) {
            return Err(CompileError::DuplicateMember {
                unit: parent.clone(),
                name,
            });
        }

        let uri = expected_uri(parent, &name, model.uri())?;

        if !has_native_or_local_base(parent, model) {
            let base = model.base().map(ToString::to_string).unwrap_or_default();
            session.report(
                Diagnostic::warn(
                    parent.to_string(),
                    format!("base class {base} is not a native class and may not support JSON encoding"),
                )
                .on(name.as_str()),
            );
        }

        let document = session.compile_at(model, &uri)?;
        fragments.push((name, document));
    }

    Ok(fragments)
}

/// True if the model's base is undeclared, native, or declared under `parent`.
fn has_native_or_local_base(parent: &Uri, model: &Model) -> bool {
    let Some(base) = model.base() else {
        return true;
    };

    let base = base.path();
    let native = base
        .segments()
        .first()
        .is_some_and(|root| root.as_str() == NATIVE_ROOT);

    native || base.starts_with(&parent.path())
}

fn describe(state: &State) -> String {
    match state {
        State::Scalar(_) => "a scalar value".to_owned(),
        State::Collection(c) => format!("a {} value", c.class().path()),
        State::Instance(i) => format!("an instance of {}", i.class()),
        State::Chain(c) => format!("a {} value", c.class().path()),
    }
}
