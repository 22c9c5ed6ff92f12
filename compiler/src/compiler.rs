//! The compiler entry point.
//!
//! Compiling a unit runs, in order:
//! 1. export resolution (each export compiled as a nested unit);
//! 2. header synthesis;
//! 3. for each member in declaration order: mutability check, then
//!    serialization, with method stubs resolved against the header.
//!
//! The first violation aborts the compile; no partial document is returned.
//! Compilation performs no I/O.

use serde_json::Map;
use tracing::{debug, warn};

use crate::diagnostic::{Diagnostic, Diagnostics};
use crate::document::CompiledDocument;
use crate::encode::ToJson;
use crate::error::{CompileError, Result};
use crate::export;
use crate::header::{is_private, member_id, Header};
use crate::model::{Member, Unit};
use crate::mutability;
use crate::state::State;
use crate::uri::Uri;

/// A compiled document together with the non-fatal findings of its compile.
#[derive(Debug, Clone)]
pub struct Compilation {
    /// The compiled document.
    pub document: CompiledDocument,
    /// Findings that did not stop the compile.
    pub diagnostics: Diagnostics,
}

/// Compiles `unit` into its configuration document, logging any warnings.
///
/// # Errors
///
/// Returns the first [`CompileError`] encountered.
pub fn compile<U: Unit + ?Sized>(unit: &U) -> Result<CompiledDocument> {
    let Compilation {
        document,
        diagnostics,
    } = compile_with_diagnostics(unit)?;

    for diagnostic in diagnostics.warnings() {
        warn!(
            unit = %diagnostic.unit,
            member = diagnostic.member.as_deref().unwrap_or(""),
            "{}",
            diagnostic.message
        );
    }

    Ok(document)
}

/// Compiles `unit` and returns the document with its diagnostics.
///
/// # Errors
///
/// - [`CompileError::MissingUri`] if the unit has no URI.
/// - Otherwise the first export, header, mutability or method error encountered.
pub fn compile_with_diagnostics<U: Unit + ?Sized>(unit: &U) -> Result<Compilation> {
    let uri = unit.uri().ok_or_else(|| CompileError::MissingUri {
        kind: unit.kind(),
        name: unit.name().to_owned(),
    })?;

    let mut session = Session::default();
    let document = session.compile_at(unit, uri)?;

    Ok(Compilation {
        document,
        diagnostics: session.diagnostics,
    })
}

/// State carried through one top-level compile.
#[derive(Debug, Default)]
pub(crate) struct Session {
    diagnostics: Diagnostics,
}

impl Session {
    pub(crate) fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Compiles `unit` at `uri`, which may differ from the unit's own URI
    /// when an exporter assigns the address.
    pub(crate) fn compile_at<U: Unit + ?Sized>(
        &mut self,
        unit: &U,
        uri: &Uri,
    ) -> Result<CompiledDocument> {
        let kind = unit.kind();
        debug!(unit = %uri, %kind, "compiling unit");

        let mut form = Map::new();
        for (name, fragment) in export::resolve(self, uri, unit.exports())? {
            form.insert(name.to_string(), fragment.into_json());
        }

        let members = unit.members();
        let header = Header::build(uri, &members)?;

        for (name, member) in members.iter() {
            if is_private(name) {
                self.report(Diagnostic::info(uri.to_string(), "private member skipped").on(name));
                continue;
            }

            let id = member_id(uri, name)?;
            if form.contains_key(id.as_str()) {
                return Err(CompileError::DuplicateMember {
                    unit: uri.clone(),
                    name: id,
                });
            }

            mutability::check_member(kind, uri, &id, member)?;

            let value = match member {
                Member::Constant(value) => value.clone(),
                Member::State(state) => {
                    if let State::Chain(chain) = state {
                        if !chain.subject().is_mutable() {
                            self.report(
                                Diagnostic::warn(
                                    uri.to_string(),
                                    "chain wraps immutable state and records nothing",
                                )
                                .on(name),
                            );
                        }
                    }
                    state.to_json()
                }
                Member::Method(stub) => stub.resolve(&header)?,
                Member::Model(model) => {
                    let child_uri = export::expected_uri(uri, &id, model.uri())?;
                    self.compile_at(model, &child_uri)?.into_json()
                }
                Member::Opaque { type_name } => {
                    return Err(CompileError::UnsupportedMember {
                        unit: uri.clone(),
                        member: name.clone(),
                        reason: format!("{type_name} has no JSON encoding"),
                    })
                }
            };

            form.insert(id.to_string(), value);
        }

        debug!(unit = %uri, members = form.len(), "compiled unit");
        Ok(CompiledDocument::new(uri.clone(), form))
    }
}
