//! Error types for addressing, compilation, and configuration persistence.
//!
//! Every compile error names the unit (by URI) and, where one is involved,
//! the member that caused it, so the offending declaration can be located.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::model::UnitKind;
use crate::uri::{Id, Uri};

/// Result type alias for compiler operations.
pub type Result<T, E = CompileError> = std::result::Result<T, E>;

/// A malformed URI or path segment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UriError {
    /// The text is neither a path (`/a/b`) nor a link (`scheme://host/a/b`).
    #[error("{0:?} is not a URI: expected a path starting with '/' or a link with a scheme and authority")]
    Malformed(String),

    /// A path segment violates the segment grammar.
    #[error("invalid path segment {segment:?}: {reason}")]
    InvalidSegment {
        /// The rejected segment text.
        segment: String,
        /// Which rule it broke.
        reason: &'static str,
    },
}

/// A violation found while compiling a unit. Always fatal to the compile.
#[derive(Debug, Error)]
pub enum CompileError {
    /// An `exports()` entry is not a Model declaration.
    #[error("{unit} cannot export {entry}: only Model declarations are exportable")]
    InvalidExport {
        /// The exporting unit.
        unit: Uri,
        /// Description of the rejected entry.
        entry: String,
    },

    /// An exported Model declares a URI other than the one derived from its parent.
    #[error("export {name} of {unit} declares URI {declared}, expected {expected}")]
    UriMismatch {
        /// The exporting unit.
        unit: Uri,
        /// Name of the export.
        name: Id,
        /// The URI derived as `unit/name`.
        expected: Uri,
        /// The URI the export declared.
        declared: Uri,
    },

    /// A member cannot be classified as state, method, nested model, or constant.
    #[error("member {member:?} of {unit} is not supported: {reason}")]
    UnsupportedMember {
        /// The declaring unit.
        unit: Uri,
        /// The member name as declared.
        member: String,
        /// Why the member was rejected.
        reason: String,
    },

    /// A synthesized header reference resolves somewhere other than its member URI.
    #[error("failed to bind member {member} of {unit} to {expected}: reference resolves to {actual}")]
    ReferenceBinding {
        /// The declaring unit.
        unit: Uri,
        /// The member being bound.
        member: Id,
        /// The member URI `unit/member`.
        expected: Uri,
        /// The URI the reference actually resolves to.
        actual: Uri,
    },

    /// An App declares mutable state that is not wrapped in a Chain.
    #[error("mutable member {member} of App {unit} must be wrapped in a Chain")]
    MutableStateOutsideChain {
        /// The declaring App.
        unit: Uri,
        /// The offending member.
        member: Id,
    },

    /// A Library or Model declares mutable state.
    #[error("{kind} {unit} may not contain mutable state, found member {member}")]
    MutableStateForbidden {
        /// Whether the unit is a Library or a Model.
        kind: UnitKind,
        /// The declaring unit.
        unit: Uri,
        /// The offending member.
        member: Id,
    },

    /// A unit was compiled at the top level without an address.
    #[error("{kind} {name} has no URI")]
    MissingUri {
        /// The kind of unit.
        kind: UnitKind,
        /// The unit's declared name.
        name: String,
    },

    /// Two exports, or an export and a member, claim the same name.
    #[error("{unit} declares {name} more than once")]
    DuplicateMember {
        /// The declaring unit.
        unit: Uri,
        /// The contested name.
        name: Id,
    },

    /// A method body read a header attribute that does not exist.
    #[error("{unit} has no attribute {name:?}")]
    UnknownAttribute {
        /// The header's unit.
        unit: Uri,
        /// The requested attribute.
        name: String,
    },

    /// A method body referenced a parameter the method does not declare.
    #[error("a method of {unit} references undeclared parameter ${name}")]
    UnknownParameter {
        /// The header's unit.
        unit: Uri,
        /// The parameter name.
        name: String,
    },

    /// A method body asked for a constant but the attribute is addressable.
    #[error("attribute {name} of {unit} is a reference, not a constant")]
    NotAConstant {
        /// The header's unit.
        unit: Uri,
        /// The requested attribute.
        name: Id,
    },

    /// A method body built an invalid path.
    #[error(transparent)]
    Uri(#[from] UriError),
}

/// A failure to persist a compiled configuration.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Different content already exists at the path and overwrite was not requested.
    #[error("there is already a different configuration at {}", path.display())]
    ConfigConflict {
        /// The contested path.
        path: PathBuf,
    },

    /// A filesystem operation failed.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// The path being read or written.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// The document could not be rendered as JSON.
    #[error("failed to encode configuration: {0}")]
    Encode(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_names_the_path() {
        let err = StoreError::ConfigConflict {
            path: PathBuf::from("config/test/app"),
        };
        assert!(err.to_string().contains("config/test/app"));
    }

    #[test]
    fn mutability_errors_name_unit_and_member() {
        let unit: Uri = "/test/app".parse().unwrap();
        let member: Id = "net".parse().unwrap();
        let err = CompileError::MutableStateOutsideChain { unit, member };
        let msg = err.to_string();
        assert!(msg.contains("/test/app"));
        assert!(msg.contains("net"));
        assert!(msg.contains("Chain"));
    }

    #[test]
    fn forbidden_names_the_unit_kind() {
        let err = CompileError::MutableStateForbidden {
            kind: UnitKind::Library,
            unit: "/test/lib".parse().unwrap(),
            member: "table".parse().unwrap(),
        };
        assert!(err.to_string().starts_with("Library /test/lib"));
    }
}
