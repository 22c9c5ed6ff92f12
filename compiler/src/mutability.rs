//! Mutability rules: where mutable state may live.
//!
//! Applied to each member of a unit in order:
//! 1. non-state members are always allowed;
//! 2. scalars are allowed in every unit;
//! 3. any other state is allowed only in an App, and only inside a Chain.

use crate::error::{CompileError, Result};
use crate::model::{Member, UnitKind};
use crate::uri::{Id, Uri};

/// True if `member` is state that can change independently of its declaration.
#[must_use]
pub fn is_mutable(member: &Member) -> bool {
    match member {
        Member::State(state) => state.is_mutable(),
        _ => false,
    }
}

/// Checks one member of a `kind` unit at `unit` against the mutability rules.
///
/// # Errors
///
/// - [`CompileError::MutableStateOutsideChain`] for unwrapped mutable state in an App.
/// - [`CompileError::MutableStateForbidden`] for mutable state in a Library or Model.
pub fn check_member(kind: UnitKind, unit: &Uri, name: &Id, member: &Member) -> Result<()> {
    let Member::State(state) = member else {
        return Ok(());
    };

    if !state.is_mutable() {
        return Ok(());
    }

    if !kind.permits_mutable_state() {
        return Err(CompileError::MutableStateForbidden {
            kind,
            unit: unit.clone(),
            member: name.clone(),
        });
    }

    if state.is_chain() {
        Ok(())
    } else {
        Err(CompileError::MutableStateOutsideChain {
            unit: unit.clone(),
            member: name.clone(),
        })
    }
}
