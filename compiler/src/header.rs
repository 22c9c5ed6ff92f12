//! Header synthesis: address-only placeholder instances of a unit.
//!
//! A [`Header`] mirrors a unit's declared members, but every state member
//! is replaced by a [`Ref`] to `unit/member`. Method bodies resolved against
//! a header therefore compile to references instead of inlined values.
//! Headers are built fresh for each compile and never mutated afterwards.

use serde_json::Value;

use crate::error::{CompileError, Result};
use crate::export::expected_uri;
use crate::expr::Ref;
use crate::method::Verb;
use crate::model::{Member, Unit};
use crate::uri::{Id, Uri};

/// One attribute of a header.
#[derive(Debug, Clone, PartialEq)]
pub enum Attr {
    /// A state member, replaced by a reference to its member URI.
    Ref(Ref),
    /// A nested model member, mounted as a placeholder child.
    Child(Header),
    /// A method, addressable at its member URI.
    Method(Ref, Verb),
    /// A plain constant, copied as-is.
    Constant(Value),
}

/// An address-only placeholder for a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    uri: Uri,
    attrs: Vec<(Id, Attr)>,
}

impl Header {
    /// Builds the header of a unit at `uri` with the given members.
    ///
    /// Underscore-prefixed members are private and left out.
    ///
    /// # Errors
    ///
    /// - [`CompileError::UnsupportedMember`] if a member name is not a valid
    ///   path segment or the member has no JSON encoding.
    /// - [`CompileError::ReferenceBinding`] if a state member's reference does
    ///   not resolve to `uri/name`.
    /// - [`CompileError::UriMismatch`] if a nested model declares an address
    ///   other than `uri/name`.
    pub fn build(uri: &Uri, members: &[(String, Member)]) -> Result<Self> {
        let mut attrs = Vec::with_capacity(members.len());

        for (name, member) in members {
            if is_private(name) {
                continue;
            }

            let id = member_id(uri, name)?;
            let member_uri = uri.append(&id);

            let attr = match member {
                Member::State(state) => {
                    let reference = state.reference(member_uri.clone());
                    if reference.uri() != Some(&member_uri) {
                        return Err(CompileError::ReferenceBinding {
                            unit: uri.clone(),
                            member: id,
                            actual: reference.uri().cloned().unwrap_or_else(Uri::root),
                            expected: member_uri,
                        });
                    }
                    Attr::Ref(reference)
                }
                Member::Model(model) => {
                    let child_uri = expected_uri(uri, &id, model.uri())?;
                    let members = model.resolved_members();
                    Attr::Child(Header::build(&child_uri, &members)?)
                }
                Member::Method(stub) => Attr::Method(Ref::to(member_uri), stub.verb()),
                Member::Constant(value) => Attr::Constant(value.clone()),
                Member::Opaque { type_name } => {
                    return Err(CompileError::UnsupportedMember {
                        unit: uri.clone(),
                        member: name.clone(),
                        reason: format!("{type_name} has no JSON encoding"),
                    })
                }
            };

            attrs.push((id, attr));
        }

        Ok(Self {
            uri: uri.clone(),
            attrs,
        })
    }

    /// The address of the unit this header stands in for.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// The attributes in declaration order.
    #[must_use]
    pub fn attrs(&self) -> &[(Id, Attr)] {
        &self.attrs
    }

    /// Looks up an attribute by name.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&Attr> {
        self.attrs
            .iter()
            .find(|(id, _)| id.as_str() == name)
            .map(|(_, attr)| attr)
    }

    /// The reference for attribute `name`, as seen through `self.name` in a method body.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::UnknownAttribute`] if there is no addressable
    /// attribute `name`. Constants are not addressable; read them with
    /// [`Header::constant`].
    pub fn get(&self, name: &str) -> Result<Ref> {
        match self.attr(name) {
            Some(Attr::Ref(r) | Attr::Method(r, _)) => Ok(r.clone()),
            Some(Attr::Child(child)) => Ok(Ref::to(child.uri.clone())),
            Some(Attr::Constant(_)) | None => Err(self.unknown(name)),
        }
    }

    /// The placeholder child mounted at attribute `name`.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::UnknownAttribute`] if `name` is not a nested model.
    pub fn child(&self, name: &str) -> Result<&Header> {
        match self.attr(name) {
            Some(Attr::Child(child)) => Ok(child),
            _ => Err(self.unknown(name)),
        }
    }

    /// The value of constant attribute `name`.
    ///
    /// # Errors
    ///
    /// - [`CompileError::UnknownAttribute`] if there is no such attribute.
    /// - [`CompileError::NotAConstant`] if the attribute is addressable.
    pub fn constant(&self, name: &str) -> Result<&Value> {
        match self.attrs.iter().find(|(id, _)| id.as_str() == name) {
            Some((_, Attr::Constant(value))) => Ok(value),
            Some((id, _)) => Err(CompileError::NotAConstant {
                unit: self.uri.clone(),
                name: id.clone(),
            }),
            None => Err(self.unknown(name)),
        }
    }

    fn unknown(&self, name: &str) -> CompileError {
        CompileError::UnknownAttribute {
            unit: self.uri.clone(),
            name: name.to_owned(),
        }
    }
}

/// Members whose names start with `_` are private and never compiled.
pub(crate) fn is_private(name: &str) -> bool {
    name.starts_with('_')
}

/// Validates a member name as a path segment of `unit`.
pub(crate) fn member_id(unit: &Uri, name: &str) -> Result<Id> {
    name.parse().map_err(|e| CompileError::UnsupportedMember {
        unit: unit.clone(),
        member: name.to_owned(),
        reason: format!("the name is not a valid path segment ({e})"),
    })
}
