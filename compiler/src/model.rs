//! Declarations: the units a compiler accepts and the members they hold.
//!
//! Every unit enumerates its members through an explicit, ordered member
//! list built at declaration time; the compiler never inspects anything
//! else. Top-level units ([`App`], [`Library`]) take their URI in the
//! constructor. A [`Model`] may omit its URI, in which case the exporting
//! unit assigns one.

use std::borrow::Cow;
use std::fmt;

use serde_json::Value;

use crate::chain::Chain;
use crate::method::MethodStub;
use crate::scalar::Scalar;
use crate::state::{Collection, Instance, State};
use crate::uri::Uri;

/// The three kinds of unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    /// A hosted application. May hold mutable state inside Chains.
    App,
    /// A stateless library.
    Library,
    /// A model type exported by an App or Library. Stateless.
    Model,
}

impl UnitKind {
    /// True if units of this kind may hold mutable state at all.
    #[must_use]
    pub fn permits_mutable_state(self) -> bool {
        matches!(self, Self::App)
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::App => "App",
            Self::Library => "Library",
            Self::Model => "Model",
        })
    }
}

/// A declared member of a unit.
#[derive(Debug, Clone)]
pub enum Member {
    /// A plain constant, serialized as-is and copied into the header.
    Constant(Value),
    /// A typed state value.
    State(State),
    /// A method.
    Method(MethodStub),
    /// A nested model-typed attribute, compiled at `unit/name`.
    Model(Model),
    /// A host-language handle with no JSON encoding. Always rejected.
    Opaque {
        /// The handle's type, for the error message.
        type_name: String,
    },
}

impl Member {
    /// A plain JSON constant.
    #[must_use]
    pub fn constant(value: Value) -> Self {
        Self::Constant(value)
    }

    /// A handle the compiler cannot encode.
    pub fn opaque(type_name: impl Into<String>) -> Self {
        Self::Opaque {
            type_name: type_name.into(),
        }
    }
}

impl From<State> for Member {
    fn from(state: State) -> Self {
        Self::State(state)
    }
}

impl From<Scalar> for Member {
    fn from(scalar: Scalar) -> Self {
        Self::State(State::Scalar(scalar))
    }
}

impl From<Collection> for Member {
    fn from(collection: Collection) -> Self {
        Self::State(State::Collection(collection))
    }
}

impl From<Instance> for Member {
    fn from(instance: Instance) -> Self {
        Self::State(State::Instance(instance))
    }
}

impl From<Chain> for Member {
    fn from(chain: Chain) -> Self {
        Self::State(State::Chain(chain))
    }
}

impl From<MethodStub> for Member {
    fn from(stub: MethodStub) -> Self {
        Self::Method(stub)
    }
}

impl From<Model> for Member {
    fn from(model: Model) -> Self {
        Self::Model(model)
    }
}

/// An entry of a unit's export list.
#[derive(Debug, Clone)]
pub enum Export {
    /// A model declaration, re-published under the exporter's namespace.
    Model(Model),
    /// A state value. Not a declaration, so exporting it is an error.
    State(State),
}

impl From<Model> for Export {
    fn from(model: Model) -> Self {
        Self::Model(model)
    }
}

impl From<State> for Export {
    fn from(state: State) -> Self {
        Self::State(state)
    }
}

/// Members and exports shared by every unit kind.
#[derive(Debug, Clone, Default)]
pub struct Declaration {
    members: Vec<(String, Member)>,
    exports: Vec<Export>,
}

impl Declaration {
    /// Declares a member. Redeclaring a name replaces the earlier value in place.
    pub fn set(&mut self, name: impl Into<String>, member: impl Into<Member>) {
        let name = name.into();
        let member = member.into();
        match self.members.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = member,
            None => self.members.push((name, member)),
        }
    }

    /// Appends an export.
    pub fn export(&mut self, export: impl Into<Export>) {
        self.exports.push(export.into());
    }

    /// The members in declaration order.
    #[must_use]
    pub fn members(&self) -> &[(String, Member)] {
        &self.members
    }

    /// The exports in declaration order.
    #[must_use]
    pub fn exports(&self) -> &[Export] {
        &self.exports
    }
}

/// Anything the compiler can turn into a document.
pub trait Unit {
    /// The kind of unit.
    fn kind(&self) -> UnitKind;

    /// The declared name, used as the export key.
    fn name(&self) -> &str;

    /// The declared URI, if any.
    fn uri(&self) -> Option<&Uri>;

    /// All members, inherited ones included, in resolution order.
    fn members(&self) -> Cow<'_, [(String, Member)]>;

    /// Nested declarations re-published under this unit's URI.
    fn exports(&self) -> &[Export];
}

/// A hosted application.
#[derive(Debug, Clone)]
pub struct App {
    uri: Uri,
    decl: Declaration,
}

impl App {
    /// Declares an App at `uri`.
    #[must_use]
    pub fn new(uri: Uri) -> Self {
        Self {
            uri,
            decl: Declaration::default(),
        }
    }

    /// Declares a member.
    #[must_use]
    pub fn member(mut self, name: impl Into<String>, member: impl Into<Member>) -> Self {
        self.decl.set(name, member);
        self
    }

    /// Exports a nested declaration.
    #[must_use]
    pub fn export(mut self, export: impl Into<Export>) -> Self {
        self.decl.export(export);
        self
    }
}

/// A stateless library.
#[derive(Debug, Clone)]
pub struct Library {
    uri: Uri,
    decl: Declaration,
}

impl Library {
    /// Declares a Library at `uri`.
    #[must_use]
    pub fn new(uri: Uri) -> Self {
        Self {
            uri,
            decl: Declaration::default(),
        }
    }

    /// Declares a member.
    #[must_use]
    pub fn member(mut self, name: impl Into<String>, member: impl Into<Member>) -> Self {
        self.decl.set(name, member);
        self
    }

    /// Exports a nested declaration.
    #[must_use]
    pub fn export(mut self, export: impl Into<Export>) -> Self {
        self.decl.export(export);
        self
    }
}

/// A stateless model type.
///
/// A model may extend another model, inheriting its members. Inherited
/// members come first in the base's declaration order; a member the subclass
/// redeclares keeps the base position and takes the subclass value.
#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    uri: Option<Uri>,
    base: Option<Uri>,
    parent: Option<Box<Model>>,
    decl: Declaration,
}

impl Model {
    /// Declares a model named `name` with no URI yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uri: None,
            base: None,
            parent: None,
            decl: Declaration::default(),
        }
    }

    /// Fixes the model's URI. An exporter verifies it against `exporter/name`.
    #[must_use]
    pub fn at(mut self, uri: Uri) -> Self {
        self.uri = Some(uri);
        self
    }

    /// Names the class this model subclasses, e.g. `/state/object`.
    #[must_use]
    pub fn subclass_of(mut self, base: Uri) -> Self {
        self.base = Some(base);
        self
    }

    /// Inherits the members of `parent`.
    #[must_use]
    pub fn extends(mut self, parent: &Model) -> Self {
        self.base = parent.uri.clone().or_else(|| parent.base.clone());
        self.parent = Some(Box::new(parent.clone()));
        self
    }

    /// Declares a member.
    #[must_use]
    pub fn member(mut self, name: impl Into<String>, member: impl Into<Member>) -> Self {
        self.decl.set(name, member);
        self
    }

    /// Exports a nested declaration.
    #[must_use]
    pub fn export(mut self, export: impl Into<Export>) -> Self {
        self.decl.export(export);
        self
    }

    /// The class this model subclasses, if declared.
    #[must_use]
    pub fn base(&self) -> Option<&Uri> {
        self.base.as_ref()
    }

    /// The model's members merged with everything it inherits.
    #[must_use]
    pub fn resolved_members(&self) -> Vec<(String, Member)> {
        let mut members = match &self.parent {
            Some(parent) => parent.resolved_members(),
            None => Vec::with_capacity(self.decl.members.len()),
        };

        for (name, member) in &self.decl.members {
            match members.iter_mut().find(|(n, _)| n == name) {
                Some((_, slot)) => *slot = member.clone(),
                None => members.push((name.clone(), member.clone())),
            }
        }

        members
    }
}

impl Unit for App {
    fn kind(&self) -> UnitKind {
        UnitKind::App
    }

    fn name(&self) -> &str {
        self.uri.last().map_or("", |id| id.as_str())
    }

    fn uri(&self) -> Option<&Uri> {
        Some(&self.uri)
    }

    fn members(&self) -> Cow<'_, [(String, Member)]> {
        Cow::Borrowed(self.decl.members())
    }

    fn exports(&self) -> &[Export] {
        self.decl.exports()
    }
}

impl Unit for Library {
    fn kind(&self) -> UnitKind {
        UnitKind::Library
    }

    fn name(&self) -> &str {
        self.uri.last().map_or("", |id| id.as_str())
    }

    fn uri(&self) -> Option<&Uri> {
        Some(&self.uri)
    }

    fn members(&self) -> Cow<'_, [(String, Member)]> {
        Cow::Borrowed(self.decl.members())
    }

    fn exports(&self) -> &[Export] {
        self.decl.exports()
    }
}

impl Unit for Model {
    fn kind(&self) -> UnitKind {
        UnitKind::Model
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn uri(&self) -> Option<&Uri> {
        self.uri.as_ref()
    }

    fn members(&self) -> Cow<'_, [(String, Member)]> {
        match self.parent {
            Some(_) => Cow::Owned(self.resolved_members()),
            None => Cow::Borrowed(self.decl.members()),
        }
    }

    fn exports(&self) -> &[Export] {
        self.decl.exports()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(members: &[(String, Member)]) -> Vec<&str> {
        members.iter().map(|(n, _)| n.as_str()).collect()
    }

    #[test]
    fn only_apps_permit_mutable_state() {
        assert!(UnitKind::App.permits_mutable_state());
        assert!(!UnitKind::Library.permits_mutable_state());
        assert!(!UnitKind::Model.permits_mutable_state());
    }

    #[test]
    fn redeclaring_replaces_in_place() {
        let app = App::new("/test/app".parse().unwrap())
            .member("a", Member::constant(json!(1)))
            .member("b", Member::constant(json!(2)))
            .member("a", Member::constant(json!(3)));

        let members = app.members();
        assert_eq!(names(&members), ["a", "b"]);
        assert!(matches!(&members[0].1, Member::Constant(v) if *v == json!(3)));
        assert_eq!(app.name(), "app");
    }

    #[test]
    fn most_derived_member_wins_at_base_position() {
        let base = Model::new("Layer")
            .member("activation", Scalar::from("sigmoid"))
            .member("size", Scalar::from(2));
        let derived = Model::new("ReluLayer")
            .extends(&base)
            .member("extra", Scalar::from(true))
            .member("activation", Scalar::from("relu"));

        let members = derived.members();
        assert_eq!(names(&members), ["activation", "size", "extra"]);
        assert!(matches!(
            &members[0].1,
            Member::State(State::Scalar(Scalar::String(s))) if s == "relu"
        ));
    }

    #[test]
    fn extends_records_the_parent_as_base() {
        let base = Model::new("Layer").at("/test/lib/Layer".parse().unwrap());
        let derived = Model::new("Dense").extends(&base);
        assert_eq!(derived.base().map(ToString::to_string).as_deref(), Some("/test/lib/Layer"));
        assert_eq!(derived.uri(), None);
    }
}
