//! The typed state model: every value a unit member can hold.
//!
//! Classification rule: a [`State`] is mutable iff it is not a
//! [`Scalar`]. Collections, instances and chains are all mutable; inside a
//! persisted unit the only legal home for mutable state is a [`Chain`]
//! declared by an App.

use serde_json::{Map, Value};

use crate::chain::Chain;
use crate::encode::{class_form, ToJson};
use crate::expr::Ref;
use crate::scalar::Scalar;
use crate::uri::Uri;

/// The native collection classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionType {
    /// An ordered B-tree index.
    BTree,
    /// A relational table.
    Table,
    /// A dense n-dimensional tensor.
    DenseTensor,
    /// A sparse n-dimensional tensor.
    SparseTensor,
}

impl CollectionType {
    /// The class path of this collection type.
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::BTree => "/state/collection/btree",
            Self::Table => "/state/collection/table",
            Self::DenseTensor => "/state/collection/tensor/dense",
            Self::SparseTensor => "/state/collection/tensor/sparse",
        }
    }
}

/// An opaque typed collection, declared by its class and schema.
///
/// The compiler never looks inside a collection; it only carries the
/// schema the host needs to construct it.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    class: CollectionType,
    schema: Scalar,
}

impl Collection {
    /// Declares a collection of the given class and schema.
    pub fn new(class: CollectionType, schema: impl Into<Scalar>) -> Self {
        Self {
            class,
            schema: schema.into(),
        }
    }

    /// A B-tree with the given column schema.
    pub fn btree(schema: impl Into<Scalar>) -> Self {
        Self::new(CollectionType::BTree, schema)
    }

    /// A table with the given schema.
    pub fn table(schema: impl Into<Scalar>) -> Self {
        Self::new(CollectionType::Table, schema)
    }

    /// A dense tensor of the given shape and data type.
    #[must_use]
    pub fn dense(shape: &[u32], dtype: &str) -> Self {
        Self::new(CollectionType::DenseTensor, tensor_schema(shape, dtype))
    }

    /// A sparse tensor of the given shape and data type.
    #[must_use]
    pub fn sparse(shape: &[u32], dtype: &str) -> Self {
        Self::new(CollectionType::SparseTensor, tensor_schema(shape, dtype))
    }

    /// The collection class.
    #[must_use]
    pub fn class(&self) -> CollectionType {
        self.class
    }

    /// The schema passed to the class constructor.
    #[must_use]
    pub fn schema(&self) -> &Scalar {
        &self.schema
    }
}

fn tensor_schema(shape: &[u32], dtype: &str) -> Scalar {
    Scalar::tuple([Scalar::tuple(shape.iter().copied()), Scalar::from(dtype)])
}

impl ToJson for Collection {
    fn to_json(&self) -> Value {
        class_form(self.class.path(), Value::Array(vec![self.schema.to_json()]))
    }
}

/// A named, typed aggregate of fields.
///
/// An instance may be bound to a fixed address with [`Instance::at`]. A
/// bound instance always resolves to that address, which lets the header
/// builder detect an instance mounted under the wrong member.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    class: Uri,
    uri: Option<Uri>,
    fields: Vec<(String, State)>,
}

impl Instance {
    /// An empty instance of `class`.
    #[must_use]
    pub fn new(class: Uri) -> Self {
        Self {
            class,
            uri: None,
            fields: Vec::new(),
        }
    }

    /// Binds this instance to a fixed address.
    #[must_use]
    pub fn at(mut self, uri: Uri) -> Self {
        self.uri = Some(uri);
        self
    }

    /// Adds a field, replacing any earlier field of the same name in place.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, state: impl Into<State>) -> Self {
        let name = name.into();
        let state = state.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = state,
            None => self.fields.push((name, state)),
        }
        self
    }

    /// The instance's class.
    #[must_use]
    pub fn class(&self) -> &Uri {
        &self.class
    }

    /// The bound address, if any.
    #[must_use]
    pub fn uri(&self) -> Option<&Uri> {
        self.uri.as_ref()
    }

    /// The fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[(String, State)] {
        &self.fields
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&State> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }
}

impl ToJson for Instance {
    fn to_json(&self) -> Value {
        let fields = self
            .fields
            .iter()
            .map(|(name, state)| (name.clone(), state.to_json()))
            .collect::<Map<_, _>>();

        class_form(self.class.to_string(), Value::Object(fields))
    }
}

/// Any value the compiler knows how to serialize.
#[derive(Debug, Clone, PartialEq)]
pub enum State {
    /// An immutable value.
    Scalar(Scalar),
    /// A mutable collection.
    Collection(Collection),
    /// A mutable instance.
    Instance(Instance),
    /// A version-tracked container of state.
    Chain(Chain),
}

impl State {
    /// True unless this is a [`Scalar`].
    #[must_use]
    pub fn is_mutable(&self) -> bool {
        !matches!(self, Self::Scalar(_))
    }

    /// True if this state is wrapped in a [`Chain`].
    #[must_use]
    pub fn is_chain(&self) -> bool {
        matches!(self, Self::Chain(_))
    }

    /// Builds a reference to this state as mounted at `uri`.
    ///
    /// A bound [`Instance`] resolves to its own address regardless of `uri`.
    #[must_use]
    pub fn reference(&self, uri: Uri) -> Ref {
        match self {
            Self::Instance(instance) => Ref::to(instance.uri.clone().unwrap_or(uri)),
            _ => Ref::to(uri),
        }
    }
}

impl ToJson for State {
    fn to_json(&self) -> Value {
        match self {
            Self::Scalar(scalar) => scalar.to_json(),
            Self::Collection(collection) => collection.to_json(),
            Self::Instance(instance) => instance.to_json(),
            Self::Chain(chain) => chain.to_json(),
        }
    }
}

impl From<Scalar> for State {
    fn from(scalar: Scalar) -> Self {
        Self::Scalar(scalar)
    }
}

macro_rules! state_from_scalar {
    ($($t:ty),*) => {
        $(
            impl From<$t> for State {
                fn from(value: $t) -> Self {
                    Self::Scalar(Scalar::from(value))
                }
            }
        )*
    };
}

state_from_scalar!(bool, i32, i64, f64, &str, String, Uri);

impl From<Collection> for State {
    fn from(collection: Collection) -> Self {
        Self::Collection(collection)
    }
}

impl From<Instance> for State {
    fn from(instance: Instance) -> Self {
        Self::Instance(instance)
    }
}

impl From<Chain> for State {
    fn from(chain: Chain) -> Self {
        Self::Chain(chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn uri(s: &str) -> Uri {
        s.parse().unwrap()
    }

    #[test]
    fn scalars_are_not_mutable() {
        assert!(!State::from(1).is_mutable());
        assert!(!State::from(Scalar::tuple(["a", "b"])).is_mutable());
        assert!(!State::from(Scalar::map([("k", 1)])).is_mutable());
    }

    #[test]
    fn everything_else_is_mutable() {
        assert!(State::from(Collection::dense(&[2, 2], "f64")).is_mutable());
        assert!(State::from(Instance::new(uri("/state/object"))).is_mutable());
        assert!(State::from(Chain::sync(Collection::btree(Scalar::None))).is_mutable());
    }

    #[test]
    fn encodes_collections() {
        let weights = Collection::dense(&[2, 1], "f64");
        assert_eq!(
            weights.to_json(),
            json!({"/state/collection/tensor/dense": [[[2, 1], "f64"]]})
        );
    }

    #[test]
    fn encodes_instances_in_field_order() {
        let layer = Instance::new(uri("/test/lib/ml/Layer"))
            .with("activation", "sigmoid")
            .with("bias", Collection::dense(&[1], "f64"));
        assert_eq!(
            layer.to_json(),
            json!({"/test/lib/ml/Layer": {
                "activation": "sigmoid",
                "bias": {"/state/collection/tensor/dense": [[[1], "f64"]]}
            }})
        );
    }

    #[test]
    fn with_replaces_in_place() {
        let inst = Instance::new(uri("/state/object"))
            .with("a", 1)
            .with("b", 2)
            .with("a", 3);
        let names: Vec<&str> = inst.fields().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(inst.field("a"), Some(&State::from(3)));
    }

    #[test]
    fn bound_instances_keep_their_address() {
        let mount = uri("/test/app/net");
        let free = State::from(Instance::new(uri("/state/object")));
        assert_eq!(free.reference(mount.clone()).uri(), Some(&mount));

        let bound = State::from(Instance::new(uri("/state/object")).at(uri("/elsewhere")));
        assert_eq!(bound.reference(mount).uri(), Some(&uri("/elsewhere")));
    }
}
