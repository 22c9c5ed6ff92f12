//! Chains: the version-tracked containers that own an App's mutable state.
//!
//! A chain holds exactly one subject and an append-only history of
//! mutation blocks. The compiler only checks where chains are placed; the
//! history exists so that host-side tooling built on these types can record
//! writes against the same declaration.

use serde_json::Value;

use crate::encode::{class_form, ToJson};
use crate::scalar::Scalar;
use crate::state::State;

/// The kinds of chain a host can construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainType {
    /// Keeps only the latest committed state on disk.
    Sync,
    /// Keeps the full block history on disk.
    Block,
}

impl ChainType {
    /// The class path of this chain type.
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Sync => "/state/chain/sync",
            Self::Block => "/state/chain/block",
        }
    }
}

/// A single write against a chain's subject.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Set `key` to `value`.
    Put {
        /// The key written.
        key: Scalar,
        /// The new value.
        value: Scalar,
    },
    /// Remove `key`.
    Delete {
        /// The key removed.
        key: Scalar,
    },
}

/// A committed group of mutations.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainBlock {
    /// Version stamped at commit; starts at 1 and increases by one per block.
    pub version: u64,
    /// The writes committed together.
    pub mutations: Vec<Mutation>,
}

/// A version-tracked wrapper around one piece of state.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    class: ChainType,
    subject: Box<State>,
    history: Vec<ChainBlock>,
}

impl Chain {
    /// Wraps `subject` in a chain of the given type.
    pub fn new(class: ChainType, subject: impl Into<State>) -> Self {
        Self {
            class,
            subject: Box::new(subject.into()),
            history: Vec::new(),
        }
    }

    /// Wraps `subject` in a [`ChainType::Sync`] chain.
    pub fn sync(subject: impl Into<State>) -> Self {
        Self::new(ChainType::Sync, subject)
    }

    /// Wraps `subject` in a [`ChainType::Block`] chain.
    pub fn block(subject: impl Into<State>) -> Self {
        Self::new(ChainType::Block, subject)
    }

    /// The chain type.
    #[must_use]
    pub fn class(&self) -> ChainType {
        self.class
    }

    /// The current state held by this chain.
    #[must_use]
    pub fn subject(&self) -> &State {
        &self.subject
    }

    /// The committed blocks, oldest first.
    #[must_use]
    pub fn history(&self) -> &[ChainBlock] {
        &self.history
    }

    /// The latest committed version, or 0 if nothing has been committed.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.history.last().map_or(0, |block| block.version)
    }

    /// Commits `mutations` as a new block and returns its version.
    ///
    /// An empty commit records nothing and returns the current version.
    pub fn append(&mut self, mutations: Vec<Mutation>) -> u64 {
        if mutations.is_empty() {
            return self.version();
        }

        let version = self.version() + 1;
        self.history.push(ChainBlock { version, mutations });
        version
    }
}

impl ToJson for Chain {
    fn to_json(&self) -> Value {
        class_form(self.class.path(), Value::Array(vec![self.subject.to_json()]))
    }
}
