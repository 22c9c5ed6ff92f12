//! Compiles declared units into host configuration documents.
//!
//! The `chainform` crate turns a declaration of an [`App`], [`Library`] or
//! [`Model`] into a canonical, URI-keyed JSON document a host loads to
//! serve that unit. Compilation is a pure function of the declaration:
//! exports are resolved and addressed, every member is checked against the
//! mutability rules, and method bodies are resolved against an address-only
//! [`Header`] so they compile to references rather than captured values.
//!
//! # Entry Point
//!
//! ```
//! use chainform::{compile, App, Chain, Collection, MethodStub, Uri};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let app = App::new("/test/app".parse::<Uri>()?)
//!     .member("net", Chain::sync(Collection::dense(&[2, 1], "f64")))
//!     .member("up", MethodStub::get(|_| Ok(true.into())));
//!
//! let document = compile(&app)?;
//! assert_eq!(document.key(), "/test/app");
//! # Ok(())
//! # }
//! ```
//!
//! # Persistence
//!
//! ```no_run
//! use chainform::{compile, config_path, persist, samples, PersistOptions};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let app = samples::neural_net_app()?;
//! let document = compile(&app)?;
//! let path = config_path(Path::new("config"), document.uri());
//! persist(&document, &path, PersistOptions::default())?;
//! # Ok(())
//! # }
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod chain;
pub mod compiler;
pub mod diagnostic;
pub mod document;
pub mod encode;
pub mod error;
pub mod export;
pub mod expr;
pub mod header;
pub mod method;
pub mod model;
pub mod mutability;
pub mod samples;
pub mod scalar;
pub mod state;
pub mod store;
pub mod uri;

pub use chain::{Chain, ChainBlock, ChainType, Mutation};
pub use compiler::{compile, compile_with_diagnostics, Compilation};
pub use diagnostic::{Diagnostic, Diagnostics, Severity};
pub use document::CompiledDocument;
pub use encode::ToJson;
pub use error::{CompileError, Result, StoreError, UriError};
pub use expr::{Expr, Ref};
pub use header::{Attr, Header};
pub use method::{MethodStub, Verb};
pub use model::{App, Declaration, Export, Library, Member, Model, Unit, UnitKind};
pub use scalar::Scalar;
pub use state::{Collection, CollectionType, Instance, State};
pub use store::{config_path, persist, persist_all, PersistOptions, Persisted};
pub use uri::{Id, Uri};
