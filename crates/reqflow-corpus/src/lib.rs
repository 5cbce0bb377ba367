//! Corpus resolution for requirement documents.
//!
//! A corpus is the full set of requirement documents considered
//! together. This crate loads a directory of sources, builds the
//! `depends_on` dependency graph, detects cycles, and resolves
//! cross-document invariant references, producing an immutable,
//! fully-resolved view built once per resolution pass.

pub mod corpus;
pub mod error;
pub mod graph;
pub mod loader;
pub mod resolve;

pub use corpus::Corpus;
pub use error::CorpusError;
pub use graph::DependencyGraph;
pub use loader::{load_dir, LoadFailure, LoadedCorpus};
pub use resolve::{resolve, ResolvedInvariant, Resolution};
