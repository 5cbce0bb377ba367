//! Corpus-level errors.

use thiserror::Error;

/// Errors raised while loading or resolving a corpus.
#[derive(Debug, Error)]
pub enum CorpusError {
    /// `depends_on` edges form a cycle. The payload names the cycle's
    /// ID sequence, ending where it started.
    #[error("dependency cycle: {}", .0.join(" -> "))]
    Cycle(Vec<String>),

    /// A referenced requirement ID does not exist in the corpus.
    #[error("document {document} references unknown requirement {reference}")]
    UnresolvedReference {
        /// Referencing document.
        document: String,
        /// The missing requirement ID.
        reference: String,
    },

    /// A foreign invariant references a document that exists but is
    /// not in the referencing document's `depends_on` closure.
    /// Cross-file invariants are only trusted against declared
    /// dependencies.
    #[error("document {document} references {reference} without listing it in depends_on")]
    UndeclaredDependency {
        /// Referencing document.
        document: String,
        /// The undeclared requirement ID.
        reference: String,
    },

    /// Two documents share one requirement ID.
    #[error("duplicate requirement id {id}")]
    DuplicateId {
        /// The colliding ID.
        id: String,
    },

    /// Filesystem failure while enumerating or reading sources.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
