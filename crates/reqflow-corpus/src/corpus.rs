//! The document arena.

use std::collections::BTreeMap;

use reqflow_parser::Document;

use crate::error::CorpusError;

/// An immutable set of parsed documents keyed by requirement ID.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    documents: BTreeMap<String, Document>,
}

impl Corpus {
    /// Empty corpus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a corpus from parsed documents, rejecting duplicate IDs.
    pub fn from_documents(
        documents: impl IntoIterator<Item = Document>,
    ) -> Result<Self, CorpusError> {
        let mut corpus = Self::new();
        for document in documents {
            corpus.insert(document)?;
        }
        Ok(corpus)
    }

    /// Add one document. IDs must be unique within the corpus.
    pub fn insert(&mut self, document: Document) -> Result<(), CorpusError> {
        if self.documents.contains_key(&document.id) {
            return Err(CorpusError::DuplicateId {
                id: document.id.clone(),
            });
        }
        self.documents.insert(document.id.clone(), document);
        Ok(())
    }

    /// Look up a document by requirement ID.
    pub fn get(&self, id: &str) -> Option<&Document> {
        self.documents.get(id)
    }

    /// Whether the corpus contains the given ID.
    pub fn contains(&self, id: &str) -> bool {
        self.documents.contains_key(id)
    }

    /// Iterate documents in ID order.
    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.values()
    }

    /// All requirement IDs, in order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }

    /// Number of documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the corpus holds no documents.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
