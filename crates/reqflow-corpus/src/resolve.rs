//! Cross-document invariant resolution.
//!
//! Foreign-scoped invariants (`"OTHER-ID: statement"`) are only
//! trusted when the referencing document lists the referenced ID,
//! directly or transitively, in `depends_on`. This keeps every
//! cross-file coupling declared.

use std::collections::BTreeMap;

use reqflow_parser::Scope;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::corpus::Corpus;
use crate::error::CorpusError;
use crate::graph::DependencyGraph;

/// A foreign invariant whose target was found and declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedInvariant {
    /// Referencing document.
    pub source: String,
    /// Referenced document.
    pub target: String,
    /// The invariant statement, prefix stripped.
    pub text: String,
}

/// The fully-resolved, immutable view of one corpus.
#[derive(Debug)]
pub struct Resolution {
    /// The document arena.
    pub corpus: Corpus,
    /// The dependency graph the resolution was computed over.
    pub graph: DependencyGraph,
    /// Resolved foreign invariants, keyed by referencing document.
    pub resolved: BTreeMap<String, Vec<ResolvedInvariant>>,
    /// Per-document resolution failures. Documents absent from this
    /// map resolved cleanly; failures here do not discard the rest of
    /// the corpus.
    pub failures: BTreeMap<String, Vec<CorpusError>>,
}

impl Resolution {
    /// Whether every document resolved without errors.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Resolve a corpus.
///
/// A dependency cycle is fatal for the whole pass and is returned as
/// `Err`, naming the cycle's ID sequence. All other failures are
/// per-document and land in [`Resolution::failures`].
#[instrument(skip(corpus), fields(documents = corpus.len()))]
pub fn resolve(corpus: Corpus) -> Result<Resolution, CorpusError> {
    let graph = DependencyGraph::from_corpus(&corpus);
    if let Some(cycle) = graph.find_cycle() {
        warn!(?cycle, "dependency cycle detected");
        return Err(CorpusError::Cycle(cycle));
    }

    let mut resolved: BTreeMap<String, Vec<ResolvedInvariant>> = BTreeMap::new();
    let mut failures: BTreeMap<String, Vec<CorpusError>> = BTreeMap::new();

    for document in corpus.iter() {
        let mut errors = Vec::new();

        // Declared dependencies must exist before anything is trusted
        // against them.
        for dep in &document.frontmatter.depends_on {
            if !corpus.contains(dep) {
                errors.push(CorpusError::UnresolvedReference {
                    document: document.id.clone(),
                    reference: dep.clone(),
                });
            }
        }

        let closure = graph.closure(&document.id);
        let invariants = document
            .validate
            .as_ref()
            .map(|v| v.invariants.as_slice())
            .unwrap_or(&[]);

        for invariant in invariants {
            let Scope::Foreign(target) = &invariant.scope else {
                continue;
            };
            if !corpus.contains(target) {
                errors.push(CorpusError::UnresolvedReference {
                    document: document.id.clone(),
                    reference: target.clone(),
                });
                continue;
            }
            if !closure.contains(target) {
                errors.push(CorpusError::UndeclaredDependency {
                    document: document.id.clone(),
                    reference: target.clone(),
                });
                continue;
            }
            resolved
                .entry(document.id.clone())
                .or_default()
                .push(ResolvedInvariant {
                    source: document.id.clone(),
                    target: target.clone(),
                    text: invariant.text.clone(),
                });
        }

        if !errors.is_empty() {
            failures.insert(document.id.clone(), errors);
        }
    }

    debug!(
        resolved = resolved.len(),
        failed = failures.len(),
        "corpus resolution finished"
    );
    Ok(Resolution {
        corpus,
        graph,
        resolved,
        failures,
    })
}


#[cfg(test)]
mod tests {
    use super::tests_support::{document_with_invariants, minimal_document};
    use super::*;

    #[test]
    fn test_cycle_is_fatal_and_named() {
        let corpus = Corpus::from_documents(vec![
            minimal_document("A", &["B"]),
            minimal_document("B", &["A"]),
        ])
        .unwrap();
        let err = resolve(corpus).unwrap_err();
        match err {
            CorpusError::Cycle(cycle) => assert_eq!(cycle, vec!["A", "B", "A"]),
            other => panic!("expected cycle, got {other}"),
        }
    }

    #[test]
    fn test_foreign_invariant_resolves_through_closure() {
        // A depends on B, B depends on C; A may reference C.
        let corpus = Corpus::from_documents(vec![
            document_with_invariants("A", &["B"], &["C"]),
            minimal_document("B", &["C"]),
            minimal_document("C", &[]),
        ])
        .unwrap();
        let resolution = resolve(corpus).unwrap();
        assert!(resolution.is_clean());
        let resolved = &resolution.resolved["A"];
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].target, "C");
    }

    #[test]
    fn test_unknown_reference_fails_per_document() {
        let corpus = Corpus::from_documents(vec![
            document_with_invariants("A", &[], &["GHOST-1"]),
            minimal_document("B", &[]),
        ])
        .unwrap();
        let resolution = resolve(corpus).unwrap();
        assert!(!resolution.is_clean());
        assert!(matches!(
            resolution.failures["A"][0],
            CorpusError::UnresolvedReference { ref reference, .. } if reference == "GHOST-1"
        ));
        // B is unaffected by A's failure.
        assert!(!resolution.failures.contains_key("B"));
    }

    #[test]
    fn test_undeclared_dependency_rejected() {
        // C exists, but A does not declare it.
        let corpus = Corpus::from_documents(vec![
            document_with_invariants("A", &[], &["C"]),
            minimal_document("C", &[]),
        ])
        .unwrap();
        let resolution = resolve(corpus).unwrap();
        assert!(matches!(
            resolution.failures["A"][0],
            CorpusError::UndeclaredDependency { ref reference, .. } if reference == "C"
        ));
        assert!(resolution.resolved.get("A").is_none());
    }

    #[test]
    fn test_missing_depends_on_target_reported() {
        let corpus =
            Corpus::from_documents(vec![minimal_document("A", &["MISSING-9"])]).unwrap();
        let resolution = resolve(corpus).unwrap();
        assert!(matches!(
            resolution.failures["A"][0],
            CorpusError::UnresolvedReference { ref reference, .. } if reference == "MISSING-9"
        ));
    }

    #[test]
    fn test_own_document_invariants_need_no_resolution() {
        let mut document = minimal_document("A", &[]);
        document.validate = Some(reqflow_parser::ValidateBlock {
            invariants: vec![reqflow_parser::InvariantStatement {
                scope: Scope::OwnDocument,
                text: "holds locally".into(),
            }],
            ..Default::default()
        });
        let corpus = Corpus::from_documents(vec![document]).unwrap();
        let resolution = resolve(corpus).unwrap();
        assert!(resolution.is_clean());
        assert!(resolution.resolved.is_empty());
    }
}
