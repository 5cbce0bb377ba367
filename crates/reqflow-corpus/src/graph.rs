//! The `depends_on` dependency graph.

use std::collections::{BTreeMap, BTreeSet};

use crate::corpus::Corpus;

/// Directed graph over requirement IDs, edges following `depends_on`.
///
/// Built once per resolution pass; nodes are IDs, not document
/// references, so the corpus stays free of object cycles.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    edges: BTreeMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Build the graph from every document's `depends_on` list.
    pub fn from_corpus(corpus: &Corpus) -> Self {
        let mut edges = BTreeMap::new();
        for document in corpus.iter() {
            edges.insert(document.id.clone(), document.frontmatter.depends_on.clone());
        }
        Self { edges }
    }

    /// Direct dependencies of one node.
    pub fn dependencies(&self, id: &str) -> &[String] {
        self.edges.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Find a dependency cycle, if one exists.
    ///
    /// Returns the cycle's ID sequence starting and ending at the same
    /// node, e.g. `[A, B, A]`. Deterministic: nodes are visited in ID
    /// order.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let mut visited: BTreeSet<&str> = BTreeSet::new();
        for start in self.edges.keys() {
            if visited.contains(start.as_str()) {
                continue;
            }
            let mut path: Vec<&str> = Vec::new();
            let mut on_path: BTreeSet<&str> = BTreeSet::new();
            if let Some(cycle) = self.dfs(start, &mut visited, &mut path, &mut on_path) {
                return Some(cycle);
            }
        }
        None
    }

    fn dfs<'a>(
        &'a self,
        node: &'a str,
        visited: &mut BTreeSet<&'a str>,
        path: &mut Vec<&'a str>,
        on_path: &mut BTreeSet<&'a str>,
    ) -> Option<Vec<String>> {
        visited.insert(node);
        path.push(node);
        on_path.insert(node);

        for next in self.dependencies(node) {
            if on_path.contains(next.as_str()) {
                // Close the loop for reporting.
                let from = path.iter().position(|n| *n == next).unwrap_or(0);
                let mut cycle: Vec<String> = path[from..].iter().map(|s| s.to_string()).collect();
                cycle.push(next.clone());
                return Some(cycle);
            }
            if !visited.contains(next.as_str()) && self.edges.contains_key(next.as_str()) {
                if let Some(cycle) = self.dfs(next, visited, path, on_path) {
                    return Some(cycle);
                }
            }
        }

        path.pop();
        on_path.remove(node);
        None
    }

    /// Transitive `depends_on` closure of one node, the node itself
    /// excluded.
    pub fn closure(&self, id: &str) -> BTreeSet<String> {
        let mut closure = BTreeSet::new();
        let mut stack: Vec<&str> = self.dependencies(id).iter().map(String::as_str).collect();
        while let Some(node) = stack.pop() {
            if closure.insert(node.to_string()) {
                stack.extend(self.dependencies(node).iter().map(String::as_str));
            }
        }
        closure
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::tests_support::minimal_document;

    fn graph(spec: &[(&str, &[&str])]) -> DependencyGraph {
        let corpus = Corpus::from_documents(
            spec.iter().map(|(id, deps)| minimal_document(id, deps)),
        )
        .unwrap();
        DependencyGraph::from_corpus(&corpus)
    }

    #[test]
    fn test_no_cycle_in_chain() {
        let g = graph(&[("A", &["B"]), ("B", &["C"]), ("C", &[])]);
        assert_eq!(g.find_cycle(), None);
    }

    #[test]
    fn test_two_node_cycle_named() {
        let g = graph(&[("A", &["B"]), ("B", &["A"])]);
        let cycle = g.find_cycle().unwrap();
        assert_eq!(cycle, vec!["A", "B", "A"]);
    }

    #[test]
    fn test_self_cycle() {
        let g = graph(&[("A", &["A"])]);
        assert_eq!(g.find_cycle().unwrap(), vec!["A", "A"]);
    }

    #[test]
    fn test_longer_cycle() {
        let g = graph(&[("A", &["B"]), ("B", &["C"]), ("C", &["A"]), ("D", &["A"])]);
        let cycle = g.find_cycle().unwrap();
        assert_eq!(cycle.first(), cycle.last());
        assert!(cycle.len() == 4);
    }

    #[test]
    fn test_closure_is_transitive() {
        let g = graph(&[("A", &["B"]), ("B", &["C"]), ("C", &[]), ("D", &[])]);
        let closure = g.closure("A");
        assert!(closure.contains("B"));
        assert!(closure.contains("C"));
        assert!(!closure.contains("A"));
        assert!(!closure.contains("D"));
        assert!(g.closure("C").is_empty());
    }

    #[test]
    fn test_edges_to_unknown_ids_do_not_panic() {
        let g = graph(&[("A", &["MISSING-1"])]);
        assert_eq!(g.find_cycle(), None);
        assert!(g.closure("A").contains("MISSING-1"));
    }
}
