// SPDX-License-Identifier: MIT

//! Directed graph over agent ids with in-path DFS cycle detection.
//!
//! Used for both `dependsOn` edges (executor) and route edges (parser).

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    InPath,
    Done,
}

/// Adjacency list keyed by node id, nodes kept in insertion order
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    order: Vec<String>,
    edges: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, id: &str) {
        if !self.edges.contains_key(id) {
            self.order.push(id.to_string());
            self.edges.insert(id.to_string(), Vec::new());
        }
    }

    /// Add `from -> to`, creating either node if needed
    pub fn add_edge(&mut self, from: &str, to: &str) {
        self.add_node(from);
        self.add_node(to);
        if let Some(targets) = self.edges.get_mut(from) {
            targets.push(to.to_string());
        }
    }

    pub fn edges_from(&self, id: &str) -> &[String] {
        self.edges.get(id).map(|e| e.as_slice()).unwrap_or(&[])
    }

    /// First cycle found, as a path that starts and ends on the same node
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let mut marks: HashMap<&str, Mark> = HashMap::new();
        let mut path: Vec<&str> = Vec::new();

        for node in &self.order {
            if !marks.contains_key(node.as_str()) {
                if let Some(cycle) = self.visit(node, &mut marks, &mut path) {
                    return Some(cycle);
                }
            }
        }
        None
    }

    pub fn has_cycle(&self) -> bool {
        self.find_cycle().is_some()
    }

    fn visit<'a>(
        &'a self,
        node: &'a str,
        marks: &mut HashMap<&'a str, Mark>,
        path: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
        marks.insert(node, Mark::InPath);
        path.push(node);

        for next in self.edges_from(node) {
            match marks.get(next.as_str()) {
                Some(Mark::InPath) => {
                    let start = path.iter().position(|n| *n == next.as_str()).unwrap_or(0);
                    let mut cycle: Vec<String> = path[start..].iter().map(|n| n.to_string()).collect();
                    cycle.push(next.clone());
                    return Some(cycle);
                }
                Some(Mark::Done) => continue,
                None => {
                    if let Some(cycle) = self.visit(next, marks, path) {
                        return Some(cycle);
                    }
                }
            }
        }

        path.pop();
        marks.insert(node, Mark::Done);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(&str, &str)]) -> DependencyGraph {
        let mut g = DependencyGraph::new();
        for (from, to) in edges {
            g.add_edge(from, to);
        }
        g
    }

    #[test]
    fn test_empty_graph_has_no_cycle() {
        assert!(!DependencyGraph::new().has_cycle());
    }

    #[test]
    fn test_chain_has_no_cycle() {
        assert!(!graph(&[("1", "2"), ("2", "3")]).has_cycle());
    }

    #[test]
    fn test_diamond_has_no_cycle() {
        let g = graph(&[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")]);
        assert!(g.find_cycle().is_none());
    }

    #[test]
    fn test_three_node_cycle_path() {
        let g = graph(&[("1", "2"), ("2", "3"), ("3", "1")]);
        assert_eq!(g.find_cycle().unwrap(), vec!["1", "2", "3", "1"]);
    }

    #[test]
    fn test_self_loop() {
        let g = graph(&[("a", "a")]);
        assert_eq!(g.find_cycle().unwrap(), vec!["a", "a"]);
    }

    #[test]
    fn test_cycle_not_reachable_from_first_node() {
        let g = graph(&[("x", "y"), ("b", "c"), ("c", "b")]);
        assert_eq!(g.find_cycle().unwrap(), vec!["b", "c", "b"]);
    }
}
