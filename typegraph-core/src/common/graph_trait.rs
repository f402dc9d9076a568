//! Shared graph traversal abstraction.
//!
//! Both the scope pass (depth from scanned roots) and the reachability
//! engine (seed closure, depth-bounded augmentation) run the same BFS over
//! differently filtered views of the type graph.

use std::collections::{HashMap, HashSet, VecDeque};
use std::hash::Hash;

/// Trait for graph traversal operations.
///
/// # Example
/// ```ignore
/// impl GraphTraversal for TypeGraph<'_> {
///     type Node = &'r str;
///
///     fn neighbors(&self, node: &&'r str) -> Vec<&'r str> { ... }
///     fn contains_node(&self, node: &&'r str) -> bool { ... }
/// }
///
/// let closure = graph.reachable_from(seeds);
/// let within_two = graph.reachable_within(accepted, Some(2));
/// ```
pub trait GraphTraversal {
    /// The type used to identify nodes in the graph.
    type Node: Clone + Eq + Hash;

    /// Returns all neighbors (outgoing edges) of a node.
    fn neighbors(&self, node: &Self::Node) -> Vec<Self::Node>;

    /// Checks if the graph contains a node.
    fn contains_node(&self, node: &Self::Node) -> bool;

    /// Multi-source BFS recording the distance of every node reached.
    ///
    /// Roots sit at depth 0. With `limit = Some(n)` nothing deeper than `n`
    /// is visited; `None` explores the whole closure. Roots missing from the
    /// graph are ignored.
    ///
    /// Complexity: O(|V| + |E|) regardless of the number of roots.
    fn reachable_within<I>(&self, roots: I, limit: Option<usize>) -> HashMap<Self::Node, usize>
    where
        I: IntoIterator<Item = Self::Node>,
    {
        let mut depths = HashMap::new();
        let mut queue = VecDeque::new();

        for root in roots {
            if self.contains_node(&root) && !depths.contains_key(&root) {
                depths.insert(root.clone(), 0);
                queue.push_back((root, 0));
            }
        }

        while let Some((node, depth)) = queue.pop_front() {
            if limit.is_some_and(|max| depth >= max) {
                continue;
            }
            for neighbor in self.neighbors(&node) {
                if !depths.contains_key(&neighbor) {
                    depths.insert(neighbor.clone(), depth + 1);
                    queue.push_back((neighbor, depth + 1));
                }
            }
        }

        depths
    }

    /// All nodes reachable from any root, without a depth bound.
    fn reachable_from<I>(&self, roots: I) -> HashSet<Self::Node>
    where
        I: IntoIterator<Item = Self::Node>,
    {
        self.reachable_within(roots, None).into_keys().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Simple test graph implementation for unit testing.
    struct TestGraph {
        nodes: HashSet<String>,
        edges: HashMap<String, Vec<String>>,
    }

    impl TestGraph {
        fn new() -> Self {
            Self {
                nodes: HashSet::new(),
                edges: HashMap::new(),
            }
        }

        fn add_node(&mut self, node: &str) {
            self.nodes.insert(node.to_string());
        }

        fn add_edge(&mut self, from: &str, to: &str) {
            self.add_node(from);
            self.add_node(to);
            self.edges
                .entry(from.to_string())
                .or_default()
                .push(to.to_string());
        }
    }

    impl GraphTraversal for TestGraph {
        type Node = String;

        fn neighbors(&self, node: &String) -> Vec<String> {
            self.edges.get(node).cloned().unwrap_or_default()
        }

        fn contains_node(&self, node: &String) -> bool {
            self.nodes.contains(node)
        }
    }

    fn chain() -> TestGraph {
        let mut graph = TestGraph::new();
        graph.add_edge("s", "a");
        graph.add_edge("a", "b");
        graph.add_edge("b", "c");
        graph
    }

    #[test]
    fn test_empty_graph() {
        let graph = TestGraph::new();
        let reachable = graph.reachable_from(Vec::<String>::new());
        assert!(reachable.is_empty());
    }

    #[test]
    fn test_depth_limit() {
        let graph = chain();
        let one = graph.reachable_within(["s".to_string()], Some(1));
        assert_eq!(one.len(), 2);
        assert_eq!(one.get("a"), Some(&1));
        assert!(!one.contains_key("b"));

        let two = graph.reachable_within(["s".to_string()], Some(2));
        assert_eq!(two.get("b"), Some(&2));

        let all = graph.reachable_within(["s".to_string()], None);
        assert_eq!(all.get("c"), Some(&3));
    }

    #[test]
    fn test_zero_limit_keeps_roots_only() {
        let graph = chain();
        let roots = graph.reachable_within(["s".to_string()], Some(0));
        assert_eq!(roots.len(), 1);
    }

    #[test]
    fn test_multi_source_takes_shortest_depth() {
        let graph = chain();
        let depths = graph.reachable_within(["s".to_string(), "b".to_string()], None);
        assert_eq!(depths.get("b"), Some(&0));
        assert_eq!(depths.get("c"), Some(&1));
    }

    #[test]
    fn test_cycle() {
        let mut graph = TestGraph::new();
        graph.add_edge("a", "b");
        graph.add_edge("b", "c");
        graph.add_edge("c", "a"); // Cycle back to a

        let reachable = graph.reachable_from(["a".to_string()]);
        assert_eq!(reachable.len(), 3);
    }

    #[test]
    fn test_missing_root_ignored() {
        let mut graph = TestGraph::new();
        graph.add_node("a");

        // "missing" is not in graph, should be ignored
        let reachable = graph.reachable_from(["a".to_string(), "missing".to_string()]);
        assert_eq!(reachable.len(), 1);
        assert!(reachable.contains("a"));
    }
}
