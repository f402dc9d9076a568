//! Directed reference graph over the registry.
//!
//! Performance characteristics:
//! - Graph build: O(|V| + |E|) where V = nodes, E = member references
//! - Filtered traversal: O(|V| + |E|) per BFS
//!
//! Containers are see-through: a field of type `[]User` gets an edge to the
//! slice node and one straight to `User`, so a container never costs an
//! extra level of depth.

use petgraph::graphmap::DiGraphMap;

use crate::common::GraphTraversal;
use crate::model::{EdgeKind, TypeRef};
use crate::registry::TypeRegistry;

/// Edge kinds present between two nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeSet(u8);

impl EdgeSet {
    fn bit(kind: EdgeKind) -> u8 {
        match kind {
            EdgeKind::Field => 1,
            EdgeKind::Embedded => 2,
            EdgeKind::Signature => 4,
            EdgeKind::Structural => 8,
        }
    }

    pub fn of(kind: EdgeKind) -> Self {
        Self(Self::bit(kind))
    }

    pub fn with(self, kind: EdgeKind) -> Self {
        Self(self.0 | Self::bit(kind))
    }

    pub fn contains(self, kind: EdgeKind) -> bool {
        self.0 & Self::bit(kind) != 0
    }
}

/// Which edge kinds a traversal follows. Signature and structural edges are
/// always followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeFilter {
    pub fields: bool,
    pub embedded: bool,
}

impl EdgeFilter {
    pub const ALL: EdgeFilter = EdgeFilter {
        fields: true,
        embedded: true,
    };

    pub fn allows(self, edges: EdgeSet) -> bool {
        edges.contains(EdgeKind::Signature)
            || edges.contains(EdgeKind::Structural)
            || (self.fields && edges.contains(EdgeKind::Field))
            || (self.embedded && edges.contains(EdgeKind::Embedded))
    }
}

impl Default for EdgeFilter {
    fn default() -> Self {
        Self::ALL
    }
}

/// Reference graph borrowing node names from the registry.
pub struct TypeGraph<'r> {
    graph: DiGraphMap<&'r str, EdgeSet>,
}

impl<'r> TypeGraph<'r> {
    /// Build the graph with every node and every reference between nodes.
    pub fn build(registry: &'r TypeRegistry) -> Self {
        let mut graph = DiGraphMap::new();

        // 1. Add all nodes
        for name in registry.keys() {
            graph.add_node(name);
        }

        // 2. Add member references, looking through containers
        for (name, node) in registry.iter() {
            for member in node.member_refs() {
                let Some(target) = member.type_ref.node_key() else {
                    continue;
                };
                let mut targets = Vec::new();
                see_through(registry, target, &mut targets);
                for to in targets {
                    add_edge(&mut graph, name, to, member.edge);
                }
            }
            if let Some(base) = node.generic_base.as_deref().and_then(|b| registry.get(b)) {
                add_edge(&mut graph, name, base.canonical_name.as_str(), EdgeKind::Structural);
            }
        }

        Self { graph }
    }

    /// Same graph, traversed with another edge filter.
    pub fn filtered(&self, filter: EdgeFilter) -> FilteredGraph<'_, 'r> {
        FilteredGraph { graph: self, filter }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Edge kinds from `from` to `to`, if connected.
    pub fn edge(&self, from: &'r str, to: &'r str) -> Option<EdgeSet> {
        self.graph.edge_weight(from, to).copied()
    }

    fn neighbors_matching(&self, node: &'r str, filter: EdgeFilter) -> Vec<&'r str> {
        if !self.graph.contains_node(node) {
            return Vec::new();
        }
        self.graph
            .edges(node)
            .filter(|(_, _, edges)| filter.allows(**edges))
            .map(|(_, to, _)| to)
            .collect()
    }
}

fn add_edge<'r>(graph: &mut DiGraphMap<&'r str, EdgeSet>, from: &'r str, to: &'r str, kind: EdgeKind) {
    if from == to {
        return;
    }
    let edges = graph
        .edge_weight(from, to)
        .map(|e| e.with(kind))
        .unwrap_or_else(|| EdgeSet::of(kind));
    graph.add_edge(from, to, edges);
}

/// `target` plus, for container nodes, every node their elements and keys
/// resolve to.
fn see_through<'r>(registry: &'r TypeRegistry, target: &str, out: &mut Vec<&'r str>) {
    let Some(node) = registry.get(target) else {
        return;
    };
    let name = node.canonical_name.as_str();
    if out.contains(&name) {
        return;
    }
    out.push(name);
    if node.kind.is_container() {
        for inner in node.key.iter().chain(node.element.iter()) {
            if let TypeRef::Node(key) = inner {
                see_through(registry, key, out);
            }
        }
    }
}

impl<'r> GraphTraversal for TypeGraph<'r> {
    type Node = &'r str;

    fn neighbors(&self, node: &&'r str) -> Vec<&'r str> {
        self.neighbors_matching(*node, EdgeFilter::ALL)
    }

    fn contains_node(&self, node: &&'r str) -> bool {
        self.graph.contains_node(*node)
    }
}

/// A [`TypeGraph`] view that only follows the edges its filter allows.
pub struct FilteredGraph<'g, 'r> {
    graph: &'g TypeGraph<'r>,
    filter: EdgeFilter,
}

impl<'g, 'r> GraphTraversal for FilteredGraph<'g, 'r> {
    type Node = &'r str;

    fn neighbors(&self, node: &&'r str) -> Vec<&'r str> {
        self.graph.neighbors_matching(*node, self.filter)
    }

    fn contains_node(&self, node: &&'r str) -> bool {
        self.graph.graph.contains_node(*node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoreConfig;
    use crate::model::{Declaration, FieldDecl, TypeExpr};
    use crate::registry::{register_all, BuildContext};

    fn registry() -> TypeRegistry {
        let config = CoreConfig::default();
        let decls = vec![
            Declaration::composite(
                "app",
                "User",
                vec![
                    FieldDecl::embedded(TypeExpr::named("Base")),
                    FieldDecl::new("Roles", TypeExpr::slice(TypeExpr::named("Role"))),
                ],
            ),
            Declaration::composite("app", "Base", vec![]),
            Declaration::composite("app", "Role", vec![]),
        ];
        let mut ctx = BuildContext::new(&config, &decls);
        register_all(&mut ctx).unwrap();
        ctx.into_registry()
    }

    #[test]
    fn test_containers_are_see_through() {
        let registry = registry();
        let graph = TypeGraph::build(&registry);
        assert_eq!(graph.node_count(), 4);

        let depths = graph.reachable_within(["app.User"], Some(1));
        assert_eq!(depths.get("app.Role"), Some(&1));
        assert_eq!(depths.get("[]app.Role"), Some(&1));
        assert_eq!(graph.edge("app.User", "app.Base"), Some(EdgeSet::of(EdgeKind::Embedded)));
    }

    #[test]
    fn test_filter_drops_embedded_and_fields() {
        let registry = registry();
        let graph = TypeGraph::build(&registry);

        let no_embedded = graph.filtered(EdgeFilter {
            fields: true,
            embedded: false,
        });
        let reach = no_embedded.reachable_from(["app.User"]);
        assert!(!reach.contains("app.Base"));
        assert!(reach.contains("app.Role"));

        let nothing = graph.filtered(EdgeFilter {
            fields: false,
            embedded: false,
        });
        assert_eq!(nothing.reachable_from(["app.User"]).len(), 1);
    }

    #[test]
    fn test_edge_set_merges_kinds() {
        let set = EdgeSet::of(EdgeKind::Field).with(EdgeKind::Signature);
        assert!(set.contains(EdgeKind::Field));
        assert!(!set.contains(EdgeKind::Embedded));
        let filter = EdgeFilter {
            fields: false,
            embedded: false,
        };
        assert!(filter.allows(set));
        assert!(!filter.allows(EdgeSet::of(EdgeKind::Field)));
    }
}
