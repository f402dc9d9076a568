//! Usage tracking: who references each node, and how.
//!
//! Edges are recorded while declarations resolve; [`finalize_usage`] runs
//! once the registry is complete and recomputes every derived flag.

use crate::model::{TypeRef, UsageEdge, UsageRole};
use crate::registry::TypeRegistry;

/// Record that `referencer.member` uses `target` in `role`.
///
/// Builtins and parameters carry no usage. Returns true if a new edge was
/// stored; repeating the same site is a no-op.
pub fn track(
    registry: &mut TypeRegistry,
    target: &TypeRef,
    referencer: &str,
    member: &str,
    role: UsageRole,
) -> bool {
    let Some(key) = target.node_key() else {
        return false;
    };
    match registry.get_mut(key) {
        Some(node) => node.usage.record(UsageEdge::new(referencer, member, role)),
        None => false,
    }
}

/// Recompute the embedded-only flag of every node. Returns how many nodes
/// are only ever embedded.
pub fn finalize_usage(registry: &mut TypeRegistry) -> usize {
    let mut embedded_only = 0;
    for node in registry.values_mut() {
        node.usage.refresh();
        if node.usage.embedded_only {
            embedded_only += 1;
        }
    }
    embedded_only
}

/// Canonical names of nodes nothing references.
pub fn unreferenced(registry: &TypeRegistry) -> Vec<&str> {
    registry
        .iter()
        .filter(|(_, node)| !node.usage.is_used() && !node.placeholder)
        .map(|(name, _)| name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TypeKind, TypeNode};

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry.insert(TypeNode::skeleton("app.Base", "Base", "app", TypeKind::Composite));
        registry.insert(TypeNode::skeleton("app.User", "User", "app", TypeKind::Composite));
        registry
    }

    #[test]
    fn test_track_is_idempotent() {
        let mut registry = registry();
        let base = TypeRef::Node("app.Base".into());
        assert!(track(&mut registry, &base, "app.User", "", UsageRole::Embedded));
        assert!(!track(&mut registry, &base, "app.User", "", UsageRole::Embedded));
        assert_eq!(registry.get("app.Base").unwrap().usage.edges.len(), 1);
        assert!(registry.get("app.Base").unwrap().usage.embedded_only);

        assert!(track(&mut registry, &base, "app.User", "Base", UsageRole::Field));
        assert!(!registry.get("app.Base").unwrap().usage.embedded_only);
    }

    #[test]
    fn test_builtins_and_unknown_nodes_are_ignored() {
        let mut registry = registry();
        assert!(!track(&mut registry, &TypeRef::Builtin("string".into()), "app.User", "Name", UsageRole::Field));
        assert!(!track(&mut registry, &TypeRef::Param("T".into()), "app.User", "V", UsageRole::Field));
        assert!(!track(&mut registry, &TypeRef::Node("app.Missing".into()), "app.User", "M", UsageRole::Field));
    }

    #[test]
    fn test_finalize_and_unreferenced() {
        let mut registry = registry();
        track(&mut registry, &TypeRef::Node("app.Base".into()), "app.User", "", UsageRole::Embedded);
        assert_eq!(finalize_usage(&mut registry), 1);
        assert_eq!(unreferenced(&registry), vec!["app.User"]);
    }
}
