//! Include type and depth of every node relative to the scanned roots.

use std::collections::HashMap;

use serde::Serialize;

use super::graph::TypeGraph;
use crate::common::GraphTraversal;
use crate::config::CoreConfig;
use crate::model::IncludeType;
use crate::registry::TypeRegistry;

/// Where a package sits relative to the configuration.
pub fn classify_include_type(package: &str, config: &CoreConfig) -> IncludeType {
    if config.packages.iter().any(|root| matches_root(package, root)) {
        return IncludeType::Scanned;
    }
    let module = config.module_path.trim().trim_end_matches('/');
    if !module.is_empty() && (package == module || package.starts_with(&format!("{}/", module))) {
        return IncludeType::Local;
    }
    if is_std_package(package) {
        return IncludeType::Std;
    }
    IncludeType::External
}

/// Roots are package prefixes, `dir/...` for a whole tree or `dir/*.go`
/// for one directory.
fn matches_root(package: &str, root: &str) -> bool {
    let root = root.trim();
    if root.is_empty() {
        return false;
    }
    if let Some(dir) = root.strip_suffix("/...") {
        return package == dir || package.starts_with(&format!("{}/", dir));
    }
    if let Some(dir) = root.strip_suffix("/*.go") {
        return package == dir;
    }
    package.starts_with(root)
}

/// Standard-library packages have no domain in their first path segment.
pub fn is_std_package(package: &str) -> bool {
    let first = package.split('/').next().unwrap_or_default();
    !first.contains('.') || package.starts_with("golang.org/x/") || package.starts_with("std/")
}

/// Counts per include type after [`assign_scope`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScopeSummary {
    pub scanned: usize,
    pub local: usize,
    pub std: usize,
    pub external: usize,
    /// Nodes with no path from a scanned node.
    pub unreachable: usize,
}

/// Set `include_type` and `depth` on every node. Depth is the BFS distance
/// over all reference edges from the nearest scanned node.
pub fn assign_scope(registry: &mut TypeRegistry, config: &CoreConfig) -> ScopeSummary {
    let mut summary = ScopeSummary::default();
    for node in registry.values_mut() {
        node.include_type = classify_include_type(&node.package, config);
        match node.include_type {
            IncludeType::Scanned => summary.scanned += 1,
            IncludeType::Local => summary.local += 1,
            IncludeType::Std => summary.std += 1,
            IncludeType::External => summary.external += 1,
        }
    }

    let depths: HashMap<String, usize> = {
        let graph = TypeGraph::build(registry);
        let roots = registry
            .iter()
            .filter(|(_, n)| n.include_type == IncludeType::Scanned)
            .map(|(name, _)| name);
        graph
            .reachable_within(roots, None)
            .into_iter()
            .map(|(name, depth)| (name.to_string(), depth))
            .collect()
    };

    for node in registry.values_mut() {
        node.depth = depths.get(&node.canonical_name).copied();
        if node.depth.is_none() {
            summary.unreachable += 1;
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Declaration, FieldDecl, TypeExpr};
    use crate::registry::{register_all, BuildContext};

    fn config(packages: &[&str]) -> CoreConfig {
        CoreConfig {
            packages: packages.iter().map(|s| s.to_string()).collect(),
            module_path: "example.com/app".to_string(),
            ..CoreConfig::default()
        }
    }

    #[test]
    fn test_classify_include_type() {
        let cfg = config(&["example.com/app/models/..."]);
        assert_eq!(classify_include_type("example.com/app/models", &cfg), IncludeType::Scanned);
        assert_eq!(classify_include_type("example.com/app/models/v2", &cfg), IncludeType::Scanned);
        assert_eq!(classify_include_type("example.com/app/api", &cfg), IncludeType::Local);
        assert_eq!(classify_include_type("time", &cfg), IncludeType::Std);
        assert_eq!(classify_include_type("encoding/json", &cfg), IncludeType::Std);
        assert_eq!(classify_include_type("golang.org/x/text", &cfg), IncludeType::Std);
        assert_eq!(classify_include_type("github.com/google/uuid", &cfg), IncludeType::External);
    }

    #[test]
    fn test_single_directory_root() {
        let cfg = config(&["example.com/app/models/*.go"]);
        assert_eq!(classify_include_type("example.com/app/models", &cfg), IncludeType::Scanned);
        assert_eq!(classify_include_type("example.com/app/models/v2", &cfg), IncludeType::Local);
    }

    #[test]
    fn test_depth_from_scanned_nodes() {
        let cfg = config(&["example.com/app/models"]);
        let decls = vec![
            Declaration::composite(
                "example.com/app/models",
                "User",
                vec![FieldDecl::new("Id", TypeExpr::qualified("github.com/google/uuid", "UUID"))],
            ),
            Declaration::composite("example.com/app/api", "Orphan", vec![]),
        ];
        let mut ctx = BuildContext::new(&cfg, &decls);
        register_all(&mut ctx).unwrap();
        let mut registry = ctx.into_registry();

        let summary = assign_scope(&mut registry, &cfg);
        assert_eq!(summary.scanned, 1);
        assert_eq!(summary.local, 1);
        assert_eq!(summary.external, 1);
        assert_eq!(summary.unreachable, 1);

        assert_eq!(registry.get("example.com/app/models.User").unwrap().depth, Some(0));
        let uuid = registry.get("github.com/google/uuid.UUID").unwrap();
        assert_eq!(uuid.depth, Some(1));
        assert_eq!(uuid.include_type, IncludeType::External);
        assert_eq!(registry.get("example.com/app/api.Orphan").unwrap().depth, None);
    }
}
