//! Generation plugins: the boundary between the engine and code generators.
//!
//! A plugin decides which annotated nodes it accepts and turns the inclusion
//! set of its target into output. The engine never inspects the output.
//!
//! ```rust,ignore
//! struct Docs;
//!
//! impl Plugin for Docs {
//!     fn name(&self) -> &str { "docs" }
//!     fn accepts_annotation(&self, a: &Annotation) -> bool { a.name == "doc" }
//!     fn generate(&self, ctx: &GenerationContext<'_>) -> TypegraphResult<GeneratedOutput> {
//!         Ok(GeneratedOutput::Single(ctx.nodes.iter().map(|n| n.name.as_str()).collect()))
//!     }
//! }
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::annotations::{Annotation, AnnotationSpec};
use crate::config::CoreConfig;
use crate::error::{TypegraphError, TypegraphResult};
use crate::generics::split_instance_name;
use crate::model::{TypeNode, TypeRef};
use crate::reachability::{resolve_seed_name, InclusionSet};
use crate::registry::{is_builtin, TypeRegistry};

/// A code generator driven by the type graph.
pub trait Plugin: Send + Sync {
    /// Unique name; also the key of the target's configuration overrides.
    fn name(&self) -> &str;

    /// Annotations this plugin understands, added to the validator.
    fn annotation_specs(&self) -> Vec<AnnotationSpec> {
        Vec::new()
    }

    fn accepts_annotation(&self, annotation: &Annotation) -> bool;

    /// Direct acceptance of a node. Defaults to carrying any accepted annotation.
    fn accepts_node(&self, node: &TypeNode) -> bool {
        node.annotations.iter().any(|a| self.accepts_annotation(a))
    }

    fn generate(&self, ctx: &GenerationContext<'_>) -> TypegraphResult<GeneratedOutput>;
}

/// Read-only view handed to [`Plugin::generate`].
pub struct GenerationContext<'a> {
    pub target: &'a str,
    /// Included nodes in canonical-name order.
    pub nodes: Vec<&'a TypeNode>,
    pub registry: &'a TypeRegistry,
    /// Configuration with the target's overrides applied.
    pub config: &'a CoreConfig,
    pub inclusion: &'a InclusionSet,
}

impl<'a> GenerationContext<'a> {
    pub fn new(
        target: &'a str,
        registry: &'a TypeRegistry,
        config: &'a CoreConfig,
        inclusion: &'a InclusionSet,
    ) -> Self {
        let nodes = inclusion
            .included
            .iter()
            .filter_map(|name| registry.get(name))
            .collect();
        Self {
            target,
            nodes,
            registry,
            config,
            inclusion,
        }
    }

    /// Nodes the plugin accepted directly.
    pub fn accepted(&self) -> impl Iterator<Item = &'a TypeNode> + '_ {
        self.inclusion
            .accepted
            .iter()
            .filter_map(|name| self.registry.get(name))
    }

    /// Canonical name for a short or package-qualified name.
    pub fn resolve_name(&self, name: &str) -> Option<String> {
        resolve_seed_name(self.registry, name, "")
    }

    /// Declared type parameter names of a node.
    pub fn generic_params(&self, canonical: &str) -> Vec<&'a str> {
        self.registry
            .get(canonical)
            .map(|n| n.generic_params.iter().map(|p| p.name.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        is_builtin(name)
    }

    /// Generic base of an instantiation, e.g. `app.Page` for `app.Page[app.User]`.
    pub fn instance_base<'n>(&self, canonical: &'n str) -> Option<&'n str>
    where
        'a: 'n,
    {
        match self.registry.get(canonical).and_then(|n| n.generic_base.as_deref()) {
            Some(base) => Some(base),
            None => split_instance_name(canonical).map(|(base, _)| base),
        }
    }

    /// Resolved type arguments of an instantiation.
    pub fn instance_args(&self, canonical: &str) -> &'a [TypeRef] {
        self.registry
            .get(canonical)
            .map(|n| n.type_args.as_slice())
            .unwrap_or_default()
    }

    /// True if `member` of `node` was dropped by the out-of-scope policy.
    pub fn is_excluded_member(&self, node: &str, member: &str) -> bool {
        self.inclusion.is_excluded_member(node, member)
    }
}

/// One generated artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GeneratedFile {
    pub path: String,
    pub content: String,
    pub metadata: BTreeMap<String, String>,
}

/// What a plugin produced for its target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratedOutput {
    Single(String),
    Files(Vec<GeneratedFile>),
}

impl GeneratedOutput {
    pub fn file_count(&self) -> usize {
        match self {
            GeneratedOutput::Single(_) => 1,
            GeneratedOutput::Files(files) => files.len(),
        }
    }
}

/// Plugins keyed by unique name, in name order.
#[derive(Default, Clone)]
pub struct PluginRegistry {
    plugins: BTreeMap<String, Arc<dyn Plugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plugin. A name that is already taken is an error.
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) -> TypegraphResult<()> {
        let name = plugin.name().to_string();
        if name.trim().is_empty() {
            return Err(TypegraphError::invalid_argument("plugin name must not be empty"));
        }
        if self.plugins.contains_key(&name) {
            return Err(TypegraphError::plugin(name, "a plugin with this name is already registered"));
        }
        self.plugins.insert(name, plugin);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Plugin>> {
        self.plugins.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.plugins.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Plugin>> {
        self.plugins.values()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Plugins that accept `annotation`.
    pub fn accepting<'s>(&'s self, annotation: &'s Annotation) -> impl Iterator<Item = &'s Arc<dyn Plugin>> + 's {
        self.plugins.values().filter(move |p| p.accepts_annotation(annotation))
    }

    /// Specs of every plugin, for the validator.
    pub fn all_specs(&self) -> Vec<AnnotationSpec> {
        self.plugins.values().flat_map(|p| p.annotation_specs()).collect()
    }
}

#[cfg(feature = "manifest")]
pub use manifest::ManifestPlugin;

#[cfg(feature = "manifest")]
mod manifest {
    use serde_json::{json, Value};

    use super::*;
    use crate::annotations::matches_annotation;

    /// Emits a JSON manifest of every included node.
    pub struct ManifestPlugin {
        name: String,
        annotations: Vec<String>,
    }

    impl ManifestPlugin {
        pub fn new(name: impl Into<String>, annotations: &[&str]) -> Self {
            Self {
                name: name.into(),
                annotations: annotations.iter().map(|a| a.to_string()).collect(),
            }
        }

        fn node_entry(&self, ctx: &GenerationContext<'_>, node: &TypeNode) -> Value {
            let fields: Vec<Value> = node
                .fields
                .iter()
                .filter(|f| !ctx.is_excluded_member(&node.canonical_name, f.name()))
                .map(|f| {
                    json!({
                        "name": f.name(),
                        "type": f.type_ref().name(),
                        "embedded": f.embedded,
                        "pointer": f.element.is_pointer,
                    })
                })
                .collect();
            let values: Vec<Value> = node
                .enum_values
                .iter()
                .map(|v| json!({ "name": v.name, "value": v.value }))
                .collect();
            let annotations: Vec<&str> = node.annotations.iter().map(|a| a.name.as_str()).collect();

            json!({
                "canonical": node.canonical_name,
                "name": node.name,
                "package": node.package,
                "kind": node.kind,
                "depth": ctx.inclusion.depths.get(&node.canonical_name),
                "accepted": ctx.inclusion.accepted.contains(&node.canonical_name),
                "annotations": annotations,
                "generic_params": ctx.generic_params(&node.canonical_name),
                "generic_base": ctx.instance_base(&node.canonical_name),
                "fields": fields,
                "enum_values": values,
            })
        }
    }

    impl Plugin for ManifestPlugin {
        fn name(&self) -> &str {
            &self.name
        }

        fn annotation_specs(&self) -> Vec<AnnotationSpec> {
            self.annotations
                .iter()
                .map(|a| AnnotationSpec::new(a.as_str()).describe(format!("Include the type in the {} manifest", self.name)))
                .collect()
        }

        fn accepts_annotation(&self, annotation: &Annotation) -> bool {
            let names: Vec<&str> = self.annotations.iter().map(String::as_str).collect();
            matches_annotation(&annotation.name, "", &names)
        }

        fn generate(&self, ctx: &GenerationContext<'_>) -> TypegraphResult<GeneratedOutput> {
            let nodes: Vec<Value> = ctx.nodes.iter().map(|n| self.node_entry(ctx, n)).collect();
            let manifest = json!({
                "target": ctx.target,
                "fingerprint": ctx.registry.fingerprint(),
                "nodes": nodes,
                "excluded_members": ctx.inclusion.excluded_members,
                "substitutions": ctx.inclusion.substitutions,
                "warnings": ctx.inclusion.warnings,
            });
            let content = serde_json::to_string_pretty(&manifest)
                .map_err(|e| TypegraphError::plugin(&self.name, e.to_string()))?;
            Ok(GeneratedOutput::Single(content))
        }
    }
}
