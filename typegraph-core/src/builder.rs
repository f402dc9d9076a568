//! Builder pattern API for running the type graph pipeline.
//!
//! Provides a fluent interface for configuring and running a build:
//!
//! ```rust,ignore
//! use typegraph_core::prelude::*;
//!
//! let result = Typegraph::new(config)
//!     .declarations(decls)
//!     .plugin(ManifestPlugin::new("manifest", &["model"]))
//!     .run()?;
//!
//! for target in &result.targets {
//!     println!("{}: {} node(s)", target.name, target.inclusion.len());
//! }
//! ```

use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, info_span};

use crate::annotations::{core_specs, AnnotationValidator, ValidationReport};
use crate::config::CoreConfig;
use crate::enums;
use crate::error::{TypegraphError, TypegraphResult};
use crate::model::{Declaration, TypeNode};
use crate::plugin::{GeneratedOutput, GenerationContext, Plugin, PluginRegistry};
use crate::reachability::{assign_scope, compute_inclusion, InclusionSet, ScopeSummary, TypeGraph};
use crate::registry::{register_all, BuildContext, RegistryStats, TypeRegistry};
use crate::usage;

/// Builder for configuring one pipeline run.
///
/// # Example
///
/// ```rust,ignore
/// let result = Typegraph::new(CoreConfig::default())
///     .declarations(decls)
///     .register_only()
///     .run()?;
/// ```
pub struct Typegraph {
    /// Root configuration; targets see it with their overrides applied
    config: CoreConfig,

    /// Declarations supplied by the host's parser
    declarations: Vec<Declaration>,

    /// Generation plugins, one target each
    plugins: PluginRegistry,

    /// Plugins rejected while building, reported by `run`
    plugin_errors: Vec<TypegraphError>,

    /// Stop after registration and validation
    register_only: bool,
}

impl Typegraph {
    /// Create a new builder with the given configuration.
    pub fn new(config: CoreConfig) -> Self {
        Self {
            config,
            declarations: Vec::new(),
            plugins: PluginRegistry::new(),
            plugin_errors: Vec::new(),
            register_only: false,
        }
    }

    /// Add declarations to the input set.
    pub fn declarations(mut self, decls: impl IntoIterator<Item = Declaration>) -> Self {
        self.declarations.extend(decls);
        self
    }

    /// Add a generation plugin. Duplicate names fail the run.
    pub fn plugin(self, plugin: impl Plugin + 'static) -> Self {
        self.plugin_arc(Arc::new(plugin))
    }

    /// Add a shared generation plugin.
    pub fn plugin_arc(mut self, plugin: Arc<dyn Plugin>) -> Self {
        if let Err(e) = self.plugins.register(plugin) {
            self.plugin_errors.push(e);
        }
        self
    }

    /// Skip reachability and generation.
    pub fn register_only(mut self) -> Self {
        self.register_only = true;
        self
    }

    /// Run every phase and return the results.
    pub fn run(self) -> TypegraphResult<BuildResult> {
        if let Some(err) = self.plugin_errors.into_iter().next() {
            return Err(err);
        }
        self.config.validate()?;
        let config = &self.config;

        // 1. Register declarations and gather constants
        let mut ctx = BuildContext::new(config, &self.declarations);
        info_span!("register", declarations = self.declarations.len()).in_scope(|| register_all(&mut ctx))?;

        // 2. Enums
        let enums_detected = info_span!("enums").in_scope(|| enums::detect(&mut ctx));
        let mut registry = ctx.into_registry();
        if let Some(pending) = registry.pending().next() {
            return Err(TypegraphError::internal(format!(
                "node '{}' is still under construction after registration",
                pending
            )));
        }

        // 3. Usage flags and scope
        let embedded_only = info_span!("usage").in_scope(|| usage::finalize_usage(&mut registry));
        let scope = info_span!("scope").in_scope(|| assign_scope(&mut registry, config));

        // 4. Validation against core and plugin vocabularies
        let validation = info_span!("validate").in_scope(|| {
            let mut specs = core_specs();
            specs.extend(self.plugins.all_specs());
            let plugins = self.plugins.clone();
            AnnotationValidator::new(&config.validator, specs)
                .with_known(move |ann| plugins.accepting(ann).next().is_some())
                .validate_registry(&registry)
        });
        validation.log();
        if validation.should_fail() {
            let message = validation
                .errors()
                .map(|i| i.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(TypegraphError::Validation {
                errors: validation.error_count(),
                message,
            });
        }

        let graph_edges = TypeGraph::build(&registry).edge_count();
        let stats = BuildStats {
            registry: registry.stats(),
            enums_detected,
            embedded_only,
            graph_edges,
            scope,
        };
        info!(
            nodes = stats.registry.nodes,
            enums = stats.registry.enums,
            placeholders = stats.registry.placeholders,
            graph_edges = stats.graph_edges,
            "registry complete"
        );

        // 5. Per-target reachability and generation over the read-only registry
        let targets = if self.register_only {
            Vec::new()
        } else {
            let plugins: Vec<&Arc<dyn Plugin>> = self.plugins.iter().collect();
            plugins
                .par_iter()
                .map(|plugin| run_target(&registry, config, plugin.as_ref()))
                .collect::<TypegraphResult<Vec<_>>>()?
        };

        Ok(BuildResult {
            fingerprint: registry.fingerprint(),
            registry,
            validation,
            targets,
            stats,
        })
    }
}

fn run_target(registry: &TypeRegistry, config: &CoreConfig, plugin: &dyn Plugin) -> TypegraphResult<TargetResult> {
    let name = plugin.name();
    let span = info_span!("target", target = %name);
    let _guard = span.enter();

    let target_config = config.for_target(name);
    let inclusion = compute_inclusion(registry, &target_config, name, &|node: &TypeNode| plugin.accepts_node(node))?;
    debug!(target = %name, included = inclusion.len(), "generating");

    let ctx = GenerationContext::new(name, registry, &target_config, &inclusion);
    let output = plugin.generate(&ctx)?;
    Ok(TargetResult {
        name: name.to_string(),
        inclusion,
        output,
    })
}

/// Result of one target.
#[derive(Debug, Clone, Serialize)]
pub struct TargetResult {
    pub name: String,
    pub inclusion: InclusionSet,
    pub output: GeneratedOutput,
}

/// Counters gathered while building.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildStats {
    pub registry: RegistryStats,
    pub enums_detected: usize,
    /// Nodes that are only ever embedded.
    pub embedded_only: usize,
    /// Distinct node-to-node edges in the reference graph.
    pub graph_edges: usize,
    pub scope: ScopeSummary,
}

/// Result of running the pipeline.
#[derive(Debug, Clone)]
pub struct BuildResult {
    /// The finished, read-only registry
    pub registry: TypeRegistry,

    /// Stable hash of the registry contents
    pub fingerprint: String,

    /// Annotation findings (never fatal here; fatal reports abort `run`)
    pub validation: ValidationReport,

    /// Per-target results in plugin name order
    pub targets: Vec<TargetResult>,

    pub stats: BuildStats,
}

impl BuildResult {
    pub fn target(&self, name: &str) -> Option<&TargetResult> {
        self.targets.iter().find(|t| t.name == name)
    }

    /// Warnings from every target plus validation warnings.
    pub fn warning_count(&self) -> usize {
        self.targets.iter().map(|t| t.inclusion.warnings.len()).sum::<usize>() + self.validation.warnings().count()
    }
}
