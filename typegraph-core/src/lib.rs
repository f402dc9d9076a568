//! typegraph-core: type graph resolution engine for annotation-driven generators
//!
//! This library turns language-neutral declarations into a registry of
//! resolved type nodes, then decides per generation target which nodes that
//! target has to emit.
//!
//! # Features
//!
//! - **Annotation parsing**: `@name(key:"value", flag)` doc-comment annotations and struct tags
//! - **Type registry**: canonical names, cycle-safe registration, placeholders for undeclared types
//! - **Generic instantiation**: `Node[Character,int]` nodes mirroring their base
//! - **Enum detection**: constant groups with sequence markers become enumerations
//! - **Usage tracking**: who references each node and whether it is only embedded
//! - **Reachability**: scan modes, auto-generation strategies, depth limits, seeds
//! - **Plugins**: generators choose their nodes and render the inclusion set
//! - **Validation**: annotations checked against core and plugin vocabularies
//!
//! # Quick Start
//!
//! Use the [`prelude`] module for convenient imports:
//!
//! ```rust,ignore
//! use typegraph_core::prelude::*;
//!
//! let result = Typegraph::new(CoreConfig::default())
//!     .declarations(decls)
//!     .plugin(ManifestPlugin::new("manifest", &["model"]))
//!     .run()?;
//!
//! for name in &result.target("manifest").unwrap().inclusion.included {
//!     println!("included: {}", name);
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`model`]: Declarations in, nodes and usage edges out
//! - [`annotations`]: Annotation parsing, lookup and validation
//! - [`registry`]: Canonical names and the resolution of declarations into nodes
//! - [`generics`]: Generic instantiation
//! - [`enums`]: Enum detection and value sequencing
//! - [`usage`]: Usage flags over the finished registry
//! - [`reachability`]: Inclusion sets per target
//! - [`plugin`]: The generator boundary
//! - [`builder`]: Fluent pipeline API
//! - [`error`]: Typed error handling
//!
//! # Cargo Features
//!
//! - `manifest` (default): Built-in JSON manifest plugin
//! - `full`: Enable all optional features

// Core modules (always available)
pub mod annotations;
pub mod builder;
pub mod common;
pub mod config;
pub mod enums;
pub mod error;
pub mod generics;
pub mod logging;
pub mod model;
pub mod plugin;
pub mod prelude;
pub mod reachability;
pub mod registry;
pub mod report;
pub mod usage;

// Common trait re-exports
pub use common::GraphTraversal;

// ============================================================================
// Explicit Re-exports (avoiding glob imports for clear API surface)
// ============================================================================

// Error types
pub use error::{IoResultExt, TypegraphError, TypegraphResult};

// Builder API
pub use builder::{BuildResult, BuildStats, TargetResult, Typegraph};

// Configuration
pub use config::{
    load_config, AutoGenerateConfig, AutoGenerateStrategy, Category, CoreConfig, LogLevel,
    OutOfScopeAction, ScanMode, ScanOptions, TargetConfig, ValidationAction, ValidationMode,
    ValidatorConfig,
};

// Data model
pub use model::{
    ConstDecl, Declaration, DeclarationKind, EdgeKind, EnumLiteral, EnumValue, Field, FieldDecl,
    FunctionSignature, GenericParam, IncludeType, MethodDecl, ParamDecl, TypeExpr, TypeKind,
    TypeNode, TypeParamDecl, TypeRef, TypedElement, UsageEdge, UsageInfo, UsageRole, Visibility,
};

// Annotations
pub use annotations::{
    core_specs, parse_annotation, parse_annotations, parse_struct_tags, Annotation,
    AnnotationParam, AnnotationSpec, AnnotationValidator, ParamType, Severity, StructTags, ValidOn,
    ValidationIssue, ValidationReport,
};

// Registry
pub use registry::{is_builtin, register_all, BuildContext, RegistryStats, TypeRegistry};

// Enums
pub use enums::{detect_enums, evaluate, ConstSequence};

// Reachability
pub use reachability::{
    assign_scope, compute_inclusion, extract_all_type_names, EdgeFilter, ExcludedMember,
    InclusionSet, OutOfScopeReason, PatternSet, ScopeSummary, Substitution, TypeGraph,
};

// Plugins
pub use plugin::{GeneratedFile, GeneratedOutput, GenerationContext, Plugin, PluginRegistry};

#[cfg(feature = "manifest")]
pub use plugin::ManifestPlugin;

// Logging
pub use logging::{init_structured_logging, init_structured_logging_with};

// Reporting
pub use report::{print_json, print_outputs, print_plain};
