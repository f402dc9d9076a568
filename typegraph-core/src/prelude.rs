//! Prelude module for convenient imports.
//!
//! Import commonly used types with a single line:
//!
//! ```rust,ignore
//! use typegraph_core::prelude::*;
//! ```
//!
//! This provides what a host needs to run a build and what a plugin needs
//! to read the graph, without the lower-level resolution helpers.

// Errors
pub use crate::error::{TypegraphError, TypegraphResult};

// Input declarations
pub use crate::model::{
    ConstDecl, Declaration, DeclarationKind, FieldDecl, MethodDecl, ParamDecl, TypeExpr,
};

// Graph nodes
pub use crate::model::{EnumLiteral, EnumValue, Field, TypeKind, TypeNode, TypeRef};
pub use crate::registry::TypeRegistry;

// Annotations
pub use crate::annotations::{Annotation, AnnotationParam, AnnotationSpec, ParamType, ValidOn};

// Configuration
pub use crate::config::{load_config, CoreConfig};

// Reachability results
pub use crate::reachability::InclusionSet;

// Plugins
pub use crate::plugin::{GeneratedFile, GeneratedOutput, GenerationContext, Plugin, PluginRegistry};
#[cfg(feature = "manifest")]
pub use crate::plugin::ManifestPlugin;

// Builder API
pub use crate::builder::{BuildResult, TargetResult, Typegraph};
