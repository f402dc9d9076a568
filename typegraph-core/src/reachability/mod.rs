//! Reachability: which nodes each generation target includes.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐     ┌─────────────────────┐
//! │     graph.rs        │     │     seeds.rs        │
//! │  ─────────────────  │     │  ─────────────────  │
//! │  petgraph edges     │     │  Seed annotations   │
//! │  Edge filters       │     │  Schema syntax      │
//! └──────────┬──────────┘     └──────────┬──────────┘
//!            │                           │
//!            │    ┌─────────────────────┐│
//!            │    │    patterns.rs      ││
//!            │    │  Include / exclude  ││
//!            │    └──────────┬──────────┘│
//!            └───────────┬───┴───────────┘
//!                        ▼
//!            ┌─────────────────────┐     ┌─────────────────────┐
//!            │     engine.rs       │     │     scope.rs        │
//!            │  ─────────────────  │     │  ─────────────────  │
//!            │  Scan modes         │     │  Include type       │
//!            │  Strategies         │     │  Depth from roots   │
//!            │  Out-of-scope rules │     │                     │
//!            └─────────────────────┘     └─────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use typegraph_core::reachability::compute_inclusion;
//!
//! let target_config = config.for_target("openapi");
//! let set = compute_inclusion(&registry, &target_config, "openapi", &|node| {
//!     node.has_annotation("schema")
//! })?;
//!
//! for name in &set.included {
//!     println!("{} (depth {:?})", name, set.depths.get(name));
//! }
//! ```

pub mod engine;
pub mod graph;
pub mod patterns;
pub mod scope;
pub mod seeds;

pub use engine::{
    compute_inclusion, is_conventional_param, is_skipped, ExcludedMember, InclusionSet, OutOfScopeReason, Substitution,
};
pub use graph::{EdgeFilter, EdgeSet, FilteredGraph, TypeGraph};
pub use patterns::{compile_glob, PatternSet};
pub use scope::{assign_scope, classify_include_type, is_std_package, ScopeSummary};
pub use seeds::{collect_seeds, extract_all_type_names, resolve_seed_name, seed_values, SeedScan};
