//! Canonical, cycle-safe registry of type nodes.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐     ┌─────────────────────┐
//! │    context.rs       │     │   canonical.rs      │
//! │  ─────────────────  │     │  ─────────────────  │
//! │  Declaration index  │     │  Canonical names    │
//! │  Generic scope      │     │  Builtins           │
//! └──────────┬──────────┘     └──────────┬──────────┘
//!            │                           │
//!            └───────────┬───────────────┘
//!                        ▼
//!            ┌─────────────────────┐
//!            │    resolver.rs      │
//!            │  ─────────────────  │
//!            │  Register on demand │
//!            │  Resolve type exprs │
//!            └──────────┬──────────┘
//!                       ▼
//!            ┌─────────────────────┐
//!            │      store.rs       │
//!            │  ─────────────────  │
//!            │  BTreeMap arena     │
//!            │  Construction marks │
//!            │  Fingerprint        │
//!            └─────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use typegraph_core::config::CoreConfig;
//! use typegraph_core::registry::{register_all, BuildContext};
//!
//! let config = CoreConfig::default();
//! let mut ctx = BuildContext::new(&config, &declarations);
//! register_all(&mut ctx)?;
//!
//! let registry = ctx.into_registry();
//! println!("{} nodes, fingerprint {}", registry.len(), registry.fingerprint());
//! ```

pub mod canonical;
pub mod context;
pub mod resolver;
pub mod store;

pub use canonical::{is_builtin, BUILTIN_TYPES};
pub use context::{BuildContext, DeclarationIndex};
pub use resolver::{register_all, register_declaration, resolve_type, Site};
pub use store::{RegistryStats, TypeRegistry};
