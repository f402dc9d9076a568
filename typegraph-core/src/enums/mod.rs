//! Enum reconstruction from typed constant groups.
//!
//! A language without native enums spells them as a defined type plus a
//! group of constants of that type. This module reads those groups and turns
//! the type into an [`Enum`](crate::model::TypeKind::Enum) node.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐     ┌─────────────────────┐
//! │    sequence.rs      │     │    detector.rs      │
//! │  ─────────────────  │     │  ─────────────────  │
//! │  Position counter   │────▶│  Collect constants  │
//! │  Pattern evaluation │     │  per owning type    │
//! └─────────────────────┘     └──────────┬──────────┘
//!                                        ▼
//!                             ┌─────────────────────┐
//!                             │  detect_enums       │
//!                             │  ─────────────────  │
//!                             │  kind = Enum        │
//!                             │  values in order    │
//!                             └─────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use typegraph_core::enums;
//! use typegraph_core::registry::{register_all, BuildContext};
//!
//! let mut ctx = BuildContext::new(&config, &declarations);
//! register_all(&mut ctx)?; // gathers constants as it goes
//! let count = enums::detect(&mut ctx);
//! ```

pub mod detector;
pub mod sequence;

pub use detector::{collect_constants, detect, detect_enums};
pub use sequence::{evaluate, parse_literal, ConstSequence, SEQUENCE_MARKER};
