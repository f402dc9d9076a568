//! Generic instantiation.
//!
//! `Node[app.Character,int]` becomes a node of its own that mirrors the base
//! declaration and records the argument references plus a back-reference to
//! the base.
//!
//! # Architecture
//!
//! ```text
//!  use site: Node[Character, int]
//!            │
//!            ▼
//! ┌─────────────────────┐      base under construction?
//! │   instantiate.rs    │ ───────────────┐
//! │  ─────────────────  │                ▼
//! │  resolve base+args  │     ┌─────────────────────┐
//! │  synthesize node    │     │  deferred in ctx    │
//! └──────────┬──────────┘     │  copied on finish   │
//!            │ copy now       └─────────────────────┘
//!            ▼
//!   kind, fields, methods of base (verbatim)
//! ```

pub mod instantiate;

pub use instantiate::{copy_from_base, populate_named_instance, resolve_instance};

use crate::registry::canonical::is_builtin;

/// Split `pkg.Node[a,b[c]]` into its base and top-level arguments.
/// Slices, arrays and maps are not instances.
pub fn split_instance_name(name: &str) -> Option<(&str, Vec<&str>)> {
    if !name.ends_with(']') {
        return None;
    }
    let open = name.find('[')?;
    let base = &name[..open];
    if base.is_empty() || base == "map" {
        return None;
    }

    let inner = &name[open + 1..name.len() - 1];
    let mut depth = 0usize;
    let mut args = Vec::new();
    let mut start = 0;
    for (i, c) in inner.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => {
                // The bracket opened after the base closed before the end.
                if depth == 0 {
                    return None;
                }
                depth -= 1;
            }
            ',' if depth == 0 => {
                args.push(inner[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return None;
    }
    args.push(inner[start..].trim());
    Some((base, args))
}

pub fn is_instance_name(name: &str) -> bool {
    split_instance_name(name).is_some()
}

/// Type parameter identifiers inside a parameter reference such as
/// `[]T` or `map[string]V`.
pub fn param_identifiers(name: &str) -> Vec<&str> {
    name.split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '.'))
        .filter(|part| !part.is_empty())
        .filter(|part| *part != "map" && !is_builtin(part))
        .filter(|part| !part.chars().all(|c| c.is_ascii_digit()))
        .collect()
}
