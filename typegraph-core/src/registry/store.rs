//! The node arena.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::model::{TypeKind, TypeNode};

/// Canonical-name keyed store of every node produced by a build.
///
/// A node is inserted before its members are populated and stays marked as
/// under construction until [`TypeRegistry::finish_construction`]. Lookups
/// during that window return the partial node, which is what lets cyclic
/// references terminate.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    nodes: BTreeMap<String, TypeNode>,
    under_construction: BTreeSet<String>,
}

/// Node counts of a registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub nodes: usize,
    pub by_kind: BTreeMap<TypeKind, usize>,
    pub enums: usize,
    pub placeholders: usize,
    pub edges: usize,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, canonical: &str) -> bool {
        self.nodes.contains_key(canonical)
    }

    pub fn get(&self, canonical: &str) -> Option<&TypeNode> {
        self.nodes.get(canonical)
    }

    pub fn get_mut(&mut self, canonical: &str) -> Option<&mut TypeNode> {
        self.nodes.get_mut(canonical)
    }

    /// Nodes in canonical-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TypeNode)> {
        self.nodes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn values(&self) -> impl Iterator<Item = &TypeNode> {
        self.nodes.values()
    }

    pub(crate) fn values_mut(&mut self) -> impl Iterator<Item = &mut TypeNode> {
        self.nodes.values_mut()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// Insert a finished node. An existing entry is kept and `false` returned.
    pub fn insert(&mut self, node: TypeNode) -> bool {
        if self.nodes.contains_key(&node.canonical_name) {
            return false;
        }
        self.nodes.insert(node.canonical_name.clone(), node);
        true
    }

    /// Insert a skeleton and mark it under construction.
    pub fn begin_construction(&mut self, node: TypeNode) -> bool {
        let key = node.canonical_name.clone();
        if !self.insert(node) {
            return false;
        }
        self.under_construction.insert(key);
        true
    }

    /// Clear the marker. Returns false if the node was not under construction.
    pub fn finish_construction(&mut self, canonical: &str) -> bool {
        self.under_construction.remove(canonical)
    }

    pub fn is_under_construction(&self, canonical: &str) -> bool {
        self.under_construction.contains(canonical)
    }

    /// Names still marked. Empty after a completed build.
    pub fn pending(&self) -> impl Iterator<Item = &str> {
        self.under_construction.iter().map(String::as_str)
    }

    /// Nodes whose short name equals `name`.
    pub fn find_by_name<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a TypeNode> + 'a {
        self.nodes.values().filter(move |n| n.name == name)
    }

    pub fn stats(&self) -> RegistryStats {
        let mut stats = RegistryStats {
            nodes: self.nodes.len(),
            ..Default::default()
        };
        for node in self.nodes.values() {
            *stats.by_kind.entry(node.kind).or_default() += 1;
            if node.is_enum() {
                stats.enums += 1;
            }
            if node.placeholder {
                stats.placeholders += 1;
            }
            stats.edges += node.usage.edges.len();
        }
        stats
    }

    /// SHA-256 over the sorted canonical names and kinds, hex encoded.
    /// Stable across runs over unchanged input.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for (name, node) in &self.nodes {
            hasher.update(name.as_bytes());
            hasher.update([0u8]);
            hasher.update(node.kind.as_str().as_bytes());
            hasher.update([b'\n']);
        }
        format!("{:x}", hasher.finalize())
    }
}
