//! Inclusion computation for one generation target.
//!
//! 1. candidates: enabled categories, minus placeholders; in referenced mode
//!    only the unbounded closure of the seeds
//! 2. accepted: candidates the plugin's predicate accepts
//! 3. auto-generation per strategy plus include-pattern matches, exclusions
//!    applied to this part only
//! 4. out-of-scope members of the included nodes handled per policy

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, warn};

use super::graph::{EdgeFilter, TypeGraph};
use super::patterns::PatternSet;
use super::seeds::collect_seeds;
use crate::annotations::matches_annotation;
use crate::common::GraphTraversal;
use crate::config::{AutoGenerateStrategy, Category, CoreConfig, OutOfScopeAction};
use crate::error::{TypegraphError, TypegraphResult};
use crate::generics::param_identifiers;
use crate::model::{TypeNode, TypeRef};
use crate::registry::TypeRegistry;

/// Why a member is out of scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutOfScopeReason {
    /// A type parameter the node itself does not declare.
    UnresolvedParam,
    /// A type that was referenced but never declared.
    Undeclared,
}

/// A member dropped by the `exclude` action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExcludedMember {
    pub node: String,
    pub member: String,
    pub type_name: String,
    pub reason: OutOfScopeReason,
}

/// A generic parameter replaced by the configured placeholder type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Substitution {
    pub node: String,
    pub member: String,
    pub param: String,
    pub replacement: String,
}

/// What one target generates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InclusionSet {
    pub target: String,
    /// Every included canonical name, sorted.
    pub included: Vec<String>,
    /// Accepted directly by the plugin predicate.
    pub accepted: Vec<String>,
    /// Pulled in by the auto-generation strategy.
    pub auto_generated: Vec<String>,
    /// Explicit seeds from function annotations (referenced mode).
    pub seeds: Vec<String>,
    /// Distance from the nearest accepted node or seed.
    pub depths: BTreeMap<String, usize>,
    pub excluded_members: Vec<ExcludedMember>,
    pub substitutions: Vec<Substitution>,
    pub warnings: Vec<String>,
}

impl InclusionSet {
    pub fn contains(&self, canonical: &str) -> bool {
        self.included.binary_search_by(|n| n.as_str().cmp(canonical)).is_ok()
    }

    pub fn len(&self) -> usize {
        self.included.len()
    }

    pub fn is_empty(&self) -> bool {
        self.included.is_empty()
    }

    pub fn is_excluded_member(&self, node: &str, member: &str) -> bool {
        self.excluded_members
            .iter()
            .any(|m| m.node == node && m.member == member)
    }
}

/// Compute the inclusion set of `target`.
///
/// `config` is the configuration as the target sees it (overrides already
/// merged); `accepts` is the plugin's predicate.
pub fn compute_inclusion(
    registry: &TypeRegistry,
    config: &CoreConfig,
    target: &str,
    accepts: &dyn Fn(&TypeNode) -> bool,
) -> TypegraphResult<InclusionSet> {
    let scan = &config.scan_options;
    let auto = &config.auto_generate;
    let patterns = PatternSet::compile(&auto.patterns, &auto.exclude_patterns)?;
    let graph = TypeGraph::build(registry);
    let mut set = InclusionSet {
        target: target.to_string(),
        ..Default::default()
    };

    // 1. seeds and the referenced-mode universe
    let mut seeds: BTreeSet<&str> = BTreeSet::new();
    let mut closure = BTreeSet::new();
    if scan.any_referenced() {
        let scan_result = collect_seeds(registry, &config.seed_params);
        for name in &scan_result.unresolved {
            let message = format!("seed type '{}' does not match any declaration", name);
            warn!(target = %target, seed = %name, "seed type does not match any declaration");
            set.warnings.push(message);
        }
        for seed in &scan_result.seeds {
            if let Some(node) = registry.get(seed) {
                seeds.insert(node.canonical_name.as_str());
            }
        }
        let annotated = registry
            .iter()
            .filter(|(_, n)| !n.placeholder && accepts(*n))
            .map(|(name, _)| name);
        let roots: Vec<&str> = seeds.iter().copied().chain(annotated).collect();
        closure.extend(graph.reachable_from(roots));
    }

    let is_candidate = |node: &TypeNode| {
        if node.placeholder || is_skipped(node) {
            return false;
        }
        let mode = scan.mode(Category::of(node.kind));
        mode.is_all() || (mode.is_referenced() && closure.contains(node.canonical_name.as_str()))
    };
    let candidates: BTreeSet<&str> = registry
        .iter()
        .filter(|(_, n)| is_candidate(*n))
        .map(|(name, _)| name)
        .collect();

    // 2. direct acceptance
    let accepted: BTreeSet<&str> = candidates
        .iter()
        .copied()
        .filter(|name| registry.get(name).is_some_and(accepts))
        .collect();
    let seeds: BTreeSet<&str> = seeds.into_iter().filter(|s| candidates.contains(s)).collect();

    // 3. auto-generation
    let mut auto_generated: BTreeSet<&str> = BTreeSet::new();
    let mut depths: BTreeMap<String, usize> = BTreeMap::new();
    for name in accepted.iter().chain(seeds.iter()) {
        depths.insert(name.to_string(), 0);
    }
    if auto.enabled {
        let pattern_matches: BTreeSet<&str> = candidates
            .iter()
            .copied()
            .filter(|name| registry.get(name).is_some_and(|n| patterns.includes(n)))
            .collect();

        match auto.strategy {
            AutoGenerateStrategy::None | AutoGenerateStrategy::Patterns => {
                auto_generated.extend(pattern_matches.iter().copied())
            }
            AutoGenerateStrategy::All => auto_generated.extend(candidates.iter().copied()),
            AutoGenerateStrategy::Referenced => {
                auto_generated.extend(pattern_matches.iter().copied());

                let mut roots: BTreeSet<&str> = accepted.union(&seeds).copied().collect();
                if !auto.only_referenced_by_annotated {
                    roots.extend(pattern_matches.iter().copied());
                }
                let filtered = graph.filtered(EdgeFilter {
                    fields: auto.include_field_types,
                    embedded: auto.include_embedded,
                });
                for (name, depth) in filtered.reachable_within(roots, auto.depth_limit()) {
                    if candidates.contains(name) {
                        auto_generated.insert(name);
                        depths.entry(name.to_string()).or_insert(depth);
                    }
                }
            }
        }

        auto_generated.retain(|name| {
            !accepted.contains(name)
                && !seeds.contains(name)
                && !registry.get(name).is_some_and(|n| patterns.excludes(n))
        });
    }
    depths.retain(|name, _| {
        accepted.contains(name.as_str()) || seeds.contains(name.as_str()) || auto_generated.contains(name.as_str())
    });

    let included: BTreeSet<&str> = accepted
        .iter()
        .chain(seeds.iter())
        .chain(auto_generated.iter())
        .copied()
        .collect();
    debug!(
        target = %target,
        candidates = candidates.len(),
        accepted = accepted.len(),
        auto_generated = auto_generated.len(),
        "computed inclusion"
    );

    set.included = included.iter().map(|s| s.to_string()).collect();
    set.accepted = accepted.iter().map(|s| s.to_string()).collect();
    set.auto_generated = auto_generated.iter().map(|s| s.to_string()).collect();
    set.seeds = seeds.iter().map(|s| s.to_string()).collect();
    set.depths = depths;

    // 4. out-of-scope members
    for name in &included {
        if let Some(node) = registry.get(name) {
            apply_out_of_scope(registry, node, config, &mut set)?;
        }
    }
    Ok(set)
}

/// Nodes marked `@skip` (or `@ignore`) never generate.
pub fn is_skipped(node: &TypeNode) -> bool {
    node.annotations
        .iter()
        .any(|a| matches_annotation(&a.name, "", &["skip", "ignore"]))
}

/// Conventional type parameter names: a single uppercase letter.
pub fn is_conventional_param(name: &str) -> bool {
    let mut chars = name.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_uppercase())
}

fn apply_out_of_scope(
    registry: &TypeRegistry,
    node: &TypeNode,
    config: &CoreConfig,
    set: &mut InclusionSet,
) -> TypegraphResult<()> {
    let auto = &config.auto_generate;
    for member in node.member_refs() {
        let (reason, names): (OutOfScopeReason, Vec<String>) = match member.type_ref {
            TypeRef::Param(text) => {
                let unresolved: Vec<String> = param_identifiers(text)
                    .into_iter()
                    .filter(|id| !node.declares_param(id))
                    .map(str::to_string)
                    .collect();
                if unresolved.is_empty() {
                    continue;
                }
                if let Some(replacement) = &auto.unresolved_generic_type {
                    for param in unresolved {
                        set.substitutions.push(Substitution {
                            node: node.canonical_name.clone(),
                            member: member.member.clone(),
                            param,
                            replacement: replacement.clone(),
                        });
                    }
                    continue;
                }
                (OutOfScopeReason::UnresolvedParam, unresolved)
            }
            TypeRef::Node(key) if registry.get(key).map_or(true, |n| n.placeholder) => {
                (OutOfScopeReason::Undeclared, vec![key.clone()])
            }
            _ => continue,
        };

        let type_name = member.type_ref.name().to_string();
        let message = match reason {
            OutOfScopeReason::UnresolvedParam => format!(
                "{}.{} uses unresolved type parameter(s) {}",
                node.canonical_name,
                member.member,
                names.join(", ")
            ),
            OutOfScopeReason::Undeclared => format!(
                "{}.{} references undeclared type {}",
                node.canonical_name, member.member, type_name
            ),
        };

        match auto.out_of_scope_action {
            OutOfScopeAction::Ignore => {}
            OutOfScopeAction::Fail => {
                return Err(TypegraphError::out_of_scope(
                    node.canonical_name.clone(),
                    member.member.clone(),
                    message,
                ));
            }
            OutOfScopeAction::Exclude => {
                set.excluded_members.push(ExcludedMember {
                    node: node.canonical_name.clone(),
                    member: member.member.clone(),
                    type_name,
                    reason,
                });
            }
            OutOfScopeAction::Warn => {
                let suppressed = auto.suppress_generic_type_warnings
                    && reason == OutOfScopeReason::UnresolvedParam
                    && names.iter().all(|n| is_conventional_param(n));
                if !suppressed {
                    warn!(
                        target = %set.target,
                        node = %node.canonical_name,
                        member = %member.member,
                        "{}",
                        message
                    );
                    set.warnings.push(message);
                }
            }
        }
    }
    Ok(())
}
