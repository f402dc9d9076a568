//! Auto-generation policy: which unannotated declarations get pulled in.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Strategy for including declarations that were not directly accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum AutoGenerateStrategy {
    /// Only accepted declarations.
    None,
    /// Declarations referenced by accepted ones, up to `max_depth`.
    Referenced,
    /// Every candidate.
    All,
    /// Candidates matching the include patterns.
    Patterns,
}

impl AutoGenerateStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            AutoGenerateStrategy::None => "none",
            AutoGenerateStrategy::Referenced => "referenced",
            AutoGenerateStrategy::All => "all",
            AutoGenerateStrategy::Patterns => "patterns",
        }
    }
}

impl fmt::Display for AutoGenerateStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AutoGenerateStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(AutoGenerateStrategy::None),
            "referenced" => Ok(AutoGenerateStrategy::Referenced),
            "all" => Ok(AutoGenerateStrategy::All),
            "patterns" => Ok(AutoGenerateStrategy::Patterns),
            other => Err(format!(
                "invalid auto-generate strategy '{}' (expected none, referenced, all or patterns)",
                other
            )),
        }
    }
}

impl TryFrom<String> for AutoGenerateStrategy {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// What to do with members that reference something outside the graph:
/// an unresolved generic parameter or a type that was never declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum OutOfScopeAction {
    Warn,
    Fail,
    Ignore,
    Exclude,
}

impl OutOfScopeAction {
    pub fn as_str(self) -> &'static str {
        match self {
            OutOfScopeAction::Warn => "warn",
            OutOfScopeAction::Fail => "fail",
            OutOfScopeAction::Ignore => "ignore",
            OutOfScopeAction::Exclude => "exclude",
        }
    }
}

impl fmt::Display for OutOfScopeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutOfScopeAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "warn" | "warning" => Ok(OutOfScopeAction::Warn),
            "fail" | "error" => Ok(OutOfScopeAction::Fail),
            "ignore" => Ok(OutOfScopeAction::Ignore),
            "exclude" => Ok(OutOfScopeAction::Exclude),
            other => Err(format!(
                "invalid out-of-scope action '{}' (expected warn, fail, ignore or exclude)",
                other
            )),
        }
    }
}

impl TryFrom<String> for OutOfScopeAction {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Auto-generation settings, shared by all targets and overridable per target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoGenerateConfig {
    pub enabled: bool,
    pub strategy: AutoGenerateStrategy,
    /// 0 = unlimited, 1 = direct references only, 2 = references of references.
    pub max_depth: usize,
    /// Glob patterns matched against `package/Name`, canonical name or source path.
    pub patterns: Vec<String>,
    /// Exclusions; these beat include patterns.
    pub exclude_patterns: Vec<String>,
    pub only_referenced_by_annotated: bool,
    pub include_embedded: bool,
    pub include_field_types: bool,
    pub out_of_scope_action: OutOfScopeAction,
    /// Placeholder type name substituted for unresolved generic parameters.
    pub unresolved_generic_type: Option<String>,
    pub suppress_generic_type_warnings: bool,
}

impl Default for AutoGenerateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            strategy: AutoGenerateStrategy::Referenced,
            max_depth: 1,
            patterns: Vec::new(),
            exclude_patterns: vec!["*/vendor/*".to_string(), "*/*_test.go".to_string()],
            only_referenced_by_annotated: true,
            include_embedded: true,
            include_field_types: true,
            out_of_scope_action: OutOfScopeAction::Warn,
            unresolved_generic_type: None,
            suppress_generic_type_warnings: false,
        }
    }
}

impl AutoGenerateConfig {
    /// `max_depth` as a traversal bound; `None` means unlimited.
    pub fn depth_limit(&self) -> Option<usize> {
        match self.max_depth {
            0 => None,
            n => Some(n),
        }
    }

    /// Apply a per-target override; fields set in the override win.
    pub fn merge(&self, over: &AutoGenerateOverride) -> AutoGenerateConfig {
        let mut merged = self.clone();
        if let Some(v) = over.enabled {
            merged.enabled = v;
        }
        if let Some(v) = over.strategy {
            merged.strategy = v;
        }
        if let Some(v) = over.max_depth {
            merged.max_depth = v;
        }
        if let Some(v) = &over.patterns {
            merged.patterns = v.clone();
        }
        if let Some(v) = &over.exclude_patterns {
            merged.exclude_patterns = v.clone();
        }
        if let Some(v) = over.only_referenced_by_annotated {
            merged.only_referenced_by_annotated = v;
        }
        if let Some(v) = over.include_embedded {
            merged.include_embedded = v;
        }
        if let Some(v) = over.include_field_types {
            merged.include_field_types = v;
        }
        if let Some(v) = over.out_of_scope_action {
            merged.out_of_scope_action = v;
        }
        if let Some(v) = &over.unresolved_generic_type {
            merged.unresolved_generic_type = Some(v.clone());
        }
        if let Some(v) = over.suppress_generic_type_warnings {
            merged.suppress_generic_type_warnings = v;
        }
        merged
    }
}

/// Per-target auto-generation override. Absent fields inherit from the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AutoGenerateOverride {
    pub enabled: Option<bool>,
    pub strategy: Option<AutoGenerateStrategy>,
    pub max_depth: Option<usize>,
    pub patterns: Option<Vec<String>>,
    pub exclude_patterns: Option<Vec<String>>,
    pub only_referenced_by_annotated: Option<bool>,
    pub include_embedded: Option<bool>,
    pub include_field_types: Option<bool>,
    pub out_of_scope_action: Option<OutOfScopeAction>,
    pub unresolved_generic_type: Option<String>,
    pub suppress_generic_type_warnings: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AutoGenerateConfig::default();
        assert!(cfg.enabled);
        assert_eq!(cfg.strategy, AutoGenerateStrategy::Referenced);
        assert_eq!(cfg.depth_limit(), Some(1));
        assert_eq!(cfg.out_of_scope_action, OutOfScopeAction::Warn);
        assert_eq!(cfg.exclude_patterns.len(), 2);
    }

    #[test]
    fn test_zero_depth_is_unlimited() {
        let cfg = AutoGenerateConfig {
            max_depth: 0,
            ..Default::default()
        };
        assert_eq!(cfg.depth_limit(), None);
    }

    #[test]
    fn test_merge_explicit_zero_depth_wins() {
        let root = AutoGenerateConfig::default();
        let over = AutoGenerateOverride {
            strategy: Some(AutoGenerateStrategy::All),
            max_depth: Some(0),
            include_embedded: Some(false),
            ..Default::default()
        };
        let merged = root.merge(&over);
        assert_eq!(merged.strategy, AutoGenerateStrategy::All);
        assert_eq!(merged.max_depth, 0);
        assert!(!merged.include_embedded);
        // untouched fields inherit
        assert!(merged.include_field_types);
        assert_eq!(merged.exclude_patterns, root.exclude_patterns);
    }

    #[test]
    fn test_parse_actions() {
        assert_eq!("Exclude".parse::<OutOfScopeAction>().unwrap(), OutOfScopeAction::Exclude);
        assert_eq!("error".parse::<OutOfScopeAction>().unwrap(), OutOfScopeAction::Fail);
        assert!("explode".parse::<OutOfScopeAction>().is_err());
        assert!("sometimes".parse::<AutoGenerateStrategy>().is_err());
    }
}
