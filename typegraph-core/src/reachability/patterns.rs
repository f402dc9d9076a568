//! Include/exclude glob patterns.
//!
//! `*` and `**` match any run of characters (separators included), `?` one
//! character, `[...]` a character class. A node matches when any of
//! `package/Name`, its canonical name or its source path matches.

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::error::{TypegraphError, TypegraphResult};
use crate::model::TypeNode;

/// Compiled include and exclude patterns. Exclusions win.
#[derive(Debug, Clone)]
pub struct PatternSet {
    include: GlobSet,
    exclude: GlobSet,
}

impl PatternSet {
    pub fn compile(include: &[String], exclude: &[String]) -> TypegraphResult<Self> {
        Ok(Self {
            include: build_set(include)?,
            exclude: build_set(exclude)?,
        })
    }

    pub fn has_includes(&self) -> bool {
        !self.include.is_empty()
    }

    /// True if any include pattern matches and no exclude pattern does.
    pub fn includes(&self, node: &TypeNode) -> bool {
        any_matches(&self.include, node) && !self.excludes(node)
    }

    pub fn excludes(&self, node: &TypeNode) -> bool {
        any_matches(&self.exclude, node)
    }
}

fn build_set(patterns: &[String]) -> TypegraphResult<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(compile_glob(pattern)?);
    }
    builder
        .build()
        .map_err(|e| TypegraphError::invalid_argument(format!("invalid glob patterns: {}", e)))
}

fn any_matches(patterns: &GlobSet, node: &TypeNode) -> bool {
    if patterns.is_empty() {
        return false;
    }
    let package_path = format!("{}/{}", node.package, node.name);
    [package_path.as_str(), node.canonical_name.as_str(), node.source_path.as_str()]
        .iter()
        .filter(|s| !s.is_empty())
        .any(|s| patterns.is_match(s))
}

/// Parse one glob. `*` already crosses separators, so runs of stars are
/// folded into one before parsing.
pub fn compile_glob(glob: &str) -> TypegraphResult<Glob> {
    let trimmed = glob.trim();
    if trimmed.is_empty() {
        return Err(TypegraphError::invalid_argument("empty glob pattern"));
    }
    let mut folded = trimmed.to_string();
    while folded.contains("**") {
        folded = folded.replace("**", "*");
    }
    Glob::new(&folded)
        .map_err(|e| TypegraphError::invalid_argument(format!("invalid glob pattern '{}': {}", trimmed, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TypeKind;

    fn node(package: &str, name: &str) -> TypeNode {
        TypeNode::skeleton(format!("{}.{}", package, name), name, package, TypeKind::Composite)
    }

    fn set(include: &[&str], exclude: &[&str]) -> PatternSet {
        let include: Vec<String> = include.iter().map(|s| s.to_string()).collect();
        let exclude: Vec<String> = exclude.iter().map(|s| s.to_string()).collect();
        PatternSet::compile(&include, &exclude).unwrap()
    }

    fn matcher(glob: &str) -> globset::GlobMatcher {
        compile_glob(glob).unwrap().compile_matcher()
    }

    #[test]
    fn test_glob_matching() {
        let m = matcher("*/models/*");
        assert!(m.is_match("example.com/app/models/User"));
        assert!(!m.is_match("example.com/app/dto/User"));

        let m = matcher("app.Use?");
        assert!(m.is_match("app.User"));
        assert!(!m.is_match("app.Users"));

        let m = matcher("app.[UR]*");
        assert!(m.is_match("app.Role"));
        assert!(!m.is_match("app.Order"));

        let m = matcher("example.com/**User");
        assert!(m.is_match("example.com/app/models/User"));
    }

    #[test]
    fn test_invalid_globs() {
        assert!(compile_glob("").is_err());
        assert!(compile_glob("  ").is_err());
        assert!(compile_glob("app.[User").is_err());
        assert!(PatternSet::compile(&["app.*".to_string()], &["app.[Us".to_string()]).is_err());
    }

    #[test]
    fn test_exclude_beats_include() {
        let patterns = set(&["*/models/*"], &["*/vendor/*"]);
        assert!(patterns.includes(&node("example.com/app/models", "User")));
        assert!(!patterns.includes(&node("example.com/app/vendor/models", "User")));
        assert!(patterns.excludes(&node("example.com/app/vendor/models", "User")));
    }

    #[test]
    fn test_source_path_is_a_subject() {
        let patterns = set(&[], &["*/*_test.go"]);
        let mut fixture = node("app", "Fixture");
        fixture.source_path = "app/user_test.go".to_string();
        assert!(patterns.excludes(&fixture));
        assert!(!patterns.excludes(&node("app", "User")));
        assert!(!patterns.has_includes());
    }
}
