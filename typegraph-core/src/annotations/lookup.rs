//! Name matching and merging helpers over annotation lists.

use super::types::{Annotation, DEFAULT_PARAM};

/// Lowercased name without the marker.
pub fn normalize_annotation_name(name: &str, marker: char) -> String {
    name.trim().trim_start_matches(marker).to_lowercase()
}

/// Case-insensitive match of `name` against `prefix + suffix` or the bare
/// suffix, for any of `suffixes`. With prefix `gql`, `gqlType` and `type`
/// both match suffix `type`.
pub fn matches_annotation(name: &str, prefix: &str, suffixes: &[&str]) -> bool {
    let name = name.to_lowercase();
    let prefix = prefix.trim_start_matches('@').to_lowercase();
    suffixes.iter().any(|suffix| {
        let suffix = suffix.to_lowercase();
        (!prefix.is_empty() && name == format!("{}{}", prefix, suffix)) || name == suffix
    })
}

/// Find the first annotation with the given name (case-insensitive).
pub fn find_annotation<'a>(annotations: &'a [Annotation], name: &str) -> Option<&'a Annotation> {
    annotations.iter().find(|a| a.name.eq_ignore_ascii_case(name))
}

/// Override annotations first, then base annotations not overridden by name.
pub fn merge_annotations(base: &[Annotation], overrides: &[Annotation]) -> Vec<Annotation> {
    let mut merged: Vec<Annotation> = overrides.to_vec();
    merged.extend(
        base.iter()
            .filter(|b| !overrides.iter().any(|o| o.name.eq_ignore_ascii_case(&b.name)))
            .cloned(),
    );
    merged
}

/// Namespace declared by `@namespace("x")`, `@namespace(value:"x")` or a
/// `namespace` parameter on any annotation.
pub fn namespace_of(annotations: &[Annotation]) -> Option<String> {
    for ann in annotations {
        if ann.name.eq_ignore_ascii_case("namespace") {
            let value = ann
                .param("value")
                .or_else(|| ann.param("namespace"))
                .or_else(|| ann.param(DEFAULT_PARAM))
                .or_else(|| ann.params.values().next().map(String::as_str));
            if let Some(v) = value {
                return Some(v.trim().to_string());
            }
        }
        if let Some(v) = ann.param("namespace") {
            return Some(v.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::parse_annotations;

    #[test]
    fn test_matches_with_and_without_prefix() {
        assert!(matches_annotation("gqlType", "@gql", &["type"]));
        assert!(matches_annotation("TYPE", "gql", &["type", "input"]));
        assert!(matches_annotation("gqlinput", "gql", &["type", "input"]));
        assert!(!matches_annotation("gqlEnum", "gql", &["type"]));
        assert!(matches_annotation("type", "", &["type"]));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_annotation_name("@Scan", '@'), "scan");
        assert_eq!(normalize_annotation_name(" Include ", '@'), "include");
    }

    #[test]
    fn test_merge_prefers_overrides() {
        let base = parse_annotations("@schema(title:\"Base\")\n@deprecated", '@');
        let over = parse_annotations("@Schema(title:\"Override\")", '@');
        let merged = merge_annotations(&base, &over);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].param("title"), Some("Override"));
        assert_eq!(merged[1].name, "deprecated");
    }

    #[test]
    fn test_namespace_forms() {
        let anns = parse_annotations("@namespace(\"auth\")", '@');
        assert_eq!(namespace_of(&anns).as_deref(), Some("auth"));

        let anns = parse_annotations("@gqlType(name:\"User\", namespace:\"accounts\")", '@');
        assert_eq!(namespace_of(&anns).as_deref(), Some("accounts"));

        let anns = parse_annotations("@schema", '@');
        assert_eq!(namespace_of(&anns), None);
    }
}
