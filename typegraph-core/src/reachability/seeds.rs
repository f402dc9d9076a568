//! Explicit seeds: types named by function and call-site annotations.
//!
//! A seed parameter holds type syntax rather than a bare name:
//!
//! ```text
//! @schema(User)                      -> User
//! @route(schema="[]User")            -> User
//! @schema(Response[Page[User], Error]) -> Response, Page, User, Error
//! ```

use std::collections::BTreeSet;

use crate::annotations::Annotation;
use crate::model::{TypeKind, TypeNode};
use crate::registry::canonical::qualify;
use crate::registry::{is_builtin, TypeRegistry};

/// Every type name in schema syntax, outermost first.
///
/// Slice and list brackets, pointer stars and the `!` non-null suffix are
/// dropped; generic arguments are extracted recursively.
pub fn extract_all_type_names(schema: &str) -> Vec<String> {
    let mut names = Vec::new();
    collect_names(schema, &mut names);
    names
}

fn collect_names(schema: &str, out: &mut Vec<String>) {
    let mut s = schema.trim().trim_end_matches('!').trim();
    loop {
        if let Some(rest) = s.strip_prefix("[]") {
            s = rest.trim();
        } else if let Some(rest) = s.strip_prefix('*') {
            s = rest.trim();
        } else if s.starts_with('[') && s.ends_with(']') && !has_top_level_comma(&s[1..s.len() - 1]) {
            // `[User!]` list syntax
            s = s[1..s.len() - 1].trim().trim_end_matches('!').trim();
        } else {
            break;
        }
    }
    if s.is_empty() {
        return;
    }

    if let Some(rest) = s.strip_prefix("map[") {
        if let Some(close) = matching_bracket(rest) {
            collect_names(&rest[..close], out);
            collect_names(&rest[close + 1..], out);
            return;
        }
    }

    match (s.find('['), s.rfind(']')) {
        (Some(open), Some(close)) if open > 0 && close > open => {
            out.push(s[..open].trim().to_string());
            for arg in split_top_level(&s[open + 1..close]) {
                collect_names(arg, out);
            }
        }
        _ => out.push(s.to_string()),
    }
}

fn matching_bracket(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '[' => depth += 1,
            ']' if depth == 0 => return Some(i),
            ']' => depth -= 1,
            _ => {}
        }
    }
    None
}

fn has_top_level_comma(s: &str) -> bool {
    split_top_level(s).len() > 1
}

fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(s[start..].trim());
    parts.retain(|p| !p.is_empty());
    parts
}

/// Values of seed parameters in one annotation.
///
/// An annotation named like a seed key contributes its positional value.
/// A bare identifier such as `@schema(User)` parses as the flag `User=true`,
/// so when such an annotation has no positional value and only flags, the
/// flag names are the seeds.
pub fn seed_values<'a>(annotation: &'a Annotation, seed_params: &[String]) -> Vec<&'a str> {
    let is_seed_key = |key: &str| seed_params.iter().any(|p| p.eq_ignore_ascii_case(key));
    let mut values = Vec::new();
    if is_seed_key(&annotation.name) {
        match annotation.default_value() {
            Some(v) => values.push(v),
            None if annotation.params.values().all(|v| v == "true") => {
                values.extend(annotation.params.keys().map(String::as_str));
                return values;
            }
            None => {}
        }
    }
    for (key, value) in &annotation.params {
        if !key.is_empty() && is_seed_key(key) {
            values.push(value.as_str());
        }
    }
    values
}

/// Canonical name for a seed written in source form.
///
/// Tried in order: an exact canonical name, the name in the annotating
/// node's package, a `pkg.Name` whose package path ends in `pkg`, then the
/// first non-placeholder node with that short name.
pub fn resolve_seed_name(registry: &TypeRegistry, name: &str, package: &str) -> Option<String> {
    if registry.contains(name) {
        return Some(name.to_string());
    }
    let local = qualify(package, name);
    if registry.contains(&local) {
        return Some(local);
    }
    if name.contains('.') {
        let suffix = format!("/{}", name);
        if let Some(node) = registry.values().find(|n| n.canonical_name.ends_with(&suffix)) {
            return Some(node.canonical_name.clone());
        }
    }
    let short = name.rsplit('.').next().unwrap_or(name);
    registry
        .find_by_name(short)
        .find(|n| !n.placeholder)
        .map(|n| n.canonical_name.clone())
}

/// Seeds found in the annotations of functions and methods.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedScan {
    pub seeds: BTreeSet<String>,
    /// Names that matched nothing in the registry.
    pub unresolved: BTreeSet<String>,
}

/// Gather seeds from the doc and call-site annotations of every function
/// node and every method.
pub fn collect_seeds(registry: &TypeRegistry, seed_params: &[String]) -> SeedScan {
    let mut scan = SeedScan::default();
    for node in registry.values() {
        for annotation in function_annotations(node) {
            for value in seed_values(annotation, seed_params) {
                for name in extract_all_type_names(value) {
                    if is_builtin(&name) {
                        continue;
                    }
                    match resolve_seed_name(registry, &name, &node.package) {
                        Some(canonical) => {
                            scan.seeds.insert(canonical);
                        }
                        None => {
                            scan.unresolved.insert(name);
                        }
                    }
                }
            }
        }
    }
    scan
}

fn function_annotations(node: &TypeNode) -> Box<dyn Iterator<Item = &Annotation> + '_> {
    let methods = node
        .methods
        .iter()
        .flat_map(|m| m.annotations.iter().chain(&m.call_site_annotations));
    if node.kind == TypeKind::Function {
        Box::new(node.annotations.iter().chain(&node.call_site_annotations).chain(methods))
    } else {
        Box::new(methods)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::{parse_annotation, parse_annotations};
    use crate::model::{FunctionSignature, Visibility};

    fn names(schema: &str) -> Vec<String> {
        extract_all_type_names(schema)
    }

    #[test]
    fn test_extract_simple_and_list_forms() {
        assert_eq!(names("User"), vec!["User"]);
        assert_eq!(names("User!"), vec!["User"]);
        assert_eq!(names("[]User"), vec!["User"]);
        assert_eq!(names("[User!]!"), vec!["User"]);
        assert_eq!(names("*models.User"), vec!["models.User"]);
    }

    #[test]
    fn test_extract_generic_arguments() {
        assert_eq!(names("Response[Droid]"), vec!["Response", "Droid"]);
        assert_eq!(names("[]Map[String, Int]"), vec!["Map", "String", "Int"]);
        assert_eq!(names("[Result[User, Error]!]"), vec!["Result", "User", "Error"]);
        assert_eq!(
            names("Response[Page[User], Error]"),
            vec!["Response", "Page", "User", "Error"]
        );
        assert_eq!(names("map[string]User"), vec!["string", "User"]);
    }

    #[test]
    fn test_seed_values() {
        let params = vec!["schema".to_string()];
        let positional = Annotation::new("schema").with_param("", "User");
        assert_eq!(seed_values(&positional, &params), vec!["User"]);

        let keyed = Annotation::new("route").with_param("schema", "[]Order").with_param("path", "/o");
        assert_eq!(seed_values(&keyed, &params), vec!["[]Order"]);

        let other = Annotation::new("route").with_param("", "User");
        assert!(seed_values(&other, &params).is_empty());
    }

    #[test]
    fn test_bare_identifier_seeds() {
        let params = vec!["schema".to_string()];
        let bare = parse_annotation("@schema(User)", '@').unwrap();
        assert_eq!(seed_values(&bare, &params), vec!["User"]);

        let mixed = parse_annotation(r#"@schema(Order, title:"Orders")"#, '@').unwrap();
        assert!(seed_values(&mixed, &params).is_empty());

        let keyed = parse_annotation("@route(schema:User)", '@').unwrap();
        assert_eq!(seed_values(&keyed, &params), vec!["User"]);
    }

    #[test]
    fn test_method_annotations_seed() {
        let params = vec!["schema".to_string()];
        let mut registry = TypeRegistry::new();
        registry.insert(TypeNode::skeleton("api.User", "User", "api", TypeKind::Composite));
        registry.insert(TypeNode::skeleton("api.Order", "Order", "api", TypeKind::Composite));
        let mut controller = TypeNode::skeleton("api.Controller", "Controller", "api", TypeKind::Composite);
        controller.methods.push(FunctionSignature {
            name: "RegisterRoutes".into(),
            comment: String::new(),
            annotations: parse_annotations(r#"// @route(schema:"User")"#, '@'),
            call_site_annotations: parse_annotations(r#"// @schema("[]Order")"#, '@'),
            params: vec![],
            results: vec![],
            visibility: Visibility::Public,
        });
        registry.insert(controller);

        let scan = collect_seeds(&registry, &params);
        let seeds: Vec<&str> = scan.seeds.iter().map(String::as_str).collect();
        assert_eq!(seeds, vec!["api.Order", "api.User"]);
        assert!(scan.unresolved.is_empty());
    }

    #[test]
    fn test_resolve_seed_name() {
        let mut registry = TypeRegistry::new();
        registry.insert(TypeNode::skeleton("example.com/app/models.User", "User", "example.com/app/models", TypeKind::Composite));
        registry.insert(TypeNode::skeleton("api.Order", "Order", "api", TypeKind::Composite));

        assert_eq!(resolve_seed_name(&registry, "Order", "api").as_deref(), Some("api.Order"));
        assert_eq!(
            resolve_seed_name(&registry, "models.User", "api").as_deref(),
            Some("example.com/app/models.User")
        );
        assert_eq!(
            resolve_seed_name(&registry, "User", "api").as_deref(),
            Some("example.com/app/models.User")
        );
        assert_eq!(resolve_seed_name(&registry, "Missing", "api"), None);
    }
}
