//! Annotation validation against declared specs.
//!
//! Issues are collected, never thrown. The configured action decides
//! afterwards whether the run aborts ([`ValidationReport::should_fail`]).

use std::fmt;

use serde::Serialize;

use super::types::{parse_bool, Annotation, AnnotationParam, AnnotationSpec, ParamType, ValidOn, DEFAULT_PARAM};
use crate::config::{ValidationAction, ValidationMode, ValidatorConfig};
use crate::model::{TypeKind, TypeNode};
use crate::registry::TypeRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// A single finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub annotation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
    pub message: String,
    /// Where the annotation sits, e.g. `models.User.Email`.
    pub location: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.location, self.message)
    }
}

/// Findings of one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
    #[serde(skip)]
    action: ValidationAction,
}

impl ValidationReport {
    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings().next().is_some()
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    /// Only the `fail` action aborts, and only when errors exist.
    pub fn should_fail(&self) -> bool {
        self.action == ValidationAction::Fail && self.has_errors()
    }

    /// Emit every issue through tracing. Errors are logged as warnings
    /// under the `warn` action.
    pub fn log(&self) {
        for issue in &self.issues {
            match (issue.severity, self.action) {
                (Severity::Error, ValidationAction::Fail) => tracing::error!(
                    location = %issue.location,
                    annotation = %issue.annotation,
                    "{}",
                    issue.message
                ),
                _ => tracing::warn!(
                    location = %issue.location,
                    annotation = %issue.annotation,
                    "{}",
                    issue.message
                ),
            }
        }
    }
}

/// Checks annotations against a set of specs.
pub struct AnnotationValidator {
    mode: ValidationMode,
    action: ValidationAction,
    specs: Vec<AnnotationSpec>,
    /// Annotations a consumer understands without declaring a spec.
    known: Option<Box<dyn Fn(&Annotation) -> bool>>,
}

impl AnnotationValidator {
    pub fn new(config: &ValidatorConfig, specs: Vec<AnnotationSpec>) -> Self {
        Self {
            mode: config.mode,
            action: config.action,
            specs,
            known: None,
        }
    }

    /// Treat annotations matching `known` as part of the vocabulary even
    /// without a spec. Strict mode then stops reporting them as unknown.
    pub fn with_known(mut self, known: impl Fn(&Annotation) -> bool + 'static) -> Self {
        self.known = Some(Box::new(known));
        self
    }

    fn is_known(&self, ann: &Annotation) -> bool {
        self.known.as_ref().is_some_and(|known| known(ann))
    }

    fn is_active(&self) -> bool {
        self.mode != ValidationMode::Disabled && self.action != ValidationAction::Disabled
    }

    fn find_spec(&self, name: &str) -> Option<&AnnotationSpec> {
        self.specs.iter().find(|s| s.matches_name(name))
    }

    /// Lax mode downgrades every error to a warning.
    fn severity(&self, base: Severity) -> Severity {
        match self.mode {
            ValidationMode::Lax => Severity::Warning,
            _ => base,
        }
    }

    fn push(
        &self,
        issues: &mut Vec<ValidationIssue>,
        base: Severity,
        ann: &Annotation,
        param: Option<&str>,
        location: &str,
        message: String,
    ) {
        issues.push(ValidationIssue {
            severity: self.severity(base),
            annotation: ann.name.clone(),
            param: param.map(str::to_string),
            message,
            location: location.to_string(),
        });
    }

    /// Validate one annotation attached to `target` at `location`.
    pub fn validate_annotation(
        &self,
        ann: &Annotation,
        target: ValidOn,
        location: &str,
        issues: &mut Vec<ValidationIssue>,
    ) {
        if !self.is_active() {
            return;
        }
        let strict = self.mode == ValidationMode::Strict;

        let Some(spec) = self.find_spec(&ann.name) else {
            if strict && !self.is_known(ann) {
                self.push(issues, Severity::Error, ann, None, location, format!("unknown annotation '@{}'", ann.name));
            }
            return;
        };

        if strict && !spec.allowed_on(target) {
            self.push(
                issues,
                Severity::Warning,
                ann,
                None,
                location,
                format!("@{} is not valid on {:?}", ann.name, target),
            );
        }

        if strict {
            for key in ann.params.keys() {
                if key == DEFAULT_PARAM || is_positional_arg(key) {
                    continue;
                }
                if spec.find_param(key).is_none() {
                    self.push(
                        issues,
                        Severity::Error,
                        ann,
                        Some(key),
                        location,
                        format!("unknown parameter '{}' in @{}", key, ann.name),
                    );
                }
            }
        }

        for param in spec.params.iter().filter(|p| p.required) {
            let value = lookup_value(ann, param);
            if value.map_or(true, |v| v.trim().is_empty()) {
                self.push(
                    issues,
                    Severity::Error,
                    ann,
                    Some(&param.name),
                    location,
                    format!("required parameter '{}' missing in @{}", param.name, ann.name),
                );
            }
        }

        for (key, value) in &ann.params {
            let param = if key == DEFAULT_PARAM {
                spec.params.iter().find(|p| p.name.is_empty())
            } else {
                spec.find_param(key)
            };
            let Some(param) = param else { continue };

            if !param.enum_values.is_empty() && !enum_value_allowed(value, &param.enum_values) {
                self.push(
                    issues,
                    Severity::Error,
                    ann,
                    Some(key),
                    location,
                    format!(
                        "invalid value '{}' for parameter '{}' in @{}, expected one of: {}",
                        value,
                        key,
                        ann.name,
                        param.enum_values.join(", ")
                    ),
                );
            }

            if !type_matches(value, &param.types) {
                let base = if strict { Severity::Warning } else { Severity::Error };
                self.push(
                    issues,
                    base,
                    ann,
                    Some(key),
                    location,
                    format!("invalid type for parameter '{}' in @{}, expected: {:?}", key, ann.name, param.types),
                );
            }
        }
    }

    /// Validate the annotations of every node, field, method and enum value.
    pub fn validate_registry(&self, registry: &TypeRegistry) -> ValidationReport {
        let mut issues = Vec::new();
        if self.is_active() {
            // Instantiations copy their base's members; validating them again
            // would only repeat the base's findings.
            for node in registry.values().filter(|n| !n.placeholder && !n.is_instantiation()) {
                self.validate_node(node, &mut issues);
            }
        }
        ValidationReport {
            issues,
            action: self.action,
        }
    }

    fn validate_node(&self, node: &TypeNode, issues: &mut Vec<ValidationIssue>) {
        let location = node.canonical_name.as_str();
        for ann in &node.annotations {
            self.validate_annotation(ann, valid_on_for(node.kind), location, issues);
        }
        for ann in &node.call_site_annotations {
            self.validate_annotation(ann, ValidOn::Function, location, issues);
        }
        for field in &node.fields {
            let loc = format!("{}.{}", location, field.name());
            for ann in &field.element.annotations {
                self.validate_annotation(ann, ValidOn::Field, &loc, issues);
            }
        }
        for method in &node.methods {
            let loc = format!("{}.{}", location, method.name);
            for ann in method.annotations.iter().chain(&method.call_site_annotations) {
                self.validate_annotation(ann, ValidOn::Function, &loc, issues);
            }
        }
        for value in &node.enum_values {
            let loc = format!("{}.{}", location, value.name);
            for ann in &value.annotations {
                self.validate_annotation(ann, ValidOn::EnumValue, &loc, issues);
            }
        }
    }
}

fn valid_on_for(kind: TypeKind) -> ValidOn {
    match kind {
        TypeKind::Interface => ValidOn::Interface,
        TypeKind::Function => ValidOn::Function,
        TypeKind::Enum => ValidOn::Enum,
        TypeKind::Alias => ValidOn::Alias,
        _ => ValidOn::Struct,
    }
}

/// `arg0`, `arg1`, ... are positional array arguments.
fn is_positional_arg(key: &str) -> bool {
    key.strip_prefix("arg")
        .map_or(false, |n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}

fn lookup_value<'a>(ann: &'a Annotation, param: &AnnotationParam) -> Option<&'a str> {
    if param.name.is_empty() {
        return ann.default_value();
    }
    ann.params
        .iter()
        .find(|(k, _)| param.matches_name(k))
        .map(|(_, v)| v.as_str())
}

/// Accepts a single value or a `[a, b]` list whose entries are all allowed.
fn enum_value_allowed(value: &str, allowed: &[String]) -> bool {
    let is_allowed = |v: &str| allowed.iter().any(|a| a.eq_ignore_ascii_case(v));
    let trimmed = value.trim();
    match trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        Some(inner) => inner
            .split(',')
            .map(|p| p.trim().trim_matches(|c| c == '"' || c == '\''))
            .filter(|p| !p.is_empty())
            .all(is_allowed),
        None => is_allowed(trimmed),
    }
}

fn type_matches(value: &str, types: &[ParamType]) -> bool {
    if types.is_empty() {
        return true;
    }
    types.iter().any(|ty| match ty {
        ParamType::Bool => parse_bool(value).is_some(),
        ParamType::Int => value.trim().parse::<i64>().is_ok(),
        ParamType::Number => value.trim().parse::<f64>().is_ok(),
        ParamType::String | ParamType::StringList | ParamType::Enum | ParamType::Null => true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::parse_annotation;

    fn specs() -> Vec<AnnotationSpec> {
        vec![AnnotationSpec::new("schema")
            .on(ValidOn::Struct)
            .param(AnnotationParam::new("title").typed(ParamType::String).required())
            .param(AnnotationParam::new("readonly").typed(ParamType::Bool))
            .param(AnnotationParam::new("format").one_of(&["json", "yaml"]))]
    }

    fn validator(mode: ValidationMode, action: ValidationAction) -> AnnotationValidator {
        AnnotationValidator::new(&ValidatorConfig { mode, action }, specs())
    }

    fn check(v: &AnnotationValidator, line: &str) -> Vec<ValidationIssue> {
        let ann = parse_annotation(line, '@').unwrap();
        let mut issues = Vec::new();
        v.validate_annotation(&ann, ValidOn::Struct, "models.User", &mut issues);
        issues
    }

    #[test]
    fn test_known_annotations_are_not_unknown() {
        let v = validator(ValidationMode::Strict, ValidationAction::Fail)
            .with_known(|ann: &Annotation| ann.name.eq_ignore_ascii_case("docs"));
        assert!(check(&v, "@docs").is_empty());
        assert!(check(&v, "@Docs(section:\"users\")").is_empty());
        let issues = check(&v, "@api");
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("unknown annotation"));
    }

    #[test]
    fn test_strict_reports_unknown_annotation_and_param() {
        let v = validator(ValidationMode::Strict, ValidationAction::Fail);
        let issues = check(&v, "@mystery");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Error);

        let issues = check(&v, r#"@schema(title:"U", colour:"red", arg0:"x")"#);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].param.as_deref(), Some("colour"));
    }

    #[test]
    fn test_lax_ignores_unknown_and_downgrades() {
        let v = validator(ValidationMode::Lax, ValidationAction::Fail);
        assert!(check(&v, "@mystery").is_empty());

        let issues = check(&v, "@schema(readonly)");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);
    }

    #[test]
    fn test_enum_values_single_and_list() {
        let v = validator(ValidationMode::Strict, ValidationAction::Warn);
        assert!(check(&v, r#"@schema(title:"U", format:"JSON")"#).is_empty());
        assert!(check(&v, r#"@schema(title:"U", format:[json, yaml])"#).is_empty());

        let issues = check(&v, r#"@schema(title:"U", format:[json, xml])"#);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Error);
    }

    #[test]
    fn test_type_mismatch_is_warning_in_strict() {
        let v = validator(ValidationMode::Strict, ValidationAction::Fail);
        let issues = check(&v, r#"@schema(title:"U", readonly:"maybe")"#);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);
    }

    #[test]
    fn test_disabled_reports_nothing() {
        let v = validator(ValidationMode::Disabled, ValidationAction::Fail);
        assert!(check(&v, "@mystery").is_empty());
        let v = validator(ValidationMode::Strict, ValidationAction::Disabled);
        assert!(check(&v, "@mystery").is_empty());
    }

    #[test]
    fn test_should_fail_needs_fail_action_and_errors() {
        let report = ValidationReport {
            issues: vec![ValidationIssue {
                severity: Severity::Error,
                annotation: "schema".into(),
                param: None,
                message: "boom".into(),
                location: "x".into(),
            }],
            action: ValidationAction::Warn,
        };
        assert!(report.has_errors());
        assert!(!report.should_fail());

        let failing = ValidationReport {
            action: ValidationAction::Fail,
            ..report
        };
        assert!(failing.should_fail());
    }

    #[test]
    fn test_positional_arg_detection() {
        assert!(is_positional_arg("arg0"));
        assert!(is_positional_arg("arg12"));
        assert!(!is_positional_arg("arg"));
        assert!(!is_positional_arg("argument"));
    }
}
