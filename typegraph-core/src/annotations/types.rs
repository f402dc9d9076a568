//! Annotation records and typed parameter accessors.
//!
//! Parameters are kept as a string bag because plugins define their own
//! vocabularies. The accessors below are the stable contract for reading
//! them: each has an `Option` form and a form with an explicit default.

use std::collections::BTreeMap;

use serde::Serialize;

/// Key under which positional (unnamed) parameter values are stored.
pub const DEFAULT_PARAM: &str = "";

/// A parsed annotation such as `@schema(title:"User", readonly)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Annotation {
    pub name: String,
    /// Parameter values by key. Keys are unique; [`DEFAULT_PARAM`] holds positional values.
    pub params: BTreeMap<String, String>,
    /// The source line the annotation was parsed from.
    pub raw: String,
}

impl Annotation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn has_param(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Positional value, if any.
    pub fn default_value(&self) -> Option<&str> {
        self.param(DEFAULT_PARAM)
    }

    pub fn get_string(&self, key: &str, default: &str) -> String {
        self.param(key).unwrap_or(default).to_string()
    }

    pub fn bool_param(&self, key: &str) -> Option<bool> {
        self.param(key).and_then(parse_bool)
    }

    /// Unparseable values fall back to `default`.
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.bool_param(key).unwrap_or(default)
    }

    pub fn int_param(&self, key: &str) -> Option<i64> {
        self.param(key).and_then(|v| v.trim().parse().ok())
    }

    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        self.int_param(key).unwrap_or(default)
    }

    pub fn float_param(&self, key: &str) -> Option<f64> {
        self.param(key).and_then(|v| v.trim().parse().ok())
    }

    pub fn get_float(&self, key: &str, default: f64) -> f64 {
        self.float_param(key).unwrap_or(default)
    }

    /// List value written either as `[a, b]` or `a,b`. Missing keys give an empty list.
    pub fn get_string_list(&self, key: &str) -> Vec<String> {
        self.param(key).map(parse_string_list).unwrap_or_default()
    }
}

/// Boolean spellings accepted in annotation values.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Split a list value on commas outside quotes, dropping brackets and quotes.
pub fn parse_string_list(value: &str) -> Vec<String> {
    let trimmed = value.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(trimmed);

    super::parser::split_top_level(inner, |c| c == ',')
        .into_iter()
        .map(|item| super::parser::unquote(item.trim()))
        .filter(|item| !item.is_empty())
        .collect()
}

/// Where an annotation may be attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidOn {
    Struct,
    Field,
    Function,
    Enum,
    EnumValue,
    Interface,
    Alias,
    All,
}

/// Value type accepted by an annotation parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Bool,
    Int,
    Number,
    StringList,
    Enum,
    Null,
}

/// Declared parameter of an annotation spec.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnnotationParam {
    pub name: String,
    /// Empty means any type.
    pub types: Vec<ParamType>,
    pub enum_values: Vec<String>,
    pub required: bool,
    pub default_value: Option<String>,
    pub aliases: Vec<String>,
    pub description: String,
}

impl AnnotationParam {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn typed(mut self, ty: ParamType) -> Self {
        self.types.push(ty);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn one_of(mut self, values: &[&str]) -> Self {
        self.enum_values = values.iter().map(|v| (*v).to_string()).collect();
        if !self.types.contains(&ParamType::Enum) {
            self.types.push(ParamType::Enum);
        }
        self
    }

    pub fn matches_name(&self, key: &str) -> bool {
        self.name.eq_ignore_ascii_case(key) || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(key))
    }
}

/// Declared shape of an annotation, used by the validator and by plugins
/// to advertise their vocabulary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnnotationSpec {
    pub name: String,
    pub aliases: Vec<String>,
    pub valid_on: Vec<ValidOn>,
    pub params: Vec<AnnotationParam>,
    pub description: String,
    /// May appear more than once on the same element.
    pub multiple: bool,
}

impl AnnotationSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn on(mut self, target: ValidOn) -> Self {
        self.valid_on.push(target);
        self
    }

    pub fn param(mut self, param: AnnotationParam) -> Self {
        self.params.push(param);
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn matches_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name) || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }

    /// Empty `valid_on` means anywhere.
    pub fn allowed_on(&self, target: ValidOn) -> bool {
        self.valid_on.is_empty()
            || self.valid_on.contains(&ValidOn::All)
            || self.valid_on.contains(&target)
    }

    pub fn find_param(&self, key: &str) -> Option<&AnnotationParam> {
        self.params.iter().find(|p| p.matches_name(key))
    }
}

/// Annotations understood by the engine itself, regardless of plugin.
pub fn core_specs() -> Vec<AnnotationSpec> {
    vec![
        AnnotationSpec::new("scan")
            .alias("include")
            .on(ValidOn::Function)
            .describe("Scan the package of the annotated call for more declarations"),
        AnnotationSpec::new("skip")
            .alias("ignore")
            .on(ValidOn::All)
            .describe("Exclude the annotated element from generation"),
        AnnotationSpec::new("namespace")
            .on(ValidOn::Struct)
            .on(ValidOn::Enum)
            .on(ValidOn::Interface)
            .param(AnnotationParam::new("value").typed(ParamType::String))
            .describe("Namespace generators group the type under"),
    ]
}
