//! Configuration loading from typegraph.toml.
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration. Per-target tables under `[targets.<name>]` override the
//! root settings field by field:
//!
//! ```toml
//! packages = ["example.com/app/models"]
//! module_path = "example.com/app"
//!
//! [scan_options]
//! structs = "referenced"
//!
//! [auto_generate]
//! strategy = "referenced"
//! max_depth = 2
//!
//! [targets.openapi.auto_generate]
//! max_depth = 0
//! ```

mod autogen;
mod scan;

pub use autogen::{AutoGenerateConfig, AutoGenerateOverride, AutoGenerateStrategy, OutOfScopeAction};
pub use scan::{Category, ScanMode, ScanOptions, ScanOptionsOverride};

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::fs;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::{IoResultExt, TypegraphError, TypegraphResult};
use crate::reachability::PatternSet;

/// File name looked up by [`load_config`].
pub const CONFIG_FILE_NAME: &str = "typegraph.toml";

/// Log verbosity for hosts that install the subscriber from config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    None,
}

impl LogLevel {
    /// Directive for `EnvFilter`, or `None` when logging is off.
    pub fn as_directive(self) -> Option<&'static str> {
        match self {
            LogLevel::Debug => Some("debug"),
            LogLevel::Info => Some("info"),
            LogLevel::Warn => Some("warn"),
            LogLevel::Error => Some("error"),
            LogLevel::None => None,
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "none" | "off" => Ok(LogLevel::None),
            other => Err(format!("invalid log level '{}'", other)),
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, String> {
        value.parse()
    }
}

/// How strictly annotations are checked against their specs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ValidationMode {
    Disabled,
    /// Errors are downgraded to warnings.
    #[default]
    Lax,
    /// Unknown annotations and parameters are reported too.
    Strict,
}

impl FromStr for ValidationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disabled" | "none" | "" => Ok(ValidationMode::Disabled),
            "lax" => Ok(ValidationMode::Lax),
            "strict" => Ok(ValidationMode::Strict),
            other => Err(format!("invalid validation mode '{}'", other)),
        }
    }
}

impl TryFrom<String> for ValidationMode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// What a finished validation does with its findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ValidationAction {
    Disabled,
    #[default]
    Warn,
    /// Abort the run when any error-severity finding remains.
    Fail,
}

impl FromStr for ValidationAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disabled" | "none" | "" => Ok(ValidationAction::Disabled),
            "warn" | "warning" => Ok(ValidationAction::Warn),
            "fail" | "error" => Ok(ValidationAction::Fail),
            other => Err(format!("invalid validation action '{}'", other)),
        }
    }
}

impl TryFrom<String> for ValidationAction {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValidationMode::Disabled => "disabled",
            ValidationMode::Lax => "lax",
            ValidationMode::Strict => "strict",
        };
        f.write_str(s)
    }
}

/// Annotation validation settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    pub mode: ValidationMode,
    pub action: ValidationAction,
}

/// Per-target overrides, keyed by plugin name under `[targets]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    pub scan_options: Option<ScanOptionsOverride>,
    pub auto_generate: Option<AutoGenerateOverride>,
}

/// Main configuration structure for typegraph.toml.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Scanned roots: package prefixes or `dir/...` style globs.
    pub packages: Vec<String>,
    /// Module path shared by local (but not scanned) packages.
    pub module_path: String,
    /// Marker that starts an annotation line.
    pub annotation_prefix: String,
    /// Struct tag key generators should read field names from.
    pub struct_tag_name: Option<String>,
    /// When false, generic expressions resolve to their base type.
    pub enable_generics: bool,
    pub log_level: LogLevel,
    pub scan_options: ScanOptions,
    pub auto_generate: AutoGenerateConfig,
    pub validator: ValidatorConfig,
    /// Annotation parameter keys on functions that name seed types.
    pub seed_params: Vec<String>,
    pub targets: BTreeMap<String, TargetConfig>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            packages: Vec::new(),
            module_path: String::new(),
            annotation_prefix: "@".to_string(),
            struct_tag_name: None,
            enable_generics: true,
            log_level: LogLevel::default(),
            scan_options: ScanOptions::default(),
            auto_generate: AutoGenerateConfig::default(),
            validator: ValidatorConfig::default(),
            seed_params: vec!["schema".to_string()],
            targets: BTreeMap::new(),
        }
    }
}

impl CoreConfig {
    /// Parse and validate a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> TypegraphResult<Self> {
        let cfg: CoreConfig = toml::from_str(content)
            .map_err(|e| TypegraphError::config(CONFIG_FILE_NAME, e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject settings that would make a run meaningless.
    pub fn validate(&self) -> TypegraphResult<()> {
        let path = PathBuf::from(CONFIG_FILE_NAME);
        if self.annotation_prefix.trim().is_empty() {
            return Err(TypegraphError::config(path, "annotation_prefix must not be empty"));
        }

        PatternSet::compile(&self.auto_generate.patterns, &self.auto_generate.exclude_patterns)
            .map_err(|e| TypegraphError::config(&path, e.to_string()))?;
        for (name, target) in &self.targets {
            if let Some(over) = &target.auto_generate {
                let merged = self.auto_generate.merge(over);
                PatternSet::compile(&merged.patterns, &merged.exclude_patterns).map_err(|e| {
                    TypegraphError::config(&path, format!("target '{}': {}", name, e))
                })?;
            }
        }
        Ok(())
    }

    /// Configuration as seen by one target: root settings with its overrides applied.
    pub fn for_target(&self, name: &str) -> CoreConfig {
        let mut merged = self.clone();
        if let Some(target) = self.targets.get(name) {
            if let Some(over) = &target.scan_options {
                merged.scan_options = self.scan_options.merge(over);
            }
            if let Some(over) = &target.auto_generate {
                merged.auto_generate = self.auto_generate.merge(over);
            }
        }
        merged
    }

    /// The marker as a single character, falling back to `@`.
    pub fn marker(&self) -> char {
        self.annotation_prefix.trim().chars().next().unwrap_or('@')
    }
}

/// Loads configuration from typegraph.toml if it exists.
pub fn load_config(root: &Path) -> Result<Option<CoreConfig>> {
    let path = root.join(CONFIG_FILE_NAME);
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path).with_path(path.clone())?;
    let cfg = CoreConfig::from_toml_str(&content).context("Invalid typegraph.toml")?;
    Ok(Some(cfg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let cfg = CoreConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, CoreConfig::default());
        assert_eq!(cfg.marker(), '@');
        assert!(cfg.enable_generics);
        assert_eq!(cfg.seed_params, vec!["schema"]);
    }

    #[test]
    fn test_parse_full_config() {
        let cfg = CoreConfig::from_toml_str(
            r#"
packages = ["example.com/app/models"]
module_path = "example.com/app"
annotation_prefix = "@"
log_level = "debug"

[scan_options]
structs = "referenced"
functions = "all"

[auto_generate]
strategy = "patterns"
max_depth = 3
patterns = ["*/models/*"]
out_of_scope_action = "exclude"

[validator]
mode = "strict"
action = "fail"

[targets.openapi.auto_generate]
max_depth = 0
"#,
        )
        .unwrap();

        assert_eq!(cfg.scan_options.structs, ScanMode::Referenced);
        assert_eq!(cfg.scan_options.functions, ScanMode::All);
        assert_eq!(cfg.auto_generate.strategy, AutoGenerateStrategy::Patterns);
        assert_eq!(cfg.auto_generate.out_of_scope_action, OutOfScopeAction::Exclude);
        assert_eq!(cfg.validator.mode, ValidationMode::Strict);
        assert_eq!(cfg.log_level, LogLevel::Debug);

        let target = cfg.for_target("openapi");
        assert_eq!(target.auto_generate.max_depth, 0);
        assert_eq!(target.auto_generate.strategy, AutoGenerateStrategy::Patterns);
        assert_eq!(cfg.for_target("unknown").auto_generate.max_depth, 3);
    }

    #[test]
    fn test_invalid_mode_is_config_error() {
        let err = CoreConfig::from_toml_str("[scan_options]\nstructs = \"sometimes\"\n").unwrap_err();
        assert!(matches!(err, TypegraphError::Config { .. }));
        assert!(err.to_string().contains("sometimes"));
    }

    #[test]
    fn test_empty_marker_rejected() {
        let err = CoreConfig::from_toml_str("annotation_prefix = \"  \"").unwrap_err();
        assert!(err.to_string().contains("annotation_prefix"));
    }

    #[test]
    fn test_invalid_glob_is_config_error() {
        let err = CoreConfig::from_toml_str("[auto_generate]\npatterns = [\"app.[User\"]\n").unwrap_err();
        assert!(matches!(err, TypegraphError::Config { .. }));

        let err = CoreConfig::from_toml_str("[targets.docs.auto_generate]\nexclude_patterns = [\"\"]\n").unwrap_err();
        assert!(err.to_string().contains("target 'docs'"));
    }

    #[test]
    fn test_load_missing_config() {
        let dir = std::env::temp_dir().join("typegraph_no_config_here");
        assert!(load_config(&dir).unwrap().is_none());
    }
}
