//! Per-category scan modes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::TypeKind;

/// Controls the initial candidate universe of a declaration category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ScanMode {
    /// Every declaration of the category is a candidate.
    All,
    /// Only declarations reachable from explicit seeds are candidates.
    Referenced,
    /// The category is not scanned. `disabled` and the empty string parse here too.
    None,
}

impl ScanMode {
    pub fn is_enabled(self) -> bool {
        !matches!(self, ScanMode::None)
    }

    pub fn is_all(self) -> bool {
        matches!(self, ScanMode::All)
    }

    pub fn is_referenced(self) -> bool {
        matches!(self, ScanMode::Referenced)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScanMode::All => "all",
            ScanMode::Referenced => "referenced",
            ScanMode::None => "none",
        }
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScanMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(ScanMode::All),
            "referenced" => Ok(ScanMode::Referenced),
            "none" | "disabled" | "" => Ok(ScanMode::None),
            other => Err(format!(
                "invalid scan mode '{}' (expected all, referenced, none or disabled)",
                other
            )),
        }
    }
}

impl TryFrom<String> for ScanMode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Declaration categories that carry their own scan mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Structs,
    Enums,
    Interfaces,
    Functions,
}

impl Category {
    /// Category a node kind is filtered under.
    ///
    /// Aliases, containers and generic instantiations are struct-shaped for
    /// generators, so they share the struct mode.
    pub fn of(kind: TypeKind) -> Self {
        match kind {
            TypeKind::Enum => Category::Enums,
            TypeKind::Interface => Category::Interfaces,
            TypeKind::Function => Category::Functions,
            TypeKind::Composite
            | TypeKind::Alias
            | TypeKind::Array
            | TypeKind::Slice
            | TypeKind::Map
            | TypeKind::GenericInstantiation => Category::Structs,
        }
    }
}

/// Scan mode for each category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    pub structs: ScanMode,
    pub enums: ScanMode,
    pub interfaces: ScanMode,
    pub functions: ScanMode,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            structs: ScanMode::All,
            enums: ScanMode::All,
            interfaces: ScanMode::None,
            functions: ScanMode::None,
        }
    }
}

impl ScanOptions {
    pub fn mode(&self, category: Category) -> ScanMode {
        match category {
            Category::Structs => self.structs,
            Category::Enums => self.enums,
            Category::Interfaces => self.interfaces,
            Category::Functions => self.functions,
        }
    }

    /// True if any category uses `Referenced` mode.
    pub fn any_referenced(&self) -> bool {
        [self.structs, self.enums, self.interfaces, self.functions]
            .iter()
            .any(|m| m.is_referenced())
    }

    /// Apply a per-target override; fields set in the override win.
    pub fn merge(&self, over: &ScanOptionsOverride) -> ScanOptions {
        ScanOptions {
            structs: over.structs.unwrap_or(self.structs),
            enums: over.enums.unwrap_or(self.enums),
            interfaces: over.interfaces.unwrap_or(self.interfaces),
            functions: over.functions.unwrap_or(self.functions),
        }
    }
}

/// Per-target scan option override. Absent fields inherit from the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ScanOptionsOverride {
    pub structs: Option<ScanMode>,
    pub enums: Option<ScanMode>,
    pub interfaces: Option<ScanMode>,
    pub functions: Option<ScanMode>,
}
