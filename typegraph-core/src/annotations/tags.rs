//! Inline field metadata tags: `` `json:"id,omitempty" db:"user_id"` ``.
//!
//! Tags are distinct from comment annotations. They are ordered key/quoted-value
//! pairs; parsing stops at the first malformed pair and keeps what came before.

use serde::{Serialize, Serializer};

/// Ordered tag pairs of one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructTags {
    pairs: Vec<(String, String)>,
}

impl StructTags {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First comma-separated segment of a tag, e.g. `id` for `json:"id,omitempty"`.
    /// `-` and empty names count as absent.
    pub fn name_for(&self, key: &str) -> Option<&str> {
        let name = self.get(key)?.split(',').next()?.trim();
        match name {
            "" | "-" => None,
            other => Some(other),
        }
    }

    /// Option flags after the name, e.g. `["omitempty"]`.
    pub fn options_for(&self, key: &str) -> Vec<&str> {
        self.get(key)
            .map(|v| v.split(',').skip(1).map(str::trim).filter(|o| !o.is_empty()).collect())
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    fn insert(&mut self, key: String, value: String) {
        if let Some(slot) = self.pairs.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.pairs.push((key, value));
        }
    }
}

impl Serialize for StructTags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

/// Parse a raw tag string. Surrounding backticks are optional.
pub fn parse_struct_tags(raw: &str) -> StructTags {
    let mut tags = StructTags::default();
    let mut rest = raw.trim();
    if rest.len() >= 2 && rest.starts_with('`') && rest.ends_with('`') {
        rest = &rest[1..rest.len() - 1];
    }

    loop {
        rest = rest.trim_start_matches(' ');
        if rest.is_empty() {
            break;
        }

        let Some(colon) = rest.find(':') else { break };
        let key = rest[..colon].to_string();
        rest = rest[colon + 1..].trim_start_matches(' ');

        let Some(body) = rest.strip_prefix('"') else { break };
        let Some(end) = closing_quote(body) else { break };

        let value = body[..end].replace("\\\"", "\"").replace("\\\\", "\\");
        tags.insert(key, value);
        rest = &body[end + 1..];
    }

    tags
}

/// Index of the first unescaped `"`.
fn closing_quote(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Some(i),
            _ => i += 1,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ordered_pairs() {
        let tags = parse_struct_tags(r#"`json:"id,omitempty" db:"user_id" validate:"required"`"#);
        assert_eq!(tags.len(), 3);
        let keys: Vec<&str> = tags.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["json", "db", "validate"]);
        assert_eq!(tags.name_for("json"), Some("id"));
        assert_eq!(tags.options_for("json"), vec!["omitempty"]);
        assert_eq!(tags.get("db"), Some("user_id"));
    }

    #[test]
    fn test_escaped_values() {
        let tags = parse_struct_tags(r#"doc:"say \"hi\" \\o/""#);
        assert_eq!(tags.get("doc"), Some(r#"say "hi" \o/"#));
    }

    #[test]
    fn test_malformed_keeps_prefix() {
        let tags = parse_struct_tags(r#"json:"name" broken:unquoted yaml:"x""#);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags.get("json"), Some("name"));
        assert_eq!(tags.get("yaml"), None);

        assert!(parse_struct_tags(r#"json:"never closed"#).is_empty());
        assert!(parse_struct_tags("").is_empty());
    }

    #[test]
    fn test_dash_means_skipped() {
        let tags = parse_struct_tags(r#"json:"-""#);
        assert_eq!(tags.name_for("json"), None);
    }
}
