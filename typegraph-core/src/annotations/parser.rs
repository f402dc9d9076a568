//! Annotation text parsing.
//!
//! Accepted forms:
//!
//! ```text
//! @name
//! @name(key:"value", key2=value, flag, "positional")
//! @name key="value" flag
//! ```
//!
//! Parsing never fails hard: malformed input (unterminated quotes, a missing
//! closing paren) yields whatever could be recovered, and a line without a
//! name yields nothing.

use super::types::{Annotation, DEFAULT_PARAM};

/// Parse every annotation in a doc-comment blob.
///
/// Comment decoration (`//`, `/*`, `*/`, leading `*`) is stripped per line and
/// only lines starting with the marker are considered.
pub fn parse_annotations(doc: &str, marker: char) -> Vec<Annotation> {
    doc.lines()
        .filter_map(|line| {
            let line = strip_comment_decoration(line);
            if line.starts_with(marker) {
                parse_annotation(line, marker)
            } else {
                None
            }
        })
        .collect()
}

/// Doc text with comment decoration and annotation lines removed.
pub fn doc_comment_text(doc: &str, marker: char) -> String {
    doc.lines()
        .map(strip_comment_decoration)
        .filter(|line| !line.starts_with(marker))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn strip_comment_decoration(line: &str) -> &str {
    let mut line = line.trim();
    if let Some(rest) = line.strip_prefix("//") {
        line = rest.trim_start();
    } else if let Some(rest) = line.strip_prefix("/*") {
        line = rest.trim_start();
    }
    if let Some(rest) = line.strip_suffix("*/") {
        line = rest.trim_end();
    }
    if let Some(rest) = line.strip_prefix('*') {
        line = rest.trim_start();
    }
    line.trim()
}

/// Parse one annotation line. Returns `None` when the line does not start
/// with the marker or carries no name.
pub fn parse_annotation(line: &str, marker: char) -> Option<Annotation> {
    let raw = line.trim();
    let body = raw.strip_prefix(marker)?;

    let name_end = body
        .find(|c: char| c == '(' || c.is_whitespace())
        .unwrap_or(body.len());
    let name = body[..name_end].trim();
    if name.is_empty() {
        return None;
    }

    let mut annotation = Annotation::new(name);
    annotation.raw = raw.to_string();

    let rest = &body[name_end..];
    if let Some(inner) = rest.strip_prefix('(') {
        let params = match find_closing_paren(inner) {
            Some(end) => &inner[..end],
            None => inner,
        };
        for part in split_top_level(params, |c| c == ',') {
            apply_param(&mut annotation, part);
        }
    } else {
        for token in split_top_level(rest, char::is_whitespace) {
            apply_param(&mut annotation, token);
        }
    }

    Some(annotation)
}

fn apply_param(annotation: &mut Annotation, part: &str) {
    let part = part.trim();
    if part.is_empty() {
        return;
    }

    if let Some(idx) = find_separator(part) {
        let key = part[..idx].trim();
        let value = unquote(part[idx + 1..].trim());
        if !key.is_empty() {
            annotation.params.insert(key.to_string(), value);
            return;
        }
        push_positional(annotation, value);
        return;
    }

    if is_quoted(part) {
        push_positional(annotation, unquote(part));
    } else if is_flag(part) {
        annotation.params.insert(part.to_string(), "true".to_string());
    } else {
        push_positional(annotation, part.to_string());
    }
}

/// Later positional values are comma-joined into the same entry.
fn push_positional(annotation: &mut Annotation, value: String) {
    annotation
        .params
        .entry(DEFAULT_PARAM.to_string())
        .and_modify(|existing| {
            existing.push(',');
            existing.push_str(&value);
        })
        .or_insert(value);
}

fn is_flag(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn is_quoted(token: &str) -> bool {
    token.starts_with('"') || token.starts_with('\'')
}

/// First `:` or `=` outside quotes and brackets.
fn find_separator(part: &str) -> Option<usize> {
    let mut scanner = Scanner::default();
    for (i, c) in part.char_indices() {
        if scanner.step(c) && scanner.depth == 0 && (c == ':' || c == '=') {
            return Some(i);
        }
    }
    None
}

/// Byte offset of the paren closing an already-opened `(`.
fn find_closing_paren(s: &str) -> Option<usize> {
    let mut scanner = Scanner::default();
    let mut parens = 1usize;
    for (i, c) in s.char_indices() {
        if !scanner.step(c) {
            continue;
        }
        match c {
            '(' => parens += 1,
            ')' => {
                parens -= 1;
                if parens == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split on delimiter characters that sit outside quotes and `[]`, `{}`, `()`.
pub(crate) fn split_top_level(s: &str, is_delim: impl Fn(char) -> bool) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut scanner = Scanner::default();
    let mut start = 0;
    for (i, c) in s.char_indices() {
        let top_level = scanner.step(c);
        if top_level && scanner.depth == 0 && is_delim(c) {
            parts.push(&s[start..i]);
            start = i + c.len_utf8();
        }
    }
    parts.push(&s[start..]);
    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Strip surrounding quotes and resolve `\"`, `\'` and `\\`.
/// An unterminated quote keeps everything after the opening quote.
pub(crate) fn unquote(value: &str) -> String {
    let Some(quote) = value.chars().next().filter(|c| *c == '"' || *c == '\'') else {
        return value.to_string();
    };

    let mut out = String::with_capacity(value.len());
    let mut chars = value[1..].chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(n @ ('"' | '\'' | '\\')) => out.push(n),
                Some(n) => {
                    out.push('\\');
                    out.push(n);
                }
                None => out.push('\\'),
            },
            c if c == quote => break,
            c => out.push(c),
        }
    }
    out
}

/// Tracks quote and bracket state while walking a string.
#[derive(Default)]
struct Scanner {
    quote: Option<char>,
    escaped: bool,
    depth: usize,
}

impl Scanner {
    /// Feed one character. Returns true when the character is outside quotes
    /// and is not itself a quote or escape.
    fn step(&mut self, c: char) -> bool {
        if let Some(q) = self.quote {
            if self.escaped {
                self.escaped = false;
            } else if c == '\\' {
                self.escaped = true;
            } else if c == q {
                self.quote = None;
            }
            return false;
        }
        match c {
            '"' | '\'' => {
                self.quote = Some(c);
                false
            }
            '[' | '{' | '(' => {
                self.depth += 1;
                true
            }
            ']' | '}' | ')' => {
                self.depth = self.depth.saturating_sub(1);
                true
            }
            _ => true,
        }
    }
}
