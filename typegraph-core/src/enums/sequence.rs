//! Value sequencing inside a constant group.
//!
//! Decision per member, at position `p` (reset to 0 by an explicit type):
//!
//! 1. value mentions the sequence marker: it becomes the current pattern,
//!    evaluated at `p`
//! 2. explicit literal: taken as written, pattern untouched
//! 3. omitted, pattern set: the pattern evaluated at `p`
//! 4. omitted after an integer literal `n` at position `q`: `n + (p - q)`
//! 5. omitted after a string literal: the literal again
//! 6. otherwise: `p`

use crate::model::EnumLiteral;

/// Identifier whose value is the member's position in the group.
pub const SEQUENCE_MARKER: &str = "iota";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Anchor {
    Int { value: i64, position: i64 },
    Str(String),
}

/// Running state of one constant group.
#[derive(Debug, Clone, Default)]
pub struct ConstSequence {
    position: i64,
    pattern: Option<String>,
    last_literal: Option<Anchor>,
}

impl ConstSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// An explicit member type starts a new run.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn position(&self) -> i64 {
        self.position
    }

    /// Value of the next member given its raw value expression.
    pub fn next_value(&mut self, raw: Option<&str>) -> EnumLiteral {
        let position = self.position;
        self.position += 1;

        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            Some(expr) if mentions_marker(expr) => {
                self.pattern = Some(expr.to_string());
                EnumLiteral::Int(evaluate(expr, position))
            }
            Some(expr) => {
                let literal = parse_literal(expr);
                self.last_literal = Some(match &literal {
                    EnumLiteral::Int(value) => Anchor::Int {
                        value: *value,
                        position,
                    },
                    EnumLiteral::Str(s) => Anchor::Str(s.clone()),
                });
                literal
            }
            None => match (&self.pattern, &self.last_literal) {
                (Some(pattern), _) => EnumLiteral::Int(evaluate(pattern, position)),
                (None, Some(Anchor::Int { value, position: at })) => {
                    EnumLiteral::Int(value.saturating_add(position - at))
                }
                (None, Some(Anchor::Str(s))) => EnumLiteral::Str(s.clone()),
                (None, None) => EnumLiteral::Int(position),
            },
        }
    }
}

fn mentions_marker(expr: &str) -> bool {
    expr.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .any(|word| word == SEQUENCE_MARKER)
}

/// Quoted text becomes a string, integer text an integer, anything else is
/// kept verbatim as a string.
pub fn parse_literal(expr: &str) -> EnumLiteral {
    let expr = expr.trim();
    for quote in ['"', '`', '\''] {
        if expr.len() >= 2 && expr.starts_with(quote) && expr.ends_with(quote) {
            return EnumLiteral::Str(expr[1..expr.len() - 1].replace("\\\"", "\""));
        }
    }
    match parse_int(expr) {
        Some(n) => EnumLiteral::Int(n),
        None => EnumLiteral::Str(expr.to_string()),
    }
}

fn parse_int(text: &str) -> Option<i64> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, text),
    };
    let digits = digits.replace('_', "");
    let lower = digits.to_ascii_lowercase();
    let value = if let Some(hex) = lower.strip_prefix("0x") {
        i64::from_str_radix(hex, 16).ok()?
    } else if let Some(bin) = lower.strip_prefix("0b") {
        i64::from_str_radix(bin, 2).ok()?
    } else if let Some(oct) = lower.strip_prefix("0o") {
        i64::from_str_radix(oct, 8).ok()?
    } else {
        lower.parse::<i64>().ok()?
    };
    Some(if negative { -value } else { value })
}

/// Evaluate an integer expression over the marker at `position`. Anything
/// that cannot be evaluated, including division by zero, gives `position`.
pub fn evaluate(expr: &str, position: i64) -> i64 {
    let tokens = match tokenize(expr) {
        Some(tokens) => tokens,
        None => return position,
    };
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        marker: position,
    };
    match parser.expr() {
        Some(value) if parser.pos == tokens.len() => value,
        _ => position,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Num(i64),
    Marker,
    Op(&'static str),
    Open,
    Close,
}

fn tokenize(expr: &str) -> Option<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = expr.char_indices().peekable();
    while let Some(&(i, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c.is_ascii_digit() {
            let start = i;
            let mut end = i;
            while let Some(&(j, d)) = chars.peek() {
                if d.is_ascii_alphanumeric() || d == '_' {
                    end = j + d.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token::Num(parse_int(&expr[start..end])?));
            continue;
        }
        if c.is_alphabetic() || c == '_' {
            let start = i;
            let mut end = i;
            while let Some(&(j, d)) = chars.peek() {
                if d.is_alphanumeric() || d == '_' {
                    end = j + d.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            if &expr[start..end] != SEQUENCE_MARKER {
                return None;
            }
            tokens.push(Token::Marker);
            continue;
        }
        chars.next();
        let token = match c {
            '(' => Token::Open,
            ')' => Token::Close,
            '+' => Token::Op("+"),
            '-' => Token::Op("-"),
            '*' => Token::Op("*"),
            '/' => Token::Op("/"),
            '%' => Token::Op("%"),
            '<' | '>' => {
                let (_, next) = chars.next()?;
                if next != c {
                    return None;
                }
                Token::Op(if c == '<' { "<<" } else { ">>" })
            }
            _ => return None,
        };
        tokens.push(token);
    }
    Some(tokens)
}

/// Precedence follows Go: `* / % << >>` bind tighter than `+ -`.
struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    marker: i64,
}

impl Parser<'_> {
    fn peek_op(&self) -> Option<&'static str> {
        match self.tokens.get(self.pos) {
            Some(Token::Op(op)) => Some(op),
            _ => None,
        }
    }

    fn expr(&mut self) -> Option<i64> {
        let mut value = self.term()?;
        while let Some(op @ ("+" | "-")) = self.peek_op() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if op == "+" {
                value.checked_add(rhs)?
            } else {
                value.checked_sub(rhs)?
            };
        }
        Some(value)
    }

    fn term(&mut self) -> Option<i64> {
        let mut value = self.unary()?;
        while let Some(op @ ("*" | "/" | "%" | "<<" | ">>")) = self.peek_op() {
            self.pos += 1;
            let rhs = self.unary()?;
            value = match op {
                "*" => value.checked_mul(rhs)?,
                "/" => value.checked_div(rhs)?,
                "%" => value.checked_rem(rhs)?,
                "<<" => value.checked_shl(u32::try_from(rhs).ok()?)?,
                _ => value.checked_shr(u32::try_from(rhs).ok()?)?,
            };
        }
        Some(value)
    }

    fn unary(&mut self) -> Option<i64> {
        if self.peek_op() == Some("-") {
            self.pos += 1;
            return self.unary()?.checked_neg();
        }
        match self.tokens.get(self.pos)? {
            Token::Num(n) => {
                self.pos += 1;
                Some(*n)
            }
            Token::Marker => {
                self.pos += 1;
                Some(self.marker)
            }
            Token::Open => {
                self.pos += 1;
                let value = self.expr()?;
                if self.tokens.get(self.pos) != Some(&Token::Close) {
                    return None;
                }
                self.pos += 1;
                Some(value)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(values: &[Option<&str>]) -> Vec<EnumLiteral> {
        let mut seq = ConstSequence::new();
        values.iter().map(|v| seq.next_value(*v)).collect()
    }

    fn ints(values: &[i64]) -> Vec<EnumLiteral> {
        values.iter().map(|v| EnumLiteral::Int(*v)).collect()
    }

    #[test]
    fn test_plain_marker_sequence() {
        assert_eq!(run(&[Some("iota"), None, None]), ints(&[0, 1, 2]));
    }

    #[test]
    fn test_pattern_is_reevaluated() {
        assert_eq!(run(&[Some("iota * 10"), None, None]), ints(&[0, 10, 20]));
        assert_eq!(run(&[Some("iota + 1"), None, None]), ints(&[1, 2, 3]));
        assert_eq!(run(&[Some("1 << iota"), None, None, None]), ints(&[1, 2, 4, 8]));
        assert_eq!(run(&[Some("100 - iota"), None]), ints(&[100, 99]));
    }

    #[test]
    fn test_literal_anchor_continues() {
        assert_eq!(run(&[Some("5"), None, None]), ints(&[5, 6, 7]));
        assert_eq!(run(&[None, None]), ints(&[0, 1]));
    }

    #[test]
    fn test_string_literal_repeats() {
        assert_eq!(
            run(&[Some("\"red\""), None]),
            vec![EnumLiteral::Str("red".into()), EnumLiteral::Str("red".into())]
        );
    }

    #[test]
    fn test_literal_does_not_replace_pattern() {
        assert_eq!(run(&[Some("iota * 2"), Some("7"), None]), ints(&[0, 7, 4]));
    }

    #[test]
    fn test_reset_on_explicit_type() {
        let mut seq = ConstSequence::new();
        seq.next_value(Some("iota + 3"));
        seq.next_value(None);
        seq.reset();
        assert_eq!(seq.position(), 0);
        assert_eq!(seq.next_value(None), EnumLiteral::Int(0));
    }

    #[test]
    fn test_evaluate_fallbacks() {
        assert_eq!(evaluate("iota / 0", 3), 3);
        assert_eq!(evaluate("iota + other", 4), 4);
        assert_eq!(evaluate("iota +", 2), 2);
        assert_eq!(evaluate("1 << (10 * iota)", 2), 1 << 20);
        assert_eq!(evaluate("-iota", 5), -5);
    }

    #[test]
    fn test_parse_literal_forms() {
        assert_eq!(parse_literal("0x1F"), EnumLiteral::Int(31));
        assert_eq!(parse_literal("-4"), EnumLiteral::Int(-4));
        assert_eq!(parse_literal("1_000"), EnumLiteral::Int(1000));
        assert_eq!(parse_literal("`raw`"), EnumLiteral::Str("raw".into()));
        assert_eq!(parse_literal("OtherConst"), EnumLiteral::Str("OtherConst".into()));
    }
}
