//! Recursive-descent parser over a single trimmed scalar: the embedded
//! type-expression mini-language (unions, intersections, literals,
//! primitives, type references, and the `Ref<...>` special form).
//!
//! Precedence, lowest to highest: union (`|`), intersection (`&`),
//! parenthesization, atoms. The top-level splitter skips separators nested
//! inside `(...)`, `<...>`, and quoted strings, mirroring the quote- and
//! depth-aware splitter in [`crate::yaml_reader`].

use crate::error::TdlError;
use crate::ir::{Literal, Primitive, TypeNode};
use regex::Regex;

const PRIMITIVE_WORDS: &[(&str, Primitive)] = &[
    ("string", Primitive::String),
    ("number", Primitive::Number),
    ("boolean", Primitive::Boolean),
    ("typedoc", Primitive::Typedoc),
    ("image", Primitive::Image),
    ("audio", Primitive::Audio),
    ("video", Primitive::Video),
    ("never", Primitive::Never),
];

fn type_error(message: impl Into<String>) -> TdlError {
    TdlError::TypeExpression(message.into())
}

/// Parses a trimmed scalar right-hand side into a [`TypeNode`].
pub fn parse(expr: &str) -> Result<TypeNode, TdlError> {
    let trimmed = expr.trim();
    if trimmed.is_empty() {
        return Err(type_error("type expression must not be empty"));
    }
    parse_union(trimmed)
}

fn parse_union(s: &str) -> Result<TypeNode, TdlError> {
    let parts = split_top_level(s, '|');
    if parts.len() >= 2 {
        let members = parts
            .iter()
            .map(|p| parse_intersection(p.trim()))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(TypeNode::Union(members));
    }
    parse_intersection(s)
}

fn parse_intersection(s: &str) -> Result<TypeNode, TdlError> {
    let parts = split_top_level(s, '&');
    if parts.len() >= 2 {
        let members = parts
            .iter()
            .map(|p| parse_unary(p.trim()))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(TypeNode::Intersection(members));
    }
    parse_unary(s)
}

fn parse_unary(s: &str) -> Result<TypeNode, TdlError> {
    check_rejections(s)?;

    if s.is_empty() {
        return Err(type_error("type expression must not be empty"));
    }

    if is_fully_parenthesized(s) {
        return parse_union(s[1..s.len() - 1].trim());
    }

    parse_atom(s)
}

fn check_rejections(s: &str) -> Result<(), TdlError> {
    if s.contains("=>") {
        return Err(type_error("function types are not supported"));
    }
    if s.contains("::") {
        return Err(type_error("qualified/imported type references are not supported"));
    }
    let word = Regex::new(r"\b(if|then|else)\b").expect("valid regex");
    if word.is_match(s) {
        return Err(type_error("conditional types are not supported"));
    }
    Ok(())
}

fn is_fully_parenthesized(s: &str) -> bool {
    if !(s.starts_with('(') && s.ends_with(')')) {
        return false;
    }
    let mut depth = 0i32;
    for (i, ch) in s.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 && i != s.len() - 1 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

fn parse_atom(s: &str) -> Result<TypeNode, TdlError> {
    if let Some(content) = scan_quoted_literal(s)? {
        return Ok(TypeNode::StringLiteral(content));
    }

    if s == "true" {
        return Ok(TypeNode::BooleanLiteral(true));
    }
    if s == "false" {
        return Ok(TypeNode::BooleanLiteral(false));
    }

    let numeric = Regex::new(r"^[0-9]+(\.[0-9]+)?$").expect("valid regex");
    if numeric.is_match(s) {
        let value: f64 = s.parse().map_err(|_| type_error(format!("invalid numeric literal '{s}'")))?;
        return Ok(TypeNode::NumberLiteral(value));
    }

    if let Some((_, primitive)) = PRIMITIVE_WORDS.iter().find(|(word, _)| *word == s) {
        return Ok(TypeNode::Primitive(*primitive));
    }

    if s.contains('<') {
        if let Some(inner) = s.strip_prefix("Ref<").and_then(|v| v.strip_suffix('>')) {
            if !inner.is_empty() {
                return Ok(TypeNode::Primitive(Primitive::String));
            }
        }
        return Err(type_error(format!("unsupported generic type usage '{s}'")));
    }

    let type_ref = Regex::new(r"^[A-Z][A-Za-z0-9]*$").expect("valid regex");
    if type_ref.is_match(s) {
        return Ok(TypeNode::TypeRef(s.to_string()));
    }

    let all_caps = Regex::new(r"^[A-Z][A-Z0-9_]*$").expect("valid regex");
    if all_caps.is_match(s) {
        return Ok(TypeNode::StringLiteral(s.to_string()));
    }

    Err(type_error(format!("unrecognized type expression token '{s}'")))
}

/// If `s` is wholly a single- or double-quoted string literal, returns its
/// decoded content. Returns `Ok(None)` for anything else; an unterminated
/// quote or trailing content after the closing quote is an error.
fn scan_quoted_literal(s: &str) -> Result<Option<String>, TdlError> {
    let mut chars = s.char_indices();
    let Some((_, quote)) = chars.next() else {
        return Ok(None);
    };
    if quote != '"' && quote != '\'' {
        return Ok(None);
    }

    let mut out = String::new();
    let mut escaped = false;
    for (i, ch) in chars {
        if escaped {
            let actual = match ch {
                'n' => '\n',
                't' => '\t',
                'r' => '\r',
                '\\' => '\\',
                '"' => '"',
                '\'' => '\'',
                other => other,
            };
            out.push(actual);
            escaped = false;
            continue;
        }
        if ch == '\\' {
            escaped = true;
            continue;
        }
        if ch == quote {
            if i + ch.len_utf8() != s.len() {
                return Err(type_error(format!(
                    "unexpected trailing content after quoted literal '{s}'"
                )));
            }
            return Ok(Some(out));
        }
        out.push(ch);
    }

    Err(type_error(format!("unterminated quoted literal '{s}'")))
}

/// Parses a single enum-like domain member: a quoted string, a number,
/// `true`/`false`, or an ALL_CAPS token (treated as a string value). Used by
/// the inline-object parser for index-signature domains (§4.2).
pub(crate) fn parse_literal(token: &str) -> Result<Literal, TdlError> {
    let token = token.trim();

    if let Some(content) = scan_quoted_literal(token)? {
        return Ok(Literal::String(content));
    }
    if token == "true" {
        return Ok(Literal::Boolean(true));
    }
    if token == "false" {
        return Ok(Literal::Boolean(false));
    }

    let numeric = Regex::new(r"^[0-9]+(\.[0-9]+)?$").expect("valid regex");
    if numeric.is_match(token) {
        let value: f64 = token
            .parse()
            .map_err(|_| type_error(format!("invalid numeric literal '{token}'")))?;
        return Ok(Literal::Number(value));
    }

    let all_caps = Regex::new(r"^[A-Z][A-Z0-9_]*$").expect("valid regex");
    if all_caps.is_match(token) {
        return Ok(Literal::String(token.to_string()));
    }

    Err(type_error(format!(
        "enum-like expression must be literals or ALL_CAPS_TOKENs, found '{token}'"
    )))
}

/// Splits `input` at top-level occurrences of `delimiter`, skipping
/// separators nested inside `(...)`, `<...>`, or quoted strings (respecting
/// a preceding backslash).
fn split_top_level(input: &str, delimiter: char) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut depth_paren = 0i32;
    let mut depth_angle = 0i32;
    let mut in_single = false;
    let mut in_double = false;
    let mut escape = false;

    for ch in input.chars() {
        if (in_single || in_double) && escape {
            current.push(ch);
            escape = false;
            continue;
        }
        if (in_single || in_double) && ch == '\\' {
            current.push(ch);
            escape = true;
            continue;
        }

        match ch {
            '\'' if !in_double => {
                in_single = !in_single;
                current.push(ch);
            }
            '"' if !in_single => {
                in_double = !in_double;
                current.push(ch);
            }
            '(' if !in_single && !in_double => {
                depth_paren += 1;
                current.push(ch);
            }
            ')' if !in_single && !in_double => {
                depth_paren -= 1;
                current.push(ch);
            }
            '<' if !in_single && !in_double => {
                depth_angle += 1;
                current.push(ch);
            }
            '>' if !in_single && !in_double => {
                depth_angle -= 1;
                current.push(ch);
            }
            c if c == delimiter
                && !in_single
                && !in_double
                && depth_paren == 0
                && depth_angle == 0 =>
            {
                out.push(current);
                current = String::new();
            }
            _ => current.push(ch),
        }
    }

    out.push(current);
    out
}
