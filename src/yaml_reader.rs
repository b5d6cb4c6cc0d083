//! Order-preserving YAML-subset reader used by the TDL parser.
//!
//! Supports block mappings and sequences (2-space-consistent indentation),
//! inline `{...}` / `[...]` flow collections, single/double-quoted scalars,
//! bare scalars (numbers/booleans/null/plain strings), and `#` comments.
//! Unlike a general-purpose YAML library, mapping order is preserved by
//! construction — [`YamlNode::Mapping`] is a `Vec` of pairs, not a sorted or
//! hash-keyed map — because the TDL front-end depends on declaration order
//! for deterministic `$defs` output.

use crate::error::TdlError;

const MAX_DOCUMENT_LINES: usize = 100_000;
const MAX_CONTAINER_DEPTH: usize = 64;
const MAX_COLLECTION_ITEMS: usize = 50_000;

/// A parsed YAML-subset node, preserving source order within mappings.
#[derive(Debug, Clone, PartialEq)]
pub enum YamlNode {
    /// An ordered mapping; duplicate keys are rejected during parsing.
    Mapping(Vec<(String, YamlNode)>),
    /// A sequence of nodes.
    Sequence(Vec<YamlNode>),
    /// A scalar string (quoted or bare, after escape processing).
    String(String),
    /// A scalar number.
    Number(f64),
    /// A scalar boolean.
    Bool(bool),
    /// An explicit `null`/`~`, or an empty value.
    Null,
}

impl YamlNode {
    /// Returns the ordered entries if this node is a mapping.
    pub fn as_mapping(&self) -> Option<&[(String, YamlNode)]> {
        match self {
            YamlNode::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    /// Returns the scalar string if this node is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            YamlNode::String(s) => Some(s),
            _ => None,
        }
    }

    /// Looks up a key in this node if it is a mapping.
    pub fn get(&self, key: &str) -> Option<&YamlNode> {
        self.as_mapping()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }
}

fn yaml_error(message: impl Into<String>) -> TdlError {
    TdlError::Yaml(message.into())
}

/// Parses a complete YAML-subset document into a [`YamlNode`].
pub fn parse_document(input: &str) -> Result<YamlNode, TdlError> {
    let lines: Vec<Line<'_>> = input
        .lines()
        .enumerate()
        .map(|(i, raw)| Line { number: i + 1, raw })
        .collect();

    if lines.len() > MAX_DOCUMENT_LINES {
        return Err(yaml_error(format!(
            "document exceeds max supported line count ({MAX_DOCUMENT_LINES})"
        )));
    }

    let mut idx = 0usize;
    while idx < lines.len() && is_ignorable(lines[idx].raw) {
        idx += 1;
    }

    if idx >= lines.len() {
        return Ok(YamlNode::Mapping(Vec::new()));
    }

    let indent = leading_spaces(lines[idx].raw);
    parse_block(&lines, &mut idx, indent, 0)
}

#[derive(Clone, Copy)]
struct Line<'a> {
    number: usize,
    raw: &'a str,
}

fn parse_block(
    lines: &[Line<'_>],
    idx: &mut usize,
    indent: usize,
    depth: usize,
) -> Result<YamlNode, TdlError> {
    if depth > MAX_CONTAINER_DEPTH {
        return Err(yaml_error(format!(
            "maximum nesting depth exceeded ({MAX_CONTAINER_DEPTH})"
        )));
    }

    while *idx < lines.len() && is_ignorable(lines[*idx].raw) {
        *idx += 1;
    }

    if *idx >= lines.len() {
        return Ok(YamlNode::Mapping(Vec::new()));
    }

    let line = lines[*idx];
    let current_indent = leading_spaces(line.raw);
    if current_indent < indent {
        return Ok(YamlNode::Mapping(Vec::new()));
    }
    if current_indent > indent {
        return Err(yaml_error(format!(
            "unexpected indentation at line {}: expected {}, found {}",
            line.number, indent, current_indent
        )));
    }

    let trimmed = line.raw[indent..].trim_start();
    if trimmed.starts_with("- ") || trimmed == "-" {
        parse_sequence(lines, idx, indent, depth)
    } else if split_key_value(trimmed).is_some() {
        parse_mapping(lines, idx, indent, depth)
    } else {
        let value = parse_inline_value(trimmed, depth + 1)?;
        *idx += 1;
        Ok(value)
    }
}

fn parse_mapping(
    lines: &[Line<'_>],
    idx: &mut usize,
    indent: usize,
    depth: usize,
) -> Result<YamlNode, TdlError> {
    let mut entries: Vec<(String, YamlNode)> = Vec::new();

    while *idx < lines.len() {
        if is_ignorable(lines[*idx].raw) {
            *idx += 1;
            continue;
        }

        let line = lines[*idx];
        let current_indent = leading_spaces(line.raw);
        if current_indent < indent {
            break;
        }
        if current_indent > indent {
            return Err(yaml_error(format!(
                "unexpected indentation in mapping at line {}: expected {}",
                line.number, indent
            )));
        }

        let trimmed = line.raw[indent..].trim_start();
        if trimmed.starts_with("- ") {
            return Err(yaml_error(format!(
                "mixed sequence/mapping at line {}",
                line.number
            )));
        }

        let (key_raw, value_raw) = split_key_value(trimmed).ok_or_else(|| {
            yaml_error(format!("expected key:value at line {}", line.number))
        })?;

        let key = parse_key(key_raw)?;
        if entries.iter().any(|(k, _)| k == &key) {
            return Err(yaml_error(format!(
                "duplicate key '{}' at line {}",
                key, line.number
            )));
        }

        *idx += 1;

        let value = if value_raw.is_empty() {
            let mut lookahead = *idx;
            while lookahead < lines.len() && is_ignorable(lines[lookahead].raw) {
                lookahead += 1;
            }
            if lookahead >= lines.len() {
                YamlNode::Null
            } else {
                let next_indent = leading_spaces(lines[lookahead].raw);
                if next_indent <= indent {
                    YamlNode::Null
                } else {
                    parse_block(lines, idx, next_indent, depth + 1)?
                }
            }
        } else {
            parse_inline_value(value_raw, depth + 1)?
        };

        entries.push((key, value));
        if entries.len() > MAX_COLLECTION_ITEMS {
            return Err(yaml_error(format!(
                "mapping exceeds max item count ({MAX_COLLECTION_ITEMS}) at line {}",
                line.number
            )));
        }
    }

    Ok(YamlNode::Mapping(entries))
}

fn parse_sequence(
    lines: &[Line<'_>],
    idx: &mut usize,
    indent: usize,
    depth: usize,
) -> Result<YamlNode, TdlError> {
    let mut items = Vec::new();

    while *idx < lines.len() {
        if is_ignorable(lines[*idx].raw) {
            *idx += 1;
            continue;
        }

        let line = lines[*idx];
        let current_indent = leading_spaces(line.raw);
        if current_indent < indent {
            break;
        }
        if current_indent > indent {
            return Err(yaml_error(format!(
                "unexpected indentation in sequence at line {}: expected {}",
                line.number, indent
            )));
        }

        let trimmed = line.raw[indent..].trim_start();
        if !(trimmed.starts_with("- ") || trimmed == "-") {
            break;
        }

        let rest = trimmed.strip_prefix('-').unwrap_or(trimmed).trim_start();
        *idx += 1;

        let value = if rest.is_empty() {
            let mut lookahead = *idx;
            while lookahead < lines.len() && is_ignorable(lines[lookahead].raw) {
                lookahead += 1;
            }
            if lookahead >= lines.len() {
                YamlNode::Null
            } else {
                let next_indent = leading_spaces(lines[lookahead].raw);
                if next_indent <= indent {
                    YamlNode::Null
                } else {
                    parse_block(lines, idx, next_indent, depth + 1)?
                }
            }
        } else {
            parse_inline_value(rest, depth + 1)?
        };

        items.push(value);
        if items.len() > MAX_COLLECTION_ITEMS {
            return Err(yaml_error(format!(
                "sequence exceeds max item count ({MAX_COLLECTION_ITEMS}) at line {}",
                line.number
            )));
        }
    }

    Ok(YamlNode::Sequence(items))
}

fn parse_inline_value(raw: &str, depth: usize) -> Result<YamlNode, TdlError> {
    if depth > MAX_CONTAINER_DEPTH {
        return Err(yaml_error(format!(
            "maximum nesting depth exceeded ({MAX_CONTAINER_DEPTH})"
        )));
    }

    let s = strip_inline_comment(raw.trim()).trim();
    if s.is_empty() {
        return Ok(YamlNode::Null);
    }

    if s.starts_with('"') || s.starts_with('\'') {
        // A TDL scalar type expression such as `'a' | 'b' | 'c'` also starts
        // with a quote character without being a YAML-quoted scalar as a
        // whole. Only treat the value as quoted when the quote spans the
        // entire trimmed text; otherwise fall through and keep it bare.
        if let Some((content, consumed)) = scan_quoted(s)? {
            if consumed == s.len() {
                return Ok(YamlNode::String(content));
            }
        }
        return Ok(YamlNode::String(s.to_string()));
    }

    if s.starts_with('{') {
        return parse_inline_mapping(s, depth + 1);
    }

    if s.starts_with('[') {
        return parse_inline_sequence(s, depth + 1);
    }

    if s == "true" {
        return Ok(YamlNode::Bool(true));
    }
    if s == "false" {
        return Ok(YamlNode::Bool(false));
    }
    if s == "null" || s == "~" {
        return Ok(YamlNode::Null);
    }

    if let Ok(v) = s.parse::<f64>() {
        return Ok(YamlNode::Number(v));
    }

    Ok(YamlNode::String(s.to_string()))
}

fn parse_inline_mapping(raw: &str, depth: usize) -> Result<YamlNode, TdlError> {
    let inner = raw
        .strip_prefix('{')
        .and_then(|v| v.strip_suffix('}'))
        .ok_or_else(|| yaml_error(format!("invalid inline mapping '{}': missing braces", raw)))?;

    let mut entries = Vec::new();
    for part in split_top_level(inner, ',') {
        let p = part.trim();
        if p.is_empty() {
            continue;
        }
        let (key_raw, value_raw) = split_key_value(p)
            .ok_or_else(|| yaml_error(format!("invalid inline entry '{}': expected ':'", p)))?;
        let key = parse_key(key_raw)?;
        if entries.iter().any(|(k, _): &(String, YamlNode)| k == &key) {
            return Err(yaml_error(format!(
                "duplicate key '{}' in inline mapping",
                key
            )));
        }
        let value = parse_inline_value(value_raw.trim(), depth + 1)?;
        entries.push((key, value));
        if entries.len() > MAX_COLLECTION_ITEMS {
            return Err(yaml_error(format!(
                "inline mapping exceeds max item count ({MAX_COLLECTION_ITEMS})"
            )));
        }
    }

    Ok(YamlNode::Mapping(entries))
}

fn parse_inline_sequence(raw: &str, depth: usize) -> Result<YamlNode, TdlError> {
    let inner = raw
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .ok_or_else(|| {
            yaml_error(format!("invalid inline sequence '{}': missing brackets", raw))
        })?;

    let mut items = Vec::new();
    for part in split_top_level(inner, ',') {
        let p = part.trim();
        if p.is_empty() {
            continue;
        }
        items.push(parse_inline_value(p, depth + 1)?);
        if items.len() > MAX_COLLECTION_ITEMS {
            return Err(yaml_error(format!(
                "inline sequence exceeds max item count ({MAX_COLLECTION_ITEMS})"
            )));
        }
    }

    Ok(YamlNode::Sequence(items))
}

/// Splits `input` at top-level occurrences of `delimiter`, skipping
/// separators nested inside `{...}`, `[...]`, or quoted strings.
fn split_top_level(input: &str, delimiter: char) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut depth_brace = 0i32;
    let mut depth_bracket = 0i32;
    let mut in_single = false;
    let mut in_double = false;
    let mut escape = false;

    for ch in input.chars() {
        if in_double && escape {
            current.push(ch);
            escape = false;
            continue;
        }
        if in_double && ch == '\\' {
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
            '{' if !in_single && !in_double => {
                depth_brace += 1;
                current.push(ch);
            }
            '}' if !in_single && !in_double => {
                depth_brace -= 1;
                current.push(ch);
            }
            '[' if !in_single && !in_double => {
                depth_bracket += 1;
                current.push(ch);
            }
            ']' if !in_single && !in_double => {
                depth_bracket -= 1;
                current.push(ch);
            }
            c if c == delimiter
                && !in_single
                && !in_double
                && depth_brace == 0
                && depth_bracket == 0 =>
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

fn parse_key(raw: &str) -> Result<String, TdlError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(yaml_error("empty mapping key"));
    }
    if trimmed.starts_with('"') || trimmed.starts_with('\'') {
        return parse_quoted_string(trimmed);
    }
    Ok(trimmed.to_string())
}

fn parse_quoted_string(raw: &str) -> Result<String, TdlError> {
    match scan_quoted(raw)? {
        Some((content, consumed)) if consumed == raw.len() => Ok(content),
        Some(_) => Err(yaml_error(format!(
            "unexpected trailing content after quoted string '{}'",
            raw
        ))),
        None => Err(yaml_error(format!(
            "invalid quoted string '{}': missing quote",
            raw
        ))),
    }
}

/// Scans a leading quoted string in `raw`, returning its decoded content and
/// the byte length consumed (including both quote characters), or `None` if
/// `raw` does not start with a quote character. An unterminated quote is an
/// error; trailing content after the closing quote is left for the caller.
fn scan_quoted(raw: &str) -> Result<Option<(String, usize)>, TdlError> {
    let mut chars = raw.char_indices();
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

        if quote == '"' && ch == '\\' {
            escaped = true;
            continue;
        }

        if ch == quote {
            return Ok(Some((out, i + ch.len_utf8())));
        }

        out.push(ch);
    }

    Err(yaml_error(format!(
        "unterminated quoted string '{}': missing closing quote",
        raw
    )))
}

/// Splits a trimmed mapping-entry line into its key and value parts.
///
/// Ordinarily this is just a split on the first unquoted top-level colon.
/// Index-signature labels (`[k: DOMAIN]TAIL`) are a special case: TDL's
/// closure sugar writes the value directly after the label with a space
/// instead of a colon (`[k: string]? never`), so when the entry starts with
/// `[`, the bracketed label and its tail are located structurally first and
/// an immediately-following colon is treated as optional.
fn split_key_value(input: &str) -> Option<(&str, &str)> {
    if input.starts_with('[') {
        if let Some(label_end) = scan_bracket_label(input) {
            let key_raw = input[..label_end].trim();
            let mut rest = input[label_end..].trim_start();
            if let Some(stripped) = rest.strip_prefix(':') {
                rest = stripped.trim_start();
            }
            return Some((key_raw, rest));
        }
    }

    let colon = find_unquoted_colon(input)?;
    Some((input[..colon].trim(), input[colon + 1..].trim_start()))
}

/// Given `s` starting with `[`, returns the byte offset just past the
/// matching `]` and any immediately-following run of `?`/`[`/`]` tail
/// characters (e.g. the index past `[k: string]?[]`).
fn scan_bracket_label(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut depth = 0i32;
    let mut close_idx = None;
    for (i, ch) in s.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    close_idx = Some(i);
                    break;
                }
            }
            _ => {}
        }
    }

    let close_idx = close_idx?;
    let mut end = close_idx + 1;
    while end < bytes.len() && matches!(bytes[end], b'?' | b'[' | b']') {
        end += 1;
    }
    Some(end)
}

fn find_unquoted_colon(input: &str) -> Option<usize> {
    let mut in_single = false;
    let mut in_double = false;
    let mut depth_brace = 0i32;
    let mut depth_bracket = 0i32;
    let mut escape = false;

    for (i, ch) in input.char_indices() {
        if in_double && escape {
            escape = false;
            continue;
        }
        if in_double && ch == '\\' {
            escape = true;
            continue;
        }

        match ch {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '{' if !in_single && !in_double => depth_brace += 1,
            '}' if !in_single && !in_double => depth_brace -= 1,
            '[' if !in_single && !in_double => depth_bracket += 1,
            ']' if !in_single && !in_double => depth_bracket -= 1,
            ':' if !in_single && !in_double && depth_brace == 0 && depth_bracket == 0 => {
                return Some(i)
            }
            _ => {}
        }
    }

    None
}

fn strip_inline_comment(input: &str) -> &str {
    let mut in_single = false;
    let mut in_double = false;
    let mut escape = false;

    for (i, ch) in input.char_indices() {
        if in_double && escape {
            escape = false;
            continue;
        }
        if in_double && ch == '\\' {
            escape = true;
            continue;
        }

        match ch {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '#' if !in_single && !in_double => {
                if i == 0 {
                    return "";
                }
                let prev = input[..i].chars().last().unwrap_or(' ');
                if prev.is_whitespace() {
                    return input[..i].trim_end();
                }
            }
            _ => {}
        }
    }

    input
}

fn leading_spaces(line: &str) -> usize {
    line.chars().take_while(|c| *c == ' ').count()
}

fn is_ignorable(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}
