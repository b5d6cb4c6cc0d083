//! Top-level TDL parser (§4.1) and inline-object body parser (§4.2).
//!
//! The top-level parser classifies each key of the YAML root mapping into
//! one of four buckets (metadata, extends-sugar, type definition, symbol)
//! and builds a [`TDLDoc`]. The inline-object parser turns a nested YAML
//! mapping into an [`ObjectNode`], splitting property labels from
//! index-signature labels and applying closure-sugar collapsing.

use crate::error::TdlError;
use crate::ir::{IndexDomain, IndexSigNode, ObjectNode, Primitive, PropNode, TDLDoc, TypeDef, TypeNode};
use crate::type_expr;
use crate::yaml_reader::YamlNode;
use regex::Regex;

fn shape_error(message: impl Into<String>) -> TdlError {
    TdlError::Shape(message.into())
}

fn label_error(message: impl Into<String>) -> TdlError {
    TdlError::Label(message.into())
}

/// Parses a full TDL document from its YAML root.
pub fn parse_document(root: &YamlNode) -> Result<TDLDoc, TdlError> {
    let entries = root
        .as_mapping()
        .ok_or_else(|| shape_error("TDL document must be a YAML mapping at the top level"))?;

    let extends_sugar = Regex::new(r"^([A-Z][A-Za-z0-9]*)\((.*)\)$").expect("valid regex");
    let type_name = Regex::new(r"^[A-Z][A-Za-z0-9]*$").expect("valid regex");
    let symbol_label = Regex::new(r"^[a-z][A-Za-z0-9_]*[?\[\]]*$").expect("valid regex");

    let mut doc = TDLDoc::new();

    for (key, value) in entries {
        if let Some(name) = key.strip_prefix('_') {
            doc.meta.insert(format!("_{name}"), value.clone());
            continue;
        }

        if let Some(caps) = extends_sugar.captures(key) {
            let name = caps[1].to_string();
            let base_expr = caps[2].trim();
            let body_mapping = value.as_mapping().ok_or_else(|| {
                shape_error(format!("extends-sugar body for '{key}' must be a YAML mapping"))
            })?;

            let base = type_expr::parse(base_expr)?;
            let body = parse_inline_object(body_mapping)?;
            let node = TypeNode::Intersection(vec![base, TypeNode::Object(body)]);

            if !doc.types.insert(TypeDef { name: name.clone(), node }) {
                return Err(shape_error(format!("duplicate type definition '{name}'")));
            }
            continue;
        }

        if type_name.is_match(key) {
            let node = parse_definition_value(value, key)?;
            if !doc.types.insert(TypeDef {
                name: key.clone(),
                node,
            }) {
                return Err(shape_error(format!("duplicate type definition '{key}'")));
            }
            continue;
        }

        if symbol_label.is_match(key) {
            let (name, tail) = split_label(key);
            let (is_array, optional) = parse_tail(tail)?;
            let node = parse_definition_value(value, key)?;
            doc.symbols.push(crate::ir::SymbolDef {
                name: name.to_string(),
                type_node: node,
                optional,
                is_array,
            });
            continue;
        }

        return Err(shape_error(format!("unrecognized top-level entry: {key}")));
    }

    Ok(doc)
}

fn parse_definition_value(value: &YamlNode, key: &str) -> Result<TypeNode, TdlError> {
    match value {
        YamlNode::Mapping(entries) => Ok(TypeNode::Object(parse_inline_object(entries)?)),
        YamlNode::String(s) => type_expr::parse(s),
        // The YAML reader already tokenizes bare `true`/`false`/numeric
        // scalars (§4.3's boolean- and number-literal atoms), so these
        // lower directly instead of round-tripping through `type_expr::parse`.
        YamlNode::Bool(b) => Ok(TypeNode::BooleanLiteral(*b)),
        YamlNode::Number(n) => Ok(TypeNode::NumberLiteral(*n)),
        _ => Err(shape_error(format!(
            "value for '{key}' must be a YAML mapping or a scalar type expression"
        ))),
    }
}

/// Parses a YAML mapping representing an inline object body (§4.2).
pub fn parse_inline_object(entries: &[(String, YamlNode)]) -> Result<ObjectNode, TdlError> {
    let index_sig_label =
        Regex::new(r"^\[(?P<body>[^\]]+)\](?P<tail>\?\[\]|\[\]\?|\?|\[\]|)$").expect("valid regex");
    let property_label = Regex::new(r"^[a-z][A-Za-z0-9_]*").expect("valid regex");

    let mut props: Vec<PropNode> = Vec::new();
    let mut index_sigs: Vec<IndexSigNode> = Vec::new();
    let mut closed = false;

    for (key, value) in entries {
        if key.starts_with('[') {
            let caps = index_sig_label
                .captures(key)
                .ok_or_else(|| label_error(format!("malformed index-signature label '{key}'")))?;
            let body = &caps["body"];
            let tail = &caps["tail"];
            let (is_array, optional) = parse_tail(tail)?;

            let colon = body
                .find(':')
                .ok_or_else(|| label_error(format!("index-signature label '{key}' is missing ':'")))?;
            let ident = body[..colon].trim();
            if !Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$")
                .expect("valid regex")
                .is_match(ident)
            {
                return Err(label_error(format!(
                    "index-signature identifier '{ident}' in '{key}' is invalid"
                )));
            }
            let domain_str = body[colon + 1..].trim();

            let domain = if domain_str == "string" {
                IndexDomain::String
            } else {
                let literals = split_enum_domain(domain_str)
                    .iter()
                    .map(|part| type_expr::parse_literal(part))
                    .collect::<Result<Vec<_>, _>>()?;
                if literals.is_empty() {
                    return Err(label_error(format!(
                        "enum-like domain in '{key}' must not be empty"
                    )));
                }
                IndexDomain::Enum(literals)
            };

            let value_type = parse_definition_value(value, key)?;

            let is_closure_sugar = matches!(domain, IndexDomain::String)
                && optional
                && matches!(value_type, TypeNode::Primitive(Primitive::Never));

            if is_closure_sugar {
                closed = true;
            } else {
                index_sigs.push(IndexSigNode {
                    domain,
                    value_type,
                    optional,
                    is_array,
                });
            }
            continue;
        }

        if !property_label.is_match(key) {
            return Err(label_error(format!("malformed property label '{key}'")));
        }
        let name_end = key
            .find(|c: char| c == '?' || c == '[' || c == ']')
            .unwrap_or(key.len());
        let name = &key[..name_end];
        let tail = &key[name_end..];
        let (is_array, optional) = parse_tail(tail)?;

        if props.iter().any(|p| p.name == name) {
            return Err(label_error(format!("duplicate property '{name}'")));
        }

        let type_node = parse_definition_value(value, key)?;
        props.push(PropNode {
            name: name.to_string(),
            type_node,
            optional,
            is_array,
        });
    }

    Ok(ObjectNode {
        props,
        index_sigs,
        closed,
    })
}

/// Splits a symbol/type label into its base name and suffix tail (the first
/// run of `?`/`[`/`]` characters).
fn split_label(label: &str) -> (&str, &str) {
    let idx = label
        .find(|c: char| c == '?' || c == '[' || c == ']')
        .unwrap_or(label.len());
    (&label[..idx], &label[idx..])
}

/// Validates a label tail and returns `(is_array, optional)`.
fn parse_tail(tail: &str) -> Result<(bool, bool), TdlError> {
    match tail {
        "" => Ok((false, false)),
        "?" => Ok((false, true)),
        "[]" => Ok((true, false)),
        "?[]" | "[]?" => Ok((true, true)),
        other => Err(label_error(format!("invalid label suffix '{other}'"))),
    }
}

/// Splits an enum-like index-signature domain on top-level `|`, respecting
/// quoted literals.
fn split_enum_domain(input: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_single = false;
    let mut in_double = false;

    for ch in input.chars() {
        match ch {
            '\'' if !in_double => {
                in_single = !in_single;
                current.push(ch);
            }
            '"' if !in_single => {
                in_double = !in_double;
                current.push(ch);
            }
            '|' if !in_single && !in_double => {
                out.push(current.trim().to_string());
                current = String::new();
            }
            _ => current.push(ch),
        }
    }
    out.push(current.trim().to_string());
    out.retain(|s| !s.is_empty());
    out
}
