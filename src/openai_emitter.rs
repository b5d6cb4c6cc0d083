//! IR to OpenAI Structured Outputs JSON Schema (§4.5).
//!
//! Every object is closed (`additionalProperties: false`) and every
//! property is unconditionally listed in `required`; optionality is
//! represented by making the property's schema nullable instead.

use crate::emit_support::{make_nullable, primitive_schema, resolve_named, try_compress_literal_union, DefTable};
use crate::error::TdlError;
use crate::ir::{IndexDomain, ObjectNode, TDLDoc, TypeNode};
use crate::merge;
use serde_json::{json, Map, Value};

fn reference_error(message: impl Into<String>) -> TdlError {
    TdlError::Reference(message.into())
}

fn dialect_error(message: impl Into<String>) -> TdlError {
    TdlError::Dialect(message.into())
}

/// Converts a parsed document into the OpenAI Structured Outputs schema.
pub fn emit(doc: &TDLDoc) -> Result<Value, TdlError> {
    let mut table = DefTable::new();

    for def in doc.types.iter() {
        emit_type_ref(doc, &mut table, &def.name)?;
    }

    let mut properties = Map::new();
    let mut required = Vec::new();

    for symbol in &doc.symbols {
        let mut schema = emit_node(doc, &mut table, &symbol.type_node)?;
        if symbol.is_array {
            schema = json!({"type": "array", "items": schema});
        }
        if symbol.optional {
            schema = make_nullable(schema);
        }
        properties.insert(symbol.name.clone(), schema);
        required.push(Value::String(symbol.name.clone()));
    }

    Ok(json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
        "$defs": table.into_defs(),
    }))
}

fn emit_type_ref(doc: &TDLDoc, table: &mut DefTable, name: &str) -> Result<Value, TdlError> {
    let placeholder = json!({"type": "object", "additionalProperties": false});
    resolve_named(table, name, placeholder, |table| {
        let def = doc
            .types
            .get(name)
            .ok_or_else(|| reference_error(format!("reference to undeclared type '{name}'")))?;
        emit_node(doc, table, &def.node)
    })
}

fn emit_node(doc: &TDLDoc, table: &mut DefTable, node: &TypeNode) -> Result<Value, TdlError> {
    match node {
        TypeNode::Primitive(p) => Ok(primitive_schema(*p)),
        TypeNode::StringLiteral(v) => Ok(json!({"type": "string", "enum": [v]})),
        TypeNode::NumberLiteral(v) => Ok(json!({"type": "number", "enum": [v]})),
        TypeNode::BooleanLiteral(v) => Ok(json!({"type": "boolean", "enum": [v]})),
        TypeNode::TypeRef(name) => emit_type_ref(doc, table, name),
        TypeNode::Union(members) => {
            if let Some(compressed) = try_compress_literal_union(members) {
                return Ok(compressed);
            }
            let variants = members
                .iter()
                .map(|m| emit_node(doc, table, m))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(json!({"anyOf": variants}))
        }
        TypeNode::Intersection(members) => {
            let merged = merge::merge_members(members, doc)?;
            emit_object(doc, table, &merged)
        }
        TypeNode::Object(obj) => emit_object(doc, table, obj),
    }
}

fn emit_object(doc: &TDLDoc, table: &mut DefTable, obj: &ObjectNode) -> Result<Value, TdlError> {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for prop in &obj.props {
        let mut schema = emit_node(doc, table, &prop.type_node)?;
        if prop.is_array {
            schema = json!({"type": "array", "items": schema});
        }
        if prop.optional {
            schema = make_nullable(schema);
        }
        properties.insert(prop.name.clone(), schema);
        required.push(Value::String(prop.name.clone()));
    }

    for sig in &obj.index_sigs {
        match &sig.domain {
            IndexDomain::String => {
                return Err(dialect_error(
                    "OpenAI schema: string index signatures (maps) are not supported.",
                ));
            }
            IndexDomain::Enum(keys) => {
                for key in keys {
                    let name = crate::emit_support::literal_key(key);
                    let mut schema = emit_node(doc, table, &sig.value_type)?;
                    if sig.is_array {
                        schema = json!({"type": "array", "items": schema});
                    }
                    if sig.optional {
                        schema = make_nullable(schema);
                    }
                    required.push(Value::String(name.clone()));
                    properties.insert(name, schema);
                }
            }
        }
    }

    Ok(json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(input: &str) -> Value {
        let root = crate::yaml_reader::parse_document(input).unwrap();
        let doc = crate::parser::parse_document(&root).unwrap();
        emit(&doc).unwrap()
    }

    #[test]
    fn trivial_primitive_symbol() {
        let schema = convert("foo: string\n");
        assert_eq!(
            schema,
            json!({
                "type": "object",
                "properties": {"foo": {"type": "string"}},
                "required": ["foo"],
                "additionalProperties": false,
                "$defs": {},
            })
        );
    }

    #[test]
    fn optional_array_of_literal_enum_is_nullable_and_required() {
        let schema = convert("tags?[]: 'a' | 'b' | 'c'\n");
        let tags = &schema["properties"]["tags"];
        assert_eq!(
            tags,
            &json!({"type": ["array", "null"], "items": {"type": "string", "enum": ["a", "b", "c"]}})
        );
        assert_eq!(schema["required"], json!(["tags"]));
    }

    #[test]
    fn closed_inline_object_drops_closure_sugar_signature() {
        let schema = convert("user: { name: string, [k: string]? never }\n");
        let user = &schema["properties"]["user"];
        assert_eq!(user["additionalProperties"], json!(false));
        assert_eq!(user["properties"].as_object().unwrap().len(), 1);
    }

    #[test]
    fn string_index_signature_is_rejected() {
        let root = crate::yaml_reader::parse_document("scores: { [k: string]: number }\n").unwrap();
        let doc = crate::parser::parse_document(&root).unwrap();
        let err = emit(&doc).unwrap_err();
        assert!(matches!(err, TdlError::Dialect(_)));
    }

    #[test]
    fn recursive_named_type_terminates() {
        let schema = convert("Tree:\n  value: number\n  children[]: Tree\nroot: Tree\n");
        let tree = &schema["$defs"]["Tree"];
        assert_eq!(
            tree["properties"]["children"],
            json!({"type": "array", "items": {"$ref": "#/$defs/Tree"}})
        );
    }

    #[test]
    fn intersection_rightmost_property_wins() {
        let schema = convert("A:\n  x: string\n  y: string\nB:\n  x: number\nout: A & B\n");
        let out = &schema["properties"]["out"];
        assert_eq!(out["properties"]["x"], json!({"type": "number"}));
        assert_eq!(out["properties"]["y"], json!({"type": "string"}));
    }

    #[test]
    fn enum_domain_index_signature_materializes_properties() {
        let schema = convert("user: { [k: 'a'|'b']: number }\n");
        let user = &schema["properties"]["user"];
        assert_eq!(user["properties"]["a"], json!({"type": "number"}));
        assert_eq!(user["properties"]["b"], json!({"type": "number"}));
        let required: Vec<&str> = user["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert!(required.contains(&"a") && required.contains(&"b"));
    }

    #[test]
    fn ref_generic_lowers_to_string() {
        let schema = convert("foo: Ref<Whatever>\n");
        assert_eq!(schema["properties"]["foo"], json!({"type": "string"}));
    }

    #[test]
    fn never_typed_property_is_contradictory_range() {
        let schema = convert("foo: never\n");
        assert_eq!(
            schema["properties"]["foo"],
            json!({"type": "number", "minimum": 1, "maximum": 0})
        );
    }

    #[test]
    fn defs_are_populated_regardless_of_reachability() {
        let schema = convert("Unused:\n  x: string\nfoo: string\n");
        assert!(schema["$defs"].as_object().unwrap().contains_key("Unused"));
    }
}
