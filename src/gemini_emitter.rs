//! IR to Gemini `jsonschema_gemini` JSON Schema (§4.6).
//!
//! Primitive, literal, union, and reference lowerings are identical to the
//! OpenAI emitter. Optional properties are represented by omission from
//! `required` instead of nullability, and object openness follows the IR's
//! `closed` flag instead of being unconditionally `false`.

use crate::emit_support::{literal_key, primitive_schema, resolve_named, try_compress_literal_union, DefTable};
use crate::error::TdlError;
use crate::ir::{IndexDomain, ObjectNode, Primitive, TDLDoc, TypeNode};
use crate::merge;
use serde_json::{json, Map, Value};

fn reference_error(message: impl Into<String>) -> TdlError {
    TdlError::Reference(message.into())
}

/// Converts a parsed document into the Gemini `jsonschema_gemini` schema.
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
        properties.insert(symbol.name.clone(), schema);
        if !symbol.optional {
            required.push(Value::String(symbol.name.clone()));
        }
    }

    // The root is deliberately closed even though nested objects may be open.
    Ok(json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
        "$defs": table.into_defs(),
    }))
}

fn emit_type_ref(doc: &TDLDoc, table: &mut DefTable, name: &str) -> Result<Value, TdlError> {
    let placeholder = json!({"type": "object", "additionalProperties": true});
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
    let mut additional_properties = Value::Bool(!obj.closed);

    for prop in &obj.props {
        let mut schema = emit_node(doc, table, &prop.type_node)?;
        if prop.is_array {
            schema = json!({"type": "array", "items": schema});
        }
        properties.insert(prop.name.clone(), schema);
        if !prop.optional {
            required.push(Value::String(prop.name.clone()));
        }
    }

    for sig in &obj.index_sigs {
        match &sig.domain {
            IndexDomain::String => {
                if !matches!(sig.value_type, TypeNode::Primitive(Primitive::Never)) {
                    let mut value_schema = emit_node(doc, table, &sig.value_type)?;
                    if sig.is_array {
                        value_schema = json!({"type": "array", "items": value_schema});
                    }
                    // Last string-domain signature wins.
                    additional_properties = value_schema;
                }
            }
            IndexDomain::Enum(keys) => {
                for key in keys {
                    let name = literal_key(key);
                    let mut schema = emit_node(doc, table, &sig.value_type)?;
                    if sig.is_array {
                        schema = json!({"type": "array", "items": schema});
                    }
                    properties.insert(name.clone(), schema);
                    if !sig.optional {
                        required.push(Value::String(name));
                    }
                }
            }
        }
    }

    Ok(json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": additional_properties,
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
        assert_eq!(schema["properties"]["foo"], json!({"type": "string"}));
        assert_eq!(schema["required"], json!(["foo"]));
        assert_eq!(schema["additionalProperties"], json!(false));
    }

    #[test]
    fn optional_array_excludes_from_required() {
        let schema = convert("tags?[]: 'a' | 'b' | 'c'\n");
        assert_eq!(
            schema["properties"]["tags"],
            json!({"type": "array", "items": {"type": "string", "enum": ["a", "b", "c"]}})
        );
        assert_eq!(schema["required"], json!([]));
    }

    #[test]
    fn open_map_emits_schema_valued_additional_properties() {
        let schema = convert("scores: { [k: string]: number }\n");
        let scores = &schema["properties"]["scores"];
        assert_eq!(
            scores,
            &json!({
                "type": "object",
                "properties": {},
                "required": [],
                "additionalProperties": {"type": "number"},
            })
        );
    }

    #[test]
    fn closed_object_is_closed_and_open_object_defaults_open() {
        let schema = convert("user: { name: string, [k: string]? never }\n");
        assert_eq!(schema["properties"]["user"]["additionalProperties"], json!(false));

        let schema = convert("user: { name: string }\n");
        assert_eq!(schema["properties"]["user"]["additionalProperties"], json!(true));
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
    fn enum_domain_index_signature_respects_optionality() {
        let schema = convert("user: { [k: 'a'|'b']?: number }\n");
        let user = &schema["properties"]["user"];
        assert_eq!(user["properties"]["a"], json!({"type": "number"}));
        assert_eq!(user["required"], json!([]));
    }
}
