//! Named-type resolution and cycle breaking shared by both emitters (§4.4).
//!
//! Each emitter owns one [`DefTable`] per invocation: a `$defs` accumulator
//! plus a visitation stack. Two concurrent conversions never interfere
//! because neither lives anywhere but the call frame — the same discipline
//! the teacher applies to `import_stack: Vec<PathBuf>` during cyclic-import
//! detection, generalized here from file paths to type names.

use crate::error::TdlError;
use crate::ir::{Literal, Primitive, TypeNode};
use serde_json::{json, Value};

/// Per-invocation `$defs` table and recursion guard.
pub struct DefTable {
    order: Vec<String>,
    schemas: std::collections::HashMap<String, Value>,
    stack: Vec<String>,
}

impl DefTable {
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            schemas: std::collections::HashMap::new(),
            stack: Vec::new(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    fn is_visiting(&self, name: &str) -> bool {
        self.stack.iter().any(|n| n == name)
    }

    fn store(&mut self, name: &str, schema: Value) {
        if !self.schemas.contains_key(name) {
            self.order.push(name.to_string());
        }
        self.schemas.insert(name.to_string(), schema);
    }

    /// Builds the `$defs` object in declaration order.
    pub fn into_defs(self) -> serde_json::Map<String, Value> {
        let mut map = serde_json::Map::new();
        for name in self.order {
            if let Some(schema) = self.schemas.get(&name) {
                map.insert(name, schema.clone());
            }
        }
        map
    }
}

impl Default for DefTable {
    fn default() -> Self {
        Self::new()
    }
}

/// A `{"$ref": "#/$defs/<name>"}` schema.
pub fn ref_to(name: &str) -> Value {
    serde_json::json!({ "$ref": format!("#/$defs/{name}") })
}

/// Resolves `name`'s schema in `table`, emitting its body via `emit_body` if
/// it hasn't been visited yet. Returns a `$ref` pointing at the entry. If
/// `name` is already on the visitation stack (a recursive reference),
/// installs `placeholder` instead of recursing further.
pub fn resolve_named<F>(
    table: &mut DefTable,
    name: &str,
    placeholder: Value,
    emit_body: F,
) -> Result<Value, TdlError>
where
    F: FnOnce(&mut DefTable) -> Result<Value, TdlError>,
{
    if table.contains(name) {
        return Ok(ref_to(name));
    }
    if table.is_visiting(name) {
        table.store(name, placeholder);
        return Ok(ref_to(name));
    }

    table.stack.push(name.to_string());
    let schema = emit_body(table)?;
    table.stack.pop();
    table.store(name, schema);
    Ok(ref_to(name))
}

/// Lowers a primitive to its JSON Schema form. `never` has no bottom type in
/// these dialects, so it is approximated as a contradictory numeric range.
pub fn primitive_schema(primitive: Primitive) -> Value {
    match primitive {
        Primitive::String | Primitive::Typedoc | Primitive::Image | Primitive::Audio | Primitive::Video => {
            json!({"type": "string"})
        }
        Primitive::Number => json!({"type": "number"}),
        Primitive::Boolean => json!({"type": "boolean"}),
        Primitive::Never => json!({"type": "number", "minimum": 1, "maximum": 0}),
    }
}

/// If every member of `members` is a literal of a single JSON type, returns
/// the compressed `{type, enum}` form in declaration order. Otherwise
/// returns `None` so the caller falls back to `anyOf`.
pub fn try_compress_literal_union(members: &[TypeNode]) -> Option<Value> {
    let json_type = |node: &TypeNode| match node {
        TypeNode::StringLiteral(_) => Some("string"),
        TypeNode::NumberLiteral(_) => Some("number"),
        TypeNode::BooleanLiteral(_) => Some("boolean"),
        _ => None,
    };

    let first_type = json_type(members.first()?)?;
    if !members.iter().all(|m| json_type(m) == Some(first_type)) {
        return None;
    }

    let values: Vec<Value> = members
        .iter()
        .map(|m| match m {
            TypeNode::StringLiteral(v) => json!(v),
            TypeNode::NumberLiteral(v) => json!(v),
            TypeNode::BooleanLiteral(v) => json!(v),
            _ => unreachable!("filtered to literals above"),
        })
        .collect();

    Some(json!({"type": first_type, "enum": values}))
}

/// Turns an enum-like index-signature key literal into the concrete
/// property name it materializes as.
pub fn literal_key(literal: &Literal) -> String {
    match literal {
        Literal::String(s) => s.clone(),
        Literal::Boolean(b) => b.to_string(),
        Literal::Number(n) => {
            if n.fract() == 0.0 && n.is_finite() {
                format!("{}", *n as i64)
            } else {
                n.to_string()
            }
        }
    }
}

/// Wraps `schema` to also accept `null`, per the OpenAI nullability encoding.
pub fn make_nullable(schema: Value) -> Value {
    match schema.get("type").cloned() {
        Some(Value::String(t)) => {
            let mut s = schema;
            s["type"] = json!([t, "null"]);
            s
        }
        Some(Value::Array(types)) => {
            let mut s = schema;
            let mut types = types;
            if !types.iter().any(|v| v == "null") {
                types.push(json!("null"));
            }
            s["type"] = json!(types);
            s
        }
        _ => json!({"anyOf": [schema, {"type": "null"}]}),
    }
}
