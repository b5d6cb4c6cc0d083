//! Compiles a *Typedoc Definition Language* (TDL) document into two JSON
//! Schema dialects: the OpenAI Structured Outputs subset and the Gemini
//! `jsonschema_gemini` subset.
//!
//! A document goes through these stages:
//! 1. YAML-subset reading into an order-preserving [`yaml_reader::YamlNode`] tree.
//! 2. Top-level parsing into the [`ir::TDLDoc`] intermediate representation,
//!    recognizing type definitions and symbols and routing scalar values
//!    through the [`type_expr`] sub-parser.
//! 3. Two independent emitter passes over the same IR ([`openai_emitter`],
//!    [`gemini_emitter`]), sharing named-type resolution and cycle breaking
//!    via [`emit_support`] and intersection merging via [`merge`].
//!
//! Use [`convert`] for the whole pipeline.

/// Shared named-type resolution, cycle breaking, and node-lowering helpers
/// used by both emitters.
pub mod emit_support;
/// The single structured error type returned by every public API.
pub mod error;
/// IR to Gemini `jsonschema_gemini` JSON Schema.
pub mod gemini_emitter;
/// The typed intermediate representation (§3): `TDLDoc`, `TypeNode`, and friends.
pub mod ir;
/// Intersection merging of object-like operands (§4.7).
pub mod merge;
/// IR to OpenAI Structured Outputs JSON Schema.
pub mod openai_emitter;
/// Top-level TDL parser and inline-object body parser (§4.1, §4.2).
pub mod parser;
/// Scalar type-expression recursive-descent sub-parser (§4.3).
pub mod type_expr;
/// Order-preserving YAML-subset reader.
pub mod yaml_reader;

pub use error::TdlError;

use serde_json::Value as JsonValue;

/// Both emitted schemas produced by [`convert`].
#[derive(Debug, Clone)]
pub struct ConvertedSchemas {
    pub openai: JsonValue,
    pub gemini: JsonValue,
}

/// Converts a TDL document's source text into both JSON Schema dialects.
///
/// Data flow is strictly one-way: YAML text → IR → (OpenAI schema, Gemini
/// schema). The two emitter passes are independent; neither observes the
/// other's output.
pub fn convert(typedoc_yaml: &str) -> Result<ConvertedSchemas, TdlError> {
    let root = yaml_reader::parse_document(typedoc_yaml)?;
    let doc = parser::parse_document(&root)?;
    let openai = openai_emitter::emit(&doc)?;
    let gemini = gemini_emitter::emit(&doc)?;
    Ok(ConvertedSchemas { openai, gemini })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_trivial_document_to_both_dialects() {
        let result = convert("foo: string\n").unwrap();
        assert_eq!(result.openai["type"], "object");
        assert_eq!(result.gemini["type"], "object");
    }

    #[test]
    fn reports_shape_errors_from_the_parser() {
        let err = convert("- not\n- a\n- mapping\n").unwrap_err();
        assert!(matches!(err, TdlError::Shape(_)));
    }

    #[test]
    fn reports_yaml_errors_from_the_reader() {
        let err = convert("foo: string\nfoo: number\n").unwrap_err();
        assert!(matches!(err, TdlError::Yaml(_)));
    }

    #[test]
    fn determinism_across_repeated_conversions() {
        let input = "Tree:\n  value: number\n  children[]: Tree\nroot: Tree\n";
        let first = convert(input).unwrap();
        let second = convert(input).unwrap();
        assert_eq!(first.openai, second.openai);
        assert_eq!(first.gemini, second.gemini);
    }
}
