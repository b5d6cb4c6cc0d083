//! Error definitions for TDL parsing and schema emission.

use thiserror::Error;

#[derive(Debug, Error)]
/// Single authoring-error type returned by every public API in this crate.
///
/// Each variant corresponds to one error category from the converter's error
/// handling design; the violation, the involved identifier (where
/// applicable), and the rule broken are folded into the formatted message.
pub enum TdlError {
    /// Root is not a mapping; unrecognized top-level key class; extends-sugar
    /// body is not a mapping.
    #[error("shape error: {0}")]
    Shape(String),
    /// Malformed property, symbol, or index-signature label; enum-like
    /// domain containing non-literal, non-ALL_CAPS tokens.
    #[error("label error: {0}")]
    Label(String),
    /// Function type, conditional, `::` import, unsupported generic, empty
    /// or unrecognized type expression.
    #[error("type expression error: {0}")]
    TypeExpression(String),
    /// `TypeRef` or intersection operand referencing an undeclared type.
    #[error("reference error: {0}")]
    Reference(String),
    /// Dialect-specific rejection (OpenAI string-domain maps, intersection
    /// with a non-object-like operand).
    #[error("dialect error: {0}")]
    Dialect(String),
    /// YAML-subset reader failure: indentation, duplicate keys, unterminated
    /// quotes, or nesting/size limits.
    #[error("yaml parse error: {0}")]
    Yaml(String),
    /// CLI-only: failure reading stdin or the given file path.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
