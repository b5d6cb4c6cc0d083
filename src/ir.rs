//! The typed intermediate representation produced by the parser and walked
//! by both emitters.
//!
//! A [`TDLDoc`] is built once and is read-only afterward; emitters allocate
//! their own per-run state (see [`crate::emit_support`]) but never mutate
//! the tree. Cycles in the semantic graph — a named type referring to
//! itself, directly or transitively — are represented by [`TypeNode::TypeRef`]
//! rather than by literal pointer cycles, so the tree itself stays acyclic.

use crate::yaml_reader::YamlNode;
use std::collections::HashMap;

/// A TDL primitive keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    String,
    Number,
    Boolean,
    Typedoc,
    Image,
    Audio,
    Video,
    Never,
}

/// A literal scalar used in enum compression and enum-like index domains.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Number(f64),
    Boolean(bool),
}

/// One node of a parsed type expression.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeNode {
    Primitive(Primitive),
    StringLiteral(String),
    NumberLiteral(f64),
    BooleanLiteral(bool),
    /// A reference to a named type; may be forward- or self-referential.
    TypeRef(String),
    /// At least two members.
    Union(Vec<TypeNode>),
    /// At least two members.
    Intersection(Vec<TypeNode>),
    Object(ObjectNode),
}

/// An object type: properties, index signatures, and closure.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectNode {
    pub props: Vec<PropNode>,
    pub index_sigs: Vec<IndexSigNode>,
    /// Set when the closure sugar `[k: string]? never` was observed.
    pub closed: bool,
}

/// A single declared property of an object.
#[derive(Debug, Clone, PartialEq)]
pub struct PropNode {
    pub name: String,
    pub type_node: TypeNode,
    pub optional: bool,
    /// `true` means "array of `type_node`"; the node itself is not wrapped.
    pub is_array: bool,
}

/// The domain of an index signature.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexDomain {
    String,
    /// Non-empty; members are literals of a single homogeneous kind.
    Enum(Vec<Literal>),
}

/// An object member whose key shape is `[k: DOMAIN]`.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSigNode {
    pub domain: IndexDomain,
    pub value_type: TypeNode,
    pub optional: bool,
    pub is_array: bool,
}

/// A capitalized-labeled top-level entry producing a `$defs` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    pub name: String,
    pub node: TypeNode,
}

/// A lowercase-labeled top-level entry representing a field of the emitted
/// root object.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolDef {
    pub name: String,
    pub type_node: TypeNode,
    pub optional: bool,
    pub is_array: bool,
}

/// An ordered `TypeName -> TypeDef` table. Backed by a `Vec` so iteration
/// order matches declaration order, with a side index for `O(1)` lookup —
/// the same tradeoff the teacher makes rather than reaching for an external
/// ordered-map crate.
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    entries: Vec<TypeDef>,
    index: HashMap<String, usize>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Inserts a new definition. Returns `false` without modifying the
    /// table if `name` is already present.
    pub fn insert(&mut self, def: TypeDef) -> bool {
        if self.index.contains_key(&def.name) {
            return false;
        }
        self.index.insert(def.name.clone(), self.entries.len());
        self.entries.push(def);
        true
    }

    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Iterates definitions in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeDef> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The whole parsed document.
#[derive(Debug, Clone)]
pub struct TDLDoc {
    pub types: TypeTable,
    /// In source order.
    pub symbols: Vec<SymbolDef>,
    /// Underscore-prefixed top-level sections (`_primitives`, `_externals`,
    /// `_imports`, `_comments`), kept opaque and unordered-by-name since the
    /// core never interprets them.
    pub meta: HashMap<String, YamlNode>,
}

impl TDLDoc {
    pub fn new() -> Self {
        Self {
            types: TypeTable::new(),
            symbols: Vec::new(),
            meta: HashMap::new(),
        }
    }
}

impl Default for TDLDoc {
    fn default() -> Self {
        Self::new()
    }
}
