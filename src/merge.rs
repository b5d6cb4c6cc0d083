//! Intersection merging (§4.7): collapses intersections of object-like
//! operands into a single synthetic [`ObjectNode`].

use crate::error::TdlError;
use crate::ir::{ObjectNode, TDLDoc, TypeNode};

fn dialect_error(message: impl Into<String>) -> TdlError {
    TdlError::Dialect(message.into())
}

fn reference_error(message: impl Into<String>) -> TdlError {
    TdlError::Reference(message.into())
}

/// Resolves `node` to an [`ObjectNode`], recursing through type references
/// and nested intersections.
pub fn resolve_to_object(node: &TypeNode, doc: &TDLDoc) -> Result<ObjectNode, TdlError> {
    let mut stack = Vec::new();
    resolve_to_object_guarded(node, doc, &mut stack)
}

/// Same as [`resolve_to_object`], but threading a visitation stack of type
/// names so a self-referential chain of `TypeRef`s (e.g. `Derived(Derived)`)
/// errors instead of recursing unboundedly — the same push/check/pop
/// discipline `DefTable` applies during emission.
fn resolve_to_object_guarded(
    node: &TypeNode,
    doc: &TDLDoc,
    stack: &mut Vec<String>,
) -> Result<ObjectNode, TdlError> {
    match node {
        TypeNode::Object(obj) => Ok(obj.clone()),
        TypeNode::TypeRef(name) => {
            if stack.iter().any(|n| n == name) {
                return Err(reference_error(format!(
                    "type '{name}' cannot be resolved: it refers back to itself through an intersection"
                )));
            }
            let def = doc
                .types
                .get(name)
                .ok_or_else(|| reference_error(format!("reference to undeclared type '{name}'")))?;
            stack.push(name.clone());
            let result = resolve_to_object_guarded(&def.node, doc, stack);
            stack.pop();
            result
        }
        TypeNode::Intersection(members) => merge_members_guarded(members, doc, stack),
        _ => Err(dialect_error("intersection operands must be object-like")),
    }
}

/// Merges an intersection's members left to right: later operands overwrite
/// earlier ones property-for-property, index signatures accumulate in
/// order, and `closed` becomes true if any operand is closed.
pub fn merge_members(members: &[TypeNode], doc: &TDLDoc) -> Result<ObjectNode, TdlError> {
    let mut stack = Vec::new();
    merge_members_guarded(members, doc, &mut stack)
}

fn merge_members_guarded(
    members: &[TypeNode],
    doc: &TDLDoc,
    stack: &mut Vec<String>,
) -> Result<ObjectNode, TdlError> {
    let mut merged = ObjectNode {
        props: Vec::new(),
        index_sigs: Vec::new(),
        closed: false,
    };

    for member in members {
        let operand = resolve_to_object_guarded(member, doc, stack)?;

        for prop in operand.props {
            if let Some(existing) = merged.props.iter_mut().find(|p| p.name == prop.name) {
                *existing = prop;
            } else {
                merged.props.push(prop);
            }
        }

        merged.index_sigs.extend(operand.index_sigs);
        merged.closed = merged.closed || operand.closed;
    }

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Primitive, PropNode, TypeDef, TypeTable};

    fn object(props: Vec<(&str, TypeNode)>) -> TypeNode {
        TypeNode::Object(ObjectNode {
            props: props
                .into_iter()
                .map(|(name, type_node)| PropNode {
                    name: name.to_string(),
                    type_node,
                    optional: false,
                    is_array: false,
                })
                .collect(),
            index_sigs: Vec::new(),
            closed: false,
        })
    }

    #[test]
    fn rightmost_property_wins() {
        let mut types = TypeTable::new();
        types.insert(TypeDef {
            name: "A".to_string(),
            node: object(vec![
                ("x", TypeNode::Primitive(Primitive::String)),
                ("y", TypeNode::Primitive(Primitive::String)),
            ]),
        });
        types.insert(TypeDef {
            name: "B".to_string(),
            node: object(vec![("x", TypeNode::Primitive(Primitive::Number))]),
        });
        let doc = TDLDoc {
            types,
            symbols: Vec::new(),
            meta: Default::default(),
        };

        let merged = merge_members(
            &[TypeNode::TypeRef("A".to_string()), TypeNode::TypeRef("B".to_string())],
            &doc,
        )
        .unwrap();

        let x = merged.props.iter().find(|p| p.name == "x").unwrap();
        assert_eq!(x.type_node, TypeNode::Primitive(Primitive::Number));
        assert!(merged.props.iter().any(|p| p.name == "y"));
    }

    #[test]
    fn closed_if_any_operand_closed() {
        let doc = TDLDoc::new();
        let a = object(vec![]);
        let mut b_obj = ObjectNode {
            props: Vec::new(),
            index_sigs: Vec::new(),
            closed: true,
        };
        b_obj.props.push(PropNode {
            name: "z".to_string(),
            type_node: TypeNode::Primitive(Primitive::Boolean),
            optional: false,
            is_array: false,
        });
        let b = TypeNode::Object(b_obj);

        let merged = merge_members(&[a, b], &doc).unwrap();
        assert!(merged.closed);
    }

    #[test]
    fn rejects_non_object_operand() {
        let doc = TDLDoc::new();
        let err = merge_members(
            &[TypeNode::Primitive(Primitive::String), object(vec![])],
            &doc,
        )
        .unwrap_err();
        assert!(matches!(err, TdlError::Dialect(_)));
    }

    #[test]
    fn rejects_self_referential_extends_sugar_instead_of_recursing_forever() {
        let mut types = TypeTable::new();
        types.insert(TypeDef {
            name: "Derived".to_string(),
            node: TypeNode::Intersection(vec![
                TypeNode::TypeRef("Derived".to_string()),
                object(vec![("y", TypeNode::Primitive(Primitive::Number))]),
            ]),
        });
        let doc = TDLDoc {
            types,
            symbols: Vec::new(),
            meta: Default::default(),
        };

        let err = resolve_to_object(&TypeNode::TypeRef("Derived".to_string()), &doc).unwrap_err();
        assert!(matches!(err, TdlError::Reference(_)));
    }
}
