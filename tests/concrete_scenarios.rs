use serde_json::json;
use tdl_schema::convert;

#[test]
fn trivial_primitive_symbol() {
    let result = convert("foo: string\n").unwrap();
    assert_eq!(
        result.openai,
        json!({
            "type": "object",
            "properties": {"foo": {"type": "string"}},
            "required": ["foo"],
            "additionalProperties": false,
            "$defs": {},
        })
    );
    assert_eq!(result.gemini["additionalProperties"], json!(false));
    assert_eq!(result.gemini["properties"], result.openai["properties"]);
}

#[test]
fn optional_array_of_literal_enum() {
    let result = convert("tags?[]: 'a' | 'b' | 'c'\n").unwrap();
    assert_eq!(
        result.openai["properties"]["tags"],
        json!({"type": ["array", "null"], "items": {"type": "string", "enum": ["a", "b", "c"]}})
    );
    assert_eq!(result.openai["required"], json!(["tags"]));

    assert_eq!(
        result.gemini["properties"]["tags"],
        json!({"type": "array", "items": {"type": "string", "enum": ["a", "b", "c"]}})
    );
    assert_eq!(result.gemini["required"], json!([]));
}

#[test]
fn closed_inline_object() {
    let result = convert("user: { name: string, [k: string]? never }\n").unwrap();
    for dialect in [&result.openai, &result.gemini] {
        let user = &dialect["properties"]["user"];
        assert_eq!(user["properties"], json!({"name": {"type": "string"}}));
        assert_eq!(user["additionalProperties"], json!(false));
    }
}

#[test]
fn open_map_gemini_only() {
    let result = convert("scores: { [k: string]: number }\n").unwrap();
    assert_eq!(
        result.gemini["properties"]["scores"],
        json!({
            "type": "object",
            "properties": {},
            "required": [],
            "additionalProperties": {"type": "number"},
        })
    );

    let err = tdl_schema::openai_emitter::emit(
        &tdl_schema::parser::parse_document(
            &tdl_schema::yaml_reader::parse_document("scores: { [k: string]: number }\n").unwrap(),
        )
        .unwrap(),
    )
    .unwrap_err();
    assert!(matches!(err, tdl_schema::TdlError::Dialect(_)));
}

#[test]
fn recursive_named_type() {
    let result = convert("Tree:\n  value: number\n  children[]: Tree\nroot: Tree\n").unwrap();
    for dialect in [&result.openai, &result.gemini] {
        let children = &dialect["$defs"]["Tree"]["properties"]["children"];
        assert_eq!(
            children,
            &json!({"type": "array", "items": {"$ref": "#/$defs/Tree"}})
        );
    }
}

#[test]
fn intersection_override() {
    let input = "A:\n  x: string\n  y: string\nB:\n  x: number\nout: A & B\n";
    let result = convert(input).unwrap();
    for dialect in [&result.openai, &result.gemini] {
        let out = &dialect["properties"]["out"];
        assert_eq!(out["properties"]["x"], json!({"type": "number"}));
        assert_eq!(out["properties"]["y"], json!({"type": "string"}));
    }
}

#[test]
fn determinism_across_runs() {
    let input = "Tree:\n  value: number\n  children[]: Tree\nroot: Tree\nfoo: string\n";
    let a = convert(input).unwrap();
    let b = convert(input).unwrap();
    assert_eq!(a.openai, b.openai);
    assert_eq!(a.gemini, b.gemini);
}

#[test]
fn never_typed_property_across_dialects() {
    let result = convert("foo: never\n").unwrap();
    let expected = json!({"type": "number", "minimum": 1, "maximum": 0});
    assert_eq!(result.openai["properties"]["foo"], expected);
    assert_eq!(result.gemini["properties"]["foo"], expected);
}

#[test]
fn ref_generic_lowers_to_string_across_dialects() {
    let result = convert("foo: Ref<Anything>\n").unwrap();
    assert_eq!(result.openai["properties"]["foo"], json!({"type": "string"}));
    assert_eq!(result.gemini["properties"]["foo"], json!({"type": "string"}));
}

#[test]
fn enum_domain_index_signature_materializes_both_dialects() {
    let result = convert("user: { [k: 'a'|'b']: number }\n").unwrap();
    for dialect in [&result.openai, &result.gemini] {
        let user = &dialect["properties"]["user"];
        assert_eq!(user["properties"]["a"], json!({"type": "number"}));
        assert_eq!(user["properties"]["b"], json!({"type": "number"}));
    }
    // OpenAI always requires materialized keys; Gemini follows optionality.
    assert!(result.openai["properties"]["user"]["required"]
        .as_array()
        .unwrap()
        .contains(&json!("a")));
    assert!(result.gemini["properties"]["user"]["required"]
        .as_array()
        .unwrap()
        .contains(&json!("a")));
}
