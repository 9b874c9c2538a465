use plaid_ir::parse::{parse_spec, parse_spec_for_test, ParseError};
use plaid_ir::Value;

const EDITING: &str = include_str!("fixtures/editing.json");

#[test]
fn test_select_block_by_test_name() {
    let spec = parse_spec_for_test(EDITING, "TextScriptEditing").unwrap();
    let dims = spec.into_dimensions().unwrap();

    let names: Vec<&str> = dims.iter().map(|d| d.name()).collect();
    assert_eq!(names, vec!["KeyboardEditing", "TextSelection", "StringData"]);
    assert_eq!(dims[2].values()[0], Value::Text(String::new()));
    assert!(dims.iter().all(|d| d.filters().iter().all(Option::is_none)));
}

#[test]
fn test_filtered_value_in_named_block() {
    let spec = parse_spec_for_test(EDITING, "TextEditorKeyboardEditing").unwrap();
    let dims = spec.into_dimensions().unwrap();

    assert_eq!(dims[1].filters()[1].as_deref(), Some("AcceptsReturn==1"));
    assert_eq!(dims[2].values(), &[Value::Int(12), Value::Float(96.5)]);
}

#[test]
fn test_missing_test_block() {
    let err = parse_spec_for_test(EDITING, "NoSuchTest").unwrap_err();
    assert!(matches!(err, ParseError::TestNotFound(ref name) if name == "NoSuchTest"));
}

#[test]
fn test_single_block_applies_to_any_test() {
    let json = r#"{ "dimensions": [ { "name": "Wrap", "values": [true, false] } ] }"#;
    let spec = parse_spec_for_test(json, "Anything").unwrap();
    assert_eq!(spec.dimensions.len(), 1);
    assert_eq!(spec.dimensions[0].name, "Wrap");
}

#[test]
fn test_empty_value_list_is_accepted() {
    let json = r#"{ "dimensions": [ { "name": "Nothing", "values": [] } ] }"#;
    let dims = parse_spec_for_test(json, "T")
        .unwrap()
        .into_dimensions()
        .unwrap();
    assert!(dims[0].is_empty());
}

#[test]
fn test_per_test_document_needs_a_test_name() {
    let err = parse_spec(EDITING).unwrap_err();
    match err {
        ParseError::TestNameRequired { available } => {
            assert_eq!(available, "TextEditorKeyboardEditing, TextScriptEditing");
        }
        other => panic!("unexpected error: {other}"),
    }
}
