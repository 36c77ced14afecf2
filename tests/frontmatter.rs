use mdc_parser::{parse_document, serialize_document, MdcOptions};
use serde_yaml::Value;

fn roundtrip(input: &str) -> String {
    let options = MdcOptions::default();
    let doc = parse_document(input, &options);
    serialize_document(&doc, &options).expect("serializes")
}

#[test]
fn frontmatter_keeps_document_order() {
    let output = roundtrip("---\nzeta: 1\nalpha: 2\n---\n\nBody.");
    assert_eq!(output, "---\nzeta: 1\nalpha: 2\n---\n\nBody.\n");
}

#[test]
fn dotted_keys_fold_to_nested_and_unfold_on_write() {
    let input = "---\nnavigation.title: Home\nnavigation.icon: house\n---\n\nBody.";
    let doc = parse_document(input, &MdcOptions::default());
    let navigation = doc
        .frontmatter
        .get(Value::String("navigation".into()))
        .expect("folded key");
    match navigation {
        Value::Mapping(map) => {
            assert_eq!(
                map.get(Value::String("title".into())),
                Some(&Value::String("Home".into()))
            );
            assert_eq!(
                map.get(Value::String("icon".into())),
                Some(&Value::String("house".into()))
            );
        }
        other => panic!("expected nested mapping, got {:?}", other),
    }
    assert_eq!(roundtrip(input), input.to_string() + "\n");
}

#[test]
fn missing_terminator_is_content() {
    let doc = parse_document("---\ntitle: x\nno close", &MdcOptions::default());
    assert!(doc.frontmatter.is_empty());
    assert!(!doc.children.is_empty());
}

#[test]
fn empty_frontmatter_block_is_content() {
    let doc = parse_document("---\n---\n\nBody.", &MdcOptions::default());
    assert!(doc.frontmatter.is_empty());
    // The bare delimiters are two thematic breaks, then the paragraph.
    assert_eq!(doc.children.len(), 3);
}

#[test]
fn container_yaml_and_document_frontmatter_coexist() {
    let input = "---\ntitle: Page\n---\n\n::card\n---\nlabel: Card\n---\n\nBody.\n::";
    let output = roundtrip(input);
    assert_eq!(
        output,
        "---\ntitle: Page\n---\n\n::card\n---\nlabel: Card\n---\n\nBody.\n::\n"
    );
    assert_eq!(roundtrip(&output), output);
}

#[test]
fn crlf_input_normalizes_to_lf() {
    let output = roundtrip("---\r\ntitle: x\r\n---\r\n\r\nBody.\r\n");
    assert_eq!(output, "---\ntitle: x\n---\n\nBody.\n");
}
