use mdc_parser::{parse_document, serialize_document, AttrValue, AttributeMap, Document, MdcOptions, Node};
use rstest::rstest;

fn roundtrip(input: &str) -> String {
    let options = MdcOptions::default();
    let doc = parse_document(input, &options);
    serialize_document(&doc, &options).expect("serializes")
}

fn container_doc(attributes: AttributeMap) -> Document {
    Document {
        frontmatter: serde_yaml::Mapping::new(),
        children: vec![Node::Container {
            name: "box".into(),
            label: None,
            attributes,
            fm_attributes: AttributeMap::new(),
            children: vec![],
        }],
    }
}

#[rstest]
#[case::id_shorthand("::box{#main}\n::", "::box{#main}\n::\n")]
#[case::class_shorthand("::box{.wide .tall}\n::", "::box{.wide.tall}\n::\n")]
#[case::flag("::box{draft}\n::", "::box{draft}\n::\n")]
#[case::bound_json("::box{:items='[1,2]'}\n::", "::box\n---\nitems:\n- 1\n- 2\n---\n::\n")]
fn attribute_roundtrips(#[case] input: &str, #[case] expected: &str) {
    let output = roundtrip(input);
    assert_eq!(output, expected);
    assert_eq!(roundtrip(&output), output);
}

#[test]
fn quoting_survives_mixed_quotes() {
    let original = r#"it's "quoted""#;
    let mut attributes = AttributeMap::new();
    attributes.insert("text", original);
    let options = MdcOptions::default();
    let first = serialize_document(&container_doc(attributes), &options).expect("serializes");

    let reparsed = parse_document(&first, &options);
    match &reparsed.children[0] {
        Node::Container { attributes, .. } => {
            assert_eq!(
                attributes.get("text").map(AttrValue::display_string),
                Some(original.to_string())
            );
        }
        other => panic!("expected container, got {:?}", other),
    }
    let second = serialize_document(&reparsed, &options).expect("serializes");
    assert_eq!(first, second);
}

#[test]
fn promotion_is_deterministic_at_four_attributes() {
    let three = roundtrip("::box{a=\"1\" b=\"2\" c=\"3\"}\n::");
    assert_eq!(three, "::box{a=\"1\" b=\"2\" c=\"3\"}\n::\n");

    let four = roundtrip("::box{a=\"1\" b=\"2\" c=\"3\" d=\"4\"}\n::");
    assert_eq!(four, "::box\n---\na: '1'\nb: '2'\nc: '3'\nd: '4'\n---\n::\n");
    assert_eq!(roundtrip(&four), four);
}

#[test]
fn long_head_line_promotes() {
    let value = "x".repeat(90);
    let input = format!("::box{{note=\"{}\"}}\n::", value);
    let output = roundtrip(&input);
    assert!(output.starts_with("::box\n---\n"), "long heads must promote: {}", output);
    assert_eq!(roundtrip(&output), output);
}

#[test]
fn preserve_order_keeps_authored_order() {
    let mut attributes = AttributeMap::new();
    attributes.insert("zeta", "1");
    attributes.insert("alpha", "2");
    let options = MdcOptions {
        attributes: mdc_parser::AttributeOptions {
            preserve_order: true,
            ..Default::default()
        },
        ..MdcOptions::default()
    };
    let output = serialize_document(&container_doc(attributes), &options).expect("serializes");
    assert_eq!(output, "::box{zeta=\"1\" alpha=\"2\"}\n::\n");
}

#[test]
fn attribute_conflict_is_reported() {
    let mut attributes = AttributeMap::new();
    attributes.insert("title", "a");
    let mut fm_attributes = AttributeMap::new();
    fm_attributes.insert("title", "b");
    let document = Document {
        frontmatter: serde_yaml::Mapping::new(),
        children: vec![Node::Container {
            name: "box".into(),
            label: None,
            attributes,
            fm_attributes,
            children: vec![],
        }],
    };
    let err = serialize_document(&document, &MdcOptions::default()).unwrap_err();
    assert!(err.to_string().contains("title"));
}

#[test]
fn invalid_bound_json_round_trips_as_string() {
    let options = MdcOptions::default();
    let first = roundtrip("::box{:broken=\"{not json\"}\n::");
    let reparsed = parse_document(&first, &options);
    match &reparsed.children[0] {
        Node::Container {
            attributes,
            fm_attributes,
            ..
        } => {
            let value = attributes
                .get(":broken")
                .or_else(|| fm_attributes.get(":broken"))
                .map(AttrValue::display_string);
            assert_eq!(value, Some("{not json".to_string()));
        }
        other => panic!("expected container, got {:?}", other),
    }
    assert_eq!(roundtrip(&first), first);
}
