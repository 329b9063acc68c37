/*
 * properties.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * End-to-end properties of the public API: quoting, comments, implicit
 * roots, content detection and the XML bridge.
 */

use pretty_assertions::assert_eq;
use xmq::{
    ContentType, Document, NodeKind, ParseErrorKind, ParseOptions, QName, RenderOptions,
    detect_content_type, from_xml, parse, render, to_xml,
};

fn parse_default(source: &str) -> Document {
    parse(source, "test.xmq", &ParseOptions::default()).unwrap()
}

fn parse_err(source: &str) -> ParseErrorKind {
    parse(source, "test.xmq", &ParseOptions::default())
        .unwrap_err()
        .kind
}

fn only_comment(doc: &Document) -> String {
    match doc.kind(doc.children(doc.root())[0]) {
        NodeKind::Comment(text) => text.clone(),
        other => panic!("expected a comment, got {other:?}"),
    }
}

#[test]
fn test_quote_char_does_not_matter() {
    let single = parse_default("a = 'x'");
    let double = parse_default("a = \"x\"");
    assert!(single.same_shape(&double));
    let a = single.root_element().unwrap();
    assert_eq!(single.text_content(a), "x");
}

#[test]
fn test_multi_line_quote_loses_incidental_indentation() {
    let doc = parse_default("poem = '\n       Roses are red,\n         violets are blue.\n       '");
    let poem = doc.root_element().unwrap();
    assert_eq!(doc.text_content(poem), "Roses are red,\n  violets are blue.");
}

#[test]
fn test_comment_balancing() {
    assert_eq!(only_comment(&parse_default("/* a */")), "a");
    assert_eq!(only_comment(&parse_default("////* a *////")), "a");
    assert_eq!(
        parse_err("/* a *// b"),
        ParseErrorKind::CommentClosedWithTooManySlashes
    );
}

#[test]
fn test_quote_over_closing() {
    assert_eq!(
        parse_err("a = '''x''''"),
        ParseErrorKind::QuoteClosedWithTooManyQuotes
    );
}

#[test]
fn test_implicit_root_wraps_bare_content() {
    let options = ParseOptions::new().with_implicit_root("config");
    let bare = parse("speed=123", "t", &options).unwrap();
    let wrapped = parse("config{speed=123}", "t", &options).unwrap();
    assert!(bare.same_shape(&wrapped));

    let config = bare.root_element().unwrap();
    assert_eq!(bare.element_name(config), Some(&QName::local("config")));
    let children = bare.children(config);
    assert_eq!(children.len(), 1);
    assert_eq!(bare.element_name(children[0]), Some(&QName::local("speed")));
    assert_eq!(bare.text_content(children[0]), "123");
}

#[test]
fn test_content_detection() {
    assert_eq!(detect_content_type("<x/>"), ContentType::Xml);
    assert_eq!(detect_content_type("{}"), ContentType::Json);
    assert_eq!(detect_content_type("[1]"), ContentType::Json);
    assert_eq!(detect_content_type("true"), ContentType::Json);
    assert_eq!(detect_content_type("a=1"), ContentType::Xmq);
    assert_eq!(parse_err("{ \"a\": 1 }"), ParseErrorKind::NotXmq);
}

#[test]
fn test_entities_decode_to_text() {
    let doc = parse_default("p { 'a' &#10; &lt; 'b' }");
    let p = doc.root_element().unwrap();
    assert_eq!(doc.children(p).len(), 1);
    assert_eq!(doc.text_content(p), "a\n<b");
}

#[test]
fn test_namespaces_split_at_last_colon() {
    let doc = parse_default("a:b:c = 1");
    let el = doc.root_element().unwrap();
    assert_eq!(doc.element_name(el), Some(&QName::prefixed("a:b", "c")));
}

#[test]
fn test_xml_bridge_preserves_names_attributes_and_text() {
    let doc = parse_default("shop(xmlns:p = urn:p) { p:item(id = 7) = 'two words' note }");
    let xml = to_xml(&doc).unwrap();
    assert_eq!(
        xml,
        r#"<shop xmlns:p="urn:p"><p:item id="7">two words</p:item><note/></shop>"#
    );
    let back = from_xml(&xml).unwrap();
    assert!(back.same_shape(&doc));
}

#[test]
fn test_doctype_round_trips() {
    let source = "!DOCTYPE = html\nhtml {\n    body = hello\n}\n";
    let doc = parse_default(source);
    assert!(matches!(
        doc.kind(doc.children(doc.root())[0]),
        NodeKind::DocType(content) if content == "html"
    ));
    assert_eq!(render(&doc, &RenderOptions::default()), source);

    let xml = to_xml(&doc).unwrap();
    assert_eq!(xml, "<!DOCTYPE html><html><body>hello</body></html>");
    assert!(from_xml(&xml).unwrap().same_shape(&doc));
}

#[test]
fn test_render_snapshot() {
    let doc = parse_default(
        "// Shop inventory\nshop(id = 7 region = north) { item = apple price = '1 €' \
         description = 'crisp\nand sweet' notes { 'line one' } }",
    );
    insta::assert_snapshot!(render(&doc, &RenderOptions::default()), @r"
    // Shop inventory
    shop(id     = 7
         region = north) {
        item  = apple
        price = '1 €'
        description = 'crisp
                       and sweet'
        notes = 'line one'
    }
    ");
}

#[test]
fn test_compact_snapshot() {
    let doc = parse_default("a(x = 1) { b = 'two words' c { d } /* note */ e = &nbsp; }");
    insta::assert_snapshot!(
        render(&doc, &RenderOptions::new().with_compact(true)),
        @"a(x=1){b='two words'c{d}/* note */ e=&nbsp;}"
    );
}
