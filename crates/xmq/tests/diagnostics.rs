/*
 * diagnostics.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Snapshot tests for rendered parse errors: the one-line header, the
 * offending source line, and the caret under the reported column.
 */

use xmq::{ParseErrorKind, ParseOptions, parse, parse_file};

fn diagnostic(name: &str, source: &str) -> String {
    match parse(source, name, &ParseOptions::default()) {
        Ok(_) => panic!("expected {name} to fail to parse"),
        Err(err) => err.render_diagnostic(),
    }
}

#[test]
fn test_unclosed_quote_points_at_opening_quote() {
    insta::assert_snapshot!(
        diagnostic("quote.xmq", "config {\n    name = 'John\n}\n"),
        @r"
    quote.xmq:2:12: error: quote is not closed
        name = 'John
               ^
    "
    );
}

#[test]
fn test_unclosed_body_points_at_outer_brace() {
    insta::assert_snapshot!(
        diagnostic("body.xmq", "x {\n  y {\n  }\n"),
        @r"
    body.xmq:1:3: error: body is not closed
    x {
      ^
    "
    );
}

#[test]
fn test_unclosed_attributes_point_at_paren() {
    insta::assert_snapshot!(
        diagnostic("attrs.xmq", "x(a=1\n  b"),
        @r"
    attrs.xmq:1:2: error: attributes are not closed
    x(a=1
     ^
    "
    );
}

#[test]
fn test_invalid_char_names_the_codepoint() {
    insta::assert_snapshot!(
        diagnostic("config.xmq", "x\n  ~b\n"),
        @r#"
    config.xmq:2:3: error: unexpected character "~" U+7E
      ~b
      ^
    "#
    );
}

#[test]
fn test_missing_value_points_at_equals() {
    insta::assert_snapshot!(
        diagnostic("value.xmq", "alfa =\nbeta = 1"),
        @r"
    value.xmq:1:6: error: expected content after equals
    alfa =
         ^
    "
    );
}

#[test]
fn test_stray_closing_brace() {
    insta::assert_snapshot!(
        diagnostic("brace.xmq", "a }"),
        @r"
    brace.xmq:1:3: error: unexpected closing brace
    a }
      ^
    "
    );
}

#[test]
fn test_markup_is_rejected_as_not_xmq() {
    insta::assert_snapshot!(
        diagnostic("page.xmq", "\n<root/>"),
        @r"
    page.xmq:2:1: error: input file is not xmq
    <root/>
    ^
    "
    );
}

#[test]
fn test_display_is_the_header_only() {
    let err = parse("a = 'x", "q.xmq", &ParseOptions::default()).unwrap_err();
    assert_eq!(err.to_string(), "q.xmq:1:5: error: quote is not closed");
    assert_eq!(err.offset, 4);
    assert_eq!(err.line_text, "a = 'x");
}

#[test]
fn test_missing_file_is_a_resource_error() {
    let err = parse_file("/definitely/not/here.xmq", &ParseOptions::default()).unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::CannotReadFile);
    assert_eq!((err.line, err.col), (0, 0));
    assert_eq!(
        err.render_diagnostic(),
        "/definitely/not/here.xmq: error: cannot read file"
    );
}
