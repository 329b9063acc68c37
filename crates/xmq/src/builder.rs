/*
 * builder.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Building a [`Document`] from the token stream, and the `parse` entry
//! points that drive it.

use std::io::Read;
use std::path::Path;

use crate::comment::comment_text;
use crate::detect::{ContentType, detect_content_type};
use crate::entity::{decode_entity, entity_name};
use crate::error::{ParseError, ParseErrorKind, Result};
use crate::lexer::tokenize_with_limit;
use crate::options::ParseOptions;
use crate::quote::{normalize_quote, strip_delimiters};
use crate::scanner::{is_token_whitespace, position_at};
use crate::token::{Token, TokenKind, TokenSink};
use crate::tree::{Attribute, Document, NamespaceDecl, NodeId, NodeKind, QName};

const DOCTYPE_NAME: &str = "!DOCTYPE";

/// Parse xmq text into a tree.
///
/// ```rust
/// use xmq::{parse, ParseOptions};
///
/// let doc = parse("car { wheels = 4 }", "inline", &ParseOptions::default()).unwrap();
/// let car = doc.root_element().unwrap();
/// let wheels = doc.child_elements(car, "wheels").next().unwrap();
/// assert_eq!(doc.text_content(wheels), "4");
/// ```
///
/// # Errors
///
/// Returns the first syntax error found, or `NotXmq` when the text is
/// recognizably XML, HTML or JSON.
pub fn parse(source: &str, source_name: &str, options: &ParseOptions) -> Result<Document> {
    tracing::debug!(source = source_name, bytes = source.len(), "Parsing xmq");

    let content_type = detect_content_type(source);
    if matches!(
        content_type,
        ContentType::Xml | ContentType::Html | ContentType::Json
    ) {
        tracing::debug!(source = source_name, ?content_type, "Input is not xmq");
        let offset = source
            .find(|c: char| !is_token_whitespace(c) && c != '\t')
            .unwrap_or(0);
        return Err(ParseError::at(
            ParseErrorKind::NotXmq,
            source,
            source_name,
            position_at(source, offset),
        ));
    }

    let mut builder = TreeBuilder::new(options);
    tokenize_with_limit(source, source_name, options.max_depth, &mut builder)?;
    let doc = builder.finish();

    tracing::debug!(
        source = source_name,
        nodes = doc.node_count(),
        "Parsed xmq"
    );
    Ok(doc)
}

/// Read and parse a file. The path becomes the source name in errors.
///
/// # Errors
///
/// `CannotReadFile` when the file cannot be opened or is not UTF-8,
/// `OutOfMemory` when a buffer for it cannot be reserved, and otherwise
/// whatever [`parse`] reports.
pub fn parse_file(path: impl AsRef<Path>, options: &ParseOptions) -> Result<Document> {
    let path = path.as_ref();
    let name = path.display().to_string();
    let cannot_read = |err: std::io::Error| {
        tracing::debug!(source = %name, error = %err, "Cannot read file");
        ParseError::resource(ParseErrorKind::CannotReadFile, &name)
    };

    let mut file = std::fs::File::open(path).map_err(cannot_read)?;
    let len = file
        .metadata()
        .map_err(cannot_read)?
        .len();
    let mut buffer = String::new();
    buffer
        .try_reserve(usize::try_from(len).unwrap_or(usize::MAX))
        .map_err(|_| ParseError::resource(ParseErrorKind::OutOfMemory, &name))?;
    file.read_to_string(&mut buffer).map_err(cannot_read)?;

    parse(&buffer, &name, options)
}

/// Which attribute-like slot the next attribute value fills.
#[derive(Debug, Clone, Copy)]
enum AttrTarget {
    None,
    Attribute(usize),
    Namespace(usize),
}

/// A [`TokenSink`] that assembles a [`Document`].
pub struct TreeBuilder<'o> {
    doc: Document,
    options: &'o ParseOptions,
    /// Open elements; the top is where body content goes.
    stack: Vec<NodeId>,
    last_element: Option<NodeId>,
    last_comment: Option<NodeId>,
    pending_element_ns: Option<String>,
    pending_attr_ns: Option<String>,
    attr_target: AttrTarget,
    last_kind: Option<TokenKind>,
}

impl<'o> TreeBuilder<'o> {
    pub fn new(options: &'o ParseOptions) -> Self {
        Self {
            doc: Document::new(),
            options,
            stack: Vec::new(),
            last_element: None,
            last_comment: None,
            pending_element_ns: None,
            pending_attr_ns: None,
            attr_target: AttrTarget::None,
            last_kind: None,
        }
    }

    pub fn finish(self) -> Document {
        self.doc
    }

    fn current_parent(&self) -> NodeId {
        self.stack.last().copied().unwrap_or(self.doc.root())
    }

    fn quote_text(&self, raw: &str) -> String {
        let content = strip_delimiters(raw);
        if self.options.trim_none {
            content.to_string()
        } else {
            normalize_quote(content)
        }
    }

    /// Append text under `parent`, merging into a preceding text node.
    fn add_text(&mut self, parent: NodeId, text: &str) {
        if self.options.merge_adjacent_text
            && let Some(&last) = self.doc.children(parent).last()
            && let NodeKind::Text(existing) = self.doc.kind_mut(last)
        {
            existing.push_str(text);
            return;
        }
        self.doc.append_text(parent, text);
    }

    /// Body-level or element-value entity: decoded characters become text,
    /// anything else an entity node.
    fn add_entity(&mut self, parent: NodeId, raw: &str) {
        let name = entity_name(raw);
        match decode_entity(name) {
            Some(c) => self.add_text(parent, c.encode_utf8(&mut [0; 4])),
            None => {
                self.doc
                    .append_node(parent, NodeKind::Entity(name.to_string()));
            }
        }
    }

    fn open_element(&mut self, raw: &str) {
        if raw == DOCTYPE_NAME {
            let id = self
                .doc
                .append_node(self.current_parent(), NodeKind::DocType(String::new()));
            self.last_element = Some(id);
            return;
        }
        if let Some(target) = raw.strip_prefix('?') {
            let id = self.doc.append_node(
                self.current_parent(),
                NodeKind::ProcessingInstruction {
                    target: target.to_string(),
                    data: String::new(),
                },
            );
            self.last_element = Some(id);
            return;
        }

        let name = QName {
            namespace: self.pending_element_ns.take(),
            local: raw.to_string(),
        };

        if self.stack.is_empty()
            && self.doc.root_element().is_none()
            && let Some(root_name) = self.options.implicit_root()
            && name.to_string() != root_name
        {
            let wrapper = self
                .doc
                .append_element(self.doc.root(), QName::parse(root_name));
            self.stack.push(wrapper);
        }

        let id = self.doc.append_element(self.current_parent(), name);
        self.last_element = Some(id);
        self.attr_target = AttrTarget::None;
    }

    /// A value after `name =`.
    fn set_element_value(&mut self, kind: TokenKind, raw: &str) {
        let Some(target) = self.last_element else {
            return;
        };
        let value = match kind {
            TokenKind::ElementValueQuote => self.quote_text(raw),
            TokenKind::ElementValueEntity => {
                if matches!(self.doc.kind(target), NodeKind::Element { .. }) {
                    self.add_entity(target, raw);
                    return;
                }
                literal_entity(raw)
            }
            _ => raw.to_string(),
        };
        if matches!(self.doc.kind(target), NodeKind::Element { .. }) {
            self.add_text(target, &value);
            return;
        }
        match self.doc.kind_mut(target) {
            NodeKind::DocType(content) => content.push_str(&value),
            NodeKind::ProcessingInstruction { data, .. } => data.push_str(&value),
            _ => {}
        }
    }

    fn set_attr_value(&mut self, kind: TokenKind, raw: &str) {
        let value = match kind {
            TokenKind::AttrValueQuote => self.quote_text(raw),
            TokenKind::AttrValueEntity => literal_entity(raw),
            _ => raw.to_string(),
        };
        let Some(element) = self.last_element else {
            return;
        };
        match (self.attr_target, self.doc.kind_mut(element)) {
            (AttrTarget::Attribute(i), NodeKind::Element { attributes, .. }) => {
                attributes[i].value = Some(value);
            }
            (AttrTarget::Namespace(i), NodeKind::Element { namespaces, .. }) => {
                namespaces[i].uri = Some(value);
            }
            _ => {}
        }
    }

    fn add_attribute(&mut self, local: &str) {
        let Some(element) = self.last_element else {
            return;
        };
        let name = QName {
            namespace: self.pending_attr_ns.take(),
            local: local.to_string(),
        };
        if let NodeKind::Element { attributes, .. } = self.doc.kind_mut(element) {
            attributes.push(Attribute { name, value: None });
            self.attr_target = AttrTarget::Attribute(attributes.len() - 1);
        }
    }

    fn add_namespace_decl(&mut self) {
        let Some(element) = self.last_element else {
            return;
        };
        if let NodeKind::Element { namespaces, .. } = self.doc.kind_mut(element) {
            namespaces.push(NamespaceDecl {
                prefix: None,
                uri: None,
            });
            self.attr_target = AttrTarget::Namespace(namespaces.len() - 1);
        }
    }

    fn attr_ns(&mut self, text: &str) {
        // After `xmlns:` the name is the prefix being declared.
        if self.last_kind == Some(TokenKind::NsColon)
            && let AttrTarget::Namespace(i) = self.attr_target
            && let Some(element) = self.last_element
            && let NodeKind::Element { namespaces, .. } = self.doc.kind_mut(element)
        {
            namespaces[i].prefix = Some(text.to_string());
            return;
        }
        self.pending_attr_ns = Some(text.to_string());
    }
}

/// Inside attribute values entities are not decoded into nodes; named
/// entities stay literal.
fn literal_entity(raw: &str) -> String {
    let name = entity_name(raw);
    match decode_entity(name) {
        Some(c) => c.to_string(),
        None => format!("&{name};"),
    }
}

impl TokenSink for TreeBuilder<'_> {
    fn token(&mut self, token: &Token, source: &str) {
        let text = token.text(source);
        tracing::trace!(
            kind = token.kind.name(),
            line = token.line(),
            col = token.col(),
            "Token"
        );

        match token.kind {
            TokenKind::Whitespace => return,
            TokenKind::Colon | TokenKind::NsColon | TokenKind::Equals => {}
            TokenKind::AparLeft | TokenKind::AparRight => {
                self.attr_target = AttrTarget::None;
            }
            TokenKind::ElementNs => self.pending_element_ns = Some(text.to_string()),
            TokenKind::ElementName | TokenKind::ElementKey => self.open_element(text),
            TokenKind::BraceLeft => {
                if let Some(element) = self.last_element {
                    self.stack.push(element);
                }
            }
            TokenKind::BraceRight => {
                self.stack.pop();
            }
            TokenKind::ElementValueText
            | TokenKind::ElementValueQuote
            | TokenKind::ElementValueEntity => self.set_element_value(token.kind, text),
            TokenKind::Quote => {
                let value = self.quote_text(text);
                let parent = self.current_parent();
                self.add_text(parent, &value);
            }
            TokenKind::Entity => {
                let parent = self.current_parent();
                self.add_entity(parent, text);
            }
            TokenKind::Comment => {
                let content = comment_text(text, self.options.trim_none);
                let parent = self.current_parent();
                let id = self.doc.append_node(parent, NodeKind::Comment(content));
                self.last_comment = Some(id);
            }
            TokenKind::CommentContinuation => {
                let content = comment_text(text, self.options.trim_none);
                if let Some(id) = self.last_comment
                    && let NodeKind::Comment(existing) = self.doc.kind_mut(id)
                {
                    existing.push('\n');
                    existing.push_str(&content);
                }
            }
            TokenKind::AttrNs => self.attr_ns(text),
            TokenKind::AttrKey => self.add_attribute(text),
            TokenKind::NsDeclaration => self.add_namespace_decl(),
            TokenKind::AttrValueText | TokenKind::AttrValueQuote | TokenKind::AttrValueEntity => {
                self.set_attr_value(token.kind, text)
            }
        }
        self.last_kind = Some(token.kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse_default(source: &str) -> Document {
        parse(source, "test", &ParseOptions::default()).unwrap()
    }

    #[test]
    fn test_key_value_children() {
        let doc = parse_default("car { wheels = 4 color = 'red' }");
        let car = doc.root_element().unwrap();
        let names: Vec<_> = doc
            .children(car)
            .iter()
            .map(|&id| doc.element_name(id).unwrap().local.clone())
            .collect();
        assert_eq!(names, ["wheels", "color"]);
        let color = doc.child_elements(car, "color").next().unwrap();
        assert_eq!(doc.text_content(color), "red");
    }

    #[test]
    fn test_quote_char_does_not_matter() {
        let a = parse_default("x = 'x'");
        let b = parse_default("x = \"x\"");
        assert!(a.same_shape(&b));
        assert_eq!(doc_text(&a), "x");
    }

    fn doc_text(doc: &Document) -> String {
        doc.text_content(doc.root())
    }

    #[test]
    fn test_implicit_root() {
        let opts = ParseOptions::new().with_implicit_root("config");
        let bare = parse("speed=123", "t", &opts).unwrap();
        let explicit = parse("config{speed=123}", "t", &opts).unwrap();
        assert!(bare.same_shape(&explicit));

        let root = bare.root_element().unwrap();
        assert_eq!(bare.element_name(root), Some(&QName::local("config")));
        let speed = bare.children(root)[0];
        assert_eq!(bare.element_name(speed), Some(&QName::local("speed")));
        assert_eq!(bare.text_content(speed), "123");
    }

    #[test]
    fn test_attributes_and_namespaces() {
        let doc = parse_default("svg:rect(xmlns:svg=u x=1 hidden xlink:href='#a') = ''");
        let rect = doc.root_element().unwrap();
        assert_eq!(doc.element_name(rect), Some(&QName::prefixed("svg", "rect")));
        assert_eq!(
            doc.attributes(rect),
            [
                Attribute {
                    name: QName::local("x"),
                    value: Some("1".into())
                },
                Attribute {
                    name: QName::local("hidden"),
                    value: None
                },
                Attribute {
                    name: QName::prefixed("xlink", "href"),
                    value: Some("#a".into())
                },
            ]
        );
        assert_eq!(
            doc.namespaces(rect),
            [NamespaceDecl {
                prefix: Some("svg".into()),
                uri: Some("u".into())
            }]
        );
        assert_eq!(doc.children(rect).len(), 1);
        assert_eq!(doc.text_content(rect), "");
    }

    #[test]
    fn test_entities_decode_to_text() {
        let doc = parse_default("p { 'a' &#10; 'b' &amp; &copy; }");
        let p = doc.root_element().unwrap();
        let kinds: Vec<_> = doc.children(p).iter().map(|&id| doc.kind(id).clone()).collect();
        assert_eq!(
            kinds,
            [
                NodeKind::Text("a\nb&".into()),
                NodeKind::Entity("copy".into())
            ]
        );
    }

    #[test]
    fn test_merge_can_be_disabled() {
        let opts = ParseOptions::new().with_merge_adjacent_text(false);
        let doc = parse("p { 'a' 'b' }", "t", &opts).unwrap();
        let p = doc.root_element().unwrap();
        assert_eq!(doc.children(p).len(), 2);
    }

    #[test]
    fn test_attribute_entities_stay_literal() {
        let doc = parse_default("a(k=&copy; n=&#65;)");
        let a = doc.root_element().unwrap();
        assert_eq!(doc.attribute(a, "k"), Some("&copy;"));
        assert_eq!(doc.attribute(a, "n"), Some("A"));
    }

    #[test]
    fn test_comments_around_root() {
        let doc = parse_default("// before\nroot { } /* after */* more */");
        let kinds: Vec<_> = doc
            .children(doc.root())
            .iter()
            .map(|&id| doc.kind(id).clone())
            .collect();
        assert_eq!(kinds[0], NodeKind::Comment("before".into()));
        assert!(matches!(kinds[1], NodeKind::Element { .. }));
        assert_eq!(kinds[2], NodeKind::Comment("after\nmore".into()));
    }

    #[test]
    fn test_doctype_and_pi() {
        let doc = parse_default("!DOCTYPE = html\n?xml-stylesheet = 'href=\"s.css\"'\nhtml");
        let kinds: Vec<_> = doc
            .children(doc.root())
            .iter()
            .map(|&id| doc.kind(id).clone())
            .collect();
        assert_eq!(kinds[0], NodeKind::DocType("html".into()));
        assert_eq!(
            kinds[1],
            NodeKind::ProcessingInstruction {
                target: "xml-stylesheet".into(),
                data: "href=\"s.css\"".into()
            }
        );
    }

    #[test]
    fn test_trim_none_keeps_raw_quote() {
        let opts = ParseOptions::new().with_trim_none(true);
        let doc = parse("t = '\n  a\n  '", "t", &opts).unwrap();
        assert_eq!(doc_text(&doc), "\n  a\n  ");
        let doc = parse_default("t = '\n  a\n  '");
        assert_eq!(doc_text(&doc), "a");
    }

    #[test]
    fn test_not_xmq() {
        let err = parse("  <x/>", "t", &ParseOptions::default()).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::NotXmq);
        assert_eq!((err.line, err.col), (1, 3));
        assert!(parse("", "t", &ParseOptions::default()).is_ok());
    }

    #[test]
    fn test_parse_file_missing() {
        let err = parse_file("/definitely/not/here.xmq", &ParseOptions::default()).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::CannotReadFile);
        assert_eq!(err.source_name, "/definitely/not/here.xmq");
    }
}
