/*
 * xml.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Conversion between the tree and XML text.
//!
//! ```rust
//! use xmq::{ParseOptions, from_xml, parse, to_xml};
//!
//! let doc = parse("car(id = 7) { wheels = 4 }", "car.xmq", &ParseOptions::default()).unwrap();
//! let xml = to_xml(&doc).unwrap();
//! assert_eq!(xml, r#"<car id="7"><wheels>4</wheels></car>"#);
//! assert!(from_xml(&xml).unwrap().same_shape(&doc));
//! ```
//!
//! XML has no attribute without a value, so a bare xmq attribute is written
//! with an empty value. Whitespace-only text between XML elements is layout
//! and is dropped when reading. An XML comment cannot contain `--` or end
//! in `-`, so such comments are written with a space between the dashes.

use std::borrow::Cow;

use quick_xml::events::{BytesEnd, BytesPI, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::XmlError;
use crate::tree::{Attribute, Document, NamespaceDecl, NodeId, NodeKind, QName};

/// Serialize `doc` as XML.
pub fn to_xml(doc: &Document) -> Result<String, XmlError> {
    tracing::debug!(nodes = doc.node_count(), "Writing XML");
    let mut writer = Writer::new(Vec::new());
    for &child in doc.children(doc.root()) {
        write_node(&mut writer, doc, child)?;
    }
    Ok(String::from_utf8(writer.into_inner())?)
}

fn write_node(
    writer: &mut Writer<Vec<u8>>,
    doc: &Document,
    id: NodeId,
) -> Result<(), XmlError> {
    match doc.kind(id) {
        NodeKind::Document => {
            for &child in doc.children(id) {
                write_node(writer, doc, child)?;
            }
        }
        NodeKind::Element {
            name,
            attributes,
            namespaces,
        } => {
            let name = name.to_string();
            let mut start = BytesStart::new(name.as_str());
            for attr in attributes {
                let key = attr.name.to_string();
                start.push_attribute((key.as_str(), attr.value.as_deref().unwrap_or("")));
            }
            for decl in namespaces {
                let key = match &decl.prefix {
                    Some(prefix) => format!("xmlns:{prefix}"),
                    None => "xmlns".to_string(),
                };
                start.push_attribute((key.as_str(), decl.uri.as_deref().unwrap_or("")));
            }
            let children = doc.children(id);
            if children.is_empty() {
                writer.write_event(Event::Empty(start))?;
            } else {
                writer.write_event(Event::Start(start))?;
                for &child in children {
                    write_node(writer, doc, child)?;
                }
                writer.write_event(Event::End(BytesEnd::new(name.as_str())))?;
            }
        }
        NodeKind::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
        NodeKind::Comment(text) => {
            writer.write_event(Event::Comment(BytesText::from_escaped(xml_comment(text))))?
        }
        NodeKind::Entity(name) => {
            let raw = format!("&{name};");
            writer.write_event(Event::Text(BytesText::from_escaped(raw)))?
        }
        NodeKind::ProcessingInstruction { target, data } => {
            let content = if data.is_empty() {
                target.clone()
            } else {
                format!("{target} {data}")
            };
            writer.write_event(Event::PI(BytesPI::new(content)))?
        }
        NodeKind::DocType(content) => {
            writer.write_event(Event::DocType(BytesText::from_escaped(content.as_str())))?
        }
    }
    Ok(())
}

/// Comment text with every `--` and a trailing `-` broken by a space.
fn xml_comment(text: &str) -> Cow<'_, str> {
    if !text.contains("--") && !text.ends_with('-') {
        return Cow::Borrowed(text);
    }
    tracing::warn!(comment = text, "Separating dashes in XML comment");
    let mut out = String::with_capacity(text.len() + 2);
    for c in text.chars() {
        if c == '-' && out.ends_with('-') {
            out.push(' ');
        }
        out.push(c);
    }
    if out.ends_with('-') {
        out.push(' ');
    }
    Cow::Owned(out)
}

/// Build a tree from XML text.
pub fn from_xml(text: &str) -> Result<Document, XmlError> {
    tracing::debug!(bytes = text.len(), "Reading XML");
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text_start = false;
    reader.config_mut().trim_text_end = false;
    reader.config_mut().check_end_names = false;
    reader.config_mut().allow_unmatched_ends = true;

    let mut doc = Document::new();
    let mut stack: Vec<NodeId> = Vec::new();

    loop {
        let parent = stack.last().copied().unwrap_or_else(|| doc.root());
        match reader.read_event()? {
            Event::Start(e) => {
                let id = open_element(&mut doc, parent, &e)?;
                stack.push(id);
            }
            Event::Empty(e) => {
                open_element(&mut doc, parent, &e)?;
            }
            Event::End(e) => {
                let found = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let Some(open) = stack.pop() else {
                    return Err(XmlError::UnexpectedEndTag { found });
                };
                let expected = doc
                    .element_name(open)
                    .map(QName::to_string)
                    .unwrap_or_default();
                if expected != found {
                    return Err(XmlError::MismatchedEndTag { expected, found });
                }
            }
            Event::Text(e) => {
                let text = e.unescape()?;
                if !text.trim().is_empty() {
                    push_text(&mut doc, parent, &text);
                }
            }
            Event::CData(e) => {
                let text = String::from_utf8(e.into_inner().into_owned())?;
                push_text(&mut doc, parent, &text);
            }
            Event::Comment(e) => {
                let text = String::from_utf8(e.into_inner().into_owned())?;
                doc.append_node(parent, NodeKind::Comment(text.trim().to_string()));
            }
            Event::PI(e) => {
                let target = String::from_utf8_lossy(e.target()).into_owned();
                let data = String::from_utf8_lossy(e.content()).trim().to_string();
                doc.append_node(parent, NodeKind::ProcessingInstruction { target, data });
            }
            Event::DocType(e) => {
                let content = String::from_utf8(e.into_inner().into_owned())?;
                doc.append_node(parent, NodeKind::DocType(content.trim().to_string()));
            }
            Event::Decl(_) => {}
            Event::Eof => break,
        }
    }

    if let Some(&open) = stack.last() {
        let expected = doc
            .element_name(open)
            .map(QName::to_string)
            .unwrap_or_default();
        return Err(XmlError::UnexpectedEof { expected });
    }
    tracing::debug!(nodes = doc.node_count(), "Read XML");
    Ok(doc)
}

fn open_element(
    doc: &mut Document,
    parent: NodeId,
    e: &BytesStart<'_>,
) -> Result<NodeId, XmlError> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let id = doc.append_element(parent, QName::parse(&name));
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        if key == "xmlns" {
            doc.push_namespace(
                id,
                NamespaceDecl {
                    prefix: None,
                    uri: Some(value),
                },
            );
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            doc.push_namespace(
                id,
                NamespaceDecl {
                    prefix: Some(prefix.to_string()),
                    uri: Some(value),
                },
            );
        } else {
            doc.push_attribute(
                id,
                Attribute {
                    name: QName::parse(&key),
                    value: Some(value),
                },
            );
        }
    }
    Ok(id)
}

/// Append text to `parent`, extending a trailing text node if there is one.
fn push_text(doc: &mut Document, parent: NodeId, text: &str) {
    if let Some(&last) = doc.children(parent).last()
        && let NodeKind::Text(existing) = doc.kind_mut(last)
    {
        existing.push_str(text);
        return;
    }
    doc.append_text(parent, text);
}
