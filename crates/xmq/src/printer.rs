/*
 * printer.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Render a [`Document`] back to xmq text.
//!
//! Every value is printed in the first form that reads back to the same
//! text: bare, quoted, or as a single character entity. Body text that no
//! single quote can carry is split at its line breaks into quotes joined
//! by `&#10;` entities.
//!
//! Non-compact output puts each node on a line of its own, aligns the `=`
//! of neighbouring key-value elements, and stacks attributes below the
//! column after `(`. Compact output keeps everything on one logical line
//! and only inserts a space where two tokens would otherwise run together.

use crate::comment::{block_delimiters, comment_text};
use crate::entity::char_entity;
use crate::options::RenderOptions;
use crate::quote::{QuoteLayout, indent_lines, quote_depth, quote_text, quote_with};
use crate::scanner::{is_quote_start, is_safe_value_char};
use crate::tree::{Document, NamespaceDecl, NodeId, NodeKind};

/// Render `doc` as xmq.
pub fn render(doc: &Document, options: &RenderOptions) -> String {
    tracing::debug!(
        nodes = doc.node_count(),
        compact = options.compact,
        indent = options.indent_width(),
        "Rendering xmq"
    );
    let mut printer = Printer::new(doc, options);
    printer.print_nodes(doc.children(doc.root()), 0);
    if !printer.compact && !printer.out.is_empty() {
        printer.out.push('\n');
    }
    tracing::debug!(bytes = printer.out.len(), "Rendered xmq");
    printer.out
}

/// True when `text` can be printed as an unquoted value.
pub fn is_bare_value(text: &str) -> bool {
    !text.is_empty()
        && text.chars().all(is_safe_value_char)
        && !text.starts_with(['&', '='])
        && !text.starts_with("//")
        && !text.starts_with("/*")
}

struct Printer<'d> {
    doc: &'d Document,
    compact: bool,
    indent_step: usize,
    out: String,
    /// 0-based column of the next character.
    col: usize,
    last: Option<char>,
    after_comment: bool,
    /// The last thing written was the `=` between a key and its value.
    after_equals: bool,
}

impl<'d> Printer<'d> {
    fn new(doc: &'d Document, options: &RenderOptions) -> Self {
        Self {
            doc,
            compact: options.compact,
            indent_step: options.indent_width(),
            out: String::new(),
            col: 0,
            last: None,
            after_comment: false,
            after_equals: false,
        }
    }

    fn write(&mut self, s: &str) {
        for c in s.chars() {
            if c == '\n' {
                self.col = 0;
            } else {
                self.col += 1;
            }
            self.last = Some(c);
        }
        self.out.push_str(s);
        if !s.is_empty() {
            self.after_comment = false;
            self.after_equals = false;
        }
    }

    fn spaces(&mut self, n: usize) {
        self.write(&" ".repeat(n));
    }

    /// Write a token, separating it from the previous one when the two
    /// would otherwise read as one.
    fn token(&mut self, s: &str) {
        if let Some(first) = s.chars().next()
            && self.needs_space(first)
        {
            self.write(" ");
        }
        self.write(s);
    }

    fn needs_space(&self, next: char) -> bool {
        let Some(last) = self.last else {
            return false;
        };
        if matches!(last, ' ' | '\n') {
            return false;
        }
        if self.after_comment {
            return true;
        }
        if self.after_equals {
            return false;
        }
        (is_quote_start(last) && is_quote_start(next))
            || (is_safe_value_char(last) && is_safe_value_char(next))
    }

    /// Start a node: a fresh line at `indent`, or nothing in compact mode.
    fn start_line(&mut self, indent: usize) {
        if self.compact {
            return;
        }
        if !self.out.is_empty() {
            self.write("\n");
        }
        self.spaces(indent);
    }

    fn print_nodes(&mut self, nodes: &[NodeId], indent: usize) {
        let aligns = self.key_alignment(nodes);
        for (&id, align) in nodes.iter().zip(aligns) {
            self.start_line(indent);
            self.print_node(id, indent, align);
        }
    }

    /// For every node, the width to pad its name to before `=`. Runs of
    /// neighbouring single-line key-value elements share the widest name.
    fn key_alignment(&self, nodes: &[NodeId]) -> Vec<usize> {
        let widths: Vec<Option<usize>> = nodes
            .iter()
            .map(|&id| self.aligned_key_width(id))
            .collect();
        let mut aligns = vec![0; nodes.len()];
        let mut i = 0;
        while i < widths.len() {
            if widths[i].is_none() {
                i += 1;
                continue;
            }
            let run_start = i;
            let mut widest = 0;
            while let Some(Some(w)) = widths.get(i) {
                widest = widest.max(*w);
                i += 1;
            }
            aligns[run_start..i].fill(widest);
        }
        aligns
    }

    fn aligned_key_width(&self, id: NodeId) -> Option<usize> {
        let NodeKind::Element {
            name,
            attributes,
            namespaces,
        } = self.doc.kind(id)
        else {
            return None;
        };
        if !attributes.is_empty() || !namespaces.is_empty() {
            return None;
        }
        let value = self.single_value(id)?;
        let single_line = match value {
            SingleValue::Text(text) => {
                is_bare_value(text)
                    || (!text.contains(['\n', '\r']) && quote_text(text, 0, true).is_some())
            }
            SingleValue::Entity(_) => true,
        };
        single_line.then(|| name.to_string().chars().count())
    }

    /// The lone text or entity child of an element, if that is all it has.
    fn single_value(&self, id: NodeId) -> Option<SingleValue<'d>> {
        let doc = self.doc;
        match doc.children(id) {
            [only] => match doc.kind(*only) {
                NodeKind::Text(text) => Some(SingleValue::Text(text)),
                NodeKind::Entity(name) => Some(SingleValue::Entity(name)),
                _ => None,
            },
            _ => None,
        }
    }

    fn print_node(&mut self, id: NodeId, indent: usize, align: usize) {
        let doc = self.doc;
        match doc.kind(id) {
            NodeKind::Document => self.print_nodes(doc.children(id), indent),
            NodeKind::Element { .. } => self.print_element(id, indent, align),
            NodeKind::Text(text) => self.print_body_text(text),
            NodeKind::Comment(text) => self.print_comment(text),
            NodeKind::Entity(name) => self.token(&format!("&{name};")),
            NodeKind::ProcessingInstruction { target, data } => {
                self.print_special(&format!("?{target}"), data)
            }
            NodeKind::DocType(content) => self.print_special("!DOCTYPE", content),
        }
    }

    fn print_equals(&mut self) {
        if self.compact {
            self.write("=");
        } else {
            self.write(" = ");
        }
        self.after_equals = true;
    }

    fn print_special(&mut self, key: &str, value: &str) {
        self.token(key);
        self.print_equals();
        let token = value_token(value, self.col, self.compact)
            .unwrap_or_else(|| lossy_quote(value, self.col));
        self.token(&token);
    }

    fn print_element(&mut self, id: NodeId, indent: usize, align: usize) {
        let doc = self.doc;
        let NodeKind::Element {
            name,
            attributes,
            namespaces,
        } = doc.kind(id)
        else {
            return;
        };
        let name = name.to_string();
        let name_start = self.col;
        self.token(&name);

        let has_attributes = !attributes.is_empty() || !namespaces.is_empty();
        if has_attributes {
            self.print_attributes(id);
        }

        let children = doc.children(id);
        if children.is_empty() {
            return;
        }

        if let Some(value) = self.single_value(id) {
            let token = match value {
                SingleValue::Entity(name) => Some(format!("&{name};")),
                SingleValue::Text(text) => {
                    let value_col = if self.compact {
                        self.col + 1
                    } else {
                        name_start + align.max(self.col.saturating_sub(name_start)) + 3
                    };
                    value_token(text, value_col, self.compact)
                }
            };
            if let Some(token) = token {
                if !self.compact {
                    let width = self.col.saturating_sub(name_start);
                    if !has_attributes && width < align {
                        self.spaces(align - width);
                    }
                }
                self.print_equals();
                self.token(&token);
                return;
            }
        }

        if self.compact {
            self.write("{");
            self.print_nodes(children, 0);
            self.write("}");
        } else {
            self.write(" {");
            self.print_nodes(children, indent + self.indent_step);
            self.start_line(indent);
            self.write("}");
        }
    }

    fn print_attributes(&mut self, id: NodeId) {
        let doc = self.doc;
        let entries: Vec<(String, Option<&str>)> = doc
            .attributes(id)
            .iter()
            .map(|attr| (attr.name.to_string(), attr.value.as_deref()))
            .chain(doc.namespaces(id).iter().map(namespace_entry))
            .collect();
        let widest = entries
            .iter()
            .filter(|(_, value)| value.is_some())
            .map(|(key, _)| key.chars().count())
            .max()
            .unwrap_or(0);

        self.write("(");
        let column = self.col;
        for (i, (key, value)) in entries.iter().enumerate() {
            if i > 0 && !self.compact {
                self.write("\n");
                self.spaces(column);
            }
            self.token(key);
            let Some(value) = value else {
                continue;
            };
            if !self.compact {
                self.spaces(widest - key.chars().count());
            }
            self.print_equals();
            let token = value_token(value, self.col, self.compact)
                .unwrap_or_else(|| lossy_quote(value, self.col));
            self.token(&token);
        }
        self.write(")");
    }

    fn print_body_text(&mut self, text: &str) {
        if text.is_empty() {
            self.token("''");
            return;
        }
        match quote_text(text, self.col, self.compact) {
            Some(quoted) => self.token(&quoted),
            None => {
                for segment in text_segments(text) {
                    self.token(&segment);
                }
            }
        }
    }

    fn print_comment(&mut self, text: &str) {
        if !self.compact && !text.contains(['\n', '\r']) {
            let line = if text.is_empty() {
                "//".to_string()
            } else {
                format!("// {text}")
            };
            if comment_text(&line, false) == text {
                self.token(&line);
                return;
            }
        }
        let (open, close) = block_delimiters(text);
        if self.compact {
            self.print_compact_comment(text, &open, &close);
            return;
        }
        let col = self.col;
        let aligned = format!(
            "{open} {} {close}",
            indent_lines(text, col + open.len() + 1, false)
        );
        let candidate = if comment_text(&aligned, false) == text {
            aligned
        } else {
            let block = format!(
                "{open}\n{}\n{} {close}",
                indent_lines(text, col, true),
                " ".repeat(col)
            );
            if comment_text(&block, false) == text {
                block
            } else {
                // Carriage returns and space-only edge lines do not survive
                // indentation removal.
                tracing::warn!(comment = text, "Comment cannot be printed losslessly");
                aligned
            }
        };
        self.token(&candidate);
        self.after_comment = true;
    }

    /// A block comment on one line: each line of `text` after the first
    /// goes into a continuation (`/* one */* two */`).
    fn print_compact_comment(&mut self, text: &str, open: &str, close: &str) {
        let mut out = String::new();
        let mut read_back = Vec::new();
        for (i, line) in text.split('\n').enumerate() {
            let piece = if i == 0 {
                format!("{open} {line} {close}")
            } else {
                format!("* {line} {close}")
            };
            read_back.push(comment_text(&piece, false));
            out.push_str(&piece);
        }
        if read_back.join("\n") != text {
            tracing::warn!(comment = text, "Comment cannot be printed losslessly");
        }
        self.token(&out);
        self.after_comment = true;
    }
}

#[derive(Debug, Clone, Copy)]
enum SingleValue<'d> {
    Text(&'d str),
    Entity(&'d str),
}

fn namespace_entry(decl: &NamespaceDecl) -> (String, Option<&str>) {
    let key = match &decl.prefix {
        Some(prefix) => format!("xmlns:{prefix}"),
        None => "xmlns".to_string(),
    };
    (key, decl.uri.as_deref())
}

/// A single token for `text` in value position at column `col`.
fn value_token(text: &str, col: usize, compact: bool) -> Option<String> {
    if text.is_empty() {
        return Some("''".to_string());
    }
    if is_bare_value(text) {
        return Some(text.to_string());
    }
    if let Some(quoted) = quote_text(text, col, compact) {
        return Some(quoted);
    }
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(char_entity(c)),
        _ => None,
    }
}

/// A quote that may not read back exactly, for positions that accept only
/// one token.
fn lossy_quote(text: &str, col: usize) -> String {
    tracing::warn!(value = text, "Value cannot be printed losslessly");
    if let Some(block) = ['\'', '"']
        .iter()
        .find_map(|&q| quote_with(text, q, QuoteLayout::Block, col))
    {
        return block;
    }
    let q = if text.starts_with('\'') || text.ends_with('\'') {
        '"'
    } else {
        '\''
    };
    let delimiter: String = std::iter::repeat_n(q, quote_depth(text, q)).collect();
    format!("{delimiter}{text}{delimiter}")
}

/// Split body text at its line breaks into quotes and character entities.
fn text_segments(text: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut piece = String::new();
    for c in text.chars() {
        if matches!(c, '\n' | '\r') {
            quote_piece(&piece, &mut segments);
            piece.clear();
            segments.push(char_entity(c));
        } else {
            piece.push(c);
        }
    }
    quote_piece(&piece, &mut segments);
    segments
}

/// Quote a line of text. A line no quote can carry gives up its first
/// character as an entity.
fn quote_piece(mut piece: &str, segments: &mut Vec<String>) {
    while let Some(first) = piece.chars().next() {
        if let Some(quoted) = ['\'', '"']
            .iter()
            .find_map(|&q| quote_with(piece, q, QuoteLayout::Inline, 0))
        {
            segments.push(quoted);
            return;
        }
        segments.push(char_entity(first));
        piece = &piece[first.len_utf8()..];
    }
}
