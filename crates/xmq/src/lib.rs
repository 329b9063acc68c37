/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Parser and printer for xmq, a brace-and-equals notation for XML trees.
//!
//! xmq writes the same tree as XML with fewer delimiters: key-value
//! elements use `=`, children go in `{ }`, attributes in `( )`, and text is
//! quoted only where it has to be.
//!
//! # Overview
//!
//! - [`tokenize`] runs the lexer and reports every token to a [`TokenSink`]
//! - [`parse`] and [`parse_file`] build a [`Document`] tree
//! - [`render`] prints a tree back as xmq, plain or compact
//! - [`to_xml`] and [`from_xml`] convert between the tree and XML text
//!
//! # Example
//!
//! ```rust
//! use xmq::{ParseOptions, RenderOptions, parse, render};
//!
//! let doc = parse(
//!     "config { speed = 123 name = 'John Doe' }",
//!     "config.xmq",
//!     &ParseOptions::default(),
//! )
//! .unwrap();
//!
//! let config = doc.root_element().unwrap();
//! assert_eq!(doc.child_elements(config, "speed").count(), 1);
//!
//! assert_eq!(
//!     render(&doc, &RenderOptions::default()),
//!     "config {\n    speed = 123\n    name  = 'John Doe'\n}\n"
//! );
//! ```
//!
//! # Errors
//!
//! A parse error carries its location and the offending source line, and
//! renders like a compiler diagnostic:
//!
//! ```rust
//! use xmq::{ParseErrorKind, ParseOptions, parse};
//!
//! let err = parse("a = 'open", "a.xmq", &ParseOptions::default()).unwrap_err();
//! assert_eq!(err.kind, ParseErrorKind::QuoteNotClosed);
//! assert_eq!((err.line, err.col), (1, 5));
//! ```

pub mod builder;
pub mod comment;
pub mod detect;
pub mod entity;
pub mod error;
pub mod lexer;
pub mod options;
pub mod printer;
pub mod quote;
pub mod scanner;
pub mod token;
pub mod tree;
pub mod xml;

pub use builder::{TreeBuilder, parse, parse_file};
pub use detect::{ContentType, detect_content_type};
pub use error::{ParseError, ParseErrorKind, Result, XmlError};
pub use lexer::{tokenize, tokenize_with_limit};
pub use options::{DEFAULT_MAX_DEPTH, ParseOptions, RenderOptions};
pub use printer::render;
pub use scanner::Position;
pub use token::{Token, TokenDump, TokenKind, TokenSink};
pub use tree::{Attribute, Document, NamespaceDecl, NodeData, NodeId, NodeKind, QName};
pub use xml::{from_xml, to_xml};
