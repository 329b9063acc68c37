/*
 * options.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Parse and render options.
//!
//! Both structs deserialize with every field optional, so they can be read
//! straight out of a configuration file section:
//!
//! ```rust
//! use xmq::RenderOptions;
//!
//! let opts: RenderOptions = serde_json::from_str(r#"{ "indent_width": 2 }"#).unwrap();
//! assert!(!opts.compact);
//! assert_eq!(opts.indent_width(), 2);
//! ```

use serde::Deserialize;

/// Nesting limit for `{ }` bodies when none is configured.
pub const DEFAULT_MAX_DEPTH: usize = 1_000;

/// Options controlling how xmq text becomes a tree.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Name of a synthetic root element wrapping bare top-level content.
    pub implicit_root: Option<String>,
    /// Keep quoted text exactly as written instead of removing incidental
    /// indentation.
    pub trim_none: bool,
    pub merge_adjacent_text: bool,
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            implicit_root: None,
            trim_none: false,
            merge_adjacent_text: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_implicit_root(mut self, name: impl Into<String>) -> Self {
        self.implicit_root = Some(name.into());
        self
    }

    pub fn with_trim_none(mut self, trim_none: bool) -> Self {
        self.trim_none = trim_none;
        self
    }

    pub fn with_merge_adjacent_text(mut self, merge: bool) -> Self {
        self.merge_adjacent_text = merge;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// The configured implicit root, treating an empty name as unset.
    pub fn implicit_root(&self) -> Option<&str> {
        self.implicit_root.as_deref().filter(|name| !name.is_empty())
    }
}

/// Options controlling how a tree is printed back to xmq.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Print everything on one logical line.
    pub compact: bool,
    /// Spaces per nesting level. Negative values are treated as 0.
    pub indent_width: i64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            compact: false,
            indent_width: 4,
        }
    }
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    pub fn with_indent_width(mut self, width: i64) -> Self {
        self.indent_width = width;
        self
    }

    /// The indentation step, clamped to be non-negative.
    pub fn indent_width(&self) -> usize {
        usize::try_from(self.indent_width).unwrap_or(0)
    }
}
