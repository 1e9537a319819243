//! wring - an XML minifier
//!
//! wring shrinks an XML document while preserving its meaning. It never
//! builds a DOM or token stream: structural context ("inside a tag",
//! "between tags", "inside the prolog") is encoded as zero-width look-behind
//! assertions assembled once from shared pattern fragments, so no rewrite
//! can cross a construct boundary.
//!
//! Input is assumed to be well-formed XML; nothing is validated, and
//! malformed input gets best-effort treatment.

mod cdata;
mod doctype;
mod error;
mod namespace;
mod passes;
mod pattern;
mod replace;

pub use error::*;

use std::str::FromStr;

/// Minify an XML string with default settings.
pub fn minify(xml: &str) -> Result<String, WringError> {
    minify_with_options(xml, &Options::default())
}

/// Minify an XML string with custom options.
pub fn minify_with_options(xml: &str, options: &Options) -> Result<String, WringError> {
    passes::run(xml, options)
}

/// Tri-state switch for the whitespace passes that operate on text between
/// tags.
///
/// `Strict` refuses to treat the prolog, DOCTYPE and comments as tag-like
/// brackets when scoping the operation, so their surroundings keep their
/// whitespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextScope {
    Off,
    On,
    Strict,
}

impl TextScope {
    /// `Some(strict)` when the pass should run at all.
    pub fn enabled(self) -> Option<bool> {
        match self {
            TextScope::Off => None,
            TextScope::On => Some(false),
            TextScope::Strict => Some(true),
        }
    }
}

impl From<bool> for TextScope {
    fn from(enabled: bool) -> Self {
        if enabled { TextScope::On } else { TextScope::Off }
    }
}

impl FromStr for TextScope {
    type Err = WringError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "true" | "on" => Ok(TextScope::On),
            "false" | "off" => Ok(TextScope::Off),
            "strict" => Ok(TextScope::Strict),
            other => Err(WringError::InvalidOption(format!(
                "expected true, false or strict, got {other:?}"
            ))),
        }
    }
}

/// Minification options.
#[derive(Debug, Clone)]
pub struct Options {
    /// Strip `<!-- … -->` comments
    pub remove_comments: bool,
    /// Strip whitespace-only text between tags
    pub remove_whitespace_between_tags: TextScope,
    /// Exempt `<pre>`/`xml:space="preserve"` content from text whitespace rules
    pub consider_preserve_whitespace: bool,
    /// Collapse and trim whitespace around attributes inside tags
    pub collapse_whitespace_in_tags: bool,
    /// Rewrite `<a></a>` to `<a/>`
    pub collapse_empty_elements: bool,
    /// Trim leading/trailing whitespace in text nodes
    pub trim_whitespace_from_texts: TextScope,
    /// Collapse whitespace runs in text nodes to one space
    pub collapse_whitespace_in_texts: TextScope,
    /// Collapse whitespace in the `<?xml …?>` declaration
    pub collapse_whitespace_in_prolog: bool,
    /// Collapse whitespace in `<!DOCTYPE …>`
    pub collapse_whitespace_in_doc_type: bool,
    /// Strip `xsi:schemaLocation`/`xsi:noNamespaceSchemaLocation` attributes
    pub remove_schema_location_attributes: bool,
    /// Remove `standalone="…"` from the prolog when provably without effect
    pub remove_unnecessary_standalone_declaration: bool,
    /// Remove namespace declarations whose prefix is never used
    pub remove_unused_namespaces: bool,
    /// Remove a default `xmlns="…"` when every element carries a prefix
    pub remove_unused_default_namespace: bool,
    /// Rename namespace prefixes to the shortest free identifiers
    pub shorten_namespaces: bool,
    /// Keep every rewrite out of `<![CDATA[ … ]]>` interiors
    pub ignore_cdata: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            remove_comments: true,
            remove_whitespace_between_tags: TextScope::On,
            consider_preserve_whitespace: true,
            collapse_whitespace_in_tags: true,
            collapse_empty_elements: true,
            trim_whitespace_from_texts: TextScope::Off,
            collapse_whitespace_in_texts: TextScope::Off,
            collapse_whitespace_in_prolog: true,
            collapse_whitespace_in_doc_type: true,
            remove_schema_location_attributes: false,
            remove_unnecessary_standalone_declaration: true,
            remove_unused_namespaces: true,
            remove_unused_default_namespace: true,
            shorten_namespaces: true,
            ignore_cdata: true,
        }
    }
}

impl Options {
    /// Every transformation disabled; `minify` returns its input unchanged.
    pub fn none() -> Self {
        Self {
            remove_comments: false,
            remove_whitespace_between_tags: TextScope::Off,
            consider_preserve_whitespace: true,
            collapse_whitespace_in_tags: false,
            collapse_empty_elements: false,
            trim_whitespace_from_texts: TextScope::Off,
            collapse_whitespace_in_texts: TextScope::Off,
            collapse_whitespace_in_prolog: false,
            collapse_whitespace_in_doc_type: false,
            remove_schema_location_attributes: false,
            remove_unnecessary_standalone_declaration: false,
            remove_unused_namespaces: false,
            remove_unused_default_namespace: false,
            shorten_namespaces: false,
            ignore_cdata: false,
        }
    }
}
