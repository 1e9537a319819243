//! The minification passes and their fixed ordering.

use std::sync::LazyLock;

use fancy_regex::{Captures, Regex};

use crate::error::WringError;
use crate::pattern::{self, IN_TAG, OUTSIDE_QUOTES, ScopedPattern};
use crate::replace::{Replacement, rewrite};
use crate::{Options, doctype, namespace};

/// Apply every enabled pass, in the documented order. Whitespace between
/// tags goes before empty-element collapsing (which needs directly adjacent
/// open/close pairs), and the standalone check runs before the DOCTYPE is
/// rewritten.
pub(crate) fn run(xml: &str, options: &Options) -> Result<String, WringError> {
    let cdata = options.ignore_cdata;
    let keep_preserved = options.consider_preserve_whitespace;
    let mut doc = xml.to_string();

    if options.remove_comments {
        doc = rewrite(&doc, &COMMENTS, &Replacement::Literal(""), cdata)?;
    }

    if let Some(strict) = options.remove_whitespace_between_tags.enabled() {
        let re = BETWEEN_TAGS.get(strict, keep_preserved);
        doc = rewrite(&doc, re, &Replacement::Literal(""), cdata)?;
    }

    if options.remove_schema_location_attributes {
        doc = rewrite(&doc, &SCHEMA_LOCATION, &Replacement::Literal(""), cdata)?;
    }

    if options.collapse_whitespace_in_tags {
        doc = rewrite(&doc, &TAG_WS_RUNS, &Replacement::Literal(" "), cdata)?;
        doc = rewrite(&doc, &TAG_EQUALS, &Replacement::Literal("="), cdata)?;
        doc = rewrite(&doc, &TAG_END_WS, &Replacement::Literal(""), cdata)?;
    }

    if options.collapse_empty_elements {
        let collapse = |caps: &Captures<str>| -> String {
            format!(
                "<{}{}/>",
                caps.get(1).map_or("", |m| m.as_str()),
                caps.get(2).map_or("", |m| m.as_str())
            )
        };
        doc = rewrite(&doc, &EMPTY_ELEMENT, &Replacement::Compute(&collapse), cdata)?;
    }

    if let Some(strict) = options.trim_whitespace_from_texts.enabled() {
        let leading = TEXT_LEADING.get(strict, keep_preserved);
        doc = rewrite(&doc, leading, &Replacement::Literal(""), cdata)?;
        let trailing = TEXT_TRAILING.get(strict, keep_preserved);
        doc = rewrite(&doc, trailing, &Replacement::Literal(""), cdata)?;
    }

    if let Some(strict) = options.collapse_whitespace_in_texts.enabled() {
        let runs = TEXT_RUNS.get(strict, keep_preserved);
        doc = rewrite(&doc, runs, &Replacement::Literal(" "), cdata)?;
    }

    if options.remove_unnecessary_standalone_declaration {
        doc = doctype::remove_unnecessary_standalone(&doc, cdata)?;
    }

    if options.collapse_whitespace_in_prolog {
        doc = doctype::collapse_prolog(&doc, cdata)?;
    }

    if options.collapse_whitespace_in_doc_type {
        doc = doctype::collapse_doctype(&doc, cdata)?;
    }

    doc = namespace::apply(&doc, options)?;

    Ok(doc)
}

static COMMENTS: LazyLock<Regex> = LazyLock::new(|| pattern::compile(pattern::COMMENT));

/// Whitespace-only text between a bracket close and the next tag open.
static BETWEEN_TAGS: ScopedPattern = ScopedPattern::new(|strict, keep_preserved| {
    format!(
        r"(?<={})\s+(?={})",
        pattern::text_behind(strict, keep_preserved),
        pattern::tag_ahead(strict)
    )
});

/// Leading whitespace of a text node.
static TEXT_LEADING: ScopedPattern = ScopedPattern::new(|strict, keep_preserved| {
    format!(r"(?<={})\s+", pattern::text_behind(strict, keep_preserved))
});

/// Trailing whitespace of a text node.
static TEXT_TRAILING: ScopedPattern = ScopedPattern::new(|strict, keep_preserved| {
    format!(
        r"(?<={}[^<]*)\s+(?={})",
        pattern::text_behind(strict, keep_preserved),
        pattern::tag_ahead(strict)
    )
});

/// Whitespace runs anywhere inside a text node.
static TEXT_RUNS: ScopedPattern = ScopedPattern::new(|strict, keep_preserved| {
    format!(r"(?<={}[^<]*)\s+", pattern::text_behind(strict, keep_preserved))
});

static TAG_WS_RUNS: LazyLock<Regex> =
    LazyLock::new(|| pattern::compile(&IN_TAG.scope("", &format!(r"\s+{OUTSIDE_QUOTES}"))));

static TAG_EQUALS: LazyLock<Regex> =
    LazyLock::new(|| pattern::compile(&IN_TAG.scope("", &format!(r"\s*=\s*{OUTSIDE_QUOTES}"))));

static TAG_END_WS: LazyLock<Regex> =
    LazyLock::new(|| pattern::compile(&IN_TAG.scope("", &format!(r"\s+(?=/?>){OUTSIDE_QUOTES}"))));

/// A directly adjacent open/close pair of the same name, attributes kept.
static EMPTY_ELEMENT: LazyLock<Regex> =
    LazyLock::new(|| pattern::compile(r"<([^\s<>/!?]+)([^<>]*?)\s*></\1\s*>"));

static SCHEMA_LOCATION: LazyLock<Regex> = LazyLock::new(|| {
    pattern::compile(&IN_TAG.scope(
        "",
        &format!(
            r#"\s+xsi:(?:schemaLocation|noNamespaceSchemaLocation)\s*=\s*(?:"[^"]*"|'[^']*'){OUTSIDE_QUOTES}"#
        ),
    ))
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TextScope;

    fn defaults() -> Options {
        Options::default()
    }

    #[test]
    fn collapses_tag_whitespace() {
        let out = run("<a  b = \"c\"   d='e'  />", &defaults()).unwrap();
        assert_eq!(out, "<a b=\"c\" d='e'/>");
    }

    #[test]
    fn leaves_attribute_values_alone() {
        let xml = r#"<a title="two  spaces and a = sign"/>"#;
        assert_eq!(run(xml, &defaults()).unwrap(), xml);
    }

    #[test]
    fn collapses_empty_elements_after_whitespace_removal() {
        let out = run("<a>\n  </a>", &defaults()).unwrap();
        assert_eq!(out, "<a/>");
    }

    #[test]
    fn empty_element_keeps_attributes() {
        let out = run(r#"<a b="c"></a>"#, &defaults()).unwrap();
        assert_eq!(out, r#"<a b="c"/>"#);
    }

    #[test]
    fn strict_mode_keeps_whitespace_after_prolog() {
        let mut options = defaults();
        options.remove_whitespace_between_tags = TextScope::Strict;
        let out = run("<?xml version=\"1.0\"?>\n<a/>", &options).unwrap();
        assert_eq!(out, "<?xml version=\"1.0\"?>\n<a/>");

        options.remove_whitespace_between_tags = TextScope::On;
        let out = run("<?xml version=\"1.0\"?>\n<a/>", &options).unwrap();
        assert_eq!(out, "<?xml version=\"1.0\"?><a/>");
    }

    #[test]
    fn trims_and_collapses_text_nodes() {
        let mut options = defaults();
        options.trim_whitespace_from_texts = TextScope::On;
        options.collapse_whitespace_in_texts = TextScope::On;
        let out = run("<a>  hello   world  </a>", &options).unwrap();
        assert_eq!(out, "<a>hello world</a>");
    }

    #[test]
    fn preserved_regions_keep_their_text() {
        let mut options = defaults();
        options.trim_whitespace_from_texts = TextScope::On;
        options.collapse_whitespace_in_texts = TextScope::On;
        let out = run("<r><pre>  a   b  </pre><x>  c  </x></r>", &options).unwrap();
        assert_eq!(out, "<r><pre>  a   b  </pre><x>c</x></r>");
    }

    #[test]
    fn schema_location_attributes_go_when_asked() {
        let mut options = defaults();
        options.remove_schema_location_attributes = true;
        let xml = r#"<a xmlns:xsi="urn:xsi" xsi:schemaLocation="urn x.xsd"><b/></a>"#;
        let out = run(xml, &options).unwrap();
        assert_eq!(out, "<a><b/></a>");
    }
}
