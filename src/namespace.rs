//! Namespace prefix analysis: unused-declaration removal, default-namespace
//! removal and prefix shortening.
//!
//! Usage detection is document-wide, not subtree-scoped: a prefix used in
//! one branch keeps every declaration of it alive, including redundant ones
//! elsewhere. This mirrors the documented behavior of the transformation and
//! is deliberately not "fixed", since fixing it changes output on existing
//! inputs.

use std::collections::{HashSet, VecDeque};
use std::sync::LazyLock;

use fancy_regex::Regex;

use crate::Options;
use crate::error::WringError;
use crate::pattern::{self, IN_TAG, OUTSIDE_QUOTES};
use crate::replace::{Replacement, capture_all, rewrite};

/// Schema-instance prefix, reserved by convention; never renamed.
const RESERVED: &str = "xsi";

const FIRST_CHARS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz_";
const NEXT_CHARS: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz_0123456789-.";

static DECLARATIONS: LazyLock<Regex> = LazyLock::new(|| {
    pattern::compile(&IN_TAG.scope(
        r"\s",
        r#"xmlns:([A-Za-z_][\w.\-]*)\s*=\s*(?:"[^"]*"|'[^']*')"#,
    ))
});

static ELEMENT_PREFIXES: LazyLock<Regex> =
    LazyLock::new(|| pattern::compile(r"</?([A-Za-z_][\w.\-]*):"));

static ATTRIBUTE_PREFIXES: LazyLock<Regex> = LazyLock::new(|| {
    pattern::compile(&IN_TAG.scope(r"\s", r"([A-Za-z_][\w.\-]*):[A-Za-z_][\w.\-]*\s*="))
});

static UNPREFIXED_ELEMENT: LazyLock<Regex> =
    LazyLock::new(|| pattern::compile(r"</?[A-Za-z_][\w.\-]*(?=[\s/>])"));

static DEFAULT_DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    pattern::compile(&IN_TAG.scope(
        "",
        &format!(r#"\s+xmlns\s*=\s*(?:"[^"]*"|'[^']*'){OUTSIDE_QUOTES}"#),
    ))
});

/// Declared prefixes in order of first appearance, plus the set of names
/// considered taken when picking replacements.
struct NamespaceTable {
    declared: Vec<String>,
    known: HashSet<String>,
}

impl NamespaceTable {
    fn scan(xml: &str) -> Result<Self, WringError> {
        let mut declared = Vec::new();
        let mut seen = HashSet::new();
        for prefix in capture_all(xml, &DECLARATIONS, 1)? {
            if seen.insert(prefix.clone()) {
                declared.push(prefix);
            }
        }
        let mut known = seen;
        known.insert(RESERVED.to_string());
        Ok(Self { declared, known })
    }
}

/// Prefixes referenced by element or attribute names anywhere in the
/// document. The `xmlns` token itself does not count as usage.
fn used_prefixes(xml: &str) -> Result<HashSet<String>, WringError> {
    let mut used: HashSet<String> =
        capture_all(xml, &ELEMENT_PREFIXES, 1)?.into_iter().collect();
    for prefix in capture_all(xml, &ATTRIBUTE_PREFIXES, 1)? {
        if prefix != "xmlns" {
            used.insert(prefix);
        }
    }
    Ok(used)
}

pub(crate) fn apply(xml: &str, options: &Options) -> Result<String, WringError> {
    let cdata = options.ignore_cdata;
    let mut doc = xml.to_string();
    if options.remove_unused_namespaces {
        doc = remove_unused(&doc, cdata)?;
    }
    if options.remove_unused_default_namespace {
        doc = remove_unused_default(&doc, cdata)?;
    }
    if options.shorten_namespaces {
        doc = shorten(&doc, cdata)?;
    }
    Ok(doc)
}

fn remove_unused(xml: &str, cdata: bool) -> Result<String, WringError> {
    let table = NamespaceTable::scan(xml)?;
    let used = used_prefixes(xml)?;
    let mut doc = xml.to_string();
    for prefix in &table.declared {
        if !used.contains(prefix) {
            let re = declaration_of(prefix)?;
            doc = rewrite(&doc, &re, &Replacement::Literal(""), cdata)?;
        }
    }
    Ok(doc)
}

/// The `xmlns:prefix="…"` declaration for one specific prefix, leading
/// whitespace included. Compiled per prefix, since the name is only known at
/// run time.
fn declaration_of(prefix: &str) -> Result<Regex, WringError> {
    let pattern = IN_TAG.scope(
        "",
        &format!(
            r#"\s+xmlns:{}\s*=\s*(?:"[^"]*"|'[^']*'){OUTSIDE_QUOTES}"#,
            escape(prefix)
        ),
    );
    Regex::new(&pattern).map_err(WringError::from)
}

/// The default `xmlns="…"` only matters for elements without a prefix; when
/// every element in the document carries one, the declaration can go.
fn remove_unused_default(xml: &str, cdata: bool) -> Result<String, WringError> {
    if UNPREFIXED_ELEMENT.is_match(xml)? {
        return Ok(xml.to_string());
    }
    rewrite(xml, &DEFAULT_DECLARATION, &Replacement::Literal(""), cdata)
}

fn shorten(xml: &str, cdata: bool) -> Result<String, WringError> {
    let table = NamespaceTable::scan(xml)?;
    let mut taken = table.known;
    let mut doc = xml.to_string();
    for prefix in &table.declared {
        if prefix.as_str() == RESERVED || prefix.len() == 1 {
            continue;
        }
        let first = prefix[..1].to_string();
        let short = if !taken.contains(&first) {
            first
        } else {
            shortest_free(&taken)
        };
        // Only a strictly shorter name is worth a rename; this also keeps
        // the pass idempotent once the short names are exhausted.
        if short.len() >= prefix.len() {
            continue;
        }
        doc = rename(&doc, prefix, &short, cdata)?;
        taken.insert(short);
    }
    Ok(doc)
}

/// Breadth-first over the identifier alphabet: all one-character names in
/// order, then two characters, and so on. Iterative on purpose, so documents
/// with very many namespaces cannot recurse deeply.
fn shortest_free(taken: &HashSet<String>) -> String {
    let mut queue: VecDeque<String> = FIRST_CHARS.chars().map(String::from).collect();
    while let Some(candidate) = queue.pop_front() {
        if !taken.contains(&candidate) {
            return candidate;
        }
        for next in NEXT_CHARS.chars() {
            let mut longer = candidate.clone();
            longer.push(next);
            queue.push_back(longer);
        }
    }
    unreachable!("identifier space is unbounded")
}

/// Rename one prefix everywhere it is structural: element open/close tags,
/// attribute names and the declaration itself. Each site is scoped so text
/// content is never touched.
fn rename(xml: &str, prefix: &str, short: &str, cdata: bool) -> Result<String, WringError> {
    let escaped = escape(prefix);
    let in_names = Regex::new(&format!(r"(?<=</?){escaped}(?=:)"))?;
    let in_attributes = Regex::new(&IN_TAG.scope(
        r"\s",
        &format!(r"{escaped}(?=:[A-Za-z_][\w.\-]*\s*=){OUTSIDE_QUOTES}"),
    ))?;
    let in_declaration = Regex::new(&IN_TAG.scope(
        r"\s",
        &format!(r"xmlns:{escaped}(?=\s*=){OUTSIDE_QUOTES}"),
    ))?;

    let mut doc = rewrite(xml, &in_names, &Replacement::Literal(short), cdata)?;
    doc = rewrite(&doc, &in_attributes, &Replacement::Literal(short), cdata)?;
    let declaration = format!("xmlns:{short}");
    doc = rewrite(&doc, &in_declaration, &Replacement::Literal(&declaration), cdata)?;
    Ok(doc)
}

fn escape(prefix: &str) -> String {
    let mut out = String::with_capacity(prefix.len());
    for c in prefix.chars() {
        if !c.is_ascii_alphanumeric() && c != '_' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_on() -> Options {
        Options::default()
    }

    #[test]
    fn declarations_scan_in_document_order() {
        let xml = r#"<a xmlns:b="urn:b" xmlns:c="urn:c"><d xmlns:b="urn:b2"/></a>"#;
        let table = NamespaceTable::scan(xml).unwrap();
        assert_eq!(table.declared, ["b", "c"]);
        assert!(table.known.contains("xsi"));
    }

    #[test]
    fn unused_prefix_declaration_is_removed() {
        let out = apply("<a xmlns:foo='urn:x'><b/></a>", &all_on()).unwrap();
        assert_eq!(out, "<a><b/></a>");
    }

    #[test]
    fn used_prefix_declaration_stays() {
        let xml = r#"<a xmlns:f="urn:x"><f:b/></a>"#;
        assert_eq!(apply(xml, &all_on()).unwrap(), xml);
    }

    #[test]
    fn attribute_usage_counts() {
        let xml = r#"<a xmlns:f="urn:x" f:kind="y"/>"#;
        assert_eq!(apply(xml, &all_on()).unwrap(), xml);
    }

    #[test]
    fn prefixes_shorten_to_their_first_character() {
        let out = apply(
            "<a xmlns:alpha='urn:x'><alpha:b alpha:c='1'/></a>",
            &all_on(),
        )
        .unwrap();
        assert_eq!(out, "<a xmlns:a='urn:x'><a:b a:c='1'/></a>");
    }

    #[test]
    fn colliding_first_characters_fall_back_to_the_search() {
        let xml = "<r xmlns:apple='urn:1' xmlns:avocado='urn:2'><apple:x/><avocado:y/></r>";
        let out = apply(xml, &all_on()).unwrap();
        assert_eq!(out, "<r xmlns:a='urn:1' xmlns:A='urn:2'><a:x/><A:y/></r>");
    }

    #[test]
    fn xsi_is_never_renamed() {
        let xml = r#"<a xmlns:xsi="urn:xsi" xsi:nil="true"/>"#;
        assert_eq!(apply(xml, &all_on()).unwrap(), xml);
    }

    #[test]
    fn default_namespace_goes_when_every_element_is_prefixed() {
        let xml = r#"<x:a xmlns="urn:d" xmlns:x="urn:x"><x:b/></x:a>"#;
        let out = apply(xml, &all_on()).unwrap();
        assert_eq!(out, r#"<x:a xmlns:x="urn:x"><x:b/></x:a>"#);
    }

    #[test]
    fn default_namespace_stays_with_unprefixed_elements() {
        let xml = r#"<a xmlns="urn:d"><b/></a>"#;
        assert_eq!(apply(xml, &all_on()).unwrap(), xml);
    }

    #[test]
    fn shortest_free_walks_lengths_in_order() {
        let mut taken = HashSet::new();
        assert_eq!(shortest_free(&taken), "A");
        taken.insert("A".to_string());
        assert_eq!(shortest_free(&taken), "B");
        for c in FIRST_CHARS.chars() {
            taken.insert(c.to_string());
        }
        assert_eq!(shortest_free(&taken), "AA");
    }
}
