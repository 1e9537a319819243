//! Prolog and DOCTYPE handling: whitespace collapsing and the conservative
//! standalone-declaration removal.

use std::sync::LazyLock;

use fancy_regex::{Captures, Regex};

use crate::error::WringError;
use crate::pattern::{self, IN_PROLOG, OUTSIDE_QUOTES};
use crate::replace::{Replacement, rewrite};

static PROLOG_WS_RUNS: LazyLock<Regex> =
    LazyLock::new(|| pattern::compile(&IN_PROLOG.scope("", &format!(r"\s+{OUTSIDE_QUOTES}"))));

static PROLOG_EQUALS: LazyLock<Regex> =
    LazyLock::new(|| pattern::compile(&IN_PROLOG.scope("", &format!(r"\s*=\s*{OUTSIDE_QUOTES}"))));

static STANDALONE: LazyLock<Regex> = LazyLock::new(|| {
    pattern::compile(&IN_PROLOG.scope("", r#"\s+standalone\s*=\s*(?:"(?:yes|no)"|'(?:yes|no)')"#))
});

/// The whole DOCTYPE: name, optional external id (`SYSTEM`/`PUBLIC` plus one
/// or two quoted literals), optional bracketed internal subset.
static DOCTYPE: LazyLock<Regex> = LazyLock::new(|| {
    pattern::compile(concat!(
        r"<!DOCTYPE\s+([^\s<>\[\]]+)",
        r#"(?:\s+(SYSTEM|PUBLIC)\s+("[^"]*"|'[^']*')(?:\s+("[^"]*"|'[^']*'))?)?"#,
        r"(?:\s*\[((?s:.*?))\])?\s*>",
    ))
});

static PARAMETER_ENTITY: LazyLock<Regex> = LazyLock::new(|| pattern::compile(r"<!ENTITY\s+%"));

/// Collapse whitespace inside the `<?xml …?>` declaration, reusing the
/// generic tag collapser scoped to the prolog. Whitespace before the closing
/// `?>` is kept as a single space rather than removed.
pub(crate) fn collapse_prolog(xml: &str, cdata: bool) -> Result<String, WringError> {
    let doc = rewrite(xml, &PROLOG_WS_RUNS, &Replacement::Literal(" "), cdata)?;
    rewrite(&doc, &PROLOG_EQUALS, &Replacement::Literal("="), cdata)
}

/// Rebuild the DOCTYPE with single-space separators and a minified internal
/// subset.
pub(crate) fn collapse_doctype(xml: &str, cdata: bool) -> Result<String, WringError> {
    let rebuild = |caps: &Captures<str>| -> String {
        let mut out = String::from("<!DOCTYPE ");
        out.push_str(caps.get(1).map_or("", |m| m.as_str()));
        if let Some(kind) = caps.get(2) {
            out.push(' ');
            out.push_str(kind.as_str());
            for literal in [caps.get(3), caps.get(4)].into_iter().flatten() {
                out.push(' ');
                out.push_str(literal.as_str());
            }
        }
        if let Some(subset) = caps.get(5) {
            out.push('[');
            out.push_str(&minify_internal_subset(subset.as_str()));
            out.push(']');
        }
        out.push('>');
        out
    };
    rewrite(xml, &DOCTYPE, &Replacement::Compute(&rebuild), cdata)
}

/// Remove `standalone="yes|no"` from the prolog, but only when the
/// declaration provably has no effect: no DOCTYPE at all, or a DOCTYPE with
/// neither an external subset nor a parameter-entity declaration in its
/// internal subset. External subsets are never resolved, so this stays
/// deliberately conservative.
pub(crate) fn remove_unnecessary_standalone(xml: &str, cdata: bool) -> Result<String, WringError> {
    if !standalone_is_redundant(xml)? {
        return Ok(xml.to_string());
    }
    rewrite(xml, &STANDALONE, &Replacement::Literal(""), cdata)
}

fn standalone_is_redundant(xml: &str) -> Result<bool, WringError> {
    if !xml.contains("<!DOCTYPE") {
        return Ok(true);
    }
    // A DOCTYPE the structural pattern cannot read is kept untouched.
    let Some(caps) = DOCTYPE.captures(xml)? else {
        return Ok(false);
    };
    if caps.get(2).is_some() {
        return Ok(false);
    }
    let subset = caps.get(5).map_or("", |m| m.as_str());
    Ok(!PARAMETER_ENTITY.is_match(subset)?)
}

/// Simplified minification of the internal subset: comments are dropped,
/// whitespace collapses to single spaces, and the gaps directly between
/// declarations disappear.
fn minify_internal_subset(subset: &str) -> String {
    let mut text = String::with_capacity(subset.len());
    let mut rest = subset;
    while let Some(open) = rest.find("<!--") {
        text.push_str(&rest[..open]);
        match rest[open + 4..].find("-->") {
            Some(close) => rest = &rest[open + 4 + close + 3..],
            None => {
                rest = "";
                break;
            }
        }
    }
    text.push_str(rest);

    let mut out = String::with_capacity(text.len());
    let mut pending_ws = false;
    for c in text.chars() {
        if c.is_whitespace() {
            pending_ws = true;
            continue;
        }
        if pending_ws && !out.is_empty() && !(c == '<' && out.ends_with('>')) {
            out.push(' ');
        }
        pending_ws = false;
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subset_collapses_and_drops_comments() {
        let subset = " <!ELEMENT a  (#PCDATA)> \n <!-- note --> <!ELEMENT b (a)> ";
        assert_eq!(
            minify_internal_subset(subset),
            "<!ELEMENT a (#PCDATA)><!ELEMENT b (a)>"
        );
    }

    #[test]
    fn doctype_rebuilds_with_single_spaces() {
        let out = collapse_doctype("<!DOCTYPE  root  SYSTEM  \"r.dtd\" ><root/>", false).unwrap();
        assert_eq!(out, "<!DOCTYPE root SYSTEM \"r.dtd\"><root/>");
    }

    #[test]
    fn doctype_with_subset() {
        let xml = "<!DOCTYPE r [ <!ELEMENT r (#PCDATA)> ]><r/>";
        let out = collapse_doctype(xml, false).unwrap();
        assert_eq!(out, "<!DOCTYPE r[<!ELEMENT r (#PCDATA)>]><r/>");
    }

    #[test]
    fn standalone_goes_without_doctype() {
        let xml = "<?xml version=\"1.0\" standalone=\"yes\"?><a/>";
        let out = remove_unnecessary_standalone(xml, false).unwrap();
        assert_eq!(out, "<?xml version=\"1.0\"?><a/>");
    }

    #[test]
    fn standalone_stays_with_external_subset() {
        let xml = "<?xml version=\"1.0\" standalone=\"yes\"?><!DOCTYPE r SYSTEM \"r.dtd\"><r/>";
        assert_eq!(remove_unnecessary_standalone(xml, false).unwrap(), xml);
    }

    #[test]
    fn standalone_stays_with_parameter_entities() {
        let xml = concat!(
            "<?xml version=\"1.0\" standalone=\"no\"?>",
            "<!DOCTYPE r [ <!ENTITY % pe \"x\"> ]><r/>",
        );
        assert_eq!(remove_unnecessary_standalone(xml, false).unwrap(), xml);
    }

    #[test]
    fn standalone_goes_with_harmless_internal_subset() {
        let xml = concat!(
            "<?xml version=\"1.0\" standalone=\"yes\"?>",
            "<!DOCTYPE r [ <!ELEMENT r (#PCDATA)> ]><r/>",
        );
        let out = remove_unnecessary_standalone(xml, false).unwrap();
        assert_eq!(
            out,
            "<?xml version=\"1.0\"?><!DOCTYPE r [ <!ELEMENT r (#PCDATA)> ]><r/>"
        );
    }

    #[test]
    fn prolog_collapse_keeps_a_space_before_the_close() {
        let xml = "<?xml  version = \"1.0\" ?><a/>";
        let out = collapse_prolog(xml, false).unwrap();
        assert_eq!(out, "<?xml version=\"1.0\" ?><a/>");
    }
}
