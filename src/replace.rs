//! Context-scoped find/replace over the document text.
//!
//! Patterns arrive here already scoped by a look-behind from the pattern
//! library; this module runs them and splices replacements into a fresh
//! string, consulting the CDATA guard per match.

use fancy_regex::{Captures, Regex};

use crate::cdata::CdataSpans;
use crate::error::WringError;

/// A replacement value: literal text, or a function of the captures for
/// context-sensitive substitutions.
pub(crate) enum Replacement<'a> {
    Literal(&'a str),
    Compute(&'a dyn Fn(&Captures<str>) -> String),
}

/// Replace every match of `re`, skipping matches whose offset the CDATA
/// guard masks. Each pass works on an immutable input and returns a new
/// document.
pub(crate) fn rewrite(
    xml: &str,
    re: &Regex,
    replacement: &Replacement,
    guard_cdata: bool,
) -> Result<String, WringError> {
    let spans = if guard_cdata { CdataSpans::scan(xml) } else { None };
    let mut out = String::with_capacity(xml.len());
    let mut last = 0;
    for caps in re.captures_iter(xml) {
        let caps = caps?;
        let m = caps.get(0).expect("whole-match group");
        out.push_str(&xml[last..m.start()]);
        if spans.as_ref().is_some_and(|s| s.masks(m.start())) {
            out.push_str(m.as_str());
        } else {
            match replacement {
                Replacement::Literal(text) => out.push_str(text),
                Replacement::Compute(compute) => out.push_str(&compute(&caps)),
            }
        }
        last = m.end();
    }
    out.push_str(&xml[last..]);
    Ok(out)
}

/// Collect one capture group from every match.
pub(crate) fn capture_all(
    xml: &str,
    re: &Regex,
    group: usize,
) -> Result<Vec<String>, WringError> {
    let mut found = Vec::new();
    for caps in re.captures_iter(xml) {
        let caps = caps?;
        if let Some(m) = caps.get(group) {
            found.push(m.as_str().to_string());
        }
    }
    Ok(found)
}
