//! Shared pattern fragments describing structural contexts of an XML
//! document.
//!
//! Every transformation in this crate scopes its rewrite by assembling a
//! zero-width look-behind from one of these fragments and splicing it ahead
//! of the sub-pattern being replaced. Fragments are plain string templates
//! with a single `{}` splice point for an extra look-behind condition; the
//! assembled patterns are compiled once and cached.

use std::sync::OnceLock;

use fancy_regex::Regex;

/// A whole `<!-- … -->` comment.
pub(crate) const COMMENT: &str = r"<!--(?s:.*?)-->";

/// A whole `<![CDATA[ … ]]>` section.
pub(crate) const CDATA_SECTION: &str = r"<!\[CDATA\[(?s:.*?)\]\]>";

/// A whole `<!DOCTYPE …>` declaration, internal subset included.
pub(crate) const DOCTYPE_DECL: &str = r"<!DOCTYPE[^\[<>]*(?:\[(?s:.*?)\])?[^<>]*>";

/// A whole `<? … ?>` processing instruction (the prolog included).
pub(crate) const PROC_INST: &str = r"<\?(?s:.*?)\?>";

/// A whole closing tag.
const CLOSE_TAG: &str = r"</[A-Za-z_][^<>]*>";

/// Asserts that the position is outside quoted attribute values: an even
/// number of quotes between here and the enclosing tag's `>`. Values holding
/// a raw `>` defeat the scan toward the conservative side (no match).
pub(crate) const OUTSIDE_QUOTES: &str =
    r#"(?=(?:[^"'<>]*(?:"[^"<]*"|'[^'<]*'))*[^"'<>]*/?>)"#;

/// A whole opening (or self-closing) tag. With `keep_preserved` the fragment
/// refuses tags that establish preserved whitespace, so that their direct
/// text content is never touched by a whitespace pass.
pub(crate) fn open_tag(keep_preserved: bool) -> String {
    if keep_preserved {
        concat!(
            r"<(?!pre[\s/>])",
            r#"(?![^<>]*\sxml:space\s*=\s*(?:"preserve"|'preserve'))"#,
            r"[A-Za-z_][^<>]*>",
        )
        .to_string()
    } else {
        r"<[A-Za-z_][^<>]*>".to_string()
    }
}

/// The construct a text node may directly follow. Non-strict mode treats any
/// bracketed construct as a tag boundary; strict mode admits genuine element
/// tags only. Enumerating the comment/CDATA/DOCTYPE/PI syntaxes keeps a `>`
/// inside those constructs from being mistaken for a tag close.
pub(crate) fn text_behind(strict: bool, keep_preserved: bool) -> String {
    let tags = format!("{}|{}", open_tag(keep_preserved), CLOSE_TAG);
    if strict {
        format!("(?:{tags})")
    } else {
        format!("(?:{tags}|{COMMENT}|{CDATA_SECTION}|{DOCTYPE_DECL}|{PROC_INST})")
    }
}

/// The `<` that opens the next tag after a text node. Strict mode excludes
/// prolog/PI/comment/DOCTYPE openings.
pub(crate) fn tag_ahead(strict: bool) -> &'static str {
    if strict { r"<[^?!]" } else { "<" }
}

/// A look-behind context with a single splice point for an extra condition.
#[derive(Clone, Copy)]
pub(crate) struct Context(&'static str);

/// Inside a tag, past `<` and the name's first character.
pub(crate) const IN_TAG: Context = Context(r"<[A-Za-z_/][^<>]*{}");

/// Inside the `<?xml …?>` prolog specifically. The optional tail keeps the
/// fragment from matching other targets that merely start with `xml`, such
/// as `<?xml-stylesheet …?>`.
pub(crate) const IN_PROLOG: Context = Context(r"<\?xml(?:[\s?][^<>?]*)?{}");

impl Context {
    /// Assemble `pattern` so it only matches inside this context, with
    /// `extra` spliced into the look-behind at the fragment's splice point.
    pub(crate) fn scope(&self, extra: &str, pattern: &str) -> String {
        format!("(?<={}){}", self.0.replace("{}", extra), pattern)
    }
}

/// Compile a pattern from this library. All inputs are static templates, so
/// a failure here is a programming error, not a runtime condition.
pub(crate) fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("pattern library regex")
}

/// A pattern parameterized over the strict/preserve axes, compiled lazily
/// once per variant.
pub(crate) struct ScopedPattern {
    build: fn(strict: bool, keep_preserved: bool) -> String,
    cells: [OnceLock<Regex>; 4],
}

impl ScopedPattern {
    pub(crate) const fn new(build: fn(bool, bool) -> String) -> Self {
        Self {
            build,
            cells: [const { OnceLock::new() }; 4],
        }
    }

    pub(crate) fn get(&self, strict: bool, keep_preserved: bool) -> &Regex {
        let cell = &self.cells[(strict as usize) << 1 | keep_preserved as usize];
        cell.get_or_init(|| compile(&(self.build)(strict, keep_preserved)))
    }
}
