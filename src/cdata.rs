//! Guard that keeps replacements out of CDATA interiors.

const OPEN: &str = "<![CDATA[";
const CLOSE: &str = "]]>";

/// Byte spans of the document that follow an opened but not yet closed
/// `<![CDATA[` marker. Computed once per document, then checked per match,
/// which matches scanning the prefix of every match for an unterminated
/// marker.
pub(crate) struct CdataSpans(Vec<(usize, usize)>);

impl CdataSpans {
    /// Returns `None` when the document contains no CDATA section at all,
    /// letting callers skip the guard entirely.
    pub(crate) fn scan(xml: &str) -> Option<Self> {
        if !xml.contains(OPEN) {
            return None;
        }
        let mut spans = Vec::new();
        let mut at = 0;
        while let Some(found) = xml[at..].find(OPEN) {
            let start = at + found + OPEN.len();
            // An unterminated section runs to the end of the document.
            let end = match xml[start..].find(CLOSE) {
                Some(close) => start + close + CLOSE.len(),
                None => xml.len(),
            };
            spans.push((start, end));
            at = end;
        }
        Some(Self(spans))
    }

    /// True when a match starting at `offset` sits inside a CDATA section,
    /// meaning its replacement must be suppressed.
    pub(crate) fn masks(&self, offset: usize) -> bool {
        self.0
            .binary_search_by(|&(start, end)| {
                if offset < start {
                    std::cmp::Ordering::Greater
                } else if offset >= end {
                    std::cmp::Ordering::Less
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_cdata_no_guard() {
        assert!(CdataSpans::scan("<a>text</a>").is_none());
    }

    #[test]
    fn masks_interior_offsets_only() {
        let xml = "<a><![CDATA[ <b>  </b> ]]><c>  </c></a>";
        let spans = CdataSpans::scan(xml).unwrap();
        let interior = xml.find("<b>").unwrap();
        let outside = xml.find("<c>").unwrap();
        assert!(spans.masks(interior));
        assert!(!spans.masks(outside));
        assert!(!spans.masks(0));
    }

    #[test]
    fn unterminated_section_masks_to_document_end() {
        let xml = "<a><![CDATA[ tail without close";
        let spans = CdataSpans::scan(xml).unwrap();
        assert!(spans.masks(xml.len() - 1));
    }

    #[test]
    fn closing_marker_ends_the_mask() {
        let xml = "<a><![CDATA[x]]>  <b/></a>";
        let spans = CdataSpans::scan(xml).unwrap();
        let after = xml.find("  <b/>").unwrap();
        assert!(!spans.masks(after));
    }
}
