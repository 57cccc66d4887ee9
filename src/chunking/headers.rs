//! The closed set of recognized legal section headers and the logic
//! that splits a judgment's full text by them.

use regex::Regex;
use std::sync::LazyLock;

/// Recognized legal section headers, in no particular priority order —
/// the first match wins at each scan position.
pub const RECOGNIZED_HEADERS: &[&str] = &[
    "Issue for Consideration",
    "Headnotes",
    "Held",
    "Facts",
    "Analysis",
    "Reasoning",
    "Judgment",
    "Order",
    "Keywords",
];

/// Section header attributed to text with no recognized header.
pub const IMPLICIT_BODY_HEADER: &str = "Body";

static HEADER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = RECOGNIZED_HEADERS.join("|");
    Regex::new(&format!(r"(?m)^\s*({alternation})\s*:?\s*$")).unwrap()
});

/// One section: the header that owns it, and its raw text span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section<'a> {
    pub header: &'a str,
    pub body: &'a str,
}

/// Splits `text` into sections owned by recognized headers. A header
/// match owns the text until the next header or end of document. Text
/// preceding the first recognized header (if any) is attributed to the
/// implicit "Body" section. A document with no recognized header
/// becomes a single "Body" section.
#[must_use]
pub fn split_by_headers(text: &str) -> Vec<Section<'_>> {
    let matches: Vec<_> = HEADER_PATTERN.captures_iter(text).collect();
    if matches.is_empty() {
        return vec![Section {
            header: IMPLICIT_BODY_HEADER,
            body: text,
        }];
    }

    let mut sections = Vec::new();
    let first_match_start = matches[0].get(0).unwrap().start();
    if first_match_start > 0 {
        let preamble = &text[..first_match_start];
        if !preamble.trim().is_empty() {
            sections.push(Section {
                header: IMPLICIT_BODY_HEADER,
                body: preamble,
            });
        }
    }

    for (i, capture) in matches.iter().enumerate() {
        let whole_match = capture.get(0).unwrap();
        let header = capture.get(1).unwrap().as_str();
        let body_start = whole_match.end();
        let body_end = matches
            .get(i + 1)
            .map(|next| next.get(0).unwrap().start())
            .unwrap_or(text.len());
        sections.push(Section {
            header,
            body: &text[body_start..body_end],
        });
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_header_becomes_single_body_section() {
        let text = "This judgment has no recognized headers at all.";
        let sections = split_by_headers(text);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].header, IMPLICIT_BODY_HEADER);
        assert_eq!(sections[0].body, text);
    }

    #[test]
    fn test_splits_on_recognized_headers() {
        let text = "Facts\nThe appellant was convicted.\nHeld\nThe appeal is allowed.\n";
        let sections = split_by_headers(text);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].header, "Facts");
        assert!(sections[0].body.contains("convicted"));
        assert_eq!(sections[1].header, "Held");
        assert!(sections[1].body.contains("allowed"));
    }

    #[test]
    fn test_preamble_before_first_header_is_body() {
        let text = "Supreme Court of India\n[2025] 9 S.C.R. 585\nHeld\nThe appeal is allowed.\n";
        let sections = split_by_headers(text);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].header, IMPLICIT_BODY_HEADER);
        assert!(sections[0].body.contains("S.C.R."));
        assert_eq!(sections[1].header, "Held");
    }

    #[test]
    fn test_concatenation_recovers_original_text() {
        let text = "Preamble text.\nFacts\nBody one.\nHeld\nBody two.\n";
        let sections = split_by_headers(text);
        let mut reconstructed = String::new();
        for (i, section) in sections.iter().enumerate() {
            if section.header != IMPLICIT_BODY_HEADER || i == 0 {
                if section.header != IMPLICIT_BODY_HEADER {
                    reconstructed.push_str(section.header);
                }
            }
            reconstructed.push_str(section.body);
        }
        // Modulo header line formatting, all original body text survives.
        assert!(reconstructed.contains("Preamble text."));
        assert!(reconstructed.contains("Body one."));
        assert!(reconstructed.contains("Body two."));
    }
}
