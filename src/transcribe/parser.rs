use regex::{Captures, Regex};
use std::sync::LazyLock;

use super::TranscriptSegment;

// The timed-text document is not guaranteed to be well-formed XML, so these two
// patterns are the whole grammar.
static TEXT_ELEMENT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<text start="([^"]*)" dur="([^"]*)"[^>]*>([^<]*)</text>"#).unwrap()
});
static ENTITY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(amp|lt|gt|quot|apos|#39);").unwrap());

/// Decode the six XML entities YouTube emits, in a single pass.
///
/// A single pass keeps `&amp;lt;` as the literal text `&lt;`.
pub fn decode_entities(text: &str) -> String {
    ENTITY_REGEX
        .replace_all(text, |captures: &Captures| match &captures[1] {
            "amp" => "&",
            "lt" => "<",
            "gt" => ">",
            "quot" => "\"",
            _ => "'",
        })
        .into_owned()
}

/// Extract every `<text start dur>` element in document order
pub fn parse_transcript(document: &str, lang: &str) -> Vec<TranscriptSegment> {
    TEXT_ELEMENT_REGEX
        .captures_iter(document)
        .map(|captures| TranscriptSegment {
            text: decode_entities(&captures[3]),
            offset: parse_seconds(&captures[1]),
            duration: parse_seconds(&captures[2]),
            lang: lang.to_string(),
        })
        .collect()
}

fn parse_seconds(raw: &str) -> f64 {
    raw.trim().parse().unwrap_or(0.0)
}
