use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use crate::{Result, TranscriptError};

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

regex!(BARE_ID_REGEX, r"^[A-Za-z0-9_-]{11}$");
regex!(LANG_REGEX, r"^[a-zA-Z]{2,3}(-[a-zA-Z0-9]{2,8})*$");

// Tried in order; the first capture group is the identifier.
static URL_PATTERNS: LazyLock<[Regex; 5]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)youtube(?:-nocookie)?\.com/watch\?(?:[^#]*&)?v=([A-Za-z0-9_-]{11})").unwrap(),
        Regex::new(r"(?i)youtu\.be/([A-Za-z0-9_-]{11})").unwrap(),
        Regex::new(r"(?i)youtube(?:-nocookie)?\.com/embed/([A-Za-z0-9_-]{11})").unwrap(),
        Regex::new(r"(?i)youtube\.com/live/([A-Za-z0-9_-]{11})").unwrap(),
        Regex::new(r"(?i)youtube\.com/shorts/([A-Za-z0-9_-]{11})").unwrap(),
    ]
});

/// Canonical 11-character YouTube video identifier.
///
/// Only [`resolve_video_id`] constructs one, so holding a `VideoId` means the
/// value already passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Resolve a bare identifier or a watch/short/embed/live/shorts URL into a [`VideoId`]
pub fn resolve_video_id(input: &str) -> Result<VideoId> {
    let input = input.trim();

    if BARE_ID_REGEX.is_match(input) {
        return Ok(VideoId(input.to_string()));
    }

    URL_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(input))
        .and_then(|captures| captures.get(1))
        .map(|id| VideoId(id.as_str().to_string()))
        .ok_or(TranscriptError::InvalidVideoId)
}

/// Validate an optional BCP-47-shaped language tag.
///
/// The tag ends up in an `Accept-Language` header, so anything outside the
/// pattern is rejected rather than escaped.
pub fn validate_lang(lang: &str) -> Result<()> {
    if LANG_REGEX.is_match(lang) {
        Ok(())
    } else {
        Err(TranscriptError::InvalidLang(lang.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_id_is_returned_unchanged() {
        for id in ["dQw4w9WgXcQ", "_NuH3D4SN-c", "aaaaaaaaaaa", "-----------", "A1_b2-C3d4E"] {
            assert_eq!(resolve_video_id(id).unwrap().as_str(), id);
        }
    }

    #[test]
    fn test_known_url_shapes() {
        let cases = [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
            "https://m.youtube.com/watch?v=dQw4w9WgXcQ&t=42s",
            "https://youtu.be/dQw4w9WgXcQ?si=VSFea_rMwtaiR8Q7",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/live/dQw4w9WgXcQ?feature=shared",
            "https://youtube.com/shorts/dQw4w9WgXcQ",
            "youtu.be/dQw4w9WgXcQ",
        ];

        for url in cases {
            assert_eq!(resolve_video_id(url).unwrap().as_str(), "dQw4w9WgXcQ", "{url}");
        }
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        assert_eq!(resolve_video_id("  dQw4w9WgXcQ\n").unwrap().as_str(), "dQw4w9WgXcQ");
    }

    #[test]
    fn test_invalid_inputs() {
        for input in ["invalid", "https://example.com", "", "dQw4w9WgXc", "https://vimeo.com/123456789"] {
            assert!(matches!(resolve_video_id(input), Err(TranscriptError::InvalidVideoId)), "{input}");
        }
    }

    #[test]
    fn test_validate_lang_accepts_bcp47_shapes() {
        for lang in ["en", "pt-BR", "zh-Hans", "fil", "es-419"] {
            assert!(validate_lang(lang).is_ok(), "{lang}");
        }
    }

    #[test]
    fn test_validate_lang_rejects_header_injection() {
        for lang in ["en;drop", "", "<script>", "en\r\nX-Evil: 1", "e", "english"] {
            match validate_lang(lang) {
                Err(TranscriptError::InvalidLang(tag)) => assert_eq!(tag, lang),
                other => panic!("expected InvalidLang for {lang:?}, got {other:?}"),
            }
        }
    }
}
