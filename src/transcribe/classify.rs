//! Decision rules mapping upstream responses onto [`TranscriptError`].
//!
//! Several failure modes look alike from the outside (no captions, an
//! unplayable video, a rate limit), so each stage boundary applies its checks
//! in a fixed order. Reordering them changes which error callers see.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use super::tracks::{CaptionTrack, PlayerCaptions};
use crate::transport::HttpResponse;
use crate::video::VideoId;
use crate::{Result, TranscriptError};

/// Present on the watch page when YouTube wants a captcha solved
pub const BOT_CHALLENGE_MARKER: &str = r#"class="g-recaptcha""#;

static API_KEY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""INNERTUBE_API_KEY":\s*"([^"]+)""#).unwrap());
// Some renderings embed the config as an escaped JSON string.
static ESCAPED_API_KEY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"INNERTUBE_API_KEY\\":\s*\\"([^\\"]+)\\""#).unwrap());

/// Stage 1: watch page to API key
pub fn watch_page(response: &HttpResponse, video_id: &VideoId) -> Result<String> {
    if !response.is_success() {
        return Err(TranscriptError::VideoUnavailable(video_id.to_string()));
    }

    let html = response.text();
    if html.contains(BOT_CHALLENGE_MARKER) {
        return Err(TranscriptError::TooManyRequests);
    }

    API_KEY_REGEX
        .captures(html)
        .or_else(|| ESCAPED_API_KEY_REGEX.captures(html))
        .and_then(|captures| captures.get(1))
        .map(|key| key.as_str().to_string())
        .ok_or_else(|| TranscriptError::NotAvailable(video_id.to_string()))
}

/// Stage 2a: player response to parsed JSON
pub fn player_response(response: &HttpResponse, video_id: &VideoId) -> Result<Value> {
    if !response.is_success() {
        return Err(TranscriptError::VideoUnavailable(video_id.to_string()));
    }

    response.json().map_err(|err| {
        tracing::debug!("Player response for {} is not JSON: {}", video_id, err);
        TranscriptError::NotAvailable(video_id.to_string())
    })
}

/// Stage 2b: caption structure to a non-empty track list
pub fn caption_tracks(captions: PlayerCaptions, video_id: &VideoId) -> Result<Vec<CaptionTrack>> {
    if !captions.has_captions_field && !captions.has_tracklist {
        // Only a playable video lets us claim captions were switched off.
        return Err(if captions.playable {
            TranscriptError::Disabled(video_id.to_string())
        } else {
            TranscriptError::NotAvailable(video_id.to_string())
        });
    }

    match captions.tracks {
        Some(tracks) if !tracks.is_empty() => Ok(tracks),
        _ => Err(TranscriptError::Disabled(video_id.to_string())),
    }
}

/// Stage 3: exact language match, or the first track when no language was asked for
pub fn select_track<'a>(
    tracks: &'a [CaptionTrack],
    lang: Option<&str>,
    video_id: &VideoId,
) -> Result<&'a CaptionTrack> {
    let Some(lang) = lang else {
        return tracks
            .first()
            .ok_or_else(|| TranscriptError::Disabled(video_id.to_string()));
    };

    tracks
        .iter()
        .find(|track| track.language_code == lang)
        .ok_or_else(|| TranscriptError::NotAvailableLanguage {
            lang: lang.to_string(),
            video_id: video_id.to_string(),
            available_langs: tracks
                .iter()
                .map(|track| track.language_code.clone())
                .filter(|code| !code.is_empty())
                .collect(),
        })
}

/// Stage 4: transcript document status
pub fn transcript_response<'a>(response: &'a HttpResponse, video_id: &VideoId) -> Result<&'a str> {
    match response.status {
        _ if response.is_success() => Ok(response.text()),
        429 => Err(TranscriptError::TooManyRequests),
        _ => Err(TranscriptError::NotAvailable(video_id.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::resolve_video_id;

    fn id() -> VideoId {
        resolve_video_id("dQw4w9WgXcQ").unwrap()
    }

    fn track(lang: &str) -> CaptionTrack {
        CaptionTrack {
            language_code: lang.to_string(),
            name: lang.to_string(),
            is_generated: false,
            base_url: format!("https://example.com/{lang}"),
        }
    }

    fn captions(field: bool, tracklist: bool, tracks: Option<Vec<CaptionTrack>>, playable: bool) -> PlayerCaptions {
        PlayerCaptions {
            has_captions_field: field,
            has_tracklist: tracklist,
            tracks,
            playable,
        }
    }

    #[test]
    fn test_watch_page_failure_status() {
        let err = watch_page(&HttpResponse::new(404, ""), &id()).unwrap_err();
        assert!(matches!(err, TranscriptError::VideoUnavailable(v) if v == "dQw4w9WgXcQ"));
    }

    #[test]
    fn test_bot_challenge_beats_key_extraction() {
        let html = r#"<div class="g-recaptcha"></div> "INNERTUBE_API_KEY":"abc""#;
        let err = watch_page(&HttpResponse::new(200, html), &id()).unwrap_err();
        assert!(matches!(err, TranscriptError::TooManyRequests));
    }

    #[test]
    fn test_both_key_patterns() {
        let plain = r#"ytcfg.set({"INNERTUBE_API_KEY": "AIzaPlain_-1"})"#;
        assert_eq!(watch_page(&HttpResponse::new(200, plain), &id()).unwrap(), "AIzaPlain_-1");

        let escaped = r#"var cfg = "{\"INNERTUBE_API_KEY\":\"AIzaEscaped\"}";"#;
        assert_eq!(watch_page(&HttpResponse::new(200, escaped), &id()).unwrap(), "AIzaEscaped");
    }

    #[test]
    fn test_missing_key() {
        let err = watch_page(&HttpResponse::new(200, "<html></html>"), &id()).unwrap_err();
        assert!(matches!(err, TranscriptError::NotAvailable(_)));
    }

    #[test]
    fn test_player_failure_and_bad_json() {
        assert!(matches!(
            player_response(&HttpResponse::new(500, ""), &id()),
            Err(TranscriptError::VideoUnavailable(_))
        ));
        assert!(matches!(
            player_response(&HttpResponse::new(200, "<html>"), &id()),
            Err(TranscriptError::NotAvailable(_))
        ));
    }

    #[test]
    fn test_absent_captions_depends_on_playability() {
        assert!(matches!(
            caption_tracks(captions(false, false, None, true), &id()),
            Err(TranscriptError::Disabled(_))
        ));
        assert!(matches!(
            caption_tracks(captions(false, false, None, false), &id()),
            Err(TranscriptError::NotAvailable(_))
        ));
    }

    #[test]
    fn test_present_but_empty_is_disabled() {
        assert!(matches!(
            caption_tracks(captions(true, true, Some(vec![]), false), &id()),
            Err(TranscriptError::Disabled(_))
        ));
        assert!(matches!(
            caption_tracks(captions(true, false, None, false), &id()),
            Err(TranscriptError::Disabled(_))
        ));
    }

    #[test]
    fn test_top_level_tracklist_without_captions_field() {
        let tracks = caption_tracks(captions(false, true, Some(vec![track("en")]), false), &id()).unwrap();
        assert_eq!(tracks.len(), 1);
    }

    #[test]
    fn test_select_first_without_lang() {
        let tracks = vec![track("de"), track("en")];
        assert_eq!(select_track(&tracks, None, &id()).unwrap().language_code, "de");
        assert_eq!(select_track(&tracks, Some("en"), &id()).unwrap().language_code, "en");
    }

    #[test]
    fn test_missing_language_lists_available() {
        let tracks = vec![track("en"), track(""), track("es")];
        match select_track(&tracks, Some("fr"), &id()) {
            Err(TranscriptError::NotAvailableLanguage {
                lang,
                video_id,
                available_langs,
            }) => {
                assert_eq!(lang, "fr");
                assert_eq!(video_id, "dQw4w9WgXcQ");
                assert_eq!(available_langs, vec!["en", "es"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_transcript_status_mapping() {
        assert_eq!(transcript_response(&HttpResponse::new(200, "doc"), &id()).unwrap(), "doc");
        assert!(matches!(
            transcript_response(&HttpResponse::new(429, ""), &id()),
            Err(TranscriptError::TooManyRequests)
        ));
        assert!(matches!(
            transcript_response(&HttpResponse::new(403, ""), &id()),
            Err(TranscriptError::NotAvailable(_))
        ));
    }
}
