use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::video::VideoId;

/// One caption stream advertised by the player endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionTrack {
    /// Language code, e.g. `en` or `pt-BR`
    pub language_code: String,

    /// Human-readable name, e.g. "English (auto-generated)"
    pub name: String,

    /// Speech-recognition track rather than uploaded captions
    pub is_generated: bool,

    /// URL of the timed-text document
    pub base_url: String,
}

/// Caption information from a player response, reduced to one shape.
///
/// The track list has lived under `captions.playerCaptionsTracklistRenderer`
/// and directly under `playerCaptionsTracklistRenderer`; both land here.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerCaptions {
    /// Top-level `captions` key present
    pub has_captions_field: bool,

    /// `captionTracks` was found under either renderer location
    pub has_tracklist: bool,

    /// `None` when `captionTracks` is missing or not an array
    pub tracks: Option<Vec<CaptionTrack>>,

    /// `playabilityStatus.status == "OK"`
    pub playable: bool,
}

impl PlayerCaptions {
    pub fn from_player_response(player: &Value) -> Self {
        let captions = player.get("captions").filter(|c| !c.is_null());
        let tracklist = captions
            .and_then(|c| c.get("playerCaptionsTracklistRenderer"))
            .or_else(|| player.get("playerCaptionsTracklistRenderer"))
            .filter(|t| !t.is_null());

        let caption_tracks = tracklist
            .and_then(|t| t.get("captionTracks"))
            .filter(|t| !t.is_null());
        let tracks = caption_tracks
            .and_then(Value::as_array)
            .map(|tracks| tracks.iter().filter_map(parse_track).collect());

        let playable = player
            .pointer("/playabilityStatus/status")
            .and_then(Value::as_str)
            == Some("OK");

        Self {
            has_captions_field: captions.is_some(),
            has_tracklist: caption_tracks.is_some(),
            tracks,
            playable,
        }
    }
}

fn parse_track(track: &Value) -> Option<CaptionTrack> {
    let base_url = track.get("baseUrl")?.as_str()?.to_string();
    let language_code = track
        .get("languageCode")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let name = track
        .pointer("/name/simpleText")
        .and_then(Value::as_str)
        .or_else(|| track.pointer("/name/runs/0/text").and_then(Value::as_str))
        .unwrap_or(&language_code)
        .to_string();

    let is_generated = track.get("kind").and_then(Value::as_str) == Some("asr");

    Some(CaptionTrack {
        language_code,
        name,
        is_generated,
        base_url,
    })
}

/// Best-effort projection of `videoDetails`; absent fields default to zero or empty
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub video_id: String,
    pub title: String,
    pub author: String,
    pub channel_id: String,
    pub length_seconds: u64,
    pub view_count: u64,
    pub description: String,
    pub keywords: Vec<String>,
    pub thumbnails: Vec<Thumbnail>,
    pub is_live: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thumbnail {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

impl VideoMetadata {
    pub fn from_player_response(player: &Value, video_id: &VideoId) -> Self {
        let empty = Value::Null;
        let details = player.get("videoDetails").unwrap_or(&empty);

        let string = |key: &str| {
            details
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        let keywords = details
            .get("keywords")
            .and_then(Value::as_array)
            .map(|words| {
                words
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let thumbnails = details
            .pointer("/thumbnail/thumbnails")
            .and_then(Value::as_array)
            .map(|thumbs| {
                thumbs
                    .iter()
                    .filter_map(|thumb| {
                        Some(Thumbnail {
                            url: thumb.get("url")?.as_str()?.to_string(),
                            width: number(thumb.get("width")) as u32,
                            height: number(thumb.get("height")) as u32,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        let video_id = match string("videoId") {
            id if id.is_empty() => video_id.to_string(),
            id => id,
        };

        Self {
            video_id,
            title: string("title"),
            author: string("author"),
            channel_id: string("channelId"),
            length_seconds: number(details.get("lengthSeconds")),
            view_count: number(details.get("viewCount")),
            description: string("shortDescription"),
            keywords,
            thumbnails,
            is_live: details
                .get("isLiveContent")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        }
    }
}

// Counts arrive as JSON strings ("212") or numbers depending on the client.
fn number(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        _ => 0,
    }
}
