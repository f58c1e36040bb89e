use anyhow::Result;
use std::fmt::Write;

use crate::transcribe::{TranscriptResult, TranscriptSegment};
use crate::utils::{format_clock, format_duration, format_offset};

/// Plain text, one segment per line, with an optional title header
pub fn format_as_text(result: &TranscriptResult, include_timestamps: bool) -> String {
    let mut out = String::new();

    if let Some(metadata) = result.metadata() {
        let _ = writeln!(out, "{}", metadata.title);
        let _ = writeln!(
            out,
            "{} · {} · {} views",
            metadata.author,
            format_duration(metadata.length_seconds as f64),
            metadata.view_count
        );
        out.push('\n');
    }

    for segment in result.segments() {
        if include_timestamps {
            let _ = writeln!(out, "{} {}", format_offset(segment.offset), segment.text);
        } else {
            let _ = writeln!(out, "{}", segment.text);
        }
    }

    out
}

/// Pretty JSON: a segment array, or `{ metadata, segments }`
pub fn format_as_json(result: &TranscriptResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

/// SubRip cues numbered from 1
pub fn format_as_srt(segments: &[TranscriptSegment]) -> String {
    let mut out = String::new();

    for (index, segment) in segments.iter().enumerate() {
        let _ = writeln!(out, "{}", index + 1);
        let _ = writeln!(
            out,
            "{} --> {}",
            format_clock(segment.offset, ','),
            format_clock(segment.offset + segment.duration, ',')
        );
        let _ = writeln!(out, "{}", segment.text);
        out.push('\n');
    }

    out
}

/// WebVTT document; always starts with the `WEBVTT` header
pub fn format_as_vtt(segments: &[TranscriptSegment]) -> String {
    let mut out = String::from("WEBVTT\n\n");

    for segment in segments {
        let _ = writeln!(
            out,
            "{} --> {}",
            format_clock(segment.offset, '.'),
            format_clock(segment.offset + segment.duration, '.')
        );
        let _ = writeln!(out, "{}", segment.text);
        out.push('\n');
    }

    out
}
