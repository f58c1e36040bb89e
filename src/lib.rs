//! Transcript Fetch - retrieve caption transcripts for public YouTube videos
//!
//! This library reproduces the undocumented flow the YouTube web player uses to
//! load captions: it scrapes the watch page for an API key, queries the internal
//! player endpoint for caption tracks, then downloads and parses the timed-text
//! document. Every network stage retries transient failures with exponential
//! backoff, and results can be memoized through a pluggable cache.

pub mod cache;
pub mod cli;
pub mod config;
pub mod output;
pub mod transcribe;
pub mod transport;
pub mod utils;
pub mod video;

pub use cache::{CacheStrategy, FileCache, MemoryCache};
pub use cli::{Cli, Commands, OutputFormat};
pub use config::Config;
pub use transcribe::{
    CaptionTrack, PipelineOptions, TranscriptPipeline, TranscriptResult, TranscriptSegment,
    VideoMetadata,
};
pub use transport::{HttpFetcher, HttpRequest, HttpResponse, RetryPolicy, StageFetchers};
pub use video::{resolve_video_id, validate_lang, VideoId};

pub use tokio_util::sync::CancellationToken;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, TranscriptError>;

/// Error types produced while acquiring a transcript
#[derive(thiserror::Error, Debug)]
pub enum TranscriptError {
    #[error("Impossible to retrieve a YouTube video ID from the given input")]
    InvalidVideoId,

    #[error("Invalid language code: {0:?}")]
    InvalidLang(String),

    #[error("The video is no longer available ({0})")]
    VideoUnavailable(String),

    #[error("YouTube is receiving too many requests from this IP and now requires solving a captcha to continue")]
    TooManyRequests,

    #[error("Transcript is disabled on this video ({0})")]
    Disabled(String),

    #[error("No transcripts are available for this video ({0})")]
    NotAvailable(String),

    #[error(
        "No transcripts are available in {lang} for this video ({video_id}). Available languages: {}",
        available_langs.join(", ")
    )]
    NotAvailableLanguage {
        lang: String,
        video_id: String,
        available_langs: Vec<String>,
    },

    #[error("The request was cancelled")]
    Cancelled,

    #[error("Transport failure: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for TranscriptError {
    fn from(err: reqwest::Error) -> Self {
        TranscriptError::Transport(err.to_string())
    }
}
