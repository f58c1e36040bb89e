use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

pub mod classify;
pub mod parser;
pub mod tracks;

pub use tracks::{CaptionTrack, PlayerCaptions, Thumbnail, VideoMetadata};

use crate::cache::{self, CacheRead, CacheStrategy};
use crate::transport::{send_with_retry, HttpFetcher, HttpRequest, HttpResponse, RetryPolicy, StageFetchers};
use crate::video::{resolve_video_id, validate_lang, VideoId};
use crate::{Result, TranscriptError};

/// Desktop browser identity sent unless configured otherwise
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/85.0.4183.83 Safari/537.36,gzip(gfe)";

pub const DEFAULT_HOST: &str = "www.youtube.com";

const PLAYER_PATH: &str = "youtubei/v1/player";
const CLIENT_NAME: &str = "ANDROID";
const CLIENT_VERSION: &str = "20.10.38";

/// Individual transcript segment with timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Segment text, entities decoded
    pub text: String,

    /// Start time in seconds
    pub offset: f64,

    /// Duration in seconds
    pub duration: f64,

    /// Language of the track the segment came from
    pub lang: String,
}

/// Segments alone, or segments with the video's metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TranscriptResult {
    Segments(Vec<TranscriptSegment>),
    WithMetadata {
        metadata: VideoMetadata,
        segments: Vec<TranscriptSegment>,
    },
}

impl TranscriptResult {
    pub fn segments(&self) -> &[TranscriptSegment] {
        match self {
            TranscriptResult::WithMetadata { segments, .. } => segments,
            TranscriptResult::Segments(segments) => segments,
        }
    }

    pub fn metadata(&self) -> Option<&VideoMetadata> {
        match self {
            TranscriptResult::WithMetadata { metadata, .. } => Some(metadata),
            TranscriptResult::Segments(_) => None,
        }
    }

    pub fn into_segments(self) -> Vec<TranscriptSegment> {
        match self {
            TranscriptResult::WithMetadata { segments, .. } => segments,
            TranscriptResult::Segments(segments) => segments,
        }
    }
}

/// Transport-level settings shared by every fetch
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub user_agent: String,

    /// Use `http://` for every stage, including the transcript document
    pub plaintext: bool,

    pub retry: RetryPolicy,

    pub host: String,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            plaintext: false,
            retry: RetryPolicy::default(),
            host: DEFAULT_HOST.to_string(),
        }
    }
}

/// Per-call parameters
#[derive(Debug, Clone, Default)]
pub struct FetchRequest {
    pub lang: Option<String>,
    pub with_metadata: bool,
    pub cancel: CancellationToken,
}

impl FetchRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    pub fn with_metadata(mut self, with_metadata: bool) -> Self {
        self.with_metadata = with_metadata;
        self
    }

    pub fn cancel_on(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Main transcript acquisition pipeline
#[derive(Clone)]
pub struct TranscriptPipeline {
    options: PipelineOptions,
    fetchers: StageFetchers,
    cache: Option<Arc<dyn CacheStrategy>>,
    cache_ttl: Option<Duration>,
}

impl TranscriptPipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Self {
            options,
            fetchers: StageFetchers::default(),
            cache: None,
            cache_ttl: None,
        }
    }

    /// Replace the transport used by one or more stages
    pub fn with_fetchers(mut self, fetchers: StageFetchers) -> Self {
        self.fetchers = fetchers;
        self
    }

    /// Memoize results; `ttl` of `None` defers to the cache's own default
    pub fn with_cache(mut self, cache: Arc<dyn CacheStrategy>, ttl: Option<Duration>) -> Self {
        self.cache = Some(cache);
        self.cache_ttl = ttl;
        self
    }

    /// Fetch the transcript segments for a video ID or URL
    pub async fn fetch_transcript(
        &self,
        input: &str,
        lang: Option<&str>,
        cancel: CancellationToken,
    ) -> Result<Vec<TranscriptSegment>> {
        let mut request = FetchRequest::new().cancel_on(cancel);
        request.lang = lang.map(str::to_string);
        Ok(self.fetch(input, &request).await?.into_segments())
    }

    /// Fetch the transcript together with the video's metadata
    pub async fn fetch_transcript_with_metadata(
        &self,
        input: &str,
        lang: Option<&str>,
        cancel: CancellationToken,
    ) -> Result<(VideoMetadata, Vec<TranscriptSegment>)> {
        let mut request = FetchRequest::new().with_metadata(true).cancel_on(cancel);
        request.lang = lang.map(str::to_string);

        match self.fetch(input, &request).await? {
            TranscriptResult::WithMetadata { metadata, segments } => Ok((metadata, segments)),
            TranscriptResult::Segments(segments) => Ok((VideoMetadata::default(), segments)),
        }
    }

    /// Resolve, consult the cache, run the network stages, then store the result
    pub async fn fetch(&self, input: &str, request: &FetchRequest) -> Result<TranscriptResult> {
        let video_id = resolve_video_id(input)?;
        let lang = request.lang.as_deref();
        if let Some(lang) = lang {
            validate_lang(lang)?;
        }

        if request.cancel.is_cancelled() {
            return Err(TranscriptError::Cancelled);
        }

        let key = cache::cache_key(&video_id, lang, request.with_metadata);
        if let Some(cache) = &self.cache {
            match cache::read_through::<TranscriptResult>(cache.as_ref(), &key).await {
                CacheRead::Hit(result) if result.metadata().is_some() == request.with_metadata => {
                    tracing::info!("Cache hit for {}", key);
                    return Ok(result);
                }
                CacheRead::Hit(_) => tracing::warn!("Cache entry {} has the wrong shape, refetching", key),
                CacheRead::Miss => tracing::debug!("Cache miss for {}", key),
            }
        }

        let result = self.acquire(&video_id, request).await?;

        if let Some(cache) = &self.cache {
            cache::write_behind(cache.as_ref(), &key, &result, self.cache_ttl).await;
        }

        Ok(result)
    }

    /// Run stages 1-2 only and return the advertised caption tracks
    pub async fn list_tracks(&self, input: &str, cancel: CancellationToken) -> Result<Vec<CaptionTrack>> {
        let video_id = resolve_video_id(input)?;
        let (_, tracks) = self.load_player(&video_id, None, &cancel).await?;
        Ok(tracks)
    }

    async fn acquire(&self, video_id: &VideoId, request: &FetchRequest) -> Result<TranscriptResult> {
        let lang = request.lang.as_deref();
        let (player, tracks) = self.load_player(video_id, lang, &request.cancel).await?;

        let track = classify::select_track(&tracks, lang, video_id)?;
        tracing::debug!(
            "Selected {} track {} for {}",
            if track.is_generated { "generated" } else { "uploaded" },
            track.language_code,
            video_id
        );

        let url = self.transcript_url(&track.base_url, video_id)?;
        let transcript_request =
            HttpRequest::get(url, &self.options.user_agent, request.cancel.clone()).lang(lang);
        let response = self.send(&self.fetchers.transcript, &transcript_request).await?;
        let document = classify::transcript_response(&response, video_id)?;

        let segments = parser::parse_transcript(document, lang.unwrap_or(&track.language_code));
        if segments.is_empty() {
            return Err(TranscriptError::NotAvailable(video_id.to_string()));
        }

        tracing::info!("Fetched {} segments for {}", segments.len(), video_id);

        Ok(if request.with_metadata {
            TranscriptResult::WithMetadata {
                metadata: VideoMetadata::from_player_response(&player, video_id),
                segments,
            }
        } else {
            TranscriptResult::Segments(segments)
        })
    }

    async fn load_player(
        &self,
        video_id: &VideoId,
        lang: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<(Value, Vec<CaptionTrack>)> {
        let user_agent = &self.options.user_agent;

        let watch_request = HttpRequest::get(self.watch_url(video_id), user_agent, cancel.clone()).lang(lang);
        let response = self.send(&self.fetchers.watch_page, &watch_request).await?;
        let api_key = classify::watch_page(&response, video_id)?;

        let body = serde_json::json!({
            "context": {
                "client": {
                    "clientName": CLIENT_NAME,
                    "clientVersion": CLIENT_VERSION
                }
            },
            "videoId": video_id.as_str()
        });
        let player_request = HttpRequest::post(self.player_url(&api_key), body.to_string(), user_agent, cancel.clone())
            .header("Content-Type", "application/json")
            .lang(lang);
        let response = self.send(&self.fetchers.player, &player_request).await?;
        let player = classify::player_response(&response, video_id)?;

        let tracks = classify::caption_tracks(PlayerCaptions::from_player_response(&player), video_id)?;
        Ok((player, tracks))
    }

    async fn send(&self, fetcher: &Arc<dyn HttpFetcher>, request: &HttpRequest) -> Result<HttpResponse> {
        send_with_retry(&self.options.retry, &request.cancel, || fetcher.fetch(request)).await
    }

    fn scheme(&self) -> &'static str {
        if self.options.plaintext {
            "http"
        } else {
            "https"
        }
    }

    fn watch_url(&self, video_id: &VideoId) -> String {
        format!("{}://{}/watch?v={}", self.scheme(), self.options.host, video_id)
    }

    fn player_url(&self, api_key: &str) -> String {
        format!(
            "{}://{}/{}?key={}",
            self.scheme(),
            self.options.host,
            PLAYER_PATH,
            urlencoding::encode(api_key)
        )
    }

    /// Drop `fmt=` so YouTube serves the default XML document, downgrading the scheme if configured
    fn transcript_url(&self, base_url: &str, video_id: &VideoId) -> Result<String> {
        let mut url = Url::parse(base_url).map_err(|err| {
            tracing::debug!("Unusable track URL {:?}: {}", base_url, err);
            TranscriptError::NotAvailable(video_id.to_string())
        })?;

        let query = url.query().map(|query| {
            query
                .split('&')
                .filter(|pair| !pair.is_empty() && !pair.starts_with("fmt="))
                .collect::<Vec<_>>()
                .join("&")
        });
        match query.as_deref() {
            Some("") | None => url.set_query(None),
            Some(query) => url.set_query(Some(query)),
        }

        if self.options.plaintext && url.scheme() == "https" {
            // https -> http stays within the special schemes, which `set_scheme` always allows
            url.set_scheme("http").ok();
        }

        Ok(url.into())
    }
}

impl Default for TranscriptPipeline {
    fn default() -> Self {
        Self::new(PipelineOptions::default())
    }
}
