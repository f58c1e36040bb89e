use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub mod retry;

pub use retry::{is_retryable, send_with_retry, RetryPolicy};

use crate::{Result, TranscriptError};

/// HTTP verbs used by the acquisition flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Description of one outbound request, handed to an [`HttpFetcher`]
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,

    pub method: Method,

    /// Extra headers, `User-Agent` excluded
    pub headers: Vec<(String, String)>,

    pub body: Option<String>,

    /// Requested caption language, already validated
    pub lang: Option<String>,

    pub user_agent: String,

    /// Cancellation signal for the whole fetch this request belongs to
    pub cancel: CancellationToken,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>, user_agent: impl Into<String>, cancel: CancellationToken) -> Self {
        Self {
            url: url.into(),
            method: Method::Get,
            headers: Vec::new(),
            body: None,
            lang: None,
            user_agent: user_agent.into(),
            cancel,
        }
    }

    pub fn post(
        url: impl Into<String>,
        body: impl Into<String>,
        user_agent: impl Into<String>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            method: Method::Post,
            body: Some(body.into()),
            ..Self::get(url, user_agent, cancel)
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attach the requested language, also sent as `Accept-Language`
    pub fn lang(mut self, lang: Option<&str>) -> Self {
        if let Some(lang) = lang {
            self.headers.push(("Accept-Language".to_string(), lang.to_string()));
            self.lang = Some(lang.to_string());
        }
        self
    }
}

/// Buffered response returned by an [`HttpFetcher`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> &str {
        &self.body
    }

    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.body)
    }
}

/// Performs a single network call for one pipeline stage.
///
/// Implementations must return non-2xx responses as `Ok`; classification and
/// retry decisions are made by the caller from the status code.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    async fn fetch(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// Default fetcher backed by a shared `reqwest` client
#[derive(Debug, Clone, Default)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };

        builder = builder.header(reqwest::header::USER_AGENT, &request.user_agent);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(HttpResponse { status, body })
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn fetch(&self, request: &HttpRequest) -> Result<HttpResponse> {
        tracing::debug!("{:?} {}", request.method, request.url);

        tokio::select! {
            biased;
            _ = request.cancel.cancelled() => Err(TranscriptError::Cancelled),
            response = self.send(request) => response,
        }
    }
}

/// One fetcher per network stage; any of them can be swapped independently
#[derive(Clone)]
pub struct StageFetchers {
    pub watch_page: Arc<dyn HttpFetcher>,
    pub player: Arc<dyn HttpFetcher>,
    pub transcript: Arc<dyn HttpFetcher>,
}

impl StageFetchers {
    /// Use the same fetcher for every stage
    pub fn uniform(fetcher: Arc<dyn HttpFetcher>) -> Self {
        Self {
            watch_page: fetcher.clone(),
            player: fetcher.clone(),
            transcript: fetcher,
        }
    }

    pub fn with_watch_page(mut self, fetcher: Arc<dyn HttpFetcher>) -> Self {
        self.watch_page = fetcher;
        self
    }

    pub fn with_player(mut self, fetcher: Arc<dyn HttpFetcher>) -> Self {
        self.player = fetcher;
        self
    }

    pub fn with_transcript(mut self, fetcher: Arc<dyn HttpFetcher>) -> Self {
        self.transcript = fetcher;
        self
    }
}

impl Default for StageFetchers {
    fn default() -> Self {
        Self::uniform(Arc::new(ReqwestFetcher::new()))
    }
}
