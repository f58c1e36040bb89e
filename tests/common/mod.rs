#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use transcript_fetch::transport::{HttpFetcher, HttpRequest, HttpResponse, StageFetchers};
use transcript_fetch::Result;

pub const VIDEO_ID: &str = "dQw4w9WgXcQ";

pub const WATCH_PAGE: &str = r#"<html><script>ytcfg.set({"INNERTUBE_API_KEY":"AIzaTestKey","INNERTUBE_CLIENT_VERSION":"2.0"});</script></html>"#;

pub const TRANSCRIPT_XML: &str = r#"<?xml version="1.0" encoding="utf-8" ?><transcript><text start="0.16" dur="1.52">We&#39;re no strangers</text><text start="1.68" dur="2.4">to love &amp; rules &lt;3</text></transcript>"#;

pub fn player_json(tracks: &[&str]) -> String {
    let tracks: Vec<_> = tracks
        .iter()
        .map(|lang| {
            serde_json::json!({
                "baseUrl": format!("https://www.youtube.com/api/timedtext?v={VIDEO_ID}&lang={lang}&fmt=srv3"),
                "name": { "runs": [{ "text": lang }] },
                "languageCode": lang,
                "kind": "asr"
            })
        })
        .collect();

    serde_json::json!({
        "playabilityStatus": { "status": "OK" },
        "captions": { "playerCaptionsTracklistRenderer": { "captionTracks": tracks } },
        "videoDetails": {
            "videoId": VIDEO_ID,
            "title": "Never Gonna Give You Up",
            "author": "Rick Astley",
            "channelId": "UCuAXFkgsw1L7xaCfnd5JJOw",
            "lengthSeconds": "212",
            "viewCount": "1600000000",
            "shortDescription": "The official video",
            "keywords": ["rick", "astley"],
            "thumbnail": { "thumbnails": [{ "url": "https://i.ytimg.com/vi/x/default.jpg", "width": 120, "height": 90 }] },
            "isLiveContent": false
        }
    })
    .to_string()
}

/// Replays canned responses in order and records every request it sees
#[derive(Default)]
pub struct ScriptedFetcher {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedFetcher {
    pub fn new(responses: impl IntoIterator<Item = HttpResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn ok(body: impl Into<String>) -> Arc<Self> {
        Self::new([HttpResponse::new(200, body)])
    }

    /// Same 200 response `times` times
    pub fn repeat(body: &str, times: usize) -> Arc<Self> {
        Self::new(std::iter::repeat_with(|| HttpResponse::new(200, body)).take(times))
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpFetcher for ScriptedFetcher {
    async fn fetch(&self, request: &HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.responses.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| HttpResponse::new(500, "script exhausted")))
    }
}

pub struct Stages {
    pub watch_page: Arc<ScriptedFetcher>,
    pub player: Arc<ScriptedFetcher>,
    pub transcript: Arc<ScriptedFetcher>,
}

impl Stages {
    pub fn happy(tracks: &[&str]) -> Self {
        Self {
            watch_page: ScriptedFetcher::ok(WATCH_PAGE),
            player: ScriptedFetcher::ok(player_json(tracks)),
            transcript: ScriptedFetcher::ok(TRANSCRIPT_XML),
        }
    }

    /// Enough scripted responses for `runs` full pipeline runs
    pub fn happy_runs(tracks: &[&str], runs: usize) -> Self {
        Self {
            watch_page: ScriptedFetcher::repeat(WATCH_PAGE, runs),
            player: ScriptedFetcher::repeat(&player_json(tracks), runs),
            transcript: ScriptedFetcher::repeat(TRANSCRIPT_XML, runs),
        }
    }

    pub fn fetchers(&self) -> StageFetchers {
        StageFetchers {
            watch_page: self.watch_page.clone(),
            player: self.player.clone(),
            transcript: self.transcript.clone(),
        }
    }

    pub fn total_calls(&self) -> usize {
        self.watch_page.calls() + self.player.calls() + self.transcript.calls()
    }
}
