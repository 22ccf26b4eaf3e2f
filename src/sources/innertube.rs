use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use super::{json3, Origin, TranscriptCandidate, TranscriptEntry, TranscriptSource, VideoId};
use crate::config::SourceConfig;
use crate::Result;

const YOUTUBE_REFERER: &str = "https://www.youtube.com/";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerResponse {
    playability_status: Option<PlayabilityStatus>,
    captions: Option<Captions>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    status: String,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Captions {
    player_captions_tracklist_renderer: Option<TracklistRenderer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TracklistRenderer {
    #[serde(default)]
    caption_tracks: Vec<CaptionTrack>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    language_code: String,
    name: Option<TrackName>,
    kind: Option<String>,
    #[serde(default)]
    is_translatable: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackName {
    simple_text: Option<String>,
    #[serde(default)]
    runs: Vec<TextRun>,
}

#[derive(Debug, Deserialize)]
struct TextRun {
    text: String,
}

impl TrackName {
    fn text(&self) -> Option<String> {
        if let Some(text) = &self.simple_text {
            return Some(text.clone());
        }

        let joined: String = self.runs.iter().map(|run| run.text.as_str()).collect();
        (!joined.is_empty()).then_some(joined)
    }
}

/// Transcript backend talking to the YouTube player API directly
pub struct InnertubeSource {
    client: Client,
    base_url: String,
    client_name: String,
    client_version: String,
    api_key: Option<String>,
}

impl InnertubeSource {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.innertube_base_url.trim_end_matches('/').to_string(),
            client_name: config.client_name.clone(),
            client_version: config.client_version.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn player_url(&self) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/youtubei/v1/player", self.base_url))
            .with_context(|| format!("Invalid player API base URL: {}", self.base_url))?;

        {
            let mut query = url.query_pairs_mut();
            if let Some(key) = &self.api_key {
                query.append_pair("key", key);
            }
            query.append_pair("prettyPrint", "false");
        }

        Ok(url)
    }

    /// Query the player endpoint for a video
    async fn get_player_response(&self, video_id: &VideoId) -> Result<PlayerResponse> {
        tracing::debug!("Requesting player data for: {}", video_id);

        let body = serde_json::json!({
            "context": {
                "client": {
                    "clientName": self.client_name,
                    "clientVersion": self.client_version,
                    "hl": "en"
                }
            },
            "videoId": video_id.as_str()
        });

        let response = self
            .client
            .post(self.player_url()?)
            .header("Referer", YOUTUBE_REFERER)
            .json(&body)
            .send()
            .await
            .context("Failed to reach the YouTube player API")?;

        if !response.status().is_success() {
            anyhow::bail!("YouTube player API returned HTTP {}", response.status());
        }

        response
            .json::<PlayerResponse>()
            .await
            .context("Failed to parse player API response")
    }
}

/// Map a player response to candidates, in upstream order
fn candidates_from_player(response: PlayerResponse) -> Result<Vec<TranscriptCandidate>> {
    if let Some(status) = response.playability_status {
        if status.status != "OK" {
            anyhow::bail!(
                "Video is not playable ({}): {}",
                status.status,
                status.reason.unwrap_or_else(|| "no reason given".to_string())
            );
        }
    }

    let tracks = response
        .captions
        .and_then(|c| c.player_captions_tracklist_renderer)
        .map(|r| r.caption_tracks)
        .unwrap_or_default();

    let candidates = tracks
        .into_iter()
        .map(|track| {
            let origin = match track.kind.as_deref() {
                Some("asr") => Origin::Generated,
                _ => Origin::Manual,
            };

            TranscriptCandidate::new(track.language_code, origin, track.is_translatable)
                .with_language_name(track.name.as_ref().and_then(TrackName::text))
                .with_locator(track.base_url.replace("\\u0026", "&"))
        })
        .collect();

    Ok(candidates)
}

#[async_trait]
impl TranscriptSource for InnertubeSource {
    fn name(&self) -> &'static str {
        "innertube"
    }

    async fn list_transcripts(&self, video_id: &VideoId) -> Result<Vec<TranscriptCandidate>> {
        let response = self.get_player_response(video_id).await?;
        candidates_from_player(response)
    }

    async fn fetch_transcript(
        &self,
        candidate: &TranscriptCandidate,
        target_language: Option<&str>,
    ) -> Result<Vec<TranscriptEntry>> {
        json3::fetch_timed_text(&self.client, &candidate.locator, target_language).await
    }
}
