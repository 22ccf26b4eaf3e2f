use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use super::{json3, Origin, TranscriptCandidate, TranscriptEntry, TranscriptSource, VideoId};
use crate::config::SourceConfig;
use crate::Result;

/// Subset of `yt-dlp --dump-json` output we care about
#[derive(Debug, Deserialize)]
struct VideoInfo {
    #[serde(default)]
    subtitles: BTreeMap<String, Vec<SubtitleFormat>>,
    #[serde(default)]
    automatic_captions: BTreeMap<String, Vec<SubtitleFormat>>,
}

#[derive(Debug, Deserialize)]
struct SubtitleFormat {
    ext: String,
    url: String,
    name: Option<String>,
}

/// Transcript backend that lists tracks with yt-dlp
pub struct YtDlpSource {
    yt_dlp_path: String,
    timeout: Duration,
    client: Client,
}

impl YtDlpSource {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_seconds);
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            yt_dlp_path: config.yt_dlp_path.clone(),
            timeout,
            client,
        })
    }

    /// Get video information using yt-dlp
    async fn get_video_info(&self, video_id: &VideoId) -> Result<String> {
        tracing::debug!("Extracting subtitle info with {} for: {}", self.yt_dlp_path, video_id);

        let url = video_id.watch_url();
        let command = Command::new(&self.yt_dlp_path)
            .args([
                "--dump-json",
                "--skip-download",
                "--no-playlist",
                "--no-warnings",
                url.as_str(),
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, command)
            .await
            .map_err(|_| anyhow::anyhow!("yt-dlp timed out after {}s", self.timeout.as_secs()))?
            .with_context(|| format!("Failed to run {}", self.yt_dlp_path))?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("yt-dlp failed: {}", error.trim());
        }

        String::from_utf8(output.stdout).context("yt-dlp produced non UTF-8 output")
    }
}

/// Map yt-dlp's subtitle tables to candidates: manual tracks first, then generated ones
fn candidates_from_info(json: &str) -> Result<Vec<TranscriptCandidate>> {
    let info: VideoInfo = serde_json::from_str(json).context("Failed to parse yt-dlp JSON")?;

    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    let tables = [
        (Origin::Manual, info.subtitles),
        (Origin::Generated, info.automatic_captions),
    ];

    for (origin, table) in tables {
        for (language, formats) in table {
            if language == "live_chat" {
                continue;
            }

            let Some(track) = formats.into_iter().find(|f| f.ext == "json3") else {
                continue;
            };

            // yt-dlp enumerates every machine translation as its own track
            if track.url.contains("tlang=") {
                continue;
            }

            let language = language.trim_end_matches("-orig").to_string();
            if !seen.insert((origin, language.clone())) {
                continue;
            }

            candidates.push(
                TranscriptCandidate::new(language, origin, true)
                    .with_language_name(track.name)
                    .with_locator(track.url),
            );
        }
    }

    Ok(candidates)
}

#[async_trait]
impl TranscriptSource for YtDlpSource {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn list_transcripts(&self, video_id: &VideoId) -> Result<Vec<TranscriptCandidate>> {
        let json = self.get_video_info(video_id).await?;
        candidates_from_info(&json)
    }

    async fn fetch_transcript(
        &self,
        candidate: &TranscriptCandidate,
        target_language: Option<&str>,
    ) -> Result<Vec<TranscriptEntry>> {
        json3::fetch_timed_text(&self.client, &candidate.locator, target_language).await
    }
}
