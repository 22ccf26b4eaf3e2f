//! YouTube `json3` timed text: URL construction, download and parsing.
//!
//! Both backends end up with a caption track URL, so the payload path is shared.

use anyhow::Context;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::TranscriptEntry;
use crate::utils::clean_caption_text;
use crate::Result;

#[derive(Debug, Deserialize)]
struct TimedText {
    #[serde(default)]
    events: Vec<TimedTextEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimedTextEvent {
    #[serde(default)]
    t_start_ms: u64,
    d_duration_ms: Option<u64>,
    segs: Option<Vec<TimedTextSegment>>,
}

#[derive(Debug, Deserialize)]
struct TimedTextSegment {
    #[serde(default)]
    utf8: String,
}

/// Build the json3 download URL for a track, optionally asking upstream to translate it
pub fn caption_url(locator: &str, target_language: Option<&str>) -> Result<Url> {
    let mut url = Url::parse(locator)
        .with_context(|| format!("Invalid caption track URL: {}", locator))?;

    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| *key != "fmt" && *key != "tlang")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    {
        let mut query = url.query_pairs_mut();
        query.clear();
        query.extend_pairs(retained);
        query.append_pair("fmt", "json3");
        if let Some(lang) = target_language {
            query.append_pair("tlang", lang);
        }
    }

    Ok(url)
}

/// Parse a json3 document into cleaned, chronologically ordered entries
pub fn parse_timed_text(body: &str) -> Result<Vec<TranscriptEntry>> {
    // Upstream answers an empty body for tracks that exist but have no text yet
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    let timed_text: TimedText =
        serde_json::from_str(body).context("Failed to parse json3 caption payload")?;

    let mut entries: Vec<TranscriptEntry> = timed_text
        .events
        .into_iter()
        .filter_map(|event| {
            let raw: String = event.segs?.iter().map(|seg| seg.utf8.as_str()).collect();
            let text = clean_caption_text(&raw);
            if text.is_empty() {
                return None;
            }

            Some(TranscriptEntry {
                text,
                start: event.t_start_ms as f64 / 1000.0,
                duration: event.d_duration_ms.unwrap_or(0) as f64 / 1000.0,
            })
        })
        .collect();

    // Stable sort keeps upstream order for equal start times
    entries.sort_by(|a, b| a.start.total_cmp(&b.start));

    Ok(entries)
}

/// Download a caption track and parse it
pub async fn fetch_timed_text(
    client: &Client,
    locator: &str,
    target_language: Option<&str>,
) -> Result<Vec<TranscriptEntry>> {
    let url = caption_url(locator, target_language)?;
    tracing::debug!("Downloading caption track: {}", url);

    let response = client
        .get(url)
        .send()
        .await
        .context("Failed to download caption track")?;

    if !response.status().is_success() {
        anyhow::bail!("Failed to download caption track: HTTP {}", response.status());
    }

    let body = response
        .text()
        .await
        .context("Failed to read caption track content")?;

    parse_timed_text(&body)
}
