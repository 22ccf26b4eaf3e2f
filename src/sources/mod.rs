use async_trait::async_trait;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub mod innertube;
pub mod json3;
pub mod ytdlp;

use crate::config::SourceConfig;
use crate::{Result, TranscriptError};

const MAX_VIDEO_ID_LEN: usize = 64;

/// Validated identifier of a remote video
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

impl VideoId {
    /// Validate a raw identifier: non-empty, `[A-Za-z0-9_-]` only, bounded length
    pub fn parse(raw: &str) -> std::result::Result<Self, TranscriptError> {
        let id = raw.trim();

        let valid = !id.is_empty()
            && id.len() <= MAX_VIDEO_ID_LEN
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

        if valid {
            Ok(Self(id.to_string()))
        } else {
            Err(TranscriptError::InvalidIdentifier(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical watch page URL for this video
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a transcript variant was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Speech recognition output
    Generated,
    /// Authored by a person
    Manual,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Generated => write!(f, "generated"),
            Origin::Manual => write!(f, "manual"),
        }
    }
}

/// One transcript variant exposed by the upstream service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptCandidate {
    /// Language code as reported upstream (e.g. "en", "pt-BR")
    pub language_code: String,

    /// Human readable language name, if the backend provides one
    pub language_name: Option<String>,

    pub origin: Origin,

    /// Whether the upstream service can translate this variant
    pub is_translatable: bool,

    /// Backend-specific handle used to fetch the payload (e.g. a caption track URL)
    pub locator: String,
}

impl TranscriptCandidate {
    pub fn new(language_code: impl Into<String>, origin: Origin, is_translatable: bool) -> Self {
        Self {
            language_code: language_code.into(),
            language_name: None,
            origin,
            is_translatable,
            locator: String::new(),
        }
    }

    pub fn with_language_name(mut self, name: Option<String>) -> Self {
        self.language_name = name;
        self
    }

    pub fn with_locator(mut self, locator: impl Into<String>) -> Self {
        self.locator = locator.into();
        self
    }
}

/// Which preference rule produced a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionRule {
    GeneratedInPreferred,
    ManualInPreferred,
    FirstTranslatable,
}

impl fmt::Display for SelectionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionRule::GeneratedInPreferred => write!(f, "generated_in_preferred"),
            SelectionRule::ManualInPreferred => write!(f, "manual_in_preferred"),
            SelectionRule::FirstTranslatable => write!(f, "first_translatable"),
        }
    }
}

/// The candidate chosen for this attempt, plus a translation target when one is needed
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedTranscript {
    pub candidate: TranscriptCandidate,
    pub target_language: Option<String>,
    pub rule: SelectionRule,
}

impl SelectedTranscript {
    /// Translation target, if it differs from the candidate's own language
    pub fn translation_target(&self) -> Option<&str> {
        self.target_language
            .as_deref()
            .filter(|target| *target != self.candidate.language_code)
    }
}

/// A single timed line of transcript text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub text: String,

    /// Start offset in seconds
    pub start: f64,

    /// Duration in seconds
    pub duration: f64,
}

impl TranscriptEntry {
    pub fn new(text: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            text: text.into(),
            start,
            duration,
        }
    }
}

/// Upstream transcript service capability
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Name of the backend (for logging)
    fn name(&self) -> &'static str;

    /// List the transcript variants available for a video, in upstream order
    async fn list_transcripts(&self, video_id: &VideoId) -> Result<Vec<TranscriptCandidate>>;

    /// Fetch the timed text of a candidate, translated when `target_language` is set
    async fn fetch_transcript(
        &self,
        candidate: &TranscriptCandidate,
        target_language: Option<&str>,
    ) -> Result<Vec<TranscriptEntry>>;
}

/// Available backends
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// YouTube player API over HTTP
    Innertube,
    /// yt-dlp subprocess for listing, HTTP for the payload
    YtDlp,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Innertube => write!(f, "innertube"),
            SourceKind::YtDlp => write!(f, "yt-dlp"),
        }
    }
}

/// Build the backend for `kind` from configuration
pub fn build_source(kind: SourceKind, config: &SourceConfig) -> Result<Arc<dyn TranscriptSource>> {
    let source: Arc<dyn TranscriptSource> = match kind {
        SourceKind::Innertube => Arc::new(innertube::InnertubeSource::new(config)?),
        SourceKind::YtDlp => Arc::new(ytdlp::YtDlpSource::new(config)?),
    };

    tracing::debug!("Using transcript backend: {}", source.name());
    Ok(source)
}
