//! Transcript Fetcher - A Rust CLI tool for fetching YouTube transcripts
//!
//! This library resolves the best available transcript for a video: it lists the
//! caption tracks the upstream service exposes, picks one according to a fixed
//! preference order (generated, then manual, then translation), fetches the timed
//! text and retries the whole resolution under a bounded, fixed-delay policy.

use std::fmt;

pub mod cli;
pub mod config;
pub mod output;
pub mod resolve;
pub mod sources;
pub mod utils;

pub use cli::{Cli, Commands, OutputFormat};
pub use config::Config;
pub use resolve::{Pause, ResolvedTranscript, RetryPolicy, TokioPause, TranscriptResolver};
pub use sources::{
    Origin, SelectedTranscript, SelectionRule, SourceKind, TranscriptCandidate, TranscriptEntry,
    TranscriptSource, VideoId,
};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Coarse failure category reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    InvalidIdentifier,
    NoSuitableTranscript,
    ListingFailed,
    FetchFailed,
    ExhaustedRetries,
}

impl FailureCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureCategory::InvalidIdentifier => "invalid_identifier",
            FailureCategory::NoSuitableTranscript => "no_suitable_transcript",
            FailureCategory::ListingFailed => "listing_failed",
            FailureCategory::FetchFailed => "fetch_failed",
            FailureCategory::ExhaustedRetries => "exhausted_retries",
        }
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error types produced by transcript resolution
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TranscriptError {
    #[error("invalid video identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("listing transcripts failed: {0}")]
    ListingFailed(String),

    #[error("no suitable transcript for language '{language}' (available: {available})")]
    NoSuitableTranscript { language: String, available: String },

    #[error("fetching transcript failed: {0}")]
    FetchFailed(String),

    #[error("all {attempts} attempt(s) failed; last error [{}]: {last}", .last.category())]
    ExhaustedRetries {
        attempts: u32,
        #[source]
        last: Box<TranscriptError>,
    },
}

impl TranscriptError {
    pub fn category(&self) -> FailureCategory {
        match self {
            TranscriptError::InvalidIdentifier(_) => FailureCategory::InvalidIdentifier,
            TranscriptError::ListingFailed(_) => FailureCategory::ListingFailed,
            TranscriptError::NoSuitableTranscript { .. } => FailureCategory::NoSuitableTranscript,
            TranscriptError::FetchFailed(_) => FailureCategory::FetchFailed,
            TranscriptError::ExhaustedRetries { .. } => FailureCategory::ExhaustedRetries,
        }
    }

    /// Failures that another attempt cannot change
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            TranscriptError::InvalidIdentifier(_) | TranscriptError::NoSuitableTranscript { .. }
        )
    }

    /// The underlying stage failure, unwrapping `ExhaustedRetries`
    pub fn last_cause(&self) -> &TranscriptError {
        match self {
            TranscriptError::ExhaustedRetries { last, .. } => last.last_cause(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausted_message_names_last_category() {
        let err = TranscriptError::ExhaustedRetries {
            attempts: 3,
            last: Box::new(TranscriptError::ListingFailed("HTTP 429".to_string())),
        };

        let message = err.to_string();
        assert!(message.contains("all 3 attempt(s) failed"));
        assert!(message.contains("[listing_failed]"));
        assert!(message.contains("HTTP 429"));
        assert_eq!(err.category(), FailureCategory::ExhaustedRetries);
        assert_eq!(err.last_cause().category(), FailureCategory::ListingFailed);
    }

    #[test]
    fn test_permanent_categories() {
        assert!(TranscriptError::InvalidIdentifier("?".to_string()).is_permanent());
        assert!(TranscriptError::NoSuitableTranscript {
            language: "en".to_string(),
            available: "none".to_string(),
        }
        .is_permanent());
        assert!(!TranscriptError::FetchFailed("timeout".to_string()).is_permanent());
        assert!(!TranscriptError::ListingFailed("timeout".to_string()).is_permanent());
    }

    #[test]
    fn test_exhausted_exposes_source() {
        use std::error::Error;

        let err = TranscriptError::ExhaustedRetries {
            attempts: 1,
            last: Box::new(TranscriptError::FetchFailed("boom".to_string())),
        };
        let source = err.source().map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("fetching transcript failed: boom"));
    }
}
