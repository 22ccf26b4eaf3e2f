//! Scripted transcript sources for integration tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use transcript_fetcher::{Pause, TranscriptCandidate, TranscriptEntry, TranscriptSource, VideoId};

/// What a scripted listing call does
#[derive(Clone)]
pub enum Listing {
    Ok(Vec<TranscriptCandidate>),
    Fail(&'static str),
}

/// Calls observed by a scripted source
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Calls {
    pub listed: Vec<String>,
    pub fetched: Vec<(String, Option<String>)>,
}

/// Source that replays a script of listing results; the last one repeats forever
pub struct ScriptedSource {
    listings: Mutex<VecDeque<Listing>>,
    entries: Vec<TranscriptEntry>,
    translations: Vec<(String, Vec<TranscriptEntry>)>,
    calls: Mutex<Calls>,
}

impl ScriptedSource {
    pub fn new(listings: Vec<Listing>, entries: Vec<TranscriptEntry>) -> Self {
        Self {
            listings: Mutex::new(listings.into()),
            entries,
            translations: Vec::new(),
            calls: Mutex::new(Calls::default()),
        }
    }

    /// Entries returned when translation into `language` is requested
    pub fn with_translation(mut self, language: &str, entries: Vec<TranscriptEntry>) -> Self {
        self.translations.push((language.to_string(), entries));
        self
    }

    pub fn calls(&self) -> Calls {
        self.calls.lock().unwrap().clone()
    }

    fn next_listing(&self) -> Listing {
        let mut listings = self.listings.lock().unwrap();
        if listings.len() > 1 {
            listings.pop_front().unwrap()
        } else {
            listings.front().cloned().unwrap_or(Listing::Ok(Vec::new()))
        }
    }
}

#[async_trait]
impl TranscriptSource for ScriptedSource {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn list_transcripts(&self, video_id: &VideoId) -> anyhow::Result<Vec<TranscriptCandidate>> {
        self.calls.lock().unwrap().listed.push(video_id.to_string());

        match self.next_listing() {
            Listing::Ok(candidates) => Ok(candidates),
            Listing::Fail(reason) => anyhow::bail!("{}", reason),
        }
    }

    async fn fetch_transcript(
        &self,
        candidate: &TranscriptCandidate,
        target_language: Option<&str>,
    ) -> anyhow::Result<Vec<TranscriptEntry>> {
        self.calls
            .lock()
            .unwrap()
            .fetched
            .push((candidate.language_code.clone(), target_language.map(str::to_string)));

        match target_language {
            None => Ok(self.entries.clone()),
            Some(lang) => self
                .translations
                .iter()
                .find(|(l, _)| l == lang)
                .map(|(_, entries)| entries.clone())
                .ok_or_else(|| anyhow::anyhow!("translation to {} unavailable", lang)),
        }
    }
}

/// Pause that records requested delays instead of sleeping
#[derive(Default)]
pub struct RecordingPause {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingPause {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait]
impl Pause for RecordingPause {
    async fn pause(&self, delay: Duration) {
        self.delays.lock().unwrap().push(delay);
    }
}
