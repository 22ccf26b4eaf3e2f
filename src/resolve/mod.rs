use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub mod selector;

pub use selector::{select, SELECTION_ORDER};

use crate::sources::{
    SelectedTranscript, TranscriptCandidate, TranscriptEntry, TranscriptSource, VideoId,
};
use crate::TranscriptError;

/// Bounded, fixed-delay retry policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
    fail_fast: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(5))
    }
}

impl RetryPolicy {
    /// `max_attempts` counts the first attempt and is raised to at least 1
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            fail_fast: false,
        }
    }

    /// Stop retrying on failures another attempt cannot fix (invalid ID, no suitable transcript)
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn fail_fast(&self) -> bool {
        self.fail_fast
    }
}

/// Suspends resolution between attempts
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Pause: Send + Sync {
    async fn pause(&self, delay: Duration);
}

/// Pause backed by the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioPause;

#[async_trait]
impl Pause for TokioPause {
    async fn pause(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// Stage of a single attempt, for structured logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    List,
    Select,
    Fetch,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::List => write!(f, "list"),
            Stage::Select => write!(f, "select"),
            Stage::Fetch => write!(f, "fetch"),
        }
    }
}

/// Successful outcome of resolution
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTranscript {
    pub video_id: VideoId,
    pub selection: SelectedTranscript,
    pub entries: Vec<TranscriptEntry>,

    /// Attempts used, including the successful one
    pub attempts: u32,
}

/// List the candidates for a raw identifier; validation happens before any network call
pub async fn list_candidates(
    source: &dyn TranscriptSource,
    raw_video_id: &str,
) -> Result<(VideoId, Vec<TranscriptCandidate>), TranscriptError> {
    let video_id = VideoId::parse(raw_video_id)?;

    let candidates = source
        .list_transcripts(&video_id)
        .await
        .map_err(|e| TranscriptError::ListingFailed(format!("{:#}", e)))?;

    Ok((video_id, candidates))
}

/// Fetch the entries of a selection, requesting translation when it has a target language
pub async fn fetch_entries(
    source: &dyn TranscriptSource,
    selected: &SelectedTranscript,
) -> Result<Vec<TranscriptEntry>, TranscriptError> {
    let target = selected.translation_target();

    if let Some(lang) = target {
        if !selected.candidate.is_translatable {
            return Err(TranscriptError::FetchFailed(format!(
                "transcript in '{}' cannot be translated to '{}'",
                selected.candidate.language_code, lang
            )));
        }
    }

    source
        .fetch_transcript(&selected.candidate, target)
        .await
        .map_err(|e| TranscriptError::FetchFailed(format!("{:#}", e)))
}

/// Resolves transcripts: list, select, fetch, and retry the whole sequence on failure
pub struct TranscriptResolver {
    source: Arc<dyn TranscriptSource>,
    policy: RetryPolicy,
    pause: Arc<dyn Pause>,
}

impl TranscriptResolver {
    pub fn new(source: Arc<dyn TranscriptSource>, policy: RetryPolicy) -> Self {
        Self {
            source,
            policy,
            pause: Arc::new(TokioPause),
        }
    }

    /// Replace the timer used between attempts
    pub fn with_pause(mut self, pause: Arc<dyn Pause>) -> Self {
        self.pause = pause;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Resolve the best transcript for `raw_video_id` in `preferred_language`.
    ///
    /// Each attempt starts from a fresh listing. After the last attempt the
    /// final stage failure is returned wrapped in `ExhaustedRetries`.
    pub async fn resolve(
        &self,
        raw_video_id: &str,
        preferred_language: &str,
    ) -> Result<ResolvedTranscript, TranscriptError> {
        let max_attempts = self.policy.max_attempts;
        let mut attempt = 0;

        loop {
            attempt += 1;
            tracing::debug!(
                video_id = raw_video_id,
                attempt,
                max_attempts,
                backend = self.source.name(),
                "Starting transcript attempt"
            );

            let (stage, error) = match self.attempt(raw_video_id, preferred_language).await {
                Ok((video_id, selection, entries)) => {
                    tracing::info!(
                        video_id = %video_id,
                        attempt,
                        max_attempts,
                        language = %selection.candidate.language_code,
                        origin = %selection.candidate.origin,
                        target_language = selection.target_language.as_deref().unwrap_or("-"),
                        rule = %selection.rule,
                        entries = entries.len(),
                        "Transcript resolved"
                    );

                    return Ok(ResolvedTranscript {
                        video_id,
                        selection,
                        entries,
                        attempts: attempt,
                    });
                }
                Err(failure) => failure,
            };

            let stop_early = self.policy.fail_fast && error.is_permanent();

            if attempt >= max_attempts || stop_early {
                tracing::error!(
                    video_id = raw_video_id,
                    attempt,
                    max_attempts,
                    stage = %stage,
                    category = %error.category(),
                    "Giving up on transcript: {}",
                    error
                );

                return Err(TranscriptError::ExhaustedRetries {
                    attempts: attempt,
                    last: Box::new(error),
                });
            }

            tracing::warn!(
                video_id = raw_video_id,
                attempt,
                max_attempts,
                stage = %stage,
                category = %error.category(),
                delay_secs = self.policy.delay.as_secs_f64(),
                "Transcript attempt failed, retrying: {}",
                error
            );

            self.pause.pause(self.policy.delay).await;
        }
    }

    /// One unit of work: list, select, fetch
    async fn attempt(
        &self,
        raw_video_id: &str,
        preferred_language: &str,
    ) -> Result<(VideoId, SelectedTranscript, Vec<TranscriptEntry>), (Stage, TranscriptError)> {
        let (video_id, candidates) = list_candidates(self.source.as_ref(), raw_video_id)
            .await
            .map_err(|e| (Stage::List, e))?;
        tracing::debug!(video_id = %video_id, candidates = candidates.len(), "Listed transcripts");

        let selection = select(&candidates, preferred_language).map_err(|e| (Stage::Select, e))?;
        tracing::debug!(
            video_id = %video_id,
            language = %selection.candidate.language_code,
            rule = %selection.rule,
            "Selected transcript"
        );

        let entries = fetch_entries(self.source.as_ref(), &selection)
            .await
            .map_err(|e| (Stage::Fetch, e))?;

        Ok((video_id, selection, entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::Origin;
    use crate::FailureCategory;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Source whose listing fails a fixed number of times before succeeding
    struct FlakySource {
        failures_left: AtomicUsize,
        list_calls: AtomicUsize,
        fetch_calls: Mutex<Vec<Option<String>>>,
        fail_fetch: bool,
        candidates: Vec<TranscriptCandidate>,
    }

    impl FlakySource {
        fn new(failures: usize, candidates: Vec<TranscriptCandidate>) -> Arc<Self> {
            Arc::new(Self {
                failures_left: AtomicUsize::new(failures),
                list_calls: AtomicUsize::new(0),
                fetch_calls: Mutex::new(Vec::new()),
                fail_fetch: false,
                candidates,
            })
        }

        fn with_broken_fetch(candidates: Vec<TranscriptCandidate>) -> Arc<Self> {
            Arc::new(Self {
                failures_left: AtomicUsize::new(0),
                list_calls: AtomicUsize::new(0),
                fetch_calls: Mutex::new(Vec::new()),
                fail_fetch: true,
                candidates,
            })
        }
    }

    #[async_trait]
    impl TranscriptSource for FlakySource {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn list_transcripts(&self, _video_id: &VideoId) -> crate::Result<Vec<TranscriptCandidate>> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            let left = self.failures_left.load(Ordering::SeqCst);
            if left > 0 {
                self.failures_left.store(left - 1, Ordering::SeqCst);
                anyhow::bail!("HTTP 429 Too Many Requests");
            }
            Ok(self.candidates.clone())
        }

        async fn fetch_transcript(
            &self,
            candidate: &TranscriptCandidate,
            target_language: Option<&str>,
        ) -> crate::Result<Vec<TranscriptEntry>> {
            self.fetch_calls
                .lock()
                .unwrap()
                .push(target_language.map(str::to_string));
            if self.fail_fetch {
                anyhow::bail!("HTTP 404 Not Found");
            }
            Ok(vec![TranscriptEntry::new(
                format!("{} line", target_language.unwrap_or(&candidate.language_code)),
                0.0,
                1.0,
            )])
        }
    }

    fn english() -> Vec<TranscriptCandidate> {
        vec![TranscriptCandidate::new("en", Origin::Generated, false)]
    }

    fn pauses(expected: usize, delay: Duration) -> Arc<MockPause> {
        let mut pause = MockPause::new();
        pause
            .expect_pause()
            .times(expected)
            .withf(move |d| *d == delay)
            .returning(|_| ());
        Arc::new(pause)
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let source = FlakySource::new(2, english());
        let delay = Duration::from_secs(5);
        let resolver = TranscriptResolver::new(source.clone(), RetryPolicy::new(3, delay))
            .with_pause(pauses(2, delay));

        let resolved = resolver.resolve("abc123", "en").await;
        let resolved = tokio_test::assert_ok!(resolved);

        assert_eq!(resolved.attempts, 3);
        assert_eq!(resolved.entries.len(), 1);
        assert_eq!(source.list_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausts_after_max_attempts() {
        let source = FlakySource::new(usize::MAX, english());
        let delay = Duration::from_millis(250);
        let resolver = TranscriptResolver::new(source.clone(), RetryPolicy::new(4, delay))
            .with_pause(pauses(3, delay));

        let err = tokio_test::assert_err!(resolver.resolve("abc123", "en").await);

        assert_eq!(source.list_calls.load(Ordering::SeqCst), 4);
        match &err {
            TranscriptError::ExhaustedRetries { attempts, last } => {
                assert_eq!(*attempts, 4);
                assert_eq!(last.category(), FailureCategory::ListingFailed);
                assert!(last.to_string().contains("429"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_identifier_retries_by_default() {
        let source = FlakySource::new(0, english());
        let resolver = TranscriptResolver::new(source.clone(), RetryPolicy::new(3, Duration::ZERO))
            .with_pause(pauses(2, Duration::ZERO));

        let err = resolver.resolve("not a video id", "en").await.unwrap_err();

        assert_eq!(err.last_cause().category(), FailureCategory::InvalidIdentifier);
        assert_eq!(source.list_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fail_fast_stops_on_permanent_failure() {
        let source = FlakySource::new(0, vec![]);
        let policy = RetryPolicy::new(3, Duration::from_secs(5)).with_fail_fast(true);
        let resolver = TranscriptResolver::new(source.clone(), policy).with_pause(pauses(0, Duration::ZERO));

        let err = resolver.resolve("abc123", "en").await.unwrap_err();

        assert_eq!(
            err,
            TranscriptError::ExhaustedRetries {
                attempts: 1,
                last: Box::new(TranscriptError::NoSuitableTranscript {
                    language: "en".to_string(),
                    available: "none".to_string(),
                }),
            }
        );
        assert_eq!(source.list_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fail_fast_still_retries_transient_failures() {
        let source = FlakySource::new(1, english());
        let delay = Duration::from_secs(1);
        let policy = RetryPolicy::new(3, delay).with_fail_fast(true);
        let resolver = TranscriptResolver::new(source.clone(), policy).with_pause(pauses(1, delay));

        let resolved = resolver.resolve("abc123", "en").await.unwrap();
        assert_eq!(resolved.attempts, 2);
    }

    #[tokio::test]
    async fn test_translation_requested_for_foreign_candidate() {
        let source = FlakySource::new(0, vec![TranscriptCandidate::new("fr", Origin::Generated, true)]);
        let resolver = TranscriptResolver::new(source.clone(), RetryPolicy::default())
            .with_pause(pauses(0, Duration::ZERO));

        let resolved = resolver.resolve("xyz789", "en").await.unwrap();

        assert_eq!(resolved.selection.target_language.as_deref(), Some("en"));
        assert_eq!(resolved.entries[0].text, "en line");
        assert_eq!(*source.fetch_calls.lock().unwrap(), vec![Some("en".to_string())]);
    }

    #[tokio::test]
    async fn test_fetch_refuses_untranslatable_target() {
        let source = FlakySource::new(0, vec![]);
        let selected = SelectedTranscript {
            candidate: TranscriptCandidate::new("fr", Origin::Manual, false),
            target_language: Some("en".to_string()),
            rule: crate::sources::SelectionRule::FirstTranslatable,
        };

        let err = fetch_entries(&*source, &selected).await.unwrap_err();
        assert_eq!(err.category(), FailureCategory::FetchFailed);
        assert!(source.fetch_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_attempt_reports_failing_stage() {
        let listing = TranscriptResolver::new(FlakySource::new(1, english()), RetryPolicy::default());
        let (stage, err) = listing.attempt("abc123", "en").await.unwrap_err();
        assert_eq!(stage, Stage::List);
        assert_eq!(err.category(), FailureCategory::ListingFailed);

        let invalid = TranscriptResolver::new(FlakySource::new(0, english()), RetryPolicy::default());
        let (stage, _) = invalid.attempt("not a video id", "en").await.unwrap_err();
        assert_eq!(stage, Stage::List);

        let selecting = TranscriptResolver::new(FlakySource::new(0, vec![]), RetryPolicy::default());
        let (stage, err) = selecting.attempt("abc123", "en").await.unwrap_err();
        assert_eq!(stage, Stage::Select);
        assert_eq!(err.category(), FailureCategory::NoSuitableTranscript);

        let fetching = TranscriptResolver::new(FlakySource::with_broken_fetch(english()), RetryPolicy::default());
        let (stage, err) = fetching.attempt("abc123", "en").await.unwrap_err();
        assert_eq!(stage, Stage::Fetch);
        assert_eq!(err.category(), FailureCategory::FetchFailed);
    }

    #[test]
    fn test_policy_has_at_least_one_attempt() {
        let policy = RetryPolicy::new(0, Duration::from_secs(1));
        assert_eq!(policy.max_attempts(), 1);
        assert!(!policy.fail_fast());
        assert_eq!(RetryPolicy::default().delay(), Duration::from_secs(5));
    }

    #[test]
    fn test_tokio_pause_waits() {
        tokio_test::block_on(async {
            let started = std::time::Instant::now();
            TokioPause.pause(Duration::from_millis(10)).await;
            assert!(started.elapsed() >= Duration::from_millis(10));
        });
    }
}
