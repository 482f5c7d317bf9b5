//! Polling for provider-side synthesis jobs.
//!
//! Async providers answer a dispatch with job handles; this module
//! drives them to a terminal state with a fixed-interval status loop
//! bounded by an overall wall-clock deadline. Exponential backoff is
//! deliberately absent: job durations are minutes-scale and a status
//! call every few seconds is cheap relative to job latency.
//!
//! Every poll is owned by the call that started it and carries a
//! cancellation token that can be triggered from another task. A
//! cancelled poll stops issuing status calls and releases its timer; no
//! provider-side job cancellation is attempted (not all providers
//! support it).

use crate::error::ProviderError;
use crate::providers::{JobHandle, JobPair};
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Status of one provider-side job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Completed { output_uri: String },
    Failed { reason: String },
}

/// A source of job status, implemented by the Polly client and by test
/// fakes.
pub trait JobStatusSource {
    fn job_status(
        &self,
        handle: &JobHandle,
    ) -> impl Future<Output = Result<JobState, ProviderError>> + Send;
}

/// Creates a linked cancellation handle/token pair.
pub fn cancellation() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

/// Triggers cancellation of the polls holding the linked tokens. Safe
/// to call from any task.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Observes a cancellation handle.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves when cancellation is triggered. If the handle is
    /// dropped without cancelling, this never resolves.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Terminal outcome of polling one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollResult {
    Completed { output_uri: String },
    Failed { reason: String },
    TimedOut,
    Cancelled,
}

/// Polls `handle` at a fixed `interval` until it completes, fails, the
/// wall-clock `timeout` elapses, or `cancel` fires.
///
/// Transient status-call errors are retried on the next tick; anything
/// else fails the poll.
pub async fn poll<S: JobStatusSource>(
    source: &S,
    handle: &JobHandle,
    interval: Duration,
    timeout: Duration,
    mut cancel: CancelToken,
) -> PollResult {
    let deadline = Instant::now() + timeout;

    loop {
        if cancel.is_cancelled() {
            tracing::debug!(job = %handle.id, "poll cancelled");
            return PollResult::Cancelled;
        }

        match source.job_status(handle).await {
            Ok(JobState::Completed { output_uri }) => {
                tracing::debug!(job = %handle.id, "job completed");
                return PollResult::Completed { output_uri };
            }
            Ok(JobState::Failed { reason }) => {
                tracing::warn!(job = %handle.id, %reason, "job failed");
                return PollResult::Failed { reason };
            }
            Ok(JobState::Pending) => {}
            Err(e) if e.is_transient() => {
                tracing::debug!(job = %handle.id, error = %e, "transient status error, will retry");
            }
            Err(e) => {
                return PollResult::Failed {
                    reason: e.to_string(),
                };
            }
        }

        let now = Instant::now();
        if now >= deadline {
            tracing::warn!(job = %handle.id, "poll deadline elapsed");
            return PollResult::TimedOut;
        }
        let tick = interval.min(deadline - now);

        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(job = %handle.id, "poll cancelled");
                return PollResult::Cancelled;
            }
            _ = tokio::time::sleep(tick) => {}
        }

        if Instant::now() >= deadline {
            tracing::warn!(job = %handle.id, "poll deadline elapsed");
            return PollResult::TimedOut;
        }
    }
}

/// Output of a completed job pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairOutput {
    pub audio_uri: String,
    pub marks_uri: Option<String>,
}

/// Terminal outcome of polling a job pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairResult {
    Completed(PairOutput),
    Failed { reason: String },
    TimedOut,
    Cancelled,
}

/// Polls a job pair (audio + optional marks) concurrently.
///
/// The pair completes only when every member completes. The first
/// failure or timeout cancels the sibling's polling; a failure of
/// either member fails the pair.
pub async fn poll_pair<S: JobStatusSource + Sync>(
    source: &S,
    pair: &JobPair,
    interval: Duration,
    timeout: Duration,
    mut cancel: CancelToken,
) -> PairResult {
    let (inner_handle, inner_token) = cancellation();

    let audio_poll = async {
        let result = poll(source, &pair.audio, interval, timeout, inner_token.clone()).await;
        if !matches!(result, PollResult::Completed { .. }) {
            inner_handle.cancel();
        }
        result
    };

    let marks_poll = async {
        match &pair.marks {
            None => None,
            Some(handle) => {
                let result = poll(source, handle, interval, timeout, inner_token.clone()).await;
                if !matches!(result, PollResult::Completed { .. }) {
                    inner_handle.cancel();
                }
                Some(result)
            }
        }
    };

    let joined = async { tokio::join!(audio_poll, marks_poll) };

    let (audio_result, marks_result) = tokio::select! {
        _ = cancel.cancelled() => {
            inner_handle.cancel();
            return PairResult::Cancelled;
        }
        results = joined => results,
    };

    let members = [Some(&audio_result), marks_result.as_ref()];
    for member in members.into_iter().flatten() {
        if let PollResult::Failed { reason } = member {
            return PairResult::Failed {
                reason: reason.clone(),
            };
        }
    }
    for member in members.into_iter().flatten() {
        if matches!(member, PollResult::TimedOut) {
            return PairResult::TimedOut;
        }
    }
    for member in members.into_iter().flatten() {
        if matches!(member, PollResult::Cancelled) {
            return PairResult::Cancelled;
        }
    }

    let audio_uri = match audio_result {
        PollResult::Completed { output_uri } => output_uri,
        _ => unreachable!("non-completed results handled above"),
    };
    let marks_uri = marks_result.map(|r| match r {
        PollResult::Completed { output_uri } => output_uri,
        _ => unreachable!("non-completed results handled above"),
    });

    PairResult::Completed(PairOutput {
        audio_uri,
        marks_uri,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::JobKind;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Scripted status source: each handle id maps to a sequence of
    /// states returned in order, holding the last one thereafter.
    struct ScriptedSource {
        scripts: Mutex<HashMap<String, Vec<Result<JobState, ProviderError>>>>,
        calls: Mutex<HashMap<String, usize>>,
    }

    impl ScriptedSource {
        fn new() -> Self {
            Self {
                scripts: Mutex::new(HashMap::new()),
                calls: Mutex::new(HashMap::new()),
            }
        }

        fn script(
            mut self,
            id: &str,
            states: Vec<Result<JobState, ProviderError>>,
        ) -> Self {
            self.scripts.get_mut().unwrap().insert(id.to_string(), states);
            self
        }

        fn call_count(&self, id: &str) -> usize {
            *self.calls.lock().unwrap().get(id).unwrap_or(&0)
        }
    }

    impl JobStatusSource for ScriptedSource {
        async fn job_status(&self, handle: &JobHandle) -> Result<JobState, ProviderError> {
            let mut calls = self.calls.lock().unwrap();
            let n = calls.entry(handle.id.clone()).or_insert(0);
            let i = *n;
            *n += 1;
            drop(calls);

            let scripts = self.scripts.lock().unwrap();
            let script = scripts
                .get(&handle.id)
                .unwrap_or_else(|| panic!("no script for job {}", handle.id));
            script[i.min(script.len() - 1)].clone()
        }
    }

    fn handle(id: &str, kind: JobKind) -> JobHandle {
        JobHandle {
            id: id.to_string(),
            kind,
        }
    }

    fn completed(uri: &str) -> Result<JobState, ProviderError> {
        Ok(JobState::Completed {
            output_uri: uri.to_string(),
        })
    }

    const INTERVAL: Duration = Duration::from_secs(5);
    const TIMEOUT: Duration = Duration::from_secs(60);

    #[tokio::test(start_paused = true)]
    async fn completes_after_pending_ticks() {
        let source = ScriptedSource::new().script(
            "a",
            vec![Ok(JobState::Pending), Ok(JobState::Pending), completed("s3://out/a.mp3")],
        );
        let (_cancel, token) = cancellation();

        let result = poll(&source, &handle("a", JobKind::Audio), INTERVAL, TIMEOUT, token).await;
        assert_eq!(
            result,
            PollResult::Completed {
                output_uri: "s3://out/a.mp3".to_string()
            }
        );
        assert_eq!(source.call_count("a"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_is_terminal() {
        let source = ScriptedSource::new().script(
            "a",
            vec![
                Ok(JobState::Pending),
                Ok(JobState::Failed {
                    reason: "voice not available".to_string(),
                }),
            ],
        );
        let (_cancel, token) = cancellation();

        let result = poll(&source, &handle("a", JobKind::Audio), INTERVAL, TIMEOUT, token).await;
        assert_eq!(
            result,
            PollResult::Failed {
                reason: "voice not available".to_string()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn transient_errors_are_retried() {
        let source = ScriptedSource::new().script(
            "a",
            vec![
                Err(ProviderError::Transient("503".to_string())),
                completed("s3://out/a.mp3"),
            ],
        );
        let (_cancel, token) = cancellation();

        let result = poll(&source, &handle("a", JobKind::Audio), INTERVAL, TIMEOUT, token).await;
        assert!(matches!(result, PollResult::Completed { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn rejection_fails_the_poll() {
        let source = ScriptedSource::new().script(
            "a",
            vec![Err(ProviderError::from_status(403, "forbidden"))],
        );
        let (_cancel, token) = cancellation();

        let result = poll(&source, &handle("a", JobKind::Audio), INTERVAL, TIMEOUT, token).await;
        assert!(matches!(result, PollResult::Failed { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_on_wall_clock_deadline() {
        let source = ScriptedSource::new().script("a", vec![Ok(JobState::Pending)]);
        let (_cancel, token) = cancellation();

        let result = poll(
            &source,
            &handle("a", JobKind::Audio),
            INTERVAL,
            Duration::from_secs(12),
            token,
        )
        .await;
        assert_eq!(result, PollResult::TimedOut);
        // 12s deadline at 5s interval: status calls at t=0, 5, 10.
        assert_eq!(source.call_count("a"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_polling() {
        let source = ScriptedSource::new().script("a", vec![Ok(JobState::Pending)]);
        let (cancel, token) = cancellation();

        let poll_task = tokio::spawn(async move {
            let source = source;
            let result = poll(
                &source,
                &handle("a", JobKind::Audio),
                INTERVAL,
                TIMEOUT,
                token,
            )
            .await;
            (result, source.call_count("a"))
        });

        // Let a couple of ticks pass, then cancel from this task.
        tokio::time::sleep(Duration::from_secs(7)).await;
        cancel.cancel();

        let (result, calls) = poll_task.await.unwrap();
        assert_eq!(result, PollResult::Cancelled);
        assert!(calls <= 2, "polling must stop after cancellation");
    }

    #[tokio::test(start_paused = true)]
    async fn pair_completes_when_both_complete() {
        let source = ScriptedSource::new()
            .script("audio", vec![Ok(JobState::Pending), completed("s3://out/a.mp3")])
            .script("marks", vec![completed("s3://out/a.marks")]);
        let (_cancel, token) = cancellation();

        let pair = JobPair {
            audio: handle("audio", JobKind::Audio),
            marks: Some(handle("marks", JobKind::Marks)),
        };
        let result = poll_pair(&source, &pair, INTERVAL, TIMEOUT, token).await;
        assert_eq!(
            result,
            PairResult::Completed(PairOutput {
                audio_uri: "s3://out/a.mp3".to_string(),
                marks_uri: Some("s3://out/a.marks".to_string()),
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn pair_failure_cancels_sibling() {
        let source = ScriptedSource::new()
            .script(
                "audio",
                vec![Ok(JobState::Failed {
                    reason: "synthesis error".to_string(),
                })],
            )
            .script("marks", vec![Ok(JobState::Pending)]);
        let (_cancel, token) = cancellation();

        let pair = JobPair {
            audio: handle("audio", JobKind::Audio),
            marks: Some(handle("marks", JobKind::Marks)),
        };
        let result = poll_pair(&source, &pair, INTERVAL, TIMEOUT, token).await;
        assert_eq!(
            result,
            PairResult::Failed {
                reason: "synthesis error".to_string()
            }
        );
        // The marks poll saw the cancellation instead of spinning to
        // its own deadline.
        assert!(source.call_count("marks") <= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn pair_without_marks_member_completes_on_audio_alone() {
        let source =
            ScriptedSource::new().script("audio", vec![completed("s3://out/a.mp3")]);
        let (_cancel, token) = cancellation();

        let pair = JobPair {
            audio: handle("audio", JobKind::Audio),
            marks: None,
        };
        let result = poll_pair(&source, &pair, INTERVAL, TIMEOUT, token).await;
        assert_eq!(
            result,
            PairResult::Completed(PairOutput {
                audio_uri: "s3://out/a.mp3".to_string(),
                marks_uri: None,
            })
        );
    }
}
