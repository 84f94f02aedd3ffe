//! Quality-gated retry loop
//!
//! State machine per call:
//!
//! ```text
//! PENDING → (generate → check) → ACCEPTED
//!                              → RETRY → … → ACCEPTED | EXHAUSTED
//! ```

use crate::error::GenerationFailure;
use crate::outcome::{
    Accepted, AttemptRecord, AttemptStatus, Exhausted, ExhaustionReason, GenerationOutcome,
};
use crate::policy::{CancellationToken, RetryPolicy};
use epa_quality::QualityGate;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Opaque generation backend: `generate(prompt) -> text`
pub trait Generator {
    /// Produce text for a prompt
    ///
    /// # Errors
    /// Returns [`GenerationFailure`] on transport or backend error
    fn generate(&mut self, prompt: &str) -> Result<String, GenerationFailure>;
}

impl<F> Generator for F
where
    F: FnMut(&str) -> Result<String, GenerationFailure>,
{
    fn generate(&mut self, prompt: &str) -> Result<String, GenerationFailure> {
        self(prompt)
    }
}

type Sleeper = Arc<dyn Fn(Duration) + Send + Sync>;

/// Runs a generation function until its output passes the quality gate
///
/// At most `max_retries + 1` calls are made. Generation failures are
/// recorded and count against the same budget; they never escape [`run`](Self::run).
#[derive(Clone)]
pub struct RetryOrchestrator {
    policy: RetryPolicy,
    gate: QualityGate,
    cancel: Option<CancellationToken>,
    sleeper: Sleeper,
}

impl fmt::Debug for RetryOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryOrchestrator")
            .field("policy", &self.policy)
            .field("gate", &self.gate)
            .field("cancellable", &self.cancel.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for RetryOrchestrator {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

impl RetryOrchestrator {
    /// Create orchestrator with the built-in quality gate
    #[must_use]
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            gate: QualityGate::new(),
            cancel: None,
            sleeper: Arc::new(std::thread::sleep),
        }
    }

    /// With custom quality gate
    #[must_use]
    pub fn with_gate(mut self, gate: QualityGate) -> Self {
        self.gate = gate;
        self
    }

    /// With cancellation token, checked before every attempt
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// With custom sleep function for backoff delays
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: impl Fn(Duration) + Send + Sync + 'static) -> Self {
        self.sleeper = Arc::new(sleeper);
        self
    }

    /// Retry policy in use
    #[inline]
    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Quality gate in use
    #[inline]
    #[must_use]
    pub fn gate(&self) -> &QualityGate {
        &self.gate
    }

    /// Run the loop
    ///
    /// # Errors
    /// Returns [`Exhausted`] when no attempt produced clean text within the
    /// budget, or when cancellation was requested. It carries the last
    /// produced text and the full attempt history.
    pub fn run<F>(&self, mut generate_fn: F) -> Result<Accepted, Exhausted>
    where
        F: FnMut() -> Result<String, GenerationFailure>,
    {
        let total = self.policy.total_attempts();
        let mut history = Vec::new();
        let mut last: Option<(String, Vec<String>)> = None;
        let mut transport_failures = 0u32;
        let mut made = 0u32;
        let mut reason = ExhaustionReason::BudgetSpent;

        for attempt in 1..=total {
            if self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
                tracing::info!(attempt, "generation cancelled");
                reason = ExhaustionReason::Cancelled;
                break;
            }
            made = attempt;

            let produced = generate_fn().and_then(|text| {
                if text.trim().is_empty() {
                    Err(GenerationFailure::EmptyResponse)
                } else {
                    Ok(text)
                }
            });

            match produced {
                Ok(text) => {
                    let (clean, unresolved) = self.gate.check(&text);
                    if clean {
                        tracing::info!(attempt, "generation accepted");
                        history.push(AttemptRecord {
                            attempt,
                            status: AttemptStatus::Clean,
                        });
                        return Ok(Accepted {
                            content: text,
                            attempts: attempt,
                            history,
                        });
                    }
                    tracing::warn!(
                        attempt,
                        unresolved = unresolved.len(),
                        "generated text still contains placeholders"
                    );
                    history.push(AttemptRecord {
                        attempt,
                        status: AttemptStatus::Dirty {
                            unresolved: unresolved.clone(),
                        },
                    });
                    last = Some((text, unresolved));
                }
                Err(error) => {
                    tracing::error!(attempt, %error, "generation call failed");
                    let wait = if error.is_transport() && attempt < total {
                        transport_failures += 1;
                        self.policy.backoff.delay(transport_failures)
                    } else {
                        None
                    };
                    history.push(AttemptRecord {
                        attempt,
                        status: AttemptStatus::Failed { error },
                    });
                    if let Some(delay) = wait {
                        tracing::debug!(attempt, ?delay, "backing off");
                        (self.sleeper)(delay);
                    }
                }
            }
        }

        let (last_content, unresolved) = match last {
            Some((text, unresolved)) => (Some(text), unresolved),
            None => (None, Vec::new()),
        };
        tracing::warn!(
            attempts = made,
            unresolved = unresolved.len(),
            %reason,
            "generation exhausted"
        );
        Err(Exhausted {
            reason,
            attempts: made,
            last_content,
            unresolved,
            history,
        })
    }

    /// Run the loop against a [`Generator`] with a fixed prompt
    ///
    /// # Errors
    /// See [`run`](Self::run)
    pub fn run_generator<G>(&self, generator: &mut G, prompt: &str) -> Result<Accepted, Exhausted>
    where
        G: Generator + ?Sized,
    {
        self.run(|| generator.generate(prompt))
    }
}

/// Run the loop with the built-in gate and no backoff
///
/// `max_attempts` is the retry count: up to `max_attempts + 1` calls are made.
pub fn run<F>(generate_fn: F, max_attempts: u32) -> GenerationOutcome
where
    F: FnMut() -> Result<String, GenerationFailure>,
{
    RetryOrchestrator::new(RetryPolicy::new(max_attempts))
        .run(generate_fn)
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Backoff;
    use std::sync::Mutex;

    fn scripted(
        responses: Vec<Result<&'static str, GenerationFailure>>,
    ) -> impl FnMut() -> Result<String, GenerationFailure> {
        let mut iter = responses.into_iter();
        move || {
            iter.next()
                .unwrap_or(Err(GenerationFailure::EmptyResponse))
                .map(str::to_string)
        }
    }

    #[test]
    fn dirty_dirty_clean_accepts_on_third() {
        let outcome = run(
            scripted(vec![Ok("甲方：某某公司1"), Ok("乙方：X1"), Ok("合同已签署。")]),
            2,
        );
        assert!(outcome.success);
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.content.as_deref(), Some("合同已签署。"));
    }

    #[test]
    fn failures_count_against_budget_and_never_escape() {
        let outcome = run(
            scripted(vec![
                Err(GenerationFailure::transport("reset")),
                Ok("某某银行"),
                Err(GenerationFailure::backend(500, "oops")),
            ]),
            2,
        );
        assert!(!outcome.success);
        assert_eq!(outcome.attempts, 3);
        // last produced text survives a trailing failure
        assert_eq!(outcome.content.as_deref(), Some("某某银行"));
        assert_eq!(outcome.unresolved, vec!["某某银行"]);
    }

    #[test]
    fn empty_text_is_a_failed_attempt() {
        let outcome = run(scripted(vec![Ok("   "), Ok("正文")]), 1);
        assert!(outcome.success);
        assert_eq!(outcome.attempts, 2);
        assert!(matches!(
            outcome.history[0].status,
            AttemptStatus::Failed {
                error: GenerationFailure::EmptyResponse
            }
        ));
    }

    #[test]
    fn backoff_only_after_transport_failures() {
        let recorder: Arc<Mutex<Vec<Duration>>> = Arc::default();
        let sink = Arc::clone(&recorder);
        let orchestrator = RetryOrchestrator::new(RetryPolicy::new(4).with_backoff(Backoff::exponential(
            Duration::from_millis(10),
            2,
            Duration::from_millis(15),
        )))
        .with_sleeper(move |d| sink.lock().unwrap().push(d));

        let result = orchestrator.run(scripted(vec![
            Ok("某某公司2"),
            Err(GenerationFailure::transport("timeout")),
            Err(GenerationFailure::backend(400, "bad request")),
            Err(GenerationFailure::backend(503, "busy")),
            Ok("正文"),
        ]));

        assert_eq!(result.map(|a| a.attempts), Ok(5));
        assert_eq!(
            *recorder.lock().unwrap(),
            vec![Duration::from_millis(10), Duration::from_millis(15)]
        );
    }

    #[test]
    fn cancelled_before_first_attempt() {
        let token = CancellationToken::new();
        token.cancel();
        let mut calls = 0;
        let err = RetryOrchestrator::default()
            .with_cancellation(token)
            .run(|| {
                calls += 1;
                Ok("正文".to_string())
            })
            .unwrap_err();
        assert_eq!(calls, 0);
        assert_eq!(err.reason, ExhaustionReason::Cancelled);
        assert_eq!(err.attempts, 0);
    }

    #[test]
    fn generator_trait_for_closures() {
        let mut echo = |prompt: &str| Ok::<_, GenerationFailure>(format!("回复：{prompt}"));
        let accepted = RetryOrchestrator::default()
            .run_generator(&mut echo, "租赁物清单")
            .unwrap();
        assert_eq!(accepted.content, "回复：租赁物清单");
    }
}
