//! Summarization orchestration: input preparation, the retry/fallback state
//! machine, the degraded short-input pass and post-formatting.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::config::{GenerationParams, SummarizerConfig};
use crate::error::{Error, FailureKind, Result};
use crate::format;
use crate::huggingface::InferenceBackend;
use crate::retry::{Sleeper, backoff_delay};
use crate::text;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    /// `attempt` is zero-based within the current model.
    Requesting { model: usize, attempt: u32 },
    Success { model: usize },
    TerminalFailure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Start,
    Succeeded,
    RetryableFailure,
    NonRetryableFailure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: State,
    /// Delay to wait before entering `next`.
    pub backoff: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub model_count: usize,
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &SummarizerConfig, model_count: usize) -> Self {
        Self {
            model_count,
            max_attempts: config.max_attempts.max(1),
            backoff_base: Duration::from_millis(config.backoff_base_ms),
            backoff_max: Duration::from_millis(config.backoff_max_ms),
        }
    }

    fn first_request_for(&self, model: usize) -> State {
        if model < self.model_count {
            State::Requesting { model, attempt: 0 }
        } else {
            State::TerminalFailure
        }
    }
}

/// Pure transition function for one summarization pass. Terminal states
/// absorb every event; events that make no sense for a state leave it as is.
pub fn transition(state: State, event: Event, policy: &RetryPolicy) -> Transition {
    let stay = Transition {
        next: state,
        backoff: None,
    };
    match (state, event) {
        (State::Idle, Event::Start) => Transition {
            next: policy.first_request_for(0),
            backoff: None,
        },
        (State::Requesting { model, .. }, Event::Succeeded) => Transition {
            next: State::Success { model },
            backoff: None,
        },
        (State::Requesting { model, attempt }, Event::RetryableFailure)
            if attempt + 1 < policy.max_attempts =>
        {
            Transition {
                next: State::Requesting {
                    model,
                    attempt: attempt + 1,
                },
                backoff: Some(backoff_delay(
                    policy.backoff_base,
                    attempt + 1,
                    policy.backoff_max,
                )),
            }
        }
        (State::Requesting { model, .. }, Event::RetryableFailure | Event::NonRetryableFailure) => {
            Transition {
                next: policy.first_request_for(model + 1),
                backoff: None,
            }
        }
        _ => stay,
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SummaryResult {
    pub text: String,
    pub model: String,
    /// True when only the shortened input produced a summary.
    pub degraded: bool,
    pub attempts: usize,
}

impl SummaryResult {
    pub fn paragraphs(&self) -> Vec<String> {
        format::paragraphs(&self.text)
    }
}

struct PassFailure {
    last: FailureKind,
    attempts: usize,
}

pub struct Summarizer {
    backend: Arc<dyn InferenceBackend>,
    sleeper: Arc<dyn Sleeper>,
    config: SummarizerConfig,
    models: Vec<String>,
}

impl Summarizer {
    pub fn new(
        backend: Arc<dyn InferenceBackend>,
        sleeper: Arc<dyn Sleeper>,
        config: SummarizerConfig,
    ) -> Self {
        let models = config
            .models
            .iter()
            .map(|m| m.trim().to_owned())
            .filter(|m| !m.is_empty())
            .collect();
        Self {
            backend,
            sleeper,
            config,
            models,
        }
    }

    pub async fn generate_summary(&self, input: &str) -> Result<SummaryResult> {
        let min = self.config.min_input_chars;
        let raw_len = text::char_len(input.trim());
        if raw_len < min {
            return Err(Error::InsufficientContent { len: raw_len, min });
        }
        let cleaned = text::clean_text(input);
        let cleaned_len = text::char_len(&cleaned);
        if cleaned_len < min {
            return Err(Error::InsufficientContent {
                len: cleaned_len,
                min,
            });
        }

        let full = text::truncate_chars(&cleaned, self.config.max_input_chars);
        tracing::info!(
            input_chars = cleaned_len,
            sent_chars = text::char_len(full),
            models = self.models.len(),
            "generating summary"
        );

        let first = match self.run_pass(full, &self.config.generation, false).await {
            Ok(result) => return Ok(result),
            Err(failure) => failure,
        };

        if cleaned_len <= self.config.short_input_chars {
            return Err(Error::AllAttemptsExhausted {
                last: first.last,
                attempts: first.attempts,
            });
        }

        let short = text::truncate_chars(&cleaned, self.config.short_input_chars);
        tracing::warn!(
            sent_chars = text::char_len(short),
            last_failure = %first.last,
            "full-length input failed; retrying with shorter input"
        );
        match self
            .run_pass(short, &self.config.short_generation, true)
            .await
        {
            Ok(mut result) => {
                result.attempts += first.attempts;
                Ok(result)
            }
            Err(second) => Err(Error::AllAttemptsExhausted {
                last: second.last,
                attempts: first.attempts + second.attempts,
            }),
        }
    }

    async fn run_pass(
        &self,
        input: &str,
        params: &GenerationParams,
        degraded: bool,
    ) -> std::result::Result<SummaryResult, PassFailure> {
        let policy = RetryPolicy::from_config(&self.config, self.models.len());
        let mut state = transition(State::Idle, Event::Start, &policy).next;
        let mut last = FailureKind::Upstream;
        let mut attempts = 0usize;
        let mut summary = None;

        loop {
            let (model_idx, attempt) = match state {
                State::Requesting { model, attempt } => (model, attempt),
                State::Success { model } => {
                    let text = summary.take().unwrap_or_default();
                    return Ok(SummaryResult {
                        text,
                        model: self.models[model].clone(),
                        degraded,
                        attempts,
                    });
                }
                State::Idle | State::TerminalFailure => {
                    return Err(PassFailure { last, attempts });
                }
            };

            let model = self.models[model_idx].as_str();
            attempts += 1;
            let event = match self.backend.summarize(model, input, params).await {
                Ok(raw) => {
                    let len = text::char_len(&format::normalize_summary(&raw));
                    if len > self.config.min_summary_chars {
                        tracing::info!(model, attempt, chars = len, "summary received");
                        summary = Some(format::format_summary(
                            &raw,
                            self.config.sentences_per_paragraph,
                        ));
                        Event::Succeeded
                    } else {
                        tracing::warn!(
                            model,
                            attempt,
                            chars = len,
                            min = self.config.min_summary_chars,
                            "summary too short"
                        );
                        last = FailureKind::Upstream;
                        Event::NonRetryableFailure
                    }
                }
                Err(failure) => {
                    last = failure.failure_kind().unwrap_or(FailureKind::Upstream);
                    let retryable = failure.is_retryable();
                    tracing::warn!(model, attempt, retryable, error = %failure, "summarization attempt failed");
                    if retryable {
                        Event::RetryableFailure
                    } else {
                        Event::NonRetryableFailure
                    }
                }
            };

            let step = transition(state, event, &policy);
            if let Some(delay) = step.backoff {
                tracing::debug!(model, delay_ms = delay.as_millis() as u64, "backing off");
                self.sleeper.sleep(delay).await;
            }
            state = step.next;
        }
    }
}
