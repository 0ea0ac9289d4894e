//! Search → pick → render → poll.
//!
//! A command searches for events, picks one weighted by score and formats
//! it. Unless only text was asked for, it then queues a render and polls its
//! status with a decaying interval (20s, 15s, 11.25s, ... floored at 5s)
//! until the render finishes, fails, or the polling budget runs out. A
//! render that outlives the budget is left running on the server.

use async_trait::async_trait;
use rand::Rng;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::api::SonarApi;
use crate::command::SonarCommand;
use crate::config::ApiConfig;
use crate::error::Result;
use crate::format::format_event;
use crate::models::RenderJob;
use crate::select::weighted_choice;

/// First wait between status polls, in seconds.
pub const INITIAL_POLL_INTERVAL: f64 = 20.0;
/// Each wait is this fraction of the previous one...
pub const POLL_DECAY: f64 = 0.75;
/// ...but never shorter than this, in seconds.
pub const MIN_POLL_INTERVAL: f64 = 5.0;

pub const NO_RESULTS_REPLY: &str = "Meme harder scrub";

// ============================================================================
// Backoff schedule
// ============================================================================

/// Infinite sequence of inter-poll delays.
#[derive(Debug, Clone)]
pub struct PollBackoff {
    next_secs: f64,
}

impl PollBackoff {
    pub fn new() -> Self {
        Self {
            next_secs: INITIAL_POLL_INTERVAL,
        }
    }

    pub fn next_delay(&mut self) -> Duration {
        let current = self.next_secs;
        self.next_secs = (current * POLL_DECAY).max(MIN_POLL_INTERVAL);
        Duration::from_secs_f64(current)
    }
}

impl Default for PollBackoff {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for PollBackoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        Some(self.next_delay())
    }
}

// ============================================================================
// Clock
// ============================================================================

/// Time source for the poll loop.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    async fn sleep(&self, duration: Duration);
}

/// Wall-clock time via tokio timers.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

// ============================================================================
// Outcome
// ============================================================================

/// How a command ended when nothing went wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    NoResults,
    Text(String),
    Rendered {
        text: String,
        task_id: String,
        url: String,
    },
    RenderFailed {
        text: String,
        task_id: String,
    },
    TimedOut {
        text: String,
        task_id: String,
    },
}

impl Outcome {
    pub fn reply(&self) -> String {
        match self {
            Outcome::NoResults => NO_RESULTS_REPLY.to_string(),
            Outcome::Text(text) => text.clone(),
            Outcome::Rendered { text, url, .. } => format!("{text} <{url}>"),
            Outcome::RenderFailed { text, .. } => format!("{text} <render failed>"),
            Outcome::TimedOut { text, .. } => format!("{text} <render timeout>"),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reply())
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Runs one command end to end. Cheap to clone; clones share the API
/// client and clock.
#[derive(Clone)]
pub struct Orchestrator {
    api: Arc<dyn SonarApi>,
    clock: Arc<dyn Clock>,
    base_url: String,
    max_wait: Duration,
}

impl Orchestrator {
    pub fn new(api: Arc<dyn SonarApi>, config: &ApiConfig) -> Self {
        Self {
            api,
            clock: Arc::new(TokioClock),
            base_url: config.base_url().to_string(),
            max_wait: config.max_wait(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn max_wait(&self) -> Duration {
        self.max_wait
    }

    /// Viewer link for a finished render.
    pub fn viewer_url(&self, task_id: &str) -> String {
        format!("{}/v/{}", self.base_url, task_id)
    }

    pub async fn run<R>(&self, command: &SonarCommand, rng: &mut R) -> Result<Outcome>
    where
        R: Rng + Send + ?Sized,
    {
        let results = self.api.search(&command.query).await?;
        if results.is_empty() {
            tracing::info!(query = %command.query, "No events matched");
            return Ok(Outcome::NoResults);
        }

        let chosen = weighted_choice(&results, |r| r.score, rng)?;
        let text = format_event(chosen);
        tracing::debug!(
            event_id = %chosen.event_id,
            score = chosen.score,
            candidates = results.len(),
            "Selected event"
        );

        if command.text_only {
            return Ok(Outcome::Text(text));
        }

        let job = self
            .api
            .submit_render(&chosen.event_id, command.render_type)
            .await?;
        self.poll_render(&job, text).await
    }

    /// Poll until the render reaches a terminal state or `max_wait` has
    /// elapsed since the first poll.
    pub async fn poll_render(&self, job: &RenderJob, text: String) -> Result<Outcome> {
        let start = self.clock.now();
        let mut backoff = PollBackoff::new();
        let mut polls = 1u32;

        let mut status = self.api.render_status(&job.task_id).await?;
        while !status.is_terminal() {
            let elapsed = self.clock.now().duration_since(start);
            if elapsed > self.max_wait {
                tracing::warn!(
                    task_id = %job.task_id,
                    polls = polls,
                    elapsed_secs = elapsed.as_secs_f64(),
                    "Render still pending after max wait; abandoning"
                );
                return Ok(Outcome::TimedOut {
                    text,
                    task_id: job.task_id.clone(),
                });
            }

            self.clock.sleep(backoff.next_delay()).await;
            status = self.api.render_status(&job.task_id).await?;
            polls += 1;
        }

        if status.is_success() {
            tracing::info!(task_id = %job.task_id, polls = polls, "Render finished");
            Ok(Outcome::Rendered {
                text,
                url: self.viewer_url(&job.task_id),
                task_id: job.task_id.clone(),
            })
        } else {
            tracing::warn!(task_id = %job.task_id, polls = polls, "Render failed");
            Ok(Outcome::RenderFailed {
                text,
                task_id: job.task_id.clone(),
            })
        }
    }
}
