//! Job poll state machine
//!
//! Async scraping providers are job-oriented: submit, then check status until
//! the job settles. This module replaces the ad hoc sleep loop with an
//! explicit poller parameterized by `(interval, max_attempts)`, which puts a
//! hard wall-clock ceiling on a single step's duration. The sleep is
//! injectable so tests can drive the machine deterministically.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

/// Provider job status as observed by one status check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    /// Still in progress; keep polling
    Running,
    /// Finished successfully; `result_ref` names the result set, when any
    Succeeded { result_ref: Option<String> },
    /// Provider reported the job failed
    Failed,
    /// Provider reported the job was aborted
    Aborted,
    /// Provider reported the job timed out on its side
    TimedOut,
}

/// Outcome of a poll run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The job reached a terminal status (never `Running`)
    Settled(JobStatus),
    /// The attempt budget ran out while the job was still running.
    ///
    /// Distinct from a provider-reported `TimedOut`: this is a local budget,
    /// not a provider verdict.
    Exhausted { attempts: u32 },
}

/// Injectable sleep, so tests can observe ticks instead of waiting them out.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by the tokio timer.
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Fixed-interval, bounded-attempt job poller.
#[derive(Debug, Clone)]
pub struct JobPoller {
    /// Delay before every status check
    pub interval: Duration,
    /// Maximum number of status checks
    pub max_attempts: u32,
}

impl JobPoller {
    /// Create a poller; at least one attempt is always made
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Drive `probe` until the job settles or the attempt budget runs out.
    ///
    /// Sleeps one interval before every probe, matching job providers that
    /// are never done immediately after submission. Observes exactly
    /// `max_attempts` status checks before reporting exhaustion. Probe
    /// errors (transport and the like) end the run immediately.
    pub async fn run<P, Fut, E>(
        &self,
        sleeper: &dyn Sleeper,
        mut probe: P,
    ) -> Result<PollOutcome, E>
    where
        P: FnMut(u32) -> Fut + Send,
        Fut: Future<Output = Result<JobStatus, E>> + Send,
    {
        for attempt in 1..=self.max_attempts {
            sleeper.sleep(self.interval).await;
            match probe(attempt).await? {
                JobStatus::Running => continue,
                terminal => return Ok(PollOutcome::Settled(terminal)),
            }
        }
        Ok(PollOutcome::Exhausted {
            attempts: self.max_attempts,
        })
    }
}
