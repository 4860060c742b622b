//! Query execution handles, states, and the bounded status poll loop.

use std::time::Duration;

use backon::{BackoffBuilder, ExponentialBuilder};
use serde::Deserialize;

use crate::client::{QueryService, QueryServiceError};

/// Opaque identifier for an in-flight query execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExecutionId(String);

impl ExecutionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// State of a query execution as reported by the service.
///
/// Anything the service reports that we do not recognize maps to `Unknown`
/// and is treated as still pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionState {
    Queued,
    Running,
    Succeeded,
    Failed,
    #[serde(other)]
    Unknown,
}

/// Status snapshot returned by the service for one execution.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionStatus {
    /// Absent state is treated the same as [`ExecutionState::Unknown`].
    #[serde(default = "unknown_state")]
    pub state: ExecutionState,
    /// Service-provided reason, populated on failure.
    pub state_change_reason: Option<String>,
    /// Storage URL of the result object, populated on success.
    pub output_location: Option<String>,
}

fn unknown_state() -> ExecutionState {
    ExecutionState::Unknown
}

/// Terminal outcome of a query execution.
///
/// A failed query is a value, not an error: the service did its job and
/// reported the failure. Errors are reserved for transport problems and for
/// abandoning the wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    Succeeded {
        /// Storage URL of the result object.
        output_location: String,
    },
    Failed {
        reason: String,
    },
}

/// Schedule for polling an execution until it reaches a terminal state.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    /// First delay between polls.
    pub min_delay: Duration,
    /// Upper bound each doubled delay is clamped to.
    pub max_delay: Duration,
    /// How many times to re-poll after the initial status check before the
    /// wait is abandoned.
    pub max_attempts: usize,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_attempts: 20,
        }
    }
}

impl PollPolicy {
    fn backoff(&self) -> impl Iterator<Item = Duration> {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_attempts)
            .build()
    }
}

/// Polls `service` until the execution reaches a terminal state.
///
/// Re-polls while the state is `Queued`, `Running` or `Unknown`, sleeping per
/// the policy's exponential schedule. Once the schedule is exhausted the wait
/// is abandoned with [`PollError::DeadlineExceeded`]; the execution itself is
/// left running server-side.
pub async fn wait_for_completion<S: QueryService>(
    service: &S,
    id: &ExecutionId,
    policy: &PollPolicy,
) -> Result<QueryOutcome, PollError> {
    let mut backoff = policy.backoff();
    let mut polls: usize = 0;

    loop {
        let status = service.status(id).await.map_err(PollError::Status)?;
        polls += 1;

        match status.state {
            ExecutionState::Succeeded => {
                let output_location = status
                    .output_location
                    .ok_or_else(|| PollError::MissingOutputLocation { id: id.clone() })?;
                tracing::debug!(execution_id = %id, %output_location, "query succeeded");
                return Ok(QueryOutcome::Succeeded { output_location });
            }
            ExecutionState::Failed => {
                let reason = status
                    .state_change_reason
                    .unwrap_or_else(|| "no reason reported".to_string());
                tracing::error!(execution_id = %id, %reason, "query execution failed");
                return Ok(QueryOutcome::Failed { reason });
            }
            ExecutionState::Queued | ExecutionState::Running | ExecutionState::Unknown => {}
        }

        let Some(delay) = backoff.next() else {
            return Err(PollError::DeadlineExceeded {
                id: id.clone(),
                polls,
            });
        };
        tokio::time::sleep(delay).await;
    }
}

/// Errors while waiting for a query execution to complete.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    /// Transport or protocol error fetching the execution status.
    #[error("failed to fetch execution status")]
    Status(#[source] QueryServiceError),

    /// The poll schedule was exhausted before a terminal state was reached.
    #[error("execution {id} still pending after {polls} status polls")]
    DeadlineExceeded { id: ExecutionId, polls: usize },

    /// The service reported success without a result location.
    #[error("execution {id} succeeded but reported no output location")]
    MissingOutputLocation { id: ExecutionId },
}
