//! Runs, their lifecycle, and the steps they execute.
//!
//! ```text
//! Queued ──► InProgress ──► Completed
//!   │            │
//!   └────────────┴────────► Failed
//! ```
//!
//! `RequiresAction` is reserved: it is a valid target from `InProgress` but
//! the run engine never enters it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::function::{FunctionCall, FunctionResult};

/// Lifecycle state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Completed,
    Failed,
}

impl RunStatus {
    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }

    /// Whether the state machine permits moving from `self` to `next`.
    pub fn can_transition_to(&self, next: RunStatus) -> bool {
        use RunStatus::*;
        matches!(
            (self, next),
            (Queued, InProgress)
                | (Queued, Failed)
                | (InProgress, RequiresAction)
                | (InProgress, Completed)
                | (InProgress, Failed)
                | (RequiresAction, Completed)
                | (RequiresAction, Failed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Violations of the run lifecycle rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunStateError {
    #[error("Invalid run status transition from {from} to {to}")]
    InvalidTransition { from: RunStatus, to: RunStatus },

    #[error("Results for step {step_number} were already recorded")]
    StepAlreadyRecorded { step_number: u32 },
}

/// Pending action a caller must take before a run can continue. Reserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequiredAction {
    #[serde(rename = "type")]
    pub action_type: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Map<String, Value>>,
}

/// One planner-declared unit of work.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepDetails {
    /// Planner-assigned, positive, not necessarily contiguous
    pub step_number: u32,
    pub description: String,
    pub function_calls: Vec<FunctionCall>,
    /// Results of the calls that succeeded, in call order. `None` until executed.
    pub results: Option<Vec<FunctionResult>>,
    /// Messages for the calls that failed, in call order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl StepDetails {
    pub fn new(
        step_number: u32,
        description: impl Into<String>,
        function_calls: Vec<FunctionCall>,
    ) -> Self {
        Self {
            step_number,
            description: description.into(),
            function_calls,
            results: None,
            errors: Vec::new(),
        }
    }

    /// Whether this step has been executed.
    pub fn is_executed(&self) -> bool {
        self.results.is_some()
    }

    /// Record the outcome of executing this step. Write-once.
    pub fn record_outcome(
        &mut self,
        results: Vec<FunctionResult>,
        errors: Vec<String>,
    ) -> Result<(), RunStateError> {
        if self.results.is_some() {
            return Err(RunStateError::StepAlreadyRecorded {
                step_number: self.step_number,
            });
        }
        self.results = Some(results);
        self.errors = errors;
        Ok(())
    }
}

/// One end-to-end handling of a user query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Run {
    pub id: String,
    pub assistant_id: String,
    pub thread_id: String,
    pub status: RunStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub steps: Vec<StepDetails>,
    pub error: Option<String>,
    /// Opaque passthrough counters
    pub token_usage: HashMap<String, u64>,
    pub required_action: Option<RequiredAction>,
}

impl Run {
    /// Create a queued run.
    pub fn new(thread_id: impl Into<String>, assistant_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            assistant_id: assistant_id.into(),
            thread_id: thread_id.into(),
            status: RunStatus::Queued,
            started_at: None,
            completed_at: None,
            steps: Vec::new(),
            error: None,
            token_usage: HashMap::new(),
            required_action: None,
        }
    }

    fn transition(&mut self, next: RunStatus) -> Result<(), RunStateError> {
        if !self.status.can_transition_to(next) {
            return Err(RunStateError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// `Queued -> InProgress`, stamping `started_at`.
    pub fn start(&mut self) -> Result<(), RunStateError> {
        self.transition(RunStatus::InProgress)?;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    /// Move to `Completed`, stamping `completed_at`.
    pub fn complete(&mut self) -> Result<(), RunStateError> {
        self.transition(RunStatus::Completed)?;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Move to `Failed`, recording the error message.
    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), RunStateError> {
        self.transition(RunStatus::Failed)?;
        self.error = Some(error.into());
        Ok(())
    }
}
