//! Run-level errors.

use parley_core::{ModelError, RunStateError, StoreError};
use thiserror::Error;

/// Errors surfaced by the run engine.
///
/// Function-level failures never appear here: the step executor and the
/// synthesizer record them as strings and carry on. Everything else aborts
/// the run, and once a run exists the orchestrator wraps the cause in
/// [`RunError::RunExecutionFailed`].
#[derive(Debug, Error)]
pub enum RunError {
    #[error("No user message found in thread {thread_id}")]
    NoUserMessage { thread_id: String },

    #[error("No candidate assistants available")]
    NoAssistants,

    #[error("Assistant with id {0} not found")]
    AssistantNotFound(String),

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Failed to get a valid response after {attempts} attempts: {reason}")]
    PlanningFailed { attempts: u32, reason: String },

    #[error(transparent)]
    InvalidTransition(#[from] RunStateError),

    #[error("Run with id {0} not found")]
    RunNotFound(String),

    #[error("Run execution failed: {source}")]
    RunExecutionFailed {
        run_id: String,
        #[source]
        source: Box<RunError>,
    },
}

impl From<StoreError> for RunError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AssistantNotFound(id) => RunError::AssistantNotFound(id),
            other => RunError::Store(other),
        }
    }
}

impl RunError {
    /// Get the error code suitable for logging or reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            RunError::NoUserMessage { .. } => "NO_USER_MESSAGE",
            RunError::NoAssistants => "NO_ASSISTANTS",
            RunError::AssistantNotFound(_) => "ASSISTANT_NOT_FOUND",
            RunError::Store(err) => err.error_code(),
            RunError::Model(err) => err.error_code(),
            RunError::PlanningFailed { .. } => "PLANNING_FAILED",
            RunError::InvalidTransition(_) => "INVALID_TRANSITION",
            RunError::RunNotFound(_) => "RUN_NOT_FOUND",
            RunError::RunExecutionFailed { .. } => "RUN_EXECUTION_FAILED",
        }
    }

    /// The underlying cause, looking through `RunExecutionFailed`.
    pub fn root_cause(&self) -> &RunError {
        match self {
            RunError::RunExecutionFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Identifier of the failed run, if one had been created.
    pub fn run_id(&self) -> Option<&str> {
        match self {
            RunError::RunExecutionFailed { run_id, .. } => Some(run_id),
            _ => None,
        }
    }
}

/// Why a planning response was rejected. Drives the retry loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanParseError {
    #[error("No JSON found in the response")]
    NoJson,

    #[error("Expected a JSON object at the top level")]
    NotAnObject,

    #[error("Plan does not match the expected schema: {0}")]
    Schema(String),

    #[error("Step number must be positive")]
    InvalidStepNumber,
}
