//! Error types shared by the Parley crates.
//!
//! Each layer owns a `thiserror` enum with a stable `error_code()` suitable
//! for logging. Run-level failures live in `parley-runtime`.

use thiserror::Error;

/// Boxed error raised by a function implementation or model backend.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while dispatching a function call against an assistant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FunctionError {
    /// No tool with this name is declared by the assistant.
    #[error("Function {name} not found")]
    NotFound { name: String },

    /// The implementation ran and failed.
    #[error("Error executing function {name}: {message}")]
    ExecutionFailed { name: String, message: String },
}

impl FunctionError {
    pub fn not_found(name: impl Into<String>) -> Self {
        FunctionError::NotFound { name: name.into() }
    }

    pub fn execution_failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        FunctionError::ExecutionFailed {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Name of the function the error refers to.
    pub fn function_name(&self) -> &str {
        match self {
            FunctionError::NotFound { name } | FunctionError::ExecutionFailed { name, .. } => name,
        }
    }

    /// Get the error code suitable for logging or reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            FunctionError::NotFound { .. } => "FUNCTION_NOT_FOUND",
            FunctionError::ExecutionFailed { .. } => "FUNCTION_EXECUTION_FAILED",
        }
    }
}

/// Errors raised by assistant registries and thread stores.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Assistant with id {0} not found")]
    AssistantNotFound(String),

    #[error("Thread with id {0} not found")]
    ThreadNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl StoreError {
    /// Get the error code suitable for logging or reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            StoreError::AssistantNotFound(_) => "ASSISTANT_NOT_FOUND",
            StoreError::ThreadNotFound(_) => "THREAD_NOT_FOUND",
            StoreError::InvalidInput(_) => "INVALID_INPUT",
        }
    }
}

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by a language-model backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// The backend was reached but the call failed.
    #[error("Model {model} invocation failed: {message}")]
    Invocation { model: String, message: String },

    /// The backend cannot serve requests at all.
    #[error("Model backend unavailable: {0}")]
    Unavailable(String),
}

impl ModelError {
    pub fn invocation(model: impl Into<String>, message: impl Into<String>) -> Self {
        ModelError::Invocation {
            model: model.into(),
            message: message.into(),
        }
    }

    /// Get the error code suitable for logging or reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            ModelError::Invocation { .. } => "MODEL_INVOCATION_FAILED",
            ModelError::Unavailable(_) => "MODEL_UNAVAILABLE",
        }
    }
}
