//! # Mock Functions
//!
//! [`Invocable`] implementations with predictable behavior and call
//! tracking.

use async_trait::async_trait;
use parley_core::{Arguments, BoxError, Invocable};
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// A function that returns a fixed value (or fails) and records its inputs.
#[derive(Debug, Clone)]
pub struct MockFunction {
    outcome: Result<Value, String>,
    calls: Arc<Mutex<Vec<Arguments>>>,
}

impl MockFunction {
    /// Always succeed with `value`.
    pub fn returning(value: Value) -> Self {
        Self {
            outcome: Ok(value),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always fail with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            outcome: Err(message.into()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Get the number of times this function has been called
    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("mock function lock poisoned").len()
    }

    /// Arguments of every call, oldest first
    pub fn call_history(&self) -> Vec<Arguments> {
        self.calls
            .lock()
            .expect("mock function lock poisoned")
            .clone()
    }

    /// Share this mock as an implementation while keeping a handle for inspection.
    pub fn as_invocable(&self) -> Arc<dyn Invocable> {
        Arc::new(self.clone())
    }
}

#[async_trait]
impl Invocable for MockFunction {
    async fn call(&self, arguments: Arguments) -> Result<Value, BoxError> {
        self.calls
            .lock()
            .expect("mock function lock poisoned")
            .push(arguments);
        match &self.outcome {
            Ok(value) => Ok(value.clone()),
            Err(message) => Err(message.clone().into()),
        }
    }
}
