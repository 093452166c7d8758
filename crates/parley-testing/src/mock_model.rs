//! # Scripted Language Model
//!
//! A [`LanguageModel`] that replays canned responses in order and records
//! every prompt it receives, for deterministic run-engine tests.

use async_trait::async_trait;
use parley_core::{LanguageModel, ModelError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// One scripted reply.
#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Failure(String),
}

/// A recorded invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPrompt {
    pub model: String,
    pub prompt: String,
}

/// Language model that returns scripted responses in FIFO order.
///
/// Once the script is exhausted every call fails with
/// `ModelError::Unavailable`.
#[derive(Debug, Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Reply>>,
    prompts: Mutex<Vec<RecordedPrompt>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty script behind an `Arc<dyn LanguageModel>`.
    pub fn shared() -> Arc<dyn LanguageModel> {
        Arc::new(Self::new())
    }

    /// Queue a text response.
    pub fn with_response(self, response: impl Into<String>) -> Self {
        self.push(Reply::Text(response.into()));
        self
    }

    /// Queue a backend failure.
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.push(Reply::Failure(message.into()));
        self
    }

    /// Queue a text response on a shared model.
    pub fn push_response(&self, response: impl Into<String>) {
        self.push(Reply::Text(response.into()));
    }

    fn push(&self, reply: Reply) {
        self.replies
            .lock()
            .expect("scripted model lock poisoned")
            .push_back(reply);
    }

    /// Number of invocations so far.
    pub fn call_count(&self) -> usize {
        self.prompts.lock().expect("scripted model lock poisoned").len()
    }

    /// Every prompt received, oldest first.
    pub fn prompts(&self) -> Vec<RecordedPrompt> {
        self.prompts
            .lock()
            .expect("scripted model lock poisoned")
            .clone()
    }

    /// Number of scripted replies not yet consumed.
    pub fn remaining(&self) -> usize {
        self.replies
            .lock()
            .expect("scripted model lock poisoned")
            .len()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn invoke(&self, model: &str, prompt: &str) -> Result<String, ModelError> {
        self.prompts
            .lock()
            .expect("scripted model lock poisoned")
            .push(RecordedPrompt {
                model: model.to_string(),
                prompt: prompt.to_string(),
            });

        let next = self
            .replies
            .lock()
            .expect("scripted model lock poisoned")
            .pop_front();
        match next {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Failure(message)) => Err(ModelError::invocation(model, message)),
            None => Err(ModelError::Unavailable("script exhausted".to_string())),
        }
    }

    fn model_info(&self) -> serde_json::Value {
        serde_json::json!({ "provider": "scripted" })
    }
}
