//! Assistants and the language-model capability they carry.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::error::ModelError;
use crate::function::FunctionDefinition;
use crate::tool::Tool;

/// Text-in, text-out language model backend.
///
/// Responses may contain prose around (or instead of) JSON; callers must
/// tolerate that.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Send `prompt` to the model identified by `model`.
    async fn invoke(&self, model: &str, prompt: &str) -> Result<String, ModelError>;

    /// Backend description (provider, version, ...).
    fn model_info(&self) -> Value {
        Value::Object(serde_json::Map::new())
    }
}

/// Parameters for creating an assistant.
#[derive(Clone)]
pub struct AssistantSpec {
    pub name: String,
    pub instructions: String,
    pub model: String,
    pub llm: Arc<dyn LanguageModel>,
    pub tools: Vec<Tool>,
    pub temperature: f32,
    pub provider_config: serde_json::Map<String, Value>,
}

impl AssistantSpec {
    pub const DEFAULT_TEMPERATURE: f32 = 0.7;

    pub fn new(
        name: impl Into<String>,
        instructions: impl Into<String>,
        model: impl Into<String>,
        llm: Arc<dyn LanguageModel>,
    ) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            model: model.into(),
            llm,
            tools: Vec::new(),
            temperature: Self::DEFAULT_TEMPERATURE,
            provider_config: serde_json::Map::new(),
        }
    }

    pub fn with_tool(mut self, tool: impl Into<Tool>) -> Self {
        self.tools.push(tool.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_provider_config(mut self, key: impl Into<String>, value: Value) -> Self {
        self.provider_config.insert(key.into(), value);
        self
    }

    /// Materialize the assistant under the given identifier.
    pub fn into_assistant(self, id: impl Into<String>) -> Assistant {
        Assistant {
            id: id.into(),
            name: self.name,
            instructions: self.instructions,
            model: self.model,
            llm: self.llm,
            tools: self.tools,
            temperature: self.temperature,
            provider_config: self.provider_config,
        }
    }
}

/// An assistant: instructions, a model, and the functions it may call.
///
/// Assistants are shared as `Arc<Assistant>` snapshots. Adding a tool builds
/// a new assistant (see [`Assistant::with_tool`]) so that runs holding the
/// previous snapshot never observe the change.
#[derive(Clone)]
pub struct Assistant {
    pub id: String,
    pub name: String,
    pub instructions: String,
    pub model: String,
    pub llm: Arc<dyn LanguageModel>,
    pub tools: Vec<Tool>,
    pub temperature: f32,
    pub provider_config: serde_json::Map<String, Value>,
}

impl Assistant {
    /// Declared functions, in tool order.
    pub fn functions(&self) -> impl Iterator<Item = &FunctionDefinition> {
        self.tools.iter().filter_map(Tool::as_function)
    }

    /// Find a declared function by exact name.
    pub fn find_function(&self, name: &str) -> Option<&FunctionDefinition> {
        self.functions().find(|function| function.name() == name)
    }

    /// Copy of this assistant with one more tool.
    pub fn with_tool(&self, tool: impl Into<Tool>) -> Self {
        let mut next = self.clone();
        next.tools.push(tool.into());
        next
    }

    /// Invoke this assistant's language model with its configured model id.
    pub async fn complete(&self, prompt: &str) -> Result<String, ModelError> {
        self.llm.invoke(&self.model, prompt).await
    }
}

impl fmt::Debug for Assistant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Assistant")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("model", &self.model)
            .field("tools", &self.tools)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}
