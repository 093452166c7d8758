//! In-memory assistant registry.

use async_trait::async_trait;
use parley_core::{Assistant, AssistantRegistry, AssistantSpec, StoreError, StoreResult, Tool};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Creates, stores and hands out assistant snapshots.
///
/// Stored assistants are never mutated in place: [`AssistantManager::add_tool`]
/// swaps in a new `Arc`, so a run that already holds a snapshot keeps seeing
/// the tool list it started with.
pub struct AssistantManager {
    assistants: RwLock<HashMap<String, Arc<Assistant>>>,
}

impl AssistantManager {
    pub fn new() -> Self {
        info!(target: "parley::assistant", "AssistantManager initialized");
        Self {
            assistants: RwLock::new(HashMap::new()),
        }
    }

    /// Create a manager wrapped in Arc for sharing.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register a new assistant under a fresh UUID.
    pub async fn create_assistant(&self, spec: AssistantSpec) -> Arc<Assistant> {
        let assistant = Arc::new(spec.into_assistant(Uuid::new_v4().to_string()));
        self.assistants
            .write()
            .await
            .insert(assistant.id.clone(), Arc::clone(&assistant));
        info!(
            target: "parley::assistant",
            assistant_id = %assistant.id,
            name = %assistant.name,
            tools = assistant.tools.len(),
            "Created assistant"
        );
        assistant
    }

    /// Retrieve an assistant snapshot by ID.
    pub async fn get_assistant(&self, id: &str) -> StoreResult<Arc<Assistant>> {
        match self.assistants.read().await.get(id) {
            Some(assistant) => {
                debug!(target: "parley::assistant", assistant_id = %id, "Retrieved assistant");
                Ok(Arc::clone(assistant))
            }
            None => {
                warn!(target: "parley::assistant", assistant_id = %id, "Assistant not found");
                Err(StoreError::AssistantNotFound(id.to_string()))
            }
        }
    }

    /// Append a tool to an assistant, returning the new snapshot.
    pub async fn add_tool(&self, id: &str, tool: impl Into<Tool>) -> StoreResult<Arc<Assistant>> {
        let mut assistants = self.assistants.write().await;
        let current = assistants
            .get(id)
            .ok_or_else(|| StoreError::AssistantNotFound(id.to_string()))?;
        let updated = Arc::new(current.with_tool(tool));
        assistants.insert(id.to_string(), Arc::clone(&updated));
        info!(
            target: "parley::assistant",
            assistant_id = %id,
            tools = updated.tools.len(),
            "Added tool to assistant"
        );
        Ok(updated)
    }

    /// Snapshots of every registered assistant.
    pub async fn list_assistants(&self) -> Vec<Arc<Assistant>> {
        self.assistants.read().await.values().cloned().collect()
    }

    /// Get the number of registered assistants.
    pub async fn len(&self) -> usize {
        self.assistants.read().await.len()
    }

    /// Check if no assistant is registered.
    pub async fn is_empty(&self) -> bool {
        self.assistants.read().await.is_empty()
    }
}

impl Default for AssistantManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssistantRegistry for AssistantManager {
    async fn get(&self, id: &str) -> StoreResult<Arc<Assistant>> {
        self.get_assistant(id).await
    }
}
