//! Collaborator contracts consumed by the run engine.

use async_trait::async_trait;
use std::sync::Arc;

use crate::assistant::Assistant;
use crate::error::StoreResult;
use crate::message::{Message, Role, Thread};

/// Lookup of assistants by identifier.
#[async_trait]
pub trait AssistantRegistry: Send + Sync {
    /// Get a snapshot of an assistant, or `StoreError::AssistantNotFound`.
    async fn get(&self, id: &str) -> StoreResult<Arc<Assistant>>;
}

/// Append-only message storage keyed by thread.
#[async_trait]
pub trait ThreadStore: Send + Sync {
    /// Get a thread, or `StoreError::ThreadNotFound`.
    async fn get_thread(&self, id: &str) -> StoreResult<Thread>;

    /// Messages of a thread in insertion order.
    async fn get_messages(&self, thread_id: &str) -> StoreResult<Vec<Message>>;

    /// Append a message and return it as stored.
    async fn append_message(
        &self,
        thread_id: &str,
        role: Role,
        content: String,
        assistant_id: Option<String>,
    ) -> StoreResult<Message>;
}
