//! In-memory thread and message store.

use async_trait::async_trait;
use parley_core::{Message, Role, StoreError, StoreResult, Thread, ThreadStore};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Owns threads, their messages and their attached assistants.
pub struct ThreadManager {
    threads: RwLock<HashMap<String, Thread>>,
}

impl ThreadManager {
    pub fn new() -> Self {
        info!(target: "parley::thread", "ThreadManager initialized");
        Self {
            threads: RwLock::new(HashMap::new()),
        }
    }

    /// Create a manager wrapped in Arc for sharing.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Create an empty thread.
    pub async fn create_thread(&self) -> Thread {
        let thread = Thread::new();
        self.threads
            .write()
            .await
            .insert(thread.id.clone(), thread.clone());
        info!(target: "parley::thread", thread_id = %thread.id, "Thread created");
        thread
    }

    /// Get a copy of a thread.
    pub async fn get_thread(&self, thread_id: &str) -> StoreResult<Thread> {
        let threads = self.threads.read().await;
        let thread = threads.get(thread_id).cloned().ok_or_else(|| {
            warn!(target: "parley::thread", thread_id = %thread_id, "Thread not found");
            StoreError::ThreadNotFound(thread_id.to_string())
        })?;
        debug!(target: "parley::thread", thread_id = %thread_id, "Retrieved thread");
        Ok(thread)
    }

    /// Attach an assistant to a thread. Attaching twice is a no-op.
    pub async fn add_assistant_to_thread(
        &self,
        thread_id: &str,
        assistant_id: &str,
    ) -> StoreResult<()> {
        self.with_thread(thread_id, |thread| {
            if !thread.assistant_ids.iter().any(|id| id == assistant_id) {
                thread.assistant_ids.push(assistant_id.to_string());
            }
        })
        .await?;
        info!(
            target: "parley::thread",
            thread_id = %thread_id,
            assistant_id = %assistant_id,
            "Added assistant to thread"
        );
        Ok(())
    }

    /// Detach an assistant from a thread.
    pub async fn remove_assistant_from_thread(
        &self,
        thread_id: &str,
        assistant_id: &str,
    ) -> StoreResult<()> {
        self.with_thread(thread_id, |thread| {
            thread.assistant_ids.retain(|id| id != assistant_id);
        })
        .await?;
        info!(
            target: "parley::thread",
            thread_id = %thread_id,
            assistant_id = %assistant_id,
            "Removed assistant from thread"
        );
        Ok(())
    }

    /// Append a message stamped with the current time.
    pub async fn add_message(
        &self,
        thread_id: &str,
        role: Role,
        content: impl Into<String>,
        assistant_id: Option<String>,
    ) -> StoreResult<Message> {
        let message = Message::new(role, content, assistant_id);
        let stored = message.clone();
        self.with_thread(thread_id, move |thread| thread.messages.push(stored))
            .await?;
        info!(
            target: "parley::thread",
            thread_id = %thread_id,
            role = %role,
            "Added message to thread"
        );
        Ok(message)
    }

    /// Messages of a thread in insertion order.
    pub async fn get_messages(&self, thread_id: &str) -> StoreResult<Vec<Message>> {
        let thread = self.get_thread(thread_id).await?;
        Ok(thread.messages)
    }

    async fn with_thread<F>(&self, thread_id: &str, update: F) -> StoreResult<()>
    where
        F: FnOnce(&mut Thread),
    {
        let mut threads = self.threads.write().await;
        let thread = threads
            .get_mut(thread_id)
            .ok_or_else(|| StoreError::ThreadNotFound(thread_id.to_string()))?;
        update(thread);
        Ok(())
    }
}

impl Default for ThreadManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ThreadStore for ThreadManager {
    async fn get_thread(&self, id: &str) -> StoreResult<Thread> {
        ThreadManager::get_thread(self, id).await
    }

    async fn get_messages(&self, thread_id: &str) -> StoreResult<Vec<Message>> {
        ThreadManager::get_messages(self, thread_id).await
    }

    async fn append_message(
        &self,
        thread_id: &str,
        role: Role,
        content: String,
        assistant_id: Option<String>,
    ) -> StoreResult<Message> {
        self.add_message(thread_id, role, content, assistant_id).await
    }
}
