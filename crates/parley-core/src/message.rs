//! Conversation messages and threads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message on a thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assistant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>, assistant_id: Option<String>) -> Self {
        Self {
            role,
            content: content.into(),
            assistant_id,
            created_at: Some(Utc::now()),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content, None)
    }

    pub fn assistant(content: impl Into<String>, assistant_id: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content, Some(assistant_id.into()))
    }
}

/// An append-only conversation plus the assistants attached to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub messages: Vec<Message>,
    /// Candidate assistants, in attachment order. The first one drives planning.
    pub assistant_ids: Vec<String>,
}

impl Thread {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            messages: Vec::new(),
            assistant_ids: Vec::new(),
        }
    }

    /// Content of the newest user-authored message.
    pub fn latest_user_message(&self) -> Option<&Message> {
        latest_user_message(&self.messages)
    }
}

impl Default for Thread {
    fn default() -> Self {
        Self::new()
    }
}

/// Search `messages` newest-first for a user-authored message.
pub fn latest_user_message(messages: &[Message]) -> Option<&Message> {
    messages.iter().rev().find(|m| m.role == Role::User)
}
