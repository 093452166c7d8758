//! # Parley Store
//!
//! In-memory implementations of the collaborator contracts the run engine
//! consumes: [`AssistantManager`] implements `AssistantRegistry` and
//! [`ThreadManager`] implements `ThreadStore`. State lives for the lifetime
//! of the process.

pub mod assistants;
pub mod threads;

pub use assistants::AssistantManager;
pub use threads::ThreadManager;
