//! # Parley Testing
//!
//! Test doubles for exercising the run engine without a real model:
//!
//! - **ScriptedModel**: replays canned model responses and records prompts
//! - **MockFunction**: fixed-outcome function implementation with call tracking
//! - **fixtures**: calculator assistant, sample functions, plan builders

/// Ready-made assistants, functions and responses
pub mod fixtures;
/// Mock function implementations
pub mod mock_functions;
/// Scripted language model
pub mod mock_model;

pub use mock_functions::MockFunction;
pub use mock_model::{RecordedPrompt, ScriptedModel};
