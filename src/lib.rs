//! # Parley
//!
//! Parley answers a conversation turn with an LLM: it plans which functions
//! to call, calls them one after another, and turns the results into a reply
//! that is appended to the conversation thread.
//!
//! ## Core Components
//!
//! - **[Assistant]**: name, instructions, model and function tools
//! - **[AssistantManager], [ThreadManager]**: in-memory registries of
//!   assistants and conversation threads
//! - **[RunManager]**: executes a [Run] from planning to the stored reply
//! - **[LanguageModel], [Invocable]**: capabilities supplied by the caller
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use parley::{
//!     AssistantManager, AssistantSpec, Role, RunManager, ThreadManager, LanguageModel,
//! };
//! use std::sync::Arc;
//!
//! # async fn example(model: Arc<dyn LanguageModel>) -> Result<(), Box<dyn std::error::Error>> {
//! let assistants = AssistantManager::shared();
//! let threads = ThreadManager::shared();
//!
//! let assistant = assistants
//!     .create_assistant(AssistantSpec::new("Helper", "Be brief.", "my-model", model))
//!     .await;
//! let thread = threads.create_thread().await;
//! threads.add_assistant_to_thread(&thread.id, &assistant.id).await?;
//! threads.add_message(&thread.id, Role::User, "Hello!", None).await?;
//!
//! let runs = RunManager::new(assistants, threads.clone());
//! let run = runs.create_and_execute_run(&thread.id).await?;
//! assert!(run.status.is_terminal());
//! # Ok(())
//! # }
//! ```

pub use parley_core as core;
pub use parley_runtime as runtime;
pub use parley_store as store;

#[cfg(feature = "testing")]
pub use parley_testing as testing;

pub use parley_core::{
    Arguments, Assistant, AssistantRegistry, AssistantSpec, BoxError, FunctionCall,
    FunctionDefinition, FunctionError, FunctionParameter, FunctionResult, IdentifierRules,
    Invocable, LanguageModel, Message, ModelError, RequiredAction, Role, Run, RunStateError,
    RunStatus, StepDetails, StoreError, StoreResult, Thread, ThreadStore, Tool, ValidationError,
    invocable_fn,
};
pub use parley_runtime::{
    AssistantSnapshot, ConfigError, FunctionDispatcher, Plan, QueryPlanner, ResponseSynthesizer,
    RunConfig, RunConfigBuilder, RunError, RunManager, StepExecutor, StepOutcome,
};
pub use parley_store::{AssistantManager, ThreadManager};
