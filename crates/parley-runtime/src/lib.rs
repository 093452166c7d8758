//! # Parley Runtime
//!
//! The run engine. A run answers the latest user message of a thread in
//! four phases, all awaited sequentially:
//!
//! 1. [`QueryPlanner`] asks the first candidate's model for a JSON plan,
//!    retrying malformed output, and drops calls to undeclared functions.
//! 2. [`StepExecutor`] runs each step's calls through the
//!    [`FunctionDispatcher`], recording failures without stopping.
//! 3. [`ResponseSynthesizer`] asks the owning assistant's model for the
//!    final answer, degrading to raw text when the reply is not JSON.
//! 4. [`RunManager`] appends the answer to the thread and completes the run.
//!
//! ```rust,no_run
//! use parley_runtime::RunManager;
//! use parley_store::{AssistantManager, ThreadManager};
//!
//! # async fn example(thread_id: &str) -> Result<(), parley_runtime::RunError> {
//! let manager = RunManager::new(AssistantManager::shared(), ThreadManager::shared());
//! let run = manager.create_and_execute_run(thread_id).await?;
//! println!("{} finished as {}", run.id, run.status);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod json;
pub mod orchestrator;
pub mod planner;
pub mod prompt;
pub mod snapshot;
pub mod synthesizer;

pub use config::{ConfigError, RunConfig, RunConfigBuilder};
pub use dispatcher::FunctionDispatcher;
pub use error::{PlanParseError, RunError};
pub use executor::{StepExecutor, StepOutcome};
pub use orchestrator::RunManager;
pub use planner::{FunctionCatalog, Plan, QueryPlanner};
pub use prompt::HistoryEntry;
pub use snapshot::AssistantSnapshot;
pub use synthesizer::ResponseSynthesizer;
