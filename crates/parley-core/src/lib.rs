//! # Parley Core
//!
//! Data model and collaborator contracts for the Parley run engine:
//! assistants and their function tools, threads and messages, runs and
//! their lifecycle, and the error types shared across crates.

pub mod assistant;
pub mod error;
pub mod function;
pub mod message;
pub mod registry;
pub mod run;
pub mod tool;
pub mod validation;

pub use assistant::{Assistant, AssistantSpec, LanguageModel};
pub use error::{BoxError, FunctionError, ModelError, StoreError, StoreResult};
pub use function::{
    Arguments, FunctionCall, FunctionDefinition, FunctionParameter, FunctionResult, Invocable,
    invocable_fn,
};
pub use message::{Message, Role, Thread, latest_user_message};
pub use registry::{AssistantRegistry, ThreadStore};
pub use run::{RequiredAction, Run, RunStateError, RunStatus, StepDetails};
pub use tool::Tool;
pub use validation::{IdentifierRules, ValidationError};
