//! Sequential execution of one planned step.

use parley_core::{AssistantRegistry, FunctionResult, StepDetails};
use tracing::{error, info};

use crate::dispatcher::FunctionDispatcher;
use crate::error::RunError;

/// What happened to the calls of one step.
///
/// Every call lands in exactly one of the two lists, so
/// `results.len() + errors.len()` equals the step's call count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepOutcome {
    /// Successful calls, in call order.
    pub results: Vec<FunctionResult>,
    /// Failed calls as display strings, in call order.
    pub errors: Vec<String>,
}

impl StepOutcome {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct StepExecutor {
    dispatcher: FunctionDispatcher,
}

impl StepExecutor {
    pub fn new(dispatcher: FunctionDispatcher) -> Self {
        Self { dispatcher }
    }

    /// Run every call of `step` against the assistant `assistant_id`.
    ///
    /// A failing call is recorded and the remaining calls still run. Only a
    /// missing assistant aborts.
    pub async fn execute(
        &self,
        registry: &dyn AssistantRegistry,
        assistant_id: &str,
        step: &StepDetails,
    ) -> Result<StepOutcome, RunError> {
        info!(
            target: "parley::step",
            step = step.step_number,
            description = %step.description,
            calls = step.function_calls.len(),
            "Executing step"
        );
        let assistant = registry.get(assistant_id).await?;

        let mut outcome = StepOutcome::default();
        for call in &step.function_calls {
            match self.dispatcher.dispatch(&assistant, call).await {
                Ok(value) => outcome.results.push(FunctionResult::new(&call.name, value)),
                Err(err) => {
                    error!(
                        target: "parley::step",
                        step = step.step_number,
                        function = %call.name,
                        code = err.error_code(),
                        "Function execution error: {err}"
                    );
                    outcome.errors.push(err.to_string());
                }
            }
        }
        Ok(outcome)
    }
}
