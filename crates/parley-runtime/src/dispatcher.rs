//! Function dispatch against an assistant's declared tools.

use parley_core::{Assistant, FunctionCall, FunctionError};
use serde_json::Value;
use tracing::{error, info};

/// Resolves a call by exact name among the assistant's functions and invokes it.
///
/// Stateless and never retries. Errors raised by the implementation come
/// back as [`FunctionError::ExecutionFailed`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FunctionDispatcher;

impl FunctionDispatcher {
    pub fn new() -> Self {
        Self
    }

    pub async fn dispatch(
        &self,
        assistant: &Assistant,
        call: &FunctionCall,
    ) -> Result<Value, FunctionError> {
        let Some(function) = assistant.find_function(&call.name) else {
            error!(
                target: "parley::function",
                function = %call.name,
                assistant_id = %assistant.id,
                "Function not found"
            );
            return Err(FunctionError::not_found(&call.name));
        };

        info!(target: "parley::function", function = %call.name, "Executing function");
        match function.invoke(call.arguments.clone()).await {
            Ok(value) => {
                info!(
                    target: "parley::function",
                    function = %call.name,
                    "Function executed successfully"
                );
                Ok(value)
            }
            Err(err) => {
                error!(
                    target: "parley::function",
                    function = %call.name,
                    error = %err,
                    "Function execution failed"
                );
                Err(FunctionError::execution_failed(&call.name, err.to_string()))
            }
        }
    }
}
