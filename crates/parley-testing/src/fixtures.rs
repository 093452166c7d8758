//! Ready-made assistants, functions and model responses.

use parley_core::{
    Arguments, AssistantSpec, BoxError, FunctionDefinition, FunctionParameter, LanguageModel,
    invocable_fn,
};
use serde_json::{Value, json};
use std::sync::Arc;

fn integer_arg(arguments: &Arguments, name: &str) -> Result<i64, BoxError> {
    arguments
        .get(name)
        .and_then(Value::as_i64)
        .ok_or_else(|| format!("missing integer argument '{name}'").into())
}

/// `add(a, b)` over integers.
pub fn add_function() -> FunctionDefinition {
    FunctionDefinition::new(
        "add",
        "Add two integers",
        invocable_fn(|args: Arguments| async move {
            let sum = integer_arg(&args, "a")? + integer_arg(&args, "b")?;
            Ok::<Value, BoxError>(json!(sum))
        }),
    )
    .expect("valid function name")
    .with_parameter("a", FunctionParameter::new("integer", "First addend"))
    .with_parameter("b", FunctionParameter::new("integer", "Second addend"))
}

/// `divide(a, b)`; fails on division by zero.
pub fn divide_function() -> FunctionDefinition {
    FunctionDefinition::new(
        "divide",
        "Divide a by b",
        invocable_fn(|args: Arguments| async move {
            let a = integer_arg(&args, "a")?;
            let b = integer_arg(&args, "b")?;
            if b == 0 {
                return Err("division by zero".into());
            }
            Ok::<Value, BoxError>(json!(a / b))
        }),
    )
    .expect("valid function name")
    .with_parameter("a", FunctionParameter::new("integer", "Dividend"))
    .with_parameter("b", FunctionParameter::new("integer", "Divisor"))
}

/// A function with an enumerated parameter, for prompt rendering checks.
pub fn convert_function() -> FunctionDefinition {
    FunctionDefinition::new(
        "convert_temperature",
        "Convert a temperature",
        invocable_fn(|args: Arguments| async move {
            let value = args.get("value").and_then(Value::as_f64).unwrap_or_default();
            let converted = match args.get("unit").and_then(Value::as_str) {
                Some("fahrenheit") => value * 9.0 / 5.0 + 32.0,
                _ => (value - 32.0) * 5.0 / 9.0,
            };
            Ok::<Value, BoxError>(json!(converted))
        }),
    )
    .expect("valid function name")
    .with_parameter("value", FunctionParameter::new("number", "Temperature value"))
    .with_parameter(
        "unit",
        FunctionParameter::new("string", "Target unit")
            .with_allowed_values(["celsius", "fahrenheit"]),
    )
}

/// Calculator assistant exposing `add` and `divide`.
pub fn calculator_spec(llm: Arc<dyn LanguageModel>) -> AssistantSpec {
    AssistantSpec::new(
        "Calculator",
        "You are a precise calculator.",
        "test-model",
        llm,
    )
    .with_tool(add_function())
    .with_tool(divide_function())
}

/// Planner response with a single step calling one function.
pub fn single_call_plan(name: &str, arguments: Value, selected_assistant_index: i64) -> String {
    json!({
        "steps": [{
            "step_number": 1,
            "description": format!("Call {name}"),
            "function_calls": [{"name": name, "arguments": arguments}]
        }],
        "selected_assistant_index": selected_assistant_index
    })
    .to_string()
}

/// Planner response with no steps.
pub fn empty_plan() -> String {
    json!({"steps": [], "selected_assistant_index": 0}).to_string()
}

/// Synthesis response carrying `text` and no follow-up calls.
pub fn synthesis_response(text: &str) -> String {
    json!({"response": text, "function_calls": []}).to_string()
}
