//! A keyword-driven stand-in model so the demo runs without network access.

use async_trait::async_trait;
use parley::{
    Arguments, AssistantSpec, BoxError, FunctionDefinition, FunctionParameter, LanguageModel,
    ModelError, ValidationError, invocable_fn,
};
use serde_json::{Value, json};
use std::sync::Arc;

/// Plans `add`/`divide` calls from numbers in the query and phrases the
/// results back. Planning replies are wrapped in prose on purpose.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineModel;

fn section<'a>(prompt: &'a str, open: &str, close: &str) -> Option<&'a str> {
    let start = prompt.find(open)? + open.len();
    let end = start + prompt[start..].find(close)?;
    Some(prompt[start..end].trim())
}

fn numbers(text: &str) -> Vec<i64> {
    text.split(|c: char| !c.is_ascii_digit() && c != '-')
        .filter_map(|token| token.parse().ok())
        .collect()
}

fn plan_for(query: &str) -> Value {
    let lowered = query.to_lowercase();
    let operands = numbers(&lowered);
    let function = if lowered.contains("plus") || lowered.contains('+') || lowered.contains("add") {
        Some("add")
    } else if lowered.contains("divided") || lowered.contains('/') || lowered.contains("divide") {
        Some("divide")
    } else {
        None
    };

    match (function, operands.as_slice()) {
        (Some(name), [a, b, ..]) => json!({
            "steps": [{
                "step_number": 1,
                "description": format!("Compute {name}({a}, {b})"),
                "function_calls": [{"name": name, "arguments": {"a": a, "b": b}}]
            }],
            "selected_assistant_index": 0
        }),
        _ => json!({"steps": [], "selected_assistant_index": 0}),
    }
}

fn answer_for(prompt: &str) -> Value {
    let results =
        section(prompt, "Function results:", "Errors encountered:").unwrap_or_default();
    let errors =
        section(prompt, "Errors encountered:", "Assistant Instructions:").unwrap_or_default();

    let response = if errors != "No errors encountered." && !errors.is_empty() {
        format!("Sorry, I could not finish that: {errors}")
    } else if let Some(value) = results
        .lines()
        .find_map(|line| line.strip_prefix("Result: "))
    {
        format!("The answer is {value}.")
    } else {
        "Hello! Ask me to add or divide two numbers.".to_string()
    };
    json!({"response": response, "function_calls": []})
}

fn integer_arg(arguments: &Arguments, name: &str) -> Result<i64, BoxError> {
    arguments
        .get(name)
        .and_then(Value::as_i64)
        .ok_or_else(|| format!("missing integer argument '{name}'").into())
}

/// Calculator assistant with `add` and `divide`, the two calls [`OfflineModel`] plans.
pub fn demo_assistant(llm: Arc<dyn LanguageModel>) -> Result<AssistantSpec, ValidationError> {
    let add = FunctionDefinition::new(
        "add",
        "Add two integers",
        invocable_fn(|args: Arguments| async move {
            let sum = integer_arg(&args, "a")? + integer_arg(&args, "b")?;
            Ok::<Value, BoxError>(json!(sum))
        }),
    )?
    .with_parameter("a", FunctionParameter::new("integer", "First addend"))
    .with_parameter("b", FunctionParameter::new("integer", "Second addend"));

    let divide = FunctionDefinition::new(
        "divide",
        "Divide a by b",
        invocable_fn(|args: Arguments| async move {
            let a = integer_arg(&args, "a")?;
            let b = integer_arg(&args, "b")?;
            let quotient = a
                .checked_div(b)
                .ok_or_else(|| BoxError::from("division by zero"))?;
            Ok::<Value, BoxError>(json!(quotient))
        }),
    )?
    .with_parameter("a", FunctionParameter::new("integer", "Dividend"))
    .with_parameter("b", FunctionParameter::new("integer", "Divisor"));

    Ok(
        AssistantSpec::new("Calculator", "You are a precise calculator.", "offline", llm)
            .with_tool(add)
            .with_tool(divide),
    )
}

#[async_trait]
impl LanguageModel for OfflineModel {
    async fn invoke(&self, _model: &str, prompt: &str) -> Result<String, ModelError> {
        if prompt.contains("determine the necessary steps") {
            let query = section(prompt, "<user_query>", "</user_query>").unwrap_or_default();
            Ok(format!("Here is my plan:\n{}\n", plan_for(query)))
        } else {
            Ok(answer_for(prompt).to_string())
        }
    }

    fn model_info(&self) -> Value {
        json!({"provider": "offline", "capabilities": ["add", "divide"]})
    }
}
