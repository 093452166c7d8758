//! Prompt rendering for the planning and synthesis calls.

use parley_core::{Assistant, FunctionResult, Message};
use serde::Serialize;
use std::fmt::Write;
use std::sync::Arc;

/// One prior message as shown to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub role: String,
    pub content: String,
    pub created_at: Option<String>,
    pub assistant_id: Option<String>,
}

impl From<&Message> for HistoryEntry {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role.as_str().to_string(),
            content: message.content.clone(),
            created_at: message.created_at.map(|ts| ts.to_rfc3339()),
            assistant_id: message.assistant_id.clone(),
        }
    }
}

impl HistoryEntry {
    /// The last `window` messages, oldest first.
    pub fn window(messages: &[Message], window: usize) -> Vec<HistoryEntry> {
        let start = messages.len().saturating_sub(window);
        messages[start..].iter().map(HistoryEntry::from).collect()
    }
}

pub fn format_conversation_history(history: &[HistoryEntry]) -> String {
    history.iter().fold(String::new(), |mut out, entry| {
        let _ = writeln!(out, "[{}]: {}", entry.role, entry.content);
        out
    })
}

/// Every candidate with its instructions and full function schema.
pub fn format_assistants_and_functions(assistants: &[Arc<Assistant>]) -> String {
    let mut out = String::new();
    for (index, assistant) in assistants.iter().enumerate() {
        let _ = writeln!(out, "Assistant {index}: {}", assistant.name);
        let _ = writeln!(out, "Instructions: {}", assistant.instructions);
        out.push_str("Functions:\n");
        for function in assistant.functions() {
            let _ = writeln!(out, "  - {}: {}", function.name(), function.description());
            out.push_str("    Parameters:\n");
            for (name, param) in function.parameters() {
                let _ = writeln!(
                    out,
                    "      {name}: {} - {}",
                    param.param_type, param.description
                );
                if let Some(values) = param.allowed_values.as_ref().filter(|v| !v.is_empty()) {
                    let _ = writeln!(out, "Allowed values: {}", values.join(", "));
                }
            }
        }
        out.push('\n');
    }
    out
}

/// Function catalogue of a single assistant, used by synthesis.
pub fn format_available_functions(assistant: &Assistant) -> String {
    let mut out = String::new();
    for function in assistant.functions() {
        let _ = writeln!(out, "Function: {}", function.name());
        let _ = writeln!(out, "Description: {}", function.description());
        out.push_str("Parameters:\n");
        for (name, param) in function.parameters() {
            let _ = writeln!(out, "  - {name}: {} - {}", param.param_type, param.description);
        }
        out.push('\n');
    }
    out
}

pub fn format_function_results(results: &[FunctionResult]) -> String {
    if results.is_empty() {
        return "No function results available.".to_string();
    }
    let mut out = String::new();
    for result in results {
        let rendered = serde_json::to_string_pretty(&result.result)
            .unwrap_or_else(|_| result.result.to_string());
        let _ = write!(out, "Function: {}\nResult: {rendered}\n\n", result.name);
    }
    out
}

pub fn format_errors(errors: &[String]) -> String {
    if errors.is_empty() {
        "No errors encountered.".to_string()
    } else {
        errors.join("\n")
    }
}

pub fn planning_prompt(
    query: &str,
    history: &[HistoryEntry],
    assistants: &[Arc<Assistant>],
) -> String {
    format!(
        r#"
Analyze the following user query and determine the necessary steps to respond:

<user_query>
{query}
</user_query>

Recent conversation history:
{history}

Available assistants and their functions:
{catalog}

Task: Determine the steps needed to respond to the user query and select the most appropriate assistant. Use available functions only when required. For general conversation, no function calls are needed.

Your response should be a valid JSON object with the following structure:
{{
    "steps": [
        {{
            "step_number": integer,
            "description": "string",
            "function_calls": [
                {{
                    "name": "string",
                    "arguments": object
                }}
            ]
        }}
    ],
    "selected_assistant_index": integer
}}

Important instructions:
- Respond ONLY with a valid JSON object matching the output format.
- Do not include any text outside the JSON structure.
- Strictly adhere to the function parameters if a function call is needed.
- Always select an appropriate assistant by setting the selected_assistant_index.
- Choose the assistant that has the required functions for the task.
"#,
        history = format_conversation_history(history),
        catalog = format_assistants_and_functions(assistants),
    )
}

pub fn synthesis_prompt(
    assistant: &Assistant,
    query: &str,
    results: &[FunctionResult],
    history: &[HistoryEntry],
    errors: &[String],
) -> String {
    format!(
        r#"
Generate a natural, conversational response to the following user query:

<user_query>
{query}
</user_query>

Recent conversation history:
{history}

Function results:
{results}

Errors encountered:
{errors}

Assistant Instructions:
{instructions}

Available functions:
{functions}

Task: Generate a natural, conversational response to the user's query based on the conversation history, function results, and any errors that occurred. If there were errors, acknowledge them in your response. Use the available functions if necessary.

Your response should be a valid JSON object with the following structure:
{{
    "response": "Your generated response as a string",
    "function_calls": [
        {{
            "name": "function_name",
            "arguments": {{}}
        }}
    ]
}}

Important instructions:
- Respond ONLY with a valid JSON object matching the output format.
- Do not include any text outside the JSON structure.
- Incorporate relevant information from the function results and conversation history.
- If there were errors, acknowledge them in a user-friendly manner.
- Keep the tone conversational and natural.
- Use the available functions if they are relevant to the user's query.
- If no functions are needed, provide an empty list for "function_calls".
"#,
        history = format_conversation_history(history),
        results = format_function_results(results),
        errors = format_errors(errors),
        instructions = assistant.instructions,
        functions = format_available_functions(assistant),
    )
}

/// Shorten `input` to at most `max_chars` characters for a log line.
pub fn truncate_for_log(input: &str, max_chars: usize) -> String {
    let char_count = input.chars().count();
    if char_count <= max_chars {
        return input.to_string();
    }
    let mut preview: String = input.chars().take(max_chars).collect();
    let _ = write!(preview, "... [truncated, total_chars={char_count}]");
    preview
}
