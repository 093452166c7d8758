//! Final answer synthesis.

use parley_core::{Assistant, FunctionCall, FunctionResult};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::RunConfig;
use crate::dispatcher::FunctionDispatcher;
use crate::error::RunError;
use crate::json::extract_json_object;
use crate::prompt::{self, HistoryEntry, truncate_for_log};

/// A follow-up call requested by the synthesis response.
#[derive(Debug, Clone, PartialEq)]
enum FollowUp {
    Call(FunctionCall),
    Invalid { name: String, reason: String },
}

/// Parsed synthesis response.
#[derive(Debug, Clone, PartialEq)]
struct Synthesis {
    response: String,
    follow_ups: Vec<FollowUp>,
}

/// Read `{"response": "...", "function_calls": [...]}` out of a model reply.
///
/// `None` means the reply is unusable and the raw text becomes the answer.
fn parse_synthesis(text: &str) -> Option<Synthesis> {
    let object = extract_json_object(text)?;
    let response = object.get("response")?.as_str()?.to_string();

    let follow_ups = object
        .get("function_calls")
        .and_then(Value::as_array)
        .map(|calls| calls.iter().filter_map(parse_follow_up).collect())
        .unwrap_or_default();

    Some(Synthesis {
        response,
        follow_ups,
    })
}

/// Entries without a non-empty string `name` are skipped.
fn parse_follow_up(entry: &Value) -> Option<FollowUp> {
    let name = entry.get("name")?.as_str().filter(|name| !name.is_empty())?;
    let follow_up = match entry.get("arguments") {
        None | Some(Value::Null) => FollowUp::Call(FunctionCall::new(name, Default::default())),
        Some(Value::Object(arguments)) => {
            FollowUp::Call(FunctionCall::new(name, arguments.clone()))
        }
        Some(other) => FollowUp::Invalid {
            name: name.to_string(),
            reason: format!("arguments for {name} must be an object, got {other}"),
        },
    };
    Some(follow_up)
}

/// Renders a value the way it is appended to an answer: strings verbatim,
/// everything else as compact JSON.
fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Turns step results into the user-facing answer.
#[derive(Debug, Clone)]
pub struct ResponseSynthesizer {
    dispatcher: FunctionDispatcher,
    log_truncate_chars: usize,
}

impl Default for ResponseSynthesizer {
    fn default() -> Self {
        Self::from_config(&RunConfig::default(), FunctionDispatcher::new())
    }
}

impl ResponseSynthesizer {
    pub fn from_config(config: &RunConfig, dispatcher: FunctionDispatcher) -> Self {
        Self {
            dispatcher,
            log_truncate_chars: config.log_truncate_chars,
        }
    }

    /// Produce the final answer text.
    ///
    /// A single model call. An unparsable reply degrades to its trimmed raw
    /// text; only a model invocation error fails.
    pub async fn synthesize(
        &self,
        assistant: &Assistant,
        query: &str,
        results: &[FunctionResult],
        history: &[HistoryEntry],
        errors: &[String],
    ) -> Result<String, RunError> {
        info!(
            target: "parley::assistant",
            assistant_id = %assistant.id,
            results = results.len(),
            errors = errors.len(),
            "Generating final response"
        );
        let synthesis_prompt = prompt::synthesis_prompt(assistant, query, results, history, errors);
        debug!(
            target: "parley::assistant",
            prompt = %truncate_for_log(&synthesis_prompt, self.log_truncate_chars),
            "Synthesis prompt"
        );

        let reply = assistant.complete(&synthesis_prompt).await?;
        debug!(
            target: "parley::assistant",
            response = %truncate_for_log(&reply, self.log_truncate_chars),
            "Raw synthesis response"
        );

        let Some(synthesis) = parse_synthesis(&reply) else {
            warn!(
                target: "parley::assistant",
                "Synthesis response was not in the expected JSON format, using raw text"
            );
            return Ok(reply.trim().to_string());
        };

        let mut answer = synthesis.response;
        for follow_up in synthesis.follow_ups {
            match follow_up {
                FollowUp::Call(call) => match self.dispatcher.dispatch(assistant, &call).await {
                    Ok(value) => {
                        answer.push_str("\n\nFunction result: ");
                        answer.push_str(&render_value(&value));
                    }
                    Err(err) => {
                        answer.push_str("\n\nError executing function: ");
                        answer.push_str(&err.to_string());
                    }
                },
                FollowUp::Invalid { name, reason } => {
                    warn!(target: "parley::function", function = %name, "{reason}");
                    answer.push_str("\n\nError executing function: ");
                    answer.push_str(&reason);
                }
            }
        }
        Ok(answer.trim().to_string())
    }
}
