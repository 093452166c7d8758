//! Query planning: ask the model for steps, validate, filter, select an owner.

use parley_core::{Arguments, FunctionCall, FunctionDefinition, StepDetails};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::config::RunConfig;
use crate::error::{PlanParseError, RunError};
use crate::json::extract_json;
use crate::prompt::{self, HistoryEntry, truncate_for_log};
use crate::snapshot::AssistantSnapshot;

/// Ordered steps plus the assistant that owns the run.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub assistant_id: String,
    pub steps: Vec<StepDetails>,
}

impl Plan {
    pub fn call_count(&self) -> usize {
        self.steps.iter().map(|step| step.function_calls.len()).sum()
    }
}

/// Every function declared by any candidate, keyed by name.
///
/// Name collisions resolve to the last declaration.
#[derive(Debug, Default)]
pub struct FunctionCatalog<'a> {
    functions: HashMap<&'a str, &'a FunctionDefinition>,
}

impl<'a> FunctionCatalog<'a> {
    pub fn from_snapshot(assistants: &'a AssistantSnapshot) -> Self {
        let functions = assistants
            .as_slice()
            .iter()
            .flat_map(|assistant| assistant.functions())
            .map(|function| (function.name(), function))
            .collect();
        Self { functions }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&'a FunctionDefinition> {
        self.functions.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct RawPlan {
    #[serde(default)]
    steps: Option<Vec<RawStep>>,
    #[serde(default)]
    selected_assistant_index: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawStep {
    step_number: i64,
    description: String,
    #[serde(default)]
    function_calls: Option<Vec<RawCall>>,
}

/// A planned call before its arguments are checked.
///
/// Calls to undeclared functions are dropped whatever their arguments look
/// like, so only kept calls go through [`RawCall::into_call`].
#[derive(Debug, Deserialize)]
struct RawCall {
    name: String,
    #[serde(default)]
    arguments: Value,
}

impl RawCall {
    fn into_call(self) -> Result<FunctionCall, PlanParseError> {
        match self.arguments {
            Value::Object(arguments) => Ok(FunctionCall::new(self.name, arguments)),
            Value::Null => Ok(FunctionCall::new(self.name, Arguments::new())),
            other => Err(PlanParseError::Schema(format!(
                "arguments for {} must be an object, got {other}",
                self.name
            ))),
        }
    }
}

/// Validate a planning response against the plan schema.
fn parse_plan(response: &str) -> Result<RawPlan, PlanParseError> {
    let value = extract_json(response).ok_or(PlanParseError::NoJson)?;
    if !value.is_object() {
        return Err(PlanParseError::NotAnObject);
    }
    let plan: RawPlan =
        serde_json::from_value(value).map_err(|e| PlanParseError::Schema(e.to_string()))?;
    let steps = plan.steps.as_deref().unwrap_or_default();
    if steps
        .iter()
        .any(|step| step.step_number <= 0 || step.step_number > i64::from(u32::MAX))
    {
        return Err(PlanParseError::InvalidStepNumber);
    }
    Ok(plan)
}

/// Produces a [`Plan`] for a query from the candidates' first model.
#[derive(Debug, Clone)]
pub struct QueryPlanner {
    max_attempts: u32,
    log_truncate_chars: usize,
}

impl Default for QueryPlanner {
    fn default() -> Self {
        Self::from_config(&RunConfig::default())
    }
}

impl QueryPlanner {
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            max_attempts: config.planning_max_attempts.max(1),
            log_truncate_chars: config.log_truncate_chars,
        }
    }

    /// Plan a response to `query`.
    ///
    /// Malformed responses are retried up to the configured attempt count;
    /// model invocation errors abort immediately.
    pub async fn plan(
        &self,
        query: &str,
        history: &[HistoryEntry],
        assistants: &AssistantSnapshot,
    ) -> Result<Plan, RunError> {
        let catalog = FunctionCatalog::from_snapshot(assistants);
        let planning_prompt = prompt::planning_prompt(query, history, assistants.as_slice());
        let model = assistants.first();
        debug!(
            target: "parley::assistant",
            prompt = %truncate_for_log(&planning_prompt, self.log_truncate_chars),
            "Planning prompt"
        );

        let mut last_error = PlanParseError::NoJson;
        for attempt in 1..=self.max_attempts {
            let response = model.complete(&planning_prompt).await?;
            debug!(
                target: "parley::assistant",
                attempt,
                response = %truncate_for_log(&response, self.log_truncate_chars),
                "Raw planning response"
            );

            match parse_plan(&response).and_then(|raw| self.finalize(raw, &catalog, assistants)) {
                Ok(plan) => return Ok(plan),
                Err(err) => {
                    warn!(
                        target: "parley::assistant",
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %err,
                        "Malformed planning response"
                    );
                    last_error = err;
                }
            }
        }

        Err(RunError::PlanningFailed {
            attempts: self.max_attempts,
            reason: last_error.to_string(),
        })
    }

    fn finalize(
        &self,
        raw: RawPlan,
        catalog: &FunctionCatalog<'_>,
        assistants: &AssistantSnapshot,
    ) -> Result<Plan, PlanParseError> {
        let raw_steps = raw.steps.unwrap_or_default();
        if raw_steps.is_empty() {
            info!(target: "parley::assistant", "No steps found in planning response");
        }

        let mut steps = Vec::with_capacity(raw_steps.len());
        for raw_step in raw_steps {
            let mut kept = Vec::new();
            for call in raw_step.function_calls.unwrap_or_default() {
                if catalog.contains(&call.name) {
                    kept.push(call.into_call()?);
                } else {
                    warn!(
                        target: "parley::assistant",
                        step = raw_step.step_number,
                        function = %call.name,
                        "Dropping call to unknown function"
                    );
                }
            }
            if kept.is_empty() {
                continue;
            }
            // Range checked in parse_plan.
            let step_number = u32::try_from(raw_step.step_number).unwrap_or(u32::MAX);
            steps.push(StepDetails::new(step_number, raw_step.description, kept));
        }

        let owner = select_assistant(raw.selected_assistant_index.as_ref(), assistants);
        info!(
            target: "parley::assistant",
            assistant_id = %owner,
            steps = steps.len(),
            "Plan ready"
        );
        Ok(Plan {
            assistant_id: owner,
            steps,
        })
    }
}

/// Pick the owner by index, defaulting to the first candidate.
fn select_assistant(index: Option<&Value>, assistants: &AssistantSnapshot) -> String {
    let selected = index
        .and_then(Value::as_u64)
        .and_then(|i| usize::try_from(i).ok())
        .and_then(|i| assistants.get_index(i));
    match selected {
        Some(assistant) => assistant.id.clone(),
        None => {
            if index.is_some_and(|value| !value.is_null()) {
                warn!(
                    target: "parley::assistant",
                    index = %index.map(|value| value.to_string()).unwrap_or_default(),
                    candidates = assistants.len(),
                    "Invalid selected_assistant_index, defaulting to first assistant"
                );
            }
            assistants.first().id.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::{Assistant, AssistantSpec, FunctionDefinition, LanguageModel};
    use parley_testing::{MockFunction, ScriptedModel, fixtures};
    use rstest::rstest;
    use serde_json::json;
    use std::sync::Arc;

    fn calculator(llm: Arc<dyn LanguageModel>, id: &str) -> Arc<Assistant> {
        Arc::new(fixtures::calculator_spec(llm).into_assistant(id))
    }

    fn converter(id: &str) -> Arc<Assistant> {
        Arc::new(
            AssistantSpec::new("Converter", "Converts units", "test-model", ScriptedModel::shared())
                .with_tool(fixtures::convert_function())
                .into_assistant(id),
        )
    }

    fn snapshot(model: ScriptedModel) -> (Arc<ScriptedModel>, AssistantSnapshot) {
        let model = Arc::new(model);
        let assistants =
            AssistantSnapshot::new(vec![calculator(model.clone(), "calc-1"), converter("conv-1")])
                .unwrap();
        (model, assistants)
    }

    #[tokio::test]
    async fn test_third_attempt_succeeds() {
        let (model, assistants) = snapshot(
            ScriptedModel::new()
                .with_response("I think you should add the numbers")
                .with_response("{\"steps\": [")
                .with_response(fixtures::single_call_plan("add", json!({"a": 2, "b": 2}), 0)),
        );

        let plan = QueryPlanner::default()
            .plan("What is 2 plus 2?", &[], &assistants)
            .await
            .unwrap();

        assert_eq!(model.call_count(), 3);
        assert_eq!(plan.assistant_id, "calc-1");
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.steps[0].function_calls[0].name, "add");
        assert_eq!(plan.call_count(), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let (model, assistants) = snapshot(
            ScriptedModel::new()
                .with_response("nope")
                .with_response("still nope")
                .with_response("[1, 2, 3]")
                .with_response(fixtures::empty_plan()),
        );

        let err = QueryPlanner::default()
            .plan("hi", &[], &assistants)
            .await
            .unwrap_err();

        assert_eq!(model.call_count(), 3);
        assert_eq!(model.remaining(), 1);
        assert!(matches!(err, RunError::PlanningFailed { attempts: 3, .. }));
        assert_eq!(
            err.to_string(),
            "Failed to get a valid response after 3 attempts: Expected a JSON object at the top level"
        );
    }

    #[tokio::test]
    async fn test_model_error_is_not_retried() {
        let (model, assistants) = snapshot(
            ScriptedModel::new()
                .with_failure("connection reset")
                .with_response(fixtures::empty_plan()),
        );

        let err = QueryPlanner::default()
            .plan("hi", &[], &assistants)
            .await
            .unwrap_err();
        assert_eq!(model.call_count(), 1);
        assert!(matches!(err, RunError::Model(_)));
    }

    #[tokio::test]
    async fn test_configured_attempts() {
        let (model, assistants) = snapshot(ScriptedModel::new().with_response("nope"));
        let config = RunConfig::builder().planning_max_attempts(1).build().unwrap();

        let err = QueryPlanner::from_config(&config)
            .plan("hi", &[], &assistants)
            .await
            .unwrap_err();
        assert_eq!(model.call_count(), 1);
        assert!(matches!(err, RunError::PlanningFailed { attempts: 1, .. }));
    }

    #[tokio::test]
    async fn test_unknown_calls_filtered_and_empty_steps_dropped() {
        let response = json!({
            "steps": [
                {
                    "step_number": 1,
                    "description": "Only unknown",
                    "function_calls": [{"name": "sqrt", "arguments": {"x": 4}}]
                },
                {
                    "step_number": 3,
                    "description": "Mixed",
                    "function_calls": [
                        {"name": "teleport", "arguments": {}},
                        {"name": "convert_temperature", "arguments": {"value": 212, "unit": "celsius"}},
                        {"name": "add"}
                    ]
                },
                {"step_number": 4, "description": "Talk", "function_calls": []}
            ],
            "selected_assistant_index": 1
        });
        let (_, assistants) = snapshot(ScriptedModel::new().with_response(response.to_string()));

        let plan = QueryPlanner::default()
            .plan("convert", &[], &assistants)
            .await
            .unwrap();

        assert_eq!(plan.assistant_id, "conv-1");
        assert_eq!(plan.steps.len(), 1);
        let step = &plan.steps[0];
        assert_eq!(step.step_number, 3);
        let names: Vec<&str> = step.function_calls.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["convert_temperature", "add"]);
        assert!(step.function_calls[1].arguments.is_empty());
        assert!(!step.is_executed());
    }

    #[tokio::test]
    async fn test_unknown_call_with_odd_arguments_is_dropped() {
        let response = json!({
            "steps": [{
                "step_number": 1,
                "description": "Add, then travel",
                "function_calls": [
                    {"name": "add", "arguments": {"a": 2, "b": 2}},
                    {"name": "teleport", "arguments": "to mars"},
                    {"name": "warp", "arguments": [1, 2]}
                ]
            }],
            "selected_assistant_index": 0
        });
        let (model, assistants) =
            snapshot(ScriptedModel::new().with_response(response.to_string()));

        let plan = QueryPlanner::default()
            .plan("What is 2 plus 2?", &[], &assistants)
            .await
            .unwrap();

        assert_eq!(model.call_count(), 1);
        assert_eq!(plan.call_count(), 1);
        assert_eq!(plan.steps[0].function_calls[0].name, "add");
        assert_eq!(
            Value::Object(plan.steps[0].function_calls[0].arguments.clone()),
            json!({"a": 2, "b": 2})
        );
    }

    #[tokio::test]
    async fn test_known_call_with_non_object_arguments_is_retried() {
        let bad = json!({
            "steps": [{
                "step_number": 1,
                "description": "Add",
                "function_calls": [{"name": "add", "arguments": "2 and 2"}]
            }]
        });
        let (model, assistants) = snapshot(
            ScriptedModel::new()
                .with_response(bad.to_string())
                .with_response(fixtures::single_call_plan("add", json!({"a": 2, "b": 2}), 0)),
        );

        let plan = QueryPlanner::default()
            .plan("What is 2 plus 2?", &[], &assistants)
            .await
            .unwrap();

        assert_eq!(model.call_count(), 2);
        assert_eq!(plan.call_count(), 1);
    }

    #[test]
    fn test_null_arguments_become_empty() {
        let call = RawCall {
            name: "add".to_string(),
            arguments: Value::Null,
        };
        assert!(call.into_call().unwrap().arguments.is_empty());

        let call = RawCall {
            name: "add".to_string(),
            arguments: json!(3),
        };
        assert_eq!(
            call.into_call().unwrap_err().to_string(),
            "Plan does not match the expected schema: arguments for add must be an object, got 3"
        );
    }

    #[tokio::test]
    async fn test_prose_wrapped_plan_and_null_steps() {
        let reply = "Sure! Here you go:\n{\"steps\": null, \"selected_assistant_index\": 0}\nThanks";
        let (_, assistants) = snapshot(ScriptedModel::new().with_response(reply));
        let plan = QueryPlanner::default()
            .plan("hi", &[], &assistants)
            .await
            .unwrap();
        assert!(plan.steps.is_empty());
        assert_eq!(plan.assistant_id, "calc-1");
    }

    #[tokio::test]
    async fn test_planning_uses_first_candidate_model() {
        let (model, assistants) =
            snapshot(ScriptedModel::new().with_response(fixtures::empty_plan()));
        QueryPlanner::default()
            .plan("What is 2 plus 2?", &[], &assistants)
            .await
            .unwrap();

        let prompts = model.prompts();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].model, "test-model");
        assert!(prompts[0].prompt.contains("Assistant 1: Converter"));
    }

    #[rstest]
    #[case(json!({"steps": [{"description": "no number", "function_calls": []}]}))]
    #[case(json!({"steps": [{"step_number": 1, "function_calls": []}]}))]
    #[case(json!({"steps": [{"step_number": 0, "description": "zero", "function_calls": []}]}))]
    #[case(json!({"steps": [{"step_number": -2, "description": "negative", "function_calls": []}]}))]
    #[case(json!({"steps": [{"step_number": 1, "description": "d", "function_calls": [{"arguments": {}}]}]}))]
    #[case(json!({"steps": "not a list"}))]
    fn test_schema_violations(#[case] response: Value) {
        assert!(parse_plan(&response.to_string()).is_err());
    }

    #[rstest]
    #[case(Some(json!(1)), "b")]
    #[case(Some(json!(0)), "a")]
    #[case(Some(json!(7)), "a")]
    #[case(Some(json!(-1)), "a")]
    #[case(Some(json!("1")), "a")]
    #[case(Some(json!(1.5)), "a")]
    #[case(Some(Value::Null), "a")]
    #[case(None, "a")]
    fn test_select_assistant(#[case] index: Option<Value>, #[case] expected: &str) {
        let assistants = AssistantSnapshot::new(vec![
            calculator(ScriptedModel::shared(), "a"),
            calculator(ScriptedModel::shared(), "b"),
        ])
        .unwrap();
        assert_eq!(select_assistant(index.as_ref(), &assistants), expected);
    }

    #[test]
    fn test_catalog_last_declaration_wins() {
        let first = MockFunction::returning(json!(1));
        let second = MockFunction::returning(json!(2));
        let first = FunctionDefinition::new("lookup", "first", first.as_invocable()).unwrap();
        let second = FunctionDefinition::new("lookup", "second", second.as_invocable()).unwrap();
        let a = Arc::new(
            AssistantSpec::new("A", "", "m", ScriptedModel::shared())
                .with_tool(first)
                .into_assistant("a"),
        );
        let b = Arc::new(
            AssistantSpec::new("B", "", "m", ScriptedModel::shared())
                .with_tool(second)
                .into_assistant("b"),
        );
        let assistants = AssistantSnapshot::new(vec![a, b]).unwrap();
        let catalog = FunctionCatalog::from_snapshot(&assistants);

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("lookup").unwrap().description(), "second");
        assert!(!catalog.contains("missing"));
    }
}
