//! End-to-End Run Lifecycle Tests
//!
//! Drive complete runs through the in-memory stores with scripted models and
//! check the externally visible outcome: run status, recorded steps, and the
//! reply stored on the thread.

use parley::{
    AssistantManager, AssistantSpec, FunctionDefinition, LanguageModel, Role, RunError, RunManager,
    RunStatus, ThreadManager,
};
use parley_testing::{MockFunction, ScriptedModel, fixtures};
use serde_json::json;
use std::sync::Arc;

struct World {
    assistants: Arc<AssistantManager>,
    threads: Arc<ThreadManager>,
    runs: RunManager,
    thread_id: String,
}

impl World {
    async fn new() -> Self {
        let assistants = AssistantManager::shared();
        let threads = ThreadManager::shared();
        let thread = threads.create_thread().await;
        let runs = RunManager::new(assistants.clone(), threads.clone());
        Self {
            assistants,
            threads,
            runs,
            thread_id: thread.id,
        }
    }

    async fn attach(&self, spec: AssistantSpec) -> String {
        let assistant = self.assistants.create_assistant(spec).await;
        self.threads
            .add_assistant_to_thread(&self.thread_id, &assistant.id)
            .await
            .expect("thread exists");
        assistant.id.clone()
    }

    async fn say(&self, text: &str) {
        self.threads
            .add_message(&self.thread_id, Role::User, text, None)
            .await
            .expect("thread exists");
    }

    async fn last_reply(&self) -> Option<String> {
        self.threads
            .get_messages(&self.thread_id)
            .await
            .expect("thread exists")
            .into_iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .map(|m| m.content)
    }
}

#[tokio::test]
async fn test_add_two_and_two() {
    let world = World::new().await;
    let model = Arc::new(
        ScriptedModel::new()
            .with_response(fixtures::single_call_plan("add", json!({"a": 2, "b": 2}), 0))
            .with_response(fixtures::synthesis_response("2 plus 2 equals 4.")),
    );
    let calc_id = world.attach(fixtures::calculator_spec(model.clone())).await;
    world.say("What is 2 plus 2?").await;

    let run = world.runs.create_and_execute_run(&world.thread_id).await.unwrap();

    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.assistant_id, calc_id);
    assert_eq!(run.steps.len(), 1);
    let results = run.steps[0].results.as_ref().unwrap();
    assert_eq!(results[0].name, "add");
    assert_eq!(results[0].result, json!(4));

    let prompts = model.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].prompt.contains("Function: add\nResult: 4"));

    let reply = world.last_reply().await.unwrap();
    assert!(!reply.is_empty());
    assert_eq!(reply, "2 plus 2 equals 4.");
}

#[tokio::test]
async fn test_empty_thread_fails_before_any_run() {
    let world = World::new().await;
    let model = Arc::new(ScriptedModel::new());
    world.attach(fixtures::calculator_spec(model.clone())).await;

    let err = world
        .runs
        .create_and_execute_run(&world.thread_id)
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::NoUserMessage { .. }));
    assert_eq!(err.error_code(), "NO_USER_MESSAGE");
    assert!(err.run_id().is_none());
    assert!(world.runs.list_runs(&world.thread_id).await.is_empty());
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn test_only_assistant_messages_count_as_no_user_message() {
    let world = World::new().await;
    let calc_id = world
        .attach(fixtures::calculator_spec(ScriptedModel::shared()))
        .await;
    world
        .threads
        .add_message(&world.thread_id, Role::Assistant, "Hi, how can I help?", Some(calc_id))
        .await
        .unwrap();

    let err = world
        .runs
        .create_and_execute_run(&world.thread_id)
        .await
        .unwrap_err();
    assert!(matches!(err, RunError::NoUserMessage { .. }));
}

#[tokio::test]
async fn test_unknown_thread() {
    let world = World::new().await;
    let err = world.runs.create_and_execute_run("nope").await.unwrap_err();
    assert_eq!(err.error_code(), "THREAD_NOT_FOUND");
}

#[tokio::test]
async fn test_two_malformed_plans_then_valid() {
    let world = World::new().await;
    let model = Arc::new(
        ScriptedModel::new()
            .with_response("Let me think about this...")
            .with_response("{\"steps\": [{\"step_number\": \"one\"}]}")
            .with_response(fixtures::single_call_plan("add", json!({"a": 40, "b": 2}), 0))
            .with_response(fixtures::synthesis_response("42")),
    );
    world.attach(fixtures::calculator_spec(model.clone())).await;
    world.say("What is 40 plus 2?").await;

    let run = world.runs.create_and_execute_run(&world.thread_id).await.unwrap();

    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(model.call_count(), 4);
    assert_eq!(run.steps.len(), 1);
    assert_eq!(run.steps[0].results.as_ref().unwrap()[0].result, json!(42));
    assert_eq!(world.last_reply().await.as_deref(), Some("42"));
}

#[tokio::test]
async fn test_three_malformed_plans_fail_the_run() {
    let world = World::new().await;
    let model = Arc::new(
        ScriptedModel::new()
            .with_response("no")
            .with_response("still no")
            .with_response("{\"steps\": 5}")
            .with_response(fixtures::synthesis_response("never used")),
    );
    world.attach(fixtures::calculator_spec(model.clone())).await;
    world.say("hello").await;

    let err = world
        .runs
        .create_and_execute_run(&world.thread_id)
        .await
        .unwrap_err();

    assert_eq!(model.call_count(), 3);
    assert!(
        err.to_string()
            .starts_with("Run execution failed: Failed to get a valid response after 3 attempts")
    );
    let run = world.runs.get_run(err.run_id().unwrap()).await.unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    assert!(run.error.is_some());
    assert!(world.last_reply().await.is_none());
}

#[tokio::test]
async fn test_unknown_functions_are_dropped_before_execution() {
    let world = World::new().await;
    let plan = json!({
        "steps": [
            {
                "step_number": 1,
                "description": "Use a tool nobody has",
                "function_calls": [{"name": "launch_rocket", "arguments": {}}]
            },
            {
                "step_number": 2,
                "description": "Add, plus a bogus call",
                "function_calls": [
                    {"name": "add", "arguments": {"a": 1, "b": 1}},
                    {"name": "launch_rocket", "arguments": "to mars"}
                ]
            }
        ],
        "selected_assistant_index": 0
    });
    let model = Arc::new(
        ScriptedModel::new()
            .with_response(plan.to_string())
            .with_response(fixtures::synthesis_response("1 plus 1 is 2.")),
    );
    world.attach(fixtures::calculator_spec(model.clone())).await;
    world.say("1 + 1 and launch a rocket").await;

    let run = world.runs.create_and_execute_run(&world.thread_id).await.unwrap();

    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.steps.len(), 1);
    assert_eq!(run.steps[0].step_number, 2);
    assert_eq!(run.steps[0].function_calls.len(), 1);
    assert!(run.steps[0].errors.is_empty());
    assert_eq!(model.call_count(), 2);
    assert!(model.prompts()[1].prompt.contains("No errors encountered."));
}

#[tokio::test]
async fn test_failed_call_does_not_stop_the_next() {
    let world = World::new().await;
    let plan = json!({
        "steps": [{
            "step_number": 1,
            "description": "Divide by zero, then add",
            "function_calls": [
                {"name": "divide", "arguments": {"a": 10, "b": 0}},
                {"name": "add", "arguments": {"a": 3, "b": 4}}
            ]
        }],
        "selected_assistant_index": 0
    });
    let model = Arc::new(
        ScriptedModel::new()
            .with_response(plan.to_string())
            .with_response(fixtures::synthesis_response(
                "I couldn't divide by zero, but 3 plus 4 is 7.",
            )),
    );
    world.attach(fixtures::calculator_spec(model.clone())).await;
    world.say("Divide 10 by 0 and add 3 and 4").await;

    let run = world.runs.create_and_execute_run(&world.thread_id).await.unwrap();

    assert_eq!(run.status, RunStatus::Completed);
    assert!(run.error.is_none());
    let step = &run.steps[0];
    assert_eq!(step.results.as_ref().unwrap()[0].result, json!(7));
    assert_eq!(step.errors, vec!["Error executing function divide: division by zero".to_string()]);

    let synthesis_prompt = &model.prompts()[1].prompt;
    assert!(synthesis_prompt.contains(
        "Errors encountered:\nError executing function divide: division by zero"
    ));
    assert!(synthesis_prompt.contains("Function: add\nResult: 7"));
}

#[tokio::test]
async fn test_failures_across_steps_are_all_reported() {
    let world = World::new().await;
    let flaky = MockFunction::failing("backend unavailable");
    let spec = fixtures::calculator_spec(Arc::new(
        ScriptedModel::new()
            .with_response(
                json!({
                    "steps": [
                        {"step_number": 1, "description": "Lookup", "function_calls": [{"name": "lookup", "arguments": {"q": "x"}}]},
                        {"step_number": 2, "description": "Add", "function_calls": [{"name": "add", "arguments": {"a": 1, "b": 2}}]}
                    ],
                    "selected_assistant_index": 0
                })
                .to_string(),
            )
            .with_response(fixtures::synthesis_response("Partly done.")),
    ))
    .with_tool(
        FunctionDefinition::new("lookup", "Look something up", flaky.as_invocable()).unwrap(),
    );
    world.attach(spec).await;
    world.say("lookup x then add").await;

    let run = world.runs.create_and_execute_run(&world.thread_id).await.unwrap();

    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(flaky.call_count(), 1);
    assert_eq!(run.steps.len(), 2);
    assert!(run.steps[0].results.as_ref().unwrap().is_empty());
    assert_eq!(run.steps[0].errors.len(), 1);
    assert_eq!(run.steps[1].results.as_ref().unwrap()[0].result, json!(3));
}

#[tokio::test]
async fn test_unparsable_synthesis_uses_raw_text() {
    let world = World::new().await;
    let model = Arc::new(
        ScriptedModel::new()
            .with_response(fixtures::empty_plan())
            .with_response("   Hello there! Nice to meet you.\n"),
    );
    world.attach(fixtures::calculator_spec(model)).await;
    world.say("hi").await;

    let run = world.runs.create_and_execute_run(&world.thread_id).await.unwrap();

    assert_eq!(run.status, RunStatus::Completed);
    assert!(run.steps.is_empty());
    assert_eq!(
        world.last_reply().await.as_deref(),
        Some("Hello there! Nice to meet you.")
    );
}

#[tokio::test]
async fn test_selected_assistant_owns_the_run() {
    let world = World::new().await;
    let plan = fixtures::single_call_plan(
        "convert_temperature",
        json!({"value": 212, "unit": "celsius"}),
        1,
    );
    let planner_model = Arc::new(ScriptedModel::new().with_response(plan));
    let converter_model = Arc::new(
        ScriptedModel::new().with_response(fixtures::synthesis_response("212°F is 100°C.")),
    );
    world.attach(fixtures::calculator_spec(planner_model.clone())).await;
    let converter_id = world
        .attach(
            AssistantSpec::new(
                "Converter",
                "Convert units",
                "convert-model",
                converter_model.clone(),
            )
            .with_tool(fixtures::convert_function()),
        )
        .await;
    world.say("What is 212F in celsius?").await;

    let run = world.runs.create_and_execute_run(&world.thread_id).await.unwrap();

    assert_eq!(run.assistant_id, converter_id);
    assert_eq!(run.steps[0].results.as_ref().unwrap()[0].result, json!(100.0));
    assert_eq!(planner_model.call_count(), 1);
    assert_eq!(converter_model.call_count(), 1);
    assert_eq!(converter_model.prompts()[0].model, "convert-model");

    let messages = world.threads.get_messages(&world.thread_id).await.unwrap();
    assert_eq!(messages.last().unwrap().assistant_id.as_deref(), Some(converter_id.as_str()));
}

#[tokio::test]
async fn test_model_outage_fails_the_run() {
    let world = World::new().await;
    world
        .attach(fixtures::calculator_spec(Arc::new(
            ScriptedModel::new().with_failure("503 Service Unavailable"),
        )))
        .await;
    world.say("hello").await;

    let err = world
        .runs
        .create_and_execute_run(&world.thread_id)
        .await
        .unwrap_err();

    assert_eq!(err.root_cause().error_code(), "MODEL_INVOCATION_FAILED");
    let run = world.runs.get_run(err.run_id().unwrap()).await.unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    assert!(run.error.unwrap().contains("503 Service Unavailable"));
}

#[tokio::test]
async fn test_concurrent_runs_on_separate_threads() {
    let assistants = AssistantManager::shared();
    let threads = ThreadManager::shared();
    let runs = RunManager::new(assistants.clone(), threads.clone());

    let mut thread_ids = Vec::new();
    for (a, b) in [(1, 2), (20, 22)] {
        let model: Arc<dyn LanguageModel> = Arc::new(
            ScriptedModel::new()
                .with_response(fixtures::single_call_plan("add", json!({"a": a, "b": b}), 0))
                .with_response(fixtures::synthesis_response(&format!("{}", a + b))),
        );
        let calc = assistants.create_assistant(fixtures::calculator_spec(model)).await;
        let thread = threads.create_thread().await;
        threads.add_assistant_to_thread(&thread.id, &calc.id).await.unwrap();
        threads
            .add_message(&thread.id, Role::User, format!("{a} plus {b}"), None)
            .await
            .unwrap();
        thread_ids.push(thread.id);
    }

    let (first, second) = tokio::join!(
        runs.create_and_execute_run(&thread_ids[0]),
        runs.create_and_execute_run(&thread_ids[1]),
    );
    assert_eq!(first.unwrap().status, RunStatus::Completed);
    assert_eq!(second.unwrap().status, RunStatus::Completed);

    let reply = threads.get_messages(&thread_ids[1]).await.unwrap();
    assert_eq!(reply.last().unwrap().content, "42");
    assert_eq!(runs.list_runs(&thread_ids[0]).await.len(), 1);
}
