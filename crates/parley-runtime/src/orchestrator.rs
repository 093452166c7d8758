//! Run orchestration and the in-process run registry.

use parley_core::{
    AssistantRegistry, FunctionResult, Message, Role, Run, ThreadStore, latest_user_message,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

use crate::config::RunConfig;
use crate::dispatcher::FunctionDispatcher;
use crate::error::RunError;
use crate::executor::StepExecutor;
use crate::planner::QueryPlanner;
use crate::prompt::HistoryEntry;
use crate::snapshot::AssistantSnapshot;
use crate::synthesizer::ResponseSynthesizer;

/// Drives runs from the latest user message to a stored assistant reply.
///
/// Every run created here stays readable through [`RunManager::get_run`]
/// for the lifetime of the manager. Runs are independent of each other and
/// may execute concurrently.
pub struct RunManager {
    assistants: Arc<dyn AssistantRegistry>,
    threads: Arc<dyn ThreadStore>,
    config: RunConfig,
    planner: QueryPlanner,
    executor: StepExecutor,
    synthesizer: ResponseSynthesizer,
    runs: RwLock<RunTable>,
}

/// Runs by id, remembering creation order.
#[derive(Debug, Default)]
struct RunTable {
    runs: HashMap<String, Run>,
    order: Vec<String>,
}

impl RunTable {
    fn insert(&mut self, run: &Run) {
        if self.runs.insert(run.id.clone(), run.clone()).is_none() {
            self.order.push(run.id.clone());
        }
    }

    fn ordered(&self) -> impl Iterator<Item = &Run> {
        self.order.iter().filter_map(|id| self.runs.get(id))
    }
}

impl RunManager {
    pub fn new(assistants: Arc<dyn AssistantRegistry>, threads: Arc<dyn ThreadStore>) -> Self {
        Self::with_config(assistants, threads, RunConfig::default())
    }

    pub fn with_config(
        assistants: Arc<dyn AssistantRegistry>,
        threads: Arc<dyn ThreadStore>,
        config: RunConfig,
    ) -> Self {
        let dispatcher = FunctionDispatcher::new();
        Self {
            assistants,
            threads,
            planner: QueryPlanner::from_config(&config),
            executor: StepExecutor::new(dispatcher),
            synthesizer: ResponseSynthesizer::from_config(&config, dispatcher),
            config,
            runs: RwLock::new(RunTable::default()),
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Answer the latest user message of a thread.
    ///
    /// Fails with `NoUserMessage` or `NoAssistants` before any run exists.
    /// Once the run is created, any failure marks it `Failed` and comes back
    /// as `RunExecutionFailed`.
    pub async fn create_and_execute_run(&self, thread_id: &str) -> Result<Run, RunError> {
        info!(target: "parley::thread", thread_id = %thread_id, "Creating and executing run");
        let messages = self.threads.get_messages(thread_id).await?;
        let Some(query) = latest_user_message(&messages)
            .map(|message| message.content.clone())
            .filter(|content| !content.is_empty())
        else {
            error!(
                target: "parley::thread",
                thread_id = %thread_id,
                "No user message found in the thread"
            );
            return Err(RunError::NoUserMessage {
                thread_id: thread_id.to_string(),
            });
        };
        info!(target: "parley::thread", thread_id = %thread_id, query = %query, "User query");

        let thread = self.threads.get_thread(thread_id).await?;
        let assistants =
            AssistantSnapshot::resolve(self.assistants.as_ref(), &thread.assistant_ids).await?;
        let run = self.create_run(thread_id, &assistants.first().id).await;

        self.execute_run(&run.id, &query, &assistants, &messages)
            .await
    }

    /// Register a new `Queued` run.
    pub async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Run {
        let run = Run::new(thread_id, assistant_id);
        self.store(&run).await;
        info!(
            target: "parley::thread",
            run_id = %run.id,
            thread_id = %thread_id,
            assistant_id = %assistant_id,
            "Run created"
        );
        run
    }

    /// Execute a `Queued` run to a terminal state.
    ///
    /// `history` is the conversation shown to the model, oldest first; only
    /// the last `history_window` entries are used.
    pub async fn execute_run(
        &self,
        run_id: &str,
        query: &str,
        assistants: &AssistantSnapshot,
        history: &[Message],
    ) -> Result<Run, RunError> {
        let mut run = self.get_run(run_id).await?;
        run.start()?;
        self.store(&run).await;
        info!(target: "parley::thread", run_id = %run_id, "Run started");

        let history = HistoryEntry::window(history, self.config.history_window);
        match self.drive(&mut run, query, assistants, &history).await {
            Ok(()) => {
                self.store(&run).await;
                info!(
                    target: "parley::thread",
                    run_id = %run_id,
                    steps = run.steps.len(),
                    "Run completed"
                );
                Ok(run)
            }
            Err(err) => {
                error!(
                    target: "parley::thread",
                    run_id = %run_id,
                    code = err.error_code(),
                    "Run execution failed: {err}"
                );
                if let Err(state_err) = run.fail(err.to_string()) {
                    error!(target: "parley::thread", run_id = %run_id, "{state_err}");
                }
                self.store(&run).await;
                Err(RunError::RunExecutionFailed {
                    run_id: run_id.to_string(),
                    source: Box::new(err),
                })
            }
        }
    }

    async fn drive(
        &self,
        run: &mut Run,
        query: &str,
        assistants: &AssistantSnapshot,
        history: &[HistoryEntry],
    ) -> Result<(), RunError> {
        let plan = self.planner.plan(query, history, assistants).await?;
        run.assistant_id = plan.assistant_id;
        run.steps = plan.steps;
        self.store(run).await;

        let owner = assistants
            .find(&run.assistant_id)
            .unwrap_or_else(|| assistants.first())
            .clone();
        info!(
            target: "parley::assistant",
            assistant_id = %owner.id,
            name = %owner.name,
            "Selected assistant"
        );

        let mut results: Vec<FunctionResult> = Vec::new();
        let mut errors: Vec<String> = Vec::new();
        for step in &mut run.steps {
            let outcome = self.executor.execute(assistants, &owner.id, step).await?;
            results.extend(outcome.results.iter().cloned());
            errors.extend(outcome.errors.iter().cloned());
            step.record_outcome(outcome.results, outcome.errors)?;
        }

        let answer = self
            .synthesizer
            .synthesize(&owner, query, &results, history, &errors)
            .await?;
        info!(target: "parley::thread", run_id = %run.id, response = %answer, "Final response");

        self.threads
            .append_message(&run.thread_id, Role::Assistant, answer, Some(owner.id.clone()))
            .await?;
        run.complete()?;
        Ok(())
    }

    async fn store(&self, run: &Run) {
        self.runs.write().await.insert(run);
    }

    pub async fn get_run(&self, run_id: &str) -> Result<Run, RunError> {
        self.runs
            .read()
            .await
            .runs
            .get(run_id)
            .cloned()
            .ok_or_else(|| RunError::RunNotFound(run_id.to_string()))
    }

    /// Runs of a thread in creation order.
    pub async fn list_runs(&self, thread_id: &str) -> Vec<Run> {
        self.runs
            .read()
            .await
            .ordered()
            .filter(|run| run.thread_id == thread_id)
            .cloned()
            .collect()
    }
}
