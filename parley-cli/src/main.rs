use clap::{Parser, Subcommand};
use std::sync::Arc;

mod offline;

use offline::{OfflineModel, demo_assistant};
use parley::{
    AssistantManager, ConfigError, LanguageModel, Role, RunConfig, RunConfigBuilder, RunError,
    RunManager, StoreError, ThreadManager, ValidationError,
};

#[derive(Parser, Debug)]
#[command(name = "parley", version)]
#[command(about = "Parley CLI - plan, call functions and answer a conversation turn")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one conversation turn against an offline calculator assistant
    Demo {
        /// User message to answer
        #[arg(long, default_value = "What is 2 plus 2?")]
        query: String,
        /// Print the finished run as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the effective run configuration
    Config,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Run(#[from] RunError),
    #[error("invalid demo function: {0}")]
    Validation(#[from] ValidationError),
    #[error("failed to render output: {0}")]
    Output(#[from] serde_json::Error),
}

fn load_config() -> Result<RunConfig, CliError> {
    Ok(RunConfigBuilder::from_env()?.build()?)
}

async fn run_demo(query: String, json: bool) -> Result<(), CliError> {
    let config = load_config()?;
    let model: Arc<dyn LanguageModel> = Arc::new(OfflineModel);
    tracing::info!(model = %model.model_info(), "Starting demo");

    let assistants = AssistantManager::shared();
    let threads = ThreadManager::shared();
    let calculator = assistants.create_assistant(demo_assistant(model)?).await;
    let thread = threads.create_thread().await;
    threads
        .add_assistant_to_thread(&thread.id, &calculator.id)
        .await?;
    threads
        .add_message(&thread.id, Role::User, query.as_str(), None)
        .await?;

    let manager = RunManager::with_config(assistants, threads.clone(), config);
    let run = manager.create_and_execute_run(&thread.id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&run)?);
    } else {
        let messages = threads.get_messages(&thread.id).await?;
        for message in &messages {
            println!("[{}] {}", message.role, message.content);
        }
        println!("run {} {}", run.id, run.status);
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    // Initialize JSON logging once.
    let env_filter = tracing_subscriber::EnvFilter::from_default_env();
    let env_filter = match "info".parse() {
        Ok(directive) => env_filter.add_directive(directive),
        Err(_) => env_filter,
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .json()
        .try_init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Demo { query, json } => run_demo(query, json).await,
        Commands::Config => load_config().and_then(|config| {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "Command failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
