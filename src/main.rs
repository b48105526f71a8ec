use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use mission_control::config::ControlConfig;
use mission_control::engine::{ExecutionStage, MissionEngine, StageContext, StageOutcome};
use mission_control::error::Result;
use mission_control::events::{EventBus, LogSink};
use mission_control::mission::{AgentType, MemoryStore};

#[derive(Parser)]
#[command(name = "mission-control", about = "Self-healing mission pipeline")]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a mission and drive it to a terminal status
    Run {
        /// Natural-language mission request
        prompt: String,

        /// Mission id; generated when omitted
        #[arg(long)]
        id: Option<String>,

        /// Agent pool for stage dispatch
        #[arg(long, default_value = "general")]
        agent: AgentType,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("mission_control=debug")
    } else {
        EnvFilter::new("mission_control=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ControlConfig::load(path).await?,
        None => ControlConfig::default(),
    };

    match cli.command {
        Commands::Run { prompt, id, agent } => cmd_run(config, prompt, id, agent).await,
        Commands::Config => {
            let rendered = toml::to_string_pretty(&config)
                .map_err(|e| mission_control::ControlError::Config(e.to_string()))?;
            print!("{}", rendered);
            Ok(())
        }
    }
}

async fn cmd_run(
    config: ControlConfig,
    prompt: String,
    id: Option<String>,
    agent: AgentType,
) -> Result<()> {
    let mission_id = id.unwrap_or_else(|| format!("m-{}", uuid::Uuid::new_v4()));

    let bus = EventBus::new(&config.events);
    let broadcaster = bus.spawn_broadcaster();
    bus.subscribe(Arc::new(LogSink::new()));

    let store = Arc::new(MemoryStore::new());
    let executor = Arc::new(SimulatedExecutor::default());
    let engine = MissionEngine::new(config.engine, store, bus.clone(), executor);

    let status = engine.submit_and_run(&mission_id, &prompt, agent).await?;

    bus.close();
    let _ = broadcaster.await;

    let mission = engine.status(&mission_id).await?;
    println!("{}", serde_json::to_string_pretty(&mission)?);
    println!("mission {} finished: {}", mission_id, status);
    Ok(())
}

/// Placeholder stage work for the CLI; real deployments plug their own
/// `ExecutionStage` into the engine.
struct SimulatedExecutor {
    stage_delay: Duration,
}

impl Default for SimulatedExecutor {
    fn default() -> Self {
        Self {
            stage_delay: Duration::from_millis(50),
        }
    }
}

#[async_trait]
impl ExecutionStage for SimulatedExecutor {
    async fn execute(&self, ctx: &StageContext) -> Result<StageOutcome> {
        tokio::time::sleep(self.stage_delay).await;
        Ok(StageOutcome::ok(format!("stage '{}' complete", ctx.stage)))
    }
}
