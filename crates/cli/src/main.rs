mod config_commands;
mod reply_commands;

use std::{path::PathBuf, sync::Arc};

use {
    clap::{Parser, Subcommand},
    pacer_auto_reply::{PacingOrchestrator, generator_from_config},
    pacer_channels::AgentConnection,
    pacer_config::PacerConfig,
    tokio::sync::mpsc,
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "pacer", about = "Pacer: human-paced chat replies", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file to use instead of the standard locations.
    #[arg(long, global = true, env = "PACER_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to the chat agent and answer messages (default).
    Run,
    /// Print the readability score and delays for a piece of text.
    Score { text: String },
    /// Run one reply cycle for TEXT and print the side effects.
    Reply {
        text: String,
        /// Skip the thinking and typing pauses.
        #[arg(long)]
        no_delay: bool,
    },
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Resolve config: explicit `--config` file, else discovery, then env overrides.
fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<PacerConfig> {
    let config = match path {
        Some(path) => pacer_config::load_config(path)?,
        None => pacer_config::discover_and_load(),
    };
    Ok(pacer_config::apply_env_overrides(config))
}

async fn run(config: PacerConfig) -> anyhow::Result<()> {
    let generator = generator_from_config(&config.generation, config.pacing)?;

    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let (connection, task) =
        AgentConnection::spawn(config.agent.url(), config.agent.max_backoff(), inbound_tx);

    let orchestrator = PacingOrchestrator::new(generator, Arc::new(connection));
    info!(
        url = %config.agent.url(),
        backend = %config.generation.backend,
        words_per_minute = config.pacing.words_per_minute,
        "serving agent"
    );

    tokio::select! {
        () = orchestrator.serve(inbound_rx) => {},
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted, shutting down");
        },
    }
    task.abort();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    match cli.command {
        None | Some(Commands::Run) => {
            info!(version = env!("CARGO_PKG_VERSION"), "pacer starting");
            run(load_config(cli.config.as_deref())?).await
        },
        Some(Commands::Score { text }) => {
            let config = load_config(cli.config.as_deref())?;
            print!("{}", reply_commands::score_report(&text, config.pacing));
            Ok(())
        },
        Some(Commands::Reply { text, no_delay }) => {
            let config = load_config(cli.config.as_deref())?;
            reply_commands::reply_once(&config, &text, no_delay).await
        },
        Some(Commands::Config { action }) => {
            config_commands::handle_config(action, cli.config.as_deref())
        },
    }
}
