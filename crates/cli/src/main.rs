mod config_commands;
mod targets_commands;

use {
    clap::{Parser, Subcommand},
    tracing::debug,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "crosslink", about = "Crosslink: cross-platform chat relay", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Custom config directory (overrides default ~/.config/crosslink/).
    #[arg(long, global = true, env = "CROSSLINK_CONFIG_DIR")]
    config_dir: Option<std::path::PathBuf>,
    /// Custom data directory (overrides default data dir).
    #[arg(long, global = true, env = "CROSSLINK_DATA_DIR")]
    data_dir: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
    /// Manage stored forward targets (database mode).
    Targets {
        #[command(subcommand)]
        action: targets_commands::TargetsAction,
    },
    /// Print the destinations a channel forwards to in the configured mode.
    Resolve {
        /// Source channel address, `platform:channel_id`.
        address: String,
        /// Platform name containing `:` (repeatable), e.g. `qq:guild`.
        #[arg(long = "platform")]
        platforms: Vec<String>,
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
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    debug!(version = env!("CARGO_PKG_VERSION"), "crosslink starting");

    if let Some(ref dir) = cli.config_dir {
        crosslink_config::set_config_dir(dir.clone());
    }
    if let Some(ref dir) = cli.data_dir {
        crosslink_config::set_data_dir(dir.clone());
    }

    match cli.command {
        Commands::Config { action } => config_commands::handle_config(action),
        Commands::Targets { action } => targets_commands::handle_targets(action).await,
        Commands::Resolve { address, platforms } => {
            targets_commands::resolve(&address, platforms).await
        },
    }
}
