use clap::{Parser, Subcommand};
use colored::*;

use vigil_console::{commands, dashboard, logging};
use vigil_core::ConsoleConfig;

#[derive(Parser)]
#[command(name = "vigil")]
#[command(about = "Vigil - terminal operations console for the admin portal")]
#[command(version = "0.1.0")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the live dashboards (metrics, logs, crash recovery)
    Dash {
        /// Portal API base URL (overrides config file and environment)
        #[arg(long = "api-url")]
        api_url: Option<String>,

        /// Refresh interval in seconds, applied to all dashboards
        #[arg(short = 'i', long = "interval")]
        interval: Option<u64>,

        /// Disable timers entirely; dashboards refresh only on demand
        #[arg(long = "manual", conflicts_with = "interval")]
        manual: bool,
    },

    /// One-shot portal health summary
    Status {
        /// Portal API base URL (overrides config file and environment)
        #[arg(long = "api-url")]
        api_url: Option<String>,

        /// Emit the combined payloads as JSON instead of a summary
        #[arg(long = "json")]
        json: bool,
    },

    /// Inspect or initialize the console configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration and where it came from
    Show,
    /// Write a default config file
    Init {
        /// Overwrite an existing config file
        #[arg(short = 'f', long = "force")]
        force: bool,
    },
}

fn load_config(api_url: Option<String>, interval: Option<u64>) -> anyhow::Result<ConsoleConfig> {
    let mut config = ConsoleConfig::load()?;
    if let Some(url) = api_url {
        config.api_url = url;
    }
    if let Some(secs) = interval {
        config.refresh.metrics_secs = secs;
        config.refresh.logs_secs = secs;
        config.refresh.recovery_secs = secs;
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Dash {
            api_url,
            interval,
            manual,
        } => {
            let interval = if manual { Some(0) } else { interval };
            load_config(api_url, interval).and_then(|config| {
                logging::init(&config.log_filter, true);
                // The draw/input loop blocks; keep the refresh tasks running
                tokio::task::block_in_place(|| dashboard::run(config))
            })
        }
        Commands::Status { api_url, json } => match load_config(api_url, None) {
            Ok(config) => {
                logging::init(&config.log_filter, false);
                commands::status::run(&config, json).await
            }
            Err(e) => Err(e),
        },
        Commands::Config { command } => match command {
            ConfigCommands::Show => commands::config::show(),
            ConfigCommands::Init { force } => commands::config::init(force),
        },
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
