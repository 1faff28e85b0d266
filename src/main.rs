use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use treasury::cli::holdings::AssetView;
use treasury::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for treasury::AppCommand {
    fn from(cmd: Commands) -> treasury::AppCommand {
        match cmd {
            Commands::Holdings {
                asset,
                currency,
                json,
            } => treasury::AppCommand::Holdings {
                view: asset,
                currency,
                json,
            },
            Commands::Rates => treasury::AppCommand::Rates,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display public company treasury holdings
    Holdings {
        /// Asset to show
        #[arg(short, long, value_enum, default_value = "btc")]
        asset: AssetView,

        /// Display currency, overrides the configured one
        #[arg(long)]
        currency: Option<String>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Display USD exchange rates
    Rates,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => treasury::cli::setup::setup(),
        Some(cmd) => treasury::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
