use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use mfest::core::log::init_logging;

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

impl From<Commands> for mfest::AppCommand {
    fn from(cmd: Commands) -> mfest::AppCommand {
        match cmd {
            Commands::Add { code, amount } => mfest::AppCommand::Add { code, amount },
            Commands::Remove { code } => mfest::AppCommand::Remove { code },
            Commands::Show { holdings } => mfest::AppCommand::Show { holdings },
            Commands::Watch { holdings } => mfest::AppCommand::Watch { holdings },
            Commands::Serve => mfest::AppCommand::Serve,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Track a fund with the amount currently held in it
    Add {
        /// Six digit fund code
        code: String,
        /// Amount held, in yuan
        amount: f64,
    },
    /// Stop tracking a fund
    Remove { code: String },
    /// Refresh every tracked fund once and show the estimates
    Show {
        /// Also list each fund's disclosed holdings
        #[arg(long)]
        holdings: bool,
    },
    /// Keep refreshing estimates until interrupted
    Watch {
        /// Also list each fund's disclosed holdings
        #[arg(long)]
        holdings: bool,
    },
    /// Serve holdings and quote lookups over HTTP
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => mfest::cli::setup::setup(),
        Some(cmd) => mfest::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
