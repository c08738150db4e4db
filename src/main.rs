use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use xofcompare::cli::input::parse_amount;
use xofcompare::core::log::init_logging;
use xofcompare::core::{CountryFilter, Currency};

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

#[derive(Args)]
struct CompareArgs {
    /// Amount to send
    #[arg(value_parser = parse_amount)]
    amount: f64,

    /// Currency of the amount: EUR, USD or XOF
    #[arg(short = 'C', long)]
    currency: Option<Currency>,

    /// Only show providers serving this country: all, sn or ci
    #[arg(long)]
    country: Option<CountryFilter>,
}

impl From<CompareArgs> for xofcompare::CompareOptions {
    fn from(args: CompareArgs) -> Self {
        xofcompare::CompareOptions {
            amount: args.amount,
            currency: args.currency,
            country: args.country,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Rank providers by total charge for an amount
    Compare {
        #[command(flatten)]
        args: CompareArgs,

        /// Print the ranking as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show today's advertised rates
    Rates {
        /// EUR or USD
        #[arg(short = 'C', long)]
        currency: Option<Currency>,
    },
    /// List known providers
    Providers {
        /// Only show providers serving this country: all, sn or ci
        #[arg(long)]
        country: Option<CountryFilter>,
    },
    /// Keep the comparison on screen and refresh it when rates change
    Watch {
        #[command(flatten)]
        args: CompareArgs,
    },
}

impl From<Commands> for xofcompare::AppCommand {
    fn from(cmd: Commands) -> xofcompare::AppCommand {
        match cmd {
            Commands::Compare { args, json } => xofcompare::AppCommand::Compare {
                options: args.into(),
                json,
            },
            Commands::Rates { currency } => xofcompare::AppCommand::Rates { currency },
            Commands::Providers { country } => xofcompare::AppCommand::Providers { country },
            Commands::Watch { args } => xofcompare::AppCommand::Watch {
                options: args.into(),
            },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => xofcompare::cli::setup::setup(),
        Some(cmd) => xofcompare::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
