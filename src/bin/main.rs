use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use finance_dashboard::config::Config;
use finance_dashboard::server::{self, AppState};

#[derive(Parser, Debug)]
struct Args {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Serve the dashboard API
    Serve {
        #[arg(long, env = "LISTEN_ADDRESS", default_value = "127.0.0.1:8080")]
        address: String,
    },
    /// Print the normalized portfolio once
    Portfolio,
    /// Fetch the instrument metadata and print its size
    Instruments,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            format!(
                "{}=debug,tower_http=debug,reqwest=debug",
                env!("CARGO_CRATE_NAME")
            )
            .into()
        }))
        .with(fmt::layer())
        .init();

    let args = Args::parse();

    let res = match args.command {
        Some(Commands::Serve { address }) => run_serve(args.config, address).await,
        Some(Commands::Portfolio) => run_portfolio(args.config).await,
        Some(Commands::Instruments) => run_instruments(args.config).await,
        None => run_serve(args.config, String::from("127.0.0.1:8080")).await,
    };

    if let Err(err) = res {
        error!("{:#}", err);
        std::process::exit(1);
    }
}

async fn run_serve(config: Config, address: String) -> Result<()> {
    let state = Arc::new(AppState::new(config)?);

    info!("{}", "STARTING DASHBOARD".green());
    server::start(address, state).await
}

async fn run_portfolio(config: Config) -> Result<()> {
    let state = AppState::new(config)?;
    let auth = state.config.brokerage_credential()?;

    let positions = state.portfolio.list_normalized_portfolio(auth).await?;
    for position in positions.iter() {
        println!("{}", position);
    }
    println!("{} positions", positions.len().to_string().yellow());

    Ok(())
}

async fn run_instruments(config: Config) -> Result<()> {
    let state = AppState::new(config)?;
    let auth = state.config.brokerage_credential()?;

    let instruments = state.portfolio.get_instruments(auth).await?;
    println!("{} instrument keys", instruments.len().to_string().yellow());

    Ok(())
}
