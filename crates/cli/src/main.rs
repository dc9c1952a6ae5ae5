use clap::{Parser, Subcommand};

mod commands;
mod format;

#[derive(Parser)]
#[command(name = "optroll")]
#[command(about = "Monthly short-ATM-call roll backtester", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a backtest over underlying and option-chain CSV data
    Backtest(commands::BacktestArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Backtest(args) => commands::run_backtest(args),
    }
}
