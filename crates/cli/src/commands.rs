//! The `backtest` subcommand.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use rust_decimal::Decimal;
use tracing::info;

use optroll_backtest::{buy_and_hold, load_options_csv, load_underlying_csv, OptionUniverse, RollEngine};
use optroll_core::{ConfigLoader, RetryPolicy};

/// Arguments for the backtest command.
#[derive(Args, Debug, Clone)]
pub struct BacktestArgs {
    /// Underlying OHLCV CSV (trade_date,open,high,low,close,vol)
    #[arg(long)]
    pub underlying: PathBuf,

    /// Option chain CSV (ts_code,trade_date,close,exercise_price,call_put,expire_date)
    #[arg(long)]
    pub options: PathBuf,

    /// TOML config file; OPTROLL_* environment variables override it
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override: starting cash
    #[arg(long)]
    pub initial_capital: Option<Decimal>,

    /// Override: margin posted as a fraction of short-leg notional
    #[arg(long)]
    pub margin_rate: Option<Decimal>,

    /// Override: roll when this many days or fewer remain to expiry
    #[arg(long)]
    pub days_before_expiry: Option<i64>,

    /// Override: commission per leg as a fraction of leg notional
    #[arg(long)]
    pub commission_rate: Option<Decimal>,

    /// Override: wait for next month instead of retrying a failed open daily
    #[arg(long)]
    pub wait_next_month: bool,

    /// Write the trade log as JSON to this path
    #[arg(long)]
    pub export_trades: Option<PathBuf>,
}

pub fn run_backtest(args: BacktestArgs) -> Result<()> {
    let mut config = ConfigLoader::load(args.config.as_deref())?;
    if let Some(capital) = args.initial_capital {
        config.initial_capital = capital;
    }
    if let Some(rate) = args.margin_rate {
        config.margin_rate = rate;
    }
    if let Some(days) = args.days_before_expiry {
        config.days_before_expiry = days;
    }
    if let Some(rate) = args.commission_rate {
        config.commission_rate = rate;
    }
    if args.wait_next_month {
        config.retry_policy = RetryPolicy::NextMonth;
    }
    config.validate()?;

    let series = load_underlying_csv(&args.underlying)
        .with_context(|| format!("loading {}", args.underlying.display()))?;
    let contracts = load_options_csv(&args.options)
        .with_context(|| format!("loading {}", args.options.display()))?;
    info!(
        bars = series.len(),
        contracts = contracts.len(),
        "Loaded market data"
    );

    let universe = OptionUniverse::new(contracts)?;
    let report = RollEngine::new(&universe, &config).run(&series)?;
    let benchmark = buy_and_hold(&series, config.initial_capital);

    println!("{}", crate::format::format_report(&report, &benchmark));

    if let Some(path) = args.export_trades {
        let json = serde_json::to_string_pretty(&report.trade_log)?;
        std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
        info!(
            path = %path.display(),
            entries = report.trade_log.len(),
            "Exported trade log"
        );
    }

    Ok(())
}
