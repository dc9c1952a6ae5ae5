//! CSV ingestion for underlying bars and option chains.
//!
//! Column layouts follow the tushare exports the strategy was built
//! against: `trade_date,open,high,low,close,vol` for the underlying and
//! `ts_code,trade_date,close,exercise_price,call_put,expire_date` for the
//! option chain, one row per contract per trading day.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;

use optroll_core::{DailyBar, DataError, OptionContract, OptionType, UnderlyingSeries};

/// Accepts tushare-style `%Y%m%d` as well as ISO `%Y-%m-%d`.
fn parse_trade_date(value: &str) -> Result<NaiveDate, DataError> {
    NaiveDate::parse_from_str(value, "%Y%m%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d"))
        .map_err(|_| DataError::BadDate {
            value: value.to_string(),
        })
}

/// Loads and validates the underlying OHLCV series.
///
/// # Errors
///
/// Fails on unreadable files, malformed rows, or a series that violates the
/// strictly-increasing-dates invariant.
pub fn load_underlying_csv(path: impl AsRef<Path>) -> Result<UnderlyingSeries> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening underlying csv {}", path.display()))?;

    let mut bars = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let row = i + 2; // 1-based, after the header
        let record = result.with_context(|| format!("underlying csv row {row}"))?;
        if record.len() < 6 {
            bail!("underlying csv row {row}: expected 6 columns, got {}", record.len());
        }
        let bar = DailyBar {
            date: parse_trade_date(&record[0]).with_context(|| format!("underlying csv row {row}"))?,
            open: parse_decimal(&record[1], row, "open")?,
            high: parse_decimal(&record[2], row, "high")?,
            low: parse_decimal(&record[3], row, "low")?,
            close: parse_decimal(&record[4], row, "close")?,
            volume: parse_decimal(&record[5], row, "vol")?,
        };
        bars.push(bar);
    }

    Ok(UnderlyingSeries::new(bars)?)
}

/// Loads the option chain, grouping per-day prices under their contract id.
/// Contracts come back sorted by id.
///
/// # Errors
///
/// Fails on malformed rows, unknown option types, or rows that contradict an
/// earlier row's strike/type/expiry for the same contract.
pub fn load_options_csv(path: impl AsRef<Path>) -> Result<Vec<OptionContract>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening options csv {}", path.display()))?;

    let mut contracts: BTreeMap<String, OptionContract> = BTreeMap::new();
    for (i, result) in reader.records().enumerate() {
        let row = i + 2;
        let record = result.with_context(|| format!("options csv row {row}"))?;
        if record.len() < 6 {
            bail!("options csv row {row}: expected 6 columns, got {}", record.len());
        }
        let id = record[0].to_string();
        let date = parse_trade_date(&record[1]).with_context(|| format!("options csv row {row}"))?;
        let close = parse_decimal(&record[2], row, "close")?;
        let strike = parse_decimal(&record[3], row, "exercise_price")?;
        let option_type = match &record[4] {
            "C" | "c" => OptionType::Call,
            "P" | "p" => OptionType::Put,
            other => bail!("options csv row {row}: unknown call_put {other:?}"),
        };
        let expiry =
            parse_trade_date(&record[5]).with_context(|| format!("options csv row {row}"))?;

        let contract = contracts.entry(id.clone()).or_insert_with(|| OptionContract {
            id: id.clone(),
            strike,
            option_type,
            expiry,
            prices: BTreeMap::new(),
        });
        if contract.strike != strike
            || contract.option_type != option_type
            || contract.expiry != expiry
        {
            bail!("options csv row {row}: contract {id} contradicts an earlier row");
        }
        contract.prices.insert(date, close);
    }

    Ok(contracts.into_values().collect())
}

fn parse_decimal(value: &str, row: usize, column: &str) -> Result<Decimal> {
    value
        .trim()
        .parse::<Decimal>()
        .with_context(|| format!("csv row {row}: bad {column} value {value:?}"))
}
