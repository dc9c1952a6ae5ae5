//! Backtest results: trade log, NAV series, and summary statistics.

use chrono::{Datelike, NaiveDate};
use optroll_core::TradeLogEntry;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One point of the daily net-asset-value series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavPoint {
    pub date: NaiveDate,
    pub value: Decimal,
}

/// A position still open when the run ended. Reported separately and never
/// mixed into realized totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenExposure {
    pub contract_id: String,
    pub entry_date: NaiveDate,
    pub entry_price: Decimal,
    pub margin: Decimal,
    pub last_mark: Decimal,
    pub unrealized_pnl: Decimal,
}

/// Return over one calendar month, measured NAV-to-NAV at month ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyReturn {
    pub year: i32,
    pub month: u32,
    pub value: Decimal,
}

/// Everything a caller needs from one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    pub initial_capital: Decimal,
    /// Final account value (free capital + posted margin + unrealized P&L).
    pub final_value: Decimal,
    /// (final_value − initial_capital) / initial_capital.
    pub total_return: Decimal,
    /// Sum of realized P&L over completed round trips.
    pub realized_pnl: Decimal,
    /// Completed open/close round trips.
    pub round_trips: usize,
    /// Trade-log entries (each round trip contributes two).
    pub trade_count: usize,
    /// Mean days held per completed round trip; 0 with no round trips.
    pub avg_holding_days: f64,
    pub monthly_returns: Vec<MonthlyReturn>,
    pub nav: Vec<NavPoint>,
    pub trade_log: Vec<TradeLogEntry>,
    pub open_exposure: Option<OpenExposure>,
}

impl BacktestReport {
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn assemble(
        initial_capital: Decimal,
        trade_log: Vec<TradeLogEntry>,
        nav: Vec<NavPoint>,
        realized_pnl: Decimal,
        round_trips: usize,
        holding_days_total: i64,
        open_exposure: Option<OpenExposure>,
    ) -> Self {
        let final_value = nav.last().map_or(initial_capital, |p| p.value);
        let total_return = if initial_capital.is_zero() {
            Decimal::ZERO
        } else {
            (final_value - initial_capital) / initial_capital
        };
        let avg_holding_days = if round_trips == 0 {
            0.0
        } else {
            holding_days_total as f64 / round_trips as f64
        };
        Self {
            initial_capital,
            final_value,
            total_return,
            realized_pnl,
            round_trips,
            trade_count: trade_log.len(),
            avg_holding_days,
            monthly_returns: monthly_returns(&nav, initial_capital),
            nav,
            trade_log,
            open_exposure,
        }
    }
}

/// Groups the NAV series by calendar month; each month's return compares its
/// last NAV against the previous month's last NAV (initial capital for the
/// first month).
fn monthly_returns(nav: &[NavPoint], initial_capital: Decimal) -> Vec<MonthlyReturn> {
    let mut out = Vec::new();
    let mut base = initial_capital;
    let mut current: Option<((i32, u32), Decimal)> = None;

    for point in nav {
        let key = (point.date.year(), point.date.month());
        match current {
            Some((month, _)) if month == key => current = Some((month, point.value)),
            Some((month, value)) => {
                out.push(MonthlyReturn {
                    year: month.0,
                    month: month.1,
                    value: ratio(value, base),
                });
                base = value;
                current = Some((key, point.value));
            }
            None => current = Some((key, point.value)),
        }
    }
    if let Some((month, value)) = current {
        out.push(MonthlyReturn {
            year: month.0,
            month: month.1,
            value: ratio(value, base),
        });
    }
    out
}

fn ratio(value: Decimal, base: Decimal) -> Decimal {
    if base.is_zero() {
        Decimal::ZERO
    } else {
        (value - base) / base
    }
}
