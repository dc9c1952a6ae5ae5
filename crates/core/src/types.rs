//! Typed market-data and audit records shared across the workspace.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One daily OHLCV bar of the underlying instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

/// Call or put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionType {
    Call,
    Put,
}

impl std::fmt::Display for OptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Call => write!(f, "call"),
            Self::Put => write!(f, "put"),
        }
    }
}

/// A listed option contract with its per-day close prices.
///
/// Immutable once constructed. The listing window is derived from the price
/// map rather than stored separately: `list_date` is the first priced day,
/// `delist_date` the last priced day capped at expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionContract {
    pub id: String,
    pub strike: Decimal,
    pub option_type: OptionType,
    pub expiry: NaiveDate,
    pub prices: BTreeMap<NaiveDate, Decimal>,
}

impl OptionContract {
    /// First day the contract traded, `None` for an unpriced contract.
    #[must_use]
    pub fn list_date(&self) -> Option<NaiveDate> {
        self.prices.keys().next().copied()
    }

    /// Last day the contract is considered listed.
    #[must_use]
    pub fn delist_date(&self) -> Option<NaiveDate> {
        self.prices.keys().next_back().map(|d| (*d).min(self.expiry))
    }

    /// True when `date` falls inside the listing window.
    #[must_use]
    pub fn is_listed_on(&self, date: NaiveDate) -> bool {
        match (self.list_date(), self.delist_date()) {
            (Some(list), Some(delist)) => list <= date && date <= delist,
            _ => false,
        }
    }

    /// Close price on `date`, if the contract traded that day.
    #[must_use]
    pub fn price_on(&self, date: NaiveDate) -> Option<Decimal> {
        self.prices.get(&date).copied()
    }

    /// True if the contract expires in a calendar month strictly after
    /// `date`'s month.
    #[must_use]
    pub fn expires_after_month_of(&self, date: NaiveDate) -> bool {
        (self.expiry.year(), self.expiry.month()) > (date.year(), date.month())
    }

    /// Calendar days from `date` to expiry (negative once past expiry).
    #[must_use]
    pub fn days_to_expiry(&self, date: NaiveDate) -> i64 {
        (self.expiry - date).num_days()
    }
}

/// Side of a trade-log entry: `Sell` opens the short leg, `Close` buys it
/// back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeAction {
    Sell,
    Close,
}

impl std::fmt::Display for TradeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sell => write!(f, "sell"),
            Self::Close => write!(f, "close"),
        }
    }
}

/// Immutable audit record appended by the position ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeLogEntry {
    pub date: NaiveDate,
    pub action: TradeAction,
    pub contract_id: String,
    pub price: Decimal,
    /// Margin change seen by the account: negative when posted, positive
    /// when released.
    pub margin_delta: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn contract_priced_on(days: &[NaiveDate], expiry: NaiveDate) -> OptionContract {
        OptionContract {
            id: "OPT1.SH".to_string(),
            strike: dec!(5.5),
            option_type: OptionType::Call,
            expiry,
            prices: days.iter().map(|d| (*d, dec!(0.12))).collect(),
        }
    }

    #[test]
    fn listing_window_derived_from_prices() {
        let c = contract_priced_on(
            &[date(2024, 1, 2), date(2024, 1, 3), date(2024, 1, 4)],
            date(2024, 2, 28),
        );
        assert_eq!(c.list_date(), Some(date(2024, 1, 2)));
        assert_eq!(c.delist_date(), Some(date(2024, 1, 4)));
        assert!(c.is_listed_on(date(2024, 1, 3)));
        assert!(!c.is_listed_on(date(2024, 1, 5)));
    }

    #[test]
    fn delist_date_capped_at_expiry() {
        // Stale rows after expiry must not extend the listing window
        let c = contract_priced_on(
            &[date(2024, 1, 2), date(2024, 3, 1)],
            date(2024, 2, 28),
        );
        assert_eq!(c.delist_date(), Some(date(2024, 2, 28)));
    }

    #[test]
    fn expiry_month_filter_handles_year_rollover() {
        let c = contract_priced_on(&[date(2024, 12, 2)], date(2025, 1, 22));
        assert!(c.expires_after_month_of(date(2024, 12, 2)));

        let same_month = contract_priced_on(&[date(2024, 12, 2)], date(2024, 12, 25));
        assert!(!same_month.expires_after_month_of(date(2024, 12, 2)));
    }

    #[test]
    fn trade_action_display_matches_log_vocabulary() {
        assert_eq!(TradeAction::Sell.to_string(), "sell");
        assert_eq!(TradeAction::Close.to_string(), "close");
    }
}
