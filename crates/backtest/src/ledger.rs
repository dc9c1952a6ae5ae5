//! Single-position ledger: margin, capital, and the append-only trade log.

use chrono::NaiveDate;
use optroll_core::{BacktestConfig, LedgerError, OptionContract, TradeAction, TradeLogEntry};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The one short position the strategy may hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenPosition {
    pub contract_id: String,
    pub entry_date: NaiveDate,
    pub entry_price: Decimal,
    pub margin: Decimal,
    pub expiry: NaiveDate,
}

/// Result of a close transition.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub contract_id: String,
    pub realized_pnl: Decimal,
    pub holding_days: i64,
}

/// Owns the capital scalar, the optional open position, and the trade log.
///
/// Capital is mutated nowhere outside `open` and `close`; the state machine
/// only requests transitions.
#[derive(Debug, Clone)]
pub struct PositionLedger {
    capital: Decimal,
    position: Option<OpenPosition>,
    trade_log: Vec<TradeLogEntry>,
}

impl PositionLedger {
    #[must_use]
    pub fn new(initial_capital: Decimal) -> Self {
        Self {
            capital: initial_capital,
            position: None,
            trade_log: Vec::new(),
        }
    }

    /// Opens a short position: posts margin, pays the open-leg commission,
    /// appends the "sell" entry.
    ///
    /// # Errors
    ///
    /// `PositionAlreadyOpen` if a position is held (single-position
    /// invariant); `InsufficientCapital` if margin plus commission exceeds
    /// capital, which keeps capital from ever going negative on open.
    pub fn open(
        &mut self,
        date: NaiveDate,
        contract: &OptionContract,
        price: Decimal,
        config: &BacktestConfig,
    ) -> Result<(), LedgerError> {
        if self.position.is_some() {
            return Err(LedgerError::PositionAlreadyOpen);
        }
        let notional = price * config.multiplier();
        let margin = notional * config.margin_rate;
        let commission = notional * config.commission_rate;
        let required = margin + commission;
        if required > self.capital {
            return Err(LedgerError::InsufficientCapital {
                required,
                available: self.capital,
            });
        }
        self.capital -= required;
        self.position = Some(OpenPosition {
            contract_id: contract.id.clone(),
            entry_date: date,
            entry_price: price,
            margin,
            expiry: contract.expiry,
        });
        self.trade_log.push(TradeLogEntry {
            date,
            action: TradeAction::Sell,
            contract_id: contract.id.clone(),
            price,
            margin_delta: -margin,
        });
        Ok(())
    }

    /// Closes the open short at `closing_price`: realizes
    /// `(entry − close) × multiplier` minus the close-leg commission,
    /// releases margin back to capital, appends the "close" entry.
    ///
    /// # Errors
    ///
    /// `NoOpenPosition` if the ledger is idle.
    pub fn close(
        &mut self,
        date: NaiveDate,
        closing_price: Decimal,
        config: &BacktestConfig,
    ) -> Result<ClosedTrade, LedgerError> {
        let position = self.position.take().ok_or(LedgerError::NoOpenPosition)?;
        let commission = closing_price * config.multiplier() * config.commission_rate;
        let realized_pnl =
            (position.entry_price - closing_price) * config.multiplier() - commission;
        self.capital += position.margin + realized_pnl;
        self.trade_log.push(TradeLogEntry {
            date,
            action: TradeAction::Close,
            contract_id: position.contract_id.clone(),
            price: closing_price,
            margin_delta: position.margin,
        });
        Ok(ClosedTrade {
            contract_id: position.contract_id,
            realized_pnl,
            holding_days: (date - position.entry_date).num_days(),
        })
    }

    /// Mark-to-market of the open short at `mark`; zero when idle. Same
    /// price convention as `close`, without the commission.
    #[must_use]
    pub fn unrealized_pnl(&self, mark: Decimal, config: &BacktestConfig) -> Decimal {
        match &self.position {
            Some(position) => (position.entry_price - mark) * config.multiplier(),
            None => Decimal::ZERO,
        }
    }

    /// Account value for the daily NAV point: free capital plus posted
    /// margin plus unrealized P&L. Posted margin stays an asset of the
    /// account even though `open` moved it out of `capital`.
    #[must_use]
    pub fn equity(&self, mark: Decimal, config: &BacktestConfig) -> Decimal {
        let margin = self
            .position
            .as_ref()
            .map_or(Decimal::ZERO, |p| p.margin);
        self.capital + margin + self.unrealized_pnl(mark, config)
    }

    #[must_use]
    pub fn capital(&self) -> Decimal {
        self.capital
    }

    #[must_use]
    pub fn position(&self) -> Option<&OpenPosition> {
        self.position.as_ref()
    }

    #[must_use]
    pub fn is_holding(&self) -> bool {
        self.position.is_some()
    }

    #[must_use]
    pub fn trade_log(&self) -> &[TradeLogEntry] {
        &self.trade_log
    }

    /// Consumes the ledger, yielding the full trade log.
    #[must_use]
    pub fn into_trade_log(self) -> Vec<TradeLogEntry> {
        self.trade_log
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use optroll_core::OptionType;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn contract() -> OptionContract {
        OptionContract {
            id: "C100".to_string(),
            strike: dec!(100),
            option_type: OptionType::Call,
            expiry: date(2024, 2, 28),
            prices: BTreeMap::from([(date(2024, 1, 2), dec!(2.0))]),
        }
    }

    fn config_without_commission() -> BacktestConfig {
        BacktestConfig {
            commission_rate: Decimal::ZERO,
            ..BacktestConfig::default()
        }
    }

    #[test]
    fn round_trip_realizes_short_premium() {
        let config = config_without_commission();
        let mut ledger = PositionLedger::new(dec!(1000000));

        ledger
            .open(date(2024, 1, 2), &contract(), dec!(2.0), &config)
            .unwrap();
        // margin = 2.0 × 10000 × 0.15
        assert_eq!(ledger.capital(), dec!(997000));

        let closed = ledger.close(date(2024, 2, 21), dec!(1.5), &config).unwrap();
        assert_eq!(closed.realized_pnl, dec!(5000));
        assert_eq!(closed.holding_days, 50);
        assert_eq!(ledger.capital(), dec!(1005000));
        assert!(!ledger.is_holding());
    }

    #[test]
    fn commission_charged_on_both_legs() {
        let config = BacktestConfig {
            commission_rate: dec!(0.0003),
            ..BacktestConfig::default()
        };
        let mut ledger = PositionLedger::new(dec!(1000000));

        ledger
            .open(date(2024, 1, 2), &contract(), dec!(2.0), &config)
            .unwrap();
        // margin 3000 plus open commission 2.0 × 10000 × 0.0003 = 6
        assert_eq!(ledger.capital(), dec!(996994));

        let closed = ledger.close(date(2024, 2, 21), dec!(1.5), &config).unwrap();
        // 5000 gross minus close commission 1.5 × 10000 × 0.0003 = 4.5
        assert_eq!(closed.realized_pnl, dec!(4995.5));
    }

    #[test]
    fn second_open_violates_single_position_invariant() {
        let config = config_without_commission();
        let mut ledger = PositionLedger::new(dec!(1000000));
        ledger
            .open(date(2024, 1, 2), &contract(), dec!(2.0), &config)
            .unwrap();
        let err = ledger
            .open(date(2024, 1, 3), &contract(), dec!(2.1), &config)
            .unwrap_err();
        assert_eq!(err, LedgerError::PositionAlreadyOpen);
    }

    #[test]
    fn close_while_idle_is_an_error() {
        let config = config_without_commission();
        let mut ledger = PositionLedger::new(dec!(1000000));
        let err = ledger.close(date(2024, 1, 2), dec!(1.5), &config).unwrap_err();
        assert_eq!(err, LedgerError::NoOpenPosition);
    }

    #[test]
    fn insufficient_capital_blocks_open_and_leaves_state_untouched() {
        let config = config_without_commission();
        // margin would be 3000
        let mut ledger = PositionLedger::new(dec!(2999));
        let err = ledger
            .open(date(2024, 1, 2), &contract(), dec!(2.0), &config)
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientCapital { .. }));
        assert_eq!(ledger.capital(), dec!(2999));
        assert!(!ledger.is_holding());
        assert!(ledger.trade_log().is_empty());
    }

    #[test]
    fn unrealized_pnl_marks_the_short_without_mutation() {
        let config = config_without_commission();
        let mut ledger = PositionLedger::new(dec!(1000000));
        ledger
            .open(date(2024, 1, 2), &contract(), dec!(2.0), &config)
            .unwrap();

        assert_eq!(ledger.unrealized_pnl(dec!(1.8), &config), dec!(2000));
        assert_eq!(ledger.unrealized_pnl(dec!(2.3), &config), dec!(-3000));
        // capital untouched by the query
        assert_eq!(ledger.capital(), dec!(997000));
    }

    #[test]
    fn equity_counts_posted_margin_as_an_asset() {
        let config = config_without_commission();
        let mut ledger = PositionLedger::new(dec!(1000000));
        ledger
            .open(date(2024, 1, 2), &contract(), dec!(2.0), &config)
            .unwrap();
        // flat mark: equity equals starting capital
        assert_eq!(ledger.equity(dec!(2.0), &config), dec!(1000000));
        assert_eq!(ledger.equity(dec!(1.5), &config), dec!(1005000));
    }

    #[test]
    fn trade_log_records_margin_deltas() {
        let config = config_without_commission();
        let mut ledger = PositionLedger::new(dec!(1000000));
        ledger
            .open(date(2024, 1, 2), &contract(), dec!(2.0), &config)
            .unwrap();
        ledger.close(date(2024, 2, 21), dec!(1.5), &config).unwrap();

        let log = ledger.trade_log();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].action, TradeAction::Sell);
        assert_eq!(log[0].margin_delta, dec!(-3000));
        assert_eq!(log[1].action, TradeAction::Close);
        assert_eq!(log[1].margin_delta, dec!(3000));
    }
}
