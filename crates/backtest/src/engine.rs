//! The daily roll/expiry state machine.
//!
//! Transitions per trading day, in order:
//! 1. Holding and `days_to_expiry <= days_before_expiry`: close at today's
//!    contract close, then immediately try to reopen from today's snapshot.
//! 2. Idle with a pending open (armed on each month's first trading day):
//!    ask the selector for the ATM call and the ledger for an `open`.
//! 3. Otherwise hold; today only contributes a mark-to-market NAV point.
//!
//! Recoverable conditions (no eligible contract, insufficient capital) are
//! absorbed here per the retry policy and surface only as log lines. Data
//! and ledger-state errors abort the run.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use optroll_core::{
    BacktestConfig, BacktestError, DailyBar, DataError, LedgerError, OptionType, RetryPolicy,
    UnderlyingSeries,
};

use crate::ledger::PositionLedger;
use crate::report::{BacktestReport, NavPoint, OpenExposure};
use crate::selector::select_atm;
use crate::universe::OptionUniverse;

/// Drives one strategy run over a price series and option universe.
pub struct RollEngine<'a> {
    config: &'a BacktestConfig,
    universe: &'a OptionUniverse,
    ledger: PositionLedger,
    /// Armed on the first trading day of each month while idle; cleared on a
    /// successful open or, under `RetryPolicy::NextMonth`, after the first
    /// failed attempt.
    pending_open: bool,
    current_month: Option<(i32, u32)>,
    nav: Vec<NavPoint>,
    last_mark: Decimal,
    realized_pnl: Decimal,
    round_trips: usize,
    holding_days_total: i64,
}

impl<'a> RollEngine<'a> {
    #[must_use]
    pub fn new(universe: &'a OptionUniverse, config: &'a BacktestConfig) -> Self {
        Self {
            config,
            universe,
            ledger: PositionLedger::new(config.initial_capital),
            pending_open: false,
            current_month: None,
            nav: Vec::new(),
            last_mark: Decimal::ZERO,
            realized_pnl: Decimal::ZERO,
            round_trips: 0,
            holding_days_total: 0,
        }
    }

    /// Walks the series chronologically and assembles the report.
    ///
    /// # Errors
    ///
    /// Fails on invalid configuration, on any data-integrity violation
    /// (missing contract or price on a required day), or on a ledger-state
    /// error, which would indicate a transition bug.
    pub fn run(mut self, series: &UnderlyingSeries) -> Result<BacktestReport, BacktestError> {
        self.config.validate()?;
        info!(
            initial_capital = %self.config.initial_capital,
            margin_rate = %self.config.margin_rate,
            days_before_expiry = self.config.days_before_expiry,
            contracts = self.universe.len(),
            bars = series.len(),
            "Backtest started"
        );
        for bar in series.bars() {
            self.step(bar)?;
        }
        Ok(self.finish())
    }

    fn step(&mut self, bar: &DailyBar) -> Result<(), BacktestError> {
        let date = bar.date;
        let month = (date.year(), date.month());
        if self.current_month != Some(month) {
            self.current_month = Some(month);
            if !self.ledger.is_holding() {
                self.pending_open = true;
                debug!(date = %date, "Rebalance day — open armed");
            }
        }

        // 1. Roll before expiry
        if let Some(position) = self.ledger.position().cloned() {
            let days_to_expiry = (position.expiry - date).num_days();
            if days_to_expiry <= self.config.days_before_expiry {
                self.roll(date, bar.close, &position.contract_id, days_to_expiry)?;
            }
        }

        // 2. Scheduled or retried open
        if self.pending_open && !self.ledger.is_holding() {
            self.try_open(date, bar.close)?;
        }

        // 3. Daily NAV mark
        let mark = self.mark_price(date)?;
        self.last_mark = mark;
        self.nav.push(NavPoint {
            date,
            value: self.ledger.equity(mark, self.config),
        });
        Ok(())
    }

    /// Atomic same-day roll: close the expiring short at today's settlement,
    /// then reopen against the same day's snapshot. The released margin is
    /// available to the reopen leg.
    fn roll(
        &mut self,
        date: NaiveDate,
        underlying_close: Decimal,
        contract_id: &str,
        days_to_expiry: i64,
    ) -> Result<(), BacktestError> {
        let contract = self
            .universe
            .get(contract_id)
            .ok_or_else(|| DataError::UnknownContract {
                contract_id: contract_id.to_string(),
            })?;
        let settle = contract
            .price_on(date)
            .ok_or_else(|| DataError::MissingPrice {
                contract_id: contract_id.to_string(),
                date,
            })?;

        let closed = self
            .ledger
            .close(date, settle, self.config)
            .map_err(BacktestError::InvalidState)?;
        self.realized_pnl += closed.realized_pnl;
        self.round_trips += 1;
        self.holding_days_total += closed.holding_days;
        info!(
            date = %date,
            contract = closed.contract_id,
            days_to_expiry,
            settle = %settle,
            realized = %closed.realized_pnl,
            "Closed expiring position"
        );

        if !self.try_open(date, underlying_close)? {
            warn!(
                date = %date,
                "No replacement after roll — exposure uncovered"
            );
        }
        Ok(())
    }

    /// Attempts one open. `Ok(false)` covers the two recoverable skips: no
    /// eligible contract and insufficient capital. Either way the pending
    /// flag is re-armed or dropped per the retry policy.
    fn try_open(
        &mut self,
        date: NaiveDate,
        underlying_close: Decimal,
    ) -> Result<bool, BacktestError> {
        let snapshot = self.universe.snapshot(date);
        let Some(selection) = select_atm(&snapshot, underlying_close, date, OptionType::Call, true)
        else {
            debug!(date = %date, candidates = snapshot.len(), "No eligible ATM call");
            self.pending_open = self.config.retry_policy == RetryPolicy::Daily;
            return Ok(false);
        };

        let contract = selection.contract;
        let price = contract
            .price_on(date)
            .ok_or_else(|| DataError::MissingPrice {
                contract_id: contract.id.clone(),
                date,
            })?;

        match self.ledger.open(date, contract, price, self.config) {
            Ok(()) => {
                self.pending_open = false;
                info!(
                    date = %date,
                    contract = contract.id,
                    strike = %contract.strike,
                    distance = %selection.distance,
                    expiry = %contract.expiry,
                    price = %price,
                    "Sold ATM call"
                );
                Ok(true)
            }
            Err(LedgerError::InsufficientCapital {
                required,
                available,
            }) => {
                warn!(
                    date = %date,
                    required = %required,
                    available = %available,
                    "Insufficient capital — open skipped"
                );
                self.pending_open = self.config.retry_policy == RetryPolicy::Daily;
                Ok(false)
            }
            Err(err) => Err(BacktestError::InvalidState(err)),
        }
    }

    /// Today's close of the held contract, or zero when idle (the equity
    /// query ignores the mark in that case).
    fn mark_price(&self, date: NaiveDate) -> Result<Decimal, BacktestError> {
        let Some(position) = self.ledger.position() else {
            return Ok(Decimal::ZERO);
        };
        let contract =
            self.universe
                .get(&position.contract_id)
                .ok_or_else(|| DataError::UnknownContract {
                    contract_id: position.contract_id.clone(),
                })?;
        let mark = contract
            .price_on(date)
            .ok_or_else(|| DataError::MissingPrice {
                contract_id: position.contract_id.clone(),
                date,
            })?;
        Ok(mark)
    }

    fn finish(self) -> BacktestReport {
        let open_exposure = self.ledger.position().map(|position| OpenExposure {
            contract_id: position.contract_id.clone(),
            entry_date: position.entry_date,
            entry_price: position.entry_price,
            margin: position.margin,
            last_mark: self.last_mark,
            unrealized_pnl: self.ledger.unrealized_pnl(self.last_mark, self.config),
        });
        if let Some(exposure) = &open_exposure {
            info!(
                contract = exposure.contract_id,
                unrealized = %exposure.unrealized_pnl,
                "Run ended with an open position — reported as exposure, not realized"
            );
        }
        BacktestReport::assemble(
            self.config.initial_capital,
            self.ledger.into_trade_log(),
            self.nav,
            self.realized_pnl,
            self.round_trips,
            self.holding_days_total,
            open_exposure,
        )
    }
}
