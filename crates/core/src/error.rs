//! Error taxonomy: fatal data/state errors versus recoverable trading
//! conditions.
//!
//! Only the fatal kinds surface as `Err` from a run. Insufficient capital
//! and an empty selection are day-by-day policy conditions handled inside
//! the state machine and visible in the logs, never thrown upward.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// Data-integrity violation. Fatal: the run aborts and no partial results
/// are trusted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("underlying series is empty")]
    EmptySeries,

    #[error("duplicate trading day {date}")]
    DuplicateDate { date: NaiveDate },

    #[error("non-monotonic trading days: {prev} followed by {next}")]
    NonMonotonicDates { prev: NaiveDate, next: NaiveDate },

    #[error("contract {contract_id} has an empty price series")]
    UnpricedContract { contract_id: String },

    #[error("contract {contract_id} missing from the universe")]
    UnknownContract { contract_id: String },

    #[error("contract {contract_id} has no price on {date}")]
    MissingPrice { contract_id: String, date: NaiveDate },

    #[error("unrecognized date {value:?} (expected %Y%m%d or %Y-%m-%d)")]
    BadDate { value: String },
}

/// Position-ledger transition failure.
///
/// `PositionAlreadyOpen` and `NoOpenPosition` indicate a state-machine bug
/// and are fatal. `InsufficientCapital` is absorbed by the engine's skip
/// policy and never escapes a run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("open requested while a position is already held")]
    PositionAlreadyOpen,

    #[error("close requested with no open position")]
    NoOpenPosition,

    #[error("required margin {required} exceeds available capital {available}")]
    InsufficientCapital {
        required: Decimal,
        available: Decimal,
    },
}

/// Configuration bounds violation, detected before a run starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("initial_capital must be positive, got {0}")]
    NonPositiveCapital(Decimal),

    #[error("margin_rate must be in (0, 1], got {0}")]
    MarginRateOutOfRange(Decimal),

    #[error("days_before_expiry must be non-negative, got {0}")]
    NegativeDaysBeforeExpiry(i64),

    #[error("contract_multiplier must be positive")]
    ZeroMultiplier,

    #[error("commission_rate must be non-negative, got {0}")]
    NegativeCommission(Decimal),
}

/// Top-level backtest failure returned by the engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BacktestError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error("invalid ledger state: {0}")]
    InvalidState(LedgerError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
