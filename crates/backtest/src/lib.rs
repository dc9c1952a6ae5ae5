//! Monthly option-roll backtest engine.
//!
//! The engine walks an underlying price series one trading day at a time.
//! On the first trading day of each month it sells the at-the-money call
//! picked from that day's option universe; a configurable number of days
//! before expiry it buys the position back and reopens against the same
//! day's snapshot (the roll). All decisions are deterministic: same inputs,
//! same trade log, bit for bit.

pub mod benchmark;
pub mod engine;
pub mod ledger;
pub mod loader;
pub mod report;
pub mod selector;
pub mod universe;

pub use benchmark::{buy_and_hold, BuyHoldResult};
pub use engine::RollEngine;
pub use ledger::{ClosedTrade, OpenPosition, PositionLedger};
pub use loader::{load_options_csv, load_underlying_csv};
pub use report::{BacktestReport, MonthlyReturn, NavPoint, OpenExposure};
pub use selector::{select_atm, AtmSelection};
pub use universe::OptionUniverse;
