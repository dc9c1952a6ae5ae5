pub mod config;
pub mod error;
pub mod series;
pub mod types;

pub use config::{BacktestConfig, ConfigLoader, RetryPolicy};
pub use error::{BacktestError, ConfigError, DataError, LedgerError};
pub use series::UnderlyingSeries;
pub use types::{DailyBar, OptionContract, OptionType, TradeAction, TradeLogEntry};
