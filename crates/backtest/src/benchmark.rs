//! Buy-and-hold benchmark over the same underlying series.

use optroll_core::UnderlyingSeries;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Result of investing the starting capital in the underlying at the first
/// close and holding to the end of the series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuyHoldResult {
    pub entry_price: Decimal,
    /// Whole units bought; fractional units are left as cash.
    pub units: Decimal,
    pub residual_cash: Decimal,
    pub final_value: Decimal,
    pub total_return: Decimal,
}

/// Buys whole units at the first bar's close and marks them at the last
/// bar's close.
#[must_use]
pub fn buy_and_hold(series: &UnderlyingSeries, capital: Decimal) -> BuyHoldResult {
    let entry_price = series.first().close;
    let units = if entry_price.is_zero() {
        Decimal::ZERO
    } else {
        (capital / entry_price).floor()
    };
    let residual_cash = capital - units * entry_price;
    let final_value = units * series.last().close + residual_cash;
    let total_return = if capital.is_zero() {
        Decimal::ZERO
    } else {
        (final_value - capital) / capital
    };
    BuyHoldResult {
        entry_price,
        units,
        residual_cash,
        final_value,
        total_return,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use optroll_core::DailyBar;
    use rust_decimal_macros::dec;

    fn bar(day: u32, close: Decimal) -> DailyBar {
        DailyBar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: dec!(1000),
        }
    }

    #[test]
    fn buys_whole_units_and_keeps_residual_cash() {
        let series = UnderlyingSeries::new(vec![bar(2, dec!(3)), bar(3, dec!(6))]).unwrap();
        let result = buy_and_hold(&series, dec!(100));
        assert_eq!(result.units, dec!(33));
        assert_eq!(result.residual_cash, dec!(1));
        assert_eq!(result.final_value, dec!(199));
        assert_eq!(result.total_return, dec!(0.99));
    }

    #[test]
    fn flat_series_returns_zero() {
        let series = UnderlyingSeries::new(vec![bar(2, dec!(5)), bar(3, dec!(5))]).unwrap();
        let result = buy_and_hold(&series, dec!(100));
        assert_eq!(result.total_return, Decimal::ZERO);
    }
}
