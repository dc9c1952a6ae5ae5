//! Validated underlying price series.

use crate::error::DataError;
use crate::types::DailyBar;

/// Date-ordered daily bars for one underlying instrument.
///
/// Construction validates the ordering invariant once (strictly increasing
/// dates, one bar per trading day) so the backtest walk never re-checks it.
#[derive(Debug, Clone, PartialEq)]
pub struct UnderlyingSeries {
    bars: Vec<DailyBar>,
}

impl UnderlyingSeries {
    /// Validates and wraps a bar sequence.
    ///
    /// # Errors
    ///
    /// Returns a `DataError` if the sequence is empty, contains a duplicate
    /// date, or is not strictly increasing by date.
    pub fn new(bars: Vec<DailyBar>) -> Result<Self, DataError> {
        if bars.is_empty() {
            return Err(DataError::EmptySeries);
        }
        for pair in bars.windows(2) {
            if pair[1].date == pair[0].date {
                return Err(DataError::DuplicateDate { date: pair[1].date });
            }
            if pair[1].date < pair[0].date {
                return Err(DataError::NonMonotonicDates {
                    prev: pair[0].date,
                    next: pair[1].date,
                });
            }
        }
        Ok(Self { bars })
    }

    #[must_use]
    pub fn bars(&self) -> &[DailyBar] {
        &self.bars
    }

    /// First bar. The constructor guarantees the series is non-empty.
    #[must_use]
    pub fn first(&self) -> &DailyBar {
        &self.bars[0]
    }

    /// Last bar.
    #[must_use]
    pub fn last(&self) -> &DailyBar {
        &self.bars[self.bars.len() - 1]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}
