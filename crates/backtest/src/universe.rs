//! Per-trading-day lookup of listed option contracts.

use chrono::NaiveDate;
use optroll_core::{DataError, OptionContract};

/// Immutable index over the full contract set.
///
/// Contracts are held sorted by `(list_date, id)`, so a snapshot query is a
/// binary search for the listed prefix plus a filtered scan, and iteration
/// order never depends on a hash map.
#[derive(Debug, Clone)]
pub struct OptionUniverse {
    contracts: Vec<OptionContract>,
}

impl OptionUniverse {
    /// Builds the index.
    ///
    /// # Errors
    ///
    /// Rejects contracts with an empty price series, since their listing
    /// window would be undefined.
    pub fn new(mut contracts: Vec<OptionContract>) -> Result<Self, DataError> {
        for contract in &contracts {
            if contract.prices.is_empty() {
                return Err(DataError::UnpricedContract {
                    contract_id: contract.id.clone(),
                });
            }
        }
        contracts.sort_by(|a, b| {
            a.list_date()
                .cmp(&b.list_date())
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(Self { contracts })
    }

    /// Contracts whose listing window covers `date`, in deterministic order.
    #[must_use]
    pub fn snapshot(&self, date: NaiveDate) -> Vec<&OptionContract> {
        let listed = self
            .contracts
            .partition_point(|c| c.list_date() <= Some(date));
        self.contracts[..listed]
            .iter()
            .filter(|c| c.delist_date() >= Some(date))
            .collect()
    }

    /// Looks a contract up by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&OptionContract> {
        self.contracts.iter().find(|c| c.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }
}
