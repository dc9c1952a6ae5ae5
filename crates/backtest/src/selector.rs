//! At-the-money contract selection.

use chrono::NaiveDate;
use optroll_core::{OptionContract, OptionType};
use rust_decimal::Decimal;

/// Outcome of an ATM query: the chosen contract and how far its strike sat
/// from the underlying close.
#[derive(Debug, Clone, Copy)]
pub struct AtmSelection<'a> {
    pub contract: &'a OptionContract,
    pub distance: Decimal,
}

/// Picks the eligible contract whose strike is closest to `underlying_close`.
///
/// Eligible means: matching option type, priced on `date`, and (when
/// `require_later_expiry` is set) expiring in a calendar month strictly
/// after `date`'s, so the strategy never sells a contract about to settle.
/// Ties on distance break by soonest expiry, then by contract id; the choice
/// never depends on snapshot order. `None` means nothing qualifies, which is
/// a policy condition for the engine, not an error.
#[must_use]
pub fn select_atm<'a>(
    snapshot: &[&'a OptionContract],
    underlying_close: Decimal,
    date: NaiveDate,
    option_type: OptionType,
    require_later_expiry: bool,
) -> Option<AtmSelection<'a>> {
    snapshot
        .iter()
        .filter(|c| c.option_type == option_type)
        .filter(|c| !require_later_expiry || c.expires_after_month_of(date))
        .filter(|c| c.price_on(date).is_some())
        .map(|c| ((c.strike - underlying_close).abs(), *c))
        .min_by(|(da, a), (db, b)| {
            da.cmp(db)
                .then_with(|| a.expiry.cmp(&b.expiry))
                .then_with(|| a.id.cmp(&b.id))
        })
        .map(|(distance, contract)| AtmSelection { contract, distance })
}
