//! End-to-end runs of the roll engine over synthetic three-month data.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use optroll_backtest::{OptionUniverse, RollEngine};
use optroll_core::{
    BacktestConfig, DailyBar, OptionContract, OptionType, TradeAction, UnderlyingSeries,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn series(from: NaiveDate, to: NaiveDate, close: Decimal) -> UnderlyingSeries {
    let mut bars = Vec::new();
    let mut day = from;
    while day <= to {
        bars.push(DailyBar {
            date: day,
            open: close,
            high: close,
            low: close,
            close,
            volume: dec!(50000),
        });
        day = day.succ_opt().unwrap();
    }
    UnderlyingSeries::new(bars).unwrap()
}

/// A call priced every day from `from` through its expiry, decaying linearly
/// from `start_price` so closes realize a gain for the short side.
fn decaying_call(
    id: &str,
    strike: Decimal,
    from: NaiveDate,
    expiry: NaiveDate,
    start_price: Decimal,
) -> OptionContract {
    let mut prices = BTreeMap::new();
    let mut day = from;
    let mut price = start_price;
    while day <= expiry {
        prices.insert(day, price);
        if price > dec!(0.02) {
            price -= dec!(0.002);
        }
        day = day.succ_opt().unwrap();
    }
    OptionContract {
        id: id.to_string(),
        strike,
        option_type: OptionType::Call,
        expiry,
        prices,
    }
}

fn three_month_universe() -> OptionUniverse {
    OptionUniverse::new(vec![
        decaying_call("C2402", dec!(5.5), date(2024, 1, 2), date(2024, 2, 21), dec!(0.20)),
        decaying_call("C2403", dec!(5.5), date(2024, 1, 2), date(2024, 3, 20), dec!(0.25)),
        decaying_call("C2404", dec!(5.5), date(2024, 2, 1), date(2024, 4, 17), dec!(0.30)),
    ])
    .unwrap()
}

fn config() -> BacktestConfig {
    BacktestConfig {
        commission_rate: Decimal::ZERO,
        ..BacktestConfig::default()
    }
}

#[test]
fn three_month_run_sells_three_and_closes_two() {
    let universe = three_month_universe();
    let cfg = config();
    let days = series(date(2024, 1, 2), date(2024, 3, 29), dec!(5.5));

    let report = RollEngine::new(&universe, &cfg).run(&days).unwrap();

    let actions: Vec<_> = report
        .trade_log
        .iter()
        .map(|e| (e.action, e.contract_id.as_str()))
        .collect();
    assert_eq!(
        actions,
        vec![
            // Jan 2: first trading day, sell the nearest later-month expiry
            (TradeAction::Sell, "C2402"),
            // Feb 14: seven days before the Feb 21 expiry, roll into March
            (TradeAction::Close, "C2402"),
            (TradeAction::Sell, "C2403"),
            // Mar 13: roll again into April
            (TradeAction::Close, "C2403"),
            (TradeAction::Sell, "C2404"),
        ]
    );
    assert_eq!(report.trade_log[1].date, date(2024, 2, 14));
    assert_eq!(report.trade_log[3].date, date(2024, 3, 13));

    // Chronological, append-only log
    let dates: Vec<_> = report.trade_log.iter().map(|e| e.date).collect();
    let mut sorted = dates.clone();
    sorted.sort();
    assert_eq!(dates, sorted);

    // The April position outlives the run: open exposure, not realized
    let exposure = report.open_exposure.expect("last position stays open");
    assert_eq!(exposure.contract_id, "C2404");
    assert_eq!(report.round_trips, 2);
    assert_eq!(report.trade_count, 5);
    assert!(report.realized_pnl > Decimal::ZERO);

    // Monthly grouping covers all three calendar months
    assert_eq!(report.monthly_returns.len(), 3);
    assert_eq!(report.nav.len(), days.len());
}

#[test]
fn capital_and_nav_stay_non_negative_throughout() {
    let universe = three_month_universe();
    let cfg = config();
    let days = series(date(2024, 1, 2), date(2024, 3, 29), dec!(5.5));

    let report = RollEngine::new(&universe, &cfg).run(&days).unwrap();
    assert!(report.nav.iter().all(|p| p.value >= Decimal::ZERO));

    // Margin posted on every sell never exceeds what the account held
    let mut capital = cfg.initial_capital;
    for entry in &report.trade_log {
        capital += entry.margin_delta;
        assert!(capital >= Decimal::ZERO, "negative capital at {}", entry.date);
    }
}

#[test]
fn the_same_inputs_replay_bit_for_bit() {
    let universe = three_month_universe();
    let cfg = config();
    let days = series(date(2024, 1, 2), date(2024, 3, 29), dec!(5.5));

    let first = RollEngine::new(&universe, &cfg).run(&days).unwrap();
    let second = RollEngine::new(&universe, &cfg).run(&days).unwrap();
    assert_eq!(first, second);
}

#[test]
fn single_position_invariant_holds_in_the_log() {
    let universe = three_month_universe();
    let cfg = config();
    let days = series(date(2024, 1, 2), date(2024, 3, 29), dec!(5.5));

    let report = RollEngine::new(&universe, &cfg).run(&days).unwrap();

    // Sells and closes must strictly alternate starting with a sell
    let mut open = 0i32;
    for entry in &report.trade_log {
        match entry.action {
            TradeAction::Sell => open += 1,
            TradeAction::Close => open -= 1,
        }
        assert!((0..=1).contains(&open), "position count out of range");
    }
}
