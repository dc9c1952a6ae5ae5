#![allow(clippy::format_push_string)]
#![allow(clippy::uninlined_format_args)]

use optroll_backtest::{BacktestReport, BuyHoldResult};
use rust_decimal::Decimal;

/// Renders the fixed-width results block printed after a run.
#[must_use]
pub fn format_report(report: &BacktestReport, benchmark: &BuyHoldResult) -> String {
    let mut output = String::new();
    let pct = Decimal::from(100);

    output.push('\n');
    output.push_str("═══════════════════════════════════════════════════════════════\n");
    output.push_str("                    BACKTEST RESULTS                           \n");
    output.push_str("═══════════════════════════════════════════════════════════════\n");
    output.push('\n');

    if let (Some(first), Some(last)) = (report.nav.first(), report.nav.last()) {
        output.push_str("Time Period\n");
        output.push_str("───────────────────────────────────────────────────────────────\n");
        output.push_str(&format!("Start:                 {}\n", first.date));
        output.push_str(&format!("End:                   {}\n", last.date));
        output.push_str(&format!(
            "Trading Days:          {}\n",
            report.nav.len()
        ));
        output.push('\n');
    }

    output.push_str("Portfolio Performance\n");
    output.push_str("───────────────────────────────────────────────────────────────\n");
    output.push_str(&format!(
        "Initial Capital:       {:.2}\n",
        report.initial_capital
    ));
    output.push_str(&format!("Final Value:           {:.2}\n", report.final_value));
    output.push_str(&format!(
        "Total Return:          {:.2}%\n",
        report.total_return * pct
    ));
    output.push_str(&format!(
        "Buy & Hold Return:     {:.2}%\n",
        benchmark.total_return * pct
    ));
    output.push_str(&format!("Realized PnL:          {:.2}\n", report.realized_pnl));
    output.push('\n');

    output.push_str("Trade Statistics\n");
    output.push_str("───────────────────────────────────────────────────────────────\n");
    output.push_str(&format!("Log Entries:           {}\n", report.trade_count));
    output.push_str(&format!("Round Trips:           {}\n", report.round_trips));
    if report.round_trips > 0 {
        output.push_str(&format!(
            "Avg Holding Period:    {:.1} days\n",
            report.avg_holding_days
        ));
    } else {
        output.push_str("Avg Holding Period:    N/A (no round trips)\n");
    }

    if let Some(exposure) = &report.open_exposure {
        output.push('\n');
        output.push_str("Open Exposure (not realized)\n");
        output.push_str("───────────────────────────────────────────────────────────────\n");
        output.push_str(&format!("Contract:              {}\n", exposure.contract_id));
        output.push_str(&format!(
            "Entered:               {} @ {:.4}\n",
            exposure.entry_date, exposure.entry_price
        ));
        output.push_str(&format!("Last Mark:             {:.4}\n", exposure.last_mark));
        output.push_str(&format!(
            "Unrealized PnL:        {:.2}\n",
            exposure.unrealized_pnl
        ));
    }

    if !report.monthly_returns.is_empty() {
        output.push('\n');
        output.push_str("Monthly Returns\n");
        output.push_str("───────────────────────────────────────────────────────────────\n");
        for month in &report.monthly_returns {
            output.push_str(&format!(
                "{}-{:02}:               {:.2}%\n",
                month.year,
                month.month,
                month.value * pct
            ));
        }
    }

    output.push('\n');
    output.push_str("═══════════════════════════════════════════════════════════════\n");

    if report.trade_count == 0 {
        output.push_str("\nNo trades were made during this backtest.\n");
        output.push_str("Check the option universe and parameter ranges.\n");
    }

    output
}
