use colored::*;
use std::fmt::Write;

use crate::broker::portfolio::Portfolio;
use crate::journal::{highest_price, lowest_price, JournalEntry};
use crate::models::{OrderAction, Position};
use crate::performance::PerformanceHeap;

fn signed(amount: f64) -> ColoredString {
    if amount >= 0.0 {
        format!("+{:.2}", amount).green()
    } else {
        format!("{:.2}", amount).red()
    }
}

pub fn render_portfolio(portfolio: &Portfolio) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "========== Your Portfolio ==========".bold());
    if portfolio.is_empty() {
        let _ = writeln!(out, "  (no holdings)");
        return out;
    }

    let mut total_investment = 0.0;
    for position in portfolio {
        total_investment += position.notional();
        let _ = writeln!(
            out,
            "  - {}: {} shares at {:.2} average price",
            position.symbol.bold(),
            position.quantity,
            position.average_cost
        );
    }
    let _ = writeln!(out, "  Total Investment: {:.2}", total_investment);
    out
}

/// Closed trades, best first, with the realized total at the bottom.
pub fn render_performance(performance: &PerformanceHeap) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "===== Trading Performance (Top trades) =====".bold());
    if performance.is_empty() {
        let _ = writeln!(out, "  (no closed trades)");
        return out;
    }

    let mut total = 0.0;
    for (rank, record) in performance.sorted_view().iter().enumerate() {
        total += record.realized_profit;
        let _ = writeln!(
            out,
            "  {:>3}. {} | Quantity: {} | Profit: {}",
            rank + 1,
            record.symbol,
            record.quantity_sold,
            signed(record.realized_profit)
        );
    }
    let _ = writeln!(out, "  Realized P&L: {}", signed(total));
    out
}

pub fn render_history(entries: &[JournalEntry]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "========== Transaction History ==========".bold());
    if entries.is_empty() {
        let _ = writeln!(out, "  (no transactions)");
        return out;
    }

    for entry in entries {
        let _ = writeln!(out, "  {}", history_line(entry));
    }
    if let Some(lowest) = lowest_price(entries) {
        let _ = writeln!(out, "  Lowest Transaction:  {}", history_line(lowest));
    }
    if let Some(highest) = highest_price(entries) {
        let _ = writeln!(out, "  Highest Transaction: {}", history_line(highest));
    }
    out
}

fn history_line(entry: &JournalEntry) -> String {
    let action = match entry.action {
        OrderAction::Buy => entry.action.to_string().bright_cyan().bold(),
        OrderAction::Sell => entry.action.to_string().bright_magenta().bold(),
    };
    format!(
        "{} {} | {} | {} @ {:.2}",
        entry.date, action, entry.symbol, entry.quantity, entry.price
    )
}

/// Outcome of a symbol lookup.
pub fn render_search(symbol: &str, found: Option<&Position>) -> String {
    match found {
        Some(position) => format!("{} {}\n", "Found:".green(), position),
        None => format!("{}\n", format!("Stock {} not found!", symbol).red()),
    }
}
