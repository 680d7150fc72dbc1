//! Observations derived from the ledger history.
//!
//! Two findings are produced once enough entries exist:
//!
//! - the category with the highest non-income spend in the current month;
//! - the trend of the current calendar month against the previous one.
//!
//! The trend compares months by **month number only**: January is compared
//! with every December in the ledger, whatever the year, and entries of any
//! kind (income included) count towards the monthly totals. Category ranking
//! instead excludes income.

use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;

use crate::{CategoryTable, CategoryTotals, Entry, Ledger, MoneyCents, Period};

/// Entries required before any finding is produced.
pub const MIN_ENTRIES: usize = 5;

#[derive(Clone, Debug, PartialEq)]
pub enum Trend {
    /// Spend grew by the given percentage.
    Up(f64),
    /// Spend shrank by the given percentage.
    Down(f64),
    Stable,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Insight {
    NotEnoughData,
    TopCategory { category: String, total: MoneyCents },
    MonthOverMonth(Trend),
}

pub fn generate(
    ledger: &Ledger,
    table: &CategoryTable,
    now: DateTime<Utc>,
    tz: Tz,
) -> Vec<Insight> {
    if ledger.len() < MIN_ENTRIES {
        return vec![Insight::NotEnoughData];
    }

    let mut insights = Vec::new();

    let month = CategoryTotals::from_entries(
        ledger
            .by_period(Period::Month, now, tz)
            .filter(|entry| !entry.is_income()),
    )
    .ranked(table);
    // Equal totals resolve by category table order, not by which was spent first.
    // Zero totals come from pending receipts only.
    if let Some((category, total)) = month.iter().next().filter(|(_, total)| total.is_positive())
    {
        insights.push(Insight::TopCategory {
            category: category.to_string(),
            total,
        });
    }

    if let Some(trend) = month_over_month(ledger, now, tz) {
        insights.push(Insight::MonthOverMonth(trend));
    }

    insights
}

fn month_over_month(ledger: &Ledger, now: DateTime<Utc>, tz: Tz) -> Option<Trend> {
    let current = now.with_timezone(&tz).month0();
    let previous = (current + 11) % 12;

    let in_month =
        |entry: &&Entry, month0: u32| entry.timestamp.with_timezone(&tz).month0() == month0;
    let previous_entries: Vec<&Entry> = ledger.iter().filter(|e| in_month(e, previous)).collect();
    if previous_entries.is_empty() {
        return None;
    }

    let previous_total: MoneyCents = previous_entries.iter().map(|e| e.value).sum();
    let current_total: MoneyCents = ledger
        .iter()
        .filter(|e| in_month(e, current))
        .map(|e| e.value)
        .sum();

    // Only zero-valued entries (pending receipts) last month: no baseline.
    if previous_total.is_zero() {
        return None;
    }

    let diff = current_total - previous_total;
    let percent = MoneyCents::new(diff.cents().saturating_abs()).percent_of(previous_total);
    Some(if diff.is_positive() {
        Trend::Up(percent)
    } else if diff.is_negative() {
        Trend::Down(percent)
    } else {
        Trend::Stable
    })
}
