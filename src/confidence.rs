//! Dispersion based confidence rating over trailing time windows.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use log::warn;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Transaction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceResult {
    pub average_price: Decimal,
    pub average_deviation: Decimal,
    pub confidence_level: ConfidenceLevel,
}

impl ConfidenceResult {
    fn empty() -> Self {
        Self {
            average_price: Decimal::ZERO,
            average_deviation: Decimal::ZERO,
            confidence_level: ConfidenceLevel::Low,
        }
    }
}

/// Trailing windows reported by [`estimate_windows`], in output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Window {
    Week,
    Month,
    Quarter,
    Year,
}

impl Window {
    pub const ALL: [Window; 4] = [Window::Week, Window::Month, Window::Quarter, Window::Year];

    pub fn days(self) -> i64 {
        match self {
            Window::Week => 7,
            Window::Month => 30,
            Window::Quarter => 90,
            Window::Year => 365,
        }
    }
}

/// Rates the sales dated between `today - days` and `today`, both ends included
///
/// Sales dated after `today` are not part of any trailing window.
pub fn estimate_window(transactions: &[Transaction], today: NaiveDate, days: i64) -> ConfidenceResult {
    let cutoff = today - Duration::days(days);

    let prices: Vec<Decimal> = transactions
        .iter()
        .filter(|tx| tx.date >= cutoff && tx.date <= today)
        .map(|tx| tx.price)
        .collect();

    rate(&prices)
}

/// Single window form, rating the trailing 30 days
///
/// Deprecated semantics: older callers kept only sales dated on or before
/// one month ago. That direction is not reproduced here; this uses the same
/// on-or-after cutoff as [`estimate_windows`].
pub fn estimate(transactions: &[Transaction], today: NaiveDate) -> ConfidenceResult {
    estimate_window(transactions, today, Window::Month.days())
}

pub fn estimate_windows(
    transactions: &[Transaction],
    today: NaiveDate,
) -> BTreeMap<Window, ConfidenceResult> {
    Window::ALL
        .iter()
        .map(|window| (*window, estimate_window(transactions, today, window.days())))
        .collect()
}

fn rate(prices: &[Decimal]) -> ConfidenceResult {
    if prices.is_empty() {
        return ConfidenceResult::empty();
    }

    match averages(prices) {
        Some((average_price, average_deviation)) => classify(average_price, average_deviation),
        None => {
            warn!(
                "Price aggregate over {} sales overflowed, rating as empty",
                prices.len()
            );
            ConfidenceResult::empty()
        }
    }
}

/// Mean and mean absolute deviation, `None` on decimal overflow
fn averages(prices: &[Decimal]) -> Option<(Decimal, Decimal)> {
    let count = Decimal::from(prices.len());

    let average_price = prices
        .iter()
        .try_fold(Decimal::ZERO, |acc, price| acc.checked_add(*price))?
        .checked_div(count)?;

    let average_deviation = prices
        .iter()
        .try_fold(Decimal::ZERO, |acc, price| {
            acc.checked_add(price.checked_sub(average_price)?.abs())
        })?
        .checked_div(count)?;

    Some((average_price, average_deviation))
}

fn classify(average_price: Decimal, average_deviation: Decimal) -> ConfidenceResult {
    // 10% and 20% of the mean, as divisions so they cannot overflow
    let confidence_level = if average_deviation < average_price / Decimal::from(10) {
        ConfidenceLevel::High
    } else if average_deviation < average_price / Decimal::from(5) {
        ConfidenceLevel::Medium
    } else {
        ConfidenceLevel::Low
    };

    ConfidenceResult {
        average_price: average_price.round_dp(2),
        average_deviation: average_deviation.round_dp(2),
        confidence_level,
    }
}
