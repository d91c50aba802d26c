use std::str::FromStr;

use chrono::{DateTime, NaiveDate};
use log::warn;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single historical sale, tagged with the filter it was fetched under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub price: Decimal,
    pub date: NaiveDate,
    pub grading_company: String,
    pub grade_number: String,
}

/// Transaction as returned by the upstream API, before validation
#[derive(Debug, Clone, Deserialize)]
pub struct RawTransaction {
    #[serde(default)]
    pub price: Value,
    #[serde(default)]
    pub date: Value,
}

impl RawTransaction {
    /// Converts into a [`Transaction`], or `None` if price or date are unusable
    pub fn into_transaction(self, grading_company: &str, grade_number: &str) -> Option<Transaction> {
        let Some(price) = parse_price(&self.price) else {
            warn!("Skipping transaction with unparsable price {}", self.price);
            return None;
        };

        let Some(date) = parse_date(&self.date) else {
            warn!("Skipping transaction with unparsable date {}", self.date);
            return None;
        };

        Some(Transaction {
            price,
            date,
            grading_company: grading_company.to_owned(),
            grade_number: grade_number.to_owned(),
        })
    }
}

fn parse_price(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok(),
        _ => None,
    }
}

/// Accepts a plain `YYYY-MM-DD` date or a full RFC 3339 timestamp
fn parse_date(value: &Value) -> Option<NaiveDate> {
    let raw = value.as_str()?.trim();

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }

    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .ok()
}
