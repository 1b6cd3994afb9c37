// 🔎 Transaction Filter - dashboard filter state → SQL WHERE clause
// Shared by the listing and every report query.

use chrono::{Duration, NaiveDate};
use rusqlite::types::Value;
use serde::Deserialize;

use crate::error::{Result, TrackerError};
use crate::parser::TransactionType;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    /// Inclusive lower bound, ISO date
    pub date_from: Option<String>,
    /// Inclusive upper bound, ISO date
    pub date_to: Option<String>,
    pub categories: Vec<String>,
    pub kind: Option<TransactionType>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    /// Substring match on description or notes
    pub search: Option<String>,
}

/// SQL fragment (`WHERE ...` or empty) plus its positional parameters.
#[derive(Debug, Clone, Default)]
pub struct WhereClause {
    pub sql: String,
    pub params: Vec<Value>,
}

impl TransactionFilter {
    /// Restrict to one calendar month (`YYYY-MM`).
    pub fn month(mut self, month: &str) -> Result<Self> {
        let (from, to) = month_range(month)
            .ok_or_else(|| TrackerError::InvalidFilter(format!("invalid month: {month}")))?;
        self.date_from = Some(from);
        self.date_to = Some(to);
        Ok(self)
    }

    pub fn to_where(&self) -> WhereClause {
        let mut conditions: Vec<String> = Vec::new();
        let mut params: Vec<Value> = Vec::new();

        if let Some(from) = &self.date_from {
            conditions.push("date >= ?".to_string());
            params.push(Value::Text(from.clone()));
        }
        if let Some(to) = &self.date_to {
            conditions.push("date <= ?".to_string());
            params.push(Value::Text(to.clone()));
        }
        if !self.categories.is_empty() {
            let placeholders = vec!["?"; self.categories.len()].join(",");
            conditions.push(format!("category IN ({placeholders})"));
            params.extend(self.categories.iter().cloned().map(Value::Text));
        }
        if let Some(kind) = self.kind {
            conditions.push("type = ?".to_string());
            params.push(Value::Text(kind.as_str().to_string()));
        }
        if let Some(min) = self.min_amount {
            conditions.push("amount >= ?".to_string());
            params.push(Value::Real(min));
        }
        if let Some(max) = self.max_amount {
            conditions.push("amount <= ?".to_string());
            params.push(Value::Real(max));
        }
        if let Some(search) = &self.search {
            conditions.push("(description LIKE ? OR notes LIKE ?)".to_string());
            let term = format!("%{search}%");
            params.push(Value::Text(term.clone()));
            params.push(Value::Text(term));
        }

        let sql = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        WhereClause { sql, params }
    }
}

/// First and last ISO day of a `YYYY-MM` month.
pub fn month_range(month: &str) -> Option<(String, String)> {
    let (year, mon) = month.trim().split_once('-')?;
    let year: i32 = year.parse().ok()?;
    let mon: u32 = mon.parse().ok()?;

    let first = NaiveDate::from_ymd_opt(year, mon, 1)?;
    let next_month = if mon == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, mon + 1, 1)?
    };
    let last = next_month - Duration::days(1);

    Some((
        first.format("%Y-%m-%d").to_string(),
        last.format("%Y-%m-%d").to_string(),
    ))
}

// ============================================================================
// QUERY-STRING FORM
// ============================================================================

/// Filter as it arrives on the wire (`?dateFrom=..&categories=a,b&type=..`).
/// Empty values are treated as absent; `all` disables month/type filters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterParams {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub month: Option<String>,
    pub categories: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub min_amount: Option<String>,
    pub max_amount: Option<String>,
    pub search: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_amount_bound(name: &str, value: &Option<String>) -> Result<Option<f64>> {
    present(value)
        .map(|v| {
            v.parse::<f64>()
                .map_err(|_| TrackerError::InvalidFilter(format!("invalid {name}: {v}")))
        })
        .transpose()
}

impl TryFrom<FilterParams> for TransactionFilter {
    type Error = TrackerError;

    fn try_from(params: FilterParams) -> Result<Self> {
        let mut filter = TransactionFilter::default();

        if let Some(month) = present(&params.month).filter(|m| *m != "all") {
            filter = filter.month(month)?;
        }
        if let Some(from) = present(&params.date_from) {
            filter.date_from = Some(from.to_string());
        }
        if let Some(to) = present(&params.date_to) {
            filter.date_to = Some(to.to_string());
        }
        if let Some(categories) = present(&params.categories) {
            filter.categories = categories
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(kind) = present(&params.kind).filter(|k| *k != "all") {
            filter.kind = Some(TransactionType::parse(kind).ok_or_else(|| {
                TrackerError::InvalidFilter(format!("invalid type: {kind}"))
            })?);
        }
        filter.min_amount = parse_amount_bound("minAmount", &params.min_amount)?;
        filter.max_amount = parse_amount_bound("maxAmount", &params.max_amount)?;
        filter.search = present(&params.search).map(str::to_string);

        Ok(filter)
    }
}
