// 📊 Reports - aggregate views over filtered transactions

use rusqlite::{params_from_iter, Connection};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::filter::TransactionFilter;
use crate::parser::TransactionType;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_income: f64,
    pub total_expenses: f64,
    pub balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
}

/// Income and expenses for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub date: String,
    pub income: f64,
    pub expenses: f64,
}

pub fn summary(conn: &Connection, filter: &TransactionFilter) -> Result<Summary> {
    let clause = filter.to_where();
    let sql = format!(
        "SELECT
            COALESCE(SUM(CASE WHEN type = 'income' THEN amount END), 0.0),
            COALESCE(SUM(CASE WHEN type = 'expense' THEN amount END), 0.0)
         FROM transactions {}",
        clause.sql
    );

    let (total_income, total_expenses): (f64, f64) =
        conn.query_row(&sql, params_from_iter(clause.params.iter()), |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?;

    Ok(Summary {
        total_income,
        total_expenses,
        balance: total_income - total_expenses,
    })
}

/// Totals grouped by (category, type), largest first.
pub fn by_category(conn: &Connection, filter: &TransactionFilter) -> Result<Vec<CategoryTotal>> {
    let clause = filter.to_where();
    let sql = format!(
        "SELECT category, SUM(amount) AS total, type FROM transactions {}
         GROUP BY category, type ORDER BY total DESC",
        clause.sql
    );

    let mut stmt = conn.prepare(&sql)?;
    let totals = stmt
        .query_map(params_from_iter(clause.params.iter()), |row| {
            Ok(CategoryTotal {
                category: row.get(0)?,
                total: row.get(1)?,
                kind: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(totals)
}

/// Daily income/expense series, oldest first.
pub fn over_time(conn: &Connection, filter: &TransactionFilter) -> Result<Vec<TimeSeriesPoint>> {
    let clause = filter.to_where();
    let sql = format!(
        "SELECT date,
            SUM(CASE WHEN type = 'income' THEN amount ELSE 0.0 END),
            SUM(CASE WHEN type = 'expense' THEN amount ELSE 0.0 END)
         FROM transactions {}
         GROUP BY date ORDER BY date ASC",
        clause.sql
    );

    let mut stmt = conn.prepare(&sql)?;
    let points = stmt
        .query_map(params_from_iter(clause.params.iter()), |row| {
            Ok(TimeSeriesPoint {
                date: row.get(0)?,
                income: row.get(1)?,
                expenses: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(points)
}

/// Distinct `YYYY-MM` prefixes present in the store, newest first.
pub fn months(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT DISTINCT substr(date, 1, 7) AS month FROM transactions ORDER BY month DESC")?;
    let months = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(months)
}

pub fn categories(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT DISTINCT category FROM transactions ORDER BY category ASC")?;
    let categories = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(categories)
}
