use std::path::Path;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::{params, params_from_iter, Connection, Row, ToSql};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackerError};
use crate::filter::TransactionFilter;
use crate::parser::TransactionType;

/// A persisted transaction. Created only by the ingestion coordinator and
/// never updated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub date: String,
    pub amount: f64,
    pub category: String,
    pub description: String,
    pub notes: Option<String>,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// sha256 content hash, unique across the table
    pub fingerprint: String,
    pub created_at: String,
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        TransactionType::parse(s)
            .ok_or_else(|| FromSqlError::Other(format!("invalid transaction type: {s}").into()))
    }
}

// ============================================================================
// SCHEMA
// ============================================================================

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date TEXT NOT NULL,
    amount REAL NOT NULL CHECK(amount >= 0),
    category TEXT NOT NULL,
    description TEXT NOT NULL,
    notes TEXT,
    type TEXT NOT NULL CHECK(type IN ('income', 'expense')),
    fingerprint TEXT UNIQUE NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);
CREATE INDEX IF NOT EXISTS idx_transactions_type ON transactions(type);
CREATE INDEX IF NOT EXISTS idx_transactions_category ON transactions(category);
CREATE INDEX IF NOT EXISTS idx_transactions_fingerprint ON transactions(fingerprint);
";

/// Create tables and indexes. Safe to run against an existing database.
pub fn setup_database(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Open (creating if needed) the database file and run schema setup once.
///
/// This is the only place the schema is touched; callers open the store at
/// startup and share the connection afterwards.
pub fn open_database(db_path: &Path) -> Result<Connection> {
    if let Some(dir) = db_path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }

    let conn = Connection::open(db_path)?;
    // WAL for crash recovery and readers that don't block the importer
    conn.pragma_update(None, "journal_mode", "WAL")?;
    setup_database(&conn)?;
    tracing::info!(path = %db_path.display(), "database ready");
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    setup_database(&conn)?;
    Ok(conn)
}

// ============================================================================
// READS
// ============================================================================

const SELECT_COLUMNS: &str =
    "SELECT id, date, amount, category, description, notes, type, fingerprint, created_at FROM transactions";

fn row_to_transaction(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: row.get(0)?,
        date: row.get(1)?,
        amount: row.get(2)?,
        category: row.get(3)?,
        description: row.get(4)?,
        notes: row.get(5)?,
        kind: row.get(6)?,
        fingerprint: row.get(7)?,
        created_at: row.get(8)?,
    })
}

/// Transactions matching `filter`, newest first.
pub fn list_transactions(conn: &Connection, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
    let clause = filter.to_where();
    let sql = format!("{SELECT_COLUMNS} {} ORDER BY date DESC, id DESC", clause.sql);

    let mut stmt = conn.prepare(&sql)?;
    let transactions = stmt
        .query_map(params_from_iter(clause.params.iter()), row_to_transaction)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(transactions)
}

pub fn get_transaction(conn: &Connection, id: i64) -> Result<Option<Transaction>> {
    let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} WHERE id = ?1"))?;
    let mut rows = stmt.query_map([id], row_to_transaction)?;
    Ok(rows.next().transpose()?)
}

pub fn count_transactions(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;
    Ok(count)
}

// ============================================================================
// DELETES
// ============================================================================

pub fn delete_transaction(conn: &Connection, id: i64) -> Result<()> {
    let deleted = conn.execute("DELETE FROM transactions WHERE id = ?1", params![id])?;
    if deleted == 0 {
        return Err(TrackerError::NotFound(id));
    }
    tracing::info!(id, "transaction deleted");
    Ok(())
}

/// Remove every transaction ("reset"). Returns how many were removed.
pub fn delete_all_transactions(conn: &Connection) -> Result<usize> {
    let deleted = conn.execute("DELETE FROM transactions", [])?;
    tracing::info!(deleted, "all transactions cleared");
    Ok(deleted)
}
