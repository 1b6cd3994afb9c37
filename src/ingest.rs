// 📥 Ingestion Coordinator - atomic insert-if-absent with per-row tally
//
// One IMMEDIATE transaction per batch. A fingerprint collision is the only
// outcome counted as a duplicate; any other storage failure rolls back the
// whole batch.

use std::time::{Duration, Instant};

use rusqlite::{params, Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};

use crate::columns::DescriptionMode;
use crate::error::{Result, TrackerError};
use crate::parser::{parse_csv_bytes, ParsedRow};

/// Outcome of one upload.
///
/// Always `rows_processed == rows_inserted + duplicates_skipped`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestSummary {
    pub rows_processed: usize,
    pub rows_inserted: usize,
    pub duplicates_skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Duplicate,
}

impl IngestSummary {
    fn record(&mut self, outcome: InsertOutcome) {
        self.rows_processed += 1;
        match outcome {
            InsertOutcome::Inserted => self.rows_inserted += 1,
            InsertOutcome::Duplicate => self.duplicates_skipped += 1,
        }
    }
}

const INSERT_SQL: &str = "INSERT INTO transactions (date, amount, category, description, notes, type, fingerprint)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
     ON CONFLICT(fingerprint) DO NOTHING";

/// Insert `rows` as one atomic batch with no deadline.
pub fn ingest(conn: &mut Connection, rows: &[ParsedRow]) -> Result<IngestSummary> {
    ingest_with_deadline(conn, rows, None)
}

/// Insert `rows` as one atomic batch.
///
/// The deadline is checked before each row. Past it, the batch is rolled
/// back and [`TrackerError::Timeout`] is returned.
pub fn ingest_with_deadline(
    conn: &mut Connection,
    rows: &[ParsedRow],
    deadline: Option<Instant>,
) -> Result<IngestSummary> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut summary = IngestSummary::default();

    {
        let mut stmt = tx.prepare_cached(INSERT_SQL)?;

        for (index, row) in rows.iter().enumerate() {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                tracing::warn!(processed = index, total = rows.len(), "import deadline exceeded, rolling back");
                return Err(TrackerError::Timeout { processed: index });
            }

            let notes = (!row.notes.is_empty()).then_some(row.notes.as_str());
            let changed = stmt
                .execute(params![
                    row.date,
                    row.amount,
                    row.category,
                    row.description,
                    notes,
                    row.kind,
                    row.fingerprint(),
                ])
                .map_err(|e| {
                    tracing::warn!(row = index + 1, error = %e, "row rejected by store, rolling back batch");
                    e
                })?;

            let outcome = if changed == 1 {
                InsertOutcome::Inserted
            } else {
                InsertOutcome::Duplicate
            };
            summary.record(outcome);
        }
    }

    tx.commit()?;

    tracing::info!(
        processed = summary.rows_processed,
        inserted = summary.rows_inserted,
        duplicates = summary.duplicates_skipped,
        "ingest complete"
    );
    Ok(summary)
}

// ============================================================================
// UPLOAD PIPELINE
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    pub mode: DescriptionMode,
    pub timeout: Option<Duration>,
}

/// Parse an uploaded file and ingest it. Parse failures happen before any
/// write is attempted.
pub fn import_csv(conn: &mut Connection, bytes: &[u8], options: &ImportOptions) -> Result<IngestSummary> {
    let started = Instant::now();
    let rows = parse_csv_bytes(bytes, options.mode)?;
    let deadline = options.timeout.map(|t| started + t);
    ingest_with_deadline(conn, &rows, deadline)
}
