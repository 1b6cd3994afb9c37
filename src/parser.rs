// 📄 Row Parser - uploaded CSV → canonical rows
// Column Resolver + Field Normalizers over a header-first CSV file.

use std::fmt;

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};

use crate::columns::{ColumnMap, DescriptionMode};
use crate::error::{Result, TrackerError};
use crate::normalize::{normalize_amount, normalize_category, normalize_date, normalize_type};

// ============================================================================
// CORE TYPES
// ============================================================================

/// Direction of money. Amounts are always stored non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    #[default]
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "income" => Some(TransactionType::Income),
            "expense" => Some(TransactionType::Expense),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalized CSV row, ready for ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedRow {
    pub date: String,
    pub amount: f64,
    pub category: String,
    pub description: String,
    pub notes: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
}

// ============================================================================
// PARSING
// ============================================================================

/// Parse raw upload bytes. Invalid UTF-8 sequences are replaced, not fatal.
pub fn parse_csv_bytes(bytes: &[u8], mode: DescriptionMode) -> Result<Vec<ParsedRow>> {
    parse_csv(&String::from_utf8_lossy(bytes), mode)
}

/// Parse the decoded text of a CSV file with a header row.
///
/// * a leading byte-order mark is ignored
/// * quoted fields may contain commas, quotes and newlines
/// * fields are trimmed; blank lines and all-blank records are skipped
/// * a file without data rows yields an empty list, whatever its header
///
/// Fails with [`TrackerError::MissingRequiredColumns`] when there are data
/// rows but no date or no amount column.
pub fn parse_csv(content: &str, mode: DescriptionMode) -> Result<Vec<ParsedRow>> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        records.push(record);
    }

    if records.is_empty() {
        return Ok(Vec::new());
    }

    let columns = ColumnMap::resolve(&headers, mode.alias_table());
    if !columns.has_required() {
        return Err(TrackerError::MissingRequiredColumns { headers });
    }
    tracing::debug!(?columns, %mode, rows = records.len(), "resolved CSV columns");

    Ok(records
        .iter()
        .map(|record| build_row(record, &columns, mode))
        .collect())
}

fn cell(record: &StringRecord, index: Option<usize>) -> &str {
    index
        .and_then(|i| record.get(i))
        .map(str::trim)
        .unwrap_or("")
}

fn build_row(record: &StringRecord, columns: &ColumnMap, mode: DescriptionMode) -> ParsedRow {
    let description = cell(record, columns.description).to_string();
    let explicit_notes = cell(record, columns.notes);

    let notes = match mode {
        DescriptionMode::Composed => [
            cell(record, columns.source),
            cell(record, columns.payee),
            explicit_notes,
        ]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" | "),
        DescriptionMode::Direct => explicit_notes.to_string(),
    };

    let kind = match columns.kind {
        Some(_) => normalize_type(cell(record, columns.kind)),
        None => TransactionType::Expense,
    };

    ParsedRow {
        date: normalize_date(cell(record, columns.date)),
        amount: normalize_amount(cell(record, columns.amount)),
        category: normalize_category(cell(record, columns.category)),
        description,
        notes,
        kind,
    }
}

// ============================================================================
// TESTS
// ============================================================================
