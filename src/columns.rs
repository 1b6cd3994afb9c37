// 🧭 Column Resolver - map arbitrary CSV headers onto canonical fields
//
// Headers are user-controlled ("Date", "txn_date", " AMOUNT "...). Each
// canonical field has an ordered alias list; the first alias (in alias
// order, not header order) that equals a trimmed, lower-cased header wins.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ============================================================================
// CANONICAL FIELDS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    Date,
    Amount,
    Category,
    /// Primary description ("to": who was paid).
    Description,
    /// Payment source ("from": card, wallet, app).
    Source,
    /// Payee reference (UPI id, account).
    Payee,
    Notes,
    Type,
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Field::Date => "date",
            Field::Amount => "amount",
            Field::Category => "category",
            Field::Description => "description",
            Field::Source => "source",
            Field::Payee => "payee",
            Field::Notes => "notes",
            Field::Type => "type",
        }
    }
}

// ============================================================================
// DESCRIPTION POLICY
// ============================================================================

/// How `description` and `notes` are built from the source columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptionMode {
    /// `description` = the "to" column; `notes` = from | payee | notes.
    #[default]
    Composed,
    /// `description` and `notes` each come from their own alias list.
    Direct,
}

impl DescriptionMode {
    pub fn alias_table(&self) -> &'static AliasTable {
        match self {
            DescriptionMode::Composed => &COMPOSED_ALIASES,
            DescriptionMode::Direct => &DIRECT_ALIASES,
        }
    }
}

impl fmt::Display for DescriptionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DescriptionMode::Composed => write!(f, "composed"),
            DescriptionMode::Direct => write!(f, "direct"),
        }
    }
}

impl FromStr for DescriptionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "composed" => Ok(DescriptionMode::Composed),
            "direct" => Ok(DescriptionMode::Direct),
            other => Err(format!("unknown description mode: {other}")),
        }
    }
}

// ============================================================================
// ALIAS TABLES
// ============================================================================

/// Canonical field → ordered aliases (lower-case).
pub struct AliasTable {
    pub mode: DescriptionMode,
    pub entries: &'static [(Field, &'static [&'static str])],
}

const DATE_ALIASES: &[&str] = &["date", "transaction_date", "trans_date", "txn_date"];
const AMOUNT_ALIASES: &[&str] = &["amount", "value", "sum", "total"];
const CATEGORY_ALIASES: &[&str] = &["category", "cat", "group"];
const NOTES_ALIASES: &[&str] = &["notes", "note", "comment", "comments"];
const TYPE_ALIASES: &[&str] = &["type", "transaction_type", "txn_type", "kind"];

pub static COMPOSED_ALIASES: AliasTable = AliasTable {
    mode: DescriptionMode::Composed,
    entries: &[
        (Field::Date, DATE_ALIASES),
        (Field::Amount, AMOUNT_ALIASES),
        (Field::Category, CATEGORY_ALIASES),
        (Field::Description, &["to", "description", "desc", "memo", "narration"]),
        (Field::Source, &["from", "source", "payment_method"]),
        (Field::Payee, &["payee", "upi_id", "account"]),
        (Field::Notes, NOTES_ALIASES),
        (Field::Type, TYPE_ALIASES),
    ],
};

pub static DIRECT_ALIASES: AliasTable = AliasTable {
    mode: DescriptionMode::Direct,
    entries: &[
        (Field::Date, DATE_ALIASES),
        (Field::Amount, AMOUNT_ALIASES),
        (Field::Category, CATEGORY_ALIASES),
        (
            Field::Description,
            &["description", "desc", "memo", "narration", "to", "payee"],
        ),
        (Field::Notes, NOTES_ALIASES),
        (Field::Type, TYPE_ALIASES),
    ],
};

impl AliasTable {
    pub fn aliases(&self, field: Field) -> &'static [&'static str] {
        self.entries
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, aliases)| *aliases)
            .unwrap_or(&[])
    }
}

// ============================================================================
// RESOLUTION
// ============================================================================

/// Find the header matching one of `candidates`, trying candidates in order.
/// Returns the header's position.
pub fn find_column<S: AsRef<str>>(headers: &[S], candidates: &[&str]) -> Option<usize> {
    candidates.iter().find_map(|candidate| {
        headers
            .iter()
            .position(|h| h.as_ref().trim().to_lowercase() == candidate.to_lowercase())
    })
}

/// Header positions for each canonical field present in a file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    pub date: Option<usize>,
    pub amount: Option<usize>,
    pub category: Option<usize>,
    pub description: Option<usize>,
    pub source: Option<usize>,
    pub payee: Option<usize>,
    pub notes: Option<usize>,
    pub kind: Option<usize>,
}

impl ColumnMap {
    pub fn resolve<S: AsRef<str>>(headers: &[S], table: &AliasTable) -> Self {
        let find = |field| find_column(headers, table.aliases(field));
        ColumnMap {
            date: find(Field::Date),
            amount: find(Field::Amount),
            category: find(Field::Category),
            description: find(Field::Description),
            source: find(Field::Source),
            payee: find(Field::Payee),
            notes: find(Field::Notes),
            kind: find(Field::Type),
        }
    }

    /// Date and amount are mandatory; everything else has a default.
    pub fn has_required(&self) -> bool {
        self.date.is_some() && self.amount.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_column_is_case_and_space_insensitive() {
        let headers = [" DATE ", "Amount", "To"];
        assert_eq!(find_column(&headers, &["date"]), Some(0));
        assert_eq!(find_column(&headers, &["amount"]), Some(1));
        assert_eq!(find_column(&headers, &["to"]), Some(2));
    }

    #[test]
    fn test_find_column_no_partial_matches() {
        let headers = ["Transaction Date", "Amounts", "dates"];
        assert_eq!(find_column(&headers, DATE_ALIASES), None);
        assert_eq!(find_column(&headers, AMOUNT_ALIASES), None);
    }

    #[test]
    fn test_candidate_order_beats_header_order() {
        // "description" appears first in the file, but "to" is the preferred alias.
        let headers = ["Description", "To"];
        let map = ColumnMap::resolve(&headers, &COMPOSED_ALIASES);
        assert_eq!(map.description, Some(1));

        // In direct mode "description" is preferred.
        let map = ColumnMap::resolve(&headers, &DIRECT_ALIASES);
        assert_eq!(map.description, Some(0));
    }

    #[test]
    fn test_composed_mode_resolves_source_and_payee() {
        let headers = ["Date", "To", "Amount", "category", "From", "Payee"];
        let map = ColumnMap::resolve(&headers, &COMPOSED_ALIASES);
        assert_eq!(map.date, Some(0));
        assert_eq!(map.description, Some(1));
        assert_eq!(map.amount, Some(2));
        assert_eq!(map.category, Some(3));
        assert_eq!(map.source, Some(4));
        assert_eq!(map.payee, Some(5));
        assert_eq!(map.notes, None);
        assert_eq!(map.kind, None);
        assert!(map.has_required());
    }

    #[test]
    fn test_direct_mode_has_no_composition_columns() {
        let headers = ["txn_date", "value", "from", "payee", "comment", "kind"];
        let map = ColumnMap::resolve(&headers, &DIRECT_ALIASES);
        assert_eq!(map.date, Some(0));
        assert_eq!(map.amount, Some(1));
        assert_eq!(map.source, None);
        assert_eq!(map.description, Some(3));
        assert_eq!(map.notes, Some(4));
        assert_eq!(map.kind, Some(5));
    }

    #[test]
    fn test_missing_required_columns() {
        let map = ColumnMap::resolve(&["Date", "Description"], &COMPOSED_ALIASES);
        assert!(!map.has_required());
        let map = ColumnMap::resolve(&["Total", "Memo"], &COMPOSED_ALIASES);
        assert!(!map.has_required());
    }

    #[test]
    fn test_description_mode_parsing() {
        assert_eq!("Composed".parse::<DescriptionMode>(), Ok(DescriptionMode::Composed));
        assert_eq!(" direct ".parse::<DescriptionMode>(), Ok(DescriptionMode::Direct));
        assert!("fuzzy".parse::<DescriptionMode>().is_err());
        assert_eq!(DescriptionMode::default().to_string(), "composed");
        assert_eq!(DescriptionMode::Direct.alias_table().mode, DescriptionMode::Direct);
    }
}
