// 🔑 Fingerprint Generator - content hash used as the dedup key
//
// sha256("date|amount|description|type") as lowercase hex. The description
// is trimmed and lower-cased first, so "Coffee Shop" and " coffee shop "
// collide on purpose.

use sha2::{Digest, Sha256};

use crate::parser::ParsedRow;

/// Render an amount the same way regardless of how it was written upstream.
///
/// Shortest decimal that round-trips the `f64`: `100`, `100.0` and
/// `"100.00"` all become `100`; `12.5` stays `12.5`. Negative zero is `0`.
pub fn canonical_amount(amount: f64) -> String {
    if amount == 0.0 {
        return "0".to_string();
    }
    format!("{}", amount)
}

/// The exact string that gets hashed.
pub fn canonical_string(date: &str, amount: f64, description: &str, kind: &str) -> String {
    format!(
        "{}|{}|{}|{}",
        date,
        canonical_amount(amount),
        description.trim().to_lowercase(),
        kind.to_lowercase()
    )
}

pub fn fingerprint(date: &str, amount: f64, description: &str, kind: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_string(date, amount, description, kind));
    format!("{:x}", hasher.finalize())
}

impl ParsedRow {
    pub fn fingerprint(&self) -> String {
        fingerprint(&self.date, self.amount, &self.description, self.kind.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::TransactionType;

    #[test]
    fn test_fingerprint_is_sha256_hex() {
        let fp = fingerprint("2026-01-02", 100.0, "Coffee Shop", "expense");
        assert_eq!(fp.len(), 64, "SHA-256 hash should be 64 hex characters");
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let a = fingerprint("2026-01-02", 100.0, "Coffee Shop", "expense");
        let b = fingerprint("2026-01-02", 100.0, "Coffee Shop", "expense");
        assert_eq!(a, b, "Same input should produce same hash");
    }

    #[test]
    fn test_known_digest() {
        // sha256("2026-01-02|100|coffee shop|expense")
        assert_eq!(
            canonical_string("2026-01-02", 100.0, "  Coffee Shop ", "EXPENSE"),
            "2026-01-02|100|coffee shop|expense"
        );
        let mut hasher = Sha256::new();
        hasher.update("2026-01-02|100|coffee shop|expense");
        let expected = format!("{:x}", hasher.finalize());
        assert_eq!(fingerprint("2026-01-02", 100.0, "Coffee Shop", "expense"), expected);
    }

    #[test]
    fn test_description_case_and_whitespace_do_not_matter() {
        let base = fingerprint("2026-01-02", 100.0, "Coffee Shop", "expense");
        assert_eq!(base, fingerprint("2026-01-02", 100.0, "coffee shop", "expense"));
        assert_eq!(base, fingerprint("2026-01-02", 100.0, "  COFFEE SHOP\t", "expense"));
        assert_eq!(base, fingerprint("2026-01-02", 100.0, "Coffee Shop", "Expense"));
    }

    #[test]
    fn test_each_field_changes_the_fingerprint() {
        let base = fingerprint("2026-01-02", 100.0, "Coffee Shop", "expense");
        assert_ne!(base, fingerprint("2026-01-03", 100.0, "Coffee Shop", "expense"));
        assert_ne!(base, fingerprint("2026-01-02", 100.5, "Coffee Shop", "expense"));
        assert_ne!(base, fingerprint("2026-01-02", 100.0, "Coffee Shops", "expense"));
        assert_ne!(base, fingerprint("2026-01-02", 100.0, "Coffee Shop", "income"));
    }

    #[test]
    fn test_canonical_amount() {
        assert_eq!(canonical_amount(100.0), "100");
        assert_eq!(canonical_amount("100.00".parse().unwrap()), "100");
        assert_eq!(canonical_amount(12.5), "12.5");
        assert_eq!(canonical_amount(1234.56), "1234.56");
        assert_eq!(canonical_amount(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(canonical_amount(-0.0), "0");
        assert_eq!(canonical_amount(0.0), "0");
    }

    #[test]
    fn test_parsed_row_fingerprint_matches_free_function() {
        let row = ParsedRow {
            date: "2026-02-01".to_string(),
            amount: 100.0,
            category: "Food".to_string(),
            description: "Coffee Shop".to_string(),
            notes: "ignored".to_string(),
            kind: TransactionType::Expense,
        };
        assert_eq!(
            row.fingerprint(),
            fingerprint("2026-02-01", 100.0, "coffee shop", "expense")
        );
    }
}
