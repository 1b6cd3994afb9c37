// Expense Tracker - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod error;
pub mod normalize;      // Field Normalizers
pub mod columns;        // Column Resolver
pub mod parser;         // Row Parser
pub mod fingerprint;    // Fingerprint Generator
pub mod ingest;         // Ingestion Coordinator
pub mod db;
pub mod filter;
pub mod reports;
pub mod settings;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use error::{Result, TrackerError};
pub use columns::{ColumnMap, DescriptionMode};
pub use parser::{parse_csv, parse_csv_bytes, ParsedRow, TransactionType};
pub use fingerprint::fingerprint;
pub use ingest::{import_csv, ingest, ingest_with_deadline, ImportOptions, IngestSummary};
pub use db::{
    Transaction,
    open_database, open_in_memory, setup_database,
    list_transactions, get_transaction, count_transactions,
    delete_transaction, delete_all_transactions,
};
pub use filter::{FilterParams, TransactionFilter};
pub use reports::{CategoryTotal, Summary, TimeSeriesPoint};
pub use settings::Settings;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
