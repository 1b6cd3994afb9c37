use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use expense_tracker::{
    count_transactions, delete_all_transactions, import_csv, open_database, reports, DescriptionMode,
    Settings, TransactionFilter,
};

#[derive(Parser, Debug)]
#[command(name = "expense-tracker", version, about = "Import bank CSV exports and summarize spending")]
struct Cli {
    /// SQLite database file (overrides database.path from settings)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import a CSV file; rows already stored are skipped
    Import {
        file: PathBuf,

        /// How description and notes are built: composed or direct
        #[arg(long)]
        mode: Option<DescriptionMode>,
    },

    /// Print income, expenses and the category breakdown
    Summary {
        /// Restrict to one month (YYYY-MM)
        #[arg(long)]
        month: Option<String>,
    },

    /// Delete every stored transaction
    Reset,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::new().context("failed to load settings")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("expense_tracker={}", settings.log.level))),
        )
        .with_writer(std::io::stderr)
        .init();

    let db_path = cli.db.unwrap_or_else(|| settings.database.path.clone());
    let mut conn = open_database(&db_path)
        .with_context(|| format!("failed to open database {}", db_path.display()))?;

    match cli.command {
        Command::Import { file, mode } => {
            let bytes = std::fs::read(&file).with_context(|| format!("failed to read {}", file.display()))?;
            let mut options = settings.import.options();
            if let Some(mode) = mode {
                options.mode = mode;
            }

            println!("📂 Importing {}", file.display());
            let summary = import_csv(&mut conn, &bytes, &options)
                .with_context(|| format!("import of {} failed", file.display()))?;

            println!("✓ Rows processed:     {}", summary.rows_processed);
            println!("✓ Rows inserted:      {}", summary.rows_inserted);
            println!("✓ Duplicates skipped: {}", summary.duplicates_skipped);
            println!("🗄️  Database now holds {} transactions", count_transactions(&conn)?);
        }
        Command::Summary { month } => {
            let filter = match month.as_deref() {
                Some(month) => TransactionFilter::default().month(month)?,
                None => TransactionFilter::default(),
            };

            let totals = reports::summary(&conn, &filter)?;
            println!("📊 Summary{}", month.map(|m| format!(" for {m}")).unwrap_or_default());
            println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
            println!("Income:   {:>12.2}", totals.total_income);
            println!("Expenses: {:>12.2}", totals.total_expenses);
            println!("Balance:  {:>12.2}", totals.balance);

            let breakdown = reports::by_category(&conn, &filter)?;
            if !breakdown.is_empty() {
                println!("\nBy category:");
                for row in breakdown {
                    println!("  {:<24} {:<8} {:>12.2}", row.category, row.kind.as_str(), row.total);
                }
            }
        }
        Command::Reset => {
            let deleted = delete_all_transactions(&conn)?;
            println!("🗑️  Deleted {deleted} transactions");
        }
    }

    Ok(())
}
