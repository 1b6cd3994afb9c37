// Expense Tracker - Web Server
// REST API with Axum over the shared SQLite store

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use expense_tracker::api::{router, AppState};
use expense_tracker::{open_database, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::new().context("failed to load settings")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "expense_tracker={level},expense_server={level},tower_http={level}",
                level = settings.log.level
            ))
        }))
        .init();

    // Schema setup happens once, here
    let conn = open_database(&settings.database.path)
        .with_context(|| format!("failed to open database {}", settings.database.path.display()))?;

    let app = router(AppState::new(conn, settings.import.clone()));

    let addr = settings.server.address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(
        %addr,
        version = expense_tracker::VERSION,
        mode = %settings.import.description_mode,
        "🚀 expense tracker API listening"
    );

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
