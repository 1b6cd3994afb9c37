// 🌐 HTTP API - JSON surface over the import pipeline and reports
// Mounted under /api by the `expense-server` binary.

use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use rusqlite::Connection;
use serde::Serialize;
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::db;
use crate::error::TrackerError;
use crate::filter::{FilterParams, TransactionFilter};
use crate::ingest::{import_csv, IngestSummary};
use crate::reports::{self, CategoryTotal, Summary, TimeSeriesPoint};
use crate::settings::ImportSettings;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub import: ImportSettings,
}

impl AppState {
    pub fn new(conn: Connection, import: ImportSettings) -> Self {
        AppState {
            db: Arc::new(Mutex::new(conn)),
            import,
        }
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, ApiError> {
        self.db
            .lock()
            .map_err(|_| ApiError::internal("database lock poisoned"))
    }
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    /// Keeps the status axum assigns, e.g. 413 past the body limit.
    fn from_multipart(err: MultipartError) -> Self {
        ApiError {
            status: err.status(),
            message: err.body_text(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<TrackerError> for ApiError {
    fn from(err: TrackerError) -> Self {
        let status = match &err {
            TrackerError::NotFound(_) => StatusCode::NOT_FOUND,
            e if e.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.message, "request failed");
        }
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// ============================================================================
// HANDLERS
// ============================================================================

/// GET /api/health
async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// POST /api/transactions/upload - multipart field `file`
async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<IngestSummary> {
    const NO_FILE: &str = "No file uploaded. Field name must be \"file\".";

    let mut multipart = multipart.map_err(|_| ApiError::bad_request(NO_FILE))?;
    let mut bytes = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(ApiError::from_multipart)?
    {
        if field.name() == Some("file") {
            let data = field
                .bytes()
                .await
                .map_err(ApiError::from_multipart)?;
            bytes = Some(data);
            break;
        }
    }
    let bytes = bytes.ok_or_else(|| ApiError::bad_request(NO_FILE))?;
    tracing::info!(size = bytes.len(), "received upload");

    let options = state.import.options();
    let db = state.db.clone();
    let summary = tokio::task::spawn_blocking(move || {
        let mut conn = db
            .lock()
            .map_err(|_| ApiError::internal("database lock poisoned"))?;
        import_csv(&mut conn, &bytes, &options).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::internal(format!("import task failed: {e}")))??;

    Ok(Json(summary))
}

/// GET /api/transactions
async fn list(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> ApiResult<Vec<db::Transaction>> {
    let filter = TransactionFilter::try_from(params)?;
    let conn = state.conn()?;
    Ok(Json(db::list_transactions(&conn, &filter)?))
}

/// GET /api/transactions/summary
async fn summary(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> ApiResult<Summary> {
    let filter = TransactionFilter::try_from(params)?;
    let conn = state.conn()?;
    Ok(Json(reports::summary(&conn, &filter)?))
}

/// GET /api/transactions/by-category
async fn by_category(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> ApiResult<Vec<CategoryTotal>> {
    let filter = TransactionFilter::try_from(params)?;
    let conn = state.conn()?;
    Ok(Json(reports::by_category(&conn, &filter)?))
}

/// GET /api/transactions/over-time
async fn over_time(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> ApiResult<Vec<TimeSeriesPoint>> {
    let filter = TransactionFilter::try_from(params)?;
    let conn = state.conn()?;
    Ok(Json(reports::over_time(&conn, &filter)?))
}

async fn months(State(state): State<AppState>) -> ApiResult<Vec<String>> {
    let conn = state.conn()?;
    Ok(Json(reports::months(&conn)?))
}

async fn categories(State(state): State<AppState>) -> ApiResult<Vec<String>> {
    let conn = state.conn()?;
    Ok(Json(reports::categories(&conn)?))
}

/// DELETE /api/transactions/:id
async fn delete_one(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<serde_json::Value> {
    let conn = state.conn()?;
    db::delete_transaction(&conn, id)?;
    Ok(Json(json!({ "success": true })))
}

/// DELETE /api/transactions - clear everything
async fn reset(State(state): State<AppState>) -> ApiResult<serde_json::Value> {
    let conn = state.conn()?;
    db::delete_all_transactions(&conn)?;
    Ok(Json(json!({
        "success": true,
        "message": "All transactions cleared",
    })))
}

// ============================================================================
// ROUTER
// ============================================================================

/// The `/api` router with CORS, request tracing and the upload size cap.
pub fn router(state: AppState) -> Router {
    let max_upload = state.import.max_upload_bytes;

    let api_routes = Router::new()
        .route("/health", get(health))
        .route("/transactions", get(list).delete(reset))
        .route("/transactions/upload", post(upload))
        .route("/transactions/summary", get(summary))
        .route("/transactions/by-category", get(by_category))
        .route("/transactions/over-time", get(over_time))
        .route("/transactions/months", get(months))
        .route("/transactions/categories", get(categories))
        .route("/transactions/:id", delete(delete_one))
        .with_state(state);

    Router::new().nest("/api", api_routes).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .layer(DefaultBodyLimit::max(max_upload)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    const BOUNDARY: &str = "XTRACKERBOUNDARY";

    fn app() -> (Router, AppState) {
        let state = AppState::new(db::open_in_memory().unwrap(), ImportSettings::default());
        (router(state.clone()), state)
    }

    fn upload_request(field: &str, csv: &str) -> Request<Body> {
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"upload.csv\"\r\n\
             Content-Type: text/csv\r\n\r\n\
             {csv}\r\n\
             --{BOUNDARY}--\r\n"
        );
        Request::builder()
            .method("POST")
            .uri("/api/transactions/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn delete_request(uri: &str) -> Request<Body> {
        Request::builder()
            .method("DELETE")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    const SAMPLE: &str = "Date,Amount,category,To,Type\n\
        01/02/2026,100,food,Coffee Shop,expense\n\
        01/02/2026,100,Food,coffee shop,expense\n\
        05/02/2026,5000,salary,ACME,credit\n\
        10/03/2026,40,transport,Metro,\n";

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app();
        let (status, body) = send(&app, get_request("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_upload_returns_tally_and_is_idempotent() {
        let (app, _) = app();
        let (status, body) = send(&app, upload_request("file", SAMPLE)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rowsProcessed"], 4);
        assert_eq!(body["rowsInserted"], 3);
        assert_eq!(body["duplicatesSkipped"], 1);

        let (status, body) = send(&app, upload_request("file", SAMPLE)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rowsInserted"], 0);
        assert_eq!(body["duplicatesSkipped"], 4);
    }

    #[tokio::test]
    async fn test_upload_without_file_is_bad_request() {
        let (app, _) = app();
        let (status, body) = send(&app, upload_request("attachment", SAMPLE)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("No file uploaded"));

        let not_multipart = Request::builder()
            .method("POST")
            .uri("/api/transactions/upload")
            .body(Body::from("Date,Amount\n"))
            .unwrap();
        let (status, _) = send(&app, not_multipart).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_oversized_upload_is_payload_too_large() {
        let import = ImportSettings {
            max_upload_bytes: 64,
            ..ImportSettings::default()
        };
        let state = AppState::new(db::open_in_memory().unwrap(), import);
        let app = router(state.clone());

        let (status, body) = send(&app, upload_request("file", SAMPLE)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert!(body["error"].is_string());
        assert_eq!(db::count_transactions(&state.db.lock().unwrap()).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_upload_missing_columns_is_bad_request() {
        let (app, _) = app();
        let (status, body) = send(&app, upload_request("file", "When,Cost\n2026-01-01,5\n")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let message = body["error"].as_str().unwrap();
        assert!(message.contains("\"Date\" and \"Amount\""));
        assert!(message.contains("When, Cost"));
    }

    #[tokio::test]
    async fn test_storage_failure_is_server_error_and_rolls_back() {
        let (app, state) = app();
        state
            .db
            .lock()
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER reject_metro BEFORE INSERT ON transactions
                 WHEN NEW.description = 'Metro'
                 BEGIN SELECT RAISE(ABORT, 'rejected row'); END;",
            )
            .unwrap();

        let (status, body) = send(&app, upload_request("file", SAMPLE)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].is_string());

        let (_, listed) = send(&app, get_request("/api/transactions")).await;
        assert_eq!(listed.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_listing_and_reports_with_filters() {
        let (app, _) = app();
        send(&app, upload_request("file", SAMPLE)).await;

        let (status, listed) = send(&app, get_request("/api/transactions?month=2026-02")).await;
        assert_eq!(status, StatusCode::OK);
        let listed = listed.as_array().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0]["date"], "2026-02-05");
        assert_eq!(listed[0]["type"], "income");
        assert_eq!(listed[0]["category"], "Salary");

        let (_, summary) = send(&app, get_request("/api/transactions/summary")).await;
        assert_eq!(summary["totalIncome"], 5000.0);
        assert_eq!(summary["totalExpenses"], 140.0);
        assert_eq!(summary["balance"], 4860.0);

        let (_, by_cat) = send(
            &app,
            get_request("/api/transactions/by-category?type=expense&categories=Food,Transport"),
        )
        .await;
        let by_cat = by_cat.as_array().unwrap();
        assert_eq!(by_cat.len(), 2);
        assert_eq!(by_cat[0]["category"], "Food");

        let (_, series) = send(&app, get_request("/api/transactions/over-time?type=all")).await;
        assert_eq!(series.as_array().unwrap().len(), 3);

        let (_, months) = send(&app, get_request("/api/transactions/months")).await;
        assert_eq!(months, json!(["2026-03", "2026-02"]));

        let (_, categories) = send(&app, get_request("/api/transactions/categories")).await;
        assert_eq!(categories, json!(["Food", "Salary", "Transport"]));

        let (_, found) = send(&app, get_request("/api/transactions?search=coffee")).await;
        assert_eq!(found.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_filter_is_bad_request() {
        let (app, _) = app();
        let (status, body) = send(&app, get_request("/api/transactions?type=transfer")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("transfer"));
    }

    #[tokio::test]
    async fn test_delete_and_reset() {
        let (app, _) = app();
        send(&app, upload_request("file", SAMPLE)).await;

        let (_, listed) = send(&app, get_request("/api/transactions")).await;
        let id = listed[0]["id"].as_i64().unwrap();

        let (status, body) = send(&app, delete_request(&format!("/api/transactions/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let (status, body) = send(&app, delete_request(&format!("/api/transactions/{id}"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].is_string());

        let (status, body) = send(&app, delete_request("/api/transactions")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "All transactions cleared");

        let (_, listed) = send(&app, get_request("/api/transactions")).await;
        assert_eq!(listed, json!([]));
    }
}
