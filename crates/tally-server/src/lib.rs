//! Tally Web Server
//!
//! Axum-based REST API for statement upload, transaction browsing and
//! category rule management.
//!
//! - All routes live under `/api` and speak JSON
//! - Uploads are capped at `MAX_UPLOAD_SIZE`
//! - Error responses carry a sanitized `{"error": ...}` body

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use tally_core::db::Database;

mod handlers;

/// Maximum file upload size (16 MB)
pub const MAX_UPLOAD_SIZE: usize = 16 * 1024 * 1024;

/// Maximum size of a JSON request body
pub(crate) const MAX_JSON_BODY: usize = 64 * 1024;

/// Server configuration
#[derive(Clone, Default)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = any origin)
    pub allowed_origins: Vec<String>,
    /// Directory of a built front end to serve next to the API
    pub static_dir: Option<PathBuf>,
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub config: ServerConfig,
}

/// Create the application router
pub fn create_router(db: Database, config: ServerConfig) -> Router {
    let static_dir = config.static_dir.clone();
    let cors = cors_layer(&config.allowed_origins);
    let state = Arc::new(AppState { db, config });

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        // Statement upload; the multipart body may exceed axum's default limit
        .route(
            "/upload-csv",
            post(handlers::upload_csv).layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE + 64 * 1024)),
        )
        // Transactions
        .route("/transactions", get(handlers::list_transactions))
        .route(
            "/transactions/:id/manual-category",
            put(handlers::set_manual_category),
        )
        // Category rules
        .route(
            "/category-rules",
            get(handlers::list_rules).post(handlers::create_rule),
        )
        .route(
            "/category-rules/:id",
            put(handlers::update_rule).delete(handlers::delete_rule),
        )
        // Maintenance
        .route("/recategorize-all", post(handlers::recategorize_all))
        .route("/clear-database", axum::routing::delete(handlers::clear_database))
        .route("/stats", get(handlers::get_stats));

    let mut app = Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ));

    // Static front end with SPA fallback to index.html
    if let Some(dir) = static_dir {
        let index = dir.join("index.html");
        app = app.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(index)));
    }

    app
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE]);

    if allowed_origins.is_empty() {
        return base.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();
    base.allow_origin(origins)
}

/// Start the server with default configuration
pub async fn serve(db: Database, host: &str, port: u16) -> anyhow::Result<()> {
    serve_with_config(db, host, port, ServerConfig::default()).await
}

/// Start the server with custom configuration
pub async fn serve_with_config(
    db: Database,
    host: &str,
    port: u16,
    config: ServerConfig,
) -> anyhow::Result<()> {
    if config.allowed_origins.is_empty() {
        warn!("No CORS origins configured; accepting requests from any origin");
    }

    let app = create_router(db, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            internal: None,
        }
    }

    /// Map a core error onto a status code
    ///
    /// Validation and lookup failures carry their message to the client;
    /// everything else becomes a generic 500.
    pub fn from_core(err: tally_core::Error) -> Self {
        match err {
            tally_core::Error::NotFound(msg) => Self::not_found(&msg),
            tally_core::Error::InvalidData(msg) | tally_core::Error::Import(msg) => {
                Self::bad_request(&msg)
            }
            tally_core::Error::Csv(e) => Self::bad_request(&format!("Invalid CSV: {}", e)),
            other => other.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "An internal error occurred".to_string(),
            internal: Some(err),
        }
    }
}

#[cfg(test)]
mod tests;
