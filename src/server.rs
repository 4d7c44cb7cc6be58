//! JSON HTTP API for search and cache administration.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/search` | Keyword search over the index |
//! | `POST` | `/api/recommendations` | Related-content ranking |
//! | `GET`  | `/api/cache/stats` | Cache introspection (never rebuilds) |
//! | `POST` | `/api/cache/prewarm` | Start a background rebuild, return immediately |
//! | `POST` | `/api/cache/clear` | Drop the cached generation |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Response Contract
//!
//! Every body carries a `success` flag. Successful search responses look
//! like:
//!
//! ```json
//! { "success": true, "results": [...], "totalResults": 2,
//!   "query": "rust", "timestamp": 1735689600000 }
//! ```
//!
//! and every failure, including the unknown-route fallback, like:
//!
//! ```json
//! { "success": false, "error": "query must be at least 2 characters" }
//! ```
//!
//! Status mapping: validation → 400, not found → 404, everything else →
//! 500 (including a source failure with no stale generation to fall back
//! on).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted; the API is consumed
//! directly by browser clients on other origins.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::cache::{HttpKvStore, IndexCache, KvStore, MemoryKvStore};
use crate::config::Config;
use crate::error::Error;
use crate::models::{CacheStats, SearchHit, SearchRequest};
use crate::service::SearchService;
use crate::store::HttpObjectStore;

/// The search service, or the startup error that prevented building it.
///
/// Missing credentials must not stop the server from binding; instead every
/// request is answered with the stored error until the operator fixes the
/// environment and restarts.
pub type ServiceSlot = Result<Arc<SearchService>, String>;

#[derive(Clone)]
struct AppState {
    slot: Arc<ServiceSlot>,
}

impl AppState {
    fn service(&self) -> Result<&Arc<SearchService>, AppError> {
        self.slot.as_ref().as_ref().map_err(|msg| AppError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.clone(),
        })
    }
}

/// Build the service from config, capturing construction failures into the
/// slot rather than propagating them.
pub fn build_service(config: &Config) -> ServiceSlot {
    let store = HttpObjectStore::from_config(&config.content).map_err(|e| e.to_string())?;

    let kv: Box<dyn KvStore> = match config.cache.backend.as_str() {
        "http" => Box::new(HttpKvStore::from_config(&config.cache).map_err(|e| e.to_string())?),
        _ => Box::new(MemoryKvStore::new()),
    };
    let cache = IndexCache::new(kv, std::time::Duration::from_secs(config.cache.ttl_secs));

    Ok(Arc::new(SearchService::new(
        Arc::new(store),
        cache,
        config.indexer.batch_size,
    )))
}

/// Assemble the router around an already-built (or failed) service slot.
pub fn build_router(slot: ServiceSlot) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/search", post(handle_search))
        .route("/api/recommendations", post(handle_recommendations))
        .route("/api/cache/stats", get(handle_cache_stats))
        .route("/api/cache/prewarm", post(handle_cache_prewarm))
        .route("/api/cache/clear", post(handle_cache_clear))
        .route("/health", get(handle_health))
        .fallback(handle_unknown_route)
        .layer(cors)
        .with_state(AppState {
            slot: Arc::new(slot),
        })
}

/// Start the HTTP server on `[server].bind` and run until terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let slot = build_service(config);

    match &slot {
        Ok(service) => service.prewarm(),
        Err(msg) => error!(error = %msg, "service unavailable, serving errors"),
    }

    let app = build_router(slot);
    info!(bind = %config.server.bind, "search API listening");

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

/// JSON failure body shared by all error paths.
#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

struct AppError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            error: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(category = err.category(), error = %err, "request failed");
        }
        Self {
            status,
            message: err.to_string(),
        }
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

// ============ POST /api/search, /api/recommendations ============

/// JSON response body for both search endpoints.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    success: bool,
    results: Vec<SearchHit>,
    total_results: usize,
    query: String,
    timestamp: i64,
}

impl SearchResponse {
    fn new(results: Vec<SearchHit>, query: String) -> Self {
        Self {
            success: true,
            total_results: results.len(),
            results,
            query,
            timestamp: now_millis(),
        }
    }
}

async fn handle_search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    let results = state.service()?.search(&request).await?;
    Ok(Json(SearchResponse::new(results, request.query)))
}

async fn handle_recommendations(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    let results = state.service()?.recommend(&request).await?;
    Ok(Json(SearchResponse::new(results, request.query)))
}

// ============ Cache administration ============

#[derive(Serialize)]
struct StatsResponse {
    success: bool,
    stats: CacheStats,
    timestamp: i64,
}

/// Handler for `GET /api/cache/stats`. Introspection only; never triggers
/// an index rebuild.
async fn handle_cache_stats(
    State(state): State<AppState>,
) -> Result<Json<StatsResponse>, AppError> {
    let stats = state.service()?.stats().await?;
    Ok(Json(StatsResponse {
        success: true,
        stats,
        timestamp: now_millis(),
    }))
}

#[derive(Serialize)]
struct MessageResponse {
    success: bool,
    message: String,
    timestamp: i64,
}

/// Handler for `POST /api/cache/prewarm`. The rebuild runs detached; this
/// returns before it finishes.
async fn handle_cache_prewarm(
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, AppError> {
    state.service()?.prewarm();
    Ok(Json(MessageResponse {
        success: true,
        message: "Cache prewarm started".to_string(),
        timestamp: now_millis(),
    }))
}

/// Handler for `POST /api/cache/clear`.
async fn handle_cache_clear(
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>, AppError> {
    state.service()?.invalidate().await?;
    Ok(Json(MessageResponse {
        success: true,
        message: "Cache cleared".to_string(),
        timestamp: now_millis(),
    }))
}

// ============ GET /health, fallback ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Any unknown route gets the standard failure envelope instead of an
/// empty 404.
async fn handle_unknown_route() -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        message: "Endpoint not found".to_string(),
    }
}
