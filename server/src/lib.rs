use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use boolret_core::index::BuildStats;
use boolret_core::persist::DocStore;
use boolret_core::{Grammar, QueryOptions, Searcher, TermResolution, DEFAULT_MAX_RESULTS};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
    pub grammar: Option<Grammar>,
    pub terms: Option<TermResolution>,
}
fn default_k() -> usize { DEFAULT_MAX_RESULTS }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: BuildStats,
    pub options: QueryOptions,
}

pub struct ServerConfig {
    pub store_dir: PathBuf,
    pub options: QueryOptions,
    pub admin_token: Option<String>,
    /// Empty means any origin.
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    /// Reads `ADMIN_TOKEN` and comma-separated `CORS_ALLOW_ORIGIN` from the environment.
    pub fn from_env(store_dir: impl Into<PathBuf>, options: QueryOptions) -> Self {
        let cors_origins = std::env::var("CORS_ALLOW_ORIGIN")
            .map(|val| val.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();
        Self { store_dir: store_dir.into(), options, admin_token: std::env::var("ADMIN_TOKEN").ok(), cors_origins }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store_dir: PathBuf,
    pub options: QueryOptions,
    /// Swapped wholesale on reload; readers clone the inner `Arc` and drop the lock.
    pub searcher: Arc<RwLock<Arc<Searcher>>>,
    pub admin_token: Option<String>,
}

impl AppState {
    fn current(&self) -> Arc<Searcher> { self.searcher.read().clone() }
}

/// Open the store and build a fresh in-memory index from it.
pub fn load_searcher(store_dir: &FsPath, options: QueryOptions) -> Result<Searcher> {
    let store = DocStore::open(store_dir).with_context(|| format!("opening document store {}", store_dir.display()))?;
    Ok(Searcher::from_source(&store, store.analyzer(), options))
}

pub fn build_app(config: ServerConfig) -> Result<Router> {
    let searcher = load_searcher(&config.store_dir, config.options)?;
    let app_state = AppState {
        store_dir: config.store_dir,
        options: config.options,
        searcher: Arc::new(RwLock::new(Arc::new(searcher))),
        admin_token: config.admin_token,
    };

    let origins: Vec<_> = config.cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
    let cors = if origins.is_empty() {
        CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
    } else {
        CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/stats", get(stats_handler))
        .route("/index/reload", post(reload_handler))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);
    Ok(app)
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Json<SearchResponse> {
    let start = std::time::Instant::now();
    let searcher = state.current();
    let options = QueryOptions {
        grammar: params.grammar.unwrap_or(state.options.grammar),
        terms: params.terms.unwrap_or(state.options.terms),
    };
    let (total_hits, results, error) = match searcher.hits(&params.q, params.k, options) {
        Ok(hits) => (hits.total, hits.results, None),
        Err(e) => {
            tracing::debug!(query = %params.q, error = %e, "malformed query");
            (0, Vec::new(), Some(e.to_string()))
        }
    };
    let elapsed = start.elapsed();
    Json(SearchResponse { query: params.q, took_s: elapsed.as_secs_f64(), total_hits, results, error })
}

pub async fn doc_handler(State(state): State<AppState>, Path(doc_id): Path<String>) -> (StatusCode, Json<serde_json::Value>) {
    let searcher = state.current();
    match searcher.document(&doc_id) {
        Some(contents) => (StatusCode::OK, Json(serde_json::json!({ "doc_id": doc_id, "contents": contents }))),
        None => (StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": "not found" }))),
    }
}

pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse { stats: state.current().stats(), options: state.options })
}

async fn reload_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<StatsResponse>, (StatusCode, String)> {
    authorize(&state, &headers)?;
    let dir = state.store_dir.clone();
    let options = state.options;
    let rebuilt = tokio::task::spawn_blocking(move || load_searcher(&dir, options))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(|e| {
            tracing::error!(error = %format!("{e:#}"), "reload failed; keeping current index");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}"))
        })?;
    let stats = rebuilt.stats();
    *state.searcher.write() = Arc::new(rebuilt);
    tracing::info!(documents = stats.documents, terms = stats.terms, "index reloaded");
    Ok(Json(StatsResponse { stats, options }))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), (StatusCode, String)> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}
