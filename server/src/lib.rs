use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use parking_lot::RwLock;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use vitrine_core::filter::parse_predicates;
use vitrine_core::persist::{load_index, IndexPaths};
use vitrine_core::{Document, Error, Predicate, ProductId, SearchConfig, SearchIndex};

/// Upper bound on `k` for a single request.
pub const MAX_K: usize = 100;
pub const ADMIN_HEADER: &str = "x-admin-token";

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_ms: u128,
    pub took_s: f64,
    pub returned: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub product_id: ProductId,
    pub score: f32,
    pub title: Option<String>,
    pub category: String,
    pub price: f64,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub num_docs: usize,
    pub vocabulary_size: usize,
    pub feature_count: usize,
}

#[derive(Clone)]
pub struct AppState {
    pub index_dir: PathBuf,
    pub config: SearchConfig,
    /// Current snapshot. Readers clone the inner `Arc`; reload swaps it whole.
    pub snapshot: Arc<RwLock<Arc<SearchIndex>>>,
    pub admin_token: Option<String>,
}

impl AppState {
    pub fn current(&self) -> Arc<SearchIndex> {
        self.snapshot.read().clone()
    }
}

#[derive(Debug)]
pub enum ApiError {
    Core(Error),
    BadRequest(String),
    Unauthorized(&'static str),
    Internal(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self { ApiError::Core(err) }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Core(Error::InvalidInput(_)) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Core(Error::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Core(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Core(err) => err.to_string(),
            ApiError::BadRequest(msg) | ApiError::Internal(msg) => msg,
            ApiError::Unauthorized(msg) => msg.to_string(),
        };
        (status, message).into_response()
    }
}

pub fn build_app(index_dir: String, config: SearchConfig) -> Result<Router> {
    let paths = IndexPaths::new(&index_dir);
    let index = load_index(&paths, config.clone())?;
    let state = AppState {
        index_dir: PathBuf::from(&index_dir),
        config,
        snapshot: Arc::new(RwLock::new(Arc::new(index))),
        admin_token: std::env::var("ADMIN_TOKEN").ok(),
    };
    Ok(router(state))
}

pub fn router(state: AppState) -> Router {
    // CORS_ALLOW_ORIGIN is comma-separated; unset or unparsable means any origin.
    let origins: Vec<_> = std::env::var("CORS_ALLOW_ORIGIN")
        .map(|val| val.split(',').filter_map(|s| s.trim().parse().ok()).collect())
        .unwrap_or_default();
    let allow = if origins.is_empty() { AllowOrigin::any() } else { AllowOrigin::list(origins) };
    let cors = CorsLayer::new().allow_origin(allow).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/stats", get(stats_handler))
        .route("/search", get(search_handler))
        .route("/doc/:product_id", get(doc_handler))
        .route("/index/reload", post(reload_handler))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// `q` is the query text and `k` the result limit; every other parameter is a
/// predicate, applied in the order it appears.
pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let mut query = String::new();
    let mut k = state.config.default_limit;
    let mut predicates = Vec::new();
    for (key, value) in params {
        match key.as_str() {
            "q" => query = value,
            "k" => {
                k = value
                    .parse()
                    .map_err(|_| ApiError::BadRequest(format!("k: cannot parse {value:?}")))?
            }
            _ => predicates.push((key, value)),
        }
    }
    let predicates = parse_predicates(predicates)?;
    let k = k.clamp(1, MAX_K);

    let index = state.current();
    let text = query.clone();
    let results = tokio::task::spawn_blocking(move || ranked_hits(&index, &text, k, &predicates))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let elapsed = start.elapsed();
    Ok(Json(SearchResponse {
        query,
        took_ms: elapsed.as_millis(),
        took_s: elapsed.as_secs_f64(),
        returned: results.len(),
        results,
    }))
}

fn ranked_hits(index: &SearchIndex, query: &str, k: usize, predicates: &[Predicate]) -> Vec<SearchHit> {
    index
        .search_scored(query, k, predicates)
        .into_iter()
        .filter_map(|hit| {
            let doc = index.document(hit.product_id).ok()?;
            Some(SearchHit {
                product_id: hit.product_id,
                score: hit.score,
                title: doc.title.clone(),
                category: doc.category.clone(),
                price: doc.price,
            })
        })
        .collect()
}

pub async fn doc_handler(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<Json<Document>, ApiError> {
    let index = state.current();
    let doc = index.document(product_id)?;
    Ok(Json(doc.clone()))
}

pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let index = state.current();
    Json(StatsResponse {
        num_docs: index.document_count(),
        vocabulary_size: index.vocabulary_size(),
        feature_count: index.feature_count(),
    })
}

/// Re-read the index directory and swap the snapshot. In-flight searches keep
/// the snapshot they started with.
async fn reload_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<StatsResponse>, ApiError> {
    authorize(&state, &headers)?;
    let dir = state.index_dir.clone();
    let config = state.config.clone();
    let loaded = tokio::task::spawn_blocking(move || load_index(&IndexPaths::new(dir), config))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    let stats = StatsResponse {
        num_docs: loaded.document_count(),
        vocabulary_size: loaded.vocabulary_size(),
        feature_count: loaded.feature_count(),
    };
    *state.snapshot.write() = Arc::new(loaded);
    tracing::info!(num_docs = stats.num_docs, "index reloaded");
    Ok(Json(stats))
}

/// Admin routes stay closed unless `ADMIN_TOKEN` is configured and the request
/// carries the same value in [`ADMIN_HEADER`].
fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(required) = state.admin_token.as_deref() else {
        tracing::warn!("admin request refused: ADMIN_TOKEN is not set");
        return Err(ApiError::Unauthorized("ADMIN_TOKEN not set"));
    };
    match headers.get(ADMIN_HEADER).and_then(|v| v.to_str().ok()) {
        Some(given) if given == required => Ok(()),
        _ => Err(ApiError::Unauthorized("invalid admin token")),
    }
}
