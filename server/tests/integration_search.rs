use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;
use vitrine_core::persist::{save_index, IndexPaths};
use vitrine_core::{Document, SearchConfig, SearchIndex};
use vitrine_server::{router, AppState};

fn catalog() -> Vec<Document> {
    let mut red_chair = Document::new(1, "red chair");
    red_chair.price = 120.0;
    red_chair.category = "Decoração".into();
    let mut blue_chair = Document::new(2, "blue chair");
    blue_chair.price = 80.0;
    let red_table = Document::new(3, "red table");
    vec![red_chair, blue_chair, red_table]
}

fn write_index(dir: &std::path::Path, docs: Vec<Document>) {
    let index = SearchIndex::build(docs, SearchConfig::default()).unwrap();
    save_index(&IndexPaths::new(dir), &index, "2024-01-01T00:00:00Z").unwrap();
}

fn tiny_app() -> (TempDir, Router) {
    let dir = tempdir().unwrap();
    write_index(dir.path(), catalog());
    let app = vitrine_server::build_app(dir.path().to_string_lossy().to_string(), SearchConfig::default()).unwrap();
    (dir, app)
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Bytes) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    (status, body)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Bytes) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

#[tokio::test]
async fn search_returns_ranked_results() {
    let (_dir, app) = tiny_app();
    let (status, body) = get(app, "/search?q=red%20chair&k=3").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    let ids: Vec<u64> = json["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["product_id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids[0], 1);
    assert_eq!(ids.len(), 3);
    assert_eq!(json["returned"], 3);
    assert_eq!(json["results"][0]["category"], "Decoração");
}

#[tokio::test]
async fn predicates_come_from_query_parameters() {
    let (_dir, app) = tiny_app();
    let (status, body) = get(app, "/search?q=chair&price_max=100&colour=red").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["product_id"], 2);
}

#[tokio::test]
async fn malformed_predicate_is_bad_request() {
    let (_dir, app) = tiny_app();
    let (status, _) = get(app, "/search?q=chair&price_max=cheap").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn document_lookup_and_missing_document() {
    let (_dir, app) = tiny_app();
    let (status, body) = get(app.clone(), "/doc/3").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["title"], "red table");

    let (status, _) = get(app, "/doc/99").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stats_report_snapshot_shape() {
    let (_dir, app) = tiny_app();
    let (status, body) = get(app, "/stats").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["num_docs"], 3);
    assert_eq!(json["feature_count"], 2);
}

#[tokio::test]
async fn reload_requires_token_and_swaps_snapshot() {
    let dir = tempdir().unwrap();
    write_index(dir.path(), catalog());
    let index = vitrine_core::persist::load_index(&IndexPaths::new(dir.path()), SearchConfig::default()).unwrap();
    let state = AppState {
        index_dir: dir.path().to_path_buf(),
        config: SearchConfig::default(),
        snapshot: Arc::new(RwLock::new(Arc::new(index))),
        admin_token: Some("secret".into()),
    };
    let app = router(state.clone());

    let denied = Request::post("/index/reload").body(Body::empty()).unwrap();
    let (status, _) = send(app.clone(), denied).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut docs = catalog();
    docs.push(Document::new(4, "green lamp"));
    write_index(dir.path(), docs);

    let allowed = Request::post("/index/reload")
        .header("X-ADMIN-TOKEN", "secret")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app.clone(), allowed).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["num_docs"], 4);
    assert_eq!(state.current().document_count(), 4);

    let (_, body) = get(app, "/search?q=lamp").await;
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["results"][0]["product_id"], 4);
}
