pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::resumes::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/resumes", post(handlers::handle_create))
        .route(
            "/api/v1/resumes/:id",
            get(handlers::handle_get).patch(handlers::handle_save),
        )
        .route("/api/v1/resumes/:id/export", get(handlers::handle_export))
        .route("/api/v1/resumes/:id/match", post(handlers::handle_match))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{json, Value};

    use super::*;
    use crate::config::Config;
    use crate::markdown::to_markdown;
    use crate::models::resume::fixtures::sample_document;
    use crate::store::MemoryStore;

    fn server_with(config: Config) -> TestServer {
        let state = AppState {
            store: Arc::new(MemoryStore::new()),
            config,
        };
        TestServer::new(build_router(state)).unwrap()
    }

    fn server() -> TestServer {
        server_with(Config::default())
    }

    async fn create(server: &TestServer) -> Value {
        let response = server
            .post("/api/v1/resumes")
            .json(&json!({ "title": "Backend Roles", "document": sample_document() }))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
        response.json()
    }

    #[tokio::test]
    async fn test_health() {
        let response = server().get("/health").await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_create_and_fetch() {
        let server = server();
        let created = create(&server).await;
        assert_eq!(created["revision"], "v1");

        let id = created["id"].as_str().unwrap();
        let fetched: Value = server.get(&format!("/api/v1/resumes/{id}")).await.json();
        assert_eq!(fetched["document"]["contact"]["name"], "Ada Lovelace");
    }

    #[tokio::test]
    async fn test_create_from_markdown() {
        let server = server();
        let response = server
            .post("/api/v1/resumes")
            .json(&json!({ "title": "From markdown", "markdown": to_markdown(&sample_document()) }))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["document"]["skills"][0]["items"], json!(["Rust", "SQL"]));
    }

    #[tokio::test]
    async fn test_unparseable_markdown_is_422() {
        let response = server()
            .post("/api/v1/resumes")
            .json(&json!({ "title": "Bad", "markdown": "## Hobbies\n- chess" }))
            .await;
        assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        assert_eq!(body["error"]["code"], "UNPROCESSABLE_ENTITY");
    }

    #[tokio::test]
    async fn test_blank_title_is_rejected() {
        let response = server()
            .post("/api/v1/resumes")
            .json(&json!({ "title": "  " }))
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_save_then_stale_save_conflicts() {
        let server = server();
        let created = create(&server).await;
        let path = format!("/api/v1/resumes/{}", created["id"].as_str().unwrap());

        let first = server
            .patch(&path)
            .json(&json!({ "document": sample_document(), "revision": "v1", "match_score": 72.0 }))
            .await;
        assert_eq!(first.status_code(), StatusCode::OK);
        let ack: Value = first.json();
        assert_eq!(ack["revision"], "v2");

        let stale = server
            .patch(&path)
            .json(&json!({ "document": sample_document(), "revision": "v1" }))
            .await;
        assert_eq!(stale.status_code(), StatusCode::CONFLICT);
        let body: Value = stale.json();
        assert_eq!(body["error"]["code"], "CONFLICT");
        assert_eq!(body["current_revision"], "v2");

        let fetched: Value = server.get(&path).await.json();
        assert_eq!(fetched["match_score"], 72.0);
    }

    #[tokio::test]
    async fn test_unknown_resume_is_404() {
        let response = server()
            .get(&format!("/api/v1/resumes/{}", uuid::Uuid::new_v4()))
            .await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_oversized_document_is_413() {
        let server = server_with(Config {
            max_document_bytes: 64,
            ..Config::default()
        });
        let response = server
            .post("/api/v1/resumes")
            .json(&json!({ "title": "Big", "document": sample_document() }))
            .await;
        assert_eq!(response.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_export_formats() {
        let server = server();
        let created = create(&server).await;
        let base = format!("/api/v1/resumes/{}/export", created["id"].as_str().unwrap());

        let html = server.get(&base).await;
        assert_eq!(html.status_code(), StatusCode::OK);
        html.assert_header("content-type", "text/html; charset=utf-8");
        html.assert_header(
            "content-disposition",
            "attachment; filename=\"backend-roles.html\"",
        );
        assert!(html.text().contains("Ada Lovelace"));

        let text = server
            .get(&format!("{base}?format=text&layout=compact"))
            .await;
        assert!(text.text().starts_with("ADA LOVELACE\n"));

        let docx = server.get(&format!("{base}?format=docx")).await;
        assert_eq!(docx.status_code(), StatusCode::NOT_IMPLEMENTED);
    }

    #[tokio::test]
    async fn test_match_report() {
        let server = server();
        let created = create(&server).await;
        let response = server
            .post(&format!("/api/v1/resumes/{}/match", created["id"].as_str().unwrap()))
            .json(&json!({ "jd_text": "Rust SQL Kubernetes" }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        let report: Value = response.json();
        assert_eq!(report["strong_matches"].as_array().unwrap().len(), 2);
        assert_eq!(report["gaps"][0]["keyword"], "kubernetes");
    }
}
