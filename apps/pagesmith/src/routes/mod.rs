pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::pipeline::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Pages API
        .route("/api/v1/pages", post(handlers::handle_generate_page))
        .route("/api/v1/pages/outline", post(handlers::handle_plan_outline))
        .route("/api/v1/pages/batch", post(handlers::handle_batch))
        .route(
            "/api/v1/pages/batch/export",
            post(handlers::handle_batch_export),
        )
        // SEO API
        .route("/api/v1/seo/validate", post(handlers::handle_validate_seo))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::llm_client::LlmError;
    use crate::pipeline::Pipeline;
    use crate::testing::{
        seo_result, section_json, test_state, well_optimized_page, FakeImages,
        FakeLlm, ScriptedValidator,
    };

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Vec<u8>, Option<String>) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec();
        (status, bytes, content_type)
    }

    async fn post_value(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let (status, bytes, _) = post_json(app, uri, body).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn app() -> (Router, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        (build_router(test_state(dir.path().to_path_buf())), dir)
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _dir) = app();
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "pagesmith-api");
    }

    #[tokio::test]
    async fn test_generate_page_rejects_empty_keyword() {
        let (app, _dir) = app();

        let (status, body) = post_value(app, "/api/v1/pages", json!({"keyword": "  "})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_generate_page_returns_result() {
        let (app, _dir) = app();

        let (status, body) =
            post_value(app, "/api/v1/pages", json!({"keyword": "VTC Aéroport Nice"})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["keyword"], "VTC Aéroport Nice");
        assert_eq!(body["status"], "success");
        assert_eq!(body["metrics"]["attempts"], 1);
        assert!(body.get("url").is_none());
        assert!(!body["images"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generate_page_applies_partial_config() {
        let (app, _dir) = app();

        let (status, body) = post_value(
            app,
            "/api/v1/pages",
            json!({"keyword": "VTC Nice", "config": {"enable_images": false}}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["images"].as_array().unwrap().is_empty());
        assert_eq!(body["metrics"]["image_count"], 0);
    }

    #[tokio::test]
    async fn test_generate_page_persists_artifacts() {
        let (app, dir) = app();

        let (status, body) = post_value(
            app,
            "/api/v1/pages",
            json!({"keyword": "VTC Aéroport Nice", "persist": true}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["url"], "https://vtc.example/vtc-aeroport-nice/");
        let page_dir = dir.path().join("vtc-aeroport-nice");
        assert!(page_dir.join("index.html").exists());
        assert!(page_dir.join("seo-report.json").exists());
        assert!(page_dir.join("content.json").exists());
    }

    #[tokio::test]
    async fn test_generation_failure_is_reported_in_status() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = test_state(dir.path().to_path_buf());
        state.pipeline = Arc::new(Pipeline::new(
            Arc::new(FakeLlm::new(|_| Ok("pas de JSON".to_string()))),
            Arc::new(FakeLlm::new(|_| Err(LlmError::EmptyContent))),
            Arc::new(ScriptedValidator::new(vec![seo_result(95, &[])])),
            Arc::new(FakeImages::succeeding()),
        ));

        let (status, body) =
            post_value(build_router(state), "/api/v1/pages", json!({"keyword": "VTC Nice"})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "failed");
        assert!(body["error"].as_str().unwrap().contains("Structure generation failed"));
    }

    #[tokio::test]
    async fn test_plan_outline() {
        let (app, _dir) = app();

        let (status, body) =
            post_value(app, "/api/v1/pages/outline", json!({"keyword": "VTC Monaco"})).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["keyword"], "VTC Monaco");
        assert_eq!(body["entries"][0]["type"], "introduction");
        assert_eq!(body["keywords"][0], "VTC Monaco");
    }

    #[tokio::test]
    async fn test_plan_outline_failure_is_bad_gateway() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = test_state(dir.path().to_path_buf());
        state.pipeline = Arc::new(Pipeline::new(
            Arc::new(FakeLlm::new(|_| Ok(section_json("x")))),
            Arc::new(FakeLlm::replying("Désolé.".to_string())),
            Arc::new(ScriptedValidator::new(vec![])),
            Arc::new(FakeImages::succeeding()),
        ));

        let (status, body) =
            post_value(build_router(state), "/api/v1/pages/outline", json!({"keyword": "VTC Nice"}))
                .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "PIPELINE_ERROR");
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_returns_results_and_stats() {
        let (app, _dir) = app();

        let (status, body) = post_value(
            app,
            "/api/v1/pages/batch",
            json!({"keywords": ["VTC Nice", "VTC Cannes"], "config": {"max_attempts": 1}}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["results"].as_array().unwrap().len(), 2);
        assert_eq!(body["results"][1]["keyword"], "VTC Cannes");
        assert_eq!(body["stats"]["total"], 2);
        assert_eq!(body["stats"]["successful"], 2);
    }

    #[tokio::test]
    async fn test_batch_rejects_empty_list_and_blank_keywords() {
        for keywords in [json!([]), json!(["VTC Nice", ""])] {
            let (router, _dir) = app();
            let (status, body) =
                post_value(router, "/api/v1/pages/batch", json!({"keywords": keywords})).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_export_csv() {
        let (app, _dir) = app();

        let (status, bytes, content_type) = post_json(
            app,
            "/api/v1/pages/batch/export?format=csv",
            json!({"keywords": ["VTC Nice", "VTC Cannes"]}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(content_type.unwrap().starts_with("text/csv"));
        let csv = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Keyword,Status,SEO Score"));
        assert!(lines[1].starts_with("VTC Nice,success,92,"));
    }

    #[tokio::test]
    async fn test_batch_export_defaults_to_json() {
        let (app, _dir) = app();

        let (status, bytes, content_type) = post_json(
            app,
            "/api/v1/pages/batch/export",
            json!({"keywords": ["VTC Nice"]}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("application/json"));
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body[0]["keyword"], "VTC Nice");
    }

    #[tokio::test]
    async fn test_validate_seo() {
        let (app, _dir) = app();

        let (status, body) = post_value(
            app,
            "/api/v1/seo/validate",
            json!({"content": well_optimized_page("VTC Aéroport Nice"), "keyword": "VTC Aéroport Nice"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["score"], 100);
        assert_eq!(body["grade"], "A");
    }

    #[tokio::test]
    async fn test_validate_seo_rejects_empty_keyword() {
        let (app, _dir) = app();
        let (status, body) = post_value(
            app,
            "/api/v1/seo/validate",
            json!({"content": "<h1>Titre</h1>", "keyword": ""}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }
}
