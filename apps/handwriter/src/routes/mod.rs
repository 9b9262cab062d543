pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;
use crate::synthesis::handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Handwriting API
        .route("/api/v1/handwriting", post(handlers::handle_compose))
        .route("/api/v1/styles", get(handlers::handle_list_styles))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::geometry::{StrokeSample, StrokeSequence};
    use crate::layout::LayoutConfig;
    use crate::model::testing::ScriptedModel;
    use crate::synthesis::primer::StylePrimer;
    use crate::synthesis::{GenerationPool, GeneratorConfig, StyleLibrary};

    fn make_config() -> Config {
        Config {
            model_weights_path: PathBuf::from("unused.json"),
            styles_dir: PathBuf::from("unused"),
            port: 0,
            rust_log: "debug".to_string(),
            worker_limit: 2,
            generation_timeout: None,
            max_generation_steps: 3300,
        }
    }

    fn make_state(model: ScriptedModel) -> AppState {
        let mut styles = StyleLibrary::new();
        // Four samples per character of "ok ", matching a four-step scripted model.
        let strokes: StrokeSequence = (0..12)
            .map(|i| StrokeSample::new(1.0, 0.0, i % 4 == 3))
            .collect::<Vec<_>>()
            .into();
        styles
            .insert(StylePrimer::new(2, "ok", strokes).unwrap())
            .unwrap();

        AppState {
            config: make_config(),
            layout: Arc::new(LayoutConfig::default()),
            generator: GeneratorConfig::default(),
            model: Arc::new(model),
            styles: Arc::new(styles),
            pool: GenerationPool::new(2),
        }
    }

    async fn send(state: AppState, request: Request<Body>) -> (StatusCode, Value) {
        let response = build_router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/handwriting")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    // ────────────────────────────────────────────────────────────────────────
    // Read endpoints
    // ────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(make_state(ScriptedModel::new(4)), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["styles_loaded"], 1);
        assert_eq!(body["worker_limit"], 2);
    }

    #[tokio::test]
    async fn test_list_styles() {
        let (status, body) = send(make_state(ScriptedModel::new(4)), get("/api/v1/styles")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["supported"], 13);
        assert_eq!(body["styles"], json!([{ "index": 2, "text": "ok", "samples": 12 }]));
    }

    // ────────────────────────────────────────────────────────────────────────
    // Compose
    // ────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_compose_json() {
        let state = make_state(ScriptedModel::new(4));
        let (status, body) = send(state, post_json(json!({ "text": "Hi there", "random_seed": 3 }))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["failed_lines"], 0);
        assert_eq!(body["pages"].as_array().unwrap().len(), 1);
        assert_eq!(body["pages"][0]["paper"], "blank");
        assert!(body["pages"][0].get("svg").is_none());
        assert_eq!(body["lines"][0]["text"], "Hi there");
        assert_eq!(body["lines"][0]["steps"], 32);
        assert!(body["id"].is_string());
    }

    #[tokio::test]
    async fn test_compose_svg_per_page() {
        let state = make_state(ScriptedModel::new(4));
        let request = json!({
            "text": "one two three four",
            "paper": "lined",
            "max_chars_per_line": 5,
            "lines_per_page": 2,
            "style": 2,
            "format": "svg"
        });
        let (status, body) = send(state, post_json(request)).await;

        assert_eq!(status, StatusCode::OK);
        let pages = body["pages"].as_array().unwrap();
        assert_eq!(pages.len(), 2);
        for page in pages {
            let svg = page["svg"].as_str().unwrap();
            assert!(svg.starts_with("<svg "));
            assert!(svg.contains("<path "));
        }
        assert_eq!(body["lines"][3]["page"], 1);
        assert_eq!(body["lines"][3]["style"], 2);
    }

    #[tokio::test]
    async fn test_unsupported_character_is_bad_request() {
        let state = make_state(ScriptedModel::new(4));
        let (status, body) = send(state, post_json(json!({ "text": "50% off #deal" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "UNSUPPORTED_CHARACTER");
    }

    #[tokio::test]
    async fn test_empty_text_is_bad_request() {
        let state = make_state(ScriptedModel::new(4));
        let (status, body) = send(state, post_json(json!({ "text": "   " }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "EMPTY_DOCUMENT");
    }

    #[tokio::test]
    async fn test_unloaded_style_is_not_found() {
        let state = make_state(ScriptedModel::new(4));
        let (status, body) = send(state, post_json(json!({ "text": "hello", "style": 7 }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_overrun_everywhere_is_unprocessable() {
        let state = make_state(ScriptedModel::stalled(4));
        let (status, body) = send(state, post_json(json!({ "text": "stuck" }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "UNPROCESSABLE_ENTITY");
    }
}
