use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use memory_augment_schemas::{ClassifyRequest, WebhookPayload};
use memory_augment_triggers::classify_all;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::pipeline::AugmentPipeline;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AugmentPipeline>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/v1/webhook/message", post(receive_message))
        .route("/v1/classify", post(classify_message))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "service": "memory-augment",
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Always answers 200: partial success is reported per category.
async fn receive_message(
    State(state): State<AppState>,
    Json(payload): Json<WebhookPayload>,
) -> impl IntoResponse {
    info!("Webhook message for agent {}", payload.scope());

    let report = state.pipeline.process_payload(&payload).await;
    Json(report)
}

async fn classify_message(Json(request): Json<ClassifyRequest>) -> impl IntoResponse {
    Json(classify_all(&request.message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use memory_augment_retrieval::InMemoryBlockStore;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        let store = Arc::new(InMemoryBlockStore::new());
        let pipeline = AugmentPipeline::new(Vec::new(), store, 1000, 3);
        router(AppState {
            pipeline: Arc::new(pipeline),
        })
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_classify_endpoint() {
        let (status, body) = post_json(
            app(),
            "/v1/classify",
            json!({ "message": "What breaking events are happening globally today?" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["knowledge_graph"]["triggered"], true);
        assert_eq!(body["event_data"]["category"], "global_news");
        assert_eq!(body["paper_index"]["triggered"], false);
    }

    #[tokio::test]
    async fn test_webhook_reports_missing_adapters_per_category() {
        let (status, body) = post_json(
            app(),
            "/v1/webhook/message",
            json!({ "agent_id": "agent-1", "message": "What's 2+2?" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["agent_id"], "agent-1");

        let outcomes = body["outcomes"].as_array().unwrap();
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0]["source"], "knowledge_graph");
        assert_eq!(outcomes[0]["success"], false);
        assert!(outcomes[0]["reason"]
            .as_str()
            .unwrap()
            .contains("no adapter configured"));
        assert_eq!(outcomes[1]["reason"], "not triggered");
        assert_eq!(outcomes[2]["success"], true);
    }

    #[tokio::test]
    async fn test_webhook_rejects_unknown_shape() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/webhook/message")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"unexpected": true}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
