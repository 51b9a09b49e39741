pub mod health;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::analytics::{auth::require_admin, handlers as analytics};
use crate::guide::handlers as guide;
use crate::improve::handlers as improve;
use crate::scorecard::handlers as scorecard;
use crate::state::AppState;

/// Every guide route is served both at `/x` and `/api/x`.
pub fn build_router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/api/analytics/stats", get(analytics::handle_stats))
        .route("/api/analytics/query", post(analytics::handle_query))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    let mut router = Router::new();
    for prefix in ["", "/api"] {
        router = router
            .route(&format!("{prefix}/health"), get(health::health_handler))
            .route(&format!("{prefix}/questions"), get(guide::handle_questions))
            .route(
                &format!("{prefix}/validate-step"),
                get(guide::handle_validate_step_get).post(guide::handle_validate_step_post),
            )
            .route(
                &format!("{prefix}/compose-initial"),
                post(guide::handle_compose_initial),
            )
            .route(
                &format!("{prefix}/scorecard"),
                post(scorecard::handle_scorecard),
            )
            .route(
                &format!("{prefix}/improve-online"),
                post(improve::handle_improve),
            );
    }

    router
        .route("/api/analytics/event", post(analytics::handle_event))
        .merge(admin)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::analytics::geo::GeoResolver;
    use crate::config::Config;
    use crate::llm_client::mock::MockBackend;
    use crate::llm_client::LlmGateway;

    fn app(llm: LlmGateway) -> Router {
        let config = Config::from_lookup(|key| match key {
            "ADMIN_KEY" => Some("secreto".to_string()),
            _ => None,
        })
        .unwrap();
        let geo = GeoResolver::new("http://127.0.0.1:9", Duration::from_millis(50), true).unwrap();
        build_router(AppState {
            config,
            llm,
            db: None,
            geo,
        })
    }

    fn gateway(backend: &MockBackend) -> LlmGateway {
        LlmGateway::new().with_backend(Arc::new(backend.clone()))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_questions_on_both_prefixes() {
        for uri in ["/questions", "/api/questions"] {
            let response = app(LlmGateway::new()).oneshot(get(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let body = json_body(response).await;
            assert_eq!(body["questions"].as_array().unwrap().len(), 6);
            assert_eq!(body["questions"][0]["id"], "objetivo");
        }
    }

    #[tokio::test]
    async fn test_health_reports_configuration() {
        let backend = MockBackend::new("gemini");
        let response = app(gateway(&backend)).oneshot(get("/api/health")).await.unwrap();
        let body = json_body(response).await;
        assert_eq!(body["ok"], true);
        assert_eq!(body["has_gemini"], true);
        assert_eq!(body["has_ollama"], false);
        assert_eq!(body["analytics"], false);
    }

    #[tokio::test]
    async fn test_validate_step_get_tone() {
        let response = app(LlmGateway::new())
            .oneshot(get("/validate-step?question_id=tono&answer=Profesional"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({"ok": true, "hint": "OK"}));
    }

    #[tokio::test]
    async fn test_validate_step_post_uses_history() {
        let backend = MockBackend::new("gemini").with_response("incoherente");
        let response = app(gateway(&backend))
            .oneshot(post_json(
                "/api/validate-step",
                json!({
                    "qid": "contexto",
                    "answer": "me gusta el fútbol",
                    "answers_so_far": {"objetivo": "Aprender python"}
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["ok"], false);
        assert!(backend.calls()[0].prompt.contains("OBJETIVO: Aprender python"));
    }

    #[tokio::test]
    async fn test_validate_step_format_suggestions() {
        let response = app(LlmGateway::new())
            .oneshot(post_json(
                "/validate-step",
                json!({"question_id": "formato", "answer": "narrativa libre", "history": {}}),
            ))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["ok"], false);
        assert_eq!(body["suggestions"][0], "json");
    }

    #[tokio::test]
    async fn test_validate_step_without_question_id_is_400() {
        let response = app(LlmGateway::new())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/validate-step")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["ok"], false);
        assert_eq!(body["error"]["message"], "Falta 'question_id'.");
    }

    #[tokio::test]
    async fn test_compose_initial() {
        let response = app(LlmGateway::new())
            .oneshot(post_json(
                "/api/compose-initial",
                json!({"answers_clean": {"objetivo": "aprender python", "longitud": "300-500"}}),
            ))
            .await
            .unwrap();
        let body = json_body(response).await;
        let prompt = body["prompt"].as_str().unwrap();
        assert!(prompt.contains("Objetivo: Aprender python."));
        assert!(prompt.contains("Longitud esperada: 300 a 500 palabras."));
    }

    #[tokio::test]
    async fn test_scorecard_front_payload() {
        let backend = MockBackend::new("gemini").with_response(
            r#"{"critique": "Vago.", "criteria": {"Rol": 5, "Objetivo": 5, "Tono": 5, "Formato": 5, "Longitud": 5, "Calidad": 2}, "penalties": {"Ortografia": 1}}"#,
        );
        let response = app(gateway(&backend))
            .oneshot(post_json("/scorecard", json!({"prompt": "Actúa como asesor."})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CACHE_CONTROL]
            .to_str()
            .unwrap()
            .starts_with("no-store"));

        let body = json_body(response).await;
        assert_eq!(body["total"], 27);
        assert_eq!(body["scorecard"]["total_final"], 27);
        assert_eq!(body["criteria"]["calidad"], 2);
        assert_eq!(backend.calls()[0].model.as_deref(), Some("gemini-1.5-flash"));
    }

    #[tokio::test]
    async fn test_scorecard_with_rejected_key_is_bad_gateway() {
        let backend = MockBackend::new("gemini").with_api_error(400, "API key not valid");
        let response = app(gateway(&backend))
            .oneshot(post_json(
                "/scorecard",
                json!({"prompt": "Actúa como asesor.", "api_key": "mala"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "LLM_ERROR");
        assert_eq!(backend.calls()[0].credential.as_deref(), Some("mala"));
    }

    #[tokio::test]
    async fn test_scorecard_requires_prompt() {
        let response = app(LlmGateway::new())
            .oneshot(post_json("/api/scorecard", json!({"prompt": "   "})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_improve_without_provider_is_503() {
        let response = app(LlmGateway::new())
            .oneshot(post_json("/improve-online", json!({"prompt": "Actúa como asesor."})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "PROVIDER_UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_improve_returns_prompt() {
        let backend = MockBackend::new("gemini").with_response("Actúa como asesor experto.");
        let response = app(gateway(&backend))
            .oneshot(post_json("/api/improve-online", json!({"prompt": "asesor"})))
            .await
            .unwrap();
        assert_eq!(
            json_body(response).await,
            json!({"prompt": "Actúa como asesor experto."})
        );
    }

    #[tokio::test]
    async fn test_admin_routes_require_key() {
        let response = app(LlmGateway::new())
            .oneshot(get("/api/analytics/stats"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app(LlmGateway::new())
            .oneshot(get("/api/analytics/stats?key=secreto"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_admin_key_in_query_is_percent_decoded() {
        let response = app(LlmGateway::new())
            .oneshot(get("/api/analytics/stats?key=secre%74o"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_query_guard_runs_before_database() {
        let mut request = post_json("/api/analytics/query", json!({"sql": "DELETE FROM users"}));
        request
            .headers_mut()
            .insert("x-admin-key", "secreto".parse().unwrap());
        let response = app(LlmGateway::new()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["message"], "only SELECT is allowed");
    }

    #[tokio::test]
    async fn test_event_accepts_text_plain_beacon() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/analytics/event")
            .header(header::CONTENT_TYPE, "text/plain;charset=UTF-8")
            .body(Body::from(r#"{"device_id": "d1", "event": "heartbeat"}"#))
            .unwrap();
        let response = app(LlmGateway::new()).oneshot(request).await.unwrap();
        // parsed and validated; only the missing database stops it
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "ANALYTICS_DISABLED");
    }

    #[tokio::test]
    async fn test_event_validates_before_database() {
        let response = app(LlmGateway::new())
            .oneshot(post_json("/api/analytics/event", json!({"device_id": "d1"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app(LlmGateway::new())
            .oneshot(post_json(
                "/api/analytics/event",
                json!({"device_id": "d1", "event": "heartbeat"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
