//! HTTP API handlers and routing.

pub mod authz;
pub mod error;
mod health;
pub mod request_context;
mod v1;

use axum::{
    http::{header, Method},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::state::AppState;

/// Create the main API router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_origin(Any);

    Router::new()
        // Health endpoints (no auth required)
        .merge(health::routes())
        .nest("/v1", v1::routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::db::Database;

    // Requests rejected before any query never open a connection.
    fn router() -> Router {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/tramdoc")
            .unwrap();
        create_router(AppState::new(Database::from_pool(pool)))
    }

    async fn send(request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = router().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    fn review(note_id: &str, body: &str) -> Request<Body> {
        Request::post(format!("/v1/notes/{note_id}/review"))
            .header("authorization", "Bearer user:reader@example.com")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_healthz() {
        let (status, json) = send(Request::get("/healthz").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["service"], "tramdoc-api");
    }

    #[tokio::test]
    async fn test_due_queue_requires_auth() {
        let (status, json) =
            send(Request::get("/v1/notes/review").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["code"], "unauthorized");
    }

    #[tokio::test]
    async fn test_review_rejects_out_of_range_quality() {
        let note_id = tramdoc_id::NoteId::new().to_string();
        for body in [r#"{"quality": 6}"#, r#"{"quality": -1}"#] {
            let (status, json) = send(review(&note_id, body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(json["code"], "invalid_quality");
        }
    }

    #[tokio::test]
    async fn test_review_rejects_undecodable_quality() {
        let note_id = tramdoc_id::NoteId::new().to_string();
        for body in [
            r#"{"quality": 99999999999999999999}"#,
            r#"{"quality": 4.5}"#,
            r#"{}"#,
            r#"{"quality": "#,
        ] {
            let response = router().oneshot(review(&note_id, body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
            assert_eq!(
                response.headers()["content-type"],
                "application/problem+json",
                "{body}"
            );
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(json["code"], "invalid_quality", "{body}");
        }
    }

    #[tokio::test]
    async fn test_review_rejects_malformed_note_id() {
        let (status, json) = send(review("not-a-note", r#"{"quality": 4}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "invalid_note_id");
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let request = Request::get("/v1/books")
            .header("x-request-id", "req_trace_me")
            .body(Body::empty())
            .unwrap();
        let (status, json) = send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["request_id"], "req_trace_me");
    }
}
