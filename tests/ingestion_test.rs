#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tera_trace::diagnostics::RecordingSink;
    use tera_trace::ingestion::{create_ingest_router, COMPONENT_INGEST};
    use tera_trace::{Collector, Severity, TraceConfig};
    use tower::ServiceExt;

    fn setup() -> (Arc<Collector>, Arc<RecordingSink>, Router) {
        let sink = Arc::new(RecordingSink::new());
        let collector = Arc::new(Collector::new(&TraceConfig::default(), sink.clone()));
        let app = create_ingest_router(collector.clone());
        (collector, sink, app)
    }

    fn request(method: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri("/ingest")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_post_stores_entry_and_returns_empty_ok() {
        let (collector, sink, app) = setup();

        let response = app
            .oneshot(request("POST", r#"{"Level":"ERROR","Message":"boom","Service":"auth"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());

        let stored = collector.store().get_service("auth");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].level, "ERROR");
        assert_eq!(stored[0].message, "boom");
        assert!(stored[0].trace_id.is_empty());
        assert!(stored[0].session_id.is_empty());
        let age = chrono::Utc::now() - stored[0].timestamp;
        assert!(age.num_seconds().abs() < 5);

        assert_eq!(sink.count(Severity::Info, COMPONENT_INGEST), 1);
    }

    #[tokio::test]
    async fn test_missing_service_uses_http_channel_default() {
        let (collector, _, app) = setup();

        let response = app.oneshot(request("POST", r#"{"Message":"hi"}"#)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(collector.store().get_service("HTTP").len(), 1);
    }

    #[tokio::test]
    async fn test_non_post_is_method_not_allowed() {
        let (collector, sink, app) = setup();

        for method in ["GET", "PUT", "DELETE"] {
            let response = app
                .clone()
                .oneshot(request(method, r#"{"Message":"hi"}"#))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        }

        assert!(collector.store().is_empty());
        assert_eq!(sink.count(Severity::Warn, COMPONENT_INGEST), 3);
    }

    #[tokio::test]
    async fn test_invalid_json_is_bad_request() {
        let (collector, sink, app) = setup();

        let response = app.clone().oneshot(request("POST", "{oops")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app.oneshot(request("POST", "[1,2]")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        assert!(collector.store().is_empty());
        assert!(collector.aggregator().is_empty());
        assert_eq!(sink.count(Severity::Error, COMPONENT_INGEST), 2);
    }

    #[tokio::test]
    async fn test_large_body_is_accepted() {
        let (collector, _, app) = setup();
        let big = "x".repeat(3 * 1024 * 1024);
        let payload = serde_json::json!({ "Message": big, "Service": "bulk" }).to_string();

        let response = app.oneshot(request("POST", &payload)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let stored = collector.store().get_service("bulk");
        assert_eq!(stored[0].message.len(), 3 * 1024 * 1024);
    }

    #[tokio::test]
    async fn test_post_is_broadcast_to_viewers() {
        let (collector, _, app) = setup();
        let mut viewer = collector.join_viewer();

        let response = app
            .oneshot(request("POST", r#"{"Message":"live","Service":"svc","TraceID":"t-1"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let live = viewer.receiver.recv().await.unwrap();
        assert_eq!(live.message, "live");
        assert_eq!(live.trace_id, "t-1");
    }

    #[tokio::test]
    async fn test_duplicate_payload_is_deduplicated_by_aggregator_only() {
        let (collector, _, app) = setup();
        let payload = r#"{"Level":"ERROR","Message":"boom","Service":"auth"}"#;

        for _ in 0..2 {
            let response = app.clone().oneshot(request("POST", payload)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        assert_eq!(collector.store().get_service("auth").len(), 2);
        assert_eq!(collector.aggregator().get_logs("auth").len(), 1);
    }
}
