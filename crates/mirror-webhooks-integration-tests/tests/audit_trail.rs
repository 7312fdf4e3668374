//! Integration tests for audit writes and their failure policy

mod common;

use axum::http::StatusCode;
use common::{config_with_secret, expect_json, signed_request, TestApp, PAYMENT_BODY, TEST_SECRET};
use mirror_webhooks_core::{
    adapters::{RestAuditLogger, RestAuditLoggerConfig},
    audit_logging::{AuditFailurePolicy, AuditLogger},
};
use std::{sync::Arc, time::Duration};
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod failure_policy {
    use super::*;

    #[tokio::test]
    async fn test_fail_closed_returns_500_and_hides_details() {
        let app = TestApp::signed();
        app.audit_log.set_fail_writes(true);

        let response = app.send(signed_request(PAYMENT_BODY)).await;
        let body = expect_json(response, StatusCode::INTERNAL_SERVER_ERROR).await;

        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Failed to record webhook event");
        assert_eq!(app.metrics.webhook_audit_failures_total.get(), 1);
    }

    #[tokio::test]
    async fn test_fail_open_routes_without_audit_id() {
        let mut config = config_with_secret(Some(TEST_SECRET));
        config.audit.failure_policy = AuditFailurePolicy::FailOpen;
        let app = TestApp::with_config(config);
        app.audit_log.set_fail_writes(true);

        let response = app.send(signed_request(PAYMENT_BODY)).await;
        let body = expect_json(response, StatusCode::OK).await;

        assert_eq!(body["success"], true);
        assert_eq!(body["outcome"], "not_implemented");
        assert!(body["audit_id"].is_null());
        assert_eq!(app.metrics.webhook_audit_failures_total.get(), 1);
    }

    #[tokio::test]
    async fn test_recovered_store_accepts_next_delivery() {
        let app = TestApp::signed();

        app.audit_log.set_fail_writes(true);
        let first = app.send(signed_request(PAYMENT_BODY)).await;
        assert_eq!(first.status(), StatusCode::INTERNAL_SERVER_ERROR);

        app.audit_log.set_fail_writes(false);
        let second = app.send(signed_request(PAYMENT_BODY)).await;
        assert_eq!(second.status(), StatusCode::OK);
        assert_eq!(app.audit_log.len(), 1);
    }
}

mod database_backend {
    use super::*;

    fn rest_logger(server: &MockServer) -> Arc<dyn AuditLogger> {
        let config = RestAuditLoggerConfig::new(Url::parse(&server.uri()).unwrap(), "service-key")
            .with_timeout(Duration::from_secs(2));
        Arc::new(RestAuditLogger::new(config).unwrap())
    }

    #[tokio::test]
    async fn test_delivery_inserts_row_into_events_table() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/analytics_events"))
            .and(header("apikey", "service-key"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let app = TestApp::with_logger(config_with_secret(Some(TEST_SECRET)), rest_logger(&server));

        let response = app.send(signed_request(PAYMENT_BODY)).await;
        let body = expect_json(response, StatusCode::OK).await;
        assert!(body["audit_id"].is_string());

        let received = &server.received_requests().await.unwrap()[0];
        let row: serde_json::Value = serde_json::from_slice(&received.body).unwrap();
        assert_eq!(row["event_name"], "webhook.payment.success");
        assert_eq!(row["metadata"]["payload"]["data"]["amount"], 500);
        assert!(row["metadata"]["received_at"].is_string());
    }

    #[tokio::test]
    async fn test_database_rejection_fails_closed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("insert failed"))
            .mount(&server)
            .await;

        let app = TestApp::with_logger(config_with_secret(Some(TEST_SECRET)), rest_logger(&server));

        let response = app.send(signed_request(PAYMENT_BODY)).await;
        let body = expect_json(response, StatusCode::INTERNAL_SERVER_ERROR).await;

        assert_eq!(body["error"], "Failed to record webhook event");
        assert!(!body.to_string().contains("insert failed"));
    }
}
