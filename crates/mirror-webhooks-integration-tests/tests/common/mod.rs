//! Common test utilities for mirror-webhooks integration tests
//!
//! Builds the real router over the real pipeline with an in-memory audit log,
//! plus helpers for signing and sending deliveries through `oneshot`.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use mirror_webhooks_api::{
    create_router, create_webhook_processor, AppState, AuditHealthChecker, ServiceConfig,
    ServiceMetrics,
};
use mirror_webhooks_core::{
    adapters::InMemoryAuditLogger,
    audit_logging::AuditLogger,
    router::EventRouter,
    signature::{sign_payload, SIGNATURE_HEADER},
};
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "integration-test-secret";

pub const PAYMENT_BODY: &str = r#"{"type":"payment.success","data":{"amount":500}}"#;

/// Router plus handles for inspecting its side effects
pub struct TestApp {
    pub router: Router,
    pub audit_log: InMemoryAuditLogger,
    pub metrics: Arc<ServiceMetrics>,
}

impl TestApp {
    /// App with the shared test secret configured
    pub fn signed() -> Self {
        Self::with_config(config_with_secret(Some(TEST_SECRET)))
    }

    /// App with signature verification disabled
    pub fn unsigned() -> Self {
        Self::with_config(config_with_secret(None))
    }

    pub fn with_config(config: ServiceConfig) -> Self {
        Self::build(config, EventRouter::new())
    }

    pub fn build(config: ServiceConfig, event_router: EventRouter) -> Self {
        let audit_log = InMemoryAuditLogger::new();
        let logger: Arc<dyn AuditLogger> = Arc::new(audit_log.clone());
        Self::build_with_logger(config, event_router, logger, audit_log)
    }

    /// App writing to an arbitrary audit backend; `audit_log` stays empty
    pub fn with_logger(config: ServiceConfig, logger: Arc<dyn AuditLogger>) -> Self {
        Self::build_with_logger(config, EventRouter::new(), logger, InMemoryAuditLogger::new())
    }

    fn build_with_logger(
        config: ServiceConfig,
        event_router: EventRouter,
        logger: Arc<dyn AuditLogger>,
        audit_log: InMemoryAuditLogger,
    ) -> Self {
        let processor = create_webhook_processor(&config, logger.clone()).with_router(event_router);
        let metrics = ServiceMetrics::new().unwrap();

        let state = AppState::new(
            config,
            Arc::new(processor),
            Arc::new(AuditHealthChecker::new(logger)),
            metrics.clone(),
        );

        Self {
            router: create_router(state),
            audit_log,
            metrics,
        }
    }

    /// Send one request through a fresh clone of the router
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

/// Default config with an audit backend that needs no credentials
pub fn config_with_secret(secret: Option<&str>) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.audit.backend = mirror_webhooks_api::AuditBackend::Memory;
    config.webhooks.secret = secret.map(str::to_string);
    config
}

/// `sha256=<hex>` for `body` under the test secret
pub fn sign(body: &str) -> String {
    sign_payload(body.as_bytes(), TEST_SECRET).unwrap()
}

/// POST to `/webhook` with an optional signature header
pub fn webhook_request(body: &str, signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json");

    if let Some(signature) = signature {
        builder = builder.header(SIGNATURE_HEADER, signature);
    }

    builder.body(Body::from(body.to_string())).unwrap()
}

/// POST `body` signed with the test secret
pub fn signed_request(body: &str) -> Request<Body> {
    webhook_request(body, Some(&sign(body)))
}

pub async fn body_string(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

/// Assert status and return the JSON body
pub async fn expect_json(response: Response, status: StatusCode) -> serde_json::Value {
    assert_eq!(response.status(), status);
    body_json(response).await
}
