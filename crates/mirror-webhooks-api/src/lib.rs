//! # Mirror Webhooks HTTP Service
//!
//! HTTP server receiving signed webhook deliveries for The Mirror.
//!
//! This service provides:
//! - Webhook endpoint with HMAC-SHA256 signature verification
//! - Health and readiness endpoints
//! - Prometheus metrics endpoint

pub mod config;
pub mod errors;
pub mod metrics;
pub mod responses;
pub mod settings;

pub use config::{
    AuditBackend, AuditConfig, DatabaseConfig, LoggingConfig, MalformedPayloadStatus,
    ServerConfig, ServiceConfig, WebhookConfig,
};
pub use errors::{ConfigError, ServiceError, WebhookHandlerError};
pub use metrics::ServiceMetrics;
pub use responses::{
    HealthCheckResult, HealthResponse, HealthStatus, ReadinessResponse, WebhookResponse,
};

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, StatusCode},
    middleware,
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use mirror_webhooks_core::{
    audit_logging::AuditLogger,
    signature::{SignatureVerifier, SIGNATURE_HEADER},
    Timestamp, WebhookError, WebhookProcessor, WebhookProcessorImpl, WebhookRequest,
};
use std::{collections::HashMap, net::SocketAddr, sync::Arc};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, instrument, warn};

/// Header carrying the request correlation ID
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

// ============================================================================
// Application State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration for the service
    pub config: Arc<ServiceConfig>,

    /// Verify, audit and route pipeline
    pub webhook_processor: Arc<dyn WebhookProcessor>,

    /// Health checker for system monitoring
    pub health_checker: Arc<dyn HealthChecker>,

    /// Metrics collector for observability
    pub metrics: Arc<ServiceMetrics>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        config: ServiceConfig,
        webhook_processor: Arc<dyn WebhookProcessor>,
        health_checker: Arc<dyn HealthChecker>,
        metrics: Arc<ServiceMetrics>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            webhook_processor,
            health_checker,
            metrics,
        }
    }
}

/// Build the webhook pipeline described by `config` on top of `audit_logger`
pub fn create_webhook_processor(
    config: &ServiceConfig,
    audit_logger: Arc<dyn AuditLogger>,
) -> WebhookProcessorImpl {
    WebhookProcessorImpl::new(
        SignatureVerifier::new(config.webhooks.secret.clone()),
        audit_logger,
    )
    .with_failure_policy(config.audit.failure_policy)
}

// ============================================================================
// HTTP Server
// ============================================================================

/// Create HTTP router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let server = &state.config.server;

    let webhook_routes = Router::new()
        .route(&state.config.webhooks.endpoint_path, post(handle_webhook))
        .layer(DefaultBodyLimit::max(server.max_body_size));

    let health_routes = Router::new()
        .route("/health", get(handle_health_check))
        .route("/ready", get(handle_readiness_check));

    let observability_routes = Router::new().route("/metrics", get(metrics_endpoint));

    let mut router = Router::new()
        .merge(webhook_routes)
        .merge(health_routes)
        .merge(observability_routes);

    if server.enable_compression {
        router = router.layer(CompressionLayer::new());
    }
    if server.enable_cors {
        router = router.layer(CorsLayer::permissive());
    }

    router
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start HTTP server and run until SIGINT or SIGTERM
pub async fn start_server(
    config: ServiceConfig,
    webhook_processor: Arc<dyn WebhookProcessor>,
    health_checker: Arc<dyn HealthChecker>,
) -> Result<(), ServiceError> {
    let metrics = ServiceMetrics::new().map_err(|e| {
        ServiceError::Configuration(ConfigError::Invalid {
            message: format!("Failed to initialize metrics: {}", e),
        })
    })?;

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    let addr: SocketAddr = bind_address.parse().map_err(|e| {
        ServiceError::Configuration(ConfigError::Invalid {
            message: format!("Invalid bind address '{}': {}", bind_address, e),
        })
    })?;

    let state = AppState::new(config, webhook_processor, health_checker, metrics);
    let app = create_router(state);

    let listener =
        tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServiceError::BindFailed {
                address: addr.to_string(),
                message: e.to_string(),
            })?;

    info!("Starting HTTP server on {}", addr);

    // In-flight requests complete before the server returns.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServiceError::ServerFailed {
            message: e.to_string(),
        })?;

    info!("HTTP server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}

// ============================================================================
// Webhook Handlers
// ============================================================================

/// Handle a webhook delivery
///
/// Reads the raw body and the `x-webhook-signature` header, runs the
/// pipeline and maps the result to a response. Signature failures are
/// answered with plain-text 401s; every other failure with a JSON body.
#[instrument(skip(state, headers, body), fields(body_len = body.len()))]
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, WebhookHandlerError> {
    let start = std::time::Instant::now();

    // A non-UTF-8 header value cannot carry the prefix, so it fails as a format error.
    let signature = headers
        .get(SIGNATURE_HEADER)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());

    let request = WebhookRequest::new(body, signature);
    let result = state.webhook_processor.process_webhook(request).await;

    state
        .metrics
        .webhook_duration_seconds
        .observe(start.elapsed().as_secs_f64());

    match result {
        Ok(processed) => {
            if processed.audit_skipped() {
                state.metrics.webhook_audit_failures_total.inc();
            }
            state.metrics.record_outcome(processed.outcome.label());
            Ok(Json(WebhookResponse::from(processed)))
        }
        Err(e) => {
            match &e {
                WebhookError::InvalidSignature(_) => {
                    state.metrics.webhook_signature_failures_total.inc()
                }
                WebhookError::Audit(_) => state.metrics.webhook_audit_failures_total.inc(),
                _ => {}
            }

            let handler_error = WebhookHandlerError::from_webhook_error(
                e,
                state.config.webhooks.malformed_payload_status,
            );
            state.metrics.record_outcome(handler_error.outcome_label());
            Err(handler_error)
        }
    }
}

// ============================================================================
// Health Check Handlers
// ============================================================================

/// Liveness check
#[instrument(skip(state))]
async fn handle_health_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, StatusCode> {
    let status = state.health_checker.check_basic_health().await;

    let response = HealthResponse {
        status: if status.is_healthy {
            "healthy".to_string()
        } else {
            "unhealthy".to_string()
        },
        timestamp: Timestamp::now(),
        checks: status.checks,
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    if status.is_healthy {
        Ok(Json(response))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}

/// Readiness check; fails while the audit backend cannot take writes
#[instrument(skip(state))]
async fn handle_readiness_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let status = state.health_checker.check_readiness().await;

    let code = if status.is_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        code,
        Json(ReadinessResponse {
            ready: status.is_healthy,
            timestamp: Timestamp::now(),
            checks: status.checks,
        }),
    )
}

// ============================================================================
// Observability Handlers
// ============================================================================

/// Prometheus metrics endpoint
#[instrument(skip_all)]
async fn metrics_endpoint(State(state): State<AppState>) -> Result<String, StatusCode> {
    state.metrics.encode().map_err(|e| {
        error!(error = %e, "Failed to encode metrics");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

// ============================================================================
// Middleware
// ============================================================================

/// Tags each request with a correlation ID and logs its completion.
///
/// A non-empty `x-correlation-id` from the sender is reused; otherwise a
/// UUID is minted. The ID is stored in request extensions and echoed back.
#[instrument(name = "request", skip_all, fields(
    method = %request.method(),
    path = %request.uri().path(),
    correlation_id = tracing::field::Empty,
))]
async fn request_logging_middleware(
    mut request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let started = std::time::Instant::now();
    let correlation_id = correlation_id_for(request.headers());

    tracing::Span::current().record("correlation_id", correlation_id.as_str());
    request.extensions_mut().insert(correlation_id.clone());

    let mut response = next.run(request).await;

    if let Ok(value) = correlation_id.parse() {
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }

    let status = response.status().as_u16();
    let elapsed_ms = started.elapsed().as_millis() as u64;
    match response.status() {
        s if s.is_server_error() => error!(status, elapsed_ms, "Request failed"),
        s if s.is_client_error() => warn!(status, elapsed_ms, "Request rejected"),
        _ => info!(status, elapsed_ms, "Request served"),
    }

    response
}

fn correlation_id_for(headers: &HeaderMap) -> String {
    headers
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

// ============================================================================
// Health Checking
// ============================================================================

/// Interface for system health monitoring
#[async_trait::async_trait]
pub trait HealthChecker: Send + Sync {
    /// Liveness: the process can serve requests
    async fn check_basic_health(&self) -> HealthStatus;

    /// Readiness: dependencies can take traffic
    async fn check_readiness(&self) -> HealthStatus;
}

/// Health checker that checks the audit backend for readiness
pub struct AuditHealthChecker {
    audit_logger: Arc<dyn AuditLogger>,
}

impl AuditHealthChecker {
    pub fn new(audit_logger: Arc<dyn AuditLogger>) -> Self {
        Self { audit_logger }
    }
}

fn service_check() -> (String, HealthCheckResult) {
    (
        "service".to_string(),
        HealthCheckResult {
            healthy: true,
            message: "Service is running".to_string(),
            duration_ms: 0,
        },
    )
}

#[async_trait::async_trait]
impl HealthChecker for AuditHealthChecker {
    async fn check_basic_health(&self) -> HealthStatus {
        HealthStatus {
            is_healthy: true,
            checks: HashMap::from([service_check()]),
        }
    }

    async fn check_readiness(&self) -> HealthStatus {
        let start = std::time::Instant::now();
        let backend = self.audit_logger.backend_name();
        let result = self.audit_logger.check_health().await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let audit_check = match &result {
            Ok(()) => HealthCheckResult {
                healthy: true,
                message: format!("Audit backend '{}' available", backend),
                duration_ms,
            },
            Err(e) => {
                warn!(backend, error = %e, "Audit backend health check failed");
                HealthCheckResult {
                    healthy: false,
                    message: format!("Audit backend '{}' unavailable: {}", backend, e),
                    duration_ms,
                }
            }
        };

        HealthStatus {
            is_healthy: result.is_ok(),
            checks: HashMap::from([service_check(), ("audit".to_string(), audit_check)]),
        }
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
