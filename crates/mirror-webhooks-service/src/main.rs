//! # Mirror Webhooks Service
//!
//! Binary entry point for the Mirror webhook receiver.
//!
//! This executable:
//! - Loads configuration from files and environment
//! - Initializes structured logging
//! - Creates the audit backend and webhook processor
//! - Starts the HTTP server from mirror-webhooks-api
//!
//! Exit codes: 1 bind failure, 2 server failure, 3 configuration error.

mod audit_backend;

use mirror_webhooks_api::{
    create_webhook_processor,
    settings::{load_service_config, ConfigSources},
    start_server, AuditHealthChecker, LoggingConfig, ServiceError,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    let loaded = load_service_config(&ConfigSources::from_env());

    let logging = loaded
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    init_logging(&logging);

    let service_config = match loaded {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Service configuration is invalid; aborting");
            std::process::exit(3);
        }
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting Mirror webhook service"
    );

    let audit_logger = match audit_backend::build_audit_logger(&service_config).await {
        Ok(logger) => logger,
        Err(e) => {
            error!(error = %e, "Failed to create audit logger; aborting");
            std::process::exit(3);
        }
    };

    let webhook_processor = Arc::new(create_webhook_processor(
        &service_config,
        audit_logger.clone(),
    ));
    let health_checker = Arc::new(AuditHealthChecker::new(audit_logger));

    info!(
        host = %service_config.server.host,
        port = service_config.server.port,
        endpoint = %service_config.webhooks.endpoint_path,
        "Starting HTTP server"
    );

    if let Err(e) = start_server(service_config, webhook_processor, health_checker).await {
        error!("Failed to start server: {}", e);

        let exit_code = match e {
            ServiceError::BindFailed { .. } => 1,
            ServiceError::ServerFailed { .. } => 2,
            ServiceError::Configuration(_) => 3,
        };

        std::process::exit(exit_code);
    }
}

/// Install the global subscriber. `RUST_LOG` takes precedence over `logging.level`.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let (json_layer, text_layer) = if logging.json_format {
        (Some(tracing_subscriber::fmt::layer().json()), None)
    } else {
        (None, Some(tracing_subscriber::fmt::layer()))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}
