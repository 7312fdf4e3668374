//! # Mirror Webhooks CLI
//!
//! Command-line tools for operating the Mirror webhook receiver:
//! - Sign payloads the way senders must
//! - Send signed test deliveries to a running receiver
//! - Validate service configuration files

use anyhow::Context;
use clap::{Parser, Subcommand};
use mirror_webhooks_api::settings::{load_service_config, ConfigSources};
use mirror_webhooks_api::{ConfigError, ServiceConfig};
use mirror_webhooks_core::signature::{sign_payload, SignatureError, SIGNATURE_HEADER};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// ============================================================================
// CLI Structure
// ============================================================================

/// Mirror webhooks CLI
#[derive(Parser, Debug)]
#[command(name = "mirror-webhooks")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Tools for The Mirror webhook receiver")]
pub struct Cli {
    /// Logging level
    #[arg(short, long, default_value = "warn", global = true)]
    pub log_level: String,

    /// Enable JSON logging
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the signature header value for a payload
    Sign {
        /// Shared webhook secret
        #[arg(short, long, env = "WEBHOOK_SECRET", hide_env_values = true)]
        secret: String,

        /// Read the payload from a file
        #[arg(short, long, conflicts_with = "data", required_unless_present = "data")]
        file: Option<PathBuf>,

        /// Payload given inline
        #[arg(short, long)]
        data: Option<String>,
    },

    /// Send a signed test delivery to a receiver
    Send {
        /// Webhook endpoint URL
        #[arg(short, long)]
        url: String,

        /// Event type, e.g. payment.success
        #[arg(short = 't', long = "type")]
        event_type: String,

        /// Event data as JSON
        #[arg(short, long)]
        data: Option<String>,

        /// Shared webhook secret; deliveries are unsigned without one
        #[arg(short, long, env = "WEBHOOK_SECRET", hide_env_values = true)]
        secret: Option<String>,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Load and validate a service configuration file.
    ///
    /// `MIRROR__SECTION__KEY` and the legacy `SUPABASE_URL`,
    /// `SUPABASE_SERVICE_ROLE_KEY` and `WEBHOOK_SECRET` variables are applied
    /// on top, as the service does.
    Check {
        /// Configuration file to validate
        #[arg(short, long, env = "MIRROR_CONFIG_FILE")]
        file: PathBuf,

        /// Print the resolved configuration with secrets redacted
        #[arg(long)]
        show: bool,
    },
}

// ============================================================================
// CLI Error Types
// ============================================================================

/// CLI-specific errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Command failed: {message}")]
    CommandFailed { message: String },

    #[error("Invalid argument: {arg} - {message}")]
    InvalidArgument { arg: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Signing failed: {0}")]
    Signature(#[from] SignatureError),
}

impl CliError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) => 1,
            Self::CommandFailed { .. } => 2,
            Self::InvalidArgument { .. } => 3,
            Self::Io(_) => 4,
            Self::Signature(_) => 5,
        }
    }
}

// ============================================================================
// Entry point
// ============================================================================

/// Parse arguments and run the selected command
pub async fn run_cli() -> Result<(), CliError> {
    let cli = Cli::parse();
    initialize_logging(&cli);

    match cli.command {
        Commands::Sign { secret, file, data } => {
            let body = read_payload(file.as_deref(), data.as_deref())?;
            println!("{}", sign_payload(&body, &secret)?);
            Ok(())
        }
        Commands::Send {
            url,
            event_type,
            data,
            secret,
        } => {
            let body = build_delivery(&event_type, data.as_deref())?;
            let response = send_delivery(&url, body, secret.as_deref())
                .await
                .map_err(|e| CliError::CommandFailed {
                    message: format!("{:#}", e),
                })?;

            println!("{}", response.status);
            println!("{}", response.body);

            if response.status >= 400 {
                return Err(CliError::CommandFailed {
                    message: format!("receiver answered HTTP {}", response.status),
                });
            }
            Ok(())
        }
        Commands::Config {
            action: ConfigCommands::Check { file, show },
        } => {
            let config = check_config(&ConfigSources::for_file(&file))?;
            if show {
                println!("{:#?}", config);
            }
            println!("Configuration OK: {}", file.display());
            Ok(())
        }
    }
}

/// Logs go to stderr so command output stays pipeable.
fn initialize_logging(cli: &Cli) {
    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));

    let (json_layer, text_layer) = if cli.json_logs {
        (
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            ),
            None,
        )
    } else {
        (
            None,
            Some(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
        )
    };

    // A subscriber may already be installed when run inside tests.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .try_init();
}

// ============================================================================
// Command Implementations
// ============================================================================

/// Raw payload bytes from a file or an inline argument
pub fn read_payload(file: Option<&Path>, data: Option<&str>) -> Result<Vec<u8>, CliError> {
    match (file, data) {
        (Some(path), None) => Ok(std::fs::read(path)?),
        (None, Some(inline)) => Ok(inline.as_bytes().to_vec()),
        _ => Err(CliError::InvalidArgument {
            arg: "--file/--data".to_string(),
            message: "exactly one payload source is required".to_string(),
        }),
    }
}

/// Serialize a `{type, data}` delivery body
pub fn build_delivery(event_type: &str, data: Option<&str>) -> Result<Vec<u8>, CliError> {
    if event_type.is_empty() {
        return Err(CliError::InvalidArgument {
            arg: "--type".to_string(),
            message: "event type must not be empty".to_string(),
        });
    }

    let data = match data {
        Some(raw) => serde_json::from_str(raw).map_err(|e| CliError::InvalidArgument {
            arg: "--data".to_string(),
            message: format!("not valid JSON: {}", e),
        })?,
        None => serde_json::json!({}),
    };

    let body = serde_json::json!({ "type": event_type, "data": data });
    serde_json::to_vec(&body).map_err(|e| CliError::CommandFailed {
        message: e.to_string(),
    })
}

/// Receiver's answer to a test delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResponse {
    pub status: u16,
    pub body: String,
}

/// POST a delivery, signing it when a secret is given
pub async fn send_delivery(
    url: &str,
    body: Vec<u8>,
    secret: Option<&str>,
) -> anyhow::Result<DeliveryResponse> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("mirror-webhooks-cli/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")?;

    let mut request = client
        .post(url)
        .header(reqwest::header::CONTENT_TYPE, "application/json");

    if let Some(secret) = secret.filter(|s| !s.is_empty()) {
        let signature = sign_payload(&body, secret).context("failed to sign delivery")?;
        request = request.header(SIGNATURE_HEADER, signature);
    } else {
        info!("No secret given; sending unsigned delivery");
    }

    let response = request
        .body(body)
        .send()
        .await
        .with_context(|| format!("failed to deliver webhook to {}", url))?;

    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .context("failed to read receiver response")?;

    debug!(status, "Delivery answered");
    Ok(DeliveryResponse { status, body })
}

/// Load and validate configuration exactly as the service would
pub fn check_config(sources: &ConfigSources) -> Result<ServiceConfig, CliError> {
    if let Some(path) = sources.explicit_file.as_deref().map(Path::new) {
        if !path.exists() {
            return Err(CliError::Configuration(ConfigError::Missing {
                key: format!("file {}", path.display()),
            }));
        }
    }

    Ok(load_service_config(sources)?)
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
