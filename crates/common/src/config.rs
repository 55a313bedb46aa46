//! Configuration management.
//!
//! Settings are loaded from configuration files and environment variables.
//! Every field has a default, so an empty environment yields a working
//! configuration.
//!
//! ## Example Configuration
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 50051
//!
//! [telemetry]
//! service_name = "orders"
//! json_logging = true
//! log_level = "info"
//!
//! [interceptor]
//! correlation_header = "x-operation-id"
//! reporter = "tracing"
//! report_format = "json"
//! id_format = "uuid_v7"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Metadata key carrying a caller-supplied correlation ID when none is configured.
pub const DEFAULT_CORRELATION_HEADER: &str = "x-operation-id";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    /// Activity capture settings
    #[serde(default)]
    pub interceptor: InterceptorSettings,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to (e.g., "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    /// `host:port` string suitable for `SocketAddr` parsing
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Service name attached to log output
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Enable JSON logging format
    #[serde(default)]
    pub json_logging: bool,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            json_logging: false,
            log_level: default_log_level(),
        }
    }
}

/// Where completed activity records are delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReporterKind {
    /// One line per record on standard output
    #[default]
    Stdout,
    /// One structured `tracing` event per record
    Tracing,
}

/// Line format used by stream reporters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    /// `key=value` pairs
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Algorithm used for freshly generated correlation IDs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdFormat {
    /// Random UUID
    #[default]
    UuidV4,
    /// Time-ordered UUID
    UuidV7,
}

/// Activity interceptor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterceptorSettings {
    /// Inbound metadata key carrying the correlation ID
    #[serde(default = "default_correlation_header")]
    pub correlation_header: String,

    #[serde(default)]
    pub reporter: ReporterKind,

    #[serde(default)]
    pub report_format: ReportFormat,

    #[serde(default)]
    pub id_format: IdFormat,
}

impl Default for InterceptorSettings {
    fn default() -> Self {
        Self {
            correlation_header: default_correlation_header(),
            reporter: ReporterKind::default(),
            report_format: ReportFormat::default(),
            id_format: IdFormat::default(),
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    50051
}

fn default_service_name() -> String {
    "activity-interceptor".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_correlation_header() -> String {
    DEFAULT_CORRELATION_HEADER.to_string()
}

impl AppConfig {
    /// Load configuration from environment variables and configuration files.
    ///
    /// The configuration is loaded in the following order (later sources override earlier ones):
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/{environment}.toml (if exists, where environment is from ACTIVITY_ENV)
    /// 4. Environment variables (prefixed with ACTIVITY_)
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use activity_interceptor_common::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load configuration");
    /// println!("Correlation header: {}", config.interceptor.correlation_header);
    /// ```
    pub fn load() -> Result<Self> {
        let env = std::env::var("ACTIVITY_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            // Example: ACTIVITY_INTERCEPTOR__CORRELATION_HEADER=x-request-id
            .add_source(
                config::Environment::with_prefix("ACTIVITY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        if !LOG_LEVELS.contains(&self.telemetry.log_level.to_lowercase().as_str()) {
            anyhow::bail!(
                "Invalid log level '{}', expected one of {:?}",
                self.telemetry.log_level,
                LOG_LEVELS
            );
        }

        // Binary metadata cannot carry a textual correlation ID.
        if self
            .interceptor
            .correlation_header
            .trim()
            .to_lowercase()
            .ends_with("-bin")
        {
            anyhow::bail!(
                "Correlation header '{}' names binary metadata",
                self.interceptor.correlation_header
            );
        }

        Ok(())
    }
}
