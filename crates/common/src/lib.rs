//! Shared plumbing for the activity interceptor.
//!
//! This crate provides the pieces every process mounting the interceptor needs:
//! - Configuration loading (files + environment)
//! - Telemetry and structured logging setup
//! - Timestamp helpers used when rendering activity records

pub mod config;
pub mod datetime;
pub mod telemetry;

// Re-export commonly used types
pub use config::{
    AppConfig, IdFormat, InterceptorSettings, ReportFormat, ReporterKind, ServerConfig,
    TelemetryConfig, DEFAULT_CORRELATION_HEADER,
};
pub use datetime::{format_datetime, now_utc};
pub use telemetry::init_tracing;
