//! Reporters consume completed activity records.
//!
//! The interceptor calls the reporter synchronously, once per call, before the
//! handler's result is returned. A reporter that must never disturb the call
//! path has to swallow its own failures; the reporters in this module do.

use crate::context::{split_route_path, CallContext};
use crate::record::ActivityRecord;
use activity_interceptor_common::config::ReportFormat;
use parking_lot::Mutex;
use std::io::{self, Write};
use tracing::{info, warn};

/// Sink for completed activity records.
pub trait ActivityReporter: Send + Sync {
    fn report(&self, context: &CallContext, record: &ActivityRecord);
}

impl<F> ActivityReporter for F
where
    F: Fn(&CallContext, &ActivityRecord) + Send + Sync,
{
    fn report(&self, context: &CallContext, record: &ActivityRecord) {
        self(context, record)
    }
}

/// Writes one line per record to any `Write` sink.
pub struct StreamReporter<W> {
    writer: Mutex<W>,
    format: ReportFormat,
}

impl<W: Write + Send> StreamReporter<W> {
    pub fn new(writer: W, format: ReportFormat) -> Self {
        Self {
            writer: Mutex::new(writer),
            format,
        }
    }

    fn render(&self, record: &ActivityRecord) -> io::Result<String> {
        match self.format {
            ReportFormat::Text => Ok(record.to_string()),
            ReportFormat::Json => serde_json::to_string(record).map_err(io::Error::from),
        }
    }

    fn write_line(&self, record: &ActivityRecord) -> io::Result<()> {
        let line = self.render(record)?;
        let mut writer = self.writer.lock();
        writeln!(writer, "{}", line)?;
        writer.flush()
    }
}

impl StreamReporter<io::Stdout> {
    /// The default reporter: text lines on standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout(), ReportFormat::Text)
    }
}

impl<W: Write + Send> ActivityReporter for StreamReporter<W> {
    fn report(&self, _context: &CallContext, record: &ActivityRecord) {
        if let Err(e) = self.write_line(record) {
            warn!(
                correlation_id = %record.correlation_id,
                error = %e,
                "Failed to write activity record"
            );
        }
    }
}

/// Emits each record as a structured `tracing` event at INFO level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ActivityReporter for TracingReporter {
    fn report(&self, _context: &CallContext, record: &ActivityRecord) {
        let (service, method) = split_route_path(&record.route_path).unwrap_or(("", ""));

        info!(
            target: "activity",
            caller_address = %record.caller_address,
            correlation_id = %record.correlation_id,
            rpc.path = %record.route_path,
            rpc.service = %service,
            rpc.method = %method,
            status_code = record.status_code,
            latency_ms = record.latency().num_milliseconds(),
            "gRPC call completed"
        );
    }
}
