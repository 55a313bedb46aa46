//! Mock reporters, ID generators and sinks.

use activity_interceptor::{
    ActivityRecord, ActivityReporter, CallContext, IdGenerator, InterceptorError,
    InterceptorResult,
};
use parking_lot::{Mutex, RwLock};
use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Reporter that keeps every record (and the context it came with) in memory.
///
/// Clones share storage, so a clone can be handed to the interceptor while
/// the test keeps the original for assertions.
#[derive(Clone, Default)]
pub struct RecordingReporter {
    reports: Arc<RwLock<Vec<(CallContext, ActivityRecord)>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<ActivityRecord> {
        self.reports
            .read()
            .iter()
            .map(|(_, record)| record.clone())
            .collect()
    }

    pub fn contexts(&self) -> Vec<CallContext> {
        self.reports
            .read()
            .iter()
            .map(|(context, _)| context.clone())
            .collect()
    }

    pub fn last(&self) -> Option<ActivityRecord> {
        self.reports.read().last().map(|(_, record)| record.clone())
    }

    pub fn count(&self) -> usize {
        self.reports.read().len()
    }

    pub fn clear(&self) {
        self.reports.write().clear();
    }
}

impl ActivityReporter for RecordingReporter {
    fn report(&self, context: &CallContext, record: &ActivityRecord) {
        self.reports.write().push((context.clone(), record.clone()));
    }
}

/// Deterministic generator yielding `prefix-1`, `prefix-2`, ...
#[derive(Clone)]
pub struct SequenceIdGenerator {
    prefix: String,
    next: Arc<AtomicUsize>,
}

impl SequenceIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: Arc::new(AtomicUsize::new(1)),
        }
    }

    /// How many IDs have been handed out so far.
    pub fn issued(&self) -> usize {
        self.next.load(Ordering::SeqCst) - 1
    }
}

impl IdGenerator for SequenceIdGenerator {
    fn generate(&self) -> InterceptorResult<String> {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        Ok(format!("{}-{}", self.prefix, n))
    }
}

/// Generator that always fails.
#[derive(Debug, Clone)]
pub struct FailingIdGenerator {
    reason: String,
}

impl FailingIdGenerator {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl IdGenerator for FailingIdGenerator {
    fn generate(&self) -> InterceptorResult<String> {
        Err(InterceptorError::IdGeneration(self.reason.clone()))
    }
}

/// In-memory `Write` sink whose clones share one buffer.
#[derive(Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
