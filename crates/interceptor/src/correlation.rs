//! Correlation ID acquisition.
//!
//! A call keeps the correlation ID its caller sent in the configured metadata
//! key. Calls arriving without one get a fresh ID from the configured
//! generator.

use crate::error::{InterceptorError, InterceptorResult};
use activity_interceptor_common::config::IdFormat;
use tonic::metadata::{Ascii, MetadataKey, MetadataMap};
use uuid::Uuid;

pub use activity_interceptor_common::config::DEFAULT_CORRELATION_HEADER;

/// Produces new correlation IDs on demand.
///
/// Implementations are shared by every concurrent call and must be
/// internally thread-safe.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> InterceptorResult<String>;
}

impl<F> IdGenerator for F
where
    F: Fn() -> InterceptorResult<String> + Send + Sync,
{
    fn generate(&self) -> InterceptorResult<String> {
        self()
    }
}

/// UUID-backed generator. Random (v4) unless configured as time-ordered (v7).
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator {
    format: IdFormat,
}

impl UuidGenerator {
    pub fn new(format: IdFormat) -> Self {
        Self { format }
    }

    pub fn v4() -> Self {
        Self::new(IdFormat::UuidV4)
    }

    pub fn v7() -> Self {
        Self::new(IdFormat::UuidV7)
    }
}

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> InterceptorResult<String> {
        let id = match self.format {
            IdFormat::UuidV4 => Uuid::new_v4(),
            IdFormat::UuidV7 => Uuid::now_v7(),
        };
        Ok(id.to_string())
    }
}

/// Adapter for generators that cannot fail.
#[derive(Debug, Clone, Copy)]
pub struct InfallibleGenerator<F>(F);

impl<F> IdGenerator for InfallibleGenerator<F>
where
    F: Fn() -> String + Send + Sync,
{
    fn generate(&self) -> InterceptorResult<String> {
        Ok((self.0)())
    }
}

/// Wrap an infallible closure as an [`IdGenerator`].
pub fn from_fn<F>(f: F) -> InfallibleGenerator<F>
where
    F: Fn() -> String + Send + Sync,
{
    InfallibleGenerator(f)
}

/// A correlation ID together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorrelationId {
    /// Copied verbatim from inbound metadata
    Propagated(String),
    /// Produced by the generator for this call
    Generated(String),
}

impl CorrelationId {
    pub fn as_str(&self) -> &str {
        match self {
            CorrelationId::Propagated(id) | CorrelationId::Generated(id) => id,
        }
    }

    pub fn is_propagated(&self) -> bool {
        matches!(self, CorrelationId::Propagated(_))
    }

    pub fn into_string(self) -> String {
        match self {
            CorrelationId::Propagated(id) | CorrelationId::Generated(id) => id,
        }
    }
}

/// Canonical form of a configured header name. Blank names fall back to the
/// default header.
pub fn normalize_header(name: Option<&str>) -> String {
    match name.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_ascii_lowercase(),
        _ => DEFAULT_CORRELATION_HEADER.to_string(),
    }
}

/// Whether `name` can appear as a metadata key at all.
pub fn is_valid_header(name: &str) -> bool {
    MetadataKey::<Ascii>::from_bytes(name.as_bytes()).is_ok()
}

/// First value of `header` when it is present, printable ASCII and non-empty.
pub fn inbound(metadata: &MetadataMap, header: &str) -> Option<String> {
    metadata
        .get(header)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Reuse the inbound correlation ID or generate a new one.
pub fn resolve(
    metadata: &MetadataMap,
    header: &str,
    generator: &dyn IdGenerator,
) -> InterceptorResult<CorrelationId> {
    if let Some(id) = inbound(metadata, header) {
        return Ok(CorrelationId::Propagated(id));
    }

    let id = generator.generate()?;
    if id.is_empty() {
        return Err(InterceptorError::EmptyCorrelationId);
    }
    Ok(CorrelationId::Generated(id))
}
