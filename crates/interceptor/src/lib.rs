//! Request-activity capture for tonic gRPC servers.
//!
//! For every unary call the [`ActivityInterceptor`] records caller address,
//! timing, route path, a correlation ID and the outcome status, then hands
//! the [`ActivityRecord`] to a pluggable [`ActivityReporter`]. It never
//! touches payloads and returns the handler's result unchanged.
//!
//! Mount it per method with [`ActivityInterceptor::intercept`], or in front
//! of a whole router with [`ActivityLayer`].

pub mod context;
pub mod correlation;
pub mod error;
pub mod interceptor;
pub mod layer;
pub mod record;
pub mod reporter;

pub use context::{CallContext, CallContextBuilder, Peer, RouteInfo};
pub use correlation::{CorrelationId, IdGenerator, UuidGenerator, DEFAULT_CORRELATION_HEADER};
pub use error::{ClassifyStatus, InterceptorError, InterceptorResult};
pub use interceptor::{ActivityInterceptor, ActivityInterceptorConfig};
pub use layer::{ActivityLayer, ActivityService};
pub use record::ActivityRecord;
pub use reporter::{ActivityReporter, StreamReporter, TracingReporter};
