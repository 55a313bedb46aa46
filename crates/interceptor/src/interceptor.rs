//! The activity interceptor: captures one [`ActivityRecord`] per unary call.

use crate::context::{CallContext, RouteInfo};
use crate::correlation::{self, IdGenerator, UuidGenerator};
use crate::error::{ClassifyStatus, InterceptorError};
use crate::record::ActivityRecord;
use crate::reporter::{ActivityReporter, StreamReporter, TracingReporter};
use activity_interceptor_common::config::{InterceptorSettings, ReporterKind};
use chrono::Utc;
use std::fmt;
use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Instant;
use tonic::{Code, Request, Response, Status};
use tracing::{debug, trace, warn};

/// Construction options. Every field is optional; unset fields get defaults.
#[derive(Clone, Default)]
pub struct ActivityInterceptorConfig {
    /// Inbound metadata key carrying the correlation ID (default `x-operation-id`)
    pub correlation_header: Option<String>,
    /// Receives each completed record (default: text lines on stdout)
    pub reporter: Option<Arc<dyn ActivityReporter>>,
    /// Source of fresh correlation IDs (default: UUID v4)
    pub id_generator: Option<Arc<dyn IdGenerator>>,
}

impl ActivityInterceptorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_correlation_header(mut self, header: impl Into<String>) -> Self {
        self.correlation_header = Some(header.into());
        self
    }

    pub fn with_reporter(mut self, reporter: impl ActivityReporter + 'static) -> Self {
        self.reporter = Some(Arc::new(reporter));
        self
    }

    pub fn with_id_generator(mut self, generator: impl IdGenerator + 'static) -> Self {
        self.id_generator = Some(Arc::new(generator));
        self
    }

    /// Build a configuration from loaded settings.
    pub fn from_settings(settings: &InterceptorSettings) -> Self {
        let reporter: Arc<dyn ActivityReporter> = match settings.reporter {
            ReporterKind::Stdout => Arc::new(StreamReporter::new(io::stdout(), settings.report_format)),
            ReporterKind::Tracing => Arc::new(TracingReporter),
        };

        Self {
            correlation_header: Some(settings.correlation_header.clone()),
            reporter: Some(reporter),
            id_generator: Some(Arc::new(UuidGenerator::new(settings.id_format))),
        }
    }
}

impl fmt::Debug for ActivityInterceptorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivityInterceptorConfig")
            .field("correlation_header", &self.correlation_header)
            .field("reporter", &self.reporter.is_some())
            .field("id_generator", &self.id_generator.is_some())
            .finish()
    }
}

/// Observes unary calls and reports an [`ActivityRecord`] for each.
///
/// Immutable after construction and cheap to clone; one instance serves any
/// number of concurrent calls.
#[derive(Clone)]
pub struct ActivityInterceptor {
    correlation_header: Arc<str>,
    reporter: Arc<dyn ActivityReporter>,
    id_generator: Arc<dyn IdGenerator>,
}

impl ActivityInterceptor {
    /// Create an interceptor, filling every unset option with its default.
    pub fn new(config: ActivityInterceptorConfig) -> Self {
        let correlation_header = correlation::normalize_header(config.correlation_header.as_deref());
        if !correlation::is_valid_header(&correlation_header) {
            warn!(
                header = %correlation_header,
                "Correlation header is not a valid metadata key; every call will get a generated ID"
            );
        }

        Self {
            correlation_header: correlation_header.into(),
            reporter: config
                .reporter
                .unwrap_or_else(|| Arc::new(StreamReporter::stdout())),
            id_generator: config
                .id_generator
                .unwrap_or_else(|| Arc::new(UuidGenerator::default())),
        }
    }

    pub fn correlation_header(&self) -> &str {
        &self.correlation_header
    }

    /// Run `next` for one call and report what happened.
    ///
    /// The handler's response or failure is returned untouched. The only
    /// failure this adds is a correlation ID generation error, which aborts
    /// the call before the handler runs.
    pub async fn wrap<Req, Resp, E, H, Fut>(
        &self,
        context: CallContext,
        request: Req,
        route: &RouteInfo,
        next: H,
    ) -> Result<Resp, E>
    where
        H: FnOnce(CallContext, Req) -> Fut,
        Fut: Future<Output = Result<Resp, E>>,
        E: ClassifyStatus + From<InterceptorError>,
    {
        self.observe(context, request, route, next, |result| match result {
            Ok(_) => Code::Ok,
            Err(e) => e.status_code(),
        })
        .await
    }

    /// [`wrap`](Self::wrap) for a hand-written tonic service method.
    ///
    /// ```ignore
    /// async fn check(&self, request: Request<CheckRequest>) -> Result<Response<CheckReply>, Status> {
    ///     let route = RouteInfo::new("/inventory.v1.Stock/Check");
    ///     self.activity
    ///         .intercept(request, &route, |request| self.inner.check(request))
    ///         .await
    /// }
    /// ```
    pub async fn intercept<T, U, H, Fut>(
        &self,
        request: Request<T>,
        route: &RouteInfo,
        next: H,
    ) -> Result<Response<U>, Status>
    where
        H: FnOnce(Request<T>) -> Fut,
        Fut: Future<Output = Result<Response<U>, Status>>,
    {
        let context = CallContext::from_request(&request);
        self.wrap(context, request, route, |_, request| next(request))
            .await
    }

    /// Shared capture logic; `classify` maps the handler result to a status.
    pub(crate) async fn observe<Req, Resp, E, H, Fut, C>(
        &self,
        context: CallContext,
        request: Req,
        route: &RouteInfo,
        next: H,
        classify: C,
    ) -> Result<Resp, E>
    where
        H: FnOnce(CallContext, Req) -> Fut,
        Fut: Future<Output = Result<Resp, E>>,
        E: From<InterceptorError>,
        C: FnOnce(&Result<Resp, E>) -> Code,
    {
        let started = Instant::now();
        let request_time = Utc::now();

        let caller_address = context.caller_address();
        if caller_address.is_empty() {
            trace!(route = %route.full_method(), "No TCP peer on call context");
        }

        let correlation_id = correlation::resolve(
            context.metadata(),
            &self.correlation_header,
            self.id_generator.as_ref(),
        )?;
        if !correlation_id.is_propagated() {
            debug!(
                correlation_id = %correlation_id.as_str(),
                route = %route.full_method(),
                "Generated correlation ID"
            );
        }

        let result = next(context.clone(), request).await;

        let response_time = request_time
            + chrono::Duration::from_std(started.elapsed()).unwrap_or_else(|_| chrono::Duration::zero());

        let record = ActivityRecord {
            caller_address,
            request_time,
            response_time,
            correlation_id: correlation_id.into_string(),
            route_path: route.full_method().to_string(),
            status_code: classify(&result) as i32,
        };

        self.reporter.report(&context, &record);

        result
    }
}

impl Default for ActivityInterceptor {
    fn default() -> Self {
        Self::new(ActivityInterceptorConfig::default())
    }
}

impl fmt::Debug for ActivityInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivityInterceptor")
            .field("correlation_header", &self.correlation_header)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlation::from_fn;
    use parking_lot::Mutex;

    fn recording() -> (Arc<Mutex<Vec<ActivityRecord>>>, ActivityInterceptorConfig) {
        let records = Arc::new(Mutex::new(Vec::new()));
        let sink = records.clone();
        let config = ActivityInterceptorConfig::new().with_reporter(
            move |_: &CallContext, record: &ActivityRecord| sink.lock().push(record.clone()),
        );
        (records, config)
    }

    #[test]
    fn test_defaults() {
        let interceptor = ActivityInterceptor::new(ActivityInterceptorConfig::default());
        assert_eq!(interceptor.correlation_header(), "x-operation-id");

        let interceptor = ActivityInterceptor::new(
            ActivityInterceptorConfig::new().with_correlation_header(""),
        );
        assert_eq!(interceptor.correlation_header(), "x-operation-id");
    }

    #[test]
    fn test_from_settings() {
        let settings = InterceptorSettings {
            correlation_header: "X-Request-Id".to_string(),
            reporter: ReporterKind::Tracing,
            ..Default::default()
        };
        let interceptor = ActivityInterceptor::new(ActivityInterceptorConfig::from_settings(&settings));
        assert_eq!(interceptor.correlation_header(), "x-request-id");
    }

    #[tokio::test]
    async fn test_wrap_success() {
        let (records, config) = recording();
        let interceptor = ActivityInterceptor::new(config.with_id_generator(from_fn(|| "gen-1".to_string())));
        let route = RouteInfo::new("/test.v1/TestMethod");

        let result: Result<u32, Status> = interceptor
            .wrap(CallContext::default(), 20, &route, |_, req| async move { Ok(req + 1) })
            .await;

        assert_eq!(result.unwrap(), 21);
        let records = records.lock();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status_code, 0);
        assert_eq!(records[0].correlation_id, "gen-1");
        assert_eq!(records[0].route_path, "/test.v1/TestMethod");
        assert!(records[0].response_time >= records[0].request_time);
    }

    #[tokio::test]
    async fn test_invalid_header_name_falls_back_to_generation() {
        let (records, config) = recording();
        let interceptor = ActivityInterceptor::new(
            config
                .with_correlation_header("x op id")
                .with_id_generator(from_fn(|| "gen-2".to_string())),
        );
        let route = RouteInfo::new("/test.v1/TestMethod");

        let result: Result<(), Status> = interceptor
            .wrap(CallContext::default(), (), &route, |_, _| async { Ok(()) })
            .await;

        assert!(result.is_ok());
        assert_eq!(interceptor.correlation_header(), "x op id");
        assert_eq!(records.lock()[0].correlation_id, "gen-2");
    }

    #[tokio::test]
    async fn test_wrap_failure_passthrough() {
        let (records, config) = recording();
        let interceptor = ActivityInterceptor::new(config);
        let route = RouteInfo::new("/test.v1/TestMethod");

        let result: Result<(), Status> = interceptor
            .wrap(CallContext::default(), (), &route, |_, _| async {
                Err(Status::not_found("not found"))
            })
            .await;

        let status = result.unwrap_err();
        assert_eq!(status.code(), Code::NotFound);
        assert_eq!(status.message(), "not found");
        assert_eq!(records.lock()[0].status_code, Code::NotFound as i32);
    }

    #[tokio::test]
    async fn test_generation_failure_aborts_call() {
        let (records, config) = recording();
        let interceptor = ActivityInterceptor::new(config.with_id_generator(|| {
            Err::<String, _>(InterceptorError::IdGeneration("exhausted".to_string()))
        }));
        let route = RouteInfo::new("/test.v1/TestMethod");
        let mut handler_ran = false;

        let result: Result<(), Status> = interceptor
            .wrap(CallContext::default(), (), &route, |_, _| {
                handler_ran = true;
                async { Ok(()) }
            })
            .await;

        assert_eq!(result.unwrap_err().code(), Code::Internal);
        assert!(!handler_ran);
        assert!(records.lock().is_empty());
    }

    #[tokio::test]
    async fn test_intercept_tonic_request() {
        let (records, config) = recording();
        let interceptor = ActivityInterceptor::new(config);
        let route = RouteInfo::new("/test.v1/Echo");

        let mut request = Request::new("ping".to_string());
        request
            .metadata_mut()
            .insert("x-operation-id", "caller-op".parse().unwrap());

        let response = interceptor
            .intercept(request, &route, |request| async move {
                Ok(Response::new(request.into_inner().to_uppercase()))
            })
            .await
            .unwrap();

        assert_eq!(response.into_inner(), "PING");
        assert_eq!(records.lock()[0].correlation_id, "caller-op");
    }
}
