//! Tower layer that puts the activity interceptor in front of a whole tonic
//! router.
//!
//! ```ignore
//! Server::builder()
//!     .layer(ActivityLayer::new(interceptor))
//!     .add_service(health_service)
//!     .serve(addr)
//!     .await?;
//! ```

use crate::context::{CallContext, RouteInfo};
use crate::error::InterceptorError;
use crate::interceptor::ActivityInterceptor;
use futures::future::BoxFuture;
use std::task::{Context, Poll};
use tonic::{Code, Status};
use tower::{Layer, Service};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error carried through the capture logic. Interceptor failures are boxed as
/// a [`Status`] so tonic can answer the caller with a gRPC error instead of
/// resetting the stream.
struct LayerError(BoxError);

impl From<InterceptorError> for LayerError {
    fn from(err: InterceptorError) -> Self {
        Self(Box::new(Status::from(err)))
    }
}

/// Layer that records every call passing through the wrapped service.
#[derive(Debug, Clone)]
pub struct ActivityLayer {
    interceptor: ActivityInterceptor,
}

impl ActivityLayer {
    pub fn new(interceptor: ActivityInterceptor) -> Self {
        Self { interceptor }
    }
}

impl<S> Layer<S> for ActivityLayer {
    type Service = ActivityService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ActivityService {
            inner,
            interceptor: self.interceptor.clone(),
        }
    }
}

/// Service produced by [`ActivityLayer`]
#[derive(Debug, Clone)]
pub struct ActivityService<S> {
    inner: S,
    interceptor: ActivityInterceptor,
}

impl<S, ReqBody, ResBody> Service<http::Request<ReqBody>> for ActivityService<S>
where
    S: Service<http::Request<ReqBody>, Response = http::Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Into<BoxError>,
    ReqBody: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = S::Response;
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, req: http::Request<ReqBody>) -> Self::Future {
        // Drive the instance that was polled ready; leave a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let interceptor = self.interceptor.clone();

        Box::pin(async move {
            let route = RouteInfo::new(req.uri().path());
            let context = CallContext::from_http(&req);

            interceptor
                .observe(
                    context,
                    req,
                    &route,
                    |_, req| async move { inner.call(req).await.map_err(|e| LayerError(e.into())) },
                    response_code,
                )
                .await
                .map_err(|LayerError(e)| e)
        })
    }
}

/// Status of a call as visible in the response head. Unary failures are sent
/// as trailers-only responses, so `grpc-status` lands in the headers; a head
/// without it belongs to a successful call.
fn response_code<ResBody>(result: &Result<http::Response<ResBody>, LayerError>) -> Code {
    match result {
        Ok(response) => Status::from_header_map(response.headers())
            .map(|status| status.code())
            .unwrap_or(Code::Ok),
        Err(_) => Code::Unknown,
    }
}
