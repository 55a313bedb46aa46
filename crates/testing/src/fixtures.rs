//! Test fixtures: contexts, routes and canned handlers.

use activity_interceptor::{CallContext, RouteInfo, DEFAULT_CORRELATION_HEADER};
use futures::future::{ready, Ready};
use std::net::{IpAddr, SocketAddr};
use tonic::Status;

/// Method path used throughout the test suite.
pub const TEST_METHOD: &str = "/test.v1/TestMethod";

pub fn test_route() -> RouteInfo {
    RouteInfo::new(TEST_METHOD)
}

/// Context whose peer is a TCP socket from `ip` on an ephemeral port.
///
/// # Panics
///
/// Panics if `ip` is not a valid IP address.
pub fn context_with_tcp_peer(ip: &str) -> CallContext {
    let ip: IpAddr = ip.parse().expect("fixture IP must parse");
    CallContext::builder()
        .tcp_peer(SocketAddr::new(ip, 52_000))
        .build()
}

/// Context carrying `id` under the default correlation header.
pub fn context_with_correlation_id(id: &str) -> CallContext {
    CallContext::builder()
        .header(DEFAULT_CORRELATION_HEADER, id)
        .build()
}

/// Handler that fails every call with `NOT_FOUND`.
pub fn not_found_handler<Req>() -> impl FnOnce(CallContext, Req) -> Ready<Result<(), Status>> {
    |_, _| ready(Err(Status::not_found("not found")))
}

/// Handler that echoes its request back.
pub fn echo_handler<Req>() -> impl FnOnce(CallContext, Req) -> Ready<Result<Req, Status>> {
    |_, request| ready(Ok(request))
}

/// Handler that fails with `status`.
pub fn failing_handler<Req, Resp>(
    status: Status,
) -> impl FnOnce(CallContext, Req) -> Ready<Result<Resp, Status>> {
    move |_, _| ready(Err(status))
}
