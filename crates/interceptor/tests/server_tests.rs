//! End-to-end tests: a real tonic server with the activity layer in front of
//! the standard gRPC health service.

use activity_interceptor::{ActivityInterceptor, ActivityInterceptorConfig, ActivityLayer};
use activity_interceptor_testing::{FailingIdGenerator, RecordingReporter, SequenceIdGenerator};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::{Channel, Server};
use tonic::Code;
use tonic_health::pb::health_check_response::ServingStatus as ResponseStatus;
use tonic_health::pb::health_client::HealthClient;
use tonic_health::pb::HealthCheckRequest;
use tonic_health::ServingStatus;

const CHECK_METHOD: &str = "/grpc.health.v1.Health/Check";

/// Start a server on an ephemeral localhost port and return its address.
async fn start_server(interceptor: ActivityInterceptor) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");

    let (mut health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_service_status("activity.test.Orders", ServingStatus::Serving)
        .await;

    tokio::spawn(async move {
        // Keep the reporter alive for the lifetime of the server.
        let _health_reporter = health_reporter;
        let _ = Server::builder()
            .layer(ActivityLayer::new(interceptor))
            .add_service(health_service)
            .serve_with_incoming(TcpListenerStream::new(listener))
            .await;
    });

    addr
}

async fn connect(addr: SocketAddr) -> HealthClient<Channel> {
    let channel = Channel::from_shared(format!("http://{}", addr))
        .expect("Failed to parse URI")
        .connect()
        .await
        .expect("Failed to connect");
    HealthClient::new(channel)
}

fn check_request(service: &str) -> tonic::Request<HealthCheckRequest> {
    tonic::Request::new(HealthCheckRequest {
        service: service.to_string(),
    })
}

#[tokio::test]
async fn test_successful_call_is_recorded() {
    let reporter = RecordingReporter::new();
    let interceptor = ActivityInterceptor::new(
        ActivityInterceptorConfig::new()
            .with_reporter(reporter.clone())
            .with_id_generator(SequenceIdGenerator::new("srv")),
    );
    let mut client = connect(start_server(interceptor).await).await;

    let response = client
        .check(check_request("activity.test.Orders"))
        .await
        .expect("Health check failed");
    assert_eq!(response.into_inner().status, ResponseStatus::Serving as i32);

    let record = reporter.last().expect("No activity recorded");
    assert_eq!(record.route_path, CHECK_METHOD);
    assert_eq!(record.caller_address, "127.0.0.1");
    assert_eq!(record.status_code, Code::Ok as i32);
    assert_eq!(record.correlation_id, "srv-1");
    assert!(record.response_time >= record.request_time);
}

#[tokio::test]
async fn test_failed_call_is_recorded_and_passed_through() {
    let reporter = RecordingReporter::new();
    let interceptor =
        ActivityInterceptor::new(ActivityInterceptorConfig::new().with_reporter(reporter.clone()));
    let mut client = connect(start_server(interceptor).await).await;

    let status = client
        .check(check_request("activity.test.Unknown"))
        .await
        .expect_err("Unregistered service must fail");
    assert_eq!(status.code(), Code::NotFound);

    let record = reporter.last().expect("No activity recorded");
    assert_eq!(record.status_code, Code::NotFound as i32);
    assert!(!record.correlation_id.is_empty());
}

#[tokio::test]
async fn test_inbound_correlation_id_is_kept() {
    let reporter = RecordingReporter::new();
    let interceptor =
        ActivityInterceptor::new(ActivityInterceptorConfig::new().with_reporter(reporter.clone()));
    let mut client = connect(start_server(interceptor).await).await;

    let mut request = check_request("activity.test.Orders");
    request
        .metadata_mut()
        .insert("x-operation-id", "existing-id".parse().unwrap());
    client.check(request).await.expect("Health check failed");

    assert_eq!(reporter.last().unwrap().correlation_id, "existing-id");
    assert_eq!(reporter.count(), 1);
}

#[tokio::test]
async fn test_generation_failure_reaches_caller() {
    let reporter = RecordingReporter::new();
    let interceptor = ActivityInterceptor::new(
        ActivityInterceptorConfig::new()
            .with_reporter(reporter.clone())
            .with_id_generator(FailingIdGenerator::new("entropy exhausted")),
    );
    let mut client = connect(start_server(interceptor).await).await;

    let status = client
        .check(check_request("activity.test.Orders"))
        .await
        .expect_err("Call must abort when no correlation ID can be made");

    assert_eq!(status.code(), Code::Internal);
    assert_eq!(
        status.message(),
        "Correlation ID generation failed: entropy exhausted"
    );
    assert_eq!(reporter.count(), 0);
}
