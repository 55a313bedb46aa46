//! Example gRPC server with activity capture in front of the health service
//!
//! Run with:
//! cargo run --example health_server
//!
//! Then, for instance:
//! grpcurl -plaintext -H 'x-operation-id: demo-1' \
//!     -d '{"service": ""}' localhost:50051 grpc.health.v1.Health/Check

use activity_interceptor::{ActivityInterceptor, ActivityInterceptorConfig, ActivityLayer};
use activity_interceptor_common::{config::AppConfig, telemetry::init_tracing};
use std::net::SocketAddr;
use tonic::transport::Server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    init_tracing(&config.telemetry)?;

    let interceptor = ActivityInterceptor::new(ActivityInterceptorConfig::from_settings(
        &config.interceptor,
    ));
    let addr: SocketAddr = config.server.bind_address().parse()?;

    let (_health_reporter, health_service) = tonic_health::server::health_reporter();

    tracing::info!(
        %addr,
        correlation_header = %interceptor.correlation_header(),
        "Starting gRPC server with activity capture"
    );

    Server::builder()
        .layer(ActivityLayer::new(interceptor))
        .add_service(health_service)
        .serve(addr)
        .await?;

    Ok(())
}
