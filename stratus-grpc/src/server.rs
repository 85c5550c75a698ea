// Copyright 2025 The stratus Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

use std::convert::Infallible;
use std::net::SocketAddr;

use stratus_error::{Context, Result};
use stratus_http::TraceLogLayer;
use stratus_logging::Logger;
use stratus_platform::signal::ShutdownSignal;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::body::BoxBody;
use tonic::server::NamedService;
use tonic::transport::Server;
use tower::{Service, ServiceBuilder};

use crate::ErrorLogLayer;

/// Address from `HOST_ADDR`/`GRPC_PORT`, defaulting to `0.0.0.0:8080`.
/// The port env var differs from the HTTP one so both servers can share
/// a process locally.
pub fn bind_addr() -> Result<SocketAddr> {
    let port = std::env::var("GRPC_PORT").unwrap_or_else(|_| "8080".to_owned());
    let host = std::env::var("HOST_ADDR").unwrap_or_else(|_| "0.0.0.0".to_owned());

    format!("{host}:{port}").parse().context("failed to parse grpc listen address")
}

/// Serves `service` on the env-derived address until a shutdown signal
/// arrives. See [`serve_with_listener`].
pub async fn serve<S>(
    logger: Logger,
    project_id: Option<String>,
    service: S,
    shutdown: broadcast::Receiver<ShutdownSignal>,
) -> Result<()>
where
    S: Service<http::Request<BoxBody>, Response = http::Response<BoxBody>, Error = Infallible>
        + NamedService
        + Clone
        + Send
        + 'static,
    S::Future: Send + 'static,
{
    let listener = TcpListener::bind(bind_addr()?).await.context("failed to bind grpc listener")?;
    serve_with_listener(listener, logger, project_id, service, shutdown).await
}

/// Serves `service` on an already-bound listener, wired with the trace
/// middleware (method field enabled) and the unary error logger, plus the
/// standard health service so the platform and peers can probe readiness.
pub async fn serve_with_listener<S>(
    listener: TcpListener,
    logger: Logger,
    project_id: Option<String>,
    service: S,
    mut shutdown: broadcast::Receiver<ShutdownSignal>,
) -> Result<()>
where
    S: Service<http::Request<BoxBody>, Response = http::Response<BoxBody>, Error = Infallible>
        + NamedService
        + Clone
        + Send
        + 'static,
    S::Future: Send + 'static,
{
    let local_addr = listener.local_addr().context("failed to read local address")?;
    logger.info(format!("grpc server listening on {local_addr}"));

    // Trace layer outermost so the error logger below it finds the bound
    // logger in the request extensions.
    let middleware = ServiceBuilder::new()
        .layer(TraceLogLayer::new(logger.clone(), project_id).with_method_field(true))
        .layer(ErrorLogLayer::new())
        .into_inner();

    let (_health_reporter, health_service) = tonic_health::server::health_reporter();

    let shutdown_logger = logger.clone();
    Server::builder()
        .layer(middleware)
        .add_service(health_service)
        .add_service(service)
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async move {
            match shutdown.recv().await {
                Ok(signal) => shutdown_logger.info(format!("received {signal}, shutting down")),
                Err(_) => shutdown_logger.warn("shutdown channel closed, shutting down"),
            }
        })
        .await
        .context("grpc server exited with error")?;

    logger.debug("grpc server shut down");
    Ok(())
}
