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

//! Boots the gRPC stack on a real socket and drives it through the
//! health service: one successful call, one failing call that must be
//! logged by the error layer with the method field attached.

use std::convert::Infallible;
use std::task::{Context, Poll};

use http::{HeaderValue, Request, Response};
use stratus_grpc::server::serve_with_listener;
use stratus_logging::{CaptureSink, Logger, LoggerConfig};
use stratus_platform::signal::ShutdownSignal;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tonic::body::BoxBody;
use tonic::server::NamedService;
use tonic::transport::Channel;
use tonic_health::pb::health_check_response::ServingStatus;
use tonic_health::pb::health_client::HealthClient;
use tonic_health::pb::HealthCheckRequest;
use tower::Service;

/// Stand-in for an application service; every call reports Unimplemented.
#[derive(Clone)]
struct NoopService;

impl NamedService for NoopService {
    const NAME: &'static str = "stratus.test.Noop";
}

impl Service<Request<BoxBody>> for NoopService {
    type Response = Response<BoxBody>;
    type Error = Infallible;
    type Future = std::future::Ready<Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _req: Request<BoxBody>) -> Self::Future {
        let mut response = Response::new(tonic::body::empty_body());
        response.headers_mut().insert("content-type", HeaderValue::from_static("application/grpc"));
        response.headers_mut().insert("grpc-status", HeaderValue::from_static("12"));
        std::future::ready(Ok(response))
    }
}

#[tokio::test]
async fn health_rpcs_flow_through_the_middleware_stack() {
    let sink = CaptureSink::new();
    let logger = Logger::new(LoggerConfig::new(false).with_sink(Box::new(sink.clone())));

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("listener binds");
    let addr = listener.local_addr().expect("listener has an address");

    let (shutdown_tx, shutdown_rx) = broadcast::channel::<ShutdownSignal>(1);
    let server = tokio::spawn(serve_with_listener(listener, logger, None, NoopService, shutdown_rx));

    let channel = Channel::from_shared(format!("http://{addr}"))
        .expect("endpoint uri is valid")
        .connect()
        .await
        .expect("channel connects");
    let mut client = HealthClient::new(channel);

    // Overall server health is serving out of the box.
    let ok = client
        .check(HealthCheckRequest { service: String::new() })
        .await
        .expect("overall health check succeeds");
    assert_eq!(ok.into_inner().status(), ServingStatus::Serving);

    // Unknown service: the error layer must log the failed call.
    let status = client
        .check(HealthCheckRequest { service: "no.such.Service".to_owned() })
        .await
        .expect_err("unknown service must fail");
    assert_eq!(status.code(), tonic::Code::NotFound);

    shutdown_tx.send(ShutdownSignal::Manual).expect("server is subscribed");
    server.await.expect("server task joins").expect("server exits cleanly");

    let entries = sink.json_lines();
    let warning = entries
        .iter()
        .find(|entry| entry["severity"] == "WARNING")
        .expect("failed rpc was logged");
    assert!(
        warning["message"].as_str().unwrap_or_default().contains("NotFound"),
        "unexpected message: {warning}"
    );
    assert_eq!(warning["method"], "/grpc.health.v1.Health/Check");
}
