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

use std::net::SocketAddr;
use std::time::Duration;

use http::{Request, Response};
use http_body::Body;
use hyper::body::Incoming;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use hyper_util::server::graceful::GracefulShutdown;
use hyper_util::service::TowerToHyperService;
use stratus_error::{Context, Result};
use stratus_logging::Logger;
use stratus_platform::signal::ShutdownSignal;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::Service;

// The platform sends SIGTERM and allows little drain time beyond this
// before killing the instance.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// HTTP server bound to the address the platform dictates through
/// `HOST_ADDR` and `PORT`.
pub struct Server {
    addr: SocketAddr,
    logger: Logger,
}

impl Server {
    /// Address from `HOST_ADDR`/`PORT`, defaulting to `0.0.0.0:8080` per
    /// the container contract.
    pub fn from_env(logger: Logger) -> Result<Self> {
        let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_owned());
        let host = std::env::var("HOST_ADDR").unwrap_or_else(|_| "0.0.0.0".to_owned());

        let addr = format!("{host}:{port}").parse().context("failed to parse listen address")?;
        Ok(Server { addr, logger })
    }

    pub fn with_addr(addr: SocketAddr, logger: Logger) -> Self {
        Server { addr, logger }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Binds the listener for this server's address.
    pub async fn listen(&self) -> Result<TcpListener> {
        TcpListener::bind(self.addr).await.context("failed to bind listener")
    }

    /// Serves connections until a shutdown signal arrives, then drains
    /// in-flight connections for at most the platform's grace period.
    pub async fn serve<S, B>(
        &self,
        listener: TcpListener,
        service: S,
        mut shutdown: broadcast::Receiver<ShutdownSignal>,
    ) -> Result<()>
    where
        S: Service<Request<Incoming>, Response = Response<B>> + Clone + Send + 'static,
        S::Error: Into<stratus_error::Error>,
        S::Future: Send,
        B: Body + Send + 'static,
        B::Data: Send,
        B::Error: Into<stratus_error::Error>,
    {
        let local_addr = listener.local_addr().context("failed to read local address")?;
        self.logger.info(format!("listening on {local_addr}"));

        let builder = auto::Builder::new(TokioExecutor::new());
        let graceful = GracefulShutdown::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, _remote) = match accepted {
                        Ok(pair) => pair,
                        Err(err) => {
                            self.logger.warn(format!("failed to accept connection : {err}"));
                            continue;
                        },
                    };

                    let io = TokioIo::new(stream);
                    let hyper_service = TowerToHyperService::new(service.clone());
                    let conn = builder.serve_connection_with_upgrades(io, hyper_service);
                    let conn = graceful.watch(conn.into_owned());

                    let logger = self.logger.clone();
                    tokio::spawn(async move {
                        if let Err(err) = conn.await {
                            logger.error(format!("server connection error : {err}"));
                        }
                    });
                },
                signal = shutdown.recv() => {
                    match signal {
                        Ok(signal) => self.logger.info(format!("received {signal}, draining connections")),
                        // All senders gone counts as a shutdown request too.
                        Err(_) => self.logger.warn("shutdown channel closed, draining connections"),
                    }
                    break;
                },
            }
        }

        drop(listener);

        tokio::select! {
            () = graceful.shutdown() => {
                self.logger.debug("HTTP server shut down");
            },
            () = tokio::time::sleep(SHUTDOWN_GRACE) => {
                self.logger.warn("graceful shutdown timed out, aborting open connections");
            },
        }

        Ok(())
    }
}
