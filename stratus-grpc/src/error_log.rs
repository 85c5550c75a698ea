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

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use http::{HeaderMap, HeaderName, Request, Response};
use stratus_logging::Logger;
use tonic::Code;
use tower::{Layer, Service};

const GRPC_STATUS: HeaderName = HeaderName::from_static("grpc-status");
const GRPC_MESSAGE: HeaderName = HeaderName::from_static("grpc-message");

/// Logs failed unary calls through the request's bound logger.
///
/// A unary handler error surfaces as a trailers-only response, so the
/// status code sits in the response header map. Client-class codes log
/// as WARNING, server-class codes as ERROR. Successful calls carry their
/// status in real trailers and pass through silently.
///
/// Wire this INSIDE [`stratus_http::TraceLogLayer`] so the logger (with
/// its trace and method fields) is already bound when requests get here.
#[derive(Debug, Clone, Default)]
pub struct ErrorLogLayer;

impl ErrorLogLayer {
    pub fn new() -> Self {
        ErrorLogLayer
    }
}

impl<S> Layer<S> for ErrorLogLayer {
    type Service = ErrorLogService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ErrorLogService { inner }
    }
}

#[derive(Debug, Clone)]
pub struct ErrorLogService<S> {
    inner: S,
}

impl<S, B, RB> Service<Request<B>> for ErrorLogService<S>
where
    S: Service<Request<B>, Response = Response<RB>>,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let logger = Logger::from_extensions(req.extensions());
        let future = self.inner.call(req);

        Box::pin(async move {
            let response = future.await?;

            if let Some(code) = status_from_headers(response.headers()) {
                if code != Code::Ok {
                    log_status(&logger, code, message_from_headers(response.headers()));
                }
            }

            Ok(response)
        })
    }
}

fn status_from_headers(headers: &HeaderMap) -> Option<Code> {
    let raw = headers.get(GRPC_STATUS)?.to_str().ok()?;
    raw.parse::<i32>().ok().map(Code::from)
}

fn message_from_headers(headers: &HeaderMap) -> Option<&str> {
    // Percent-encoded per the gRPC wire spec; logged as received.
    headers.get(GRPC_MESSAGE).and_then(|value| value.to_str().ok())
}

fn log_status(logger: &Logger, code: Code, message: Option<&str>) {
    let line = match message {
        Some(message) if !message.is_empty() => format!("rpc failed with status {code:?}: {message}"),
        _ => format!("rpc failed with status {code:?}"),
    };

    if is_server_class(code) {
        logger.error(line);
    } else {
        logger.warn(line);
    }
}

// The split mirrors the HTTP side: codes a well-behaved client could
// have avoided are warnings, everything pointing at this process or its
// dependencies is an error.
fn is_server_class(code: Code) -> bool {
    matches!(
        code,
        Code::Unknown
            | Code::DeadlineExceeded
            | Code::Unimplemented
            | Code::Internal
            | Code::Unavailable
            | Code::DataLoss
    )
}
