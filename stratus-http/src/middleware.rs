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

use std::task::{Context, Poll};

use http::Request;
use stratus_logging::Logger;
use stratus_tracing::TraceContext;
use tower::{Layer, Service};

/// Middleware that binds a request-scoped logger into every request.
///
/// On the managed platform the inbound `x-cloud-trace-context` header is
/// parsed and, when a project id is known, the derived logger carries the
/// trace resource name so the logging backend can correlate the request's
/// log lines with its trace. The parsed [`TraceContext`] is also stored in
/// the request extensions for span-level consumers and outbound
/// propagation.
///
/// No failure in here ever fails the request: a missing or malformed
/// header, or an unresolved project id, only means the logger is bound
/// without the trace field.
///
/// The same layer serves both transports; gRPC is http/2 with the trace
/// context in metadata, which arrives through the same header map.
#[derive(Debug, Clone)]
pub struct TraceLogLayer {
    base: Logger,
    project_id: Option<String>,
    on_cloud_run: bool,
    method_field: bool,
}

impl TraceLogLayer {
    /// `project_id` is `None` when resolution failed; the middleware then
    /// binds loggers without a trace field instead of erroring.
    pub fn new(base: Logger, project_id: Option<String>) -> Self {
        TraceLogLayer { base, project_id, on_cloud_run: stratus_platform::is_cloud_run(), method_field: false }
    }

    /// Overrides platform detection; trace extraction only runs when on
    /// the platform.
    pub fn with_cloud_run(self, on_cloud_run: bool) -> Self {
        Self { on_cloud_run, ..self }
    }

    /// Also records the request path as a `method` structured field. The
    /// gRPC bootstrap enables this to capture the full method name.
    pub fn with_method_field(self, method_field: bool) -> Self {
        Self { method_field, ..self }
    }
}

impl<S> Layer<S> for TraceLogLayer {
    type Service = TraceLogService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TraceLogService { inner, layer: self.clone() }
    }
}

#[derive(Debug, Clone)]
pub struct TraceLogService<S> {
    inner: S,
    layer: TraceLogLayer,
}

impl<S, B> Service<Request<B>> for TraceLogService<S>
where
    S: Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        let mut logger = self.layer.base.clone();

        if self.layer.method_field {
            logger = logger.with_method(req.uri().path());
        }

        if self.layer.on_cloud_run {
            if let Some(trace) = TraceContext::from_headers(req.headers()) {
                if let Some(project_id) = self.layer.project_id.as_deref() {
                    logger = logger.with_trace(trace.resource_name(project_id));
                }
                req.extensions_mut().insert(trace);
            }
        }

        logger.attach(req.extensions_mut());
        self.inner.call(req)
    }
}
