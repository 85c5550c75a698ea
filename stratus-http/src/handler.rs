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
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http::{Request, Response};
use http_body_util::Full;
use stratus_logging::Logger;
use tower::Service;

use crate::ApiError;

/// Adapts an async handler returning `Result<_, ApiError>` into an
/// infallible service: handler errors are logged through the
/// request-scoped logger and translated into the JSON error response, so
/// the transport never sees a failed future.
#[derive(Debug, Clone)]
pub struct ApiHandler<F> {
    handler: F,
}

impl<F> ApiHandler<F> {
    pub fn new(handler: F) -> Self {
        ApiHandler { handler }
    }
}

impl<F, Fut, B> Service<Request<B>> for ApiHandler<F>
where
    F: Fn(Request<B>) -> Fut,
    Fut: Future<Output = Result<Response<Full<Bytes>>, ApiError>> + Send + 'static,
{
    type Response = Response<Full<Bytes>>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let logger = Logger::from_extensions(req.extensions());
        let future = (self.handler)(req);

        Box::pin(async move {
            match future.await {
                Ok(response) => Ok(response),
                Err(err) => Ok(err.into_response(&logger)),
            }
        })
    }
}
