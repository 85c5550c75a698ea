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

//! HTTP server bootstrap and the request middleware that correlates log
//! lines with the platform's distributed trace.

pub mod error;
pub mod handler;
pub mod middleware;
pub mod server;

pub use error::ApiError;
pub use handler::ApiHandler;
pub use middleware::{TraceLogLayer, TraceLogService};
pub use server::Server;

use stratus_error::Result;
use stratus_logging::{Logger, LoggerConfig};
use tower::Layer;

/// One-call setup for the common case: a logger configured from the
/// environment, the project id resolved (or absent, which only omits the
/// trace field), and the trace middleware wrapped around `handler`.
///
/// Returns the root logger alongside the ready-to-serve service; pass
/// both to [`Server`].
pub async fn default_service<F>(debug: bool, handler: F) -> Result<(Logger, TraceLogService<ApiHandler<F>>)> {
    let logger = Logger::new(LoggerConfig::from_env(debug));

    let project_id = stratus_platform::metadata::project_id().await.ok();
    let layer = TraceLogLayer::new(logger.clone(), project_id);

    Ok((logger, layer.layer(ApiHandler::new(handler))))
}
