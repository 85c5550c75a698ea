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

//! Parsing of the platform trace-context header and its mapping onto the
//! structured log fields the cloud logging backend correlates on.

pub mod trace_context;

use http::HeaderName;

/// The `x-cloud-trace-context` header (HTTP) and metadata key (gRPC)
/// carrying the inbound trace context.
pub const X_CLOUD_TRACE_CONTEXT: HeaderName = HeaderName::from_static("x-cloud-trace-context");

/// Structured log field holding the fully-qualified trace resource name.
pub const TRACE_FIELD: &str = "logging.googleapis.com/trace";

/// Structured log field holding the 16-character hex span id.
pub const SPAN_ID_FIELD: &str = "logging.googleapis.com/spanId";

pub use trace_context::{trace_resource_name, TraceContext};
