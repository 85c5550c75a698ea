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

//! gRPC server bootstrap and client helpers.
//!
//! The trace/log middleware is the same tower layer the HTTP side uses:
//! gRPC is http/2 underneath, and `x-cloud-trace-context` arrives as
//! metadata in the same header map. The gRPC bootstrap additionally
//! records the full method path as a `method` field and logs failed
//! unary calls by status class.

pub mod client;
pub mod error_log;
pub mod server;

pub use client::{auth_interceptor, connect, trace_forward_interceptor};
pub use error_log::{ErrorLogLayer, ErrorLogService};
pub use server::{bind_addr, serve, serve_with_listener};

// Re-exported so callers wire the same middleware into hand-rolled stacks.
pub use stratus_http::{TraceLogLayer, TraceLogService};
