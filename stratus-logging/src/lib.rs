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

//! Structured, severity-tagged logging for services on the managed
//! platform.
//!
//! A [`LoggerConfig`] is built once at startup and is immutable from then
//! on; every [`Logger`] is a cheap handle deriving from it. Request
//! middleware derives a per-request logger carrying the trace field and
//! binds it into the request extensions, where handler code retrieves it
//! with [`Logger::from_extensions`].

pub mod logger;
pub mod severity;

pub use logger::{CaptureSink, LogFormat, Logger, LoggerConfig};
pub use severity::Severity;
