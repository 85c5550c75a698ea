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

use std::fmt::{Display, Write as FmtWrite};
use std::io::{self, Write};
use std::panic::Location;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{json, Map, Value};

use crate::Severity;

const SOURCE_LOCATION_FIELD: &str = "logging.googleapis.com/sourceLocation";

/// Output format of a logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line, the shape the cloud logging agent
    /// ingests. No timestamp; the platform attaches one.
    Json,
    /// Human-readable lines with a local timestamp, for development runs.
    Pretty,
}

/// Logger configuration, built once at startup and immutable afterwards.
/// Every per-request logger derives from one shared `LoggerConfig`; the
/// sink is the only synchronized state.
pub struct LoggerConfig {
    min_severity: Severity,
    format: LogFormat,
    source_location: bool,
    sink: Mutex<Box<dyn Write + Send>>,
}

impl LoggerConfig {
    /// JSON logs to stdout, `INFO` and above (`DEBUG` with `debug`).
    pub fn new(debug: bool) -> Self {
        LoggerConfig {
            min_severity: if debug { Severity::Debug } else { Severity::Info },
            format: LogFormat::Json,
            source_location: false,
            sink: Mutex::new(Box::new(io::stdout())),
        }
    }

    /// Picks the format from the environment: JSON on the managed
    /// platform, human-readable anywhere else.
    pub fn from_env(debug: bool) -> Self {
        let format = if stratus_platform::is_cloud_run() { LogFormat::Json } else { LogFormat::Pretty };
        Self::new(debug).with_format(format)
    }

    pub fn with_format(self, format: LogFormat) -> Self {
        Self { format, ..self }
    }

    pub fn with_source_location(self, source_location: bool) -> Self {
        Self { source_location, ..self }
    }

    pub fn with_sink(self, sink: Box<dyn Write + Send>) -> Self {
        Self { sink: Mutex::new(sink), ..self }
    }
}

impl std::fmt::Debug for LoggerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggerConfig")
            .field("min_severity", &self.min_severity)
            .field("format", &self.format)
            .field("source_location", &self.source_location)
            .finish_non_exhaustive()
    }
}

/// A handle onto a shared [`LoggerConfig`] plus an immutable set of
/// structured fields. Cloning is cheap; deriving never mutates the
/// parent, so concurrent requests cannot see each other's fields.
#[derive(Clone)]
pub struct Logger {
    shared: Option<Arc<LoggerConfig>>,
    fields: Vec<(String, Value)>,
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger").field("shared", &self.shared).field("fields", &self.fields).finish()
    }
}

impl Logger {
    pub fn new(config: LoggerConfig) -> Self {
        Logger { shared: Some(Arc::new(config)), fields: Vec::new() }
    }

    /// A logger that drops everything. Returned by
    /// [`Logger::from_extensions`] when no logger was bound, so handler
    /// code can always log without checking.
    pub fn disabled() -> Self {
        Logger { shared: None, fields: Vec::new() }
    }

    pub fn is_enabled(&self) -> bool {
        self.shared.is_some()
    }

    /// Derives a logger with one more structured field.
    pub fn with_field(&self, key: impl Into<String>, value: impl Into<Value>) -> Logger {
        let mut derived = self.clone();
        derived.fields.push((key.into(), value.into()));
        derived
    }

    /// Derives a logger tagged with a trace resource name, the field the
    /// logging backend correlates with the distributed trace.
    pub fn with_trace(&self, resource_name: impl Into<String>) -> Logger {
        self.with_field(stratus_tracing::TRACE_FIELD, resource_name.into())
    }

    /// Derives a logger tagged with a 16-character hex span id.
    pub fn with_span_id(&self, span_id_hex: impl Into<String>) -> Logger {
        self.with_field(stratus_tracing::SPAN_ID_FIELD, span_id_hex.into())
    }

    /// Derives a logger tagged with the invoked method, used by the gRPC
    /// layer to record the full method path.
    pub fn with_method(&self, method: impl Into<String>) -> Logger {
        self.with_field("method", method.into())
    }

    /// Binds this logger into a request's extensions. The `Logger` type
    /// itself is the extension key, so the binding cannot collide with
    /// anything else.
    pub fn attach(self, extensions: &mut http::Extensions) {
        extensions.insert(self);
    }

    /// Retrieves the logger bound by [`Logger::attach`], or the disabled
    /// logger when the middleware never ran (unit tests, bypassed stacks).
    pub fn from_extensions(extensions: &http::Extensions) -> Logger {
        extensions.get::<Logger>().cloned().unwrap_or_else(Logger::disabled)
    }

    #[track_caller]
    pub fn debug(&self, message: impl Display) {
        self.log(Severity::Debug, &message.to_string(), Location::caller());
    }

    #[track_caller]
    pub fn info(&self, message: impl Display) {
        self.log(Severity::Info, &message.to_string(), Location::caller());
    }

    #[track_caller]
    pub fn warn(&self, message: impl Display) {
        self.log(Severity::Warning, &message.to_string(), Location::caller());
    }

    #[track_caller]
    pub fn error(&self, message: impl Display) {
        self.log(Severity::Error, &message.to_string(), Location::caller());
    }

    #[track_caller]
    pub fn critical(&self, message: impl Display) {
        self.log(Severity::Critical, &message.to_string(), Location::caller());
    }

    fn log(&self, severity: Severity, message: &str, location: &'static Location<'static>) {
        let Some(shared) = self.shared.as_ref() else { return };
        if severity < shared.min_severity {
            return;
        }

        match shared.format {
            LogFormat::Json => {
                let mut entry = Map::new();
                entry.insert("severity".to_owned(), Value::from(severity.as_str()));
                if !message.is_empty() {
                    entry.insert("message".to_owned(), Value::from(message));
                }
                for (key, value) in &self.fields {
                    entry.insert(key.clone(), value.clone());
                }
                if shared.source_location {
                    entry.insert(SOURCE_LOCATION_FIELD.to_owned(), source_location(location));
                }

                let mut sink = shared.sink.lock();
                let _ = writeln!(sink, "{}", Value::Object(entry));
            },
            LogFormat::Pretty => {
                let mut line = format!(
                    "{} {} {message}",
                    chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
                    severity.short_str()
                );
                for (key, value) in &self.fields {
                    let _ = write!(line, " {key}={value}");
                }
                if shared.source_location {
                    let _ = write!(line, " {}:{}", basename(location.file()), location.line());
                }

                let mut sink = shared.sink.lock();
                let _ = writeln!(sink, "{line}");
            },
        }
    }
}

fn source_location(location: &Location<'_>) -> Value {
    json!({
        "file": basename(location.file()),
        "line": location.line().to_string(),
    })
}

fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Sink that keeps everything written to it, for asserting on log output
/// in tests.
#[derive(Clone, Default)]
pub struct CaptureSink(Arc<Mutex<Vec<u8>>>);

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }

    /// Written output split into lines and parsed as JSON entries.
    pub fn json_lines(&self) -> Vec<Value> {
        self.contents().lines().filter_map(|line| serde_json::from_str(line).ok()).collect()
    }
}

impl Write for CaptureSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
