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

use bytes::Bytes;
use http::{header, Response, StatusCode};
use http_body_util::Full;
use serde::Serialize;
use stratus_logging::Logger;

/// Application error carrying the status code the client should see.
///
/// Handlers return this instead of writing error responses themselves so
/// translation and logging happen uniformly in one place.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: u16,
    message: &'a str,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        ApiError { status, message: message.into() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Translates the error into the JSON error response and logs it:
    /// client errors as WARNING with the message passed through, server
    /// errors as ERROR with the internal detail replaced by the canonical
    /// status text so it never reaches the client.
    pub fn into_response(self, logger: &Logger) -> Response<Full<Bytes>> {
        let message = if self.status.is_server_error() {
            logger.error(&self.message);
            self.status.canonical_reason().unwrap_or("Internal Server Error")
        } else {
            logger.warn(&self.message);
            self.message.as_str()
        };

        let body = ErrorBody { code: self.status.as_u16(), message };
        let payload = serde_json::to_vec(&body).unwrap_or_else(|_| b"{}".to_vec());

        Response::builder()
            .status(self.status)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(payload)))
            .unwrap_or_else(|_| Response::new(Full::new(Bytes::new())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use stratus_logging::{CaptureSink, LoggerConfig};

    fn capture_logger() -> (Logger, CaptureSink) {
        let sink = CaptureSink::new();
        let logger = Logger::new(LoggerConfig::new(false).with_sink(Box::new(sink.clone())));
        (logger, sink)
    }

    async fn body_json(response: Response<Full<Bytes>>) -> serde_json::Value {
        let bytes = response.into_body().collect().await.expect("body collects").to_bytes();
        serde_json::from_slice(&bytes).expect("body is json")
    }

    #[tokio::test]
    async fn client_errors_pass_through_and_log_warnings() {
        let (logger, sink) = capture_logger();

        let response = ApiError::bad_request("missing name parameter").into_response(&logger);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["code"], 400);
        assert_eq!(body["message"], "missing name parameter");

        let entries = sink.json_lines();
        assert_eq!(entries[0]["severity"], "WARNING");
        assert_eq!(entries[0]["message"], "missing name parameter");
    }

    #[tokio::test]
    async fn server_errors_hide_detail_from_the_client() {
        let (logger, sink) = capture_logger();

        let response = ApiError::internal("db connection refused: 10.0.0.3:5432").into_response(&logger);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["code"], 500);
        assert_eq!(body["message"], "Internal Server Error");

        // The detail still lands in the log, at ERROR.
        let entries = sink.json_lines();
        assert_eq!(entries[0]["severity"], "ERROR");
        assert_eq!(entries[0]["message"], "db connection refused: 10.0.0.3:5432");
    }

    #[test]
    fn display_shows_the_message() {
        let err = ApiError::not_found("no such quote");
        assert_eq!(err.to_string(), "no such quote");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}
