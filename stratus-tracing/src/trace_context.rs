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

use std::fmt::{self, Display};
use std::sync::LazyLock;

use compact_str::CompactString;
use http::HeaderMap;
use regex::Regex;

use crate::X_CLOUD_TRACE_CONTEXT;

// Header format: <trace-id-hex>[/<span-id-decimal>][;o=<0|1>], see
// https://cloud.google.com/trace/docs/troubleshooting#force-trace
static TRACE_HEADER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([0-9a-fA-F]+)(?:/([0-9]+))?(?:;o=[01])?\s*$").expect("hard-coded pattern"));

/// Trace context taken from an inbound request.
///
/// A value of this type always carries a non-empty trace id; an absent or
/// unparseable header is represented by `None` at the call site, never by
/// an empty context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceContext {
    trace_id: CompactString,
    span_id: Option<u64>,
}

impl TraceContext {
    /// Parses a raw `x-cloud-trace-context` value.
    ///
    /// The trace id keeps the case it arrived with. The span segment must
    /// be a decimal u64; a span that does not fit invalidates the whole
    /// header, trace id included. Callers that want a trace-id-only
    /// fallback on bad span ids do not get one here.
    pub fn parse(header: &str) -> Option<Self> {
        let captures = TRACE_HEADER_PATTERN.captures(header)?;

        let trace_id = captures.get(1)?.as_str();
        let span_id = match captures.get(2) {
            Some(span) => Some(span.as_str().parse::<u64>().ok()?),
            None => None,
        };

        Some(TraceContext { trace_id: trace_id.into(), span_id })
    }

    /// Reads the trace context from request headers (or gRPC metadata,
    /// which shares the same map). Absent, non-UTF-8 and malformed values
    /// all come back as `None`.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let value = headers.get(X_CLOUD_TRACE_CONTEXT)?.to_str().ok()?;
        Self::parse(value)
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn span_id(&self) -> Option<u64> {
        self.span_id
    }

    /// The span id re-encoded the way the logging backend expects it:
    /// exactly 16 lowercase hex characters, zero-padded.
    pub fn span_id_hex(&self) -> Option<String> {
        self.span_id.map(|id| format!("{id:016x}"))
    }

    /// The fully-qualified trace resource name for this context.
    pub fn resource_name(&self, project_id: &str) -> String {
        format!("projects/{project_id}/traces/{}", self.trace_id)
    }
}

/// Wire form for outbound propagation: `<trace-id>[/<span-id>]`, span id
/// back in decimal.
impl Display for TraceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.span_id {
            Some(span_id) => write!(f, "{}/{span_id}", self.trace_id),
            None => write!(f, "{}", self.trace_id),
        }
    }
}

/// Maps a project id and a raw trace id onto the trace resource name, or
/// `None` for an empty trace id so callers skip the field entirely rather
/// than emit an empty one.
pub fn trace_resource_name(project_id: &str, trace_id: &str) -> Option<String> {
    if trace_id.is_empty() {
        return None;
    }

    Some(format!("projects/{project_id}/traces/{trace_id}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn parse_full_header_with_sampling_flag() {
        for header in
            ["0123456789abcdef0123456789abcdef/123;o=1", "0123456789abcdef0123456789abcdef/123;o=0", "0123456789abcdef0123456789abcdef/123"]
        {
            let ctx = TraceContext::parse(header).expect("header is valid");
            assert_eq!(ctx.trace_id(), "0123456789abcdef0123456789abcdef");
            assert_eq!(ctx.span_id(), Some(123));
            assert_eq!(ctx.span_id_hex().as_deref(), Some("000000000000007b"));
        }
    }

    #[test]
    fn parse_trace_id_only() {
        let ctx = TraceContext::parse("0123456789abcdef0123456789abcdef").expect("header is valid");
        assert_eq!(ctx.trace_id(), "0123456789abcdef0123456789abcdef");
        assert_eq!(ctx.span_id(), None);
        assert_eq!(ctx.span_id_hex(), None);
    }

    #[test]
    fn parse_rejects_malformed_headers() {
        for header in [
            "0123456789abcdef0123456789abcdef/invalid",
            "invalid",
            "",
            "0123456789abcdef/123;o=2",
            "0123456789abcdef/123 trailing",
            "/123",
            "0123456789abcdef/123;o=1;o=0",
        ] {
            assert_eq!(TraceContext::parse(header), None, "header {header:?} must not parse");
        }
    }

    #[test]
    fn parse_does_not_require_a_fixed_trace_id_width() {
        // Width is not validated; short ids pass through as-is.
        let ctx = TraceContext::parse("abc123/7").expect("header is valid");
        assert_eq!(ctx.trace_id(), "abc123");
        assert_eq!(ctx.span_id_hex().as_deref(), Some("0000000000000007"));
    }

    #[test]
    fn parse_preserves_trace_id_case() {
        let ctx = TraceContext::parse("0123456789ABCDEFabcdef").expect("header is valid");
        assert_eq!(ctx.trace_id(), "0123456789ABCDEFabcdef");
    }

    #[test]
    fn parse_tolerates_surrounding_whitespace() {
        let ctx = TraceContext::parse("  0123456789abcdef0123456789abcdef/123;o=1  ").expect("header is valid");
        assert_eq!(ctx.trace_id(), "0123456789abcdef0123456789abcdef");
        assert_eq!(ctx.span_id(), Some(123));
    }

    #[test]
    fn span_id_at_u64_max_is_accepted() {
        let header = format!("0123456789abcdef/{}", u64::MAX);
        let ctx = TraceContext::parse(&header).expect("u64::MAX fits");
        assert_eq!(ctx.span_id_hex().as_deref(), Some("ffffffffffffffff"));
    }

    #[test]
    fn span_id_overflow_discards_the_trace_id_too() {
        // One past u64::MAX. The numeric failure invalidates the whole
        // header rather than degrading to trace-id-only.
        let result = TraceContext::parse("0123456789abcdef0123456789abcdef/18446744073709551616");
        assert_eq!(result, None);
    }

    #[test]
    fn parse_is_pure() {
        let header = "0123456789abcdef0123456789abcdef/123;o=1";
        assert_eq!(TraceContext::parse(header), TraceContext::parse(header));
    }

    #[test]
    fn from_headers_reads_the_trace_header() {
        let mut headers = HeaderMap::new();
        headers.insert(X_CLOUD_TRACE_CONTEXT, HeaderValue::from_static("0123456789abcdef0123456789abcdef/123;o=1"));

        let ctx = TraceContext::from_headers(&headers).expect("header is valid");
        assert_eq!(ctx.trace_id(), "0123456789abcdef0123456789abcdef");
        assert_eq!(ctx.span_id(), Some(123));
    }

    #[test]
    fn from_headers_without_the_header_is_none() {
        assert_eq!(TraceContext::from_headers(&HeaderMap::new()), None);
    }

    #[test]
    fn resource_name_composes_project_and_trace() {
        let ctx = TraceContext::parse("0123456789abcdef0123456789abcdef").expect("header is valid");
        assert_eq!(
            ctx.resource_name("sample-google-project"),
            "projects/sample-google-project/traces/0123456789abcdef0123456789abcdef"
        );
    }

    #[test]
    fn trace_resource_name_skips_empty_trace_ids() {
        assert_eq!(
            trace_resource_name("sample-google-project", "0123456789abcdef0123456789abcdef").as_deref(),
            Some("projects/sample-google-project/traces/0123456789abcdef0123456789abcdef")
        );
        assert_eq!(trace_resource_name("sample-google-project", ""), None);
    }

    #[test]
    fn display_reencodes_the_wire_form() {
        let ctx = TraceContext::parse("0123456789abcdef0123456789abcdef/123;o=1").expect("header is valid");
        assert_eq!(ctx.to_string(), "0123456789abcdef0123456789abcdef/123");

        let ctx = TraceContext::parse("0123456789abcdef0123456789abcdef").expect("header is valid");
        assert_eq!(ctx.to_string(), "0123456789abcdef0123456789abcdef");

        // The re-encoded form parses back to the same context.
        let ctx = TraceContext::parse("0123456789abcdef/18446744073709551615").expect("header is valid");
        assert_eq!(TraceContext::parse(&ctx.to_string()).as_ref(), Some(&ctx));
    }
}
