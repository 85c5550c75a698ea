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

//! Shared error alias and context adapters for the stratus crates.

use std::fmt;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Result<T> = std::result::Result<T, Error>;

/// An error wrapped with a human-readable context message. The original
/// error stays reachable through `std::error::Error::source`.
#[derive(Debug)]
pub struct ContextError {
    message: String,
    source: Error,
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.message, self.source)
    }
}

impl std::error::Error for ContextError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

pub trait Context<T> {
    fn context(self, message: &'static str) -> Result<T>;

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> Context<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn context(self, message: &'static str) -> Result<T> {
        self.map_err(|err| Error::from(ContextError { message: message.to_owned(), source: err.into() }))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|err| Error::from(ContextError { message: f(), source: err.into() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn fail() -> std::result::Result<(), io::Error> {
        Err(io::Error::new(io::ErrorKind::NotFound, "missing"))
    }

    #[test]
    fn context_wraps_message_and_source() {
        let err = fail().context("reading config").unwrap_err();
        assert_eq!(err.to_string(), "reading config: missing");
        assert!(err.source().is_some());
    }

    #[test]
    fn with_context_is_lazy() {
        let ok: std::result::Result<u32, io::Error> = Ok(7);
        let value = ok.with_context(|| unreachable!("not evaluated on Ok")).unwrap();
        assert_eq!(value, 7);

        let err = fail().with_context(|| format!("attempt {}", 2)).unwrap_err();
        assert_eq!(err.to_string(), "attempt 2: missing");
    }

    #[test]
    fn string_converts_into_error() {
        let err: Error = format!("no listeners on port {}", 8080).into();
        assert_eq!(err.to_string(), "no listeners on port 8080");
    }
}
