//! Error taxonomy and message formatting.
//!
//! # Design
//! Failures are data, not panics. `HttpError` pairs a tagged `ErrorKind` with a
//! `message` that the pipeline rewrites exactly once through the client's
//! formatter before the result is returned. `ConfigError` covers mistakes in
//! how a request or client was set up; `TransportError` is what a `Transport`
//! reports back.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::schema::ValidationIssue;

/// The kind of failure, with its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    /// The transport failed for a reason other than cancellation.
    Network { cause: String },

    /// The per-call timer elapsed before the transport answered.
    Timeout { after: Duration },

    /// The response body could not be decoded.
    Parse { cause: String },

    /// The schema rejected the decoded body.
    Validation { issues: Vec<ValidationIssue> },

    /// The server answered with a non-2xx status.
    Response { status: u16, data: Value },

    /// The request could not be built, so nothing was sent.
    Configuration(ConfigError),
}

impl ErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Network { .. } => "network",
            ErrorKind::Timeout { .. } => "timeout",
            ErrorKind::Parse { .. } => "parse",
            ErrorKind::Validation { .. } => "validation",
            ErrorKind::Response { .. } => "response",
            ErrorKind::Configuration(_) => "configuration",
        }
    }
}

/// A failed request.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct HttpError {
    pub kind: ErrorKind,
    pub message: String,
}

impl HttpError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(cause: impl Into<String>) -> Self {
        let cause = cause.into();
        Self::new(ErrorKind::Network { cause: cause.clone() }, cause)
    }

    pub fn timeout(after: Duration) -> Self {
        Self::new(ErrorKind::Timeout { after }, String::new())
    }

    pub fn parse(cause: impl Into<String>) -> Self {
        let cause = cause.into();
        Self::new(ErrorKind::Parse { cause: cause.clone() }, cause)
    }

    /// Message is taken from the first issue.
    pub fn validation(issues: Vec<ValidationIssue>) -> Self {
        let message = issues.first().map(|i| i.message.clone()).unwrap_or_default();
        Self::new(ErrorKind::Validation { issues }, message)
    }

    pub fn response(status: u16, data: Value, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Response { status, data }, message)
    }

    pub fn configuration(err: ConfigError) -> Self {
        let message = err.to_string();
        Self::new(ErrorKind::Configuration(err), message)
    }

    pub fn kind_name(&self) -> &'static str {
        self.kind.name()
    }

    /// HTTP status for `Response` errors.
    pub fn status(&self) -> Option<u16> {
        match &self.kind {
            ErrorKind::Response { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn issues(&self) -> Option<&[ValidationIssue]> {
        match &self.kind {
            ErrorKind::Validation { issues } => Some(issues),
            _ => None,
        }
    }
}

/// Mistakes in request or client setup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing path parameter `{name}` for `{template}`")]
    MissingParameter { name: String, template: String },

    #[error("timeout must be greater than zero")]
    InvalidTimeout,

    #[error("invalid client settings: {0}")]
    InvalidSettings(String),
}

/// Failure reported by a `Transport`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The call observed its abort signal.
    #[error("request aborted")]
    Aborted,

    #[error("{0}")]
    Failed(String),
}

/// Maps a failure to the message the caller sees.
pub type ErrorFormatter = Arc<dyn Fn(&HttpError) -> String + Send + Sync>;

/// Keep the error's own message, synthesizing one from its kind if empty.
pub fn default_format(error: &HttpError) -> String {
    if error.message.is_empty() {
        fallback_message(error)
    } else {
        error.message.clone()
    }
}

pub(crate) fn fallback_message(error: &HttpError) -> String {
    match &error.kind {
        ErrorKind::Network { .. } => "Network request failed".to_string(),
        ErrorKind::Timeout { after } => {
            format!("Request timed out after {}ms", after.as_millis())
        }
        ErrorKind::Parse { .. } => "Failed to parse response body".to_string(),
        ErrorKind::Validation { .. } => "Response failed validation".to_string(),
        ErrorKind::Response { status, .. } => {
            format!("Request failed with status code {status}")
        }
        ErrorKind::Configuration(err) => err.to_string(),
    }
}

/// Rewrite `error.message` through `formatter`. Never leaves it empty.
pub(crate) fn apply_formatter(formatter: &ErrorFormatter, error: &mut HttpError) {
    let formatted = formatter(error);
    error.message = if formatted.is_empty() {
        fallback_message(error)
    } else {
        formatted
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_format_keeps_existing_message() {
        let err = HttpError::response(404, Value::Null, "not found");
        assert_eq!(default_format(&err), "not found");
    }

    #[test]
    fn default_format_synthesizes_from_status() {
        let err = HttpError::response(503, Value::Null, "");
        assert_eq!(default_format(&err), "Request failed with status code 503");
    }

    #[test]
    fn timeout_message_names_the_duration() {
        let err = HttpError::timeout(Duration::from_millis(10));
        assert_eq!(default_format(&err), "Request timed out after 10ms");
        assert_eq!(err.kind_name(), "timeout");
    }

    #[test]
    fn empty_custom_format_falls_back() {
        let formatter: ErrorFormatter = Arc::new(|_| String::new());
        let mut err = HttpError::parse("");
        apply_formatter(&formatter, &mut err);
        assert_eq!(err.message, "Failed to parse response body");
    }

    #[test]
    fn custom_formatter_sees_kind_and_status() {
        let formatter: ErrorFormatter = Arc::new(|e| match e.status() {
            Some(404) => "Ressource introuvable".to_string(),
            _ => format!("Erreur {}", e.kind_name()),
        });
        let mut err = HttpError::response(404, Value::Null, "not found");
        apply_formatter(&formatter, &mut err);
        assert_eq!(err.message, "Ressource introuvable");

        let mut err = HttpError::network("connection refused");
        apply_formatter(&formatter, &mut err);
        assert_eq!(err.message, "Erreur network");
    }

    #[test]
    fn validation_message_is_first_issue() {
        let err = HttpError::validation(vec![
            ValidationIssue::new("id must be a string"),
            ValidationIssue::new("name is required"),
        ]);
        assert_eq!(err.message, "id must be a string");
        assert_eq!(err.issues().map(|i| i.len()), Some(2));
    }

    #[test]
    fn display_is_the_message() {
        let err = HttpError::configuration(ConfigError::MissingParameter {
            name: "id".to_string(),
            template: "/users/:id".to_string(),
        });
        assert_eq!(err.to_string(), "missing path parameter `id` for `/users/:id`");
    }
}
