//! The success/failure union every request returns.

use crate::error::HttpError;
use crate::http::Headers;

/// Outcome of a request. Ordinary failures are returned, never raised.
#[derive(Debug, Clone, PartialEq)]
pub enum HttpResult<T> {
    Success {
        data: T,
        headers: Headers,
    },
    /// `headers` is `None` when the request failed before a response arrived.
    Failure {
        error: HttpError,
        headers: Option<Headers>,
    },
}

impl<T> HttpResult<T> {
    pub fn success(data: T, headers: Headers) -> Self {
        HttpResult::Success { data, headers }
    }

    pub fn failure(error: HttpError, headers: Option<Headers>) -> Self {
        HttpResult::Failure { error, headers }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, HttpResult::Success { .. })
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            HttpResult::Success { data, .. } => Some(data),
            HttpResult::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&HttpError> {
        match self {
            HttpResult::Success { .. } => None,
            HttpResult::Failure { error, .. } => Some(error),
        }
    }

    pub fn error_mut(&mut self) -> Option<&mut HttpError> {
        match self {
            HttpResult::Success { .. } => None,
            HttpResult::Failure { error, .. } => Some(error),
        }
    }

    pub fn headers(&self) -> Option<&Headers> {
        match self {
            HttpResult::Success { headers, .. } => Some(headers),
            HttpResult::Failure { headers, .. } => headers.as_ref(),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> HttpResult<U> {
        match self {
            HttpResult::Success { data, headers } => HttpResult::Success {
                data: f(data),
                headers,
            },
            HttpResult::Failure { error, headers } => HttpResult::Failure { error, headers },
        }
    }

    /// Convert into a plain `Result`, dropping the headers.
    pub fn into_result(self) -> Result<T, HttpError> {
        match self {
            HttpResult::Success { data, .. } => Ok(data),
            HttpResult::Failure { error, .. } => Err(error),
        }
    }

    /// Return the data, or panic with the failure's formatted message.
    ///
    /// This is the one place a failed request turns into a panic; prefer
    /// `into_result` when the caller can propagate the error.
    #[track_caller]
    pub fn unwrap(self) -> T {
        match self {
            HttpResult::Success { data, .. } => data,
            HttpResult::Failure { error, .. } => panic!("{}", error.message),
        }
    }
}

impl<T> From<HttpResult<T>> for Result<T, HttpError> {
    fn from(result: HttpResult<T>) -> Self {
        result.into_result()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    #[test]
    fn unwrap_success_returns_data() {
        let result = HttpResult::success(5, Headers::new());
        assert_eq!(result.unwrap(), 5);
    }

    #[test]
    #[should_panic(expected = "not found")]
    fn unwrap_failure_panics_with_message() {
        let result: HttpResult<i32> =
            HttpResult::failure(HttpError::response(404, Value::Null, "not found"), None);
        result.unwrap();
    }

    #[test]
    fn into_result_keeps_the_error() {
        let result: HttpResult<i32> = HttpResult::failure(HttpError::network("refused"), None);
        let err = result.into_result().unwrap_err();
        assert_eq!(err.kind_name(), "network");
    }

    #[test]
    fn map_preserves_headers() {
        let headers: Headers = [("etag", "abc")].into_iter().collect();
        let result = HttpResult::success(2, headers).map(|n| n * 10);
        assert_eq!(result.data(), Some(&20));
        assert_eq!(result.headers().and_then(|h| h.get("etag")), Some("abc"));
    }

    #[test]
    fn pre_transport_failure_has_no_headers() {
        let result: HttpResult<()> = HttpResult::failure(HttpError::network("down"), None);
        assert!(result.is_failure());
        assert!(result.headers().is_none());
    }
}
