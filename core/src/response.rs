//! Turn a raw transport response into an `HttpResult`.
//!
//! # Design
//! Non-2xx statuses become `response` failures carrying whatever the body
//! decodes to; their message comes from `message` or `error.message` in a JSON
//! body and is otherwise left empty for the formatter. Successful bodies are
//! decoded as JSON when the content-type says so, as text otherwise, and then
//! passed through the schema if one was given.

use serde_json::Value;
use tracing::debug;

use crate::body::APPLICATION_JSON;
use crate::error::HttpError;
use crate::http::TransportResponse;
use crate::result::HttpResult;
use crate::schema::{Schema, ValidationOutcome};

pub async fn parse_response(
    response: TransportResponse,
    schema: Option<&dyn Schema>,
) -> HttpResult<Value> {
    let TransportResponse {
        status,
        headers,
        body,
    } = response;

    if !(200..300).contains(&status) {
        let data = decode_error_body(&body);
        let message = error_message(&data).unwrap_or_default();
        return HttpResult::failure(HttpError::response(status, data, message), Some(headers));
    }

    let is_json = headers
        .get("content-type")
        .is_some_and(|ct| ct.to_ascii_lowercase().contains(APPLICATION_JSON));
    let decoded = match decode_body(&body, is_json) {
        Ok(value) => value,
        Err(err) => return HttpResult::failure(err, Some(headers)),
    };

    let Some(schema) = schema else {
        return HttpResult::success(decoded, headers);
    };

    debug!(vendor = schema.vendor(), "validating response body");
    match schema.validate(decoded).await {
        ValidationOutcome::Valid(value) => HttpResult::success(value, headers),
        ValidationOutcome::Invalid(issues) => {
            HttpResult::failure(HttpError::validation(issues), Some(headers))
        }
    }
}

fn decode_body(body: &[u8], is_json: bool) -> Result<Value, HttpError> {
    if body.is_empty() {
        return Ok(Value::Null);
    }
    if is_json {
        return serde_json::from_slice(body).map_err(|e| HttpError::parse(e.to_string()));
    }
    std::str::from_utf8(body)
        .map(|text| Value::String(text.to_string()))
        .map_err(|e| HttpError::parse(e.to_string()))
}

/// JSON if it parses, the text if it doesn't, `null` for an empty or non-UTF-8 body.
fn decode_error_body(body: &[u8]) -> Value {
    if body.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(body).unwrap_or_else(|_| {
        std::str::from_utf8(body)
            .map(|text| Value::String(text.to_string()))
            .unwrap_or(Value::Null)
    })
}

fn error_message(data: &Value) -> Option<String> {
    data.get("message")
        .and_then(Value::as_str)
        .or_else(|| data.get("error")?.get("message")?.as_str())
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}
