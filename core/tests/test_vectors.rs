//! Check URL composition, body negotiation and response parsing against the
//! JSON vectors in `test-vectors/`.
//!
//! Bodies are compared as parsed JSON, not raw strings, so field ordering in
//! the vectors does not matter.

use std::collections::HashMap;

use fetchwise::body::{negotiate, Body, TransportBody};
use fetchwise::response::parse_response;
use fetchwise::url::compose;
use fetchwise::{ConfigError, Headers, HttpMethod, TransportResponse};
use serde_json::Value;

fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "HEAD" => HttpMethod::Head,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "PATCH" => HttpMethod::Patch,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn params(value: &Value) -> HashMap<String, String> {
    value
        .as_object()
        .unwrap()
        .iter()
        .map(|(k, v)| (k.clone(), v.as_str().unwrap().to_string()))
        .collect()
}

// ---------------------------------------------------------------------------
// URL composition
// ---------------------------------------------------------------------------

#[test]
fn compose_test_vectors() {
    let raw = include_str!("../../test-vectors/compose.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let base_url = vectors["base_url"].as_str().unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let query: Vec<(String, Option<String>)> = case["query"]
            .as_array()
            .unwrap()
            .iter()
            .map(|pair| {
                let pair = pair.as_array().unwrap();
                (pair[0].as_str().unwrap().to_string(), pair[1].as_str().map(str::to_string))
            })
            .collect();
        let url = compose(base_url, case["template"].as_str().unwrap(), &params(&case["params"]), &query)
            .unwrap_or_else(|e| panic!("{name}: {e}"));
        assert_eq!(url, case["expected"].as_str().unwrap(), "{name}");
        assert!(!url.contains("/:"), "{name}: unresolved token");
    }

    for case in vectors["missing"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let err = compose(base_url, case["template"].as_str().unwrap(), &params(&case["params"]), &[])
            .unwrap_err();
        match err {
            ConfigError::MissingParameter { name: missing, .. } => {
                assert_eq!(missing, case["parameter"].as_str().unwrap(), "{name}")
            }
            other => panic!("{name}: unexpected {other:?}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Body negotiation
// ---------------------------------------------------------------------------

#[test]
fn negotiate_test_vectors() {
    let raw = include_str!("../../test-vectors/negotiate.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let body = match case["body"]["kind"].as_str().unwrap() {
            "json" => Body::Json(case["body"]["value"].clone()),
            "text" => Body::text(case["body"]["value"].as_str().unwrap()),
            other => panic!("{name}: unknown body kind {other}"),
        };
        let negotiated = negotiate(parse_method(case["method"].as_str().unwrap()), Some(body)).unwrap();
        assert_eq!(negotiated.content_type.as_deref(), case["content_type"].as_str(), "{name}: content-type");

        let wire = match negotiated.body {
            None => Value::Null,
            Some(TransportBody::Text(text)) if negotiated.content_type.as_deref() == Some("application/json") => {
                serde_json::from_str(&text).unwrap()
            }
            Some(TransportBody::Text(text)) => Value::String(text),
            Some(other) => panic!("{name}: unexpected wire body {other:?}"),
        };
        assert_eq!(wire, case["wire"], "{name}: wire body");
    }
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn response_test_vectors() {
    let raw = include_str!("../../test-vectors/responses.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let sim = &case["response"];
        let mut headers = Headers::new();
        headers.insert("Content-Type", sim["content_type"].as_str().unwrap());
        let response = TransportResponse {
            status: sim["status"].as_u64().unwrap() as u16,
            headers,
            body: sim["body"].as_str().unwrap().as_bytes().to_vec(),
        };

        let result = parse_response(response, None).await;
        let expected = &case["expected"];
        match expected["type"].as_str().unwrap() {
            "success" => assert_eq!(result.data(), Some(&expected["data"]), "{name}"),
            "failure" => {
                let err = result.error().unwrap_or_else(|| panic!("{name}: expected failure"));
                assert_eq!(err.kind_name(), expected["kind"].as_str().unwrap(), "{name}: kind");
                if let Some(status) = expected["status"].as_u64() {
                    assert_eq!(err.status(), Some(status as u16), "{name}: status");
                }
                if let Some(message) = expected["message"].as_str() {
                    assert_eq!(err.message, message, "{name}: message");
                }
            }
            other => panic!("{name}: unknown expectation {other}"),
        }
    }
}
