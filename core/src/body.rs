//! Outgoing request bodies and content-type negotiation.
//!
//! # Design
//! Callers hand over an untyped `Body`; `negotiate` decides how it goes on the
//! wire and which `content-type` goes with it. The first matching rule wins:
//!
//! | body                 | wire form          | content-type                      |
//! |----------------------|--------------------|-----------------------------------|
//! | absent / JSON null   | none               | none                              |
//! | multipart form       | unchanged          | none (transport sets boundary)    |
//! | url-encoded form     | unchanged          | application/x-www-form-urlencoded |
//! | binary               | unchanged          | declared type or octet-stream     |
//! | text                 | unchanged          | text/plain                        |
//! | anything else        | JSON               | application/json                  |

use serde::Serialize;
use serde_json::Value;

use crate::http::HttpMethod;

pub const APPLICATION_JSON: &str = "application/json";
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
pub const OCTET_STREAM: &str = "application/octet-stream";
pub const TEXT_PLAIN: &str = "text/plain";

/// A request payload before negotiation.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Value),
    Text(String),
    Binary {
        bytes: Vec<u8>,
        content_type: Option<String>,
    },
    UrlEncoded(Vec<(String, String)>),
    Multipart(MultipartForm),
}

impl Body {
    /// Serialize any value into the JSON variant.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(Body::Json)
    }

    pub fn text(text: impl Into<String>) -> Self {
        Body::Text(text.into())
    }

    pub fn binary(bytes: impl Into<Vec<u8>>) -> Self {
        Body::Binary {
            bytes: bytes.into(),
            content_type: None,
        }
    }

    pub fn form<K: Into<String>, V: Into<String>>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        Body::UrlEncoded(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Body::Json(value)
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Text(text.to_string())
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::binary(bytes)
    }
}

impl From<MultipartForm> for Body {
    fn from(form: MultipartForm) -> Self {
        Body::Multipart(form)
    }
}

/// A `multipart/form-data` payload. The transport encodes it and picks the boundary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartForm {
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub name: String,
    pub value: PartValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PartValue {
    Text(String),
    File {
        bytes: Vec<u8>,
        filename: Option<String>,
        content_type: Option<String>,
    },
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(Part {
            name: name.into(),
            value: PartValue::Text(value.into()),
        });
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
        filename: Option<String>,
        content_type: Option<String>,
    ) -> Self {
        self.parts.push(Part {
            name: name.into(),
            value: PartValue::File {
                bytes: bytes.into(),
                filename,
                content_type,
            },
        });
        self
    }
}

/// A body in the form the transport sends it.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportBody {
    Bytes(Vec<u8>),
    Text(String),
    UrlEncoded(Vec<(String, String)>),
    Multipart(MultipartForm),
}

/// Output of `negotiate`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Negotiated {
    pub body: Option<TransportBody>,
    pub content_type: Option<String>,
}

/// Decide the wire form and content-type for `body` sent with `method`.
pub fn negotiate(method: HttpMethod, body: Option<Body>) -> Result<Negotiated, serde_json::Error> {
    if !method.allows_body() {
        return Ok(Negotiated::default());
    }
    let negotiated = match body {
        None | Some(Body::Json(Value::Null)) => Negotiated::default(),
        Some(Body::Multipart(form)) => Negotiated {
            body: Some(TransportBody::Multipart(form)),
            content_type: None,
        },
        Some(Body::UrlEncoded(pairs)) => Negotiated {
            body: Some(TransportBody::UrlEncoded(pairs)),
            content_type: Some(FORM_URLENCODED.to_string()),
        },
        Some(Body::Binary { bytes, content_type }) => Negotiated {
            body: Some(TransportBody::Bytes(bytes)),
            content_type: Some(content_type.unwrap_or_else(|| OCTET_STREAM.to_string())),
        },
        Some(Body::Text(text)) => Negotiated {
            body: Some(TransportBody::Text(text)),
            content_type: Some(TEXT_PLAIN.to_string()),
        },
        Some(Body::Json(value)) => Negotiated {
            body: Some(TransportBody::Text(serde_json::to_string(&value)?)),
            content_type: Some(APPLICATION_JSON.to_string()),
        },
    };
    Ok(negotiated)
}
