//! Validation adapters for decoded response bodies.
//!
//! Any type implementing `Schema` is accepted by a request. The pipeline hands
//! it the decoded JSON value and either keeps the (possibly coerced) value it
//! returns or turns its issues into a `validation` failure.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One problem reported by a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub message: String,
    /// Location of the offending value, outermost key first. Empty for the root.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<String>,
}

impl ValidationIssue {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: Vec::new(),
        }
    }

    pub fn at(mut self, path: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.path = path.into_iter().map(Into::into).collect();
        self
    }
}

/// Result of running a schema.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    Valid(Value),
    Invalid(Vec<ValidationIssue>),
}

/// A validation adapter.
#[async_trait]
pub trait Schema: Send + Sync {
    /// Name of the library or adapter behind this schema. Logged only.
    fn vendor(&self) -> &str {
        "custom"
    }

    async fn validate(&self, value: Value) -> ValidationOutcome;
}

/// Adapts a synchronous closure into a `Schema`.
pub struct FnSchema<F> {
    vendor: String,
    check: F,
}

impl<F> FnSchema<F>
where
    F: Fn(Value) -> ValidationOutcome + Send + Sync,
{
    pub fn new(vendor: impl Into<String>, check: F) -> Self {
        Self {
            vendor: vendor.into(),
            check,
        }
    }
}

impl<F> fmt::Debug for FnSchema<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSchema").field("vendor", &self.vendor).finish()
    }
}

#[async_trait]
impl<F> Schema for FnSchema<F>
where
    F: Fn(Value) -> ValidationOutcome + Send + Sync,
{
    fn vendor(&self) -> &str {
        &self.vendor
    }

    async fn validate(&self, value: Value) -> ValidationOutcome {
        (self.check)(value)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn fn_schema_can_coerce() {
        let schema = FnSchema::new("test", |mut v: Value| {
            if let Some(id) = v.get("id").and_then(Value::as_i64) {
                v["id"] = Value::String(id.to_string());
            }
            ValidationOutcome::Valid(v)
        });
        assert_eq!(schema.vendor(), "test");
        let outcome = schema.validate(json!({"id": 7})).await;
        assert_eq!(outcome, ValidationOutcome::Valid(json!({"id": "7"})));
    }

    #[tokio::test]
    async fn fn_schema_reports_issues() {
        let schema = FnSchema::new("test", |v: Value| {
            if v.get("name").is_some() {
                ValidationOutcome::Valid(v)
            } else {
                ValidationOutcome::Invalid(vec![ValidationIssue::new("name is required").at(["name"])])
            }
        });
        match schema.validate(json!({})).await {
            ValidationOutcome::Invalid(issues) => {
                assert_eq!(issues.len(), 1);
                assert_eq!(issues[0].path, vec!["name".to_string()]);
            }
            other => panic!("expected issues, got {other:?}"),
        }
    }

    #[test]
    fn issue_path_is_omitted_when_empty() {
        let json = serde_json::to_value(ValidationIssue::new("bad")).unwrap();
        assert_eq!(json, json!({"message": "bad"}));
    }
}
