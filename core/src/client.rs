//! Public facade over the request pipeline.
//!
//! # Design
//! `HttpClient` holds only an `Arc<ClientConfig>` and carries no mutable state
//! between calls; cloning it is cheap and every clone shares the same
//! configuration. Each verb helper is a thin wrapper over `request`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::body::Body;
use crate::config::{ClientConfig, ClientSettings, HeaderSupplier, DEFAULT_TIMEOUT_MS};
use crate::error::{default_format, ConfigError, ErrorFormatter, HttpError};
use crate::http::{Headers, HttpMethod};
use crate::pipeline::{self, RequestDescriptor};
use crate::plugin::{Plugin, PluginRegistry};
use crate::result::HttpResult;
use crate::schema::Schema;
use crate::transport::{ReqwestTransport, Transport};

/// Per-call options.
#[derive(Clone, Default)]
pub struct RequestOptions {
    pub headers: Headers,
    pub query: Vec<(String, Option<String>)>,
    pub params: HashMap<String, String>,
    pub timeout: Option<Duration>,
    pub schema: Option<Arc<dyn Schema>>,
    pub body: Option<Body>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), Some(value.to_string())));
        self
    }

    /// `None` values are dropped when the URL is built.
    pub fn query_opt(mut self, key: impl Into<String>, value: Option<impl ToString>) -> Self {
        self.query.push((key.into(), value.map(|v| v.to_string())));
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(name.into(), value.to_string());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn schema(mut self, schema: impl Schema + 'static) -> Self {
        self.schema = Some(Arc::new(schema));
        self
    }

    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }
}

impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("headers", &self.headers)
            .field("query", &self.query)
            .field("params", &self.params)
            .field("timeout", &self.timeout)
            .field("schema", &self.schema.as_ref().map(|s| s.vendor()))
            .field("body", &self.body)
            .finish()
    }
}

/// Typed HTTP client returning `HttpResult` instead of raising.
#[derive(Debug, Clone)]
pub struct HttpClient {
    config: Arc<ClientConfig>,
}

impl HttpClient {
    pub fn builder(base_url: &str) -> ClientBuilder {
        ClientBuilder::new(base_url)
    }

    pub fn from_settings(settings: &ClientSettings) -> ClientBuilder {
        ClientBuilder::new(&settings.base_url).timeout(settings.timeout())
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub async fn request<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        options: RequestOptions,
    ) -> HttpResult<T> {
        let descriptor = RequestDescriptor {
            method,
            path: path.to_string(),
            params: options.params,
            query: options.query,
            headers: options.headers,
            body: options.body,
            timeout: options.timeout,
            schema: options.schema,
        };
        pipeline::execute(&self.config, descriptor).await
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, options: RequestOptions) -> HttpResult<T> {
        self.request(HttpMethod::Get, path, options).await
    }

    pub async fn head<T: DeserializeOwned>(&self, path: &str, options: RequestOptions) -> HttpResult<T> {
        self.request(HttpMethod::Head, path, options).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str, options: RequestOptions) -> HttpResult<T> {
        self.request(HttpMethod::Delete, path, options).await
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: impl Into<Body>,
        options: RequestOptions,
    ) -> HttpResult<T> {
        self.request(HttpMethod::Post, path, options.body(body)).await
    }

    pub async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: impl Into<Body>,
        options: RequestOptions,
    ) -> HttpResult<T> {
        self.request(HttpMethod::Put, path, options.body(body)).await
    }

    pub async fn patch<T: DeserializeOwned>(
        &self,
        path: &str,
        body: impl Into<Body>,
        options: RequestOptions,
    ) -> HttpResult<T> {
        self.request(HttpMethod::Patch, path, options.body(body)).await
    }
}

pub struct ClientBuilder {
    base_url: String,
    default_headers: Option<HeaderSupplier>,
    timeout: Duration,
    error_formatter: Option<ErrorFormatter>,
    plugins: PluginRegistry,
    transport: Option<Arc<dyn Transport>>,
}

impl ClientBuilder {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            default_headers: None,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            error_formatter: None,
            plugins: PluginRegistry::default(),
            transport: None,
        }
    }

    pub fn default_headers<F>(mut self, supplier: F) -> Self
    where
        F: Fn(&RequestDescriptor) -> Headers + Send + Sync + 'static,
    {
        self.default_headers = Some(Arc::new(supplier));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn error_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&HttpError) -> String + Send + Sync + 'static,
    {
        self.error_formatter = Some(Arc::new(formatter));
        self
    }

    /// Plugins run in the order they are added.
    pub fn plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.plugins.push(Arc::new(plugin));
        self
    }

    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    pub fn build(self) -> Result<HttpClient, ConfigError> {
        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout);
        }
        let config = ClientConfig {
            base_url: self.base_url,
            default_headers: self.default_headers,
            timeout: self.timeout,
            error_formatter: self
                .error_formatter
                .unwrap_or_else(|| Arc::new(default_format) as ErrorFormatter),
            plugins: self.plugins,
            transport: self
                .transport
                .unwrap_or_else(|| Arc::new(ReqwestTransport::new()) as Arc<dyn Transport>),
        };
        Ok(HttpClient {
            config: Arc::new(config),
        })
    }
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("plugins", &self.plugins)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_stripped() {
        let client = HttpClient::builder("http://localhost:3000/").build().unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000");
    }

    #[test]
    fn default_timeout_is_thirty_seconds() {
        let client = HttpClient::builder("http://localhost:3000").build().unwrap();
        assert_eq!(client.config().timeout, Duration::from_millis(30_000));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = HttpClient::builder("http://x")
            .timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::InvalidTimeout);
    }

    #[test]
    fn settings_carry_into_the_builder() {
        let settings = ClientSettings {
            base_url: "http://svc/".to_string(),
            timeout_ms: 1500,
        };
        let client = HttpClient::from_settings(&settings).build().unwrap();
        assert_eq!(client.base_url(), "http://svc");
        assert_eq!(client.config().timeout, Duration::from_millis(1500));
    }

    #[test]
    fn options_collect_query_in_order() {
        let options = RequestOptions::new()
            .query("page", 2)
            .query_opt("filter", None::<String>)
            .query("tag", "a")
            .param("id", 7)
            .header("X-Trace", "on");
        assert_eq!(
            options.query,
            vec![
                ("page".to_string(), Some("2".to_string())),
                ("filter".to_string(), None),
                ("tag".to_string(), Some("a".to_string())),
            ]
        );
        assert_eq!(options.params.get("id").map(String::as_str), Some("7"));
        assert_eq!(options.headers.get("x-trace"), Some("on"));
    }
}
