//! Request/response hooks and the ordered registry that runs them.
//!
//! # Design
//! A plugin is a record of two optional capabilities, `on_request` and
//! `on_response`, both defaulting to no-ops. Hooks run one at a time in
//! registration order. Request hooks may edit the headers, body and state
//! bag in place. A response hook that returns `Some` replaces the current
//! result, and every later hook sees the replacement.
//!
//! A panicking hook is not caught: it unwinds out of the request.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::body::Body;
use crate::http::{Headers, HttpMethod};
use crate::result::HttpResult;

/// Per-call scratch space shared by every hook of one request.
#[derive(Default)]
pub struct StateBag {
    values: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl StateBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.values.insert(key.into(), Box::new(value));
    }

    /// `None` if the key is absent or holds a different type.
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.values.get(key)?.downcast_ref()
    }

    pub fn get_mut<T: Any>(&mut self, key: &str) -> Option<&mut T> {
        self.values.get_mut(key)?.downcast_mut()
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for StateBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}

/// The request as the hooks see it.
#[derive(Debug)]
pub struct RequestContext {
    pub request_id: Uuid,
    pub method: HttpMethod,
    /// The path template as the caller passed it.
    pub path: String,
    /// The composed URL. Hooks may rewrite it.
    pub url: String,
    pub headers: Headers,
    pub body: Option<Body>,
    pub state: StateBag,
}

/// The request context plus the result produced so far.
#[derive(Debug)]
pub struct ResponseContext<'a> {
    pub request: &'a mut RequestContext,
    pub result: &'a HttpResult<Value>,
}

#[async_trait]
pub trait Plugin: Send + Sync {
    /// Used in log output only.
    fn name(&self) -> Option<&str> {
        None
    }

    async fn on_request(&self, _ctx: &mut RequestContext) {}

    /// Return `Some` to replace the current result.
    async fn on_response(&self, _ctx: ResponseContext<'_>) -> Option<HttpResult<Value>> {
        None
    }
}

type RequestHook = Box<dyn Fn(&mut RequestContext) + Send + Sync>;
type ResponseHook = Box<dyn Fn(ResponseContext<'_>) -> Option<HttpResult<Value>> + Send + Sync>;

/// A plugin assembled from synchronous closures.
#[derive(Default)]
pub struct FnPlugin {
    name: Option<String>,
    on_request: Option<RequestHook>,
    on_response: Option<ResponseHook>,
}

impl FnPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn on_request<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut RequestContext) + Send + Sync + 'static,
    {
        self.on_request = Some(Box::new(hook));
        self
    }

    pub fn on_response<F>(mut self, hook: F) -> Self
    where
        F: Fn(ResponseContext<'_>) -> Option<HttpResult<Value>> + Send + Sync + 'static,
    {
        self.on_response = Some(Box::new(hook));
        self
    }
}

impl fmt::Debug for FnPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnPlugin")
            .field("name", &self.name)
            .field("on_request", &self.on_request.is_some())
            .field("on_response", &self.on_response.is_some())
            .finish()
    }
}

#[async_trait]
impl Plugin for FnPlugin {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    async fn on_request(&self, ctx: &mut RequestContext) {
        if let Some(hook) = &self.on_request {
            hook(ctx);
        }
    }

    async fn on_response(&self, ctx: ResponseContext<'_>) -> Option<HttpResult<Value>> {
        self.on_response.as_ref().and_then(|hook| hook(ctx))
    }
}

/// Ordered plugin list.
#[derive(Clone, Default)]
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl PluginRegistry {
    pub fn new(plugins: Vec<Arc<dyn Plugin>>) -> Self {
        Self { plugins }
    }

    pub fn push(&mut self, plugin: Arc<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub async fn run_request_phase(&self, ctx: &mut RequestContext) {
        for plugin in &self.plugins {
            debug!(plugin = plugin.name().unwrap_or("<unnamed>"), "on_request");
            plugin.on_request(ctx).await;
        }
    }

    /// Thread `result` through every `on_response` hook and return what's left.
    pub async fn run_response_phase(
        &self,
        ctx: &mut RequestContext,
        mut result: HttpResult<Value>,
    ) -> HttpResult<Value> {
        for plugin in &self.plugins {
            let replacement = plugin
                .on_response(ResponseContext {
                    request: &mut *ctx,
                    result: &result,
                })
                .await;
            if let Some(replacement) = replacement {
                debug!(plugin = plugin.name().unwrap_or("<unnamed>"), "result replaced");
                result = replacement;
            }
        }
        result
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.plugins.iter().map(|p| p.name().unwrap_or("<unnamed>")))
            .finish()
    }
}
