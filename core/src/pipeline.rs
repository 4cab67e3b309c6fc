//! One request, start to finish.
//!
//! # Design
//! `execute` walks a fixed sequence of stages:
//!
//! 1. compose the URL and seed the headers,
//! 2. run the request hooks,
//! 3. negotiate the body and content-type,
//! 4. call the transport, racing it against the timeout,
//! 5. parse and validate the response,
//! 6. run the response hooks,
//! 7. decode into `T`, then format the error message if the call failed.
//!
//! Every path ends with a returned `HttpResult`. A timeout or transport
//! failure skips the parse and response-hook stages and goes straight to
//! formatting with a `timeout` or `network` error. A URL that cannot be
//! composed fails before any hook or transport activity. Nothing here holds state between calls, so one client can run
//! any number of requests at once.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, field, info_span, warn, Instrument, Span};
use uuid::Uuid;

use crate::body::{self, Body};
use crate::config::ClientConfig;
use crate::error::{apply_formatter, HttpError, TransportError};
use crate::http::{Headers, HttpMethod, TransportRequest, TransportResponse};
use crate::plugin::{RequestContext, StateBag};
use crate::response::parse_response;
use crate::result::HttpResult;
use crate::schema::Schema;
use crate::transport::AbortSignal;
use crate::url;

/// Everything a caller supplies for one request.
#[derive(Clone, Default)]
pub struct RequestDescriptor {
    pub method: HttpMethod,
    pub path: String,
    pub params: HashMap<String, String>,
    pub query: Vec<(String, Option<String>)>,
    pub headers: Headers,
    pub body: Option<Body>,
    pub timeout: Option<Duration>,
    pub schema: Option<Arc<dyn Schema>>,
}

impl fmt::Debug for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestDescriptor")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("params", &self.params)
            .field("query", &self.query)
            .field("headers", &self.headers)
            .field("body", &self.body)
            .field("timeout", &self.timeout)
            .field("schema", &self.schema.as_ref().map(|s| s.vendor()))
            .finish()
    }
}

pub async fn execute<T: DeserializeOwned>(
    config: &ClientConfig,
    descriptor: RequestDescriptor,
) -> HttpResult<T> {
    let request_id = Uuid::new_v4();
    let span = info_span!(
        "http_request",
        %request_id,
        method = %descriptor.method,
        path = %descriptor.path,
        url = field::Empty
    );
    async move {
        let mut result = run(config, request_id, descriptor).await;
        if let Some(error) = result.error_mut() {
            apply_formatter(&config.error_formatter, error);
            warn!(kind = error.kind_name(), message = %error.message, "request failed");
        } else {
            debug!("request succeeded");
        }
        result
    }
    .instrument(span)
    .await
}

async fn run<T: DeserializeOwned>(
    config: &ClientConfig,
    request_id: Uuid,
    descriptor: RequestDescriptor,
) -> HttpResult<T> {
    let external = url::is_absolute(&descriptor.path);
    let url = match url::compose(
        &config.base_url,
        &descriptor.path,
        &descriptor.params,
        &descriptor.query,
    ) {
        Ok(url) => url,
        Err(err) => return HttpResult::failure(HttpError::configuration(err), None),
    };
    Span::current().record("url", url.as_str());

    // Third-party hosts never see the client's default headers.
    let mut headers = match (&config.default_headers, external) {
        (Some(supplier), false) => supplier(&descriptor),
        _ => Headers::new(),
    };
    headers.extend(descriptor.headers.clone());

    let mut ctx = RequestContext {
        request_id,
        method: descriptor.method,
        path: descriptor.path.clone(),
        url,
        headers,
        body: descriptor.body.clone(),
        state: StateBag::new(),
    };

    debug!(hooks = config.plugins.len(), "running request hooks");
    config.plugins.run_request_phase(&mut ctx).await;

    let negotiated = match body::negotiate(ctx.method, ctx.body.clone()) {
        Ok(negotiated) => negotiated,
        Err(err) => return HttpResult::failure(HttpError::parse(err.to_string()), None),
    };
    let mut headers = ctx.headers.clone();
    if let Some(content_type) = negotiated.content_type {
        if !headers.contains("content-type") {
            headers.insert("content-type", content_type);
        }
    }
    let request = TransportRequest {
        method: ctx.method,
        url: ctx.url.clone(),
        headers,
        body: negotiated.body,
    };
    let timeout = descriptor.timeout.unwrap_or(config.timeout);

    // Timeout and network failures go straight to formatting.
    let response = match send(config, request, timeout).await {
        Ok(response) => response,
        Err(error) => return HttpResult::failure(error, None),
    };
    debug!(status = response.status, "response received");
    let outcome = parse_response(response, descriptor.schema.as_deref()).await;

    let outcome = config.plugins.run_response_phase(&mut ctx, outcome).await;
    decode(outcome)
}

/// Race the transport against the timer. Whichever loses is dropped, so the
/// timer never outlives the call.
async fn send(
    config: &ClientConfig,
    request: TransportRequest,
    timeout: Duration,
) -> Result<TransportResponse, HttpError> {
    debug!(url = %request.url, ?timeout, "sending");
    let signal = AbortSignal::new();
    let exchange = config.transport.send(request, signal.clone());
    let outcome = tokio::select! {
        outcome = exchange => outcome,
        _ = tokio::time::sleep(timeout) => {
            signal.abort();
            Err(TransportError::Aborted)
        }
    };
    match outcome {
        Ok(response) => Ok(response),
        Err(TransportError::Aborted) => Err(HttpError::timeout(timeout)),
        Err(TransportError::Failed(cause)) => Err(HttpError::network(cause)),
    }
}

fn decode<T: DeserializeOwned>(result: HttpResult<Value>) -> HttpResult<T> {
    match result {
        HttpResult::Success { data, headers } => match serde_json::from_value(data) {
            Ok(data) => HttpResult::success(data, headers),
            Err(err) => HttpResult::failure(HttpError::parse(err.to_string()), Some(headers)),
        },
        HttpResult::Failure { error, headers } => HttpResult::failure(error, headers),
    }
}
