//! The transport seam and its cancellation token.
//!
//! # Design
//! The pipeline never talks to the network itself. It hands a resolved
//! `TransportRequest` and an `AbortSignal` to a `Transport` and waits. When the
//! per-call timer elapses the signal fires and the in-flight future is
//! dropped. `ReqwestTransport` is the implementation used outside tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::body::{MultipartForm, PartValue, TransportBody};
use crate::error::TransportError;
use crate::http::{Headers, TransportRequest, TransportResponse};

#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one exchange. Implementations should return
    /// `TransportError::Aborted` once `signal` fires.
    async fn send(
        &self,
        request: TransportRequest,
        signal: AbortSignal,
    ) -> Result<TransportResponse, TransportError>;
}

/// Cancellation token shared between the pipeline and a transport call.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal {
    inner: Arc<SignalState>,
}

#[derive(Debug, Default)]
struct SignalState {
    aborted: AtomicBool,
    notify: Notify,
}

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.inner.aborted.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_aborted(&self) -> bool {
        self.inner.aborted.load(Ordering::SeqCst)
    }

    /// Resolves once `abort` has been called.
    pub async fn aborted(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_aborted() {
                return;
            }
            notified.await;
        }
    }
}

/// `Transport` backed by a shared `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|e| TransportError::Failed(e.to_string()))?;
        let mut builder = self.client.request(method, &request.url);
        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }
        builder = match request.body {
            None => builder,
            Some(TransportBody::Bytes(bytes)) => builder.body(bytes),
            Some(TransportBody::Text(text)) => builder.body(text),
            Some(TransportBody::UrlEncoded(pairs)) => builder.form(&pairs),
            Some(TransportBody::Multipart(form)) => builder.multipart(multipart(form)?),
        };

        let response = builder.send().await.map_err(failed)?;
        let status = response.status().as_u16();
        let headers: Headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| Some((name.as_str().to_string(), value.to_str().ok()?.to_string())))
            .collect();
        let body = response.bytes().await.map_err(failed)?.to_vec();
        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(
        &self,
        request: TransportRequest,
        signal: AbortSignal,
    ) -> Result<TransportResponse, TransportError> {
        tokio::select! {
            result = self.execute(request) => result,
            _ = signal.aborted() => Err(TransportError::Aborted),
        }
    }
}

fn failed(err: reqwest::Error) -> TransportError {
    TransportError::Failed(err.to_string())
}

fn multipart(form: MultipartForm) -> Result<reqwest::multipart::Form, TransportError> {
    let mut out = reqwest::multipart::Form::new();
    for part in form.parts {
        out = match part.value {
            PartValue::Text(text) => out.text(part.name, text),
            PartValue::File {
                bytes,
                filename,
                content_type,
            } => {
                let mut file = reqwest::multipart::Part::bytes(bytes);
                if let Some(filename) = filename {
                    file = file.file_name(filename);
                }
                if let Some(content_type) = content_type {
                    file = file.mime_str(&content_type).map_err(failed)?;
                }
                out.part(part.name, file)
            }
        };
    }
    Ok(out)
}
