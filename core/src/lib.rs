//! Typed HTTP client that returns failures as data.
//!
//! # Overview
//! Every request resolves to an `HttpResult<T>`: either `Success` with the
//! decoded body and response headers, or `Failure` with an `HttpError` whose
//! kind is one of `network`, `timeout`, `parse`, `validation`, `response` or
//! `configuration`. Nothing is raised for these; `HttpResult::unwrap` is the
//! only place a failure becomes a panic.
//!
//! # Design
//! - `HttpClient` is stateless apart from its immutable `ClientConfig`.
//! - The network is behind the `Transport` trait; `ReqwestTransport` is the
//!   default, tests plug in their own.
//! - Response bodies can be checked by any `Schema` adapter before they are
//!   decoded into `T`.
//! - `Plugin`s see every request before it is sent and every result before it
//!   is returned, in registration order.

pub mod body;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod pipeline;
pub mod plugin;
pub mod response;
pub mod result;
pub mod schema;
pub mod transport;
pub mod url;

pub use body::{Body, MultipartForm, TransportBody};
pub use client::{ClientBuilder, HttpClient, RequestOptions};
pub use config::{ClientConfig, ClientSettings};
pub use error::{ConfigError, ErrorFormatter, ErrorKind, HttpError, TransportError};
pub use http::{Headers, HttpMethod, TransportRequest, TransportResponse};
pub use pipeline::RequestDescriptor;
pub use plugin::{FnPlugin, Plugin, PluginRegistry, RequestContext, ResponseContext, StateBag};
pub use result::HttpResult;
pub use schema::{FnSchema, Schema, ValidationIssue, ValidationOutcome};
pub use transport::{AbortSignal, ReqwestTransport, Transport};
