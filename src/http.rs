//! Transport primitives for every outbound provider call.
//!
//! The module exposes [`ApiTransport`] alongside [`OutboundRequest`] and
//! [`OutboundResponse`] so downstream crates can integrate custom HTTP clients.
//! The engine owns all request construction and response classification; a
//! transport only moves bytes and reports the status line plus the Retry-After
//! hint. The default [`ReqwestTransport`] (behind the `reqwest` feature) covers
//! the common case.

// crates.io
#[cfg(feature = "reqwest")] use reqwest::header::RETRY_AFTER;
use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, error::TransportError};

/// HTTP methods used by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
	/// Idempotent reads (identity, listings).
	Get,
	/// Form-encoded mutations and token exchanges.
	Post,
}

/// A fully-prepared outbound request handed to the transport.
#[derive(Clone, Debug)]
pub struct OutboundRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute request URL including query parameters.
	pub url: Url,
	/// Header name/value pairs; names are well-known statics.
	pub headers: Vec<(&'static str, String)>,
	/// Form body pairs, encoded as `application/x-www-form-urlencoded` when present.
	pub form: Option<Vec<(String, String)>>,
}
impl OutboundRequest {
	/// Builds a GET request for the provided URL.
	pub fn get(url: Url) -> Self {
		Self { method: Method::Get, url, headers: Vec::new(), form: None }
	}

	/// Builds a form-encoded POST request for the provided URL.
	pub fn post_form(url: Url, form: Vec<(String, String)>) -> Self {
		Self { method: Method::Post, url, headers: Vec::new(), form: Some(form) }
	}

	/// Appends a header pair.
	pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
		self.headers.push((name, value.into()));

		self
	}

	/// Renders the form body as a URL-encoded string, if any.
	pub fn encoded_form(&self) -> Option<String> {
		self.form.as_ref().map(|pairs| {
			let mut serializer = url::form_urlencoded::Serializer::new(String::new());

			for (name, value) in pairs {
				serializer.append_pair(name, value);
			}

			serializer.finish()
		})
	}
}

/// Raw response surfaced by a transport; classification happens in the gateway.
#[derive(Clone, Debug)]
pub struct OutboundResponse {
	/// HTTP status code.
	pub status: u16,
	/// Retry-After hint expressed as a relative duration, when upstream sent one.
	pub retry_after: Option<Duration>,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl OutboundResponse {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Boxed future type returned by [`ApiTransport::execute`].
pub type TransportFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<T, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing engine requests.
///
/// Implementations must be `Send + Sync + 'static` so they can be shared behind
/// `Arc` across engine clones, and the returned futures must be `Send` so flows
/// can hop executors. A transport reports only transport-level failures through
/// [`TransportError`]; non-2xx statuses are successful executions.
pub trait ApiTransport
where
	Self: 'static + Send + Sync,
{
	/// Executes the request and captures the status, Retry-After hint, and body.
	fn execute(&self, request: OutboundRequest) -> TransportFuture<'_, OutboundResponse>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Configure any custom [`ReqwestClient`] to disable redirect following: token
/// endpoints return results directly instead of delegating to another URI.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl ApiTransport for ReqwestTransport {
	fn execute(&self, request: OutboundRequest) -> TransportFuture<'_, OutboundResponse> {
		let client = self.0.clone();

		Box::pin(async move {
			let mut builder = match request.method {
				Method::Get => client.get(request.url.clone()),
				Method::Post => client.post(request.url.clone()),
			};

			for (name, value) in &request.headers {
				builder = builder.header(*name, value);
			}
			if let Some(body) = request.encoded_form() {
				builder = builder
					.header("Content-Type", "application/x-www-form-urlencoded")
					.body(body);
			}

			let response = builder.send().await.map_err(TransportError::from)?;
			let status = response.status().as_u16();
			let retry_after = response
				.headers()
				.get(RETRY_AFTER)
				.and_then(|value| value.to_str().ok())
				.and_then(parse_retry_after);
			let body = response.bytes().await.map_err(TransportError::from)?.to_vec();

			Ok(OutboundResponse { status, retry_after, body })
		})
	}
}

/// Parses a Retry-After header value, either delta-seconds or an RFC 2822 date.
pub fn parse_retry_after(raw: &str) -> Option<Duration> {
	let raw = raw.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(secs as i64));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}
