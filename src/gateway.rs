//! Single dispatch point for outbound calls: bearer attachment, the
//! client-identification header, HTTP Basic token exchanges, and status
//! classification.
//!
//! Every authorized call consults the token lifecycle flow exactly once, here.
//! The gateway never retries; it classifies `Unauthorized` (401/403-class),
//! `RateLimited` (429-class), and transport failures distinctly so callers can
//! pick a retry policy per kind.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
// self
use crate::{
	_prelude::*,
	api::{self, TokenSet},
	flows::Engine,
	http::{ApiTransport, OutboundRequest, OutboundResponse},
};

const BODY_PREVIEW_LIMIT: usize = 256;

impl<C> Engine<C>
where
	C: ?Sized + ApiTransport,
{
	/// Resolves a path (plus query pairs) against the configured API base.
	pub(crate) fn api_url(&self, path: &str, query: &[(&str, String)]) -> Result<Url> {
		let mut url = self
			.config
			.endpoints
			.api_base
			.join(path)
			.map_err(|source| crate::error::ConfigError::InvalidApiPath { source })?;

		if !query.is_empty() {
			let mut pairs = url.query_pairs_mut();

			for (name, value) in query {
				pairs.append_pair(name, value);
			}
		}

		Ok(url)
	}

	/// Executes an authorized GET and returns the classified success response.
	pub(crate) async fn authorized_get(
		&self,
		path: &str,
		query: &[(&str, String)],
	) -> Result<OutboundResponse> {
		let url = self.api_url(path, query)?;
		let request = self.authorize_request(OutboundRequest::get(url)).await?;

		classify(self.transport.execute(request).await?)
	}

	/// Executes an authorized form POST and returns the classified success response.
	pub(crate) async fn authorized_post_form(
		&self,
		path: &str,
		form: Vec<(String, String)>,
	) -> Result<OutboundResponse> {
		let url = self.api_url(path, &[])?;
		let request = self.authorize_request(OutboundRequest::post_form(url, form)).await?;

		classify(self.transport.execute(request).await?)
	}

	/// Executes a token endpoint exchange with HTTP Basic client authentication.
	///
	/// Public-client PKCE convention: the client id is the Basic username and the
	/// password is empty. No bearer token is ever attached here, and the
	/// identification header reports `anonymous`.
	pub(crate) async fn token_exchange(&self, form: Vec<(String, String)>) -> Result<TokenSet> {
		let request = OutboundRequest::post_form(self.config.endpoints.token.clone(), form)
			.header("Authorization", self.basic_credential())
			.header("User-Agent", self.config.identity.user_agent(None));
		let response = classify(self.transport.execute(request).await?)?;

		api::decode(&response.body, response.status)
	}

	async fn authorize_request(&self, request: OutboundRequest) -> Result<OutboundRequest> {
		let session = self.valid_session().await?;
		let token = session.access_token.as_ref().ok_or(Error::NotLoggedIn)?;

		Ok(request
			.header("Authorization", format!("Bearer {}", token.expose()))
			.header("User-Agent", self.config.identity.user_agent(session.username.as_deref())))
	}

	fn basic_credential(&self) -> String {
		format!("Basic {}", STANDARD.encode(format!("{}:", self.config.client_id)))
	}
}

/// Maps a transport response onto the engine's error taxonomy, passing
/// successful responses through with their status intact.
pub(crate) fn classify(response: OutboundResponse) -> Result<OutboundResponse> {
	match response.status {
		200..=299 => Ok(response),
		401 | 403 => Err(Error::Unauthorized { message: body_preview(&response.body) }),
		429 => Err(Error::RateLimited { retry_after: response.retry_after }),
		status => Err(Error::Api { status, message: body_preview(&response.body) }),
	}
}

fn body_preview(body: &[u8]) -> String {
	let text = String::from_utf8_lossy(body);
	let trimmed = text.trim();

	if trimmed.is_empty() {
		return "<empty body>".into();
	}

	trimmed.chars().take(BODY_PREVIEW_LIMIT).collect()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn response(status: u16, body: &str, retry_after: Option<Duration>) -> OutboundResponse {
		OutboundResponse { status, retry_after, body: body.as_bytes().to_vec() }
	}

	#[test]
	fn success_statuses_pass_the_response_through() {
		let passed = classify(response(201, "{\"ok\":true}", None))
			.expect("2xx responses should classify as success.");

		assert_eq!(passed.status, 201);
		assert_eq!(passed.body, b"{\"ok\":true}");
	}

	#[test]
	fn parse_failures_carry_the_real_status() {
		let passed = classify(response(202, "not json", None))
			.expect("2xx responses should classify as success.");
		let err = crate::api::decode::<crate::api::Identity>(&passed.body, passed.status)
			.expect_err("Malformed JSON should fail to decode.");

		assert!(matches!(err, Error::ResponseParse { status: 202, .. }));
	}

	#[test]
	fn unauthorized_and_forbidden_classify_identically() {
		for status in [401, 403] {
			let err = classify(response(status, "expired", None))
				.expect_err("401/403 should classify as Unauthorized.");

			assert!(matches!(err, Error::Unauthorized { message } if message == "expired"));
		}
	}

	#[test]
	fn rate_limiting_carries_the_retry_hint() {
		let err = classify(response(429, "", Some(Duration::seconds(42))))
			.expect_err("429 should classify as RateLimited.");

		assert!(matches!(
			err,
			Error::RateLimited { retry_after: Some(hint) } if hint == Duration::seconds(42)
		));
	}

	#[test]
	fn other_failures_preview_the_body() {
		let err = classify(response(500, "  internal explosion  ", None))
			.expect_err("5xx should classify as Api.");

		assert!(matches!(
			err,
			Error::Api { status: 500, message } if message == "internal explosion"
		));
	}
}
