//! Authorization Code + PKCE flow: handshake start, redirect completion, and
//! identity binding.
//!
//! [`Engine::begin_authorization`] hands the caller a single-use
//! [`AuthorizationAttempt`] plus the browser URL; the redirect handler parses the
//! callback into [`CallbackParams`] and passes both into
//! [`Engine::complete_authorization`], which validates the state, exchanges the
//! code, persists the token set, and binds the username via the identity
//! endpoint. The attempt is consumed by value whatever the outcome, so a retried
//! callback can never replay it.

// self
use crate::{
	_prelude::*,
	api::{self, Identity},
	auth::AuthorizationAttempt,
	flows::Engine,
	http::ApiTransport,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	session::{self, Session},
};

/// Query parameters delivered to the redirect URI.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallbackParams {
	/// Authorization code, on success.
	pub code: Option<String>,
	/// Round-tripped state value.
	pub state: Option<String>,
	/// Provider-reported error code, on failure.
	pub error: Option<String>,
}
impl CallbackParams {
	/// Extracts the callback parameters from a redirect URL.
	pub fn from_redirect_url(url: &Url) -> Self {
		let mut params = Self::default();

		for (name, value) in url.query_pairs() {
			match name.as_ref() {
				"code" => params.code = Some(value.into_owned()),
				"state" => params.state = Some(value.into_owned()),
				"error" => params.error = Some(value.into_owned()),
				_ => {},
			}
		}

		params
	}
}

impl<C> Engine<C>
where
	C: ?Sized + ApiTransport,
{
	/// Starts a new authorization handshake.
	///
	/// Returns the attempt the caller must hold onto for the redirect; beginning
	/// another handshake supersedes any prior attempt, which the caller should
	/// drop. Open [`AuthorizationAttempt::authorize_url`] in the user's browser.
	pub fn begin_authorization(&self) -> AuthorizationAttempt {
		let _guard = FlowSpan::new(FlowKind::Authorize, "begin_authorization").entered();

		AuthorizationAttempt::generate(&self.config)
	}

	/// Completes the handshake from the redirect callback.
	///
	/// Fails with [`Error::MissingAuthorizationCode`] when the provider reported
	/// an error or sent no code or state, and with [`Error::StateMismatch`],
	/// before any token endpoint call, when the state does not round-trip. On success the
	/// session is persisted (tokens, expiry, username) and returned.
	pub async fn complete_authorization(
		&self,
		attempt: AuthorizationAttempt,
		callback: CallbackParams,
	) -> Result<Session> {
		const KIND: FlowKind = FlowKind::Authorize;

		let span = FlowSpan::new(KIND, "complete_authorization");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				if let Some(error) = callback.error {
					return Err(Error::MissingAuthorizationCode { reason: Some(error) });
				}

				let code = callback.code.ok_or(Error::MissingAuthorizationCode { reason: None })?;
				let state =
					callback.state.ok_or(Error::MissingAuthorizationCode { reason: None })?;

				attempt.validate_state(&state)?;

				let verifier = attempt.into_verifier();
				let form = vec![
					("grant_type".to_owned(), "authorization_code".to_owned()),
					("code".to_owned(), code),
					("redirect_uri".to_owned(), self.config.redirect_uri.to_string()),
					("code_verifier".to_owned(), verifier.expose().to_owned()),
				];
				let set = self.token_exchange(form).await?;

				session::persist_token_set(self.store.as_ref(), &set, OffsetDateTime::now_utc())
					.await?;

				// Bind the account name once, right after login.
				let identity = self.identity().await?;

				session::persist_username(self.store.as_ref(), &identity.name).await?;

				Ok(Session::load(self.store.as_ref()).await?)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Fetches the authenticated account's identity.
	pub async fn identity(&self) -> Result<Identity> {
		let response = self.authorized_get("api/v1/me", &[]).await?;

		api::decode(&response.body, response.status)
	}
}
