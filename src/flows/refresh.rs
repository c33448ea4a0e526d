//! Token lifecycle: opportunistic refresh-on-read with a singleflight guard.
//!
//! The engine exposes [`Engine::current_valid_token`] so the gateway (and
//! callers) can obtain a bearer token without worrying about expiry. A read
//! inside the configured skew window performs a `grant_type=refresh_token`
//! exchange first; a failed refresh is swallowed and the prior (possibly already
//! expired) token is surfaced so the downstream call fails with its own
//! `Unauthorized`. At most one refresh exchange is ever in flight: concurrent
//! readers wait on the guard and reuse the fresh session instead of starting a
//! second exchange, which matters for providers that invalidate the old refresh
//! token on rotation.

mod metrics;

pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	api::TokenSet,
	auth::TokenSecret,
	flows::Engine,
	http::ApiTransport,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	session::{self, Session},
};

impl<C> Engine<C>
where
	C: ?Sized + ApiTransport,
{
	/// Returns the bearer token to attach to the next call, refreshing
	/// opportunistically when the expiry skew window has been reached.
	///
	/// Policy (preserved deliberately): refresh failures are not fatal to this
	/// read, and a session without a refresh token surfaces its stale access
	/// token untouched; the next API call observes the auth failure instead.
	pub async fn current_valid_token(&self) -> Result<TokenSecret> {
		self.valid_session().await?.access_token.ok_or(Error::NotLoggedIn)
	}

	/// Loads the session, refreshing the access token first when warranted.
	pub(crate) async fn valid_session(&self) -> Result<Session> {
		let session = Session::load(self.store.as_ref()).await?;
		let now = OffsetDateTime::now_utc();

		if !session.needs_refresh_at(now, self.config.refresh_skew)
			|| session.refresh_token.is_none()
		{
			return Ok(session);
		}

		// Singleflight: whoever loses the race waits here, then re-reads the
		// session another caller may have refreshed already.
		let _singleflight = self.refresh_guard.lock().await;
		let session = Session::load(self.store.as_ref()).await?;

		if !session.needs_refresh_at(OffsetDateTime::now_utc(), self.config.refresh_skew) {
			return Ok(session);
		}

		let Some(refresh_token) = session.refresh_token.clone() else {
			return Ok(session);
		};

		match self.refresh_exchange(refresh_token.expose()).await {
			Ok(set) => {
				session::persist_token_set(self.store.as_ref(), &set, OffsetDateTime::now_utc())
					.await?;

				Ok(Session::load(self.store.as_ref()).await?)
			},
			Err(err) => {
				// Deferred to the next call's own Unauthorized outcome.
				obs::warn(&format!("Token refresh failed; surfacing the stale token: {err}."));

				Ok(session)
			},
		}
	}

	/// Performs an explicit refresh exchange, surfacing failures as
	/// [`Error::RefreshFailed`]. Holds the same singleflight guard as
	/// opportunistic reads.
	pub async fn refresh_session(&self) -> Result<()> {
		let _singleflight = self.refresh_guard.lock().await;
		let session = Session::load(self.store.as_ref()).await?;
		let refresh_token = session
			.refresh_token
			.ok_or_else(|| Error::RefreshFailed { reason: "no refresh token is stored".into() })?;
		let set = self
			.refresh_exchange(refresh_token.expose())
			.await
			.map_err(|err| Error::RefreshFailed { reason: err.to_string() })?;

		session::persist_token_set(self.store.as_ref(), &set, OffsetDateTime::now_utc()).await?;

		Ok(())
	}

	/// Persists a freshly issued token set at the current instant.
	///
	/// The refresh token is only overwritten when `set` carries one.
	pub async fn adopt_token_set(&self, set: &TokenSet) -> Result<()> {
		session::persist_token_set(self.store.as_ref(), set, OffsetDateTime::now_utc()).await?;

		Ok(())
	}

	/// Current session snapshot without any refresh side effects.
	pub async fn session(&self) -> Result<Session> {
		Ok(Session::load(self.store.as_ref()).await?)
	}

	/// Username bound to the session, when logged in.
	pub async fn username(&self) -> Result<Option<String>> {
		Ok(self.session().await?.username)
	}

	/// `true` when an access token is stored.
	pub async fn logged_in(&self) -> Result<bool> {
		Ok(self.session().await?.logged_in())
	}

	/// Clears the entire persisted session. Unconditional and idempotent.
	pub async fn logout(&self) -> Result<()> {
		Ok(self.store.clear().await?)
	}

	async fn refresh_exchange(&self, refresh_token: &str) -> Result<TokenSet> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "refresh_exchange");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.refresh_metrics.record_attempt();

		let result = span
			.instrument(async move {
				let form = vec![
					("grant_type".to_owned(), "refresh_token".to_owned()),
					("refresh_token".to_owned(), refresh_token.to_owned()),
				];

				self.token_exchange(form).await
			})
			.await;

		match &result {
			Ok(_) => {
				self.refresh_metrics.record_success();
				obs::record_flow_outcome(KIND, FlowOutcome::Success);
			},
			Err(_) => {
				self.refresh_metrics.record_failure();
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
			},
		}

		result
	}
}
