//! Session snapshot and its round-trip through the secret store.
//!
//! The session is owned by the token lifecycle flow: it is seeded by the
//! authorization-code exchange, advanced by refresh exchanges, and destroyed by
//! logout. Everything else reads snapshots.

// self
use crate::{
	_prelude::*,
	api::TokenSet,
	auth::TokenSecret,
	error::ConfigError,
	store::{SecretStore, StoreError, keys},
};

/// Point-in-time view of the persisted session.
#[derive(Clone)]
pub struct Session {
	/// Bearer token, present iff the session is considered logged in.
	pub access_token: Option<TokenSecret>,
	/// Rotation secret, absent when the provider never issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Account name bound after the identity call.
	pub username: Option<String>,
	/// Wall-clock instant after which the access token must be treated as invalid.
	pub expires_at: OffsetDateTime,
}
impl Session {
	/// Loads a snapshot from the secret store. Missing keys yield an empty,
	/// already-expired session.
	pub async fn load(store: &dyn SecretStore) -> Result<Self, StoreError> {
		let access_token =
			store.get(keys::ACCESS_TOKEN).await?.map(TokenSecret::new).filter(|t| !t.is_empty());
		let refresh_token =
			store.get(keys::REFRESH_TOKEN).await?.map(TokenSecret::new).filter(|t| !t.is_empty());
		let username = store.get(keys::USERNAME).await?.filter(|u| !u.is_empty());
		let expires_at = store
			.get(keys::EXPIRY_MS)
			.await?
			.and_then(|raw| raw.parse::<i64>().ok())
			.and_then(|ms| OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000).ok())
			.unwrap_or(OffsetDateTime::UNIX_EPOCH);

		Ok(Self { access_token, refresh_token, username, expires_at })
	}

	/// `true` when an access token is present.
	pub fn logged_in(&self) -> bool {
		self.access_token.is_some()
	}

	/// `true` when a token read at `now` should attempt a refresh first.
	pub fn needs_refresh_at(&self, now: OffsetDateTime, skew: Duration) -> bool {
		now >= self.expires_at - skew
	}
}
impl Debug for Session {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Session")
			.field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("username", &self.username)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Persists a token endpoint response at the provided instant.
///
/// The refresh token is only overwritten when the response carries one; refresh
/// grants may legitimately omit it, in which case the prior secret stays valid.
pub async fn persist_token_set(
	store: &dyn SecretStore,
	set: &TokenSet,
	now: OffsetDateTime,
) -> Result<OffsetDateTime> {
	if set.expires_in <= 0 {
		return Err(ConfigError::NonPositiveExpiresIn.into());
	}

	let expires_at = now + Duration::seconds(set.expires_in);
	let expiry_ms = (expires_at.unix_timestamp_nanos() / 1_000_000).to_string();

	store.set(keys::ACCESS_TOKEN, &set.access_token).await?;
	store.set(keys::EXPIRY_MS, &expiry_ms).await?;

	if let Some(refresh) = set.refresh_token.as_deref().filter(|r| !r.is_empty()) {
		store.set(keys::REFRESH_TOKEN, refresh).await?;
	}

	Ok(expires_at)
}

/// Binds the account name into the persisted session.
pub async fn persist_username(store: &dyn SecretStore, username: &str) -> Result<(), StoreError> {
	store.set(keys::USERNAME, username).await
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::store::MemoryStore;

	fn token_set(refresh: Option<&str>, expires_in: i64) -> TokenSet {
		TokenSet {
			access_token: "A".into(),
			refresh_token: refresh.map(Into::into),
			expires_in,
			token_type: Some("bearer".into()),
			scope: Some("history".into()),
		}
	}

	#[tokio::test]
	async fn empty_store_loads_an_expired_logged_out_session() {
		let store = MemoryStore::default();
		let session = Session::load(&store).await.expect("Loading an empty store should succeed.");

		assert!(!session.logged_in());
		assert_eq!(session.expires_at, OffsetDateTime::UNIX_EPOCH);
		assert!(session.needs_refresh_at(OffsetDateTime::now_utc(), Duration::seconds(60)));
	}

	#[tokio::test]
	async fn blank_stored_secrets_load_as_logged_out() {
		let store = MemoryStore::default();

		store.set(keys::ACCESS_TOKEN, "").await.expect("Seeding a blank token should succeed.");
		store.set(keys::REFRESH_TOKEN, "").await.expect("Seeding a blank secret should succeed.");

		let session = Session::load(&store).await.expect("Loading should succeed.");

		assert!(!session.logged_in());
		assert!(session.refresh_token.is_none());
	}

	#[tokio::test]
	async fn persisting_round_trips_through_the_store() {
		let store = MemoryStore::default();
		let now = macros::datetime!(2025-06-01 00:00 UTC);
		let expires_at = persist_token_set(&store, &token_set(Some("R"), 3600), now)
			.await
			.expect("Persisting a full token set should succeed.");

		assert_eq!(expires_at, now + Duration::hours(1));

		persist_username(&store, "demo_user").await.expect("Persisting username should succeed.");

		let session = Session::load(&store).await.expect("Loading should succeed.");

		assert!(session.logged_in());
		assert_eq!(session.access_token.as_ref().map(TokenSecret::expose), Some("A"));
		assert_eq!(session.refresh_token.as_ref().map(TokenSecret::expose), Some("R"));
		assert_eq!(session.username.as_deref(), Some("demo_user"));
		assert_eq!(session.expires_at, expires_at);
	}

	#[tokio::test]
	async fn refresh_responses_without_rotation_keep_the_prior_secret() {
		let store = MemoryStore::default();
		let now = macros::datetime!(2025-06-01 00:00 UTC);

		persist_token_set(&store, &token_set(Some("R1"), 3600), now)
			.await
			.expect("Seeding the session should succeed.");
		persist_token_set(&store, &token_set(None, 3600), now + Duration::minutes(59))
			.await
			.expect("Refresh persistence should succeed.");

		let session = Session::load(&store).await.expect("Loading should succeed.");

		assert_eq!(session.refresh_token.as_ref().map(TokenSecret::expose), Some("R1"));
	}

	#[tokio::test]
	async fn non_positive_expiry_is_rejected() {
		let store = MemoryStore::default();
		let err = persist_token_set(&store, &token_set(None, 0), OffsetDateTime::now_utc())
			.await
			.expect_err("Zero expires_in should be rejected.");

		assert!(matches!(
			err,
			Error::Config(crate::error::ConfigError::NonPositiveExpiresIn)
		));
	}

	#[test]
	fn skew_window_controls_refresh_decision() {
		let expires_at = macros::datetime!(2025-06-01 01:00 UTC);
		let session = Session {
			access_token: Some(TokenSecret::new("A")),
			refresh_token: None,
			username: None,
			expires_at,
		};
		let skew = Duration::seconds(60);

		assert!(!session.needs_refresh_at(expires_at - Duration::seconds(61), skew));
		assert!(session.needs_refresh_at(expires_at - Duration::seconds(60), skew));
		assert!(session.needs_refresh_at(expires_at - Duration::seconds(30), skew));
		assert!(session.needs_refresh_at(expires_at + Duration::seconds(1), skew));
	}
}
