//! Storage contract and built-in backends for persisted session secrets.
//!
//! The engine treats credential persistence as an external collaborator: a durable
//! key-value store holding the access token, refresh token, username, and expiry.
//! Confidentiality of the stored values is the backend's responsibility.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::_prelude::*;

/// Well-known keys used by the engine when persisting a session.
pub mod keys {
	/// Bearer token for authorized API calls.
	pub const ACCESS_TOKEN: &str = "access_token";
	/// Millisecond epoch after which the access token must be treated as invalid.
	pub const EXPIRY_MS: &str = "expiry_ms";
	/// Rotation secret for the refresh-token grant.
	pub const REFRESH_TOKEN: &str = "refresh_token";
	/// Account name bound to the session after the identity call.
	pub const USERNAME: &str = "username";
}

/// Boxed future type returned by [`SecretStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Durable key-value contract implemented by secret store backends.
///
/// Backends must persist values across process restarts ([`MemoryStore`] is the
/// deliberate exception, for tests and demos).
pub trait SecretStore
where
	Self: Send + Sync,
{
	/// Fetches the value stored under `key`, if present.
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>>;

	/// Persists or replaces the value stored under `key`.
	fn set<'a>(&'a self, key: &'a str, value: &'a str) -> StoreFuture<'a, ()>;

	/// Removes the value stored under `key`, if present.
	fn remove<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()>;

	/// Removes every stored value. Idempotent.
	fn clear(&self) -> StoreFuture<'_, ()>;
}

/// Error type produced by [`SecretStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
