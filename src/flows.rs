//! High-level flow orchestrators powered by the engine facade.

pub mod authorize;
pub mod history;
pub mod purge;
pub mod refresh;

pub use authorize::*;
pub use history::*;
pub use purge::*;
pub use refresh::*;

// crates.io
use async_lock::MutexGuard;
// self
use crate::{_prelude::*, config::EngineConfig, http::ApiTransport, store::SecretStore};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Engine specialized for the crate's default reqwest transport.
pub type ReqwestEngine = Engine<ReqwestTransport>;

/// Coordinates the session and purge workflow against a single provider.
///
/// The engine owns the transport, secret store, and configuration so individual
/// flow implementations can focus on their own logic (PKCE handshakes, refresh
/// rotations, pagination, purge sequencing). Two guards serialize the moving
/// parts: a singleflight refresh guard so concurrent token reads share one
/// exchange, and a run guard so listing and purge runs never interleave
/// mutations on the working set.
pub struct Engine<C>
where
	C: ?Sized + ApiTransport,
{
	/// HTTP transport used for every outbound provider request.
	pub transport: Arc<C>,
	/// Secret store that persists the session across restarts.
	pub store: Arc<dyn SecretStore>,
	/// Validated engine configuration.
	pub config: EngineConfig,
	/// Shared metrics recorder for refresh flow outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	pub(crate) refresh_guard: Arc<AsyncMutex<()>>,
	pub(crate) run_guard: Arc<AsyncMutex<()>>,
}
impl<C> Engine<C>
where
	C: ?Sized + ApiTransport,
{
	/// Creates an engine that reuses the caller-provided transport.
	pub fn with_transport(
		store: Arc<dyn SecretStore>,
		config: EngineConfig,
		transport: impl Into<Arc<C>>,
	) -> Self {
		Self {
			transport: transport.into(),
			store,
			config,
			refresh_metrics: Default::default(),
			refresh_guard: Default::default(),
			run_guard: Default::default(),
		}
	}

	/// Claims the exclusive run slot, or fails with [`Error::Busy`] when another
	/// `load_all`/`fetch_all`/`purge` invocation is outstanding.
	pub(crate) fn claim_run_slot(&self) -> Result<MutexGuard<'_, ()>> {
		self.run_guard.try_lock().ok_or(Error::Busy)
	}
}
#[cfg(feature = "reqwest")]
impl Engine<ReqwestTransport> {
	/// Creates a new engine with a default reqwest-backed transport.
	pub fn new(store: Arc<dyn SecretStore>, config: EngineConfig) -> Self {
		Self::with_transport(store, config, ReqwestTransport::default())
	}
}
impl<C> Clone for Engine<C>
where
	C: ?Sized + ApiTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			store: self.store.clone(),
			config: self.config.clone(),
			refresh_metrics: self.refresh_metrics.clone(),
			refresh_guard: self.refresh_guard.clone(),
			run_guard: self.run_guard.clone(),
		}
	}
}
impl<C> Debug for Engine<C>
where
	C: ?Sized + ApiTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Engine")
			.field("client_id", &self.config.client_id)
			.field("api_base", &self.config.endpoints.api_base.as_str())
			.finish()
	}
}
