//! Session & purge engine for PKCE-protected content APIs: authorization handshakes,
//! opportunistic token refresh, full-history pagination, and resumable bulk
//! scrub-and-delete in one crate.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod auth;
pub mod config;
pub mod content;
pub mod error;
pub mod flows;
pub mod gateway;
pub mod http;
pub mod obs;
pub mod session;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		config::EngineConfig,
		flows::Engine,
		http::ReqwestTransport,
		store::{MemoryStore, SecretStore},
	};

	/// Engine type alias used by reqwest-backed integration tests.
	pub type ReqwestTestEngine = Engine<ReqwestTransport>;

	/// Constructs an [`Engine`] backed by an in-memory secret store and the reqwest
	/// transport used across integration tests.
	pub fn build_reqwest_test_engine(config: EngineConfig) -> (ReqwestTestEngine, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn SecretStore> = store_backend.clone();
		let engine = Engine::with_transport(store, config, ReqwestTransport::default());

		(engine, store_backend)
	}

	/// Builds an [`EngineConfig`] whose endpoints all point at a loopback mock server root.
	pub fn mock_server_config(base: &str) -> EngineConfig {
		let parse = |suffix: &str| {
			Url::parse(&format!("{base}{suffix}"))
				.expect("Mock server URL fixture should parse successfully.")
		};

		EngineConfig::builder("client-it")
			.redirect_uri(Url::parse("testapp://auth").expect("Redirect URI fixture should parse."))
			.authorize_endpoint(parse("/api/v1/authorize"))
			.token_endpoint(parse("/api/v1/access_token"))
			.api_base(parse("/"))
			.scopes(["identity", "history", "edit", "read"])
			.build()
			.expect("Mock engine config should build successfully.")
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::RwLock;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use httpmock as _;
