//! Engine configuration: endpoints, client identity, pagination and purge knobs.
//!
//! [`EngineConfig`] is an immutable, validated value consumed by every flow. Build
//! one through [`EngineConfig::builder`], or start from [`EngineConfig::reddit`]
//! which seeds the production endpoint set.

// self
use crate::{_prelude::*, error::ConfigError};

const DEFAULT_REFRESH_SKEW: Duration = Duration::seconds(60);
const DEFAULT_PAGE_LIMIT: u32 = 100;
const DEFAULT_MAX_ITEMS: usize = 10_000;
const DEFAULT_SCRUB_PLACEHOLDER: &str = ".";

/// Endpoint set the engine dispatches against.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEndpoints {
	/// Browser-facing authorization endpoint (consent page).
	pub authorize: Url,
	/// Token endpoint for code and refresh exchanges.
	pub token: Url,
	/// Base URL for authorized API calls (identity, listings, mutations).
	pub api_base: Url,
}

/// Client-identification header material, rendered as
/// `<platform>:<app-id>:<version> (by /u/<username-or-anonymous>)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientIdentity {
	/// Platform label (e.g. `desktop`, `android`).
	pub platform: String,
	/// Reverse-DNS style application identifier.
	pub app_id: String,
	/// Application version string.
	pub version: String,
}
impl ClientIdentity {
	/// Renders the identification header for the provided username.
	pub fn user_agent(&self, username: Option<&str>) -> String {
		format!(
			"{}:{}:{} (by /u/{})",
			self.platform,
			self.app_id,
			self.version,
			username.unwrap_or("anonymous"),
		)
	}
}

/// Immutable engine configuration consumed by flows and the gateway.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
	/// OAuth 2.0 client identifier (public client, PKCE-only).
	pub client_id: String,
	/// Redirect URI registered for the client.
	pub redirect_uri: Url,
	/// Requested scopes, joined with spaces in the authorize URL.
	pub scopes: Vec<String>,
	/// Endpoint definitions.
	pub endpoints: ApiEndpoints,
	/// Identification header material attached to every call.
	pub identity: ClientIdentity,
	/// Window before expiry inside which a token read triggers a refresh.
	pub refresh_skew: Duration,
	/// Page size requested from listing endpoints.
	pub page_limit: u32,
	/// Safety cap bounding the total items a single `fetch_all` materializes.
	pub max_items: usize,
	/// Neutral placeholder written by the scrub step before deletion.
	pub scrub_placeholder: String,
}
impl EngineConfig {
	/// Creates a new builder for the provided client identifier.
	pub fn builder(client_id: impl Into<String>) -> EngineConfigBuilder {
		EngineConfigBuilder::new(client_id)
	}

	/// Production configuration against reddit.com for the provided client.
	pub fn reddit(client_id: impl Into<String>, redirect_uri: Url) -> Self {
		let parse = |value: &str| {
			// Hard-coded literals; parsing cannot fail.
			#[allow(clippy::unwrap_used)]
			Url::parse(value).unwrap()
		};

		Self {
			client_id: client_id.into(),
			redirect_uri,
			scopes: ["identity", "history", "edit", "read"].map(String::from).to_vec(),
			endpoints: ApiEndpoints {
				authorize: parse("https://www.reddit.com/api/v1/authorize"),
				token: parse("https://www.reddit.com/api/v1/access_token"),
				api_base: parse("https://oauth.reddit.com/"),
			},
			identity: ClientIdentity {
				platform: "desktop".into(),
				app_id: "reddit-purge".into(),
				version: format!("v{}", env!("CARGO_PKG_VERSION")),
			},
			refresh_skew: DEFAULT_REFRESH_SKEW,
			page_limit: DEFAULT_PAGE_LIMIT,
			max_items: DEFAULT_MAX_ITEMS,
			scrub_placeholder: DEFAULT_SCRUB_PLACEHOLDER.into(),
		}
	}
}

/// Builder validating [`EngineConfig`] invariants before use.
#[derive(Clone, Debug)]
pub struct EngineConfigBuilder {
	client_id: String,
	redirect_uri: Option<Url>,
	scopes: Vec<String>,
	authorize: Option<Url>,
	token: Option<Url>,
	api_base: Option<Url>,
	identity: ClientIdentity,
	refresh_skew: Duration,
	page_limit: u32,
	max_items: usize,
	scrub_placeholder: String,
}
impl EngineConfigBuilder {
	fn new(client_id: impl Into<String>) -> Self {
		Self {
			client_id: client_id.into(),
			redirect_uri: None,
			scopes: Vec::new(),
			authorize: None,
			token: None,
			api_base: None,
			identity: ClientIdentity {
				platform: "desktop".into(),
				app_id: "reddit-purge".into(),
				version: format!("v{}", env!("CARGO_PKG_VERSION")),
			},
			refresh_skew: DEFAULT_REFRESH_SKEW,
			page_limit: DEFAULT_PAGE_LIMIT,
			max_items: DEFAULT_MAX_ITEMS,
			scrub_placeholder: DEFAULT_SCRUB_PLACEHOLDER.into(),
		}
	}

	/// Sets the redirect URI registered for the client.
	pub fn redirect_uri(mut self, uri: Url) -> Self {
		self.redirect_uri = Some(uri);

		self
	}

	/// Replaces the requested scope list.
	pub fn scopes<I, S>(mut self, scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scopes = scopes.into_iter().map(Into::into).collect();

		self
	}

	/// Sets the browser-facing authorization endpoint.
	pub fn authorize_endpoint(mut self, url: Url) -> Self {
		self.authorize = Some(url);

		self
	}

	/// Sets the token endpoint used for code and refresh exchanges.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token = Some(url);

		self
	}

	/// Sets the base URL for authorized API calls.
	pub fn api_base(mut self, url: Url) -> Self {
		self.api_base = Some(url);

		self
	}

	/// Replaces the identification header material.
	pub fn identity(mut self, identity: ClientIdentity) -> Self {
		self.identity = identity;

		self
	}

	/// Overrides the refresh skew window (defaults to 60 seconds).
	pub fn refresh_skew(mut self, skew: Duration) -> Self {
		self.refresh_skew = if skew.is_negative() { Duration::ZERO } else { skew };

		self
	}

	/// Overrides the listing page size (defaults to 100).
	pub fn page_limit(mut self, limit: u32) -> Self {
		self.page_limit = limit;

		self
	}

	/// Overrides the pagination safety cap (defaults to 10,000 items).
	pub fn max_items(mut self, cap: usize) -> Self {
		self.max_items = cap;

		self
	}

	/// Overrides the scrub placeholder text (defaults to `"."`).
	pub fn scrub_placeholder(mut self, text: impl Into<String>) -> Self {
		self.scrub_placeholder = text.into();

		self
	}

	/// Validates the configuration and produces an [`EngineConfig`].
	pub fn build(self) -> Result<EngineConfig, ConfigError> {
		if self.client_id.trim().is_empty() {
			return Err(ConfigError::MissingClientId);
		}
		if self.page_limit == 0 {
			return Err(ConfigError::ZeroPageLimit);
		}

		let redirect_uri = self.redirect_uri.ok_or(ConfigError::MissingRedirectUri)?;
		let parse = |value: &str| {
			// Hard-coded literals; parsing cannot fail.
			#[allow(clippy::unwrap_used)]
			Url::parse(value).unwrap()
		};
		let endpoints = ApiEndpoints {
			authorize: self
				.authorize
				.unwrap_or_else(|| parse("https://www.reddit.com/api/v1/authorize")),
			token: self.token.unwrap_or_else(|| parse("https://www.reddit.com/api/v1/access_token")),
			api_base: self.api_base.unwrap_or_else(|| parse("https://oauth.reddit.com/")),
		};

		require_secure("authorize", &endpoints.authorize)?;
		require_secure("token", &endpoints.token)?;
		require_secure("api_base", &endpoints.api_base)?;

		Ok(EngineConfig {
			client_id: self.client_id,
			redirect_uri,
			scopes: if self.scopes.is_empty() {
				["identity", "history", "edit", "read"].map(String::from).to_vec()
			} else {
				self.scopes
			},
			endpoints,
			identity: self.identity,
			refresh_skew: self.refresh_skew,
			page_limit: self.page_limit,
			max_items: self.max_items,
			scrub_placeholder: self.scrub_placeholder,
		})
	}
}

// Loopback hosts are exempt so local mock servers can run plain HTTP.
fn require_secure(endpoint: &'static str, url: &Url) -> Result<(), ConfigError> {
	if url.scheme() == "https" {
		return Ok(());
	}

	let loopback = matches!(url.host_str(), Some("localhost" | "127.0.0.1" | "[::1]"));

	if url.scheme() == "http" && loopback {
		Ok(())
	} else {
		Err(ConfigError::InsecureEndpoint { endpoint, url: url.clone() })
	}
}
