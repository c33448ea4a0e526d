//! Engine-level error types shared across flows, the gateway, and stores.

// self
use crate::_prelude::*;

/// Engine-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical engine error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Redirect callback carried a `state` that does not match the pending attempt.
	#[error("Authorization state mismatch; the callback may be forged.")]
	StateMismatch,
	/// Redirect callback carried no authorization code.
	#[error("Authorization callback is missing a code{}.", reason_suffix(.reason.as_deref()))]
	MissingAuthorizationCode {
		/// Upstream `error` query parameter, when the provider reported one.
		reason: Option<String>,
	},
	/// No session is stored; the operation requires a completed login.
	#[error("Not logged in.")]
	NotLoggedIn,
	/// Another listing or purge run is already in flight for this engine.
	#[error("Another operation is already running.")]
	Busy,
	/// Provider rejected the credentials attached to the call (HTTP 401/403-class).
	#[error("Provider rejected the request as unauthorized: {message}.")]
	Unauthorized {
		/// Provider- or engine-supplied reason string.
		message: String,
	},
	/// Provider throttled the call (HTTP 429-class).
	#[error("Provider rate limited the request{}.", retry_after_suffix(.retry_after))]
	RateLimited {
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Provider returned an unexpected non-2xx status outside the classified kinds.
	#[error("Provider returned HTTP {status}: {message}.")]
	Api {
		/// HTTP status code returned by the endpoint.
		status: u16,
		/// Body preview or reason string for diagnostics.
		message: String,
	},
	/// Provider responded with malformed JSON that could not be decoded.
	#[error("Provider returned malformed JSON.")]
	ResponseParse {
		/// Structured parsing failure including the failing path.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code of the malformed response.
		status: u16,
	},
	/// Refresh-token exchange failed; the cached token remains in place.
	#[error("Token refresh failed: {reason}.")]
	RefreshFailed {
		/// Provider- or engine-supplied reason string.
		reason: String,
	},
	/// Best-effort scrub step failed for one item (swallowed by purge runs).
	#[error("Scrub failed for {fullname}.")]
	EditFailed {
		/// Fullname of the item whose body could not be overwritten.
		fullname: String,
		/// Underlying gateway failure.
		#[source]
		source: BoxError,
	},
	/// Delete call failed for one item; the purge run aborts at this point.
	#[error("Delete failed for {fullname} after {completed} items.")]
	DeleteFailed {
		/// Fullname of the item whose delete call failed.
		fullname: String,
		/// Number of items fully processed before the failure.
		completed: usize,
		/// Underlying gateway failure.
		#[source]
		source: BoxError,
	},
}
impl Error {
	/// Wraps a gateway failure as a swallowed scrub error for the provided item.
	pub fn edit_failed(fullname: impl Into<String>, source: Error) -> Self {
		Self::EditFailed { fullname: fullname.into(), source: Box::new(source) }
	}

	/// Wraps a gateway failure as a fatal delete error for the provided item.
	pub fn delete_failed(fullname: impl Into<String>, completed: usize, source: Error) -> Self {
		Self::DeleteFailed { fullname: fullname.into(), completed, source: Box::new(source) }
	}
}

fn reason_suffix(reason: Option<&str>) -> String {
	reason.map(|r| format!(" (provider reported: {r})")).unwrap_or_default()
}

fn retry_after_suffix(retry_after: &Option<Duration>) -> String {
	retry_after.map(|d| format!("; retry after {}s", d.whole_seconds())).unwrap_or_default()
}

/// Configuration and validation failures raised by the engine.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Client identifier is empty.
	#[error("Client identifier must not be empty.")]
	MissingClientId,
	/// Redirect URI was not supplied to the builder.
	#[error("Redirect URI is required.")]
	MissingRedirectUri,
	/// Endpoint URL is not HTTPS (loopback hosts exempt).
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Endpoint label (`authorize`, `token`, `api_base`).
		endpoint: &'static str,
		/// Offending URL.
		url: Url,
	},
	/// API path could not be resolved against the configured base URL.
	#[error("API path could not be resolved against the base URL.")]
	InvalidApiPath {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Listing page limit must be non-zero.
	#[error("Page limit must be greater than zero.")]
	ZeroPageLimit,
	/// Token endpoint returned a non-positive `expires_in`.
	#[error("The expires_in value must be positive.")]
	NonPositiveExpiresIn,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the provider.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the provider.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn terminal_errors_render_human_readable_messages() {
		assert_eq!(
			Error::StateMismatch.to_string(),
			"Authorization state mismatch; the callback may be forged."
		);
		assert_eq!(
			Error::MissingAuthorizationCode { reason: Some("access_denied".into()) }.to_string(),
			"Authorization callback is missing a code (provider reported: access_denied)."
		);
		assert_eq!(
			Error::RateLimited { retry_after: Some(Duration::seconds(30)) }.to_string(),
			"Provider rate limited the request; retry after 30s."
		);
		assert_eq!(
			Error::RateLimited { retry_after: None }.to_string(),
			"Provider rate limited the request."
		);
	}

	#[test]
	fn delete_failed_preserves_progress_and_source() {
		let err = Error::delete_failed(
			"t1_abc",
			1,
			Error::Unauthorized { message: "token expired".into() },
		);

		assert_eq!(err.to_string(), "Delete failed for t1_abc after 1 items.");

		let source = StdError::source(&err).expect("Delete error should expose its source.");

		assert!(source.to_string().contains("token expired"));
	}
}
