//! PKCE handshake material: verifier/challenge/state generation and the authorize URL.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, auth::secret::TokenSecret, config::EngineConfig};

// 64 random octets encode to an 86-character verifier, inside RFC 7636's 43..=128 window.
const VERIFIER_ENTROPY_BYTES: usize = 64;
const STATE_ENTROPY_BYTES: usize = 16;

/// Supported PKCE challenge methods surfaced via [`AuthorizationAttempt`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PkceCodeChallengeMethod {
	/// SHA-256 based PKCE (RFC 7636 S256).
	S256,
}
impl PkceCodeChallengeMethod {
	/// Returns the RFC 7636 identifier for the challenge method.
	pub fn as_str(self) -> &'static str {
		match self {
			PkceCodeChallengeMethod::S256 => "S256",
		}
	}
}

/// Single-use authorization handshake returned by [`Engine::begin_authorization`].
///
/// The attempt is a plain value owned by whichever component drives the login flow;
/// it is consumed by [`Engine::complete_authorization`] and cannot be replayed. At
/// most one attempt should be kept live at a time; beginning a new authorization
/// supersedes (and should drop) any prior attempt.
///
/// [`Engine::begin_authorization`]: crate::flows::Engine::begin_authorization
/// [`Engine::complete_authorization`]: crate::flows::Engine::complete_authorization
#[derive(Clone)]
pub struct AuthorizationAttempt {
	/// Opaque state value that must round-trip via the redirect handler.
	pub state: String,
	/// Fully-formed authorize URL that callers should send the end user to.
	pub authorize_url: Url,
	pkce: PkcePair,
}
impl AuthorizationAttempt {
	pub(crate) fn generate(config: &EngineConfig) -> Self {
		let state = random_urlsafe(STATE_ENTROPY_BYTES);
		let pkce = PkcePair::generate();
		let authorize_url = build_authorize_url(config, &state, &pkce);

		Self { state, authorize_url, pkce }
	}

	/// PKCE code challenge derived from the secret verifier.
	pub fn code_challenge(&self) -> &str {
		&self.pkce.challenge
	}

	/// PKCE challenge method (currently always `S256`).
	pub fn code_challenge_method(&self) -> PkceCodeChallengeMethod {
		self.pkce.method
	}

	/// Validates the returned `state` parameter after the authorization redirect.
	pub fn validate_state(&self, returned_state: &str) -> Result<()> {
		if returned_state == self.state { Ok(()) } else { Err(Error::StateMismatch) }
	}

	pub(crate) fn into_verifier(self) -> TokenSecret {
		self.pkce.verifier
	}
}
impl Debug for AuthorizationAttempt {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizationAttempt")
			.field("state", &self.state)
			.field("authorize_url", &self.authorize_url)
			.field("code_challenge", &self.pkce.challenge)
			.field("code_challenge_method", &self.pkce.method)
			.finish()
	}
}

#[derive(Clone)]
struct PkcePair {
	verifier: TokenSecret,
	challenge: String,
	method: PkceCodeChallengeMethod,
}
impl PkcePair {
	fn generate() -> Self {
		let verifier = random_urlsafe(VERIFIER_ENTROPY_BYTES);
		let challenge = compute_code_challenge(&verifier);

		Self { verifier: TokenSecret::new(verifier), challenge, method: PkceCodeChallengeMethod::S256 }
	}
}

fn build_authorize_url(config: &EngineConfig, state: &str, pkce: &PkcePair) -> Url {
	let mut url = config.endpoints.authorize.clone();

	{
		let mut pairs = url.query_pairs_mut();

		pairs.append_pair("client_id", &config.client_id);
		pairs.append_pair("response_type", "code");
		pairs.append_pair("state", state);
		pairs.append_pair("redirect_uri", config.redirect_uri.as_str());
		pairs.append_pair("duration", "permanent");
		pairs.append_pair("scope", &config.scopes.join(" "));
		pairs.append_pair("code_challenge", &pkce.challenge);
		pairs.append_pair("code_challenge_method", pkce.method.as_str());
	}

	url
}

fn random_urlsafe(entropy_bytes: usize) -> String {
	let mut bytes = vec![0_u8; entropy_bytes];

	rand::rng().fill_bytes(&mut bytes);

	URL_SAFE_NO_PAD.encode(bytes)
}

/// Derives the S256 code challenge (base64url, unpadded) for a verifier.
pub fn compute_code_challenge(verifier: &str) -> String {
	let mut hasher = Sha256::new();

	hasher.update(verifier.as_bytes());

	URL_SAFE_NO_PAD.encode(hasher.finalize())
}
