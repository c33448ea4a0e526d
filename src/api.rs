//! Wire models for the provider's token, identity, listing, and mutation endpoints.

// self
use crate::_prelude::*;

/// Token endpoint response for both the authorization-code and refresh grants.
///
/// Refresh responses may omit `refresh_token`; the session layer keeps the prior
/// rotation secret in that case.
#[derive(Clone, Debug, Deserialize)]
pub struct TokenSet {
	/// Bearer token for authorized calls.
	pub access_token: String,
	/// Rotation secret, when the provider issued (or re-issued) one.
	#[serde(default)]
	pub refresh_token: Option<String>,
	/// Lifetime of the access token in seconds.
	pub expires_in: i64,
	/// Token type label (always `bearer` for this protocol).
	#[serde(default)]
	pub token_type: Option<String>,
	/// Space-delimited scopes actually granted.
	#[serde(default)]
	pub scope: Option<String>,
}

/// Identity endpoint response used once post-login to bind the username.
#[derive(Clone, Debug, Deserialize)]
pub struct Identity {
	/// Account name (without the `/u/` prefix).
	pub name: String,
	/// Opaque account identifier.
	pub id: String,
}

/// Envelope every listing endpoint wraps its page in.
#[derive(Clone, Debug, Deserialize)]
pub struct Listing<T> {
	/// Page payload.
	pub data: ListingData<T>,
}

/// One page of a cursor-based listing.
#[derive(Clone, Debug, Deserialize)]
pub struct ListingData<T> {
	/// Cursor for the next page; absent or empty on the final page.
	#[serde(default)]
	pub after: Option<String>,
	/// Items in API return order.
	pub children: Vec<ListingChild<T>>,
}

/// Typed wrapper around each listed item.
#[derive(Clone, Debug, Deserialize)]
pub struct ListingChild<T> {
	/// Type prefix tag (e.g. `t1`, `t3`).
	#[serde(default)]
	pub kind: String,
	/// Item payload.
	pub data: T,
}

/// Comment fields consumed by the engine.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct CommentData {
	/// Short identifier without the type prefix.
	pub id: String,
	/// Fullname, e.g. `t1_abcdef`; the item's globally unique identity.
	pub name: String,
	/// Comment body markdown.
	pub body: String,
	/// Net vote score.
	pub score: i64,
	/// Creation instant as a UTC epoch-second float.
	pub created_utc: f64,
	/// Subreddit the comment was posted in.
	pub subreddit: String,
	/// Title of the submission the comment belongs to, when supplied.
	#[serde(default)]
	pub link_title: Option<String>,
}

/// Post (submission) fields consumed by the engine.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct PostData {
	/// Short identifier without the type prefix.
	pub id: String,
	/// Fullname, e.g. `t3_abcdef`; the item's globally unique identity.
	pub name: String,
	/// Submission title.
	pub title: String,
	/// Net vote score.
	pub score: i64,
	/// Creation instant as a UTC epoch-second float.
	pub created_utc: f64,
	/// Subreddit the post was submitted to.
	pub subreddit: String,
	/// `true` for self (text) posts, whose body can be scrubbed; `false` for link posts.
	pub is_self: bool,
}

/// Decodes a JSON body, reporting the failing path on malformed payloads.
pub fn decode<T>(body: &[u8], status: u16) -> Result<T>
where
	T: for<'de> Deserialize<'de>,
{
	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| Error::ResponseParse { source, status })
}
