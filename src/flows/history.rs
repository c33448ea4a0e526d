//! Full-history pagination over the listing endpoints.
//!
//! Listings are cursor-based: each page carries an `after` fullname that seeds
//! the next request, and an absent or empty cursor terminates the walk. The
//! engine always walks to the end (bounded by [`EngineConfig::max_items`]) so
//! selection filters operate on the complete history rather than the first
//! page.
//!
//! [`EngineConfig::max_items`]: crate::config::EngineConfig::max_items

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	api::{self, CommentData, Listing, PostData},
	content::{ContentItem, ContentKind, ItemCollection},
	flows::Engine,
	http::ApiTransport,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

impl<C> Engine<C>
where
	C: ?Sized + ApiTransport,
{
	/// Loads the account's complete comment and post history into a fresh
	/// working set, comments first.
	///
	/// Holds the exclusive run slot for the duration; a concurrent `load_all` or
	/// `purge` fails fast with [`Error::Busy`]. Requires a bound username, i.e. a
	/// completed authorization.
	pub async fn load_all(&self) -> Result<ItemCollection> {
		const KIND: FlowKind = FlowKind::History;

		let _slot = self.claim_run_slot()?;
		let span = FlowSpan::new(KIND, "load_all");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let username = self.username().await?.ok_or(Error::NotLoggedIn)?;
				let comments = self
					.fetch_pages::<CommentData>(&format!("user/{username}/comments"))
					.await?
					.into_iter()
					.map(ContentItem::comment)
					.collect();
				let posts = self
					.fetch_pages::<PostData>(&format!("user/{username}/submitted"))
					.await?
					.into_iter()
					.map(ContentItem::post)
					.collect();

				Ok(ItemCollection::new(comments, posts))
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Loads the complete history of a single content kind.
	///
	/// Shares the exclusive run slot with [`Self::load_all`] and `purge`; fails
	/// fast with [`Error::Busy`] while another run is outstanding.
	pub async fn fetch_all(&self, kind: ContentKind, username: &str) -> Result<Vec<ContentItem>> {
		let _slot = self.claim_run_slot()?;
		let items = match kind {
			ContentKind::Comment => self
				.fetch_pages::<CommentData>(&format!("user/{username}/comments"))
				.await?
				.into_iter()
				.map(ContentItem::comment)
				.collect(),
			ContentKind::Post => self
				.fetch_pages::<PostData>(&format!("user/{username}/submitted"))
				.await?
				.into_iter()
				.map(ContentItem::post)
				.collect(),
		};

		Ok(items)
	}

	async fn fetch_pages<T>(&self, path: &str) -> Result<Vec<T>>
	where
		T: DeserializeOwned,
	{
		let limit = self.config.page_limit.to_string();
		let mut items = Vec::new();
		let mut cursor: Option<String> = None;

		loop {
			let mut query = vec![("limit", limit.clone())];

			if let Some(after) = &cursor {
				query.push(("after", after.clone()));
			}

			let response = self.authorized_get(path, &query).await?;
			let listing = api::decode::<Listing<T>>(&response.body, response.status)?;

			items.extend(listing.data.children.into_iter().map(|child| child.data));

			if items.len() >= self.config.max_items {
				items.truncate(self.config.max_items);

				break;
			}

			match listing.data.after {
				Some(after) if !after.is_empty() => cursor = Some(after),
				_ => break,
			}
		}

		Ok(items)
	}
}
