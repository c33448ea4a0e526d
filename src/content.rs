//! In-memory content model: comment/post variants, the working collection, and
//! selection operations.
//!
//! [`ContentItem`] is a closed set of variants with shared-field accessors via
//! exhaustive matching; behavior that differs per variant (scrub eligibility,
//! display text) lives here and nowhere else. The presentation layer may read
//! items and toggle `selected`; every other mutation belongs to the flows.

// self
use crate::{
	_prelude::*,
	api::{CommentData, PostData},
};

/// The two kinds of user content the engine manages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContentKind {
	/// Comments (`t1_*` fullnames).
	Comment,
	/// Posts / submissions (`t3_*` fullnames).
	Post,
}
impl ContentKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ContentKind::Comment => "comment",
			ContentKind::Post => "post",
		}
	}
}
impl Display for ContentKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// A single piece of user content plus its selection flag.
#[derive(Clone, Debug, PartialEq)]
pub enum ContentItem {
	/// A comment.
	Comment {
		/// Wire payload.
		data: CommentData,
		/// Marked for the next purge run.
		selected: bool,
	},
	/// A post (self or link).
	Post {
		/// Wire payload.
		data: PostData,
		/// Marked for the next purge run.
		selected: bool,
	},
}
impl ContentItem {
	/// Wraps a comment payload, initially unselected.
	pub fn comment(data: CommentData) -> Self {
		Self::Comment { data, selected: false }
	}

	/// Wraps a post payload, initially unselected.
	pub fn post(data: PostData) -> Self {
		Self::Post { data, selected: false }
	}

	/// Which variant this item is.
	pub fn kind(&self) -> ContentKind {
		match self {
			Self::Comment { .. } => ContentKind::Comment,
			Self::Post { .. } => ContentKind::Post,
		}
	}

	/// Opaque globally unique identity (type prefix + id).
	pub fn fullname(&self) -> &str {
		match self {
			Self::Comment { data, .. } => &data.name,
			Self::Post { data, .. } => &data.name,
		}
	}

	/// Subreddit the item belongs to.
	pub fn subreddit(&self) -> &str {
		match self {
			Self::Comment { data, .. } => &data.subreddit,
			Self::Post { data, .. } => &data.subreddit,
		}
	}

	/// Net vote score.
	pub fn score(&self) -> i64 {
		match self {
			Self::Comment { data, .. } => data.score,
			Self::Post { data, .. } => data.score,
		}
	}

	/// Creation instant as UTC epoch seconds.
	pub fn created_utc(&self) -> f64 {
		match self {
			Self::Comment { data, .. } => data.created_utc,
			Self::Post { data, .. } => data.created_utc,
		}
	}

	/// Body for comments, title for posts.
	pub fn body_or_title(&self) -> &str {
		match self {
			Self::Comment { data, .. } => &data.body,
			Self::Post { data, .. } => &data.title,
		}
	}

	/// Whether the scrub step applies: comments and self posts only. Link posts
	/// have no editable body.
	pub fn is_scrubbable(&self) -> bool {
		match self {
			Self::Comment { .. } => true,
			Self::Post { data, .. } => data.is_self,
		}
	}

	/// Selection flag, the only field the presentation layer may toggle.
	pub fn selected(&self) -> bool {
		match self {
			Self::Comment { selected, .. } | Self::Post { selected, .. } => *selected,
		}
	}

	/// Sets the selection flag.
	pub fn set_selected(&mut self, value: bool) {
		match self {
			Self::Comment { selected, .. } | Self::Post { selected, .. } => *selected = value,
		}
	}

	/// Whole days elapsed between creation and `now`.
	pub fn age_days_at(&self, now: OffsetDateTime) -> i64 {
		let elapsed = now.unix_timestamp() - self.created_utc() as i64;

		elapsed.max(0) / 86_400
	}

	/// Whole days elapsed between creation and the current clock.
	pub fn age_days(&self) -> i64 {
		self.age_days_at(OffsetDateTime::now_utc())
	}
}

/// Score/age predicate for [`ItemCollection::select_matching`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectionFilter {
	/// Upper bound (inclusive) on the item score.
	pub max_score: i64,
	/// Lower bound (inclusive) on the item age in whole days.
	pub min_age_days: i64,
}
impl SelectionFilter {
	fn matches(&self, item: &ContentItem, now: OffsetDateTime) -> bool {
		item.score() <= self.max_score && item.age_days_at(now) >= self.min_age_days
	}
}

/// The working set of a session: comments and posts in API return order.
///
/// Replaced wholesale by `load_all`; thinned item-by-item as purge deletes
/// succeed, so a cancelled run always leaves the collection consistent with what
/// the provider has already deleted.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ItemCollection {
	/// Comments in API return order.
	pub comments: Vec<ContentItem>,
	/// Posts in API return order.
	pub posts: Vec<ContentItem>,
}
impl ItemCollection {
	/// Builds a collection from freshly fetched items.
	pub fn new(comments: Vec<ContentItem>, posts: Vec<ContentItem>) -> Self {
		Self { comments, posts }
	}

	fn of_kind_mut(&mut self, kind: ContentKind) -> &mut Vec<ContentItem> {
		match kind {
			ContentKind::Comment => &mut self.comments,
			ContentKind::Post => &mut self.posts,
		}
	}

	/// Items of one kind, in order.
	pub fn of_kind(&self, kind: ContentKind) -> &[ContentItem] {
		match kind {
			ContentKind::Comment => &self.comments,
			ContentKind::Post => &self.posts,
		}
	}

	/// Sets the selection flag on every item of the provided kind.
	pub fn select_all(&mut self, kind: ContentKind, selected: bool) {
		for item in self.of_kind_mut(kind) {
			item.set_selected(selected);
		}
	}

	/// Selects exactly the items of `kind` with `score <= max_score` and
	/// `age_days >= min_age_days`, deselecting the rest of that kind. The other
	/// kind is untouched.
	pub fn select_matching(&mut self, kind: ContentKind, filter: SelectionFilter) {
		self.select_matching_at(kind, filter, OffsetDateTime::now_utc());
	}

	/// [`Self::select_matching`] evaluated against an explicit instant.
	pub fn select_matching_at(
		&mut self,
		kind: ContentKind,
		filter: SelectionFilter,
		now: OffsetDateTime,
	) {
		for item in self.of_kind_mut(kind) {
			let matched = filter.matches(item, now);

			item.set_selected(matched);
		}
	}

	/// Currently selected items of one kind, cloned in order.
	pub fn selected_of_kind(&self, kind: ContentKind) -> Vec<ContentItem> {
		self.of_kind(kind).iter().filter(|item| item.selected()).cloned().collect()
	}

	/// Iterates every item, comments before posts.
	pub fn iter(&self) -> impl Iterator<Item = &ContentItem> {
		self.comments.iter().chain(&self.posts)
	}

	/// Number of selected items across both kinds.
	pub fn selected_count(&self) -> usize {
		self.iter().filter(|item| item.selected()).count()
	}

	/// Total number of items across both kinds.
	pub fn len(&self) -> usize {
		self.comments.len() + self.posts.len()
	}

	/// Returns `true` when both sequences are empty.
	pub fn is_empty(&self) -> bool {
		self.comments.is_empty() && self.posts.is_empty()
	}

	/// Removes the item carrying `fullname` from whichever sequence holds it.
	pub fn remove(&mut self, fullname: &str) {
		self.comments.retain(|item| item.fullname() != fullname);
		self.posts.retain(|item| item.fullname() != fullname);
	}
}
