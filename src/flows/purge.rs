//! Batch purge: best-effort scrub, then delete, one item at a time.
//!
//! The run walks the selected comments first, then the selected posts. Each
//! scrubbable item gets its body overwritten with the configured placeholder
//! before deletion, pushing the neutral revision into caches and mirrors that
//! snapshot on delete. Scrub failures are swallowed and counted; a delete
//! failure aborts the run immediately with the progress made so far. Every
//! successful delete is reconciled into the working set at once, so a cancelled
//! or aborted run always leaves the collection consistent with the provider.

// self
use crate::{
	_prelude::*,
	content::{ContentItem, ContentKind, ItemCollection},
	flows::Engine,
	http::ApiTransport,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Monotonic progress snapshot emitted after every successful delete.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PurgeProgress {
	/// Items fully processed so far.
	pub done: usize,
	/// Total items selected when the run started.
	pub total: usize,
}

/// Lifecycle events surfaced to the purge observer, in emission order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunEvent {
	/// The run claimed its slot and is about to start.
	Loading,
	/// One more item was deleted.
	Progress(PurgeProgress),
	/// Every selected item was processed.
	Done,
	/// A delete call failed; the run stopped here.
	Failed {
		/// Human-readable failure description.
		message: String,
	},
}

/// Summary returned by a completed purge run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PurgeReport {
	/// Items deleted.
	pub deleted: usize,
	/// Items selected when the run started.
	pub total: usize,
	/// Scrub calls that failed and were skipped over.
	pub scrub_failures: usize,
}

impl<C> Engine<C>
where
	C: ?Sized + ApiTransport,
{
	/// Scrubs and deletes every selected item, comments before posts.
	///
	/// An empty selection returns immediately without emitting events. The
	/// observer receives [`RunEvent::Loading`], a [`RunEvent::Progress`] per
	/// deleted item (starting at zero), and finally [`RunEvent::Done`] or
	/// [`RunEvent::Failed`]. Successfully deleted items are removed from `items`
	/// as the run proceeds, whatever the eventual outcome.
	pub async fn purge(
		&self,
		items: &mut ItemCollection,
		mut observer: impl FnMut(RunEvent),
	) -> Result<PurgeReport> {
		const KIND: FlowKind = FlowKind::Purge;

		let queue: Vec<ContentItem> = items
			.selected_of_kind(ContentKind::Comment)
			.into_iter()
			.chain(items.selected_of_kind(ContentKind::Post))
			.collect();
		let total = queue.len();

		if total == 0 {
			return Ok(PurgeReport::default());
		}

		let _slot = self.claim_run_slot()?;
		let span = FlowSpan::new(KIND, "purge");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async {
				observer(RunEvent::Loading);
				observer(RunEvent::Progress(PurgeProgress { done: 0, total }));

				let mut report = PurgeReport { deleted: 0, total, scrub_failures: 0 };

				for item in &queue {
					let fullname = item.fullname();
					let scrub_result =
						if item.is_scrubbable() { self.scrub(fullname).await } else { Ok(()) };

					if let Err(err) = scrub_result {
						let err = Error::edit_failed(fullname, err);

						obs::warn(&format!("Skipping scrub and proceeding to delete: {err}."));

						report.scrub_failures += 1;
					}
					if let Err(err) = self.delete(fullname).await {
						let err = Error::delete_failed(fullname, report.deleted, err);

						observer(RunEvent::Failed { message: err.to_string() });

						return Err(err);
					}

					// Reconcile immediately; the provider-side delete is done.
					items.remove(fullname);

					report.deleted += 1;

					observer(RunEvent::Progress(PurgeProgress { done: report.deleted, total }));
				}

				observer(RunEvent::Done);

				Ok(report)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn scrub(&self, fullname: &str) -> Result<()> {
		let form = vec![
			("thing_id".to_owned(), fullname.to_owned()),
			("text".to_owned(), self.config.scrub_placeholder.clone()),
		];

		self.authorized_post_form("api/editusertext", form).await.map(|_| ())
	}

	async fn delete(&self, fullname: &str) -> Result<()> {
		let form = vec![("id".to_owned(), fullname.to_owned())];

		self.authorized_post_form("api/del", form).await.map(|_| ())
	}
}
