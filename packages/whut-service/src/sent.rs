//! Sent-item deduplication.
//!
//! [`SentCache`] answers "was this url delivered recently" from an in-memory view of the most
//! recent `window` sends. The view is loaded lazily and dropped on every successful mark, and both
//! paths hold the same async mutex, so a lookup can never repopulate the view with rows read
//! before a concurrent mark committed.

use std::{collections::HashSet, sync::Arc};

use tokio::sync::Mutex;

use whut_storage::{db::Db, sent as queries};

use crate::{BoxFuture, Result, SentLog};

pub struct SentCache {
	log: Arc<dyn SentLog>,
	window: u32,
	view: Mutex<Option<HashSet<String>>>,
}
impl SentCache {
	pub fn new(log: Arc<dyn SentLog>, window: u32) -> Self {
		Self { log, window, view: Mutex::new(None) }
	}

	pub async fn has_been_sent(&self, url: &str) -> Result<bool> {
		let mut view = self.view.lock().await;

		if view.is_none() {
			let urls = self.log.recent_urls(self.window).await?;

			tracing::debug!(count = urls.len(), window = self.window, "Sent view loaded.");

			*view = Some(urls.into_iter().collect());
		}

		Ok(view.as_ref().is_some_and(|urls| urls.contains(url)))
	}

	pub async fn mark_as_sent(&self, url: &str) -> Result<()> {
		let mut view = self.view.lock().await;

		self.log.append(url, crate::now_millis()).await?;

		*view = None;

		Ok(())
	}
}

/// [`SentLog`] over the `sent_items` table.
pub struct PgSentLog {
	db: Db,
}
impl PgSentLog {
	pub fn new(db: Db) -> Self {
		Self { db }
	}

	async fn append_inner(&self, url: &str, ts: i64) -> Result<()> {
		let mut tx = self.db.pool.begin().await?;

		queries::insert_sent_item(&mut *tx, url, ts).await?;

		tx.commit().await?;

		Ok(())
	}

	async fn recent_inner(&self, limit: u32) -> Result<Vec<String>> {
		Ok(queries::recent_sent_urls(&self.db.pool, i64::from(limit)).await?)
	}
}
impl SentLog for PgSentLog {
	fn recent_urls(&self, limit: u32) -> BoxFuture<'_, Result<Vec<String>>> {
		Box::pin(self.recent_inner(limit))
	}

	fn append<'a>(&'a self, url: &'a str, ts: i64) -> BoxFuture<'a, Result<()>> {
		Box::pin(self.append_inner(url, ts))
	}
}
