use std::sync::Arc;

use crate::{
	Command, Error, GimmeRequest, MediaFetcher, Providers, Result, SearchResult, SentCache,
	Transport,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GimmeOutcome {
	NoResults { query: String },
	/// `fresh` is false when every result had already been sent and the first one was repeated.
	Delivered { name: String, url: String, fresh: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoreOutcome {
	NothingFound,
	Repeated(GimmeOutcome),
}

/// Runs searches end to end: query building, search, dedup, download, relay, mark.
pub struct Retriever {
	providers: Providers,
	sent: SentCache,
	fetcher: Arc<dyn MediaFetcher>,
	history_page_size: u32,
	more_scan_depth: u32,
}
impl Retriever {
	pub fn new(
		providers: Providers,
		sent: SentCache,
		fetcher: Arc<dyn MediaFetcher>,
		cfg: &whut_config::Retrieval,
	) -> Self {
		Self {
			providers,
			sent,
			fetcher,
			history_page_size: cfg.history_page_size,
			more_scan_depth: cfg.more_scan_depth,
		}
	}

	pub fn sent(&self) -> &SentCache {
		&self.sent
	}

	pub async fn gimme(
		&self,
		transport: &dyn Transport,
		channel_id: u64,
		request: &GimmeRequest,
		user_id: i64,
	) -> Result<GimmeOutcome> {
		let provider = self.providers.select(request.kind);
		let query = provider.build_query(&request.tags, user_id).await?;

		transport.send_text(channel_id, &format!("Searching for: {query}")).await?;

		let terms = query.split_whitespace().map(str::to_string).collect::<Vec<_>>();
		let results = provider.search(&terms).await?;

		if results.is_empty() {
			transport.send_text(channel_id, "No results found.").await?;

			return Ok(GimmeOutcome::NoResults { query });
		}

		let (chosen, fresh) = self.pick_unsent(&results).await?;

		if !fresh {
			transport.send_text(channel_id, "Nothing new for that search, sending a repeat.").await?;
		}

		let bytes = self.fetcher.fetch(&chosen.url).await?;

		transport.send_file(channel_id, &chosen.name, bytes).await?;
		// Repeats are marked again, which moves them to the front of the window.
		self.sent.mark_as_sent(&chosen.url).await?;

		tracing::info!(kind = ?request.kind, url = %chosen.url, fresh, "Result delivered.");

		Ok(GimmeOutcome::Delivered { name: chosen.name.clone(), url: chosen.url.clone(), fresh })
	}

	/// First result not sent within the window, or the first result when all were.
	pub async fn pick_unsent<'r>(
		&self,
		results: &'r [SearchResult],
	) -> Result<(&'r SearchResult, bool)> {
		for result in results {
			if !self.sent.has_been_sent(&result.url).await? {
				return Ok((result, true));
			}
		}

		let first = results
			.first()
			.ok_or_else(|| Error::NotFound { message: "search results".to_string() })?;

		Ok((first, false))
	}

	/// Repeats the most recent earlier gimme in the channel for `user_id`.
	pub async fn more(
		&self,
		transport: &dyn Transport,
		channel_id: u64,
		before_id: u64,
		user_id: i64,
	) -> Result<MoreOutcome> {
		let Some(request) = self.find_previous_gimme(transport, channel_id, before_id).await? else {
			return Ok(MoreOutcome::NothingFound);
		};
		let outcome = self.gimme(transport, channel_id, &request, user_id).await?;

		Ok(MoreOutcome::Repeated(outcome))
	}

	/// Scans at most `more_scan_depth` history pages older than `before_id`, newest first,
	/// skipping bot-authored messages.
	pub async fn find_previous_gimme(
		&self,
		transport: &dyn Transport,
		channel_id: u64,
		before_id: u64,
	) -> Result<Option<GimmeRequest>> {
		let mut before = before_id;

		for depth in 1..=self.more_scan_depth {
			let mut page = transport
				.fetch_recent_messages(channel_id, self.history_page_size, Some(before))
				.await?;

			page.retain(|message| message.id < before);
			page.sort_by(|a, b| b.id.cmp(&a.id));

			for message in page.iter().filter(|message| !message.author_is_bot) {
				if let Some(Command::Gimme(request)) = Command::parse(&message.content) {
					tracing::debug!(depth, message_id = message.id, "Found earlier gimme.");

					return Ok(Some(request));
				}
			}

			let Some(oldest) = page.last() else {
				break;
			};

			before = oldest.id;
		}

		Ok(None)
	}
}
