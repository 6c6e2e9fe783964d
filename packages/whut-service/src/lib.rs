pub mod command;
pub mod preferences;
pub mod providers;
pub mod retrieval;
pub mod sent;

mod error;

pub use command::{Command, GimmeRequest, PrefsCommand, ProviderKind};
pub use error::{Error, Result};
pub use preferences::PreferenceStore;
pub use providers::{HttpFetcher, TagSearchProvider, TokenSearchProvider};
pub use retrieval::{GimmeOutcome, MoreOutcome, Retriever};
pub use sent::{PgSentLog, SentCache};
pub use whut_providers::SearchResult;

use std::{future::Future, pin::Pin, sync::Arc};

use time::OffsetDateTime;

use whut_config::Config;
use whut_providers::{media::MediaClient, redgifs::RedgifsClient, rule34::Rule34Client};
use whut_storage::db::Db;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub const WORKING_REACTION: &str = "👀";

/// A search backend. Implementations expose exactly query building and search.
pub trait MediaProvider
where
	Self: Send + Sync,
{
	fn build_query<'a>(&'a self, tags: &'a [String], user_id: i64) -> BoxFuture<'a, Result<String>>;

	fn search<'a>(&'a self, terms: &'a [String]) -> BoxFuture<'a, Result<Vec<SearchResult>>>;
}

pub trait MediaFetcher
where
	Self: Send + Sync,
{
	fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>>>;
}

/// Append-only record of delivered urls.
pub trait SentLog
where
	Self: Send + Sync,
{
	/// Most recent `limit` urls, newest first.
	fn recent_urls(&self, limit: u32) -> BoxFuture<'_, Result<Vec<String>>>;

	fn append<'a>(&'a self, url: &'a str, ts: i64) -> BoxFuture<'a, Result<()>>;
}

/// Chat platform primitives the command handlers rely on.
pub trait Transport
where
	Self: Send + Sync,
{
	fn send_text<'a>(&'a self, channel_id: u64, text: &'a str) -> BoxFuture<'a, Result<()>>;

	/// Fails with [`Error::EntityTooLarge`] when the platform rejects the payload size.
	fn send_file<'a>(
		&'a self,
		channel_id: u64,
		name: &'a str,
		bytes: Vec<u8>,
	) -> BoxFuture<'a, Result<()>>;

	fn add_reaction<'a>(
		&'a self,
		channel_id: u64,
		message_id: u64,
		emoji: &'a str,
	) -> BoxFuture<'a, Result<()>>;

	fn remove_reaction<'a>(
		&'a self,
		channel_id: u64,
		message_id: u64,
		emoji: &'a str,
	) -> BoxFuture<'a, Result<()>>;

	/// Up to `count` messages strictly older than `before`, newest first.
	fn fetch_recent_messages(
		&self,
		channel_id: u64,
		count: u32,
		before: Option<u64>,
	) -> BoxFuture<'_, Result<Vec<ChatMessage>>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
	pub id: u64,
	pub channel_id: u64,
	pub author_id: u64,
	pub author_is_bot: bool,
	pub content: String,
}

#[derive(Clone)]
pub struct Providers {
	pub tags: Arc<dyn MediaProvider>,
	pub gifs: Arc<dyn MediaProvider>,
}
impl Providers {
	pub fn new(tags: Arc<dyn MediaProvider>, gifs: Arc<dyn MediaProvider>) -> Self {
		Self { tags, gifs }
	}

	pub fn select(&self, kind: ProviderKind) -> &dyn MediaProvider {
		match kind {
			ProviderKind::Tags => self.tags.as_ref(),
			ProviderKind::Gifs => self.gifs.as_ref(),
		}
	}
}

pub struct WhutService {
	pub media_channel_id: u64,
	pub preferences: PreferenceStore,
	pub retriever: Retriever,
}
impl WhutService {
	pub fn new(cfg: &Config, db: Db) -> Result<Self> {
		let preferences = PreferenceStore::new(db.clone());
		let tags = TagSearchProvider::new(Rule34Client::new(&cfg.providers.rule34)?, preferences.clone());
		let gifs = TokenSearchProvider::new(RedgifsClient::new(&cfg.providers.redgifs)?);
		let fetcher = HttpFetcher::new(MediaClient::new(cfg.retrieval.fetch_timeout_ms)?);
		let sent = SentCache::new(Arc::new(PgSentLog::new(db)), cfg.retrieval.sent_window);
		let retriever = Retriever::new(
			Providers::new(Arc::new(tags), Arc::new(gifs)),
			sent,
			Arc::new(fetcher),
			&cfg.retrieval,
		);

		Ok(Self::with_parts(cfg.discord.media_channel_id, preferences, retriever))
	}

	pub fn with_parts(media_channel_id: u64, preferences: PreferenceStore, retriever: Retriever) -> Self {
		Self { media_channel_id, preferences, retriever }
	}

	/// Handles one inbound message. Returns `false` when the message was not addressed to the bot.
	pub async fn handle_message(&self, transport: &dyn Transport, message: &ChatMessage) -> bool {
		if message.author_is_bot || message.channel_id != self.media_channel_id {
			return false;
		}

		let Some(command) = Command::parse(&message.content) else {
			return false;
		};
		let channel_id = message.channel_id;
		let result = match command {
			Command::Gimme(request) => self.gimme(transport, message, &request).await,
			Command::Prefs(prefs) => self.prefs(transport, message, prefs).await,
			Command::More => self.more(transport, message).await,
			Command::Unknown(token) => {
				tracing::debug!(token = %token, "Ignoring unknown command.");

				transport.send_text(channel_id, "Unknown command.").await
			},
		};

		if let Err(err) = result {
			tracing::warn!(error = %err, message_id = message.id, "Command failed.");

			if let Err(err) = transport.send_text(channel_id, &notice_for(&err)).await {
				tracing::error!(error = %err, "Failed to report command failure.");
			}
		}

		true
	}

	async fn gimme(
		&self,
		transport: &dyn Transport,
		message: &ChatMessage,
		request: &GimmeRequest,
	) -> Result<()> {
		let user_id = user_id(message.author_id)?;

		react(transport, message, true).await;

		let outcome = self.retriever.gimme(transport, message.channel_id, request, user_id).await;

		react(transport, message, false).await;

		tracing::info!(?outcome, "Gimme handled.");

		outcome.map(|_| ())
	}

	async fn more(&self, transport: &dyn Transport, message: &ChatMessage) -> Result<()> {
		let user_id = user_id(message.author_id)?;

		react(transport, message, true).await;

		let outcome = self.retriever.more(transport, message.channel_id, message.id, user_id).await;

		react(transport, message, false).await;

		if let MoreOutcome::NothingFound = outcome? {
			transport.send_text(message.channel_id, "Nothing found to repeat.").await?;
		}

		Ok(())
	}

	async fn prefs(
		&self,
		transport: &dyn Transport,
		message: &ChatMessage,
		command: PrefsCommand,
	) -> Result<()> {
		let user_id = user_id(message.author_id)?;
		let reply = match command {
			PrefsCommand::List => {
				let prefs = self.preferences.get(user_id).await?;

				if prefs.is_empty() {
					"You have no preferences.".to_string()
				} else {
					format!("Your preferences: {}", prefs.join(" "))
				}
			},
			PrefsCommand::Set(terms) => {
				self.preferences.set(user_id, &terms).await?;

				format!("Preferences set to: {}", terms.join(" "))
			},
			PrefsCommand::Add(terms) => {
				self.preferences.add(user_id, &terms).await?;

				format!("Added preferences: {}", terms.join(" "))
			},
			PrefsCommand::Remove(terms) => {
				self.preferences.remove(user_id, &terms).await?;

				format!("Removed preferences: {}", terms.join(" "))
			},
			PrefsCommand::Usage => PrefsCommand::USAGE.to_string(),
		};

		transport.send_text(message.channel_id, &reply).await
	}
}

/// User-visible notice for a failed command.
pub fn notice_for(err: &Error) -> String {
	match err {
		Error::Transport { message } => format!("Request failed: {message}"),
		Error::Decode { message } => format!("Got a response I could not read: {message}"),
		Error::Auth { message } => format!("Could not authenticate with the provider: {message}"),
		Error::NotFound { message } => format!("Not found: {message}"),
		Error::Persistence { .. } => "Storage is unavailable right now.".to_string(),
		Error::EntityTooLarge => "That file is too large to upload.".to_string(),
		Error::InvalidRequest { message } => format!("Invalid request: {message}"),
	}
}

pub fn now_millis() -> i64 {
	(OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

fn user_id(author_id: u64) -> Result<i64> {
	i64::try_from(author_id).map_err(|_| Error::InvalidRequest {
		message: format!("User id {author_id} is out of range."),
	})
}

async fn react(transport: &dyn Transport, message: &ChatMessage, add: bool) {
	let result = if add {
		transport.add_reaction(message.channel_id, message.id, WORKING_REACTION).await
	} else {
		transport.remove_reaction(message.channel_id, message.id, WORKING_REACTION).await
	};

	if let Err(err) = result {
		tracing::debug!(error = %err, message_id = message.id, "Reaction update failed.");
	}
}
