use std::sync::{
	Arc,
	atomic::{AtomicBool, Ordering},
};

use serenity::{
	all::{
		ChannelId, Client, Context, CreateAttachment, CreateMessage, EventHandler, GatewayIntents,
		GetMessages, Http, Message, MessageId, ReactionType, Ready,
	},
	http::HttpError,
};
use tokio::signal::{
	self,
	unix::{self, SignalKind},
};

use whut_service::{BoxFuture, ChatMessage, Error, Result, Transport, WhutService};

/// Discord rejects uploads over the attachment limit with this JSON error code.
const REQUEST_ENTITY_TOO_LARGE: isize = 40_005;
const MAX_HISTORY_PAGE: u32 = 100;

pub async fn serve(cfg: &whut_config::Discord, service: Arc<WhutService>) -> color_eyre::Result<()> {
	let intents = GatewayIntents::GUILD_MESSAGES
		| GatewayIntents::DIRECT_MESSAGES
		| GatewayIntents::MESSAGE_CONTENT;
	let handler =
		Handler { service, log_channel_id: cfg.log_channel_id, announced: AtomicBool::new(false) };
	let mut client = Client::builder(&cfg.token, intents).event_handler(handler).await?;
	let shard_manager = client.shard_manager.clone();
	let http = client.http.clone();

	tokio::select! {
		result = client.start() => result?,
		stop = shutdown_signal() => {
			let signal = stop?;

			tracing::info!(signal, "Shutdown requested.");

			if let Some(channel_id) = cfg.log_channel_id {
				announce(&http, channel_id, "is shutting down").await;
			}

			shard_manager.shutdown_all().await;
		}
	}

	Ok(())
}

/// Resolves on Ctrl-C or SIGTERM, whichever arrives first.
async fn shutdown_signal() -> std::io::Result<&'static str> {
	let mut terminate = unix::signal(SignalKind::terminate())?;

	tokio::select! {
		result = signal::ctrl_c() => result.map(|()| "SIGINT"),
		_ = terminate.recv() => Ok("SIGTERM"),
	}
}

struct Handler {
	service: Arc<WhutService>,
	log_channel_id: Option<u64>,
	announced: AtomicBool,
}
#[serenity::async_trait]
impl EventHandler for Handler {
	async fn ready(&self, ctx: Context, ready: Ready) {
		tracing::info!(user = %ready.user.name, "Connected to gateway.");

		// READY fires again after reconnects; announce once per process.
		if self.announced.swap(true, Ordering::SeqCst) {
			return;
		}
		if let Some(channel_id) = self.log_channel_id {
			announce(&ctx.http, channel_id, "is now running").await;
		}
	}

	async fn message(&self, ctx: Context, msg: Message) {
		let transport = DiscordTransport::new(ctx.http.clone());
		let message = chat_message(&msg);

		if self.service.handle_message(&transport, &message).await {
			tracing::debug!(message_id = message.id, "Command handled.");
		}
	}
}

/// [`Transport`] over the Discord REST API.
pub struct DiscordTransport {
	http: Arc<Http>,
}
impl DiscordTransport {
	pub fn new(http: Arc<Http>) -> Self {
		Self { http }
	}

	async fn send_text_inner(&self, channel_id: u64, text: &str) -> Result<()> {
		ChannelId::new(channel_id).say(&*self.http, text).await.map_err(transport_error)?;

		Ok(())
	}

	async fn send_file_inner(&self, channel_id: u64, name: &str, bytes: Vec<u8>) -> Result<()> {
		let message = CreateMessage::new().add_file(CreateAttachment::bytes(bytes, name));

		ChannelId::new(channel_id)
			.send_message(&*self.http, message)
			.await
			.map_err(transport_error)?;

		Ok(())
	}

	async fn react_inner(&self, channel_id: u64, message_id: u64, emoji: &str, add: bool) -> Result<()> {
		let channel = ChannelId::new(channel_id);
		let message_id = MessageId::new(message_id);
		let reaction = ReactionType::Unicode(emoji.to_string());
		let result = if add {
			channel.create_reaction(&*self.http, message_id, reaction).await
		} else {
			channel.delete_reaction(&*self.http, message_id, None, reaction).await
		};

		result.map_err(transport_error)
	}

	async fn history_inner(
		&self,
		channel_id: u64,
		count: u32,
		before: Option<u64>,
	) -> Result<Vec<ChatMessage>> {
		let limit = u8::try_from(count.clamp(1, MAX_HISTORY_PAGE)).unwrap_or(u8::MAX);
		let mut query = GetMessages::new().limit(limit);

		if let Some(before) = before {
			query = query.before(MessageId::new(before));
		}

		let messages =
			ChannelId::new(channel_id).messages(&*self.http, query).await.map_err(transport_error)?;

		Ok(messages.iter().map(chat_message).collect())
	}
}
impl Transport for DiscordTransport {
	fn send_text<'a>(&'a self, channel_id: u64, text: &'a str) -> BoxFuture<'a, Result<()>> {
		Box::pin(self.send_text_inner(channel_id, text))
	}

	fn send_file<'a>(
		&'a self,
		channel_id: u64,
		name: &'a str,
		bytes: Vec<u8>,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(self.send_file_inner(channel_id, name, bytes))
	}

	fn add_reaction<'a>(
		&'a self,
		channel_id: u64,
		message_id: u64,
		emoji: &'a str,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(self.react_inner(channel_id, message_id, emoji, true))
	}

	fn remove_reaction<'a>(
		&'a self,
		channel_id: u64,
		message_id: u64,
		emoji: &'a str,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(self.react_inner(channel_id, message_id, emoji, false))
	}

	fn fetch_recent_messages(
		&self,
		channel_id: u64,
		count: u32,
		before: Option<u64>,
	) -> BoxFuture<'_, Result<Vec<ChatMessage>>> {
		Box::pin(self.history_inner(channel_id, count, before))
	}
}

fn chat_message(msg: &Message) -> ChatMessage {
	ChatMessage {
		id: msg.id.get(),
		channel_id: msg.channel_id.get(),
		author_id: msg.author.id.get(),
		author_is_bot: msg.author.bot,
		content: msg.content.clone(),
	}
}

async fn announce(http: &Http, channel_id: u64, what: &str) {
	let text = format!("whut-bot {} {what}.", whut_cli::VERSION);

	if let Err(err) = ChannelId::new(channel_id).say(http, text).await {
		tracing::warn!(error = %err, channel_id, "Failed to post lifecycle notice.");
	}
}

fn transport_error(err: serenity::Error) -> Error {
	if is_entity_too_large(&err) {
		return Error::EntityTooLarge;
	}

	Error::Transport { message: err.to_string() }
}

fn is_entity_too_large(err: &serenity::Error) -> bool {
	if let serenity::Error::Http(HttpError::UnsuccessfulRequest(res)) = err
		&& (res.status_code.as_u16() == 413 || res.error.code == REQUEST_ENTITY_TOO_LARGE)
	{
		return true;
	}

	err.to_string().to_lowercase().contains("entity too large")
}

#[cfg(test)]
mod tests {
	use std::{process::Command, time::Duration};

	use super::*;

	#[tokio::test]
	async fn terminate_signal_requests_shutdown() {
		let pending = tokio::spawn(shutdown_signal());

		// Give the spawned task time to install the SIGTERM handler.
		tokio::time::sleep(Duration::from_millis(100)).await;

		let status = Command::new("kill")
			.args(["-TERM", &std::process::id().to_string()])
			.status()
			.expect("Failed to run kill.");

		assert!(status.success());

		let signal = tokio::time::timeout(Duration::from_secs(5), pending)
			.await
			.expect("Shutdown signal timed out.")
			.expect("Signal task panicked.")
			.expect("Signal listener failed.");

		assert_eq!(signal, "SIGTERM");
	}

	#[test]
	fn entity_too_large_falls_back_to_message_text() {
		assert!(matches!(
			transport_error(serenity::Error::Other("Request Entity Too Large")),
			Error::EntityTooLarge
		));
		assert!(matches!(
			transport_error(serenity::Error::Other("Unknown Channel")),
			Error::Transport { .. }
		));
	}
}
