use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub discord: Discord,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub retrieval: Retrieval,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Discord {
	pub token: String,
	/// Channel whose messages are parsed as commands.
	pub media_channel_id: u64,
	/// Optional. Receives startup and shutdown notices.
	pub log_channel_id: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Providers {
	pub rule34: Rule34,
	pub redgifs: Redgifs,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Rule34 {
	#[serde(default = "default_rule34_api_base")]
	pub api_base: String,
	#[serde(default = "default_rule34_path")]
	pub path: String,
	pub user_id: String,
	pub api_key: String,
	#[serde(default = "default_provider_timeout_ms")]
	pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Redgifs {
	#[serde(default = "default_redgifs_api_base")]
	pub api_base: String,
	#[serde(default = "default_search_count")]
	pub search_count: u32,
	#[serde(default = "default_provider_timeout_ms")]
	pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Retrieval {
	/// How many of the most recent sends are considered when deduplicating.
	pub sent_window: u32,
	pub fetch_timeout_ms: u64,
	pub history_page_size: u32,
	pub more_scan_depth: u32,
}
impl Default for Retrieval {
	fn default() -> Self {
		Self {
			sent_window: 50,
			fetch_timeout_ms: 30_000,
			history_page_size: 25,
			more_scan_depth: 3,
		}
	}
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_rule34_api_base() -> String {
	"https://api.rule34.xxx".to_string()
}

fn default_rule34_path() -> String {
	"/index.php".to_string()
}

fn default_redgifs_api_base() -> String {
	"https://api.redgifs.com".to_string()
}

fn default_search_count() -> u32 {
	5
}

fn default_provider_timeout_ms() -> u64 {
	10_000
}
