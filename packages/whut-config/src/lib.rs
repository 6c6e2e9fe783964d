mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Discord, Postgres, Providers, Redgifs, Retrieval, Rule34, Service, Storage};

use std::{fs, path::Path};

/// Discord history pages and redgifs search pages both stop at 100 items.
const MAX_PAGE_SIZE: u32 = 100;

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.discord.token.trim().is_empty() {
		return Err(Error::Validation { message: "discord.token must be non-empty.".to_string() });
	}
	if cfg.discord.media_channel_id == 0 {
		return Err(Error::Validation {
			message: "discord.media_channel_id must be a channel id.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}

	for (label, value) in [
		("providers.rule34.user_id", &cfg.providers.rule34.user_id),
		("providers.rule34.api_key", &cfg.providers.rule34.api_key),
		("providers.rule34.api_base", &cfg.providers.rule34.api_base),
		("providers.redgifs.api_base", &cfg.providers.redgifs.api_base),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}
	for (label, value) in [
		("providers.rule34.timeout_ms", cfg.providers.rule34.timeout_ms),
		("providers.redgifs.timeout_ms", cfg.providers.redgifs.timeout_ms),
		("retrieval.fetch_timeout_ms", cfg.retrieval.fetch_timeout_ms),
	] {
		if value == 0 {
			return Err(Error::Validation {
				message: format!("{label} must be greater than zero."),
			});
		}
	}

	if !(1..=MAX_PAGE_SIZE).contains(&cfg.providers.redgifs.search_count) {
		return Err(Error::Validation {
			message: format!("providers.redgifs.search_count must be in the range 1-{MAX_PAGE_SIZE}."),
		});
	}
	if cfg.retrieval.sent_window == 0 {
		return Err(Error::Validation {
			message: "retrieval.sent_window must be greater than zero.".to_string(),
		});
	}
	if !(1..=MAX_PAGE_SIZE).contains(&cfg.retrieval.history_page_size) {
		return Err(Error::Validation {
			message: format!("retrieval.history_page_size must be in the range 1-{MAX_PAGE_SIZE}."),
		});
	}
	if cfg.retrieval.more_scan_depth == 0 {
		return Err(Error::Validation {
			message: "retrieval.more_scan_depth must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.discord.log_channel_id == Some(0) {
		cfg.discord.log_channel_id = None;
	}

	for api_base in [&mut cfg.providers.rule34.api_base, &mut cfg.providers.redgifs.api_base] {
		let trimmed = api_base.trim().trim_end_matches('/').to_string();

		*api_base = trimmed;
	}
}
