pub mod media;
pub mod redgifs;
pub mod rule34;
pub mod token;

mod error;

pub use error::{Error, Result};

use std::time::Duration;

use reqwest::Client;

/// One downloadable item returned by a provider search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
	pub name: String,
	pub url: String,
}

pub(crate) fn http_client(timeout_ms: u64) -> Result<Client> {
	Client::builder()
		.timeout(Duration::from_millis(timeout_ms))
		.build()
		.map_err(|err| Error::InvalidConfig { message: format!("Failed to build HTTP client: {err}.") })
}

/// Last non-empty path segment of `url`, without any query string.
pub fn file_name_from_url(url: &str) -> Option<&str> {
	let path = url.split(['?', '#']).next().unwrap_or(url);

	path.rsplit('/').find(|segment| !segment.is_empty() && !segment.contains(':'))
}

pub(crate) fn status_error(what: &str, status: reqwest::StatusCode) -> Error {
	Error::Unavailable { message: format!("{what} returned status {status}.") }
}
