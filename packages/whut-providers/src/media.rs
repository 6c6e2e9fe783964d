use reqwest::Client;

use crate::Result;

/// Downloads result files so they can be re-uploaded as attachments.
pub struct MediaClient {
	http: Client,
}
impl MediaClient {
	pub fn new(timeout_ms: u64) -> Result<Self> {
		Ok(Self { http: crate::http_client(timeout_ms)? })
	}

	pub async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
		let res = self.http.get(url).send().await?;
		let status = res.status();

		if !status.is_success() {
			return Err(crate::status_error("Media download", status));
		}

		let bytes = res.bytes().await?;

		tracing::debug!(url, size = bytes.len(), "Media downloaded.");

		Ok(bytes.to_vec())
	}
}
