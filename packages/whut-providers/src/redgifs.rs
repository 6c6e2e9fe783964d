use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::{
	Error, Result, SearchResult,
	token::{self, TokenLifecycle},
};

#[derive(Debug, Deserialize)]
struct LoginResponse {
	token: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchResponse {
	gifs: Vec<Gif>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Gif {
	id: String,
	urls: GifUrls,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GifUrls {
	sd: Option<String>,
	hd: Option<String>,
}

/// Search client for the redgifs v2 API using temporary anonymous tokens.
pub struct RedgifsClient {
	cfg: whut_config::Redgifs,
	http: Client,
	token: TokenLifecycle,
}
impl RedgifsClient {
	pub fn new(cfg: &whut_config::Redgifs) -> Result<Self> {
		Ok(Self {
			cfg: cfg.clone(),
			http: crate::http_client(cfg.timeout_ms)?,
			token: TokenLifecycle::new(),
		})
	}

	pub fn token(&self) -> &TokenLifecycle {
		&self.token
	}

	pub async fn search(&self, terms: &[String]) -> Result<Vec<SearchResult>> {
		if terms.is_empty() {
			return Ok(Vec::new());
		}

		let search_text = terms.join(" ");
		let bearer = self.token.bearer_with(token::now_unix, || self.login()).await?;
		let url = format!("{}/v2/gifs/search", self.cfg.api_base);
		let count = self.cfg.search_count.to_string();
		let res = self
			.http
			.get(url)
			.bearer_auth(&bearer)
			.query(&[("search_text", search_text.as_str()), ("count", count.as_str())])
			.send()
			.await?;
		let status = res.status();

		if status == StatusCode::UNAUTHORIZED {
			if self.token.invalidate(&bearer).await {
				tracing::warn!("Gif search rejected the bearer token; it will be refreshed.");
			}

			return Err(crate::status_error("Gif search", status));
		}
		if !status.is_success() {
			return Err(crate::status_error("Gif search", status));
		}

		let body: SearchResponse = res.json().await?;
		let results = body.gifs.into_iter().filter_map(gif_to_result).collect::<Vec<_>>();

		tracing::debug!(search_text = %search_text, count = results.len(), "Gif search completed.");

		Ok(results)
	}

	async fn login(&self) -> Result<String> {
		let url = format!("{}/v2/auth/temporary", self.cfg.api_base);
		let res = self.http.get(url).send().await?;
		let status = res.status();

		if !status.is_success() {
			return Err(Error::LoginFailed { status: status.as_u16() });
		}

		let body: LoginResponse = res.json().await?;

		if body.token.trim().is_empty() {
			return Err(Error::Decode { message: "Login response carried an empty token.".to_string() });
		}

		Ok(body.token)
	}
}

fn gif_to_result(gif: Gif) -> Option<SearchResult> {
	let non_empty = |url: Option<String>| url.filter(|url| !url.trim().is_empty());
	let url = non_empty(gif.urls.sd).or_else(|| non_empty(gif.urls.hd))?;
	let stem = crate::file_name_from_url(&url).unwrap_or(gif.id.as_str());
	let name = format!("redgif_{stem}");

	Some(SearchResult { name, url })
}

#[cfg(test)]
mod tests {
	use super::*;

	fn gif(id: &str, sd: Option<&str>, hd: Option<&str>) -> Gif {
		Gif {
			id: id.to_string(),
			urls: GifUrls { sd: sd.map(str::to_string), hd: hd.map(str::to_string) },
		}
	}

	#[test]
	fn prefers_standard_definition() {
		let result = gif_to_result(gif(
			"a",
			Some("https://media.example/a-sd.mp4"),
			Some("https://media.example/a.mp4"),
		))
		.expect("sd result");

		assert_eq!(result.url, "https://media.example/a-sd.mp4");
		assert_eq!(result.name, "redgif_a-sd.mp4");
	}

	#[test]
	fn falls_back_to_high_definition_and_skips_bare_items() {
		let result =
			gif_to_result(gif("b", Some(""), Some("https://media.example/b.mp4"))).expect("hd result");

		assert_eq!(result.url, "https://media.example/b.mp4");
		assert_eq!(result.name, "redgif_b.mp4");
		assert!(gif_to_result(gif("c", None, None)).is_none());
	}

	#[test]
	fn decodes_search_payload_with_missing_fields() {
		let body: SearchResponse = serde_json::from_value(serde_json::json!({
			"gifs": [
				{ "id": "x", "urls": { "sd": "https://media.example/x-sd.mp4" } },
				{ "id": "y" },
			],
			"page": 1,
		}))
		.expect("decode");
		let results = body.gifs.into_iter().filter_map(gif_to_result).collect::<Vec<_>>();

		assert_eq!(results.len(), 1);
		assert_eq!(results[0].name, "redgif_x-sd.mp4");
	}
}
