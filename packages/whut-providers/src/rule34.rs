use reqwest::Client;
use serde::Deserialize;

use crate::{Error, Result, SearchResult};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Post {
	id: i64,
	file_url: Option<String>,
	image: Option<String>,
}

/// Unauthenticated tag search against the rule34 dapi endpoint.
pub struct Rule34Client {
	cfg: whut_config::Rule34,
	http: Client,
}
impl Rule34Client {
	pub fn new(cfg: &whut_config::Rule34) -> Result<Self> {
		Ok(Self { cfg: cfg.clone(), http: crate::http_client(cfg.timeout_ms)? })
	}

	pub async fn search(&self, terms: &[String]) -> Result<Vec<SearchResult>> {
		// Form encoding turns the spaces into the `+` separators the endpoint expects.
		let tags = terms.join(" ");
		let url = format!("{}{}", self.cfg.api_base, self.cfg.path);
		let res = self
			.http
			.get(url)
			.query(&[
				("page", "dapi"),
				("s", "post"),
				("q", "index"),
				("json", "1"),
				("tags", tags.as_str()),
				("user_id", self.cfg.user_id.as_str()),
				("api_key", self.cfg.api_key.as_str()),
			])
			.send()
			.await?;
		let status = res.status();

		if !status.is_success() {
			return Err(crate::status_error("Tag search", status));
		}

		let body = res.text().await?;
		let results = parse_posts(&body)?;

		tracing::debug!(tags = %tags, count = results.len(), "Tag search completed.");

		Ok(results)
	}
}

fn parse_posts(body: &str) -> Result<Vec<SearchResult>> {
	// The endpoint answers a search without matches with an empty body instead of `[]`.
	if body.trim().is_empty() {
		return Ok(Vec::new());
	}

	let posts: Vec<Post> = serde_json::from_str(body)
		.map_err(|err| Error::Decode { message: format!("Tag search body: {err}.") })?;

	Ok(posts.into_iter().filter_map(post_to_result).collect())
}

fn post_to_result(post: Post) -> Option<SearchResult> {
	let url = post.file_url.filter(|url| !url.trim().is_empty())?;
	let name = post
		.image
		.filter(|name| !name.trim().is_empty())
		.or_else(|| crate::file_name_from_url(&url).map(str::to_string))
		.unwrap_or_else(|| format!("post_{}", post.id));

	Some(SearchResult { name, url })
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_body_means_no_matches() {
		assert!(parse_posts("").expect("empty body").is_empty());
		assert!(parse_posts(" \n").expect("blank body").is_empty());
		assert!(parse_posts("[]").expect("empty array").is_empty());
	}

	#[test]
	fn maps_posts_in_order_and_skips_missing_files() {
		let body = serde_json::json!([
			{ "id": 1, "file_url": "https://img.example/images/1/a.png", "image": "a.png", "tags": "cats red" },
			{ "id": 2, "file_url": "", "image": "b.png" },
			{ "id": 3, "image": "c.png" },
			{ "id": 4, "file_url": "https://img.example/images/4/d.webm" },
		])
		.to_string();
		let results = parse_posts(&body).expect("parse failed");

		assert_eq!(
			results,
			vec![
				SearchResult {
					name: "a.png".to_string(),
					url: "https://img.example/images/1/a.png".to_string(),
				},
				SearchResult {
					name: "d.webm".to_string(),
					url: "https://img.example/images/4/d.webm".to_string(),
				},
			]
		);
	}

	#[test]
	fn malformed_body_is_a_decode_error() {
		let err = parse_posts("<html>rate limited</html>").expect_err("Expected decode error.");

		assert!(matches!(err, Error::Decode { .. }));
	}
}
