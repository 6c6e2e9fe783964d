use whut_providers::{
	SearchResult, media::MediaClient, redgifs::RedgifsClient, rule34::Rule34Client,
};

use crate::{BoxFuture, MediaFetcher, MediaProvider, PreferenceStore, Result};

/// Tag search whose queries carry the user's stored preferences.
pub struct TagSearchProvider {
	client: Rule34Client,
	preferences: PreferenceStore,
}
impl TagSearchProvider {
	pub fn new(client: Rule34Client, preferences: PreferenceStore) -> Self {
		Self { client, preferences }
	}

	async fn augmented_query(&self, tags: &[String], user_id: i64) -> Result<String> {
		let prefs = self.preferences.get(user_id).await?;

		Ok(augment_query(tags, &prefs))
	}

	async fn search_inner(&self, terms: &[String]) -> Result<Vec<SearchResult>> {
		Ok(self.client.search(terms).await?)
	}
}
impl MediaProvider for TagSearchProvider {
	fn build_query<'a>(&'a self, tags: &'a [String], user_id: i64) -> BoxFuture<'a, Result<String>> {
		Box::pin(self.augmented_query(tags, user_id))
	}

	fn search<'a>(&'a self, terms: &'a [String]) -> BoxFuture<'a, Result<Vec<SearchResult>>> {
		Box::pin(self.search_inner(terms))
	}
}

/// Gif search. Queries are the tags as given.
pub struct TokenSearchProvider {
	client: RedgifsClient,
}
impl TokenSearchProvider {
	pub fn new(client: RedgifsClient) -> Self {
		Self { client }
	}

	async fn search_inner(&self, terms: &[String]) -> Result<Vec<SearchResult>> {
		Ok(self.client.search(terms).await?)
	}
}
impl MediaProvider for TokenSearchProvider {
	fn build_query<'a>(&'a self, tags: &'a [String], _user_id: i64) -> BoxFuture<'a, Result<String>> {
		let query = tags.join(" ");

		Box::pin(async move { Ok(query) })
	}

	fn search<'a>(&'a self, terms: &'a [String]) -> BoxFuture<'a, Result<Vec<SearchResult>>> {
		Box::pin(self.search_inner(terms))
	}
}

pub struct HttpFetcher {
	client: MediaClient,
}
impl HttpFetcher {
	pub fn new(client: MediaClient) -> Self {
		Self { client }
	}

	async fn fetch_inner(&self, url: &str) -> Result<Vec<u8>> {
		Ok(self.client.fetch(url).await?)
	}
}
impl MediaFetcher for HttpFetcher {
	fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>>> {
		Box::pin(self.fetch_inner(url))
	}
}

/// Space-joins `tags` followed by every preference term.
pub fn augment_query(tags: &[String], preferences: &[String]) -> String {
	tags.iter()
		.chain(preferences)
		.map(|term| term.trim())
		.filter(|term| !term.is_empty())
		.collect::<Vec<_>>()
		.join(" ")
}
