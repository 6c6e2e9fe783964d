use sqlx::PgExecutor;

use crate::{Error, Result};

pub async fn insert_sent_item<'e, E>(executor: E, url: &str, ts: i64) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query("INSERT INTO sent_items (url, ts) VALUES ($1, $2)")
		.bind(url)
		.bind(ts)
		.execute(executor)
		.await?;

	Ok(())
}

/// Most recent `limit` sent urls, newest first.
pub async fn recent_sent_urls<'e, E>(executor: E, limit: i64) -> Result<Vec<String>>
where
	E: PgExecutor<'e>,
{
	if limit <= 0 {
		return Err(Error::InvalidArgument(format!("limit must be positive, got {limit}.")));
	}

	let urls = sqlx::query_scalar::<_, String>(
		"\
SELECT url
FROM sent_items
ORDER BY ts DESC
LIMIT $1",
	)
	.bind(limit)
	.fetch_all(executor)
	.await?;

	Ok(urls)
}
