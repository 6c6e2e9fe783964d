use sqlx::PgExecutor;

use crate::{Error, Result, models::Preference};

pub async fn list_preferences<'e, E>(executor: E, user_id: i64) -> Result<Vec<Preference>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, Preference>(
		"\
SELECT id, user_id, preference
FROM preferences
WHERE user_id = $1
ORDER BY id ASC",
	)
	.bind(user_id)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

pub async fn insert_preference<'e, E>(executor: E, user_id: i64, preference: &str) -> Result<()>
where
	E: PgExecutor<'e>,
{
	if preference.trim().is_empty() {
		return Err(Error::InvalidArgument("preference must be non-empty.".to_string()));
	}

	sqlx::query("INSERT INTO preferences (user_id, preference) VALUES ($1, $2)")
		.bind(user_id)
		.bind(preference)
		.execute(executor)
		.await?;

	Ok(())
}

pub async fn delete_preferences<'e, E>(executor: E, user_id: i64) -> Result<u64>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query("DELETE FROM preferences WHERE user_id = $1")
		.bind(user_id)
		.execute(executor)
		.await?;

	Ok(result.rows_affected())
}

/// Deletes every row for `user_id` whose text equals `preference` exactly.
pub async fn delete_preference<'e, E>(executor: E, user_id: i64, preference: &str) -> Result<u64>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query("DELETE FROM preferences WHERE user_id = $1 AND preference = $2")
		.bind(user_id)
		.bind(preference)
		.execute(executor)
		.await?;

	Ok(result.rows_affected())
}
