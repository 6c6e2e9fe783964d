use whut_storage::{db::Db, preferences as queries};

use crate::{Error, Result};

/// Per-user ordered search terms. Every mutation runs in its own transaction.
#[derive(Clone)]
pub struct PreferenceStore {
	db: Db,
}
impl PreferenceStore {
	pub fn new(db: Db) -> Self {
		Self { db }
	}

	/// Preference texts in insertion order.
	pub async fn get(&self, user_id: i64) -> Result<Vec<String>> {
		let rows = queries::list_preferences(&self.db.pool, user_id).await?;

		Ok(rows.into_iter().map(|row| row.preference).collect())
	}

	/// Replaces the whole set. The previous set survives any failure.
	pub async fn set(&self, user_id: i64, terms: &[String]) -> Result<()> {
		let mut tx = self.db.pool.begin().await?;

		queries::delete_preferences(&mut *tx, user_id).await?;

		for term in terms {
			queries::insert_preference(&mut *tx, user_id, term).await?;
		}

		tx.commit().await?;

		tracing::info!(user_id, count = terms.len(), "Preferences replaced.");

		Ok(())
	}

	pub async fn add(&self, user_id: i64, terms: &[String]) -> Result<()> {
		let mut tx = self.db.pool.begin().await?;

		for term in terms {
			queries::insert_preference(&mut *tx, user_id, term).await?;
		}

		tx.commit().await?;

		tracing::info!(user_id, count = terms.len(), "Preferences added.");

		Ok(())
	}

	/// Deletes rows matching each term exactly. A term without matches aborts the whole batch.
	pub async fn remove(&self, user_id: i64, terms: &[String]) -> Result<()> {
		let mut tx = self.db.pool.begin().await?;
		let mut seen = Vec::with_capacity(terms.len());

		for term in terms {
			if seen.contains(&term) {
				continue;
			}

			let removed = queries::delete_preference(&mut *tx, user_id, term).await?;

			if removed == 0 {
				tx.rollback().await?;

				return Err(Error::NotFound { message: format!("preference {term:?}") });
			}

			seen.push(term);
		}

		tx.commit().await?;

		tracing::info!(user_id, count = seen.len(), "Preferences removed.");

		Ok(())
	}
}
