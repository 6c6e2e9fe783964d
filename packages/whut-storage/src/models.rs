#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Preference {
	pub id: i64,
	pub user_id: i64,
	pub preference: String,
}
