pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid {} value: {message}", crate::DSN_ENV)]
	Dsn { message: String },
	#[error("No maintenance database reachable: {message}")]
	Maintenance { message: String },
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
	#[error(transparent)]
	Storage(#[from] whut_storage::Error),
}
