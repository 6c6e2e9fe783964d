pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Transport error: {message}")]
	Transport { message: String },
	#[error("Decode error: {message}")]
	Decode { message: String },
	#[error("Auth error: {message}")]
	Auth { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Persistence error: {message}")]
	Persistence { message: String },
	#[error("Payload exceeds the upload limit.")]
	EntityTooLarge,
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
}
impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		Self::Persistence { message: err.to_string() }
	}
}

impl From<whut_storage::Error> for Error {
	fn from(err: whut_storage::Error) -> Self {
		match err {
			whut_storage::Error::Sqlx(inner) => Self::Persistence { message: inner.to_string() },
			whut_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
		}
	}
}

impl From<whut_providers::Error> for Error {
	fn from(err: whut_providers::Error) -> Self {
		use whut_providers::Error as Provider;

		match err {
			Provider::Unavailable { message } => Self::Transport { message },
			Provider::Decode { message } => Self::Decode { message },
			Provider::InvalidConfig { message } => Self::InvalidRequest { message },
			err @ (Provider::LoginFailed { .. }
			| Provider::TokenFormat { .. }
			| Provider::ClaimDecode { .. }
			| Provider::TokenExpired { .. }) => Self::Auth { message: err.to_string() },
		}
	}
}
