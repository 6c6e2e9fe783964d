pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Provider unavailable: {message}")]
	Unavailable { message: String },
	#[error("Malformed provider response: {message}")]
	Decode { message: String },
	#[error("Login failed with status {status}.")]
	LoginFailed { status: u16 },
	#[error("Token must have three dot-separated segments, found {segments}.")]
	TokenFormat { segments: usize },
	#[error("Failed to decode token claims: {message}")]
	ClaimDecode { message: String },
	#[error("Login returned a token that expired at {expires_at}.")]
	TokenExpired { expires_at: i64 },
	#[error("{message}")]
	InvalidConfig { message: String },
}
impl From<reqwest::Error> for Error {
	fn from(err: reqwest::Error) -> Self {
		if err.is_decode() {
			return Self::Decode { message: err.to_string() };
		}

		Self::Unavailable { message: err.to_string() }
	}
}
impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Self::Decode { message: err.to_string() }
	}
}
