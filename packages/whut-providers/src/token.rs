//! Bearer token lifecycle for token-authenticated providers.
//!
//! A [`TokenLifecycle`] starts unauthenticated. Every request asks it for a bearer via
//! [`TokenLifecycle::bearer_with`], which refreshes synchronously when the held token is expired.
//! The state lives behind one async mutex, so the expiry check, any login and the read of the
//! bearer used for the outgoing request happen as one critical section per provider instance.

use std::future::Future;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::Deserialize;
use time::OffsetDateTime;
use tokio::sync::Mutex;

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TokenState {
	#[default]
	Unauthenticated,
	Authenticated {
		token: String,
		/// Seconds since the unix epoch. `0` is never trusted.
		expires_at: i64,
	},
}
impl TokenState {
	pub fn is_expired(&self, now: i64) -> bool {
		match self {
			Self::Unauthenticated => true,
			Self::Authenticated { expires_at, .. } => *expires_at == 0 || now >= *expires_at,
		}
	}

	pub fn bearer(&self) -> Option<&str> {
		match self {
			Self::Unauthenticated => None,
			Self::Authenticated { token, .. } => Some(token.as_str()),
		}
	}
}

#[derive(Debug, Default)]
pub struct TokenLifecycle {
	state: Mutex<TokenState>,
}
impl TokenLifecycle {
	pub fn new() -> Self {
		Self::default()
	}

	pub async fn is_expired(&self, now: i64) -> bool {
		self.state.lock().await.is_expired(now)
	}

	/// Returns a bearer that is valid when the lock is acquired, running `login` first when the
	/// held token is expired. `clock` is read only after the lock is held, so a caller queued behind
	/// another login judges the token against the current time. A failed login leaves the lifecycle
	/// unauthenticated.
	pub async fn bearer_with<C, F, Fut>(&self, clock: C, login: F) -> Result<String>
	where
		C: Fn() -> i64,
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<String>>,
	{
		let mut state = self.state.lock().await;
		let now = clock();

		if state.is_expired(now) {
			*state = TokenState::Unauthenticated;

			tracing::debug!("Provider token expired or missing; logging in.");

			let token = login().await?;
			let expires_at = decode_expiry(&token)?;
			let refreshed = TokenState::Authenticated { token, expires_at };

			if refreshed.is_expired(now) {
				return Err(Error::TokenExpired { expires_at });
			}

			*state = refreshed;

			tracing::debug!(expires_at, "Provider login succeeded.");
		}

		state.bearer().map(str::to_string).ok_or(Error::TokenExpired { expires_at: 0 })
	}

	/// Drops the held token when it is still `rejected`, so the next request logs in again.
	/// A token obtained by another caller after the rejected request went out is kept.
	pub async fn invalidate(&self, rejected: &str) -> bool {
		let mut state = self.state.lock().await;

		if state.bearer() != Some(rejected) {
			return false;
		}

		*state = TokenState::Unauthenticated;

		true
	}
}

#[derive(Debug, Deserialize)]
struct Claims {
	exp: Option<i64>,
}

/// Reads the `exp` claim from the payload segment of a signed token.
pub fn decode_expiry(token: &str) -> Result<i64> {
	let segments = token.split('.').collect::<Vec<_>>();

	if segments.len() != 3 {
		return Err(Error::TokenFormat { segments: segments.len() });
	}

	let payload = URL_SAFE_NO_PAD
		.decode(segments[1].trim_end_matches('='))
		.map_err(|err| Error::ClaimDecode { message: err.to_string() })?;
	let claims: Claims = serde_json::from_slice(&payload)
		.map_err(|err| Error::ClaimDecode { message: err.to_string() })?;

	claims.exp.ok_or_else(|| Error::ClaimDecode { message: "Missing exp claim.".to_string() })
}

pub fn now_unix() -> i64 {
	OffsetDateTime::now_utc().unix_timestamp()
}
