//! Bearer credential caching with single-flight refresh
//!
//! Each adapter owns one [`TokenCache`]. The cached [`Credential`] is an
//! immutable value replaced wholesale under an async mutex, so concurrent
//! operations that find it expired queue behind a single login instead of
//! each issuing their own.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::error::Result;

/// Assumed token lifetime when the token itself does not say
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Seconds subtracted from a token's own expiry claim
const EXPIRY_SKEW_SECS: i64 = 60;

/// A bearer token and the instant it stops being usable
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    expires_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Expiry for a freshly issued token
///
/// JWTs carrying an `exp` claim expire a minute before that claim; any
/// other token is trusted for `fallback_ttl` from `now`.
pub fn token_expiry(token: &str, now: DateTime<Utc>, fallback_ttl: Duration) -> DateTime<Utc> {
    if let Some(exp) = jwt_expiry(token) {
        return exp - chrono::Duration::seconds(EXPIRY_SKEW_SECS);
    }
    let ttl = chrono::Duration::from_std(fallback_ttl).unwrap_or_else(|_| chrono::Duration::hours(24));
    now + ttl
}

/// The `exp` claim of a JWT, if the token is one
fn jwt_expiry(token: &str) -> Option<DateTime<Utc>> {
    let mut segments = token.split('.');
    let (_header, payload, _signature) = (segments.next()?, segments.next()?, segments.next()?);
    if segments.next().is_some() {
        return None;
    }

    let decoded = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: Value = serde_json::from_slice(&decoded).ok()?;
    let exp = match claims.get("exp")? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?,
        _ => return None,
    };
    DateTime::from_timestamp(exp, 0)
}

/// Per-adapter credential cache
#[derive(Debug)]
pub struct TokenCache {
    credential: Mutex<Option<Credential>>,
    fallback_ttl: Duration,
}

impl TokenCache {
    pub fn new(fallback_ttl: Duration) -> Self {
        Self {
            credential: Mutex::new(None),
            fallback_ttl,
        }
    }

    /// Return a valid token, running `login` only when none is cached
    ///
    /// The lock is held across `login`, so concurrent callers wait for the
    /// in-flight login and reuse its token. A failed login caches nothing
    /// and its error goes to the caller that ran it; later callers try again.
    pub async fn ensure_authenticated<F, Fut>(&self, login: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        let mut cached = self.credential.lock().await;

        if let Some(credential) = cached.as_ref() {
            if credential.is_valid_at(Utc::now()) {
                return Ok(credential.token.clone());
            }
            tracing::debug!(expired_at = %credential.expires_at, "Cached token expired");
        }

        let token = login().await?;
        let expires_at = token_expiry(&token, Utc::now(), self.fallback_ttl);
        tracing::info!(%expires_at, "Authenticated with provider");

        *cached = Some(Credential::new(token.clone(), expires_at));
        Ok(token)
    }

    /// Drop the cached credential so the next call logs in again
    pub async fn invalidate(&self) {
        let mut cached = self.credential.lock().await;
        if cached.take().is_some() {
            tracing::debug!("Cached token invalidated");
        }
    }

    /// Drop the cached credential only if it still holds `token`
    ///
    /// A caller whose request was rejected passes the token it used; a
    /// token cached by a later login is left alone.
    pub async fn invalidate_if(&self, token: &str) -> bool {
        let mut cached = self.credential.lock().await;
        if cached.as_ref().is_some_and(|c| c.token == token) {
            *cached = None;
            tracing::debug!("Rejected token invalidated");
            true
        } else {
            false
        }
    }

    /// Snapshot of the cached credential
    pub async fn current(&self) -> Option<Credential> {
        self.credential.lock().await.clone()
    }
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_TTL)
    }
}
