//! Construction-time configuration for carrier adapters
//!
//! The core never reads the process environment. Whatever composes the
//! adapters (the CLI, a service) resolves config files and environment
//! variables once and hands the result over as [`Credentials`] and
//! [`AdapterConfig`].

use serde::Deserialize;
use std::fmt;
use std::time::Duration;

use crate::auth::DEFAULT_TOKEN_TTL;
use crate::http::{RetryPolicy, TimeoutConfig};

const REDACTED: &str = "[REDACTED]";

/// Provider credentials; the accepted shape varies per provider
#[derive(Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Credentials {
    /// Pre-issued bearer token
    Token { token: String },
    /// Login exchanged for a bearer token
    EmailPassword { email: String, password: String },
    /// Access-key style credentials
    AccessKey {
        access_key: String,
        username: String,
        password: String,
    },
    /// OAuth client credentials
    #[serde(rename = "oauth")]
    OAuth {
        client_id: String,
        client_secret: String,
    },
    /// Nothing configured
    #[default]
    None,
}

impl Credentials {
    pub fn token(token: impl Into<String>) -> Self {
        Credentials::Token { token: token.into() }
    }

    pub fn email_password(email: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials::EmailPassword {
            email: email.into(),
            password: password.into(),
        }
    }

    /// True when nothing usable was supplied
    ///
    /// Variants whose required fields are all blank count as absent.
    pub fn is_none(&self) -> bool {
        match self {
            Credentials::None => true,
            Credentials::Token { token } => token.trim().is_empty(),
            Credentials::EmailPassword { email, password } => {
                email.trim().is_empty() || password.is_empty()
            }
            Credentials::AccessKey {
                access_key,
                username,
                password,
            } => access_key.trim().is_empty() || username.trim().is_empty() || password.is_empty(),
            Credentials::OAuth {
                client_id,
                client_secret,
            } => client_id.trim().is_empty() || client_secret.is_empty(),
        }
    }

    /// Short name of the credential shape, safe to log
    pub fn kind(&self) -> &'static str {
        match self {
            Credentials::Token { .. } => "token",
            Credentials::EmailPassword { .. } => "email_password",
            Credentials::AccessKey { .. } => "access_key",
            Credentials::OAuth { .. } => "oauth",
            Credentials::None => "none",
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Token { .. } => f.debug_struct("Token").field("token", &REDACTED).finish(),
            Credentials::EmailPassword { email, .. } => f
                .debug_struct("EmailPassword")
                .field("email", email)
                .field("password", &REDACTED)
                .finish(),
            Credentials::AccessKey { username, .. } => f
                .debug_struct("AccessKey")
                .field("access_key", &REDACTED)
                .field("username", username)
                .field("password", &REDACTED)
                .finish(),
            Credentials::OAuth { client_id, .. } => f
                .debug_struct("OAuth")
                .field("client_id", client_id)
                .field("client_secret", &REDACTED)
                .finish(),
            Credentials::None => f.write_str("None"),
        }
    }
}

/// Per-adapter settings
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterConfig {
    /// Overrides the adapter's built-in API endpoint
    pub base_url: Option<String>,
    pub timeouts: TimeoutConfig,
    /// Applied to idempotent reads only
    pub retry: RetryPolicy,
    /// Token lifetime assumed when the provider's token carries no expiry
    pub token_ttl: Duration,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeouts: TimeoutConfig::default(),
            retry: RetryPolicy::default(),
            token_ttl: DEFAULT_TOKEN_TTL,
        }
    }
}

impl AdapterConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Explicit base URL when set and non-blank, otherwise `default`
    pub fn resolve_base_url(&self, default: &str) -> String {
        self.base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(default)
            .to_string()
    }
}
