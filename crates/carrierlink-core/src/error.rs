//! Error types for carrier operations
//!
//! Every failure that reaches a caller is a [`ShippingError`] carrying one of
//! the canonical [`ErrorKind`]s. Raw provider failures are first captured as a
//! [`RawFailure`] and then funneled through [`normalize_error`] (or an adapter's
//! [`ErrorNormalizer`] override) so no provider payload or transport error
//! escapes the adapter boundary.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Longest provider message carried into a [`ShippingError`]
const MAX_PROVIDER_MESSAGE_CHARS: usize = 300;

/// Canonical error kinds shared by every adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Missing or invalid credentials/configuration
    ConfigError,
    /// Login rejected by the provider
    AuthError,
    /// Provider failed to quote rates
    RateError,
    /// Provider rejected or could not complete an order
    CreateError,
    /// Provider has no tracking record or failed to return one
    TrackError,
    /// Resource does not exist at the provider
    NotFound,
    /// The provider integration is not built yet
    NotImplemented,
    /// Network failure, timeout or provider 5xx; safe to retry
    Transient,
    /// Anything not otherwise classified
    Unknown,
}

impl ErrorKind {
    /// Whether an error of this kind may succeed when retried
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::Transient)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::ConfigError => "CONFIG_ERROR",
            ErrorKind::AuthError => "AUTH_ERROR",
            ErrorKind::RateError => "RATE_ERROR",
            ErrorKind::CreateError => "CREATE_ERROR",
            ErrorKind::TrackError => "TRACK_ERROR",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::NotImplemented => "NOT_IMPLEMENTED",
            ErrorKind::Transient => "TRANSIENT",
            ErrorKind::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contract operations, used to tag errors with the operation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    TestConnection,
    Authenticate,
    GetRates,
    CreateShipment,
    GetTracking,
    CancelShipment,
}

impl Operation {
    /// Kind reported when the provider rejects this operation for an
    /// otherwise unclassified reason
    pub fn failure_kind(self) -> ErrorKind {
        match self {
            Operation::GetRates => ErrorKind::RateError,
            Operation::CreateShipment => ErrorKind::CreateError,
            Operation::GetTracking => ErrorKind::TrackError,
            Operation::Authenticate => ErrorKind::AuthError,
            Operation::TestConnection | Operation::CancelShipment => ErrorKind::Unknown,
        }
    }
}

/// Canonical error returned by every adapter operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("[{provider}] {kind}: {message}")]
pub struct ShippingError {
    pub kind: ErrorKind,
    pub message: String,
    pub provider: String,
    pub retryable: bool,
}

/// Convenience type alias for carrier operation results
pub type Result<T> = std::result::Result<T, ShippingError>;

impl ShippingError {
    /// Create an error whose retryable flag follows its kind
    pub fn new(kind: ErrorKind, provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            provider: provider.into(),
            retryable: kind.is_retryable(),
        }
    }

    pub fn config(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigError, provider, message)
    }

    pub fn auth(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AuthError, provider, message)
    }

    pub fn transient(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transient, provider, message)
    }

    pub fn not_found(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, provider, message)
    }

    pub fn unknown(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, provider, message)
    }

    /// Error for an operation the provider integration does not support yet
    pub fn not_implemented(provider_name: &str, provider: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::NotImplemented,
            provider,
            format!("{} integration is not yet implemented", provider_name),
        )
    }

    /// Actionable error for absent credentials
    ///
    /// `expected` describes the accepted credential shapes, e.g.
    /// `"email + password or token"`.
    pub fn missing_credentials(provider: &str, expected: &str) -> Self {
        let env_prefix = provider.to_uppercase();
        Self::config(
            provider,
            format!(
                "{provider} credentials are not configured. Provide {expected} in the \
                 [providers.{provider}] section of the carrierlink config file, or set \
                 {env_prefix}_* environment variables (e.g. {env_prefix}_TOKEN)"
            ),
        )
    }

    /// Error for a request that fails local validation before any provider call
    pub fn invalid_request(operation: Operation, provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(operation.failure_kind(), provider, message)
    }

    /// Re-tag a normalized error for the operation that produced it
    ///
    /// Unclassified failures take the operation's own kind; tracking also
    /// folds `NOT_FOUND` into `TRACK_ERROR`. Auth, config, transient and
    /// not-implemented kinds pass through unchanged.
    pub fn in_operation(mut self, operation: Operation) -> Self {
        let retag = match (self.kind, operation) {
            (ErrorKind::Unknown, op) => op.failure_kind() != ErrorKind::Unknown,
            (ErrorKind::NotFound, Operation::GetTracking) => true,
            _ => false,
        };
        if retag {
            self.kind = operation.failure_kind();
            self.retryable = false;
        }
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// A provider failure before normalization
#[derive(Debug, Clone, PartialEq)]
pub enum RawFailure {
    /// Provider answered with a non-success status
    Http { status: u16, body: String },
    /// Request never produced a response
    Network { message: String, timeout: bool },
    /// Response arrived but could not be decoded
    Decode { message: String },
}

impl RawFailure {
    /// Create from a network/request error
    pub fn from_request_error(error: &reqwest::Error) -> Self {
        if error.is_decode() {
            return RawFailure::Decode {
                message: error.to_string(),
            };
        }
        RawFailure::Network {
            message: error.to_string(),
            timeout: error.is_timeout(),
        }
    }

    /// Create from a non-success response status and body
    pub fn from_status(status: StatusCode, body: impl Into<String>) -> Self {
        RawFailure::Http {
            status: status.as_u16(),
            body: body.into(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            RawFailure::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Kind assigned by the default normalization
    pub fn default_kind(&self) -> ErrorKind {
        match self {
            RawFailure::Http { status, .. } => match *status {
                401 | 403 => ErrorKind::AuthError,
                404 => ErrorKind::NotFound,
                408 | 429 => ErrorKind::Transient,
                500..=599 => ErrorKind::Transient,
                _ => ErrorKind::Unknown,
            },
            RawFailure::Network { .. } => ErrorKind::Transient,
            RawFailure::Decode { .. } => ErrorKind::Unknown,
        }
    }

    /// Whether repeating the same request may succeed
    pub fn is_transient(&self) -> bool {
        self.default_kind().is_retryable()
    }

    /// Short human-readable description, never the full provider payload
    pub fn summary(&self) -> String {
        match self {
            RawFailure::Http { status, body } => match extract_provider_message(body) {
                Some(message) => format!("HTTP {}: {}", status, message),
                None => format!("HTTP {}", status),
            },
            RawFailure::Network { message, timeout: true } => format!("request timed out: {}", message),
            RawFailure::Network { message, .. } => format!("network error: {}", message),
            RawFailure::Decode { message } => format!("invalid provider response: {}", message),
        }
    }
}

/// Default mapping of a raw failure to a canonical error
///
/// 401/403 map to `AUTH_ERROR`, 404 to `NOT_FOUND`, 408/429/5xx and network
/// failures to `TRANSIENT`, everything else to `UNKNOWN`.
pub fn normalize_error(provider: &str, raw: &RawFailure) -> ShippingError {
    ShippingError::new(raw.default_kind(), provider, raw.summary())
}

/// Per-adapter error normalization with an overridable default
pub trait ErrorNormalizer {
    /// Provider id stamped on normalized errors
    fn provider_id(&self) -> &str;

    /// Map a raw failure into a canonical error
    fn normalize(&self, raw: &RawFailure) -> ShippingError {
        normalize_error(self.provider_id(), raw)
    }
}

/// Pull a short message out of a provider error body
pub(crate) fn extract_provider_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    let message = match serde_json::from_str::<Value>(trimmed) {
        Ok(json) => message_from_json(&json)?,
        Err(_) => trimmed.to_string(),
    };
    Some(truncate(&message, MAX_PROVIDER_MESSAGE_CHARS))
}

fn message_from_json(json: &Value) -> Option<String> {
    let base = json
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| match json.get("error") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(obj @ Value::Object(_)) => obj.get("message").and_then(Value::as_str).map(str::to_string),
            _ => None,
        });

    // Validation style: {"errors": {"field": ["reason", ...]}}
    let details = json.get("errors").and_then(Value::as_object).map(|errors| {
        errors
            .iter()
            .map(|(field, reasons)| {
                let reason = match reasons {
                    Value::Array(list) => list
                        .iter()
                        .filter_map(Value::as_str)
                        .collect::<Vec<_>>()
                        .join(", "),
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                format!("{}: {}", field, reason)
            })
            .collect::<Vec<_>>()
            .join("; ")
    });

    match (base, details) {
        (Some(base), Some(details)) if !details.is_empty() => Some(format!("{} ({})", base, details)),
        (Some(base), _) => Some(base),
        (None, Some(details)) if !details.is_empty() => Some(details),
        _ => None,
    }
}

fn truncate(message: &str, max_chars: usize) -> String {
    if message.chars().count() <= max_chars {
        return message.to_string();
    }
    let mut truncated: String = message.chars().take(max_chars).collect();
    truncated.push('…');
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(status: u16, body: &str) -> RawFailure {
        RawFailure::Http {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_default_status_mapping() {
        assert_eq!(normalize_error("p", &http(401, "")).kind, ErrorKind::AuthError);
        assert_eq!(normalize_error("p", &http(403, "")).kind, ErrorKind::AuthError);
        assert_eq!(normalize_error("p", &http(404, "")).kind, ErrorKind::NotFound);
        assert_eq!(normalize_error("p", &http(500, "")).kind, ErrorKind::Transient);
        assert_eq!(normalize_error("p", &http(503, "")).kind, ErrorKind::Transient);
        assert_eq!(normalize_error("p", &http(429, "")).kind, ErrorKind::Transient);
        assert_eq!(normalize_error("p", &http(400, "")).kind, ErrorKind::Unknown);
        assert_eq!(normalize_error("p", &http(422, "")).kind, ErrorKind::Unknown);
    }

    #[test]
    fn test_network_failures_are_transient_and_retryable() {
        let err = normalize_error(
            "shiprocket",
            &RawFailure::Network {
                message: "connection refused".to_string(),
                timeout: false,
            },
        );
        assert_eq!(err.kind, ErrorKind::Transient);
        assert!(err.retryable);
        assert_eq!(err.provider, "shiprocket");
    }

    #[test]
    fn test_only_transient_is_retryable() {
        assert!(!normalize_error("p", &http(401, "")).retryable);
        assert!(!normalize_error("p", &http(400, "")).retryable);
        assert!(normalize_error("p", &http(502, "")).retryable);
    }

    #[test]
    fn test_message_extraction_formats() {
        assert_eq!(
            extract_provider_message(r#"{"message": "Invalid credentials"}"#).as_deref(),
            Some("Invalid credentials")
        );
        assert_eq!(
            extract_provider_message(r#"{"error": {"message": "quota exceeded"}}"#).as_deref(),
            Some("quota exceeded")
        );
        assert_eq!(
            extract_provider_message(r#"{"message": "Oops! Invalid Data.", "errors": {"pincode": ["is invalid"]}}"#)
                .as_deref(),
            Some("Oops! Invalid Data. (pincode: is invalid)")
        );
        assert_eq!(extract_provider_message("Bad Gateway").as_deref(), Some("Bad Gateway"));
        assert_eq!(extract_provider_message("   "), None);
    }

    #[test]
    fn test_long_messages_are_truncated() {
        let body = "x".repeat(1000);
        let message = extract_provider_message(&body).unwrap();
        assert_eq!(message.chars().count(), MAX_PROVIDER_MESSAGE_CHARS + 1);
    }

    #[test]
    fn test_in_operation_retags_unknown() {
        let err = ShippingError::unknown("p", "rejected").in_operation(Operation::GetRates);
        assert_eq!(err.kind, ErrorKind::RateError);

        let err = ShippingError::unknown("p", "rejected").in_operation(Operation::CreateShipment);
        assert_eq!(err.kind, ErrorKind::CreateError);

        let err = ShippingError::not_found("p", "no awb").in_operation(Operation::GetTracking);
        assert_eq!(err.kind, ErrorKind::TrackError);
    }

    #[test]
    fn test_in_operation_keeps_auth_and_transient() {
        let err = ShippingError::auth("p", "expired").in_operation(Operation::GetRates);
        assert_eq!(err.kind, ErrorKind::AuthError);

        let err = ShippingError::transient("p", "timeout").in_operation(Operation::GetTracking);
        assert_eq!(err.kind, ErrorKind::Transient);
        assert!(err.retryable);

        let err = ShippingError::not_found("p", "gone").in_operation(Operation::GetRates);
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[test]
    fn test_missing_credentials_message_is_actionable() {
        let err = ShippingError::missing_credentials("shiprocket", "email + password or token");
        assert_eq!(err.kind, ErrorKind::ConfigError);
        assert!(err.message.contains("shiprocket"));
        assert!(err.message.contains("[providers.shiprocket]"));
        assert!(err.message.contains("SHIPROCKET_TOKEN"));
    }

    #[test]
    fn test_error_display_and_serde() {
        let err = ShippingError::not_implemented("UPS", "ups");
        assert_eq!(err.to_string(), "[ups] NOT_IMPLEMENTED: UPS integration is not yet implemented");

        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "NOT_IMPLEMENTED");
        assert_eq!(json["retryable"], false);
    }
}
