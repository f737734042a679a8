//! JSON-over-HTTPS transport shared by carrier adapters
//!
//! Wraps one `reqwest::Client` per adapter with explicit timeouts, joins
//! request paths onto the adapter's base URL, attaches bearer credentials
//! and turns every non-success outcome into a [`RawFailure`].

use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Url};
use serde_json::Value;
use std::time::Instant;

use crate::error::{RawFailure, Result, ShippingError};
use crate::http::retry::{execute_with_retry, RetryPolicy};
use crate::http::timeout::TimeoutConfig;

const USER_AGENT: &str = concat!("carrierlink/", env!("CARGO_PKG_VERSION"));

/// HTTP transport bound to one provider base URL
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: ReqwestClient,
    base_url: Url,
    retry_policy: RetryPolicy,
}

impl HttpTransport {
    /// Build a transport; invalid URLs or timeouts are configuration errors
    pub fn new(
        provider: &str,
        base_url: &str,
        timeouts: &TimeoutConfig,
        retry_policy: RetryPolicy,
    ) -> Result<Self> {
        timeouts
            .validate()
            .map_err(|e| ShippingError::config(provider, format!("invalid timeout configuration: {}", e)))?;

        let base_url = parse_base_url(base_url)
            .map_err(|e| ShippingError::config(provider, format!("invalid base URL '{}': {}", base_url, e)))?;

        let client = ReqwestClient::builder()
            .connect_timeout(timeouts.connect_timeout)
            .timeout(timeouts.request_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ShippingError::config(provider, format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            retry_policy,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a request path against the base URL
    pub fn endpoint(&self, path: &str) -> std::result::Result<Url, RawFailure> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| RawFailure::Decode {
                message: format!("invalid request path '{}': {}", path, e),
            })
    }

    /// Resolve a fixed path followed by caller-supplied segments
    ///
    /// Each segment is percent-encoded whole, so `/`, `?` and `#` inside an
    /// identifier stay part of it. Empty and dot segments are rejected.
    pub fn endpoint_with_segments(&self, path: &str, segments: &[&str]) -> std::result::Result<Url, RawFailure> {
        if let Some(bad) = segments.iter().find(|s| matches!(s.trim(), "" | "." | "..")) {
            return Err(RawFailure::Decode {
                message: format!("invalid path segment '{}'", bad),
            });
        }

        let mut url = self.endpoint(path)?;
        url.path_segments_mut()
            .map_err(|_| RawFailure::Decode {
                message: format!("base URL '{}' cannot take path segments", self.base_url),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET with query parameters; transient failures are retried
    pub async fn get_json(
        &self,
        path: &str,
        query: &[(&str, String)],
        bearer: Option<&str>,
    ) -> std::result::Result<Value, RawFailure> {
        let url = self.endpoint(path)?;
        self.get_url(url, path, query, bearer).await
    }

    /// GET a path whose trailing segments are opaque identifiers
    pub async fn get_json_segments(
        &self,
        path: &str,
        segments: &[&str],
        query: &[(&str, String)],
        bearer: Option<&str>,
    ) -> std::result::Result<Value, RawFailure> {
        let url = self.endpoint_with_segments(path, segments)?;
        self.get_url(url, path, query, bearer).await
    }

    async fn get_url(
        &self,
        url: Url,
        path: &str,
        query: &[(&str, String)],
        bearer: Option<&str>,
    ) -> std::result::Result<Value, RawFailure> {
        execute_with_retry(
            move || {
                let request = self.client.get(url.clone()).query(query);
                self.send(Method::GET, path, request, bearer)
            },
            &self.retry_policy,
        )
        .await
    }

    /// POST a JSON body once; never retried
    pub async fn post_json(
        &self,
        path: &str,
        body: &Value,
        bearer: Option<&str>,
    ) -> std::result::Result<Value, RawFailure> {
        let url = self.endpoint(path)?;
        let request = self.client.post(url).json(body);
        self.send(Method::POST, path, request, bearer).await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        request: RequestBuilder,
        bearer: Option<&str>,
    ) -> std::result::Result<Value, RawFailure> {
        let request = match bearer {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let started = Instant::now();
        let response = request
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::debug!(%method, path, error = %e, "Carrier request failed before a response");
                RawFailure::from_request_error(&e)
            })?;

        let status = response.status();
        tracing::debug!(
            %method,
            path,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Carrier request completed"
        );

        let body = response
            .text()
            .await
            .map_err(|e| RawFailure::from_request_error(&e))?;

        if !status.is_success() {
            return Err(RawFailure::from_status(status, body));
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|e| RawFailure::Decode {
            message: format!("response is not valid JSON: {}", e),
        })
    }
}

/// Parse a base URL so that relative joins append to its path
fn parse_base_url(raw: &str) -> std::result::Result<Url, url::ParseError> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };
    Url::parse(&with_slash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport(base: &str, retry: RetryPolicy) -> HttpTransport {
        HttpTransport::new("test", base, &TimeoutConfig::default(), retry).unwrap()
    }

    fn fast_retry(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts)
            .with_base_delay(Duration::from_millis(1))
            .with_max_delay(Duration::from_millis(5))
            .with_jitter(false)
    }

    #[test]
    fn test_endpoint_joins_onto_base_path() {
        let t = transport("https://apiv2.shiprocket.in/v1/external", RetryPolicy::none());
        assert_eq!(
            t.endpoint("/courier/serviceability/").unwrap().as_str(),
            "https://apiv2.shiprocket.in/v1/external/courier/serviceability/"
        );
        let t = transport("https://example.com/api/", RetryPolicy::none());
        assert_eq!(t.endpoint("orders").unwrap().as_str(), "https://example.com/api/orders");
    }

    #[test]
    fn test_segments_are_percent_encoded() {
        let t = transport("https://apiv2.shiprocket.in/v1/external", RetryPolicy::none());
        assert_eq!(
            t.endpoint_with_segments("courier/track/awb", &["AB#12/3?x=1"]).unwrap().as_str(),
            "https://apiv2.shiprocket.in/v1/external/courier/track/awb/AB%2312%2F3%3Fx=1"
        );
        assert_eq!(
            t.endpoint_with_segments("courier/track/awb", &["../../channels"]).unwrap().path(),
            "/v1/external/courier/track/awb/..%2F..%2Fchannels"
        );
        for bad in ["..", ".", " "] {
            assert!(matches!(
                t.endpoint_with_segments("courier/track/awb", &[bad]),
                Err(RawFailure::Decode { .. })
            ));
        }
    }

    #[test]
    fn test_invalid_configuration_is_config_error() {
        let err = HttpTransport::new("test", "not a url", &TimeoutConfig::default(), RetryPolicy::none())
            .unwrap_err();
        assert_eq!(err.kind, crate::ErrorKind::ConfigError);

        let timeouts = TimeoutConfig::new(Duration::ZERO, Duration::from_secs(1));
        let err = HttpTransport::new("test", "https://example.com", &timeouts, RetryPolicy::none()).unwrap_err();
        assert_eq!(err.kind, crate::ErrorKind::ConfigError);
    }

    #[tokio::test]
    async fn test_get_json_sends_bearer_and_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/things"))
            .and(query_param("id", "42"))
            .and(header("authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let t = transport(&server.uri(), RetryPolicy::none());
        let value = t
            .get_json("/things", &[("id", "42".to_string())], Some("abc"))
            .await
            .unwrap();
        assert_eq!(value, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_get_json_retries_transient_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2])))
            .expect(1)
            .mount(&server)
            .await;

        let t = transport(&server.uri(), fast_retry(2));
        let value = t.get_json("/flaky", &[], None).await.unwrap();
        assert_eq!(value, json!([1, 2]));
    }

    #[tokio::test]
    async fn test_post_json_is_never_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/orders"))
            .and(body_json(json!({"id": 1})))
            .respond_with(ResponseTemplate::new(502).set_body_string("upstream down"))
            .expect(1)
            .mount(&server)
            .await;

        let t = transport(&server.uri(), fast_retry(3));
        let failure = t.post_json("/orders", &json!({"id": 1}), None).await.unwrap_err();
        assert_eq!(
            failure,
            RawFailure::Http {
                status: 502,
                body: "upstream down".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_empty_and_invalid_bodies() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/empty"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/garbage"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let t = transport(&server.uri(), RetryPolicy::none());
        assert_eq!(t.post_json("/empty", &json!({}), None).await.unwrap(), Value::Null);
        assert!(matches!(
            t.get_json("/garbage", &[], None).await,
            Err(RawFailure::Decode { .. })
        ));
    }

    #[tokio::test]
    async fn test_request_timeout_is_enforced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let timeouts = TimeoutConfig::new(Duration::from_millis(50), Duration::from_millis(100));
        let t = HttpTransport::new("test", &server.uri(), &timeouts, RetryPolicy::none()).unwrap();
        match t.get_json("/slow", &[], None).await {
            Err(RawFailure::Network { timeout, .. }) => assert!(timeout),
            other => panic!("expected timeout, got {:?}", other),
        }
    }
}
