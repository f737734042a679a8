//! Shared utilities for command handlers

use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::redaction;
use crate::output::OutputWriter;
use carrierlink_core::{create_adapter, CarrierAdapter};
use serde::de::DeserializeOwned;
use std::fs;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

/// Load a request file; YAML by extension, JSON otherwise
pub fn load_request<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path)?;
    let is_yaml = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s == "yaml" || s == "yml")
        .unwrap_or(false);

    let request = if is_yaml {
        serde_yaml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };
    Ok(request)
}

/// Build the adapter for `provider` from file settings and environment
pub fn build_adapter(provider: &str, config: &Config) -> Result<Arc<dyn CarrierAdapter>> {
    let settings = config.resolve_provider(provider);

    if tracing::enabled!(tracing::Level::DEBUG) {
        if let Ok(mut dump) = serde_json::to_value(&settings) {
            redaction::redact_json_value(&mut dump);
            tracing::debug!(provider, settings = %dump, "Resolved provider settings");
        }
    }

    let adapter = create_adapter(provider, settings.credentials(), settings.adapter_config()?)?;
    Ok(adapter)
}

/// Await `future` behind a spinner when the terminal allows one
pub async fn with_spinner<F, T>(output: &OutputWriter, message: &str, future: F) -> T
where
    F: Future<Output = T>,
{
    let spinner = output.spinner(message);
    let result = future.await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use carrierlink_core::{ErrorKind, RateRequest};
    use std::io::Write;

    #[test]
    fn test_load_yaml_request() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(
            file,
            r#"
shipFrom: {{ postalCode: "560001", country: IN }}
shipTo: {{ postalCode: "110001", country: IN }}
parcels:
  - {{ length: 10, width: 10, height: 10, distanceUnit: cm, weight: 1.5, massUnit: kg }}
"#
        )
        .unwrap();

        let request: RateRequest = load_request(file.path()).unwrap();
        assert_eq!(request.ship_to.postal_code, "110001");
        assert_eq!(request.parcels.len(), 1);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_load_request_errors() {
        let err = load_request::<RateRequest>(Path::new("/nonexistent/request.json")).unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));

        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"shipFrom": {{}}}}"#).unwrap();
        let err = load_request::<RateRequest>(file.path()).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_unknown_provider_is_config_error() {
        let err = build_adapter("dhl", &Config::default()).err().unwrap();
        match err {
            Error::Shipping(err) => assert_eq!(err.kind, ErrorKind::ConfigError),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
