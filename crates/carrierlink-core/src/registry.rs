//! Adapter factory

use std::sync::Arc;

use crate::adapter::{CarrierAdapter, ProviderId};
use crate::carriers::{ShiprocketAdapter, UpsAdapter};
use crate::config::{AdapterConfig, Credentials};
use crate::error::Result;

/// Ids accepted by [`create_adapter`]
pub fn supported_providers() -> Vec<&'static str> {
    ProviderId::ALL.iter().map(|p| p.as_str()).collect()
}

/// Build the adapter for `provider`
///
/// Unknown ids fail with `CONFIG_ERROR`. Credentials are not checked here;
/// each operation reports missing credentials itself.
pub fn create_adapter(
    provider: &str,
    credentials: Credentials,
    config: AdapterConfig,
) -> Result<Arc<dyn CarrierAdapter>> {
    let id: ProviderId = provider.parse()?;
    tracing::debug!(provider = %id, credentials = credentials.kind(), "Creating carrier adapter");

    let adapter: Arc<dyn CarrierAdapter> = match id {
        ProviderId::Shiprocket => Arc::new(ShiprocketAdapter::new(credentials, &config)?),
        ProviderId::Ups => Arc::new(UpsAdapter::new(credentials, &config)?),
    };
    Ok(adapter)
}
