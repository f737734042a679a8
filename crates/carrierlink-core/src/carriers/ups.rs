//! UPS adapter
//!
//! The UPS integration is not built yet. The adapter still honours the
//! full contract so callers can tell "not configured" apart from "not
//! implemented".

use async_trait::async_trait;

use crate::adapter::{CarrierAdapter, ProviderId};
use crate::config::{AdapterConfig, Credentials};
use crate::error::{Result, ShippingError};
use crate::types::{
    CancelShipmentRequest, CreateShipmentRequest, OperationOutcome, RateRequest, ShipmentResult, ShippingRate,
    TrackingRequest, TrackingResult,
};

const PROVIDER: &str = "ups";
const ACCEPTED_CREDENTIALS: &str = "access_key + username + password or OAuth client_id + client_secret";

/// Placeholder adapter for UPS
#[derive(Debug)]
pub struct UpsAdapter {
    credentials: Credentials,
    base_url: String,
}

impl UpsAdapter {
    pub const DEFAULT_BASE_URL: &'static str = "https://onlinetools.ups.com/api";

    pub fn new(credentials: Credentials, config: &AdapterConfig) -> Result<Self> {
        Ok(Self {
            credentials,
            base_url: config.resolve_base_url(Self::DEFAULT_BASE_URL),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn require_credentials(&self) -> Result<()> {
        match &self.credentials {
            creds if creds.is_none() => Err(ShippingError::missing_credentials(PROVIDER, ACCEPTED_CREDENTIALS)),
            Credentials::AccessKey { .. } | Credentials::OAuth { .. } => Ok(()),
            other => Err(ShippingError::config(
                PROVIDER,
                format!(
                    "UPS accepts {} credentials, but '{}' credentials were configured",
                    ACCEPTED_CREDENTIALS,
                    other.kind()
                ),
            )),
        }
    }

    fn not_implemented<T>(&self) -> Result<T> {
        self.require_credentials()?;
        Err(ShippingError::not_implemented(ProviderId::Ups.display_name(), PROVIDER))
    }

    fn not_implemented_outcome() -> OperationOutcome {
        OperationOutcome::failed(ShippingError::not_implemented(ProviderId::Ups.display_name(), PROVIDER).message)
    }
}

#[async_trait]
impl CarrierAdapter for UpsAdapter {
    fn provider(&self) -> &str {
        ProviderId::Ups.as_str()
    }

    async fn test_connection(&self) -> OperationOutcome {
        Self::not_implemented_outcome()
    }

    async fn get_rates(&self, _request: &RateRequest) -> Result<Vec<ShippingRate>> {
        self.not_implemented()
    }

    async fn create_shipment(&self, _request: &CreateShipmentRequest) -> Result<ShipmentResult> {
        self.not_implemented()
    }

    async fn get_tracking(&self, _request: &TrackingRequest) -> Result<TrackingResult> {
        self.not_implemented()
    }

    async fn cancel_shipment(&self, _request: &CancelShipmentRequest) -> OperationOutcome {
        Self::not_implemented_outcome()
    }
}
