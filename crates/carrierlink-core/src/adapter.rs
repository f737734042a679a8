//! The carrier adapter contract
//!
//! Every provider integration implements [`CarrierAdapter`]. Callers hold
//! adapters as `Arc<dyn CarrierAdapter>` and never see provider payloads.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, ShippingError};
use crate::types::{
    CancelShipmentRequest, CreateShipmentRequest, OperationOutcome, RateRequest, ShipmentResult,
    ShippingRate, TrackingRequest, TrackingResult,
};

/// Uniform operations offered by every provider
///
/// `test_connection` and `cancel_shipment` are advisory and never fail;
/// problems come back as `success: false`. The other operations return a
/// [`ShippingError`] with a canonical kind.
#[async_trait]
pub trait CarrierAdapter: Send + Sync {
    /// Provider id, e.g. `"shiprocket"`
    fn provider(&self) -> &str;

    /// Authenticate and probe a cheap read-only endpoint
    async fn test_connection(&self) -> OperationOutcome;

    /// Quote available services; no serviceable option yields an empty vec
    async fn get_rates(&self, request: &RateRequest) -> Result<Vec<ShippingRate>>;

    /// Book a shipment with a quoted service
    ///
    /// Not idempotent: a retry after a timeout may create a second order at
    /// the provider. Callers that need exactly-once semantics must
    /// deduplicate on their side.
    async fn create_shipment(&self, request: &CreateShipmentRequest) -> Result<ShipmentResult>;

    /// Current status and event history, most recent event first
    async fn get_tracking(&self, request: &TrackingRequest) -> Result<TrackingResult>;

    /// Best-effort cancellation
    async fn cancel_shipment(&self, request: &CancelShipmentRequest) -> OperationOutcome;
}

/// Known providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Shiprocket,
    Ups,
}

impl ProviderId {
    pub const ALL: [ProviderId; 2] = [ProviderId::Shiprocket, ProviderId::Ups];

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderId::Shiprocket => "shiprocket",
            ProviderId::Ups => "ups",
        }
    }

    /// Human-facing name used in messages
    pub fn display_name(self) -> &'static str {
        match self {
            ProviderId::Shiprocket => "Shiprocket",
            ProviderId::Ups => "UPS",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = ShippingError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim();
        ProviderId::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let supported: Vec<&str> = ProviderId::ALL.iter().map(|p| p.as_str()).collect();
                ShippingError::config(
                    wanted,
                    format!(
                        "unknown provider '{}'; supported providers: {}",
                        wanted,
                        supported.join(", ")
                    ),
                )
            })
    }
}
