//! Carrierlink Core - one contract for many shipping carriers
//!
//! This crate lets a caller quote rates, book shipments, track packages and
//! cancel orders across wire-incompatible carrier APIs through a single
//! [`CarrierAdapter`] trait and one canonical data model.
//!
//! # Main Components
//!
//! - **Canonical model**: provider-agnostic requests and results ([`types`])
//! - **Error handling**: one [`ShippingError`] taxonomy for every provider
//! - **Adapters**: Shiprocket (complete) and UPS (contract only)
//! - **Authentication**: per-adapter token cache with single-flight refresh
//!
//! # Example
//!
//! ```no_run
//! use carrierlink_core::{create_adapter, AdapterConfig, Credentials, TrackingRequest};
//!
//! # async fn example() -> carrierlink_core::Result<()> {
//! let adapter = create_adapter("shiprocket", Credentials::token("abc"), AdapterConfig::default())?;
//! let tracking = adapter.get_tracking(&TrackingRequest::new("141123221084922")).await?;
//! println!("{}", tracking.status);
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod auth;
pub mod carriers;
pub mod config;
pub mod error;
pub mod http;
pub mod payload;
pub mod registry;
pub mod status;
pub mod types;
pub mod units;

// Re-export main types for convenience
pub use adapter::{CarrierAdapter, ProviderId};
pub use auth::{token_expiry, Credential, TokenCache, DEFAULT_TOKEN_TTL};
pub use carriers::{ShiprocketAdapter, UpsAdapter};
pub use config::{AdapterConfig, Credentials};
pub use error::{normalize_error, ErrorKind, ErrorNormalizer, Operation, RawFailure, Result, ShippingError};
pub use http::{RetryPolicy, TimeoutConfig};
pub use registry::{create_adapter, supported_providers};
pub use status::{StatusRule, StatusRules, SHIPROCKET_STATUS_RULES};
pub use types::{
    // Requests
    Address, CancelShipmentRequest, CreateShipmentRequest, Item, Parcel, RateRequest, TrackingRequest,

    // Results
    Money, OperationOutcome, ShipmentResult, ShipmentStatus, ShippingRate, TrackingEvent, TrackingResult,

    ValidationError,
};
pub use units::{convert_dimension, convert_weight, LengthUnit, WeightUnit};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
