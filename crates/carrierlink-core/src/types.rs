//! Canonical request and result types shared by every carrier adapter
//!
//! These are plain value types. Adapters consume the request types, build
//! their own provider payloads from them, and hand back the result types;
//! no provider-specific shape leaks into this module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::units::{convert_dimension, convert_weight, LengthUnit, WeightUnit};

/// Postal address
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,

    /// Street lines, first line first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub address_lines: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    /// State, province or region
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(default)]
    pub postal_code: String,

    /// Country name or ISO 3166 code
    #[serde(default)]
    pub country: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl Address {
    /// Address line at `index`, if present and non-blank
    pub fn line(&self, index: usize) -> Option<&str> {
        self.address_lines
            .get(index)
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
    }

    fn validate(&self, role: &str) -> Result<(), ValidationError> {
        if self.postal_code.trim().is_empty() {
            return Err(ValidationError::new(
                format!("{}.postalCode", role),
                "postal code is required",
            ));
        }
        if self.country.trim().is_empty() {
            return Err(ValidationError::new(
                format!("{}.country", role),
                "country is required",
            ));
        }
        Ok(())
    }
}

/// A single package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parcel {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub distance_unit: LengthUnit,
    pub weight: f64,
    pub mass_unit: WeightUnit,
}

impl Parcel {
    /// Volume in cubic `unit`
    pub fn volume(&self, unit: LengthUnit) -> f64 {
        self.length_in(unit) * self.width_in(unit) * self.height_in(unit)
    }

    pub fn weight_in(&self, unit: WeightUnit) -> f64 {
        convert_weight(self.weight, self.mass_unit, unit)
    }

    pub fn length_in(&self, unit: LengthUnit) -> f64 {
        convert_dimension(self.length, self.distance_unit, unit)
    }

    pub fn width_in(&self, unit: LengthUnit) -> f64 {
        convert_dimension(self.width, self.distance_unit, unit)
    }

    pub fn height_in(&self, unit: LengthUnit) -> f64 {
        convert_dimension(self.height, self.distance_unit, unit)
    }

    /// All dimensions and the weight must be finite and strictly positive
    pub fn validate(&self, index: usize) -> Result<(), ValidationError> {
        let fields = [
            ("length", self.length),
            ("width", self.width),
            ("height", self.height),
            ("weight", self.weight),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(ValidationError::new(
                    format!("parcels[{}].{}", index, name),
                    format!("must be a positive number, got {}", value),
                ));
            }
        }
        Ok(())
    }
}

/// A line item, used for declared value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Unit value in minor currency units
    pub value: i64,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
}

/// Request for rate quotes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateRequest {
    pub ship_from: Address,
    pub ship_to: Address,
    pub parcels: Vec<Parcel>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Item>,
}

impl RateRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_shipment_parts(&self.ship_from, &self.ship_to, &self.parcels)
    }
}

/// Money in integer minor units (e.g. paise, cents)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    /// ISO 4217 code
    pub currency: String,
    pub amount: i64,
}

impl Money {
    pub fn new(currency: impl Into<String>, amount: i64) -> Self {
        Self {
            currency: currency.into(),
            amount,
        }
    }

    pub fn zero(currency: impl Into<String>) -> Self {
        Self::new(currency, 0)
    }

    /// Convert a provider's major-unit amount, rounding half away from zero
    pub fn from_major(currency: impl Into<String>, major: f64) -> Self {
        let amount = if major.is_finite() {
            (major * 100.0).round() as i64
        } else {
            0
        };
        Self::new(currency, amount)
    }

    /// Major-unit value; only for provider payloads and display
    pub fn to_major(&self) -> f64 {
        self.amount as f64 / 100.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.amount < 0 { "-" } else { "" };
        let abs = self.amount.unsigned_abs();
        write!(f, "{}{}.{:02} {}", sign, abs / 100, abs % 100, self.currency)
    }
}

/// A single quoted service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingRate {
    pub service_name: String,
    /// Provider-specific service code, passed back in [`CreateShipmentRequest::service_code`]
    pub service_code: String,
    pub currency: String,
    /// Minor currency units
    pub amount: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_days: Option<u32>,
    pub provider: String,
}

/// Request to book a shipment with a previously quoted service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShipmentRequest {
    pub ship_from: Address,
    pub ship_to: Address,
    pub parcels: Vec<Parcel>,
    pub service_code: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Item>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CreateShipmentRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_shipment_parts(&self.ship_from, &self.ship_to, &self.parcels)?;
        if self.service_code.trim().is_empty() {
            return Err(ValidationError::new("serviceCode", "a service code is required"));
        }
        Ok(())
    }
}

/// Canonical shipment lifecycle
///
/// `Created → LabelCreated → PickedUp → InTransit → Delivered`, with
/// `Exception` and `Cancelled` reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    Created,
    LabelCreated,
    PickedUp,
    InTransit,
    Delivered,
    Exception,
    Cancelled,
}

impl ShipmentStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ShipmentStatus::Delivered | ShipmentStatus::Exception | ShipmentStatus::Cancelled
        )
    }

    fn progress_rank(self) -> Option<u8> {
        match self {
            ShipmentStatus::Created => Some(0),
            ShipmentStatus::LabelCreated => Some(1),
            ShipmentStatus::PickedUp => Some(2),
            ShipmentStatus::InTransit => Some(3),
            ShipmentStatus::Delivered => Some(4),
            ShipmentStatus::Exception | ShipmentStatus::Cancelled => None,
        }
    }

    /// Whether the state machine allows moving from `self` to `next`
    pub fn can_transition_to(self, next: ShipmentStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self.progress_rank(), next.progress_rank()) {
            (Some(from), Some(to)) => to > from,
            // exception / cancelled from any non-terminal state
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ShipmentStatus::Created => "created",
            ShipmentStatus::LabelCreated => "label_created",
            ShipmentStatus::PickedUp => "picked_up",
            ShipmentStatus::InTransit => "in_transit",
            ShipmentStatus::Delivered => "delivered",
            ShipmentStatus::Exception => "exception",
            ShipmentStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A booked shipment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentResult {
    /// Provider-prefixed internal id
    pub id: String,
    pub provider_shipment_id: String,
    pub tracking_number: String,
    pub tracking_url: String,
    pub label_url: String,
    pub cost: Money,
    pub status: ShipmentStatus,
}

/// Request for tracking information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingRequest {
    pub tracking_number: String,
}

impl TrackingRequest {
    pub fn new(tracking_number: impl Into<String>) -> Self {
        Self {
            tracking_number: tracking_number.into(),
        }
    }
}

/// One checkpoint in a shipment's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingEvent {
    /// `None` when the provider's timestamp could not be parsed
    pub timestamp: Option<DateTime<Utc>>,
    pub status: ShipmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_status_code: Option<String>,
}

/// Tracking state of a shipment, events most recent first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingResult {
    pub tracking_number: String,
    pub status: ShipmentStatus,
    pub events: Vec<TrackingEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_delivery: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_delivery: Option<DateTime<Utc>>,
}

/// Request to cancel a booked shipment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelShipmentRequest {
    pub provider_shipment_id: String,
}

impl CancelShipmentRequest {
    pub fn new(provider_shipment_id: impl Into<String>) -> Self {
        Self {
            provider_shipment_id: provider_shipment_id.into(),
        }
    }
}

/// `{success, error?}` outcome of advisory operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OperationOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// A request field that failed local validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

fn validate_shipment_parts(
    ship_from: &Address,
    ship_to: &Address,
    parcels: &[Parcel],
) -> Result<(), ValidationError> {
    ship_from.validate("shipFrom")?;
    ship_to.validate("shipTo")?;
    if parcels.is_empty() {
        return Err(ValidationError::new("parcels", "at least one parcel is required"));
    }
    for (index, parcel) in parcels.iter().enumerate() {
        parcel.validate(index)?;
    }
    Ok(())
}
