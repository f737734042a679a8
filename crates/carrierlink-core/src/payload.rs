//! Helpers for building provider payloads from canonical requests
//!
//! Aggregation rules shared by adapters: total weight is a sum after unit
//! conversion, the reported package size is the largest parcel by volume,
//! and money stays in minor units until the provider boundary.

use crate::types::{Item, Parcel};
use crate::units::{LengthUnit, WeightUnit};

/// Phone number sent when a provider requires one and the caller gave none
pub const PLACEHOLDER_PHONE: &str = "0000000000";

/// Email sent when a provider requires one and the caller gave none
pub const PLACEHOLDER_EMAIL: &str = "noreply@carrierlink.invalid";

/// Sum of all parcel weights, converted to `unit`
pub fn total_weight(parcels: &[Parcel], unit: WeightUnit) -> f64 {
    parcels.iter().map(|p| p.weight_in(unit)).sum()
}

/// The parcel with the largest volume; ties go to the earliest parcel
pub fn largest_parcel(parcels: &[Parcel]) -> Option<&Parcel> {
    let mut best: Option<(&Parcel, f64)> = None;
    for parcel in parcels {
        let volume = parcel.volume(LengthUnit::Cm);
        match best {
            Some((_, best_volume)) if volume <= best_volume => {}
            _ => best = Some((parcel, volume)),
        }
    }
    best.map(|(parcel, _)| parcel)
}

/// Declared value of all items in minor currency units
pub fn declared_value_minor(items: &[Item]) -> i64 {
    items.iter().fold(0i64, |total, item| {
        total.saturating_add(item.value.saturating_mul(i64::from(item.quantity)))
    })
}

/// Minor units to a provider's decimal amount
pub fn minor_to_major(amount: i64) -> f64 {
    amount as f64 / 100.0
}

/// Round a measurement for provider payloads that reject long fractions
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Caller value when present and non-blank, otherwise `placeholder`
///
/// Synthesized values are logged so they can be told apart from
/// caller-supplied data.
pub fn fill_or_placeholder(field: &str, value: Option<&str>, placeholder: &str) -> String {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => v.to_string(),
        None => {
            tracing::warn!(field, placeholder, "Required field missing, sending placeholder");
            placeholder.to_string()
        }
    }
}
