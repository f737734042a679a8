//! Weight and length unit conversion
//!
//! Pure, stateless conversions between the unit systems carriers expect.
//! Every conversion goes through a base unit (kilograms for weight,
//! centimeters for length) using fixed factors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const KG_PER_LB: f64 = 0.453_592_37;
const KG_PER_OZ: f64 = 0.028_349_523_125;
const KG_PER_G: f64 = 0.001;
const CM_PER_IN: f64 = 2.54;
const CM_PER_MM: f64 = 0.1;

/// Unit of weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    Lb,
    Kg,
    Oz,
    G,
}

/// Unit of length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    In,
    Cm,
    Mm,
}

impl WeightUnit {
    /// All supported weight units
    pub const ALL: [WeightUnit; 4] = [WeightUnit::Lb, WeightUnit::Kg, WeightUnit::Oz, WeightUnit::G];

    fn kilograms_per_unit(self) -> f64 {
        match self {
            WeightUnit::Lb => KG_PER_LB,
            WeightUnit::Kg => 1.0,
            WeightUnit::Oz => KG_PER_OZ,
            WeightUnit::G => KG_PER_G,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WeightUnit::Lb => "lb",
            WeightUnit::Kg => "kg",
            WeightUnit::Oz => "oz",
            WeightUnit::G => "g",
        }
    }
}

impl LengthUnit {
    /// All supported length units
    pub const ALL: [LengthUnit; 3] = [LengthUnit::In, LengthUnit::Cm, LengthUnit::Mm];

    fn centimeters_per_unit(self) -> f64 {
        match self {
            LengthUnit::In => CM_PER_IN,
            LengthUnit::Cm => 1.0,
            LengthUnit::Mm => CM_PER_MM,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LengthUnit::In => "in",
            LengthUnit::Cm => "cm",
            LengthUnit::Mm => "mm",
        }
    }
}

/// Convert a weight value between units
pub fn convert_weight(value: f64, from: WeightUnit, to: WeightUnit) -> f64 {
    if from == to {
        return value;
    }
    value * from.kilograms_per_unit() / to.kilograms_per_unit()
}

/// Convert a length value between units
pub fn convert_dimension(value: f64, from: LengthUnit, to: LengthUnit) -> f64 {
    if from == to {
        return value;
    }
    value * from.centimeters_per_unit() / to.centimeters_per_unit()
}

/// Error returned when a unit string is not recognized
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} unit '{value}'")]
pub struct UnknownUnit {
    kind: &'static str,
    value: String,
}

impl FromStr for WeightUnit {
    type Err = UnknownUnit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lb" | "lbs" | "pound" | "pounds" => Ok(WeightUnit::Lb),
            "kg" | "kgs" | "kilogram" | "kilograms" => Ok(WeightUnit::Kg),
            "oz" | "ounce" | "ounces" => Ok(WeightUnit::Oz),
            "g" | "gram" | "grams" => Ok(WeightUnit::G),
            _ => Err(UnknownUnit {
                kind: "weight",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for LengthUnit {
    type Err = UnknownUnit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "in" | "inch" | "inches" => Ok(LengthUnit::In),
            "cm" | "centimeter" | "centimeters" => Ok(LengthUnit::Cm),
            "mm" | "millimeter" | "millimeters" => Ok(LengthUnit::Mm),
            _ => Err(UnknownUnit {
                kind: "length",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for WeightUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
