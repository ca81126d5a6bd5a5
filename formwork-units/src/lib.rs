//! Unit conversion for unit-typed form fields.
//!
//! Each [`Dimension`] owns a closed table of unit codes. Every linear unit
//! carries a factor relative to the dimension's base unit (how many of the
//! unit make one base unit) and a display label. Conversion between two
//! linear units is `value / factor_from * factor_to`.
//!
//! Temperature is the one non-linear dimension and converts through explicit
//! formulas between Celsius, Fahrenheit and Kelvin.
//!
//! ```
//! use formwork_units::{convert, Dimension};
//!
//! let f = convert(0.0, "C", "F", Dimension::Temperature).unwrap();
//! assert!((f - 32.0).abs() < 1e-9);
//!
//! let cm = convert(1.0, "in", "cm", Dimension::Length).unwrap();
//! assert!((cm - 2.54).abs() < 1e-9);
//! ```

mod error;
mod tables;

pub use error::{Result, UnitError};
pub use tables::UnitSpec;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::trace;

/// A family of mutually convertible units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Length,
    Area,
    Volume,
    Weight,
    Time,
    Temperature,
    Angle,
}

impl Dimension {
    /// Every dimension, in declaration order.
    pub const ALL: [Dimension; 7] = [
        Dimension::Length,
        Dimension::Area,
        Dimension::Volume,
        Dimension::Weight,
        Dimension::Time,
        Dimension::Temperature,
        Dimension::Angle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Length => "length",
            Dimension::Area => "area",
            Dimension::Volume => "volume",
            Dimension::Weight => "weight",
            Dimension::Time => "time",
            Dimension::Temperature => "temperature",
            Dimension::Angle => "angle",
        }
    }

    /// The unit table for this dimension.
    pub fn units(&self) -> &'static [UnitSpec] {
        match self {
            Dimension::Length => tables::LENGTH,
            Dimension::Area => tables::AREA,
            Dimension::Volume => tables::VOLUME,
            Dimension::Weight => tables::WEIGHT,
            Dimension::Time => tables::TIME,
            Dimension::Temperature => tables::TEMPERATURE,
            Dimension::Angle => tables::ANGLE,
        }
    }

    /// The unit every factor in the table is relative to.
    pub fn base_unit(&self) -> &'static str {
        self.units()[0].code
    }

    /// Look up a unit by code.
    pub fn unit(&self, code: &str) -> Option<&'static UnitSpec> {
        self.units().iter().find(|u| u.code == code)
    }

    pub fn has_unit(&self, code: &str) -> bool {
        self.unit(code).is_some()
    }

    /// Display label for a unit code.
    pub fn label(&self, code: &str) -> Option<&'static str> {
        self.unit(code).map(|u| u.label)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "length" | "distance" => Ok(Dimension::Length),
            "area" => Ok(Dimension::Area),
            "volume" => Ok(Dimension::Volume),
            "weight" | "mass" => Ok(Dimension::Weight),
            "time" | "duration" => Ok(Dimension::Time),
            "temperature" => Ok(Dimension::Temperature),
            "angle" => Ok(Dimension::Angle),
            _ => Err(UnitError::UnknownDimension {
                dimension: s.to_string(),
            }),
        }
    }
}

/// Convert `value` from one unit to another within a dimension.
///
/// Fails without panicking when `value` is NaN or infinite, or when either
/// unit is not part of `dimension`.
pub fn convert(value: f64, from: &str, to: &str, dimension: Dimension) -> Result<f64> {
    if !value.is_finite() {
        return Err(UnitError::NonFinite { value });
    }
    let from_spec = dimension.unit(from).ok_or_else(|| UnitError::UnknownUnit {
        unit: from.to_string(),
        dimension,
    })?;
    let to_spec = dimension.unit(to).ok_or_else(|| UnitError::UnknownUnit {
        unit: to.to_string(),
        dimension,
    })?;

    let converted = if from_spec.code == to_spec.code {
        value
    } else if dimension == Dimension::Temperature {
        convert_temperature(value, from_spec.code, to_spec.code)
    } else {
        value / from_spec.factor * to_spec.factor
    };

    trace!(%dimension, from, to, value, converted, "converted unit value");
    Ok(converted)
}

const KELVIN_OFFSET: f64 = 273.15;

fn convert_temperature(value: f64, from: &str, to: &str) -> f64 {
    match (from, to) {
        ("C", "F") => value * 9.0 / 5.0 + 32.0,
        ("F", "C") => (value - 32.0) * 5.0 / 9.0,
        ("C", "K") => value + KELVIN_OFFSET,
        ("K", "C") => value - KELVIN_OFFSET,
        ("F", "K") => (value - 32.0) * 5.0 / 9.0 + KELVIN_OFFSET,
        ("K", "F") => (value - KELVIN_OFFSET) * 9.0 / 5.0 + 32.0,
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn test_celsius_to_fahrenheit_and_kelvin() {
        assert!(close(convert(0.0, "C", "F", Dimension::Temperature).unwrap(), 32.0));
        assert!(close(convert(0.0, "C", "K", Dimension::Temperature).unwrap(), 273.15));
        assert!(close(convert(100.0, "C", "F", Dimension::Temperature).unwrap(), 212.0));
    }

    #[test]
    fn test_fahrenheit_kelvin_pair() {
        assert!(close(convert(32.0, "F", "K", Dimension::Temperature).unwrap(), 273.15));
        assert!(close(convert(273.15, "K", "F", Dimension::Temperature).unwrap(), 32.0));
        assert!(close(convert(-40.0, "F", "C", Dimension::Temperature).unwrap(), -40.0));
    }

    #[test]
    fn test_linear_length() {
        assert!(close(convert(1.0, "km", "m", Dimension::Length).unwrap(), 1000.0));
        assert!(close(convert(1.0, "ft", "in", Dimension::Length).unwrap(), 12.0));
        assert!(close(convert(1.0, "mi", "km", Dimension::Length).unwrap(), 1.609344));
    }

    #[test]
    fn test_linear_other_dimensions() {
        assert!(close(convert(1.0, "ha", "m2", Dimension::Area).unwrap(), 10_000.0));
        assert!(close(convert(1.0, "l", "ml", Dimension::Volume).unwrap(), 1000.0));
        assert!(close(convert(1.0, "lb", "kg", Dimension::Weight).unwrap(), 0.45359237));
        assert!(close(convert(2.0, "h", "min", Dimension::Time).unwrap(), 120.0));
        assert!(close(
            convert(180.0, "deg", "rad", Dimension::Angle).unwrap(),
            std::f64::consts::PI
        ));
    }

    #[test]
    fn test_same_unit_is_identity() {
        assert_eq!(convert(12.5, "cm", "cm", Dimension::Length).unwrap(), 12.5);
    }

    #[test]
    fn test_non_finite_input_fails() {
        let err = convert(f64::NAN, "m", "cm", Dimension::Length).unwrap_err();
        assert!(matches!(err, UnitError::NonFinite { .. }));
        assert!(convert(f64::INFINITY, "C", "F", Dimension::Temperature).is_err());
    }

    #[test]
    fn test_unknown_unit_fails() {
        let err = convert(1.0, "kg", "m", Dimension::Length).unwrap_err();
        match err {
            UnitError::UnknownUnit { unit, dimension } => {
                assert_eq!(unit, "kg");
                assert_eq!(dimension, Dimension::Length);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_dimension_parsing_and_labels() {
        assert_eq!("Mass".parse::<Dimension>().unwrap(), Dimension::Weight);
        assert!("speed".parse::<Dimension>().is_err());
        assert_eq!(Dimension::Length.base_unit(), "m");
        assert_eq!(Dimension::Temperature.label("K"), Some("Kelvin"));
        assert!(Dimension::Volume.has_unit("gal"));
        assert!(!Dimension::Volume.has_unit("m"));
    }

    #[test]
    fn test_every_table_is_non_empty_and_unique() {
        for dimension in Dimension::ALL {
            let units = dimension.units();
            assert!(!units.is_empty(), "{dimension} has no units");
            for (i, unit) in units.iter().enumerate() {
                assert!(unit.factor > 0.0, "{} has non-positive factor", unit.code);
                assert!(
                    units[i + 1..].iter().all(|other| other.code != unit.code),
                    "duplicate unit code {} in {dimension}",
                    unit.code
                );
            }
            assert_eq!(dimension.unit(dimension.base_unit()).unwrap().factor, 1.0);
        }
    }

    #[test]
    fn test_dimension_serde_uses_lowercase() {
        let json = serde_json::to_string(&Dimension::Temperature).unwrap();
        assert_eq!(json, "\"temperature\"");
    }
}
