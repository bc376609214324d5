// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Decoded sensor report model.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::math::hex_bytes;

/// Raw bytes of one report field, kept for diagnostic display.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawField(pub Vec<u8>);

impl RawField {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Space-separated lowercase hex, two digits per byte.
    pub fn hex(&self) -> String {
        hex_bytes(&self.0)
    }
}

impl From<&[u8]> for RawField {
    fn from(value: &[u8]) -> Self {
        RawField(value.to_vec())
    }
}

impl fmt::Display for RawField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex())
    }
}

impl Serialize for RawField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.hex())
    }
}

/// Fixed-point scale shared by the three axes of one sensor group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScalePair {
    pub multiplier: i16,
    pub divisor: i32,
}

impl ScalePair {
    /// Convert a raw axis value to physical units: `raw * multiplier / divisor`.
    ///
    /// A zero divisor is not special-cased and yields a non-finite result.
    pub fn apply(&self, raw: i64) -> f64 {
        (raw * i64::from(self.multiplier)) as f64 / f64::from(self.divisor)
    }
}

/// Three physical-unit components. Components may be non-finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensorVector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl SensorVector {
    pub fn components(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// True when every component is a usable reading.
    pub fn is_finite(&self) -> bool {
        self.components().iter().all(|c| c.is_finite())
    }
}

impl fmt::Display for SensorVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {})",
            format_component(self.x),
            format_component(self.y),
            format_component(self.z)
        )
    }
}

/// Render one vector component with two decimals.
///
/// Rounding works on the exact binary value and an exact halfway case goes
/// away from zero, so `0.125` renders as `0.13` and `-0.125` as `-0.13`.
/// Non-finite values render as `NaN`, `Infinity` and `-Infinity`; a negative
/// zero renders as `0.00`.
pub fn format_component(v: f64) -> String {
    if v.is_nan() {
        return "NaN".to_string();
    }
    if v.is_infinite() {
        let text = if v > 0.0 { "Infinity" } else { "-Infinity" };
        return text.to_string();
    }
    if v == 0.0 {
        return "0.00".to_string();
    }

    // A binary fraction sits exactly between two hundredths only when it is
    // an odd multiple of 1/8. Scaling by 8 and by 100 is exact there.
    let magnitude = v.abs();
    if (magnitude * 8.0) % 2.0 == 1.0 {
        let cents = (magnitude * 100.0).ceil() as u64;
        let sign = if v < 0.0 { "-" } else { "" };
        return format!("{}{}.{:02}", sign, cents / 100, cents % 100);
    }
    format!("{:.2}", v)
}

/// One decoded sensor group: the wire bytes plus the converted vector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorReading {
    /// Multiplier bytes in wire order.
    pub multiplier: RawField,
    /// Divisor bytes in wire order.
    pub divisor: RawField,
    /// Axis bytes, x/y/z.
    pub axes: [RawField; 3],
    pub scale: ScalePair,
    pub vector: SensorVector,
}

/// A fully decoded 64-byte sensor report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedReport {
    pub signature: RawField,
    pub temperature: RawField,
    pub timestamp: RawField,
    pub angular_velocity: SensorReading,
    pub acceleration: SensorReading,
    pub magnetic: SensorReading,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_apply_identity() {
        let pair = ScalePair {
            multiplier: 1,
            divisor: 1,
        };
        assert_eq!(pair.apply(100), 100.0);
    }

    #[test]
    fn scale_apply_zero_divisor_is_non_finite() {
        let zero = ScalePair {
            multiplier: 0,
            divisor: 0,
        };
        assert!(zero.apply(0).is_nan());
        let inf = ScalePair {
            multiplier: 1,
            divisor: 0,
        };
        assert_eq!(inf.apply(5), f64::INFINITY);
        assert_eq!(inf.apply(-5), f64::NEG_INFINITY);
    }

    #[test]
    fn component_formatting() {
        assert_eq!(format_component(1.0), "1.00");
        assert_eq!(format_component(-2.5), "-2.50");
        assert_eq!(format_component(0.333), "0.33");
        assert_eq!(format_component(-0.0), "0.00");
        assert_eq!(format_component(f64::NAN), "NaN");
        assert_eq!(format_component(f64::INFINITY), "Infinity");
        assert_eq!(format_component(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn component_halfway_rounds_away_from_zero() {
        assert_eq!(format_component(0.125), "0.13");
        assert_eq!(format_component(-0.125), "-0.13");
        assert_eq!(format_component(0.375), "0.38");
        assert_eq!(format_component(0.625), "0.63");
        assert_eq!(format_component(1.125), "1.13");
        assert_eq!(format_component(-2.875), "-2.88");
        // Not halfway: 0.0625 is 6.25 hundredths, 1.005 is just below 1.005.
        assert_eq!(format_component(0.0625), "0.06");
        assert_eq!(format_component(1.005), "1.00");
        assert_eq!(format_component(0.25), "0.25");
        assert_eq!(format_component(-0.001), "-0.00");
    }

    #[test]
    fn vector_display() {
        let v = SensorVector {
            x: 1.0,
            y: -0.5,
            z: f64::NAN,
        };
        assert_eq!(v.to_string(), "(1.00, -0.50, NaN)");
        assert!(!v.is_finite());
    }

    #[test]
    fn raw_field_serializes_as_hex() {
        let field = RawField(vec![0x0a, 0xff]);
        assert_eq!(serde_json::to_string(&field).unwrap(), "\"0a ff\"");
        assert_eq!(field.to_string(), "0a ff");
    }

    #[test]
    fn non_finite_components_serialize_as_null() {
        let v = SensorVector {
            x: f64::NAN,
            y: 1.5,
            z: f64::INFINITY,
        };
        assert_eq!(
            serde_json::to_string(&v).unwrap(),
            r#"{"x":null,"y":1.5,"z":null}"#
        );
    }
}
