// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Decoder for the 64-byte inertial/magnetic sensor report of the headset.
//!
//! Fields are carved left to right with a cursor: signature, temperature,
//! timestamp, then angular velocity, acceleration and magnetic field groups.
//! Each group carries a multiplier, a divisor and three axis fields; the
//! groups differ only in the parameters held by their [`GroupLayout`].

use std::fmt;

use hmd_core::math::{read_le_signed, scale_pair};
use hmd_core::report::{DecodedReport, RawField, SensorReading, SensorVector};

/// Length of a sensor report. Any other length is not a sensor report.
pub const REPORT_LEN: usize = 64;

const SIGNATURE_LEN: usize = 2;
const TEMPERATURE_LEN: usize = 2;
const TIMESTAMP_LEN: usize = 8;
const MULTIPLIER_LEN: usize = 2;
const DIVISOR_LEN: usize = 4;

/// Per-group decode parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupLayout {
    /// Prefix of the multiplier and divisor lines.
    pub scale_name: &'static str,
    /// Name of the vector line, also the prefix of the axis lines.
    pub vector_name: &'static str,
    /// Width of each axis field in bytes.
    pub axis_width: usize,
    /// XOR the sign-extended top axis byte with 0x80 (offset-binary axes).
    pub bias_flip: bool,
    /// Reverse multiplier and divisor byte order before interpretation.
    pub reversed_scale: bool,
}

impl GroupLayout {
    /// Bytes consumed by the group on the wire.
    pub const fn wire_len(&self) -> usize {
        MULTIPLIER_LEN + DIVISOR_LEN + 3 * self.axis_width
    }
}

pub const ANGULAR_VELOCITY: GroupLayout = GroupLayout {
    scale_name: "angular",
    vector_name: "angular_velocity",
    axis_width: 3,
    bias_flip: false,
    reversed_scale: false,
};

pub const ACCELERATION: GroupLayout = GroupLayout {
    scale_name: "acceleration",
    vector_name: "acceleration",
    axis_width: 3,
    bias_flip: false,
    reversed_scale: false,
};

// The magnetometer registers store the scale big-end first and the axes as
// offset binary.
pub const MAGNETIC: GroupLayout = GroupLayout {
    scale_name: "magnetic",
    vector_name: "magnetic",
    axis_width: 2,
    bias_flip: true,
    reversed_scale: true,
};

/// Groups in wire order.
pub const GROUPS: [GroupLayout; 3] = [ANGULAR_VELOCITY, ACCELERATION, MAGNETIC];

/// Bytes of a report covered by decoded fields; the rest is ignored.
pub const DECODED_LEN: usize = SIGNATURE_LEN
    + TEMPERATURE_LEN
    + TIMESTAMP_LEN
    + ANGULAR_VELOCITY.wire_len()
    + ACCELERATION.wire_len()
    + MAGNETIC.wire_len();

struct FieldCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> FieldCursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let field = self.buf.get(self.pos..self.pos + len)?;
        self.pos += len;
        Some(field)
    }

    fn take_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        self.take(N)?.try_into().ok()
    }
}

/// Decode one report buffer.
///
/// Returns `None` when the buffer is not exactly [`REPORT_LEN`] bytes; such
/// buffers come from sibling endpoints and are not an error. A zero divisor
/// produces non-finite vector components.
pub fn decode_report(buf: &[u8]) -> Option<DecodedReport> {
    if buf.len() != REPORT_LEN {
        return None;
    }

    let mut cursor = FieldCursor::new(buf);
    let signature = RawField::from(cursor.take(SIGNATURE_LEN)?);
    let temperature = RawField::from(cursor.take(TEMPERATURE_LEN)?);
    let timestamp = RawField::from(cursor.take(TIMESTAMP_LEN)?);
    let angular_velocity = decode_group(&mut cursor, &ANGULAR_VELOCITY)?;
    let acceleration = decode_group(&mut cursor, &ACCELERATION)?;
    let magnetic = decode_group(&mut cursor, &MAGNETIC)?;

    Some(DecodedReport {
        signature,
        temperature,
        timestamp,
        angular_velocity,
        acceleration,
        magnetic,
    })
}

fn decode_group(cursor: &mut FieldCursor<'_>, layout: &GroupLayout) -> Option<SensorReading> {
    let multiplier: [u8; MULTIPLIER_LEN] = cursor.take_array()?;
    let divisor: [u8; DIVISOR_LEN] = cursor.take_array()?;
    let x = cursor.take(layout.axis_width)?;
    let y = cursor.take(layout.axis_width)?;
    let z = cursor.take(layout.axis_width)?;

    let scale = scale_pair(multiplier, divisor, layout.reversed_scale);
    let convert = |axis: &[u8]| scale.apply(read_le_signed(axis, layout.bias_flip));

    Some(SensorReading {
        multiplier: RawField(multiplier.to_vec()),
        divisor: RawField(divisor.to_vec()),
        axes: [x.into(), y.into(), z.into()],
        scale,
        vector: SensorVector {
            x: convert(x),
            y: convert(y),
            z: convert(z),
        },
    })
}

/// Human-readable lines: `name: hex` for raw fields, `name: (x, y, z)` for vectors.
pub fn render_lines(report: &DecodedReport) -> Vec<String> {
    let mut lines = vec![
        format!("signature: {}", report.signature),
        format!("temperature: {}", report.temperature),
        format!("timestamp: {}", report.timestamp),
    ];

    let readings = [
        &report.angular_velocity,
        &report.acceleration,
        &report.magnetic,
    ];
    for (layout, reading) in GROUPS.iter().zip(readings) {
        lines.push(format!("{}_multiplier: {}", layout.scale_name, reading.multiplier));
        lines.push(format!("{}_divisor: {}", layout.scale_name, reading.divisor));
        for (axis, field) in ["x", "y", "z"].iter().zip(&reading.axes) {
            lines.push(format!("{}_{}: {}", layout.vector_name, axis, field));
        }
        lines.push(format!("{}: {}", layout.vector_name, reading.vector));
    }
    lines
}

/// The rendered report, lines joined by `\n`.
pub fn render(report: &DecodedReport) -> String {
    render_lines(report).join("\n")
}

/// Display adapter producing the same text as [`render`].
pub struct ReportText<'a>(pub &'a DecodedReport);

impl fmt::Display for ReportText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(self.0))
    }
}
