// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Dummy transport for development and testing.
//!
//! Endpoint 0 streams synthetic 64-byte sensor reports; endpoint 1 streams
//! short control frames the way a sibling HID interface does.
//! No hardware required.

use std::time::Duration;

use tokio::time;

use hmd_core::source::ReportFuture;
use hmd_core::{EndpointInfo, ReportSource};

const CONTROL_FRAME_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DummyKind {
    Sensor,
    Control,
}

pub struct DummySource {
    info: EndpointInfo,
    kind: DummyKind,
    interval: Duration,
    seq: u32,
}

impl DummySource {
    fn new(index: usize, kind: DummyKind, interval: Duration) -> Self {
        let address = match kind {
            DummyKind::Sensor => "dummy:sensor",
            DummyKind::Control => "dummy:control",
        };
        Self {
            info: EndpointInfo {
                index,
                transport: "dummy".to_string(),
                address: address.to_string(),
            },
            kind,
            interval,
            seq: 0,
        }
    }

    fn next_frame(&mut self) -> Vec<u8> {
        let seq = self.seq;
        self.seq = self.seq.wrapping_add(1);
        match self.kind {
            DummyKind::Sensor => synthetic_report(seq).to_vec(),
            DummyKind::Control => {
                let mut frame = vec![0u8; CONTROL_FRAME_LEN];
                frame[0] = 0x02;
                frame[1..5].copy_from_slice(&seq.to_le_bytes());
                frame
            }
        }
    }
}

impl ReportSource for DummySource {
    fn info(&self) -> &EndpointInfo {
        &self.info
    }

    fn next_report<'a>(&'a mut self) -> ReportFuture<'a> {
        Box::pin(async move {
            time::sleep(self.interval).await;
            Ok(Some(self.next_frame()))
        })
    }
}

pub(crate) fn open_endpoints(interval: Duration) -> Vec<Box<dyn ReportSource>> {
    vec![
        Box::new(DummySource::new(0, DummyKind::Sensor, interval)),
        Box::new(DummySource::new(1, DummyKind::Control, interval)),
    ]
}

/// Triangle wave in `-amplitude..=amplitude`.
fn triangle(seq: u32, amplitude: i32) -> i32 {
    let period = (amplitude * 4) as u32;
    let phase = (seq % period) as i32;
    if phase < amplitude * 2 {
        phase - amplitude
    } else {
        3 * amplitude - phase
    }
}

fn axis24(value: i32) -> [u8; 3] {
    let b = value.to_le_bytes();
    [b[0], b[1], b[2]]
}

/// Build a 64-byte sensor report for sequence number `seq`.
///
/// Angular velocity uses scale 1/16, acceleration 1/1000 with ~1 g on z,
/// and the magnetic group carries its scale in reversed byte order with
/// offset-binary axes.
pub fn synthetic_report(seq: u32) -> [u8; 64] {
    let mut buf = [0u8; 64];
    buf[0..2].copy_from_slice(&[0x01, 0x02]);
    buf[2..4].copy_from_slice(&(0x0c00u16 + (seq % 64) as u16).to_le_bytes());
    buf[4..12].copy_from_slice(&(u64::from(seq) * 1_000_000).to_le_bytes());

    buf[12..14].copy_from_slice(&1i16.to_le_bytes());
    buf[14..18].copy_from_slice(&16i32.to_le_bytes());
    buf[18..21].copy_from_slice(&axis24(triangle(seq, 800)));
    buf[21..24].copy_from_slice(&axis24(-triangle(seq, 400)));
    buf[24..27].copy_from_slice(&axis24(16));

    buf[27..29].copy_from_slice(&1i16.to_le_bytes());
    buf[29..33].copy_from_slice(&1000i32.to_le_bytes());
    buf[33..36].copy_from_slice(&axis24(triangle(seq, 50)));
    buf[36..39].copy_from_slice(&axis24(0));
    buf[39..42].copy_from_slice(&axis24(1000));

    buf[42..44].copy_from_slice(&1i16.to_be_bytes());
    buf[44..48].copy_from_slice(&1i32.to_be_bytes());
    for (i, offset) in [48usize, 50, 52].into_iter().enumerate() {
        let field = (0x0100 * (i as u16 + 1)) + (seq % 256) as u16;
        buf[offset..offset + 2].copy_from_slice(&field.to_le_bytes());
    }

    buf
}
