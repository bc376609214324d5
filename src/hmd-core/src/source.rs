// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Transport seam: endpoints that deliver opaque report buffers.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::DynResult;

/// USB vendor id of the headset sensor module.
pub const USB_VID: u16 = 0x3318;
/// USB product id of the headset sensor module.
pub const USB_PID: u16 = 0x0424;
/// HID report id used for the start-streaming command.
pub const START_STREAM_REPORT_ID: u8 = 0x00;
/// Command that asks the sensor module to start streaming reports.
pub const START_STREAM_COMMAND: [u8; 9] = [0xaa, 0xc5, 0xd1, 0x21, 0x42, 0x04, 0x00, 0x19, 0x01];

/// Alias to reduce type complexity in ReportSource.
pub type ReportFuture<'a> =
    Pin<Box<dyn Future<Output = DynResult<Option<Vec<u8>>>> + Send + 'a>>;

/// Static description of one transport endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointInfo {
    /// Position of the endpoint within its transport.
    pub index: usize,
    /// Transport name (e.g. "hidraw", "replay").
    pub transport: String,
    /// Device path or other human-readable address.
    pub address: String,
}

/// One buffer delivered by an endpoint. Not necessarily a sensor report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub endpoint: usize,
    pub data: Vec<u8>,
}

/// A stream of opaque report buffers from one endpoint.
pub trait ReportSource: Send {
    fn info(&self) -> &EndpointInfo;

    /// Send the start command. Sources that stream unprompted ignore it.
    fn start<'a>(
        &'a mut self,
        _command: &'a [u8],
    ) -> Pin<Box<dyn Future<Output = DynResult<()>> + Send + 'a>> {
        Box::pin(std::future::ready(Ok(())))
    }

    /// Wait for the next buffer. `Ok(None)` means the stream ended.
    ///
    /// Must be cancel-safe: readers race this against shutdown, and a
    /// dropped call may not consume a buffer.
    fn next_report<'a>(&'a mut self) -> ReportFuture<'a>;
}
