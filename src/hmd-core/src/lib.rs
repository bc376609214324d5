// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

pub mod math;
pub mod report;
pub mod source;

pub type DynResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub use report::{DecodedReport, RawField, ScalePair, SensorReading, SensorVector};
pub use source::{EndpointInfo, RawFrame, ReportSource, START_STREAM_COMMAND, USB_PID, USB_VID};
