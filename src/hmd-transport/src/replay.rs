// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Replay transport: frames read from a text capture file.
//!
//! One frame per line as space-separated hex bytes, the same form the
//! decoder prints. A line may start with `@<n>` to assign it to endpoint
//! `n` (default 0). `#` starts a comment; blank lines are skipped.

use std::collections::{BTreeMap, VecDeque};
use std::path::Path;
use std::time::Duration;

use tokio::time;
use tracing::debug;

use hmd_core::source::ReportFuture;
use hmd_core::{EndpointInfo, ReportSource};

use crate::TransportError;

pub struct ReplaySource {
    info: EndpointInfo,
    frames: VecDeque<Vec<u8>>,
    interval: Duration,
}

impl ReplaySource {
    pub fn new(info: EndpointInfo, frames: Vec<Vec<u8>>, interval: Duration) -> Self {
        Self {
            info,
            frames: frames.into(),
            interval,
        }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl ReportSource for ReplaySource {
    fn info(&self) -> &EndpointInfo {
        &self.info
    }

    fn next_report<'a>(&'a mut self) -> ReportFuture<'a> {
        Box::pin(async move {
            if self.frames.is_empty() {
                return Ok(None);
            }
            // Pace before taking the frame so a dropped call loses nothing.
            if !self.interval.is_zero() {
                time::sleep(self.interval).await;
            }
            Ok(self.frames.pop_front())
        })
    }
}

/// Parse a capture into frames grouped by endpoint, in file order.
pub fn parse_capture(text: &str) -> Result<BTreeMap<usize, Vec<Vec<u8>>>, TransportError> {
    let mut endpoints: BTreeMap<usize, Vec<Vec<u8>>> = BTreeMap::new();

    for (idx, raw_line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        let (endpoint, byte_tokens) = match tokens.split_first() {
            Some((first, rest)) if first.starts_with('@') => {
                let tag = &first[1..];
                let endpoint: usize = tag.parse().map_err(|_| TransportError::Capture {
                    line: line_no,
                    reason: format!("invalid endpoint tag '@{}'", tag),
                })?;
                (endpoint, rest)
            }
            _ => (0, &tokens[..]),
        };

        let mut frame = Vec::with_capacity(byte_tokens.len());
        for token in byte_tokens {
            if token.len() > 2 {
                return Err(TransportError::Capture {
                    line: line_no,
                    reason: format!("'{}' is not a single byte", token),
                });
            }
            let byte = u8::from_str_radix(token, 16).map_err(|_| TransportError::Capture {
                line: line_no,
                reason: format!("'{}' is not a hex byte", token),
            })?;
            frame.push(byte);
        }
        endpoints.entry(endpoint).or_default().push(frame);
    }

    Ok(endpoints)
}

pub(crate) fn open_endpoints(
    path: &Path,
    interval: Duration,
) -> Result<Vec<Box<dyn ReportSource>>, TransportError> {
    let text =
        std::fs::read_to_string(path).map_err(|e| TransportError::Open(path.to_path_buf(), e))?;
    let endpoints = parse_capture(&text)?;
    debug!(
        "Replay capture {}: {} endpoint(s)",
        path.display(),
        endpoints.len()
    );

    Ok(endpoints
        .into_iter()
        .map(|(index, frames)| {
            let info = EndpointInfo {
                index,
                transport: "replay".to_string(),
                address: format!("{}@{}", path.display(), index),
            };
            Box::new(ReplaySource::new(info, frames, interval)) as Box<dyn ReportSource>
        })
        .collect())
}
