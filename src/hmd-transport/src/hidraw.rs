// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Linux hidraw transport.
//!
//! Each USB HID interface of the headset shows up as its own
//! `/dev/hidrawN` node. Every opened node gets the start command; only
//! the sensor interface answers with 64-byte reports.

use std::fs::{File, OpenOptions};
use std::future::Future;
use std::io::{self, Read, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use tokio::io::unix::AsyncFd;
use tracing::{debug, info};

use hmd_core::source::{ReportFuture, START_STREAM_REPORT_ID};
use hmd_core::{DynResult, EndpointInfo, ReportSource};

use crate::TransportError;

const SYSFS_HIDRAW_DIR: &str = "/sys/class/hidraw";
const DEV_DIR: &str = "/dev";
const READ_BUFFER_LEN: usize = 1024;

/// One hidraw node, read through readiness polling on a non-blocking fd.
///
/// A pending `next_report` can be dropped without losing a report: bytes
/// are only consumed by the read that follows a readiness event.
pub struct HidrawSource {
    info: EndpointInfo,
    fd: AsyncFd<File>,
    buf: Vec<u8>,
}

impl HidrawSource {
    /// Open a hidraw node for reading and writing.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(index: usize, path: &Path) -> Result<Self, TransportError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(path)
            .map_err(|e| TransportError::Open(path.to_path_buf(), e))?;
        let source = Self::from_file(index, path.display().to_string(), file)
            .map_err(|e| TransportError::Open(path.to_path_buf(), e))?;
        info!("Opened hidraw endpoint {}: {}", index, path.display());
        Ok(source)
    }

    /// Wrap an already open non-blocking, packet-oriented file descriptor.
    pub fn from_file(index: usize, address: String, file: File) -> io::Result<Self> {
        Ok(Self {
            info: EndpointInfo {
                index,
                transport: "hidraw".to_string(),
                address,
            },
            fd: AsyncFd::new(file)?,
            buf: vec![0u8; READ_BUFFER_LEN],
        })
    }
}

impl ReportSource for HidrawSource {
    fn info(&self) -> &EndpointInfo {
        &self.info
    }

    fn start<'a>(
        &'a mut self,
        command: &'a [u8],
    ) -> Pin<Box<dyn Future<Output = DynResult<()>> + Send + 'a>> {
        Box::pin(async move {
            // hidraw expects the report id as the first byte of a write.
            let mut packet = Vec::with_capacity(command.len() + 1);
            packet.push(START_STREAM_REPORT_ID);
            packet.extend_from_slice(command);

            let written = loop {
                let mut guard = self.fd.writable().await?;
                if let Ok(result) = guard.try_io(|inner| inner.get_ref().write(&packet)) {
                    break result?;
                }
            };
            if written != packet.len() {
                return Err(format!(
                    "Short write to {}: {} of {} bytes",
                    self.info.address,
                    written,
                    packet.len()
                )
                .into());
            }
            debug!(
                "Sent start command to {} ({} bytes)",
                self.info.address,
                packet.len()
            );
            Ok(())
        })
    }

    fn next_report<'a>(&'a mut self) -> ReportFuture<'a> {
        Box::pin(async move {
            let n = loop {
                let mut guard = self.fd.readable().await?;
                if let Ok(result) = guard.try_io(|inner| inner.get_ref().read(&mut self.buf)) {
                    break result?;
                }
            };
            if n == 0 {
                return Ok(None);
            }
            Ok(Some(self.buf[..n].to_vec()))
        })
    }
}

/// Check a sysfs `uevent` for `HID_ID=<bus>:<vendor>:<product>`.
fn uevent_matches(uevent: &str, vendor_id: u16, product_id: u16) -> bool {
    uevent
        .lines()
        .filter_map(|line| line.strip_prefix("HID_ID="))
        .any(|id| {
            let mut parts = id.split(':').skip(1);
            let vid = parts.next().and_then(|v| u32::from_str_radix(v, 16).ok());
            let pid = parts.next().and_then(|p| u32::from_str_radix(p, 16).ok());
            vid == Some(u32::from(vendor_id)) && pid == Some(u32::from(product_id))
        })
}

fn discover_in(
    sysfs_dir: &Path,
    dev_dir: &Path,
    vendor_id: u16,
    product_id: u16,
) -> Result<Vec<PathBuf>, TransportError> {
    let entries = std::fs::read_dir(sysfs_dir)
        .map_err(|e| TransportError::Open(sysfs_dir.to_path_buf(), e))?;

    let mut found: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            std::fs::read_to_string(entry.path().join("device").join("uevent"))
                .map(|uevent| uevent_matches(&uevent, vendor_id, product_id))
                .unwrap_or(false)
        })
        .map(|entry| dev_dir.join(entry.file_name()))
        .collect();

    if found.is_empty() {
        return Err(TransportError::NoDevice {
            vendor_id,
            product_id,
        });
    }
    found.sort();
    Ok(found)
}

/// Find the hidraw nodes of every interface with the given USB ids.
pub fn discover(vendor_id: u16, product_id: u16) -> Result<Vec<PathBuf>, TransportError> {
    let found = discover_in(
        Path::new(SYSFS_HIDRAW_DIR),
        Path::new(DEV_DIR),
        vendor_id,
        product_id,
    )?;
    info!(
        "Discovered {} hidraw endpoint(s) for {:04x}:{:04x}",
        found.len(),
        vendor_id,
        product_id
    );
    Ok(found)
}
