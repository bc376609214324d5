// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use hmd_core::{DynResult, ReportSource};

mod dummy;
#[cfg(all(feature = "hidraw", unix))]
mod hidraw;
mod replay;

pub use dummy::synthetic_report;
#[cfg(all(feature = "hidraw", unix))]
pub use hidraw::{discover, HidrawSource};
pub use replay::{parse_capture, ReplaySource};

/// Connection details for instantiating a transport.
#[derive(Debug, Clone)]
pub enum TransportAccess {
    /// Linux hidraw nodes. An empty endpoint list means discover by USB id.
    Hidraw {
        endpoints: Vec<PathBuf>,
        vendor_id: u16,
        product_id: u16,
    },
    /// Text capture file, one frame per line.
    Replay { path: PathBuf, interval: Duration },
    /// Synthetic frames, no hardware required.
    Dummy { interval: Duration },
}

impl TransportAccess {
    fn kind(&self) -> &'static str {
        match self {
            TransportAccess::Hidraw { .. } => "hidraw",
            TransportAccess::Replay { .. } => "replay",
            TransportAccess::Dummy { .. } => "dummy",
        }
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Unknown transport: {0} (available: {1})")]
    Unknown(String, String),

    #[error("{transport} transport does not support {access} access")]
    AccessMismatch {
        transport: &'static str,
        access: &'static str,
    },

    #[error("No hidraw device found for {vendor_id:04x}:{product_id:04x}")]
    NoDevice { vendor_id: u16, product_id: u16 },

    #[error("Failed to open {0}: {1}")]
    Open(PathBuf, std::io::Error),

    #[error("Invalid capture line {line}: {reason}")]
    Capture { line: usize, reason: String },
}

pub type TransportFactory = fn(TransportAccess) -> DynResult<Vec<Box<dyn ReportSource>>>;

/// Context for registering and instantiating transports.
#[derive(Clone)]
pub struct RegistrationContext {
    factories: HashMap<String, TransportFactory>,
}

impl RegistrationContext {
    /// Create a new empty registration context.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a transport factory under a stable name (e.g. "hidraw").
    pub fn register_transport(&mut self, name: &str, factory: TransportFactory) {
        let key = normalize_name(name);
        self.factories.insert(key, factory);
    }

    /// Check whether a transport name is registered.
    pub fn is_transport_registered(&self, name: &str) -> bool {
        let key = normalize_name(name);
        self.factories.contains_key(&key)
    }

    /// List registered transport names.
    pub fn registered_transports(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Open every endpoint of the selected transport.
    pub fn build_sources(
        &self,
        name: &str,
        access: TransportAccess,
    ) -> DynResult<Vec<Box<dyn ReportSource>>> {
        let key = normalize_name(name);
        let factory = self.factories.get(&key).ok_or_else(|| {
            TransportError::Unknown(name.to_string(), self.registered_transports().join(", "))
        })?;
        factory(access)
    }
}

impl Default for RegistrationContext {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_name(name: &str) -> String {
    name.to_ascii_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Register all built-in transports enabled by features on a context.
pub fn register_builtin_transports_on(context: &mut RegistrationContext) {
    context.register_transport("dummy", dummy_factory);
    context.register_transport("replay", replay_factory);
    #[cfg(all(feature = "hidraw", unix))]
    context.register_transport("hidraw", hidraw_factory);
}

fn dummy_factory(access: TransportAccess) -> DynResult<Vec<Box<dyn ReportSource>>> {
    match access {
        TransportAccess::Dummy { interval } => Ok(dummy::open_endpoints(interval)),
        other => Err(TransportError::AccessMismatch {
            transport: "dummy",
            access: other.kind(),
        }
        .into()),
    }
}

fn replay_factory(access: TransportAccess) -> DynResult<Vec<Box<dyn ReportSource>>> {
    match access {
        TransportAccess::Replay { path, interval } => {
            Ok(replay::open_endpoints(&path, interval)?)
        }
        other => Err(TransportError::AccessMismatch {
            transport: "replay",
            access: other.kind(),
        }
        .into()),
    }
}

#[cfg(all(feature = "hidraw", unix))]
fn hidraw_factory(access: TransportAccess) -> DynResult<Vec<Box<dyn ReportSource>>> {
    match access {
        TransportAccess::Hidraw {
            endpoints,
            vendor_id,
            product_id,
        } => {
            let paths = if endpoints.is_empty() {
                discover(vendor_id, product_id)?
            } else {
                endpoints
            };
            let mut sources: Vec<Box<dyn ReportSource>> = Vec::with_capacity(paths.len());
            for (index, path) in paths.iter().enumerate() {
                sources.push(Box::new(HidrawSource::open(index, path)?));
            }
            Ok(sources)
        }
        other => Err(TransportError::AccessMismatch {
            transport: "hidraw",
            access: other.kind(),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_transports_are_registered() {
        let mut ctx = RegistrationContext::new();
        register_builtin_transports_on(&mut ctx);
        assert!(ctx.is_transport_registered("dummy"));
        assert!(ctx.is_transport_registered("Re-Play"));
        #[cfg(all(feature = "hidraw", unix))]
        assert!(ctx.is_transport_registered("hidraw"));
        assert!(!ctx.is_transport_registered("bluetooth"));
    }

    #[test]
    fn unknown_transport_lists_available() {
        let mut ctx = RegistrationContext::new();
        ctx.register_transport("dummy", dummy_factory);
        let err = ctx
            .build_sources(
                "usb",
                TransportAccess::Dummy {
                    interval: Duration::from_millis(1),
                },
            )
            .err()
            .expect("unknown transport");
        assert_eq!(err.to_string(), "Unknown transport: usb (available: dummy)");
    }

    #[test]
    fn access_mismatch_is_rejected() {
        let mut ctx = RegistrationContext::new();
        register_builtin_transports_on(&mut ctx);
        let err = ctx
            .build_sources(
                "dummy",
                TransportAccess::Replay {
                    path: PathBuf::from("capture.txt"),
                    interval: Duration::ZERO,
                },
            )
            .err()
            .expect("mismatched access");
        assert_eq!(
            err.to_string(),
            "dummy transport does not support replay access"
        );
    }

    #[test]
    fn dummy_opens_sensor_and_control_endpoints() {
        let mut ctx = RegistrationContext::default();
        register_builtin_transports_on(&mut ctx);
        let sources = ctx
            .build_sources(
                "dummy",
                TransportAccess::Dummy {
                    interval: Duration::from_millis(1),
                },
            )
            .unwrap();
        let indexes: Vec<usize> = sources.iter().map(|s| s.info().index).collect();
        assert_eq!(indexes, vec![0, 1]);
    }
}
