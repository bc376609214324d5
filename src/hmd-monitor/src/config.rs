// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! The `[hmd-monitor]` section of `hmd-rs.toml`. File lookup lives in
//! `hmd_app::config`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use hmd_app::{normalize_name, ConfigFile};
use hmd_core::{USB_PID, USB_VID};

const TRANSPORT_TYPES: [&str; 3] = ["hidraw", "replay", "dummy"];
const OUTPUT_FORMATS: [&str; 2] = ["text", "json"];

/// Top-level monitor configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// General settings
    pub general: GeneralConfig,
    /// Where report buffers come from
    pub transport: TransportConfig,
    /// How decoded reports are printed
    pub output: OutputConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: Option<String>,
}

/// Transport selection and addressing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Transport type: "hidraw", "replay" or "dummy" (default hidraw)
    #[serde(rename = "type")]
    pub transport_type: Option<String>,
    /// Explicit hidraw nodes; empty means discover by USB id
    pub endpoints: Vec<PathBuf>,
    /// USB vendor id used for discovery
    pub vendor_id: u16,
    /// USB product id used for discovery
    pub product_id: u16,
    /// Capture file for the replay transport
    pub replay_file: Option<PathBuf>,
    /// Delay between frames for replay and dummy transports
    pub interval_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            transport_type: None,
            endpoints: Vec::new(),
            vendor_id: USB_VID,
            product_id: USB_PID,
            replay_file: None,
            interval_ms: 10,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "text" or "json"
    pub format: String,
    /// Stop after this many decoded reports
    pub count: Option<u64>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
            count: None,
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<(), String> {
        validate_log_level(self.general.log_level.as_deref())?;

        let transport = self
            .transport
            .transport_type
            .as_deref()
            .map(normalize_name)
            .unwrap_or_else(|| "hidraw".to_string());
        if !TRANSPORT_TYPES.contains(&transport.as_str()) {
            return Err(format!(
                "[transport].type '{}' is invalid (expected one of: {})",
                transport,
                TRANSPORT_TYPES.join(", ")
            ));
        }
        if transport == "replay" && self.transport.replay_file.is_none() {
            return Err(
                "[transport].replay_file must be set for replay transport ([transport].type='replay')"
                    .to_string(),
            );
        }
        if self.transport.vendor_id == 0 {
            return Err("[transport].vendor_id must be > 0".to_string());
        }
        if self.transport.product_id == 0 {
            return Err("[transport].product_id must be > 0".to_string());
        }

        if !OUTPUT_FORMATS.contains(&self.output.format.as_str()) {
            return Err(format!(
                "[output].format '{}' is invalid (expected one of: {})",
                self.output.format,
                OUTPUT_FORMATS.join(", ")
            ));
        }
        if self.output.count == Some(0) {
            return Err("[output].count must be > 0 when set".to_string());
        }
        Ok(())
    }

    /// Generate an example configuration wrapped under the `[hmd-monitor]`
    /// section header, suitable for use in a combined `hmd-rs.toml` file.
    pub fn example_combined_toml() -> String {
        #[derive(serde::Serialize)]
        struct Wrapper {
            #[serde(rename = "hmd-monitor")]
            inner: MonitorConfig,
        }
        let example = MonitorConfig {
            general: GeneralConfig {
                log_level: Some("info".to_string()),
            },
            transport: TransportConfig {
                transport_type: Some("hidraw".to_string()),
                endpoints: vec![PathBuf::from("/dev/hidraw0"), PathBuf::from("/dev/hidraw1")],
                ..TransportConfig::default()
            },
            output: OutputConfig::default(),
        };
        toml::to_string_pretty(&Wrapper { inner: example }).unwrap_or_default()
    }
}

fn validate_log_level(level: Option<&str>) -> Result<(), String> {
    if let Some(level) = level {
        match level {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(format!(
                    "[general].log_level '{}' is invalid (expected one of: trace, debug, info, warn, error)",
                    level
                ))
            }
        }
    }
    Ok(())
}

impl ConfigFile for MonitorConfig {
    fn section_key() -> &'static str {
        "hmd-monitor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = MonitorConfig::default();
        assert!(config.transport.transport_type.is_none());
        assert!(config.transport.endpoints.is_empty());
        assert_eq!(config.transport.vendor_id, 0x3318);
        assert_eq!(config.transport.product_id, 0x0424);
        assert_eq!(config.transport.interval_ms, 10);
        assert_eq!(config.output.format, "text");
        assert_eq!(config.output.count, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[general]
log_level = "debug"

[transport]
type = "replay"
replay_file = "capture.txt"
interval_ms = 0
vendor_id = 0x3318
product_id = 0x0424

[output]
format = "json"
count = 5
"#;

        let config: MonitorConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level.as_deref(), Some("debug"));
        assert_eq!(config.transport.transport_type.as_deref(), Some("replay"));
        assert_eq!(
            config.transport.replay_file,
            Some(PathBuf::from("capture.txt"))
        );
        assert_eq!(config.transport.interval_ms, 0);
        assert_eq!(config.output.format, "json");
        assert_eq!(config.output.count, Some(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_example_combined_toml_parses() {
        let example = MonitorConfig::example_combined_toml();
        let table: toml::Table = toml::from_str(&example).unwrap();
        let section = toml::to_string(table.get("hmd-monitor").unwrap()).unwrap();
        let config: MonitorConfig = toml::from_str(&section).unwrap();
        assert_eq!(config.transport.endpoints.len(), 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_combined_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "[other-tool]\nfoo = 1\n\n[hmd-monitor.transport]\ntype = \"dummy\"\n"
        )
        .unwrap();
        let config = MonitorConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.transport.transport_type.as_deref(), Some("dummy"));
        assert_eq!(config.output.format, "text");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = MonitorConfig::default();
        config.general.log_level = Some("loud".to_string());
        assert!(config
            .validate()
            .unwrap_err()
            .starts_with("[general].log_level"));

        let mut config = MonitorConfig::default();
        config.transport.transport_type = Some("bluetooth".to_string());
        assert!(config.validate().unwrap_err().starts_with("[transport].type"));

        let mut config = MonitorConfig::default();
        config.transport.transport_type = Some("replay".to_string());
        assert!(config
            .validate()
            .unwrap_err()
            .starts_with("[transport].replay_file"));

        let mut config = MonitorConfig::default();
        config.transport.vendor_id = 0;
        assert_eq!(
            config.validate().unwrap_err(),
            "[transport].vendor_id must be > 0"
        );

        let mut config = MonitorConfig::default();
        config.output.format = "csv".to_string();
        assert!(config.validate().unwrap_err().starts_with("[output].format"));

        let mut config = MonitorConfig::default();
        config.output.count = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_transport_type_is_normalized() {
        let mut config = MonitorConfig::default();
        config.transport.transport_type = Some("HIDRAW".to_string());
        assert!(config.validate().is_ok());
    }
}
