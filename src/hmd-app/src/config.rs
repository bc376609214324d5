// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Shared `hmd-rs.toml` loading.
//!
//! One file carries a section per tool (`[hmd-monitor]`, ...). A tool's
//! section is looked up in:
//! 1. the path passed with `--config` ([`ConfigFile::load_from_file`])
//! 2. `./hmd-rs.toml`
//! 3. `~/.config/hmd-rs/hmd-rs.toml` (platform config dir)
//! 4. `/etc/hmd-rs/hmd-rs.toml`
//!
//! During the search, files without the section are skipped. A file named
//! explicitly must contain it.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

/// Name of the shared configuration file.
pub const CONFIG_FILE_NAME: &str = "hmd-rs.toml";
const CONFIG_DIR_NAME: &str = "hmd-rs";
const SYSTEM_CONFIG_DIR: &str = "/etc/hmd-rs";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    ReadError(PathBuf, String),

    #[error("Failed to parse config file {0}: {1}")]
    ParseError(PathBuf, String),

    #[error("Config file {0} has no [{1}] section")]
    MissingSection(PathBuf, &'static str),
}

/// Candidate config files in lookup order, excluding `--config`.
pub fn config_search_paths() -> Vec<PathBuf> {
    let user = dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME));
    std::iter::once(PathBuf::from(CONFIG_FILE_NAME))
        .chain(user)
        .chain(std::iter::once(
            Path::new(SYSTEM_CONFIG_DIR).join(CONFIG_FILE_NAME),
        ))
        .collect()
}

/// A parsed config file, kept as a table so each tool picks its own section.
struct ConfigDocument {
    path: PathBuf,
    table: toml::Table,
}

impl ConfigDocument {
    fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e.to_string()))?;
        let table: toml::Table = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        Ok(Self {
            path: path.to_path_buf(),
            table,
        })
    }

    /// Deserialize `[key]` with serde defaults, `None` when absent.
    fn section<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        self.table
            .get(key)
            .cloned()
            .map(|value| {
                value
                    .try_into::<T>()
                    .map_err(|e| ConfigError::ParseError(self.path.clone(), e.to_string()))
            })
            .transpose()
    }
}

/// First of `paths` that exists and has the section, or the default config.
fn first_with_section<T: ConfigFile>(
    paths: &[PathBuf],
) -> Result<(T, Option<PathBuf>), ConfigError> {
    for path in paths.iter().filter(|path| path.exists()) {
        let document = ConfigDocument::read(path)?;
        if let Some(cfg) = document.section::<T>(T::section_key())? {
            return Ok((cfg, Some(document.path)));
        }
    }
    Ok((T::default(), None))
}

/// A tool configuration stored as one section of `hmd-rs.toml`.
pub trait ConfigFile: Sized + Default + DeserializeOwned {
    /// Section key, e.g. `"hmd-monitor"`.
    fn section_key() -> &'static str;

    /// Load the section from an explicitly named file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        ConfigDocument::read(path)?
            .section(Self::section_key())?
            .ok_or_else(|| ConfigError::MissingSection(path.to_path_buf(), Self::section_key()))
    }

    /// Walk [`config_search_paths`]. Returns the config and the file it came
    /// from, or `(Default::default(), None)` when no file has the section.
    fn load_from_default_paths() -> Result<(Self, Option<PathBuf>), ConfigError> {
        first_with_section(&config_search_paths())
    }
}
