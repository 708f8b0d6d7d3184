// SPDX-License-Identifier: MIT OR Apache-2.0

//! YAML file option source adapter.
//!
//! This module provides an [`OptionsSource`] that reads resolver options from YAML, either from
//! a specific file or from the OS-appropriate configuration directory.

use crate::domain::{OptionsOverlay, RegistryError, Result};
use crate::ports::OptionsSource;
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

/// Maximum allowed size for option files (1MB)
const MAX_YAML_FILE_SIZE: u64 = 1024 * 1024;

/// File name looked up in the default configuration directory.
const DEFAULT_FILE_NAME: &str = "resolver.yaml";

/// Option source adapter for YAML files.
///
/// The file holds a flat mapping of option names to values; unknown names are rejected.
///
/// ```yaml
/// initial_string_chars: 512
/// max_grow_attempts: 8
/// max_path_chars: 256
/// ```
///
/// # Priority
///
/// YAML files have a priority of 1, so environment variables (priority 2) override them.
///
/// # Examples
///
/// ```rust
/// use hexreg::adapters::YamlOptionsFile;
/// use hexreg::ports::OptionsSource;
///
/// let source = YamlOptionsFile::from_str("max_grow_attempts: 4").unwrap();
/// assert_eq!(source.load().unwrap().max_grow_attempts, Some(4));
/// ```
#[derive(Debug, Clone)]
pub struct YamlOptionsFile {
    /// Path of the file, if the options came from one
    file_path: Option<PathBuf>,
    /// Parsed overrides
    overlay: OptionsOverlay,
}

impl YamlOptionsFile {
    /// Parses options from YAML text.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        Ok(Self {
            file_path: None,
            overlay: Self::parse(content)?,
        })
    }

    /// Loads options from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file_path = path.as_ref().to_path_buf();
        let display_name = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("<unknown>")
            .to_string();

        let canonical_path = file_path
            .canonicalize()
            .map_err(|e| RegistryError::OptionsError {
                message: format!("Invalid or inaccessible path: {}", display_name),
                source: Some(Box::new(e)),
            })?;

        let metadata = fs::metadata(&canonical_path)?;
        if metadata.len() > MAX_YAML_FILE_SIZE {
            return Err(RegistryError::OptionsError {
                message: format!(
                    "Options file too large: {} bytes (max {} bytes)",
                    metadata.len(),
                    MAX_YAML_FILE_SIZE
                ),
                source: None,
            });
        }

        let content = fs::read_to_string(&canonical_path)?;
        let overlay = Self::parse(&content)?;
        tracing::debug!("Loaded resolver options from {}", canonical_path.display());

        Ok(Self {
            file_path: Some(canonical_path),
            overlay,
        })
    }

    /// Loads options from `<config dir>/resolver.yaml` for the given application.
    pub fn from_default_location(app_name: &str, qualifier: &str) -> Result<Self> {
        let path = Self::default_path(app_name, qualifier)?;
        Self::from_file(path)
    }

    /// Returns the default option file path for the given application.
    pub fn default_path(app_name: &str, qualifier: &str) -> Result<PathBuf> {
        let dirs =
            ProjectDirs::from(qualifier, "", app_name).ok_or_else(|| RegistryError::OptionsError {
                message: "Could not determine the configuration directory".to_string(),
                source: None,
            })?;
        Ok(dirs.config_dir().join(DEFAULT_FILE_NAME))
    }

    /// Returns the path the options were loaded from, if any.
    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    fn parse(content: &str) -> Result<OptionsOverlay> {
        if content.trim().is_empty() {
            return Ok(OptionsOverlay::default());
        }
        serde_yaml::from_str(content).map_err(|e| RegistryError::OptionsError {
            message: format!("Failed to parse YAML: {}", e),
            source: Some(Box::new(e)),
        })
    }
}

impl OptionsSource for YamlOptionsFile {
    fn name(&self) -> &str {
        "yaml-file"
    }

    fn priority(&self) -> u8 {
        1
    }

    fn load(&self) -> Result<OptionsOverlay> {
        Ok(self.overlay.clone())
    }
}
