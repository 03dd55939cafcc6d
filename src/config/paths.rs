//! Path management for bizlog
//!
//! ## Path Resolution Order
//!
//! 1. `BIZLOG_HOME` environment variable (if set)
//! 2. Unix (Linux/macOS): `$XDG_CONFIG_HOME/bizlog` or `~/.config/bizlog`
//! 3. Windows: `%APPDATA%\bizlog`

use std::path::PathBuf;

use crate::error::BizlogError;

/// Manages all paths used by bizlog
#[derive(Debug, Clone)]
pub struct BizlogPaths {
    base_dir: PathBuf,
}

impl BizlogPaths {
    /// Create a new BizlogPaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, BizlogError> {
        let base_dir = if let Ok(custom) = std::env::var("BIZLOG_HOME") {
            PathBuf::from(custom)
        } else {
            resolve_default_path()?
        };

        Ok(Self { base_dir })
    }

    /// Create BizlogPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to the audit log
    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    /// Get the path to the operation catalog
    pub fn specs_file(&self) -> PathBuf {
        self.base_dir.join("operations.yaml")
    }

    /// Ensure the base directory exists
    pub fn ensure_directories(&self) -> Result<(), BizlogError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| BizlogError::Io(format!("Failed to create base directory: {}", e)))
    }
}

#[cfg(not(windows))]
fn resolve_default_path() -> Result<PathBuf, BizlogError> {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(config_home).join("bizlog"));
    }
    let home = std::env::var("HOME")
        .map_err(|_| BizlogError::Config("HOME environment variable not set".into()))?;
    Ok(PathBuf::from(home).join(".config").join("bizlog"))
}

#[cfg(windows)]
fn resolve_default_path() -> Result<PathBuf, BizlogError> {
    let appdata = std::env::var("APPDATA")
        .map_err(|_| BizlogError::Config("Could not determine APPDATA directory".into()))?;
    Ok(PathBuf::from(appdata).join("bizlog"))
}
