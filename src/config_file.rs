//! Configuration file handling.
//!
//! The installer is configured with a small JSON file; every field has a
//! default so an empty object (or no file at all) is a valid configuration:
//!
//! ```json
//! {
//!   "vendor_dir": "vendor",
//!   "installed_path": "vendor/installed.json",
//!   "registry_path": "registry.json",
//!   "temp_dir": "/var/tmp",
//!   "platform": "joomlatools-platform"
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::types::Platform;

/// Installer configuration that can be saved/loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallerConfig {
    /// Root directory packages are placed under
    pub vendor_dir: PathBuf,

    /// Installed-package repository file
    pub installed_path: PathBuf,

    /// Host extension registry file. Missing means the host is not set up.
    pub registry_path: PathBuf,

    /// Where preserved manifests go on uninstall (system temp dir if unset)
    pub temp_dir: Option<PathBuf>,

    /// Host platform flavour
    pub platform: Platform,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            vendor_dir: PathBuf::from("vendor"),
            installed_path: PathBuf::from("vendor/installed.json"),
            registry_path: PathBuf::from("registry.json"),
            temp_dir: None,
            platform: Platform::Joomla,
        }
    }
}

impl InstallerConfig {
    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize configuration to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration from {:?}", path.as_ref()))?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse configuration JSON")?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.vendor_dir.as_os_str().is_empty() {
            anyhow::bail!("vendor_dir must be specified");
        }
        if self.installed_path.as_os_str().is_empty() {
            anyhow::bail!("installed_path must be specified");
        }
        if self.registry_path.as_os_str().is_empty() {
            anyhow::bail!("registry_path must be specified");
        }
        if let Some(temp_dir) = &self.temp_dir {
            if !temp_dir.is_dir() {
                anyhow::bail!("temp_dir {:?} is not a directory", temp_dir);
            }
        }

        Ok(())
    }

    /// Directory for preserved manifests
    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}
