//! Error handling module for the extension installer
//!
//! Provides centralized error types using thiserror. Soft failures (host not
//! bootstrapped, missing or broken manifests) never surface here: they are
//! logged and degrade classification instead. Only hard precondition
//! violations and real I/O failures become an `InstallerError`.

use std::path::PathBuf;
use thiserror::Error;

use crate::manifest::ManifestError;

/// Main error type for the installer
#[derive(Error, Debug)]
pub enum InstallerError {
    /// IO errors (copying package files, registry and repository files)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors (loading, validation)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Uninstall requested for a package the installed repository does not track
    #[error("Package is not installed: {name}")]
    PackageNotInstalled { name: String },

    /// The package has no source directory to place files from
    #[error("Package {name} has no source directory")]
    MissingSource { name: String },

    /// Manifest could not be located or read while applying a task
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// Host application errors (registry unavailable or failing)
    #[error("Host application error: {0}")]
    Host(String),

    /// Failed to copy a file tree into an install path
    #[error("Failed to copy {from} to {to}: {reason}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        reason: String,
    },
}

/// Result type alias for installer operations
pub type Result<T> = std::result::Result<T, InstallerError>;

impl InstallerError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a host application error
    pub fn host(msg: impl Into<String>) -> Self {
        Self::Host(msg.into())
    }

    /// Create a package-not-installed error
    pub fn not_installed(name: impl Into<String>) -> Self {
        Self::PackageNotInstalled { name: name.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = InstallerError::not_installed("foo/bar");
        assert_eq!(err.to_string(), "Package is not installed: foo/bar");

        let err = InstallerError::config("vendor_dir must be set");
        assert_eq!(err.to_string(), "Configuration error: vendor_dir must be set");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: InstallerError = io_err.into();
        assert!(matches!(err, InstallerError::Io(_)));
    }

    #[test]
    fn test_manifest_error_conversion() {
        let err: InstallerError = ManifestError::NotFound {
            path: PathBuf::from("/vendor/foo"),
        }
        .into();
        assert!(matches!(err, InstallerError::Manifest(_)));
    }
}
