//! Installation state classifier
//!
//! Decides whether a package is already present in the host application,
//! independently of the package manager's installed-package bookkeeping. A
//! package can be installed into Joomla by hand long before the package
//! manager ever sees it; that case must become an update, not a second
//! install.
//!
//! # Decision Order
//!
//! | Step | Check                                    | Result               |
//! |------|------------------------------------------|----------------------|
//! | 1    | Package is a reusable component          | installed            |
//! | 2    | Host application unavailable             | not installed        |
//! | 3    | `joomla.installed` marker in install dir | installed            |
//! | 4    | No manifest in install dir               | not installed        |
//! | 5    | Manifest is not a parseable manifest     | repository fallback  |
//! | 6    | No element name in manifest              | not installed        |
//! | 7    | No registry record for (element, type)   | not installed        |
//! | 8    | Registry record                          | installed iff id > 0 |
//!
//! Every lookup is read-only. Ambiguity resolves towards "not installed" so
//! the install path still runs.

use std::path::Path;

use crate::host::Bootstrapper;
use crate::manifest::{Manifest, ManifestStore};
use crate::package_manager::{installed_at, InstalledRepository, PackageFiles};
use crate::types::Package;

/// Marker file recording a manual or legacy installation. Content is ignored.
pub const INSTALLED_MARKER: &str = "joomla.installed";

pub struct InstallationStateClassifier<'a> {
    manifests: &'a dyn ManifestStore,
    bootstrapper: &'a dyn Bootstrapper,
    files: Option<&'a dyn PackageFiles>,
}

impl<'a> InstallationStateClassifier<'a> {
    pub fn new(manifests: &'a dyn ManifestStore, bootstrapper: &'a dyn Bootstrapper) -> Self {
        Self {
            manifests,
            bootstrapper,
            files: None,
        }
    }

    /// Use the base installer's own installed check when a manifest is unreadable
    pub fn with_files(mut self, files: &'a dyn PackageFiles) -> Self {
        self.files = Some(files);
        self
    }

    /// Returns true if `package`, installed at `install_path`, is already
    /// known to the host application.
    pub fn classify(
        &self,
        package: &Package,
        install_path: &Path,
        repo: &dyn InstalledRepository,
    ) -> bool {
        // Resolution succeeding is all a reusable component needs
        if package.is_reusable_component() {
            return true;
        }

        let Some(application) = self.bootstrapper.application() else {
            tracing::debug!(
                "Warning: Can not instantiate application to check if {} is installed",
                package.name
            );
            return false;
        };

        if install_path.join(INSTALLED_MARKER).exists() {
            tracing::debug!("{} carries an {} marker", package.name, INSTALLED_MARKER);
            return true;
        }

        let Some(manifest_path) = self.manifests.package_manifest(install_path) else {
            return false;
        };

        let manifest = match Manifest::from_file(&manifest_path) {
            Ok(manifest) => manifest,
            Err(err) => {
                tracing::debug!("{}; checking installed repository instead", err);
                return match self.files {
                    Some(files) => files.is_installed(repo, package),
                    None => installed_at(repo, package, install_path),
                };
            }
        };

        let Some(element) = self
            .manifests
            .element_name(install_path)
            .filter(|element| !element.is_empty())
        else {
            return false;
        };

        match application.extension(&element, &manifest.extension_type) {
            Ok(Some(record)) => record.is_installed(),
            Ok(None) => false,
            Err(err) => {
                tracing::debug!(
                    "Registry lookup for {} ({}) failed: {}",
                    element,
                    manifest.extension_type,
                    err
                );
                false
            }
        }
    }
}
