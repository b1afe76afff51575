//! Installer module
//!
//! The entry point the package manager calls for every package it touches.
//! Files are placed by the injected [`PackageFiles`] right away; everything
//! that involves the host application is turned into a [`Task`] on the
//! caller's [`TaskQueue`] and performed later by the drain step.

use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::drain::discard_preserved;
use crate::engine::queue::{Task, TaskKind, TaskQueue};
use crate::error::{InstallerError, Result};
use crate::host::Bootstrapper;
use crate::logic::InstallationStateClassifier;
use crate::manifest::{ManifestError, ManifestStore};
use crate::package_manager::{InstalledRepository, PackageFiles};
use crate::types::{Package, PackageRef, PackageType, Platform};

/// What happened to an uninstall request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UninstallOutcome {
    /// Manifest preserved, task queued and files removed
    Queued,
    /// Manifest could not be preserved; nothing was queued or removed
    Skipped,
}

/// Extension installer composed over a generic file installer
pub struct ExtensionInstaller {
    files: Box<dyn PackageFiles>,
    manifests: Box<dyn ManifestStore>,
    bootstrapper: Box<dyn Bootstrapper>,
    platform: Platform,
    temp_dir: PathBuf,
}

impl ExtensionInstaller {
    /// Create a new installer targeting plain Joomla, preserving manifests in the system temp dir
    pub fn new(
        files: Box<dyn PackageFiles>,
        manifests: Box<dyn ManifestStore>,
        bootstrapper: Box<dyn Bootstrapper>,
    ) -> Self {
        Self {
            files,
            manifests,
            bootstrapper,
            platform: Platform::default(),
            temp_dir: std::env::temp_dir(),
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Directory that receives preserved manifests on uninstall
    pub fn with_temp_dir<P: Into<PathBuf>>(mut self, temp_dir: P) -> Self {
        self.temp_dir = temp_dir.into();
        self
    }

    /// Returns true if this installer handles the given package type
    pub fn supports(&self, package_type: &str) -> bool {
        PackageType::supports(package_type)
    }

    pub fn install_path(&self, package: &Package) -> PathBuf {
        self.files.install_path(package)
    }

    /// The manifest store, including any preserved-manifest overrides
    pub fn manifests(&self) -> &dyn ManifestStore {
        self.manifests.as_ref()
    }

    /// Is the package already present in the host application?
    pub fn is_installed(&self, repo: &dyn InstalledRepository, package: &Package) -> bool {
        let install_path = self.files.install_path(package);
        InstallationStateClassifier::new(self.manifests.as_ref(), self.bootstrapper.as_ref())
            .with_files(self.files.as_ref())
            .classify(package, &install_path, repo)
    }

    /// Place the package's files and queue an install, or an update if the
    /// host already knows the package (or the package forces updates).
    pub fn install(
        &mut self,
        repo: &mut dyn InstalledRepository,
        package: &Package,
        queue: &mut TaskQueue,
    ) -> Result<TaskKind> {
        self.files.install(repo, package)?;

        // Fresh files: a manifest preserved by an earlier uninstall no longer applies
        let install_path = self.files.install_path(package);
        self.manifests.clear_package_manifest(&install_path);
        let package_ref = PackageRef::new(&package.name, &install_path);

        let task = if self.is_installed(&*repo, package) || package.is_forcing_update() {
            tracing::debug!(
                "  - Queuing {} for upgrading in {}",
                package.name,
                self.platform
            );
            Task::Update(package_ref)
        } else {
            tracing::debug!(
                "  - Queuing {} for installation in {}",
                package.name,
                self.platform
            );
            Task::Install(package_ref)
        };

        let kind = task.kind();
        queue.enqueue(task);
        Ok(kind)
    }

    /// Replace the package's files and queue an update of the target
    pub fn update(
        &mut self,
        repo: &mut dyn InstalledRepository,
        initial: &Package,
        target: &Package,
        queue: &mut TaskQueue,
    ) -> Result<()> {
        self.files.update(repo, initial, target)?;

        tracing::debug!(
            "  - Queuing {} for upgrading in {}",
            target.name,
            self.platform
        );

        let install_path = self.files.install_path(target);
        self.manifests.clear_package_manifest(&install_path);
        queue.enqueue(Task::Update(PackageRef::new(&target.name, install_path)));
        Ok(())
    }

    /// Preserve the manifest, remove the package's files and queue the uninstall.
    ///
    /// The queued task carries the preserved manifest, so it still applies
    /// when the same install path is reused later in the batch.
    ///
    /// # Errors
    ///
    /// Returns `PackageNotInstalled` if the repository does not track the
    /// package, or the base removal's error (nothing is queued then). A
    /// manifest that cannot be preserved is not an error: the uninstall is
    /// skipped and reported as [`UninstallOutcome::Skipped`].
    pub fn uninstall(
        &mut self,
        repo: &mut dyn InstalledRepository,
        package: &Package,
        queue: &mut TaskQueue,
    ) -> Result<UninstallOutcome> {
        if !repo.has_package(&package.name) {
            return Err(InstallerError::not_installed(package.to_string()));
        }

        tracing::debug!(
            "  - Queuing {} for removal from {}",
            package.name,
            self.platform
        );

        let install_path = self.files.install_path(package);

        let preserved = match self.preserve_manifest(package, &install_path) {
            Ok(path) => path,
            Err(err) => {
                tracing::warn!(
                    "    [ERROR] {}. Skipping uninstall of {}.",
                    err,
                    package.name
                );
                return Ok(UninstallOutcome::Skipped);
            }
        };

        if let Err(err) = self.files.uninstall(repo, package) {
            discard_preserved(&preserved);
            return Err(err);
        }

        self.manifests
            .set_package_manifest(&install_path, preserved.clone());
        queue.enqueue(Task::Uninstall(
            PackageRef::new(&package.name, &install_path).with_manifest(preserved),
        ));
        Ok(UninstallOutcome::Queued)
    }

    /// Copy the package manifest somewhere that survives the file removal
    fn preserve_manifest(&self, package: &Package, install_path: &Path) -> Result<PathBuf> {
        let manifest =
            self.manifests
                .package_manifest(install_path)
                .ok_or_else(|| ManifestError::NotFound {
                    path: install_path.to_path_buf(),
                })?;

        let tmp = tempfile::Builder::new()
            .prefix(&package.file_prefix())
            .suffix(".xml")
            .tempfile_in(&self.temp_dir)
            .map_err(|err| InstallerError::Copy {
                from: manifest.clone(),
                to: self.temp_dir.clone(),
                reason: err.to_string(),
            })?;

        fs::copy(&manifest, tmp.path()).map_err(|err| InstallerError::Copy {
            from: manifest.clone(),
            to: tmp.path().to_path_buf(),
            reason: err.to_string(),
        })?;

        let (_, path) = tmp.keep().map_err(|err| err.error)?;
        tracing::debug!(
            "Preserved manifest {} as {}",
            manifest.display(),
            path.display()
        );
        Ok(path)
    }
}
