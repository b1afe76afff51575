//! Draining the deferred task queue
//!
//! Runs once, after every package hook of a batch has fired. All pending tasks
//! are taken from the queue in FIFO order and dispatched to a [`TaskHandler`].
//! A failing task is logged and recorded; the remaining tasks still run.

use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::queue::{Task, TaskQueue};
use crate::error::{InstallerError, Result};
use crate::host::JsonRegistry;
use crate::manifest::{Manifest, ManifestError, ManifestStore};
use crate::types::PackageRef;

/// Performs deferred tasks against the host application
pub trait TaskHandler {
    fn install(&mut self, package: &PackageRef) -> Result<()>;
    fn update(&mut self, package: &PackageRef) -> Result<()>;
    fn uninstall(&mut self, package: &PackageRef) -> Result<()>;
}

/// Outcome of a drain pass
#[derive(Debug, Default)]
pub struct DrainReport {
    /// Tasks that succeeded, in execution order
    pub completed: Vec<Task>,
    /// Tasks that failed, with the error message
    pub failed: Vec<(Task, String)>,
}

impl DrainReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.completed.len() + self.failed.len()
    }
}

/// Take every task from `queue` and hand it to `handler`, oldest first
pub fn drain(queue: &mut TaskQueue, handler: &mut dyn TaskHandler) -> DrainReport {
    let tasks = queue.drain_all();
    let mut report = DrainReport::default();

    if tasks.is_empty() {
        tracing::debug!("No queued tasks");
        return report;
    }

    tracing::info!("Processing {} queued tasks", tasks.len());

    for task in tasks {
        let result = match &task {
            Task::Install(package) => handler.install(package),
            Task::Update(package) => handler.update(package),
            Task::Uninstall(package) => handler.uninstall(package),
        };

        match result {
            Ok(()) => {
                tracing::info!("  - {} done", task);
                report.completed.push(task);
            }
            Err(err) => {
                tracing::error!("  - {} failed: {}", task, err);
                report.failed.push((task, err.to_string()));
            }
        }
    }

    report
}

/// Empty the queue without running anything, removing the manifest copies
/// preserved for queued uninstalls. Returns the discarded tasks.
pub fn discard(queue: &mut TaskQueue) -> Vec<Task> {
    let tasks = queue.drain_all();
    for task in &tasks {
        if let Some(manifest) = task.package().manifest() {
            discard_preserved(manifest);
        }
    }
    tasks
}

/// Remove a preserved manifest copy that no task will read
pub(crate) fn discard_preserved(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => tracing::debug!("Removed preserved manifest {}", path.display()),
        Err(err) => tracing::debug!(
            "Could not remove preserved manifest {}: {}",
            path.display(),
            err
        ),
    }
}

/// Applies tasks to a [`JsonRegistry`] using the packages' manifests.
///
/// Install and update register the manifest's `(element, type)`; uninstall
/// reads the manifest preserved at enqueue time and removes the record.
pub struct RegistrySync<'a> {
    registry: &'a mut JsonRegistry,
    manifests: &'a dyn ManifestStore,
}

impl<'a> RegistrySync<'a> {
    pub fn new(registry: &'a mut JsonRegistry, manifests: &'a dyn ManifestStore) -> Self {
        Self {
            registry,
            manifests,
        }
    }

    fn read_manifest(&self, package: &PackageRef) -> Result<(PathBuf, Manifest, String)> {
        let path = package
            .manifest()
            .map(Path::to_path_buf)
            .or_else(|| self.manifests.package_manifest(package.install_path()))
            .ok_or_else(|| ManifestError::NotFound {
                path: package.install_path().to_path_buf(),
            })?;
        let manifest = Manifest::from_file(&path)?;
        let element = manifest.element.clone().ok_or_else(|| {
            InstallerError::host(format!(
                "cannot determine element name for {} from {}",
                package.name(),
                path.display()
            ))
        })?;
        Ok((path, manifest, element))
    }

    fn register(&mut self, package: &PackageRef) -> Result<()> {
        let (_, manifest, element) = self.read_manifest(package)?;
        let id = self.registry.register(
            &element,
            &manifest.extension_type,
            manifest.version.as_deref(),
        );
        tracing::debug!(
            "Registered {} as {} {} (id {})",
            package.name(),
            manifest.extension_type,
            element,
            id
        );
        Ok(())
    }
}

impl TaskHandler for RegistrySync<'_> {
    fn install(&mut self, package: &PackageRef) -> Result<()> {
        self.register(package)
    }

    fn update(&mut self, package: &PackageRef) -> Result<()> {
        self.register(package)
    }

    fn uninstall(&mut self, package: &PackageRef) -> Result<()> {
        let (path, manifest, element) = self.read_manifest(package)?;

        if !self.registry.deregister(&element, &manifest.extension_type) {
            tracing::debug!(
                "{} {} was not registered; nothing to remove",
                manifest.extension_type,
                element
            );
        }

        // Preserved copies live outside the (already removed) install path
        if !path.starts_with(package.install_path()) {
            discard_preserved(&path);
        }

        Ok(())
    }
}
