//! Package-manager batches
//!
//! A batch is the ordered list of lifecycle events one package-manager run
//! produces. It is replayed through the [`ExtensionInstaller`] package by
//! package, which fills the task queue; draining happens afterwards.
//!
//! # Batch Format
//!
//! ```json
//! {
//!   "operations": [
//!     { "op": "install", "package": { "name": "joomlatools/docman", "source": "dist/docman" } },
//!     { "op": "update", "initial": { "name": "acme/foo", "version": "1.0.0" },
//!                       "target": { "name": "acme/foo", "version": "1.1.0", "source": "dist/foo" } },
//!     { "op": "uninstall", "package": { "name": "acme/bar" } }
//!   ]
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::engine::queue::TaskQueue;
use crate::installer::{ExtensionInstaller, UninstallOutcome};
use crate::package_manager::InstalledRepository;
use crate::types::Package;

/// One package-manager lifecycle event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Operation {
    Install { package: Package },
    Update { initial: Package, target: Package },
    Uninstall { package: Package },
}

impl Operation {
    /// The package whose type decides whether this installer handles the event
    pub fn package(&self) -> &Package {
        match self {
            Self::Install { package } | Self::Uninstall { package } => package,
            Self::Update { target, .. } => target,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    #[serde(default)]
    pub operations: Vec<Operation>,
}

/// What a batch run did
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Operations that produced a queued task
    pub queued: usize,
    /// Packages of a type this installer does not handle
    pub unsupported: Vec<String>,
    /// Uninstalls skipped because the manifest could not be preserved
    pub skipped: Vec<String>,
}

impl Batch {
    /// Load a batch from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read batch from {:?}", path.as_ref()))?;

        serde_json::from_str(&content).context("Failed to parse batch JSON")
    }

    /// Feed every operation through the installer, in order.
    ///
    /// Stops at the first hard error (missing package files, uninstall of an
    /// untracked package); tasks queued up to that point stay queued.
    pub fn apply(
        &self,
        installer: &mut ExtensionInstaller,
        repo: &mut dyn InstalledRepository,
        queue: &mut TaskQueue,
    ) -> Result<BatchReport> {
        let mut report = BatchReport::default();

        for operation in &self.operations {
            let package = operation.package();
            if !installer.supports(&package.package_type) {
                tracing::debug!(
                    "Ignoring {} (unsupported type {})",
                    package.name,
                    package.package_type
                );
                report.unsupported.push(package.name.clone());
                continue;
            }

            match operation {
                Operation::Install { package } => {
                    installer
                        .install(repo, package, queue)
                        .with_context(|| format!("Failed to install {}", package))?;
                    report.queued += 1;
                }
                Operation::Update { initial, target } => {
                    installer
                        .update(repo, initial, target, queue)
                        .with_context(|| format!("Failed to update {} to {}", initial, target))?;
                    report.queued += 1;
                }
                Operation::Uninstall { package } => {
                    let outcome = installer
                        .uninstall(repo, package, queue)
                        .with_context(|| format!("Failed to uninstall {}", package))?;
                    match outcome {
                        UninstallOutcome::Queued => report.queued += 1,
                        UninstallOutcome::Skipped => report.skipped.push(package.name.clone()),
                    }
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_batch() {
        let json = r#"{
            "operations": [
                { "op": "install", "package": { "name": "joomlatools/docman", "source": "dist/docman" } },
                { "op": "update",
                  "initial": { "name": "acme/foo", "version": "1.0.0" },
                  "target": { "name": "acme/foo", "version": "1.1.0" } },
                { "op": "uninstall", "package": { "name": "acme/bar", "type": "library" } }
            ]
        }"#;

        let batch: Batch = serde_json::from_str(json).unwrap();
        assert_eq!(batch.operations.len(), 3);
        assert_eq!(batch.operations[0].package().name, "joomlatools/docman");
        assert_eq!(
            batch.operations[1].package().version.as_deref(),
            Some("1.1.0")
        );
        assert!(matches!(batch.operations[2], Operation::Uninstall { .. }));
        assert_eq!(batch.operations[2].package().package_type, "library");
    }

    #[test]
    fn test_unknown_op_rejected() {
        let json = r#"{ "operations": [ { "op": "reinstall", "package": { "name": "a/b" } } ] }"#;
        assert!(serde_json::from_str::<Batch>(json).is_err());
    }
}
