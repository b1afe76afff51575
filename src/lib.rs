//! Joomla extension installer library
//!
//! Coordinates installation, upgrade and removal of Joomla extensions driven
//! by a package manager. Package files are placed immediately; everything
//! that touches the host application is queued as a [`Task`] and replayed in
//! one ordered pass once the package manager has finished its batch.
//!
//! # Flow
//!
//! ```text
//! package manager hook ──▶ ExtensionInstaller ──▶ PackageFiles (files on disk)
//!                                │
//!                                ├──▶ InstallationStateClassifier (install or update?)
//!                                ▼
//!                            TaskQueue ──drain──▶ TaskHandler (host registry)
//! ```

pub mod batch;
pub mod cli;
pub mod config_file;
pub mod engine;
pub mod error;
pub mod host;
pub mod installer;
pub mod logic;
pub mod manifest;
pub mod package_manager;
pub mod types;

// Re-export main types for convenience
pub use batch::{Batch, BatchReport, Operation};
pub use config_file::InstallerConfig;
pub use engine::{discard, drain, DrainReport, QueueState, RegistrySync, Task, TaskHandler, TaskKind, TaskQueue};
pub use error::{InstallerError, Result};
pub use host::{Bootstrapper, ExtensionRecord, HostApplication, JsonRegistry, RegistryBootstrapper};
pub use installer::{ExtensionInstaller, UninstallOutcome};
pub use logic::{InstallationStateClassifier, INSTALLED_MARKER};
pub use manifest::{Manifest, ManifestError, ManifestLocator, ManifestStore};
pub use package_manager::{InstalledJson, InstalledRepository, LibraryFiles, PackageFiles};
pub use types::{Package, PackageExtra, PackageRef, PackageType, Platform};
