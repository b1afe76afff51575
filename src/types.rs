//! Package and platform types
//!
//! Package descriptors arrive from the package manager (or a batch file) as
//! loosely-typed data; the handful of values the installer actually branches
//! on are lifted into enums here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use strum::{Display, EnumIter, EnumString};

/// Package types handled by this installer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum PackageType {
    JoomlatoolsComposer,
    JoomlatoolsExtension,
    JoomlatoolsInstaller,
    JoomlaInstaller,
}

impl PackageType {
    /// Returns true if the raw package type string is handled by this installer
    pub fn supports(package_type: &str) -> bool {
        package_type.parse::<Self>().is_ok()
    }
}

/// Host platform flavour. Only affects diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "kebab-case")]
pub enum Platform {
    #[default]
    #[strum(to_string = "Joomla", serialize = "joomla")]
    Joomla,
    #[strum(to_string = "Joomlatools Platform", serialize = "joomlatools-platform")]
    JoomlatoolsPlatform,
}

/// Installer-specific flags carried in a package's `extra` section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PackageExtra {
    /// Resolving the package is enough to consider it installed
    #[serde(default)]
    pub reusable_component: bool,

    /// Always queue an update, never a fresh install
    #[serde(default)]
    pub force_update: bool,
}

/// A package descriptor as handed over by the package manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// Vendor-qualified name, e.g. `joomlatools/docman`
    pub name: String,

    /// Raw package type, e.g. `joomlatools-extension`
    #[serde(rename = "type", default = "default_package_type")]
    pub package_type: String,

    #[serde(default)]
    pub version: Option<String>,

    /// Directory holding the extracted package contents
    #[serde(default)]
    pub source: Option<PathBuf>,

    #[serde(default)]
    pub extra: PackageExtra,
}

fn default_package_type() -> String {
    PackageType::JoomlatoolsExtension.to_string()
}

impl Package {
    /// Create a package of the default extension type
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            package_type: default_package_type(),
            version: None,
            source: None,
            extra: PackageExtra::default(),
        }
    }

    pub fn with_type(mut self, package_type: impl Into<String>) -> Self {
        self.package_type = package_type.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_extra(mut self, extra: PackageExtra) -> Self {
        self.extra = extra;
        self
    }

    pub fn is_reusable_component(&self) -> bool {
        self.extra.reusable_component
    }

    pub fn is_forcing_update(&self) -> bool {
        self.extra.force_update
    }

    /// Filesystem-safe prefix derived from the package name
    pub fn file_prefix(&self) -> String {
        self.name.replace(['/', '\\'], "-")
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{} {}", self.name, version),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Identity of a queued package: its name and the install path resolved at enqueue time.
///
/// Uninstalls also carry the manifest copy preserved for them, since the
/// install path may hold a different package by the time the task runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageRef {
    name: String,
    install_path: PathBuf,
    manifest: Option<PathBuf>,
}

impl PackageRef {
    pub fn new(name: impl Into<String>, install_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            install_path: install_path.into(),
            manifest: None,
        }
    }

    pub fn with_manifest(mut self, manifest: impl Into<PathBuf>) -> Self {
        self.manifest = Some(manifest.into());
        self
    }

    /// Manifest pinned at enqueue time, if any
    pub fn manifest(&self) -> Option<&std::path::Path> {
        self.manifest.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn install_path(&self) -> &std::path::Path {
        &self.install_path
    }
}

impl fmt::Display for PackageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.install_path.display())
    }
}
