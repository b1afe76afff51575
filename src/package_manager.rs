//! Base package placement and the installed-package repository
//!
//! This is the layer the extension installer composes over: it knows where a
//! package lives on disk and how to put its files there or take them away,
//! and it keeps the package manager's own record of what is installed. It
//! knows nothing about the host application.
//!
//! # Architecture
//!
//! - `PackageFiles`: file placement for a package (install, update, uninstall)
//! - `LibraryFiles`: places packages under `<vendor_dir>/<vendor>/<name>`
//! - `InstalledRepository`: the package manager's installed-package bookkeeping
//! - `InstalledJson`: repository persisted as a JSON file

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{InstallerError, Result};
use crate::types::Package;

/// The package manager's record of installed packages
pub trait InstalledRepository {
    fn has_package(&self, name: &str) -> bool;

    fn add_package(&mut self, package: Package);

    /// Returns false if the package was not tracked
    fn remove_package(&mut self, name: &str) -> bool;

    fn find_package(&self, name: &str) -> Option<&Package>;
}

/// Generic file placement for a package
pub trait PackageFiles {
    /// Where the package's files live
    fn install_path(&self, package: &Package) -> PathBuf;

    fn install(&mut self, repo: &mut dyn InstalledRepository, package: &Package) -> Result<()>;

    fn update(
        &mut self,
        repo: &mut dyn InstalledRepository,
        initial: &Package,
        target: &Package,
    ) -> Result<()>;

    fn uninstall(&mut self, repo: &mut dyn InstalledRepository, package: &Package) -> Result<()>;

    /// Installed according to the repository and present on disk
    fn is_installed(&self, repo: &dyn InstalledRepository, package: &Package) -> bool {
        installed_at(repo, package, &self.install_path(package))
    }
}

/// The base installed check: tracked by the repository and present at `install_path`
pub fn installed_at(
    repo: &dyn InstalledRepository,
    package: &Package,
    install_path: &Path,
) -> bool {
    repo.has_package(&package.name) && install_path.exists()
}

/// Places package contents under a vendor directory.
///
/// Package contents are taken from the package's `source` directory, which
/// the package manager has already downloaded and extracted.
#[derive(Debug, Clone)]
pub struct LibraryFiles {
    vendor_dir: PathBuf,
}

impl LibraryFiles {
    pub fn new<P: Into<PathBuf>>(vendor_dir: P) -> Self {
        Self {
            vendor_dir: vendor_dir.into(),
        }
    }

    fn place(&self, package: &Package) -> Result<PathBuf> {
        let source = package
            .source
            .as_ref()
            .ok_or_else(|| InstallerError::MissingSource {
                name: package.name.clone(),
            })?;
        let target = self.install_path(package);

        copy_tree(source, &target)?;
        tracing::debug!(
            "Placed {} from {} into {}",
            package,
            source.display(),
            target.display()
        );

        Ok(target)
    }
}

impl PackageFiles for LibraryFiles {
    fn install_path(&self, package: &Package) -> PathBuf {
        self.vendor_dir.join(&package.name)
    }

    fn install(&mut self, repo: &mut dyn InstalledRepository, package: &Package) -> Result<()> {
        self.place(package)?;
        repo.add_package(package.clone());
        Ok(())
    }

    fn update(
        &mut self,
        repo: &mut dyn InstalledRepository,
        initial: &Package,
        target: &Package,
    ) -> Result<()> {
        let initial_path = self.install_path(initial);
        if initial_path.exists() {
            fs::remove_dir_all(&initial_path)?;
        }
        repo.remove_package(&initial.name);

        self.place(target)?;
        repo.add_package(target.clone());
        Ok(())
    }

    fn uninstall(&mut self, repo: &mut dyn InstalledRepository, package: &Package) -> Result<()> {
        let path = self.install_path(package);
        if path.exists() {
            fs::remove_dir_all(&path)?;
            tracing::debug!("Removed {}", path.display());
        }
        repo.remove_package(&package.name);
        Ok(())
    }
}

/// Recursively copy `source` into `target`, creating directories as needed
fn copy_tree(source: &Path, target: &Path) -> Result<()> {
    let copy_error = |reason: String| InstallerError::Copy {
        from: source.to_path_buf(),
        to: target.to_path_buf(),
        reason,
    };

    if !source.is_dir() {
        return Err(copy_error("source is not a directory".to_string()));
    }

    for entry in WalkDir::new(source) {
        let entry = entry.map_err(|err| copy_error(err.to_string()))?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|err| copy_error(err.to_string()))?;
        let destination = target.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&destination)?;
        } else {
            fs::copy(entry.path(), &destination).map_err(|err| copy_error(err.to_string()))?;
        }
    }

    Ok(())
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct InstalledFile {
    #[serde(default)]
    packages: Vec<Package>,
}

/// Installed-package repository persisted as JSON
#[derive(Debug, Default)]
pub struct InstalledJson {
    path: PathBuf,
    packages: BTreeMap<String, Package>,
}

impl InstalledJson {
    /// Load the repository; a missing file is an empty repository
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::empty(path));
        }

        let content = fs::read_to_string(path)?;
        let file: InstalledFile = serde_json::from_str(&content)?;

        Ok(Self {
            path: path.to_path_buf(),
            packages: file
                .packages
                .into_iter()
                .map(|package| (package.name.clone(), package))
                .collect(),
        })
    }

    pub fn empty<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            packages: BTreeMap::new(),
        }
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = InstalledFile {
            packages: self.packages.values().cloned().collect(),
        };
        fs::write(&self.path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

impl InstalledRepository for InstalledJson {
    fn has_package(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    fn add_package(&mut self, package: Package) {
        self.packages.insert(package.name.clone(), package);
    }

    fn remove_package(&mut self, name: &str) -> bool {
        self.packages.remove(name).is_some()
    }

    fn find_package(&self, name: &str) -> Option<&Package> {
        self.packages.get(name)
    }
}
