//! Extension manifests
//!
//! Every Joomla extension ships an XML manifest in the root of its package:
//!
//! ```xml
//! <extension type="component" version="3.0" method="upgrade">
//!     <name>DOCman</name>
//!     ...
//! </extension>
//! ```
//!
//! The installer only needs two facts from it: the extension `type` and the
//! element name the host registry files the extension under. Both are parsed
//! once into a [`Manifest`].
//!
//! [`ManifestStore`] locates manifests under an install path and lets the
//! uninstall flow point an install path at a preserved copy after the package
//! files are gone.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Root element names accepted as an extension manifest
const MANIFEST_ROOTS: &[&str] = &["extension", "install"];

/// Errors that can occur while reading a manifest
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ManifestError {
    /// No manifest under the install path
    #[error("No manifest found in {path}")]
    NotFound { path: PathBuf },

    /// Manifest file could not be read
    #[error("Failed to read manifest {path}: {reason}")]
    Io { path: PathBuf, reason: String },

    /// Manifest is not well-formed XML
    #[error("Invalid manifest XML in {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    /// Well-formed XML whose root is not an extension manifest
    #[error("{path} is not an extension manifest (root element <{root}>)")]
    NotAManifest { path: PathBuf, root: String },
}

/// The parts of an extension manifest the installer cares about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// Value of the root `type` attribute (`component`, `module`, ...). Empty if absent.
    pub extension_type: String,

    /// Registry element name, if one can be derived
    pub element: Option<String>,

    /// Extension version from `<version>`
    pub version: Option<String>,
}

impl Manifest {
    /// Read and parse a manifest file
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        let content = fs::read_to_string(path).map_err(|err| ManifestError::Io {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;

        Self::parse(&content).map_err(|err| match err {
            ManifestError::Parse { reason, .. } => ManifestError::Parse {
                path: path.to_path_buf(),
                reason,
            },
            ManifestError::NotAManifest { root, .. } => ManifestError::NotAManifest {
                path: path.to_path_buf(),
                root,
            },
            other => other,
        })
    }

    /// Parse manifest XML. Errors carry an empty path; `from_file` fills it in.
    pub fn parse(xml: &str) -> Result<Self, ManifestError> {
        let doc = roxmltree::Document::parse(xml).map_err(|err| ManifestError::Parse {
            path: PathBuf::new(),
            reason: err.to_string(),
        })?;

        let root = doc.root_element();
        let root_name = root.tag_name().name();
        if !MANIFEST_ROOTS.contains(&root_name) {
            return Err(ManifestError::NotAManifest {
                path: PathBuf::new(),
                root: root_name.to_string(),
            });
        }

        let extension_type = root.attribute("type").unwrap_or_default().to_string();
        let element = derive_element(root, &extension_type);
        let version = child_text(root, "version").and_then(non_empty);

        Ok(Self {
            extension_type,
            element,
            version,
        })
    }
}

/// Work out the element name the host registry uses for this extension.
///
/// An explicit `<element>` wins; otherwise the rule depends on the type.
fn derive_element(root: roxmltree::Node<'_, '_>, extension_type: &str) -> Option<String> {
    if let Some(element) = child_text(root, "element") {
        return non_empty(clean_name(&element));
    }

    let name = child_text(root, "name").map(|name| clean_name(&name));

    let element = match extension_type {
        "component" => name.map(|name| prefixed("com_", name)),
        "module" => files_attribute(root, "module").or(name),
        "plugin" => files_attribute(root, "plugin").or(name),
        "library" => child_text(root, "libraryname").map(|name| clean_name(&name)),
        "package" => child_text(root, "packagename").map(|name| prefixed("pkg_", clean_name(&name))),
        "language" => child_text(root, "tag"),
        _ => name,
    };

    element.and_then(non_empty)
}

fn child_text(node: roxmltree::Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|child| child.is_element() && child.tag_name().name() == tag)
        .and_then(|child| child.text())
        .map(|text| text.trim().to_string())
}

/// `<files><filename module="mod_foo">` style element declarations
fn files_attribute(root: roxmltree::Node<'_, '_>, attribute: &str) -> Option<String> {
    root.children()
        .filter(|child| child.is_element() && child.tag_name().name() == "files")
        .flat_map(|files| files.children())
        .filter(|child| child.is_element())
        .find_map(|child| child.attribute(attribute))
        .map(|value| value.trim().to_lowercase())
}

fn clean_name(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .replace(' ', "_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(*c, '_' | '.' | '-'))
        .collect()
}

fn prefixed(prefix: &str, name: String) -> String {
    if name.is_empty() || name.starts_with(prefix) {
        name
    } else {
        format!("{prefix}{name}")
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

/// Returns true if the file parses as XML with a manifest root element
fn is_manifest_file(path: &Path) -> bool {
    let Ok(content) = fs::read_to_string(path) else {
        return false;
    };
    roxmltree::Document::parse(&content)
        .map(|doc| MANIFEST_ROOTS.contains(&doc.root_element().tag_name().name()))
        .unwrap_or(false)
}

/// Access to the manifest belonging to an install path
pub trait ManifestStore {
    /// Path of the manifest for the package installed at `install_path`
    fn package_manifest(&self, install_path: &Path) -> Option<PathBuf>;

    /// Point `install_path` at a different manifest file from now on
    fn set_package_manifest(&mut self, install_path: &Path, manifest: PathBuf);

    /// Drop any re-pointed manifest so `install_path` is scanned again
    fn clear_package_manifest(&mut self, install_path: &Path);

    /// Registry element name declared by the manifest at `install_path`
    fn element_name(&self, install_path: &Path) -> Option<String> {
        let manifest = self.package_manifest(install_path)?;
        Manifest::from_file(&manifest).ok()?.element
    }
}

/// Filesystem-backed manifest store.
///
/// Scans the top level of an install path for XML files and picks the first
/// (by file name) whose root is a manifest element. Explicit overrides set
/// through [`ManifestStore::set_package_manifest`] take precedence.
#[derive(Debug, Default)]
pub struct ManifestLocator {
    overrides: HashMap<PathBuf, PathBuf>,
}

impl ManifestLocator {
    pub fn new() -> Self {
        Self::default()
    }

    fn scan(install_path: &Path) -> Option<PathBuf> {
        let mut candidates: Vec<PathBuf> = fs::read_dir(install_path)
            .ok()?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
            })
            .collect();
        candidates.sort();

        candidates.into_iter().find(|path| is_manifest_file(path))
    }
}

impl ManifestStore for ManifestLocator {
    fn package_manifest(&self, install_path: &Path) -> Option<PathBuf> {
        if let Some(path) = self.overrides.get(install_path) {
            return Some(path.clone());
        }
        Self::scan(install_path)
    }

    fn set_package_manifest(&mut self, install_path: &Path, manifest: PathBuf) {
        tracing::debug!(
            "Manifest for {} now read from {}",
            install_path.display(),
            manifest.display()
        );
        self.overrides.insert(install_path.to_path_buf(), manifest);
    }

    fn clear_package_manifest(&mut self, install_path: &Path) {
        if let Some(previous) = self.overrides.remove(install_path) {
            tracing::debug!(
                "Manifest for {} no longer read from {}",
                install_path.display(),
                previous.display()
            );
        }
    }
}
