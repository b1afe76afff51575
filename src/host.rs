//! Host application access
//!
//! The host (Joomla) may not be bootstrapped while the package manager is
//! running, so every consumer goes through a [`Bootstrapper`] that can answer
//! "no application". The extension registry is only ever queried by
//! `(element, type)`.
//!
//! [`JsonRegistry`] is a file-backed registry used by the command line tool and
//! the tests. Its file holds `{"extensions": [{"id": 12, "element": "com_docman",
//! "type": "component", "version": "3.0.0"}]}`; a missing file means the host
//! has not been set up.

use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// A row of the host's extension registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionRecord {
    /// Registry identity. Stub rows carry no id or `0`.
    #[serde(default)]
    pub id: Option<u64>,

    pub element: String,

    #[serde(rename = "type")]
    pub extension_type: String,

    #[serde(default)]
    pub version: Option<String>,
}

impl ExtensionRecord {
    /// Only records with a positive id count as installed
    pub fn is_installed(&self) -> bool {
        self.id.is_some_and(|id| id > 0)
    }
}

/// A running host application
pub trait HostApplication {
    /// Look up an extension by element name and type
    fn extension(&self, element: &str, extension_type: &str) -> Result<Option<ExtensionRecord>>;
}

/// Hands out the host application if it can be bootstrapped
pub trait Bootstrapper {
    fn application(&self) -> Option<&dyn HostApplication>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    extensions: Vec<ExtensionRecord>,
}

/// Extension registry persisted as a JSON file
#[derive(Debug)]
pub struct JsonRegistry {
    path: PathBuf,
    extensions: Vec<ExtensionRecord>,
}

impl JsonRegistry {
    /// Load the registry. Fails if the file does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let file: RegistryFile = serde_json::from_str(&content)?;

        tracing::debug!(
            "Loaded extension registry {} ({} extensions)",
            path.display(),
            file.extensions.len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            extensions: file.extensions,
        })
    }

    /// Create an empty registry that will be written to `path` on save
    pub fn empty<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            extensions: Vec::new(),
        }
    }

    pub fn save(&self) -> Result<()> {
        let file = RegistryFile {
            extensions: self.extensions.clone(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    pub fn records(&self) -> &[ExtensionRecord] {
        &self.extensions
    }

    /// Register an extension, returning its id.
    ///
    /// An existing installed record keeps its id and only has its version
    /// refreshed; a stub row is given a fresh id.
    pub fn register(&mut self, element: &str, extension_type: &str, version: Option<&str>) -> u64 {
        let next_id = self.next_id();

        if let Some(record) = self.find_mut(element, extension_type) {
            let id = match record.id {
                Some(id) if id > 0 => id,
                _ => next_id,
            };
            record.id = Some(id);
            record.version = version.map(str::to_string);
            return id;
        }

        self.extensions.push(ExtensionRecord {
            id: Some(next_id),
            element: element.to_string(),
            extension_type: extension_type.to_string(),
            version: version.map(str::to_string),
        });
        next_id
    }

    /// Remove an extension. Returns false if nothing matched.
    pub fn deregister(&mut self, element: &str, extension_type: &str) -> bool {
        let before = self.extensions.len();
        self.extensions
            .retain(|record| !(record.element == element && record.extension_type == extension_type));
        self.extensions.len() != before
    }

    fn next_id(&self) -> u64 {
        self.extensions
            .iter()
            .filter_map(|record| record.id)
            .max()
            .unwrap_or(0)
            + 1
    }

    fn find_mut(&mut self, element: &str, extension_type: &str) -> Option<&mut ExtensionRecord> {
        self.extensions
            .iter_mut()
            .find(|record| record.element == element && record.extension_type == extension_type)
    }
}

impl HostApplication for JsonRegistry {
    fn extension(&self, element: &str, extension_type: &str) -> Result<Option<ExtensionRecord>> {
        Ok(self
            .extensions
            .iter()
            .find(|record| record.element == element && record.extension_type == extension_type)
            .cloned())
    }
}

/// Bootstraps a [`JsonRegistry`] on first use.
///
/// The load is attempted once; a missing or unreadable registry file makes
/// the application unavailable for the lifetime of the bootstrapper.
#[derive(Debug)]
pub struct RegistryBootstrapper {
    path: PathBuf,
    app: OnceCell<Option<JsonRegistry>>,
}

impl RegistryBootstrapper {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            app: OnceCell::new(),
        }
    }
}

impl Bootstrapper for RegistryBootstrapper {
    fn application(&self) -> Option<&dyn HostApplication> {
        self.app
            .get_or_init(|| match JsonRegistry::load(&self.path) {
                Ok(registry) => Some(registry),
                Err(err) => {
                    tracing::debug!("Host registry {} unavailable: {}", self.path.display(), err);
                    None
                }
            })
            .as_ref()
            .map(|registry| registry as &dyn HostApplication)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: Option<u64>, element: &str) -> ExtensionRecord {
        ExtensionRecord {
            id,
            element: element.to_string(),
            extension_type: "component".to_string(),
            version: None,
        }
    }

    #[test]
    fn test_record_installed_requires_positive_id() {
        assert!(record(Some(5), "com_foo").is_installed());
        assert!(!record(Some(0), "com_foo").is_installed());
        assert!(!record(None, "com_foo").is_installed());
    }

    #[test]
    fn test_register_assigns_increasing_ids() {
        let mut registry = JsonRegistry::empty("/nonexistent/registry.json");
        assert_eq!(registry.register("com_foo", "component", None), 1);
        assert_eq!(registry.register("mod_bar", "module", Some("1.0.0")), 2);
        // Re-registering keeps the id
        assert_eq!(registry.register("com_foo", "component", Some("2.0.0")), 1);
        assert_eq!(registry.records().len(), 2);
    }

    #[test]
    fn test_register_replaces_stub_id() {
        let mut registry = JsonRegistry::empty("/nonexistent/registry.json");
        registry.extensions.push(record(Some(7), "com_other"));
        registry.extensions.push(record(Some(0), "com_stub"));

        assert_eq!(registry.register("com_stub", "component", None), 8);
    }

    #[test]
    fn test_deregister() {
        let mut registry = JsonRegistry::empty("/nonexistent/registry.json");
        registry.register("com_foo", "component", None);
        assert!(registry.deregister("com_foo", "component"));
        assert!(!registry.deregister("com_foo", "component"));
        assert!(registry.extension("com_foo", "component").unwrap().is_none());
    }

    #[test]
    fn test_lookup_matches_type() {
        let mut registry = JsonRegistry::empty("/nonexistent/registry.json");
        registry.register("docman", "plugin", None);
        assert!(registry.extension("docman", "component").unwrap().is_none());
        assert!(registry.extension("docman", "plugin").unwrap().is_some());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");

        let mut registry = JsonRegistry::empty(&path);
        registry.register("com_docman", "component", Some("3.0.0"));
        registry.save().unwrap();

        let loaded = JsonRegistry::load(&path).unwrap();
        let found = loaded.extension("com_docman", "component").unwrap().unwrap();
        assert_eq!(found.id, Some(1));
        assert_eq!(found.version.as_deref(), Some("3.0.0"));
    }

    #[test]
    fn test_bootstrapper_missing_registry_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let bootstrapper = RegistryBootstrapper::new(dir.path().join("missing.json"));
        assert!(bootstrapper.application().is_none());
    }

    #[test]
    fn test_bootstrapper_loads_registry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        fs::write(&path, r#"{"extensions": [{"id": 3, "element": "com_foo", "type": "component"}]}"#)
            .unwrap();

        let bootstrapper = RegistryBootstrapper::new(&path);
        let app = bootstrapper.application().expect("registry should load");
        let found = app.extension("com_foo", "component").unwrap().unwrap();
        assert!(found.is_installed());
    }
}
