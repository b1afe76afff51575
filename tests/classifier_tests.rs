//! Tests for the installation state classifier
//!
//! These tests verify:
//! - Reusable components short-circuit without touching host or filesystem
//! - An unavailable host degrades to "not installed" without retrying
//! - The `joomla.installed` marker wins regardless of manifest state
//! - Registry records only count when their id is positive
//! - Unparseable manifests fall back to the installed repository

use joomla_installer::{
    Bootstrapper, ExtensionRecord, HostApplication, InstallationStateClassifier, InstalledJson,
    InstalledRepository, InstallerError, JsonRegistry, ManifestLocator, ManifestStore, Package,
    PackageExtra, INSTALLED_MARKER,
};
use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};

// =============================================================================
// Test doubles
// =============================================================================

/// Bootstrapper that must never be asked for the application
struct ForbiddenBootstrapper;

impl Bootstrapper for ForbiddenBootstrapper {
    fn application(&self) -> Option<&dyn HostApplication> {
        panic!("host application must not be requested");
    }
}

/// Manifest store that must never be consulted
struct ForbiddenManifests;

impl ManifestStore for ForbiddenManifests {
    fn package_manifest(&self, _install_path: &Path) -> Option<PathBuf> {
        panic!("manifest must not be located");
    }

    fn set_package_manifest(&mut self, _install_path: &Path, _manifest: PathBuf) {
        panic!("manifest must not be replaced");
    }

    fn clear_package_manifest(&mut self, _install_path: &Path) {
        panic!("manifest must not be replaced");
    }
}

/// Bootstrapper for a host that is not set up; counts how often it is asked
#[derive(Default)]
struct Unavailable {
    calls: Cell<usize>,
}

impl Bootstrapper for Unavailable {
    fn application(&self) -> Option<&dyn HostApplication> {
        self.calls.set(self.calls.get() + 1);
        None
    }
}

/// Bootstrapper wrapping an already loaded registry
struct Available(JsonRegistry);

impl Bootstrapper for Available {
    fn application(&self) -> Option<&dyn HostApplication> {
        Some(&self.0)
    }
}

/// Host whose registry lookups always fail
struct BrokenHost;

impl HostApplication for BrokenHost {
    fn extension(
        &self,
        _element: &str,
        _extension_type: &str,
    ) -> joomla_installer::Result<Option<ExtensionRecord>> {
        Err(InstallerError::host("database gone away"))
    }
}

struct Broken(BrokenHost);

impl Bootstrapper for Broken {
    fn application(&self) -> Option<&dyn HostApplication> {
        Some(&self.0)
    }
}

// =============================================================================
// Fixtures
// =============================================================================

const COMPONENT_MANIFEST: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<extension type="component" version="3.0" method="upgrade">
    <name>DOCman</name>
    <version>3.1.0</version>
</extension>"#;

fn install_dir_with(manifest: Option<&str>) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    if let Some(content) = manifest {
        fs::write(dir.path().join("docman.xml"), content).unwrap();
    }
    dir
}

fn registry_with(records: &[(Option<u64>, &str, &str)]) -> JsonRegistry {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("registry.json");
    let extensions: Vec<ExtensionRecord> = records
        .iter()
        .map(|(id, element, extension_type)| ExtensionRecord {
            id: *id,
            element: element.to_string(),
            extension_type: extension_type.to_string(),
            version: None,
        })
        .collect();
    fs::write(
        &path,
        serde_json::json!({ "extensions": extensions }).to_string(),
    )
    .unwrap();
    JsonRegistry::load(&path).unwrap()
}

fn docman() -> Package {
    Package::new("joomlatools/docman")
}

// =============================================================================
// Short circuits
// =============================================================================

#[test]
fn test_reusable_component_needs_no_host_or_filesystem() {
    let manifests = ForbiddenManifests;
    let bootstrapper = ForbiddenBootstrapper;
    let repo = InstalledJson::default();
    let package = docman().with_extra(PackageExtra {
        reusable_component: true,
        force_update: false,
    });

    let classifier = InstallationStateClassifier::new(&manifests, &bootstrapper);
    assert!(classifier.classify(&package, Path::new("/nonexistent/vendor/docman"), &repo));
}

#[test]
fn test_unavailable_host_is_not_installed_and_asked_once() {
    let dir = install_dir_with(Some(COMPONENT_MANIFEST));
    fs::write(dir.path().join(INSTALLED_MARKER), "").unwrap();
    let manifests = ForbiddenManifests;
    let bootstrapper = Unavailable::default();
    let repo = InstalledJson::default();

    let classifier = InstallationStateClassifier::new(&manifests, &bootstrapper);
    assert!(!classifier.classify(&docman(), dir.path(), &repo));
    assert_eq!(bootstrapper.calls.get(), 1);
}

#[test]
fn test_marker_file_means_installed() {
    let registry = registry_with(&[]);
    let bootstrapper = Available(registry);
    let manifests = ManifestLocator::new();
    let repo = InstalledJson::default();
    let classifier = InstallationStateClassifier::new(&manifests, &bootstrapper);

    // Marker with no manifest at all
    let bare = install_dir_with(None);
    fs::write(bare.path().join(INSTALLED_MARKER), "anything").unwrap();
    assert!(classifier.classify(&docman(), bare.path(), &repo));

    // Marker with a broken manifest
    let broken = install_dir_with(Some("<extension type="));
    fs::write(broken.path().join(INSTALLED_MARKER), "").unwrap();
    assert!(classifier.classify(&docman(), broken.path(), &repo));

    // Marker with a manifest the registry does not know
    let unknown = install_dir_with(Some(COMPONENT_MANIFEST));
    fs::write(unknown.path().join(INSTALLED_MARKER), "").unwrap();
    assert!(classifier.classify(&docman(), unknown.path(), &repo));
}

// =============================================================================
// Registry lookups
// =============================================================================

#[test]
fn test_record_with_positive_id_is_installed() {
    let dir = install_dir_with(Some(COMPONENT_MANIFEST));
    let bootstrapper = Available(registry_with(&[(Some(5), "com_docman", "component")]));
    let manifests = ManifestLocator::new();
    let repo = InstalledJson::default();

    let classifier = InstallationStateClassifier::new(&manifests, &bootstrapper);
    assert!(classifier.classify(&docman(), dir.path(), &repo));
}

#[test]
fn test_record_with_zero_id_is_not_installed() {
    let dir = install_dir_with(Some(COMPONENT_MANIFEST));
    let bootstrapper = Available(registry_with(&[(Some(0), "com_docman", "component")]));
    let manifests = ManifestLocator::new();
    let repo = InstalledJson::default();

    let classifier = InstallationStateClassifier::new(&manifests, &bootstrapper);
    assert!(!classifier.classify(&docman(), dir.path(), &repo));
}

#[test]
fn test_record_without_id_is_not_installed() {
    let dir = install_dir_with(Some(COMPONENT_MANIFEST));
    let bootstrapper = Available(registry_with(&[(None, "com_docman", "component")]));
    let manifests = ManifestLocator::new();
    let repo = InstalledJson::default();

    let classifier = InstallationStateClassifier::new(&manifests, &bootstrapper);
    assert!(!classifier.classify(&docman(), dir.path(), &repo));
}

#[test]
fn test_no_record_is_not_installed() {
    let dir = install_dir_with(Some(COMPONENT_MANIFEST));
    // Same element, different type
    let bootstrapper = Available(registry_with(&[(Some(9), "com_docman", "module")]));
    let manifests = ManifestLocator::new();
    let repo = InstalledJson::default();

    let classifier = InstallationStateClassifier::new(&manifests, &bootstrapper);
    assert!(!classifier.classify(&docman(), dir.path(), &repo));
}

#[test]
fn test_failing_registry_is_not_installed() {
    let dir = install_dir_with(Some(COMPONENT_MANIFEST));
    let bootstrapper = Broken(BrokenHost);
    let manifests = ManifestLocator::new();
    let repo = InstalledJson::default();

    let classifier = InstallationStateClassifier::new(&manifests, &bootstrapper);
    assert!(!classifier.classify(&docman(), dir.path(), &repo));
}

#[test]
fn test_manifest_without_name_is_not_installed() {
    let dir = install_dir_with(Some(r#"<extension type="component"></extension>"#));
    let bootstrapper = Available(registry_with(&[(Some(1), "com_docman", "component")]));
    let manifests = ManifestLocator::new();
    let repo = InstalledJson::default();

    let classifier = InstallationStateClassifier::new(&manifests, &bootstrapper);
    assert!(!classifier.classify(&docman(), dir.path(), &repo));
}

// =============================================================================
// Manifest problems
// =============================================================================

#[test]
fn test_missing_manifest_does_not_consult_repository() {
    let dir = install_dir_with(None);
    let bootstrapper = Available(registry_with(&[]));
    let manifests = ManifestLocator::new();
    let mut repo = InstalledJson::default();
    repo.add_package(docman());

    let classifier = InstallationStateClassifier::new(&manifests, &bootstrapper);
    assert!(!classifier.classify(&docman(), dir.path(), &repo));
}

/// Store that points at a file regardless of its content
struct PointAt(PathBuf);

impl ManifestStore for PointAt {
    fn package_manifest(&self, _install_path: &Path) -> Option<PathBuf> {
        Some(self.0.clone())
    }

    fn set_package_manifest(&mut self, _install_path: &Path, manifest: PathBuf) {
        self.0 = manifest;
    }

    fn clear_package_manifest(&mut self, _install_path: &Path) {}
}

#[test]
fn test_unparseable_manifest_falls_back_to_repository() {
    let dir = install_dir_with(None);
    let broken = dir.path().join("broken.xml");
    fs::write(&broken, "<extension type=\"component\"><name>").unwrap();

    let bootstrapper = Available(registry_with(&[(Some(5), "com_docman", "component")]));
    let manifests = PointAt(broken);
    let classifier = InstallationStateClassifier::new(&manifests, &bootstrapper);

    let mut repo = InstalledJson::default();
    assert!(!classifier.classify(&docman(), dir.path(), &repo));

    repo.add_package(docman());
    assert!(classifier.classify(&docman(), dir.path(), &repo));
}

#[test]
fn test_foreign_xml_falls_back_to_repository() {
    let dir = install_dir_with(None);
    let config = dir.path().join("config.xml");
    fs::write(&config, "<config><fieldset/></config>").unwrap();

    let bootstrapper = Available(registry_with(&[]));
    let manifests = PointAt(config);
    let mut repo = InstalledJson::default();
    repo.add_package(docman());

    let classifier = InstallationStateClassifier::new(&manifests, &bootstrapper);
    assert!(classifier.classify(&docman(), dir.path(), &repo));
}
