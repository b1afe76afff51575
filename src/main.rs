//! joomla-installer - Main entry point
//!
//! Replays a package-manager batch through the extension installer and then
//! applies the queued tasks to the host registry in a single pass.

use anyhow::{Context, Result};
use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use joomla_installer::cli::{Cli, Commands};
use joomla_installer::{
    discard, drain, Batch, ExtensionInstaller, InstalledJson, InstalledRepository, InstallerConfig,
    JsonRegistry, LibraryFiles, ManifestLocator, Package, PackageType, RegistryBootstrapper,
    RegistrySync, TaskQueue,
};

/// Initialize the tracing subscriber; `RUST_LOG` overrides the default level
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "joomla_installer=debug"
    } else {
        "joomla_installer=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_tracing(cli.verbose);
    debug!("CLI arguments parsed");

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    match &cli.command {
        Commands::Validate { config } => {
            info!("Validating configuration file: {:?}", config);
            let config = InstallerConfig::load_from_file(config)?;
            config.validate()?;
            println!("✓ Configuration file is valid: {:?}", config);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Supports { package_type } => {
            if PackageType::supports(package_type) {
                println!("{} is supported", package_type);
                Ok(ExitCode::SUCCESS)
            } else {
                println!("{} is not supported", package_type);
                Ok(ExitCode::FAILURE)
            }
        }
        Commands::Run { batch, no_drain } => {
            let config = load_config(cli)?;
            run_batch(&config, batch, *no_drain)
        }
        Commands::Classify { name } => {
            let config = load_config(cli)?;
            classify(&config, name)
        }
    }
}

/// Configuration file (or defaults) with command line overrides applied
fn load_config(cli: &Cli) -> Result<InstallerConfig> {
    let mut config = match &cli.config {
        Some(path) => InstallerConfig::load_from_file(path)?,
        None => InstallerConfig::default(),
    };

    if let Some(vendor_dir) = &cli.vendor_dir {
        config.vendor_dir = vendor_dir.clone();
    }
    if let Some(registry) = &cli.registry {
        config.registry_path = registry.clone();
    }

    config.validate()?;
    debug!("Using configuration: {:?}", config);
    Ok(config)
}

fn build_installer(config: &InstallerConfig) -> ExtensionInstaller {
    ExtensionInstaller::new(
        Box::new(LibraryFiles::new(&config.vendor_dir)),
        Box::new(ManifestLocator::new()),
        Box::new(RegistryBootstrapper::new(&config.registry_path)),
    )
    .with_platform(config.platform)
    .with_temp_dir(config.temp_dir())
}

fn run_batch(config: &InstallerConfig, batch_path: &Path, no_drain: bool) -> Result<ExitCode> {
    let batch = Batch::load_from_file(batch_path)?;
    let mut repo = InstalledJson::load(&config.installed_path)
        .with_context(|| format!("Failed to load {:?}", config.installed_path))?;
    let mut installer = build_installer(config);
    let mut queue = TaskQueue::new();

    info!(
        "Applying {} package operations for {}",
        batch.operations.len(),
        config.platform
    );

    // Files placed before a failure are already on disk; record them either way
    let applied = batch.apply(&mut installer, &mut repo, &mut queue);
    repo.save()
        .with_context(|| format!("Failed to save {:?}", config.installed_path))?;
    let report = applied?;

    for name in &report.skipped {
        warn!("Uninstall of {} was skipped", name);
    }
    debug!("{}", queue.summary());

    if no_drain {
        println!("{}", queue.summary());
        // Nothing will replay these tasks, so their preserved manifests go too
        let discarded = discard(&mut queue);
        debug!("Discarded {} queued tasks", discarded.len());
        return Ok(ExitCode::SUCCESS);
    }

    // The host is bootstrapped once, after every package has been placed
    let mut registry = match JsonRegistry::load(&config.registry_path) {
        Ok(registry) => registry,
        Err(e) => {
            error!(
                "Cannot instantiate {} from {:?} ({}); {} queued tasks were not applied",
                config.platform,
                config.registry_path,
                e,
                queue.len()
            );
            return Ok(ExitCode::FAILURE);
        }
    };

    let drained = {
        let mut sync = RegistrySync::new(&mut registry, installer.manifests());
        drain(&mut queue, &mut sync)
    };
    registry
        .save()
        .with_context(|| format!("Failed to save {:?}", config.registry_path))?;

    println!(
        "✓ {} tasks applied, {} failed, {} skipped, {} unsupported",
        drained.completed.len(),
        drained.failed.len(),
        report.skipped.len(),
        report.unsupported.len()
    );

    if drained.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn classify(config: &InstallerConfig, name: &str) -> Result<ExitCode> {
    let repo = InstalledJson::load(&config.installed_path)
        .with_context(|| format!("Failed to load {:?}", config.installed_path))?;
    let package = repo
        .find_package(name)
        .cloned()
        .unwrap_or_else(|| Package::new(name));

    let installer = build_installer(config);
    if installer.is_installed(&repo, &package) {
        println!("{} is installed in {}", name, config.platform);
        Ok(ExitCode::SUCCESS)
    } else {
        println!("{} is not installed in {}", name, config.platform);
        Ok(ExitCode::FAILURE)
    }
}
