use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// joomla-installer - Queue and apply Joomla extension installs from a package manager
#[derive(Parser)]
#[command(name = "joomla-installer")]
#[command(about = "Installs, upgrades and removes Joomla extensions managed by a package manager")]
#[command(version)]
pub struct Cli {
    /// Print per-package progress (debug-level logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to installer configuration file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the vendor directory from the configuration
    #[arg(long, global = true)]
    pub vendor_dir: Option<PathBuf>,

    /// Override the host registry file from the configuration
    #[arg(long, global = true)]
    pub registry: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Apply a batch of package operations, then replay the queued tasks
    Run {
        /// Path to the batch file (JSON)
        batch: PathBuf,

        /// Only queue tasks and print them; leave the host registry untouched
        #[arg(long)]
        no_drain: bool,
    },
    /// Report whether an installed package is already known to the host
    Classify {
        /// Package name, e.g. joomlatools/docman
        name: String,
    },
    /// Exit successfully if the package type is handled by this installer
    Supports {
        /// Package type, e.g. joomlatools-extension
        package_type: String,
    },
    /// Validate a configuration file
    Validate {
        /// Path to configuration file to validate
        config: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }
}
