//! Logic modules: decisions made about a package before anything is queued.
//!
//! # Modules
//!
//! - `classifier`: Is a package already present in the host application?

pub mod classifier;

pub use classifier::{InstallationStateClassifier, INSTALLED_MARKER};
