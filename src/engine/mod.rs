//! Engine modules: the deferred half of an installer run.
//!
//! Package hooks only record what should happen to the host application; the
//! engine holds those records and replays them once the batch is over.

pub mod drain;
pub mod queue;

pub use drain::{discard, drain, DrainReport, RegistrySync, TaskHandler};
pub use queue::{QueueState, Task, TaskKind, TaskQueue};
