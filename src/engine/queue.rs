//! Deferred task queue
//!
//! Package-manager hooks fire one package at a time, possibly before the host
//! application itself is installed. Instead of touching the host from inside
//! a hook, each hook appends a [`Task`] here and the whole queue is replayed
//! once after the batch has finished.
//!
//! # Queue States
//!
//! ```text
//! Empty ──enqueue──▶ HasPending ──drain_all──▶ Empty
//! ```
//!
//! Tasks are never reordered or edited once appended. The queue is created by
//! the caller and passed to both the installer and the drain step, so there is
//! exactly one queue per run without any global state.

use std::collections::VecDeque;
use std::fmt;
use strum::{Display, EnumString};

use crate::types::PackageRef;

/// Which lifecycle action a task performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum TaskKind {
    Install,
    Update,
    Uninstall,
}

/// A deferred host-application action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    Install(PackageRef),
    Update(PackageRef),
    Uninstall(PackageRef),
}

impl Task {
    pub fn kind(&self) -> TaskKind {
        match self {
            Self::Install(_) => TaskKind::Install,
            Self::Update(_) => TaskKind::Update,
            Self::Uninstall(_) => TaskKind::Uninstall,
        }
    }

    pub fn package(&self) -> &PackageRef {
        match self {
            Self::Install(package) | Self::Update(package) | Self::Uninstall(package) => package,
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.package())
    }
}

/// Observable queue state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum QueueState {
    Empty,
    HasPending,
}

/// FIFO queue of deferred tasks
#[derive(Debug, Default)]
pub struct TaskQueue {
    tasks: VecDeque<Task>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a task to the tail
    pub fn enqueue(&mut self, task: Task) {
        tracing::trace!("Enqueued task #{}: {}", self.tasks.len() + 1, task);
        self.tasks.push_back(task);
    }

    /// Take every pending task, oldest first, leaving the queue empty
    pub fn drain_all(&mut self) -> Vec<Task> {
        self.tasks.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn state(&self) -> QueueState {
        if self.tasks.is_empty() {
            QueueState::Empty
        } else {
            QueueState::HasPending
        }
    }

    /// Pending tasks, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    /// Returns a summary of the pending tasks for logging/display.
    pub fn summary(&self) -> String {
        let mut lines = vec![format!("Pending tasks ({}):", self.tasks.len())];
        for (i, task) in self.tasks.iter().enumerate() {
            lines.push(format!("  {}. {}", i + 1, task));
        }
        lines.join("\n")
    }
}
