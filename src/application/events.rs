//! Completion reports of background operations.

use std::fmt;

use crate::error::InventoryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Add,
    Remove,
    Toggle,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Add => write!(f, "add"),
            OperationKind::Remove => write!(f, "remove"),
            OperationKind::Toggle => write!(f, "toggle"),
        }
    }
}

/// Why an operation ended without doing anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    InstanceNotFound,
    ModNotFound,
    /// Unknown platform, unknown project, or no build for the game version
    NotInRegistry,
    AlreadyInstalled,
    /// Host platform level is below the configured floor
    PlatformUnsupported,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SkipReason::InstanceNotFound => "instance not found",
            SkipReason::ModNotFound => "mod not installed",
            SkipReason::NotInRegistry => "no compatible release in the registry",
            SkipReason::AlreadyInstalled => "already installed",
            SkipReason::PlatformUnsupported => "not supported on this platform version",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Skipped(SkipReason),
    /// The operation was abandoned; the inventory is as before the call.
    Failed(String),
}

impl Outcome {
    /// Fold an operation result into an outcome. Lookup misses become skips.
    pub(crate) fn from_result(result: anyhow::Result<Outcome>) -> Self {
        result.unwrap_or_else(|e| match e.downcast_ref::<InventoryError>() {
            Some(InventoryError::InstanceNotFound(_)) => {
                Outcome::Skipped(SkipReason::InstanceNotFound)
            }
            Some(InventoryError::ModNotFound { .. }) => Outcome::Skipped(SkipReason::ModNotFound),
            _ => Outcome::Failed(format!("{:#}", e)),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModEvent {
    pub kind: OperationKind,
    pub instance: String,
    pub slug: String,
    pub outcome: Outcome,
}

impl ModEvent {
    pub fn is_completed(&self) -> bool {
        self.outcome == Outcome::Completed
    }
}

impl fmt::Display for ModEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}/{}: ", self.kind, self.instance, self.slug)?;
        match &self.outcome {
            Outcome::Completed => write!(f, "done"),
            Outcome::Skipped(reason) => write!(f, "skipped ({})", reason),
            Outcome::Failed(message) => write!(f, "failed: {}", message),
        }
    }
}
