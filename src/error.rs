use std::path::PathBuf;

/// Inventory-level failures that callers need to tell apart.
///
/// Infrastructure code keeps returning `anyhow::Result`; these are wrapped
/// into it and recovered with `downcast_ref` where the distinction matters.
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("Instance not found: {0}")]
    InstanceNotFound(String),

    #[error("Mod {slug} is not installed in instance {instance}")]
    ModNotFound { instance: String, slug: String },

    /// The inventory document exists but cannot be read back.
    #[error("Corrupt inventory document at {path:?}: {source}")]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Artifact {filename} of instance {instance} is missing on disk")]
    ArtifactMissing { instance: String, filename: String },

    /// A name that would not stay inside its directory once joined onto it.
    #[error("Invalid {kind} name {name:?}")]
    InvalidName { kind: &'static str, name: String },
}
