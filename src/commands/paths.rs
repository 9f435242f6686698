use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::runtime::Runtime;

/// Work directory used when neither `--root` nor `MODKEEP_ROOT` is given.
#[tracing::instrument(skip(runtime))]
pub fn default_root<R: Runtime>(runtime: &R) -> Result<PathBuf> {
    let data_dir = runtime
        .data_dir()
        .context("Could not find the user data directory")?;
    Ok(data_dir.join("modkeep"))
}
