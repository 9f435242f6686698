//! On-disk layout of the work directory.
//!
//! ```text
//! <root>/
//!   mods.json                 inventory document
//!   settings.json             optional settings
//!   compat/modrinth.json      compatibility table
//!   instances/<name>/<file>   artifacts, optionally with DISABLED_SUFFIX
//! ```

use anyhow::Result;
use log::warn;
use std::path::{Component, Path, PathBuf};

use crate::registry::Platform;
use crate::runtime::Runtime;

/// Appended to the file name of a disabled artifact.
pub const DISABLED_SUFFIX: &str = ".disabled";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkDir {
    root: PathBuf,
}

impl WorkDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn inventory_path(&self) -> PathBuf {
        self.root.join("mods.json")
    }

    pub fn settings_path(&self) -> PathBuf {
        self.root.join("settings.json")
    }

    pub fn compat_path(&self, platform: Platform) -> PathBuf {
        self.root.join("compat").join(format!("{}.json", platform))
    }

    pub fn instance_dir(&self, instance: &str) -> PathBuf {
        self.root.join("instances").join(instance)
    }
}

/// File name of an artifact in the given state.
pub fn artifact_name(filename: &str, active: bool) -> String {
    if active {
        filename.to_string()
    } else {
        format!("{}{}", filename, DISABLED_SUFFIX)
    }
}

/// Whether `name` can be joined onto a directory without leaving it.
///
/// Accepts exactly one normal path component: no separators, no `.`/`..`,
/// no root or drive prefix.
pub fn is_plain_name(name: &str) -> bool {
    if name.contains(['/', '\\']) {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Find the artifact recorded as `filename` in `dir`, enabled or disabled.
///
/// The name matching the recorded state (`active`) wins when both an
/// enabled and a disabled copy are present.
pub fn find_artifact<R: Runtime + ?Sized>(
    runtime: &R,
    dir: &Path,
    filename: &str,
    active: bool,
) -> Result<Option<PathBuf>> {
    if !runtime.exists(dir) {
        return Ok(None);
    }

    let candidates: Vec<PathBuf> = runtime
        .read_dir(dir)?
        .into_iter()
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(|name| name.strip_suffix(DISABLED_SUFFIX).unwrap_or(name) == filename)
                .unwrap_or(false)
        })
        .collect();

    if candidates.len() > 1 {
        warn!(
            "Both enabled and disabled copies of {} exist in {:?}",
            filename, dir
        );
    }
    let expected = artifact_name(filename, active);
    let exact = candidates
        .iter()
        .position(|path| path.file_name().and_then(|n| n.to_str()) == Some(expected.as_str()));

    Ok(match exact {
        Some(index) => candidates.into_iter().nth(index),
        None => candidates.into_iter().next(),
    })
}
