//! Directories and platform information.

use std::path::PathBuf;

use super::RealRuntime;

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn data_dir_impl(&self) -> Option<PathBuf> {
        dirs::data_dir()
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn platform_level_impl(&self) -> Option<u32> {
        #[cfg(target_os = "android")]
        {
            let output = std::process::Command::new("getprop")
                .arg("ro.build.version.sdk")
                .output()
                .ok()?;
            String::from_utf8_lossy(&output.stdout).trim().parse().ok()
        }

        #[cfg(not(target_os = "android"))]
        {
            None
        }
    }
}
