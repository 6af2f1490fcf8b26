//! Work-directory layout.
//!
//! Every stage reads and writes fixed names under a single work directory:
//!
//! - `controller.dmg`: the downloaded installer (`controller.dmg.tmp` while in flight)
//! - `controller/`: the unpacked installer tree
//! - `bluos/`: the extracted app sources, with `package.json`
//! - `dist/`: the final build output, moved out of `bluos/dist`

use std::path::{Path, PathBuf};

const INSTALLER_FILE: &str = "controller.dmg";
const CONTROLLER_DIR: &str = "controller";
const APP_DIR: &str = "bluos";
const DIST_DIR: &str = "dist";

/// Suffix appended to a download target while it is still being written.
pub const TEMP_SUFFIX: &str = ".tmp";

/// Resolves the pipeline's fixed paths against a work directory.
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path: `{root}/controller.dmg`
    pub fn installer(&self) -> PathBuf {
        self.root.join(INSTALLER_FILE)
    }

    /// Path: `{root}/controller.dmg.tmp`
    pub fn installer_temp(&self) -> PathBuf {
        temp_path_for(&self.installer())
    }

    /// Path: `{root}/controller/`
    pub fn controller_dir(&self) -> PathBuf {
        self.root.join(CONTROLLER_DIR)
    }

    /// Path: `{root}/bluos/`
    pub fn app_dir(&self) -> PathBuf {
        self.root.join(APP_DIR)
    }

    /// Path: `{root}/bluos/dist/`
    pub fn build_output_dir(&self) -> PathBuf {
        self.app_dir().join(DIST_DIR)
    }

    /// Path: `{root}/dist/`
    pub fn dist_dir(&self) -> PathBuf {
        self.root.join(DIST_DIR)
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::new(".")
    }
}

/// Returns `path` with [`TEMP_SUFFIX`] appended to its file name.
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(TEMP_SUFFIX);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let layout = Layout::new("/work");
        assert_eq!(layout.installer(), PathBuf::from("/work/controller.dmg"));
        assert_eq!(layout.installer_temp(), PathBuf::from("/work/controller.dmg.tmp"));
        assert_eq!(layout.controller_dir(), PathBuf::from("/work/controller"));
        assert_eq!(layout.app_dir(), PathBuf::from("/work/bluos"));
        assert_eq!(layout.build_output_dir(), PathBuf::from("/work/bluos/dist"));
        assert_eq!(layout.dist_dir(), PathBuf::from("/work/dist"));
    }

    #[test]
    fn test_default_layout_is_relative() {
        let layout = Layout::default();
        assert_eq!(layout.installer(), PathBuf::from("./controller.dmg"));
    }
}
