//! Literal patches applied to the extracted app scripts.
//!
//! Each patch replaces the first occurrence of an exact anchor string in one
//! file. A missing anchor leaves the file untouched and is reported as
//! [`PatchOutcome::AnchorMissing`]; it is up to the caller to decide whether
//! that is fatal.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while patching a file.
#[derive(Debug, Error)]
pub enum PatchError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not valid UTF-8", .path.display())]
    Encoding { path: PathBuf },
}

// =============================================================================
// Patch Definitions
// =============================================================================

/// An exact search-and-replace applied to one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiteralPatch {
    /// Short description used in logs.
    pub label: &'static str,
    /// File path relative to the app source directory.
    pub file: &'static str,
    pub anchor: &'static str,
    pub replacement: &'static str,
}

/// Result of applying a [`LiteralPatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    /// The anchor was found and its first occurrence replaced.
    Applied,
    /// The anchor was not found; the file is unchanged.
    AnchorMissing,
}

/// Patches that make the macOS build run on Linux.
pub const LINUX_PATCHES: &[LiteralPatch] = &[
    LiteralPatch {
        label: "electron.js - Spotify path",
        file: "www/js/electron.js",
        anchor: r#"    if(platform=='mac'){
        path = "/Applications/Spotify.app"
    }"#,
        replacement: r#"    if(platform=='mac'){
        path = "/Applications/Spotify.app"
    }
    if(platform=='lin64') { path = "/snap/bin/spotify" }"#,
    },
    LiteralPatch {
        label: "app.js - Update Check",
        file: "www/app.js",
        anchor: r#"f7.checkAppUpdate=function(e){var t;"macOS"==f7.appInfo.platform&&(t="http://upgrade.nadelectronics.com/desktop_app/osx/version.xml?currentVersion"),"Windows"==f7.appInfo.platform&&(t="http://upgrade.nadelectronics.com/desktop_app/windows/version.xml?currentVersion")"#,
        replacement: r#"f7.checkAppUpdate=function(e){var t;"linux" == f7.appInfo.platform && (t = "http://upgrade.nadelectronics.com/desktop_app/osx/version.xml?currentVersion"), "macOS"==f7.appInfo.platform&&(t="http://upgrade.nadelectronics.com/desktop_app/osx/version.xml?currentVersion"),"Windows"==f7.appInfo.platform&&(t="http://upgrade.nadelectronics.com/desktop_app/windows/version.xml?currentVersion")"#,
    },
    LiteralPatch {
        label: "app.js - Update Platform",
        file: "www/app.js",
        anchor: r#".autoupgrade,queue:{loading:!1,pagesize:200,total:0}}"#,
        replacement: r#".autoupgrade,queue:{loading:!1,pagesize:200,total:0},platform: "linux"}"#,
    },
];

// =============================================================================
// Application
// =============================================================================

/// Replaces the first occurrence of `anchor` in `content`.
///
/// Returns `None` if the anchor does not occur.
pub fn replace_first(content: &str, anchor: &str, replacement: &str) -> Option<String> {
    content
        .contains(anchor)
        .then(|| content.replacen(anchor, replacement, 1))
}

/// Applies `patch` to its file under `app_dir`.
///
/// The file is rewritten in place, so its permission bits are kept. Nothing is
/// written when the anchor is missing.
pub fn apply_patch(app_dir: &Path, patch: &LiteralPatch) -> Result<PatchOutcome, PatchError> {
    let path = app_dir.join(patch.file);
    info!("Patching {}", patch.label);

    let bytes = fs::read(&path).map_err(|source| PatchError::Read {
        path: path.clone(),
        source,
    })?;
    let content =
        String::from_utf8(bytes).map_err(|_| PatchError::Encoding { path: path.clone() })?;

    let Some(patched) = replace_first(&content, patch.anchor, patch.replacement) else {
        warn!("Anchor for {} not found in {}", patch.label, path.display());
        return Ok(PatchOutcome::AnchorMissing);
    };

    fs::write(&path, patched).map_err(|source| PatchError::Write {
        path: path.clone(),
        source,
    })?;

    debug!("Patched {}", path.display());
    Ok(PatchOutcome::Applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PATCH: LiteralPatch = LiteralPatch {
        label: "test",
        file: "www/app.js",
        anchor: "total:0}}",
        replacement: "total:0},platform: \"linux\"}",
    };

    fn write_app_js(root: &Path, content: &str) -> PathBuf {
        let path = root.join(PATCH.file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_replace_first_only() {
        assert_eq!(replace_first("a-b-a", "a", "c"), Some("c-b-a".to_string()));
        assert_eq!(replace_first("abc", "x", "y"), None);
    }

    #[test]
    fn test_apply_patch_single_occurrence() {
        let dir = TempDir::new().unwrap();
        let before = "var s={queue:{total:0}};\nfunction f(){return 1}\n";
        let path = write_app_js(dir.path(), before);

        let outcome = apply_patch(dir.path(), &PATCH).unwrap();

        assert_eq!(outcome, PatchOutcome::Applied);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "var s={queue:{total:0},platform: \"linux\"};\nfunction f(){return 1}\n"
        );
    }

    #[test]
    fn test_apply_patch_missing_anchor_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let before = "var s={queue:{total:1}};\r\n\u{feff}unchanged\n";
        let path = write_app_js(dir.path(), before);

        let outcome = apply_patch(dir.path(), &PATCH).unwrap();

        assert_eq!(outcome, PatchOutcome::AnchorMissing);
        assert_eq!(fs::read(&path).unwrap(), before.as_bytes());
    }

    #[test]
    fn test_apply_patch_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = apply_patch(dir.path(), &PATCH).unwrap_err();
        assert!(matches!(err, PatchError::Read { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_apply_patch_preserves_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = write_app_js(dir.path(), "queue:{total:0}}");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

        apply_patch(dir.path(), &PATCH).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
    }

    #[test]
    fn test_linux_patches_target_known_files() {
        assert_eq!(LINUX_PATCHES.len(), 3);
        for patch in LINUX_PATCHES {
            assert!(patch.file.starts_with("www/"));
            assert_ne!(patch.anchor, patch.replacement);
        }
    }
}
