//! Search-path helpers for external tools.
//!
//! Child processes get `nodeBinPath` prepended to the inherited `PATH`, so
//! tools that shell out to `node` or `npm` themselves find the configured
//! toolchain. The current process environment is never modified.

use std::path::Path;

/// Returns the PATH separator for the current platform.
#[inline]
fn path_separator() -> &'static str {
    #[cfg(windows)]
    {
        ";"
    }
    #[cfg(not(windows))]
    {
        ":"
    }
}

/// Prepends `bin_dir` to an existing PATH value.
///
/// When `existing` is `None` the inherited `PATH` is used.
pub fn prepend_to_path(bin_dir: &Path, existing: Option<&str>) -> String {
    let base_path = existing
        .map(|s| s.to_string())
        .or_else(|| std::env::var("PATH").ok())
        .unwrap_or_default();

    let bin = bin_dir.to_string_lossy();
    if bin.is_empty() {
        return base_path;
    }

    if base_path.is_empty() {
        bin.into_owned()
    } else {
        format!("{}{}{}", bin, path_separator(), base_path)
    }
}

/// Returns the environment overrides applied to every external tool.
pub fn tool_env(bin_dir: &Path) -> Vec<(String, String)> {
    vec![("PATH".to_string(), prepend_to_path(bin_dir, None))]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_path_separator() {
        let sep = path_separator();
        #[cfg(windows)]
        assert_eq!(sep, ";");
        #[cfg(not(windows))]
        assert_eq!(sep, ":");
    }

    #[cfg(unix)]
    #[test]
    fn test_prepend_to_path() {
        let path = prepend_to_path(&PathBuf::from("/usr/local/bin"), Some("/usr/bin:/bin"));
        assert_eq!(path, "/usr/local/bin:/usr/bin:/bin");
    }

    #[test]
    fn test_prepend_to_empty_path() {
        let path = prepend_to_path(&PathBuf::from("/opt/node/bin"), Some(""));
        assert_eq!(path, "/opt/node/bin");
    }

    #[test]
    fn test_tool_env_sets_path() {
        let env = tool_env(&PathBuf::from("/opt/node/bin"));
        assert_eq!(env.len(), 1);
        assert_eq!(env[0].0, "PATH");
        assert!(env[0].1.starts_with("/opt/node/bin"));
    }
}
