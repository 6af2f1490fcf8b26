//! npm and electron-builder invocations in the app source directory.

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::env::tool_env;
use crate::layout::Layout;
use crate::process::{run_checked, CommandSpec, ProcessRunner};

/// Dev dependencies added before the build, in install order.
pub const BUILD_DEPENDENCIES: &[&str] = &["electron@^9.0.0", "electron-builder"];

/// Builds `npm install <package> --save-dev`, run in `bluos/` with
/// `nodeBinPath` ahead of the inherited `PATH`.
pub fn add_dev_dependency_command(config: &Config, layout: &Layout, package: &str) -> CommandSpec {
    CommandSpec::new(config.node_bin("npm"))
        .arg("install")
        .arg(package)
        .arg("--save-dev")
        .current_dir(layout.app_dir())
        .envs(tool_env(&config.node_bin_path))
}

/// Builds the `electron-builder` invocation. Targets come from the app's own
/// `package.json`.
pub fn build_command(config: &Config, layout: &Layout) -> CommandSpec {
    CommandSpec::new(config.node_bin("electron-builder"))
        .current_dir(layout.app_dir())
        .envs(tool_env(&config.node_bin_path))
}

/// Runs `npm install <package> --save-dev` in `bluos/`.
pub async fn add_dev_dependency(
    config: &Config,
    layout: &Layout,
    runner: &dyn ProcessRunner,
    package: &str,
) -> Result<()> {
    info!("Adding {} dependency", package);
    run_checked(runner, &add_dev_dependency_command(config, layout, package))
        .await
        .with_context(|| format!("Error installing {}", package))?;
    Ok(())
}

/// Runs `electron-builder` in `bluos/`, producing `bluos/dist`.
pub async fn build_package(
    config: &Config,
    layout: &Layout,
    runner: &dyn ProcessRunner,
) -> Result<()> {
    info!("Building Snap and AppImage");
    run_checked(runner, &build_command(config, layout))
        .await
        .context("Error building Snap and AppImage")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_add_dev_dependency_command() {
        let config = Config::new("/usr/local/bin");
        let layout = Layout::new("/work");
        let spec = add_dev_dependency_command(&config, &layout, "electron@^9.0.0");

        assert_eq!(
            spec.to_string(),
            "/usr/local/bin/npm install electron@^9.0.0 --save-dev"
        );
        assert_eq!(spec.current_dir, Some(PathBuf::from("/work/bluos")));
        let (key, path) = &spec.env[0];
        assert_eq!(key, "PATH");
        assert!(path.starts_with("/usr/local/bin"));
    }

    #[test]
    fn test_build_command() {
        let config = Config::new("/opt/node/bin");
        let layout = Layout::new("/work");
        let spec = build_command(&config, &layout);

        assert_eq!(spec.program, PathBuf::from("/opt/node/bin/electron-builder"));
        assert!(spec.args.is_empty());
        assert_eq!(spec.current_dir, Some(PathBuf::from("/work/bluos")));
    }
}
