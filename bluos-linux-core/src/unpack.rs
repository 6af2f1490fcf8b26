//! Installer unpacking.
//!
//! The `.dmg` is opened with `7z`, then the app's `app.asar` resource archive
//! is extracted with `npx asar` into the app source directory.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::env::tool_env;
use crate::layout::Layout;
use crate::process::{run_checked, CommandSpec, ProcessRunner};

/// Substring identifying the app entry inside the unpacked installer.
pub const BUNDLE_MARKER: &str = "BluOS Controller";

/// Location of the resource archive inside the app entry.
const ASAR_RELPATH: &str = "BluOS Controller.app/Contents/Resources/app.asar";

// ============================================================================
// Installer Extraction
// ============================================================================

/// Builds the `7z x` invocation for the downloaded installer.
pub fn installer_command(config: &Config, layout: &Layout) -> CommandSpec {
    let mut out_flag = std::ffi::OsString::from("-o");
    out_flag.push(layout.controller_dir());

    CommandSpec::new("7z")
        .arg("x")
        .arg(out_flag)
        .arg(layout.installer())
        .envs(tool_env(&config.node_bin_path))
}

/// Unpacks `controller.dmg` into `controller/`.
pub async fn extract_installer(
    config: &Config,
    layout: &Layout,
    runner: &dyn ProcessRunner,
) -> Result<()> {
    info!(
        "Extracting {} to {}",
        layout.installer().display(),
        layout.controller_dir().display()
    );

    run_checked(runner, &installer_command(config, layout))
        .await
        .context("Error extracting controller")?;

    Ok(())
}

// ============================================================================
// Resource Archive Extraction
// ============================================================================

/// Returns the entries of `dir` whose name contains [`BUNDLE_MARKER`], sorted by name.
pub fn find_bundle_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?;

    entries.sort_by_key(|e| e.file_name());

    Ok(entries
        .into_iter()
        .filter(|e| e.file_name().to_string_lossy().contains(BUNDLE_MARKER))
        .map(|e| e.path())
        .collect())
}

/// Builds the `npx asar extract` invocation for one app entry.
pub fn asar_command(config: &Config, layout: &Layout, bundle: &Path) -> CommandSpec {
    CommandSpec::new(config.node_bin("npx"))
        .arg("asar")
        .arg("extract")
        .arg(bundle.join(ASAR_RELPATH))
        .arg(layout.app_dir())
        .envs(tool_env(&config.node_bin_path))
}

/// Extracts the app's `app.asar` into `bluos/`.
///
/// Only the first matching entry is used; any further matches are logged and
/// skipped.
///
/// # Errors
///
/// Returns an error if `controller/` cannot be listed, no entry matches, or
/// the extraction command fails.
pub async fn extract_app_bundle(
    config: &Config,
    layout: &Layout,
    runner: &dyn ProcessRunner,
) -> Result<()> {
    let controller_dir = layout.controller_dir();
    let bundles = find_bundle_entries(&controller_dir)?;
    debug!("Found {} matching entries in {}", bundles.len(), controller_dir.display());

    let (bundle, extra) = bundles.split_first().with_context(|| {
        format!(
            "No entry containing \"{}\" in {}",
            BUNDLE_MARKER,
            controller_dir.display()
        )
    })?;

    for skipped in extra {
        warn!("Ignoring additional app entry {}", skipped.display());
    }

    info!("Extracting app.asar from {}", bundle.display());
    run_checked(runner, &asar_command(config, layout, bundle))
        .await
        .context("Error extracting ASAR")?;

    Ok(())
}
