//! Final cleanup of the work directory.
//!
//! Moves the build output to `dist/` and removes the intermediates. Moving the
//! output must succeed; removing intermediates is best effort and only logged.

use anyhow::{bail, Context, Result};
use std::io;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::layout::Layout;

/// Moves `bluos/dist` to `dist` and removes `bluos/`, `controller/` and `controller.dmg`.
///
/// A `dist` left by an earlier run is replaced.
///
/// # Errors
///
/// Returns an error if the build output cannot be moved; nothing is removed
/// in that case.
pub fn clean_up(layout: &Layout) -> Result<()> {
    info!("Cleaning up");

    let from = layout.build_output_dir();
    let to = layout.dist_dir();

    if !from.is_dir() {
        bail!("Build output {} not found", from.display());
    }

    if to.exists() {
        info!("Replacing previous output in {}", to.display());
        std::fs::remove_dir_all(&to)
            .with_context(|| format!("Failed to remove previous output {}", to.display()))?;
    }

    std::fs::rename(&from, &to)
        .with_context(|| format!("Failed to move {} to {}", from.display(), to.display()))?;

    log_failure(&layout.app_dir(), std::fs::remove_dir_all(layout.app_dir()));
    log_failure(
        &layout.controller_dir(),
        std::fs::remove_dir_all(layout.controller_dir()),
    );
    log_failure(&layout.installer(), std::fs::remove_file(layout.installer()));

    Ok(())
}

fn log_failure(path: &Path, result: io::Result<()>) {
    match result {
        Ok(()) => debug!("Removed {}", path.display()),
        Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
    }
}
