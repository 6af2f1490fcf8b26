//! The repackaging pipeline.
//!
//! Stages run strictly in order and share state only through the work
//! directory. The first failing stage aborts the run; its error carries the
//! stage's label.

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::cleanup::clean_up;
use crate::config::Config;
use crate::downloader::{download_file, DownloadProgress};
use crate::http::HttpSource;
use crate::layout::Layout;
use crate::npm::{add_dev_dependency, build_package, BUILD_DEPENDENCIES};
use crate::patch::{apply_patch, PatchOutcome, LINUX_PATCHES};
use crate::process::ProcessRunner;
use crate::resolver::resolve_latest;
use crate::unpack::{extract_app_bundle, extract_installer};

/// Runs every stage from page scrape to cleanup.
pub struct Pipeline<'a> {
    config: &'a Config,
    layout: Layout,
    http: &'a dyn HttpSource,
    runner: &'a dyn ProcessRunner,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a Config,
        layout: Layout,
        http: &'a dyn HttpSource,
        runner: &'a dyn ProcessRunner,
    ) -> Self {
        Self {
            config,
            layout,
            http,
            runner,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Runs the pipeline, reporting download progress through `progress_cb`.
    pub async fn run<F>(&self, progress_cb: F) -> Result<()>
    where
        F: Fn(DownloadProgress),
    {
        info!("Finding Latest BluOS Controller");
        let url = resolve_latest(self.http, &self.config.downloads_page)
            .await
            .context("Error getting latest client URL")?;

        info!("Downloading Latest BluOS Controller: {}", url);
        download_file(self.http, &url, &self.layout.installer(), progress_cb)
            .await
            .context("Error downloading latest controller dmg")?;

        info!("Extracting BluOS Controller DMG");
        extract_installer(self.config, &self.layout, self.runner)
            .await
            .context("Error extracting controller dmg")?;

        info!("Extracting ASAR");
        extract_app_bundle(self.config, &self.layout, self.runner)
            .await
            .context("Error extracting app.asar")?;

        self.apply_patches()?;

        for package in BUILD_DEPENDENCIES {
            add_dev_dependency(self.config, &self.layout, self.runner, package).await?;
        }

        build_package(self.config, &self.layout, self.runner).await?;

        clean_up(&self.layout).context("Error moving build output to dist")?;

        info!("Done: output in {}", self.layout.dist_dir().display());
        Ok(())
    }

    /// Applies [`LINUX_PATCHES`], failing on the first missing anchor.
    fn apply_patches(&self) -> Result<()> {
        let app_dir = self.layout.app_dir();

        for patch in LINUX_PATCHES {
            let outcome = apply_patch(&app_dir, patch)
                .with_context(|| format!("Error patching {}", patch.label))?;

            if outcome == PatchOutcome::AnchorMissing {
                bail!(
                    "Error patching {}: anchor not found in {}",
                    patch.label,
                    app_dir.join(patch.file).display()
                );
            }
        }

        Ok(())
    }
}
