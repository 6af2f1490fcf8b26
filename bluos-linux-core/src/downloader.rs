//! Streaming file downloader with progress reporting.
//!
//! The body is written to `<dest>.tmp` and only renamed to `dest` once the
//! whole stream has been written and flushed, so a partial download never
//! shows up under the final name.

use anyhow::{Context, Result};
use futures::StreamExt;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::http::HttpSource;
use crate::layout::temp_path_for;

// ============================================================================
// Download Progress
// ============================================================================

/// Progress information during a download.
#[derive(Debug, Clone)]
pub struct DownloadProgress {
    /// Bytes downloaded so far.
    pub bytes_downloaded: u64,
    /// Total bytes expected (if known from Content-Length header).
    pub total_bytes: Option<u64>,
    /// Progress percentage (0.0 to 100.0), or None if total is unknown.
    pub percent: Option<f32>,
    /// Set on the last report, once the file is in place under its final name.
    pub finished: bool,
}

impl DownloadProgress {
    fn new(bytes_downloaded: u64, total_bytes: Option<u64>) -> Self {
        let percent = total_bytes.map(|total| {
            if total > 0 {
                (bytes_downloaded as f32 / total as f32) * 100.0
            } else {
                0.0
            }
        });

        Self {
            bytes_downloaded,
            total_bytes,
            percent,
            finished: false,
        }
    }

    fn mark_finished(mut self) -> Self {
        self.finished = true;
        self
    }
}

// ============================================================================
// Download Function
// ============================================================================

/// Downloads `url` to `dest`, reporting cumulative progress after every chunk.
///
/// A final report with `finished` set follows the rename, whether or not the
/// server sent a `Content-Length`.
///
/// # Returns
///
/// The total number of bytes downloaded.
///
/// # Errors
///
/// Returns an error if the temp file cannot be created or written, or if the
/// request or the body stream fails. In every failure case the `.tmp` file is
/// left in place and `dest` is not created.
pub async fn download_file<F>(
    http: &dyn HttpSource,
    url: &str,
    dest: &Path,
    progress_cb: F,
) -> Result<u64>
where
    F: Fn(DownloadProgress),
{
    info!("Downloading {} to {}", url, dest.display());

    let temp_path = temp_path_for(dest);

    // Create the temp file first; a stale one from an earlier run is truncated.
    let mut file = File::create(&temp_path)
        .await
        .with_context(|| format!("Failed to create file: {}", temp_path.display()))?;

    let (mut stream, total_bytes) = http
        .get_stream(url)
        .await
        .with_context(|| format!("Failed to start download from {}", url))?;
    debug!("Content-Length: {:?}", total_bytes);

    let mut bytes_downloaded: u64 = 0;
    progress_cb(DownloadProgress::new(0, total_bytes));

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.context("Failed to read chunk from response stream")?;

        file.write_all(&chunk)
            .await
            .context("Failed to write chunk to file")?;

        bytes_downloaded += chunk.len() as u64;
        progress_cb(DownloadProgress::new(bytes_downloaded, total_bytes));
    }

    file.flush().await.context("Failed to flush file")?;
    drop(file);

    tokio::fs::rename(&temp_path, dest)
        .await
        .with_context(|| {
            format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                dest.display()
            )
        })?;

    progress_cb(DownloadProgress::new(bytes_downloaded, total_bytes).mark_finished());

    info!(
        "Download complete: {} bytes written to {}",
        bytes_downloaded,
        dest.display()
    );

    Ok(bytes_downloaded)
}
