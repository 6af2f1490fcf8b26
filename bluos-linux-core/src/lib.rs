//! bluos-linux Core Library
//!
//! Repackages the BluOS Controller macOS installer as a Linux Snap and
//! AppImage. It includes:
//!
//! - Configuration loading (`config.yaml`)
//! - Scraping the vendor downloads page for the latest installer
//! - Streaming download with progress reporting
//! - Unpacking the `.dmg` and the bundled `app.asar`
//! - Literal patches to the app scripts
//! - npm / electron-builder invocation and final cleanup

pub mod cleanup;
pub mod config;
pub mod downloader;
pub mod env;
pub mod http;
pub mod layout;
pub mod npm;
pub mod patch;
pub mod pipeline;
pub mod process;
pub mod resolver;
pub mod unpack;

// Re-exports for convenience
pub use config::{Config, ConfigError, DEFAULT_CONFIG_FILE, DEFAULT_DOWNLOADS_PAGE};
pub use downloader::DownloadProgress;
pub use http::{HttpError, HttpSource, ReqwestSource};
pub use layout::Layout;
pub use patch::{LiteralPatch, PatchError, PatchOutcome, LINUX_PATCHES};
pub use pipeline::Pipeline;
pub use process::{CommandSpec, ProcessError, ProcessOutput, ProcessRunner, SystemRunner};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
