//! Presentation of an insights artifact: a self-contained HTML report, a
//! console summary, and a read-only HTTP server.

pub mod charts;
pub mod format;
pub mod html;
pub mod server;
pub mod summary;

#[cfg(test)]
mod fixtures;

pub use html::render_html;
pub use server::ReportServer;
pub use summary::render_summary;

use insights_core::config::ReportConfig;
use insights_core::{InsightsArtifact, InsightsResult};
use std::path::{Path, PathBuf};
use tracing::info;

pub const REPORT_FILE: &str = "report.html";

/// Render the artifact and write it to `<dir>/report.html`.
pub fn write_report(
    artifact: &InsightsArtifact,
    config: &ReportConfig,
    dir: &Path,
) -> InsightsResult<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(REPORT_FILE);
    std::fs::write(&path, render_html(artifact, config))?;
    info!(path = %path.display(), "Report written");
    Ok(path)
}
