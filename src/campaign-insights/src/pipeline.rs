//! Stage wiring for the CLI commands. Each stage finishes before the next
//! one starts and hands its output on by value.

use anyhow::Context;
use insights_analysis::ARTIFACT_FILE;
use insights_cleaning::{load_clean_tables, write_outputs, Cleaner, CleaningOutput};
use insights_core::{InsightsArtifact, PipelineConfig};
use insights_ingest::Workbook;
use insights_reporting::{render_summary, write_report, ReportServer};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Ingest and clean the workbook, persisting the clean sheets when enabled.
pub fn clean(config: &PipelineConfig) -> anyhow::Result<CleaningOutput> {
    let workbook = Workbook::open(&config.input_path)
        .with_context(|| format!("reading workbook {}", config.input_path.display()))?;
    info!(path = %workbook.path().display(), sheets = workbook.len(), "Workbook loaded");

    let cleaner = Cleaner::new(&config.cleaning);
    let output = cleaner.clean(workbook.into_tables())?;
    for sheet in &output.missing_sheets {
        warn!(sheet = %sheet, "Sheet missing from workbook");
    }

    if config.cleaning.write_outputs {
        let files = write_outputs(&output, &config.output_dir)?;
        info!(files = files.len(), dir = %config.output_dir.display(), "Clean sheets written");
    }
    Ok(output)
}

/// Analyse the clean sheets persisted under `output_dir`.
pub fn analyze(config: &PipelineConfig) -> anyhow::Result<(InsightsArtifact, PathBuf)> {
    let cleaner = Cleaner::new(&config.cleaning);
    let cleaned = load_clean_tables(&config.output_dir, &cleaner)
        .with_context(|| format!("loading clean sheets from {}", config.output_dir.display()))?;
    let artifact = insights_analysis::analyze(&cleaned.tables, config);
    let path = insights_analysis::write_artifact(&artifact, &config.output_dir)?;
    Ok((artifact, path))
}

/// Write the HTML report for an artifact and return the console summary.
pub fn render(artifact: &InsightsArtifact, config: &PipelineConfig) -> anyhow::Result<(PathBuf, String)> {
    let path = write_report(artifact, &config.report, &config.output_dir)?;
    Ok((path, render_summary(artifact)))
}

/// Ingestion → Cleaning → Analysis → Presentation.
pub fn run(config: &PipelineConfig) -> anyhow::Result<(InsightsArtifact, String)> {
    let cleaned = clean(config)?;
    let artifact = insights_analysis::analyze(&cleaned.tables, config);
    insights_analysis::write_artifact(&artifact, &config.output_dir)?;
    let (_, summary) = render(&artifact, config)?;
    Ok((artifact, summary))
}

pub fn artifact_path(config: &PipelineConfig) -> PathBuf {
    config.output_dir.join(ARTIFACT_FILE)
}

pub fn load_artifact(path: &Path) -> anyhow::Result<InsightsArtifact> {
    insights_analysis::read_artifact(path)
        .with_context(|| format!("reading artifact {}", path.display()))
}

pub async fn serve(config: &PipelineConfig, artifact: InsightsArtifact) -> anyhow::Result<()> {
    ReportServer::new(artifact, config.report.clone()).serve().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const PIPELINE: &str = "\
Company Name,Deal Stage,Deal Value (EUR),Lead Source,Ticket Type,First Contact Date,Last Activity Date,Notes
Acme,Closed Won,12000,Referral,Delegate Pass,2026-01-03,2026-01-20,
Globex,Closed Lost,8000,Cold Outreach,Delegate Pass,2026-01-08,2026-02-10,
Initech,Negotiation,60000,Referral,Gold Sponsor,2026-01-12,2026-02-20,Awaiting board approval
Umbrella,Lead,5000,Website Inquiry,Delegate Pass,2026-02-10,2026-02-12,
";

    fn config(root: &Path) -> PipelineConfig {
        let input = root.join("raw");
        fs::create_dir_all(&input).unwrap();
        fs::write(input.join("Sales_Pipeline.csv"), PIPELINE).unwrap();
        PipelineConfig {
            input_path: input,
            output_dir: root.join("clean"),
            ..Default::default()
        }
    }

    #[test]
    fn test_run_writes_every_output() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());

        let (artifact, summary) = run(&config).unwrap();
        assert!(config.output_dir.join("Sales_Pipeline_Clean.csv").exists());
        assert!(config.output_dir.join("cleaning_report.json").exists());
        assert!(artifact_path(&config).exists());
        assert!(config.output_dir.join("report.html").exists());
        assert!(artifact.conversion.is_some());
        assert!(summary.contains("Conversion:"));

        let reloaded = load_artifact(&artifact_path(&config)).unwrap();
        assert_eq!(reloaded.metadata, artifact.metadata);
    }

    #[test]
    fn test_clean_then_analyze_matches_run() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());

        clean(&config).unwrap();
        let (artifact, path) = analyze(&config).unwrap();
        assert_eq!(path, artifact_path(&config));
        assert_eq!(artifact.targets.as_ref().map(|t| t.current_delegates), Some(1));
    }

    #[test]
    fn test_missing_input_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            input_path: dir.path().join("absent"),
            output_dir: dir.path().join("clean"),
            ..Default::default()
        };
        assert!(run(&config).is_err());
        assert!(analyze(&config).is_err());
    }
}
