//! Runs every analysis over the clean tables and assembles the artifact.
//!
//! Each analysis is independent. One that fails is logged, counted and
//! recorded in `degraded`; its section stays empty and the run carries on.

use crate::kpis::{self, KpiSources};
use crate::tables::TableSet;
use crate::{channels, clustering, conversion, hidden, recommendations, regression, roi, targets};
use chrono::Utc;
use insights_core::artifact::{ArtifactMetadata, DegradedAnalysis};
use insights_core::{CleanTable, InsightsArtifact, InsightsError, InsightsResult, PipelineConfig};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

pub const ARTIFACT_FILE: &str = "insights.json";

/// Collects degraded analyses while the sections are computed.
#[derive(Default)]
struct Outcomes {
    degraded: Vec<DegradedAnalysis>,
}

impl Outcomes {
    fn keep<T>(&mut self, analysis: &str, result: InsightsResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                let reason = match e {
                    InsightsError::AnalysisDegraded { reason, .. } => reason,
                    other => other.to_string(),
                };
                warn!(analysis, reason = %reason, "Analysis degraded");
                metrics::counter!("analysis.degraded").increment(1);
                self.degraded.push(DegradedAnalysis {
                    analysis: analysis.to_string(),
                    reason,
                });
                None
            }
        }
    }
}

/// Analyse the clean tables under `config`. Never fails: analyses that
/// cannot run are listed in the artifact's `degraded` section.
pub fn analyze(tables: &[CleanTable], config: &PipelineConfig) -> InsightsArtifact {
    let set = TableSet::new(tables);
    let mut outcomes = Outcomes::default();
    let mut warnings = Vec::new();
    let seed = config.random_seed;

    info!(sheets = tables.len(), seed, "Starting analysis");

    let channels = outcomes.keep(channels::ANALYSIS, channels::analyze(&set));
    let roi = outcomes.keep(roi::ANALYSIS, roi::analyze(&set, &config.roi));
    let conversion = outcomes.keep(conversion::ANALYSIS, conversion::analyze(&set));

    let forecast = outcomes.keep(
        regression::ANALYSIS,
        set.require(regression::ANALYSIS, &config.forecast.sheet)
            .and_then(|t| regression::forecast(t, &config.forecast, &config.forecast_target, seed)),
    );

    let clusters = outcomes
        .keep(
            clustering::ANALYSIS,
            set.require(clustering::ANALYSIS, &config.clustering.sheet)
                .and_then(|t| clustering::cluster(t, &config.clustering, config.cluster_count, seed)),
        )
        .map(|(result, warning)| {
            if let Some(w) = warning {
                warnings.push(w);
            }
            result
        });

    let targets = outcomes.keep(targets::ANALYSIS, targets::analyze(&set, &config.targets));
    let hidden = outcomes.keep(
        hidden::ANALYSIS,
        hidden::analyze(&set, &config.hidden, conversion.as_ref()),
    );

    let kpis = kpis::compute(
        &set,
        KpiSources {
            channels: channels.as_ref(),
            roi: roi.as_ref(),
            conversion: conversion.as_ref(),
            targets: targets.as_ref(),
            hidden: hidden.as_ref(),
        },
    );
    let recommendations = recommendations::generate(
        roi.as_ref(),
        conversion.as_ref(),
        hidden.as_ref(),
        targets.as_ref(),
    );

    let artifact = InsightsArtifact {
        metadata: ArtifactMetadata {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            random_seed: seed,
            cluster_count: config.cluster_count,
            forecast_target: config.forecast_target.clone(),
            sheets_analyzed: set.names(),
        },
        kpis: Some(kpis),
        channels,
        roi,
        conversion,
        forecast,
        clusters,
        targets,
        hidden,
        recommendations,
        degraded: outcomes.degraded,
        warnings,
    };

    info!(
        run_id = %artifact.metadata.run_id,
        degraded = artifact.degraded.len(),
        warnings = artifact.warnings.len(),
        recommendations = artifact.recommendations.len(),
        "Analysis complete"
    );
    artifact
}

/// Write the artifact as pretty JSON to `<dir>/insights.json`.
pub fn write_artifact(artifact: &InsightsArtifact, dir: &Path) -> InsightsResult<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(ARTIFACT_FILE);
    std::fs::write(&path, serde_json::to_string_pretty(artifact)?)?;
    info!(path = %path.display(), "Insights artifact written");
    Ok(path)
}

pub fn read_artifact(path: &Path) -> InsightsResult<InsightsArtifact> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| InsightsError::source_unreadable(path.display(), e))?;
    Ok(serde_json::from_str(&json)?)
}
