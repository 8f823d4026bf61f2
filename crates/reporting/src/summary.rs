//! Plain-text summary printed to the console after a run.

use crate::format::{eur, percent, ratio};
use insights_core::InsightsArtifact;

pub fn render_summary(artifact: &InsightsArtifact) -> String {
    let mut lines: Vec<String> = Vec::new();
    let meta = &artifact.metadata;
    lines.push(format!("Campaign insights · run {}", meta.run_id));
    lines.push(format!(
        "  sheets: {} · seed {} · k={}",
        if meta.sheets_analyzed.is_empty() {
            "none".to_string()
        } else {
            meta.sheets_analyzed.join(", ")
        },
        meta.random_seed,
        meta.cluster_count
    ));

    if let Some(k) = &artifact.kpis {
        lines.push("\nKey metrics".to_string());
        if let Some(leads) = k.total_leads {
            lines.push(format!("  leads:            {leads}"));
        }
        lines.push(format!("  conversion rate:  {}", percent(k.overall_conversion_rate)));
        if let Some(v) = k.won_revenue {
            lines.push(format!("  won revenue:      {}", eur(v)));
        }
        if let Some(v) = k.pipeline_value {
            lines.push(format!("  pipeline value:   {}", eur(v)));
        }
        lines.push(format!("  average ROI:      {}", ratio(k.average_roi)));
    }

    if let Some(roi) = &artifact.roi {
        lines.push(format!(
            "\nROI: best {} ({}), worst {} ({})",
            roi.best_channel.as_deref().unwrap_or("n/a"),
            ratio(roi.best_roi),
            roi.worst_channel.as_deref().unwrap_or("n/a"),
            ratio(roi.worst_roi)
        ));
    }
    if let Some(c) = &artifact.conversion {
        lines.push(format!(
            "Conversion: {} ({} won / {} closed)",
            percent(c.overall_rate),
            c.total_won,
            c.total_closed
        ));
    }
    if let Some(f) = &artifact.forecast {
        let next = f
            .predictions
            .first()
            .map(|p| format!("{:.1}", p.value))
            .unwrap_or_else(|| "n/a".into());
        lines.push(format!(
            "Forecast: next period {} = {next} (R² {})",
            f.target,
            f.accuracy
                .r_squared
                .map(|r| format!("{r:.3}"))
                .unwrap_or_else(|| "n/a".into())
        ));
    }
    if let Some(c) = &artifact.clusters {
        let sizes: Vec<String> = c.centroids.iter().map(|c| c.size.to_string()).collect();
        lines.push(format!("Clusters: {} (sizes {})", c.k, sizes.join("/")));
    }
    if let Some(t) = &artifact.targets {
        lines.push(format!(
            "Targets: delegates {}/{} (forecast {:.0}), sponsors {}/{} (forecast {:.0})",
            t.current_delegates,
            t.delegate_target,
            t.delegate_forecast,
            t.current_sponsors,
            t.sponsor_target,
            t.sponsor_forecast
        ));
    }
    if let Some(h) = &artifact.hidden {
        lines.push(format!(
            "Stuck deals: {} worth {}",
            h.stuck_deals_count,
            eur(h.stuck_deals_value)
        ));
    }

    if !artifact.recommendations.is_empty() {
        lines.push("\nRecommendations".to_string());
        for (i, r) in artifact.recommendations.iter().enumerate() {
            lines.push(format!("  {}. [{:?}] {}", i + 1, r.priority, r.title));
        }
    }

    if !artifact.degraded.is_empty() {
        lines.push("\nDegraded analyses".to_string());
        for d in &artifact.degraded {
            lines.push(format!("  {}: {}", d.analysis, d.reason));
        }
    }
    for w in &artifact.warnings {
        lines.push(format!("warning: {w}"));
    }
    lines.push(String::new());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_artifact;

    #[test]
    fn test_summary_lists_headlines() {
        let summary = render_summary(&sample_artifact());
        assert!(summary.contains("ROI: best Google Ads Retargeting"));
        assert!(summary.contains("Stuck deals: 4 worth EUR 135,000"));
        assert!(summary.contains("1. [Critical]"));
        assert!(!summary.contains("Degraded analyses"));
    }

    #[test]
    fn test_summary_of_empty_artifact() {
        let mut artifact = sample_artifact();
        artifact.kpis = None;
        artifact.roi = None;
        artifact.conversion = None;
        artifact.forecast = None;
        artifact.clusters = None;
        artifact.targets = None;
        artifact.hidden = None;
        artifact.recommendations.clear();
        artifact.degraded.push(insights_core::artifact::DegradedAnalysis {
            analysis: "roi".into(),
            reason: "no channel sheets available".into(),
        });
        let summary = render_summary(&artifact);
        assert!(summary.contains("roi: no channel sheets available"));
        assert!(!summary.contains("Recommendations"));
    }
}
