//! The insights artifact produced by the analysis stage and consumed,
//! read-only, by presentation.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// All analysis results of one pipeline run. Sections are optional: an
/// analysis that degraded is absent and listed in `degraded`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightsArtifact {
    pub metadata: ArtifactMetadata,
    pub kpis: Option<KpiSummary>,
    pub channels: Option<ChannelSummaries>,
    pub roi: Option<RoiAnalysis>,
    pub conversion: Option<ConversionAnalysis>,
    pub forecast: Option<ForecastResult>,
    pub clusters: Option<ClusterResult>,
    pub targets: Option<TargetProgress>,
    pub hidden: Option<HiddenInsights>,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
    #[serde(default)]
    pub degraded: Vec<DegradedAnalysis>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl InsightsArtifact {
    /// Names accepted by [`InsightsArtifact::section`].
    pub const SECTIONS: [&'static str; 12] = [
        "metadata",
        "kpis",
        "channels",
        "roi",
        "conversion",
        "forecast",
        "clusters",
        "targets",
        "hidden",
        "recommendations",
        "degraded",
        "warnings",
    ];

    /// JSON view of a single section by name. `None` for unknown names;
    /// `Some(Value::Null)` for a known section that is absent.
    pub fn section(&self, name: &str) -> Option<serde_json::Value> {
        let value = match name {
            "metadata" => serde_json::to_value(&self.metadata),
            "kpis" => serde_json::to_value(&self.kpis),
            "channels" => serde_json::to_value(&self.channels),
            "roi" => serde_json::to_value(&self.roi),
            "conversion" => serde_json::to_value(&self.conversion),
            "forecast" => serde_json::to_value(&self.forecast),
            "clusters" => serde_json::to_value(&self.clusters),
            "targets" => serde_json::to_value(&self.targets),
            "hidden" => serde_json::to_value(&self.hidden),
            "recommendations" => serde_json::to_value(&self.recommendations),
            "degraded" => serde_json::to_value(&self.degraded),
            "warnings" => serde_json::to_value(&self.warnings),
            _ => return None,
        };
        Some(value.unwrap_or(serde_json::Value::Null))
    }

    pub fn is_degraded(&self, analysis: &str) -> bool {
        self.degraded.iter().any(|d| d.analysis == analysis)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub random_seed: u64,
    pub cluster_count: usize,
    pub forecast_target: String,
    pub sheets_analyzed: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegradedAnalysis {
    pub analysis: String,
    pub reason: String,
}

// ─── KPIs ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiSummary {
    pub total_leads: Option<u64>,
    pub overall_conversion_rate: Option<f64>,
    pub won_revenue: Option<f64>,
    pub pipeline_value: Option<f64>,
    pub total_ad_spend: Option<f64>,
    pub overall_cpa: Option<f64>,
    pub delegate_progress: Option<f64>,
    pub sponsor_progress: Option<f64>,
    pub average_roi: Option<f64>,
    pub stuck_deals_count: Option<u64>,
}

// ─── Channel summaries ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelSummaries {
    pub website: Option<WebsiteSummary>,
    pub social: Option<SocialSummary>,
    pub email: Option<EmailSummary>,
    pub sales: Option<SalesSummary>,
    pub ads: Option<AdsSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebsiteSummary {
    pub total_sessions: f64,
    pub total_conversions: f64,
    pub by_source: Vec<TrafficConversion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficConversion {
    pub source: String,
    pub sessions: f64,
    pub conversions: f64,
    pub conversion_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialSummary {
    pub total_impressions: f64,
    pub total_clicks: f64,
    pub platforms: Vec<PlatformEngagement>,
    pub best_platform: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformEngagement {
    pub platform: String,
    pub impressions: f64,
    pub engagements: f64,
    pub clicks: f64,
    pub engagement_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailSummary {
    pub campaigns: u64,
    pub total_conversions: f64,
    pub total_revenue: f64,
    pub avg_open_rate: Option<f64>,
    pub avg_ctr: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesSummary {
    pub total_deals: u64,
    pub total_pipeline_value: f64,
    pub stage_distribution: Vec<LabelCount>,
    pub top_sources: Vec<LabelCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdsSummary {
    pub total_spend: f64,
    pub total_conversions: f64,
    pub platforms: Vec<AdPlatformStats>,
    /// Platform with the lowest defined cost per acquisition.
    pub best_platform: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdPlatformStats {
    pub platform: String,
    pub spend: f64,
    pub conversions: f64,
    pub impressions: f64,
    pub clicks: f64,
    pub cpa: Option<f64>,
    pub cpc: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCount {
    pub label: String,
    pub count: u64,
}

// ─── ROI ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoiAnalysis {
    pub channels: Vec<ChannelRoi>,
    pub best_channel: Option<String>,
    pub best_roi: Option<f64>,
    pub worst_channel: Option<String>,
    pub worst_roi: Option<f64>,
    pub average_roi: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelRoi {
    pub channel: String,
    pub spend: f64,
    pub conversions: f64,
    pub estimated_return: f64,
    /// `(return - spend) / spend`; `None` when spend is zero.
    pub roi: Option<f64>,
    /// `return / spend`; `None` when spend is zero.
    pub roas: Option<f64>,
    /// `spend / conversions`; `None` when there were no conversions.
    pub cpa: Option<f64>,
}

// ─── Conversion ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionAnalysis {
    pub by_source: Vec<SourceConversion>,
    pub overall_rate: Option<f64>,
    pub total_closed: u64,
    pub total_won: u64,
    /// Website sessions converted per traffic source, when the sheet exists.
    #[serde(default)]
    pub by_traffic_source: Vec<TrafficConversion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConversion {
    pub source: String,
    pub total_deals: u64,
    pub closed_deals: u64,
    pub won_deals: u64,
    pub conversion_rate: Option<f64>,
    pub avg_deal_value: Option<f64>,
}

// ─── Forecast ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub sheet: String,
    pub target: String,
    pub features: Vec<String>,
    pub intercept: f64,
    pub coefficients: Vec<f64>,
    pub train_rows: usize,
    pub test_rows: usize,
    pub accuracy: ModelAccuracy,
    pub history: Vec<SeriesPoint>,
    pub predictions: Vec<SeriesPoint>,
}

/// Accuracy measured on the held-out rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelAccuracy {
    /// `None` when the held-out target has no variance.
    pub r_squared: Option<f64>,
    pub mae: f64,
    pub rmse: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub period: usize,
    pub date: Option<NaiveDate>,
    pub value: f64,
}

// ─── Clusters ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterResult {
    pub sheet: String,
    pub features: Vec<String>,
    pub k: usize,
    pub iterations: usize,
    pub converged: bool,
    pub inertia: f64,
    pub centroids: Vec<ClusterCentroid>,
    pub assignments: Vec<ClusterAssignment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterCentroid {
    pub cluster: usize,
    pub size: usize,
    /// Centroid in the features' original units.
    pub center: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterAssignment {
    /// Position of the record in the clean table.
    pub row: usize,
    pub label: String,
    pub cluster: usize,
}

// ─── Targets ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetProgress {
    pub current_delegates: u64,
    pub current_sponsors: u64,
    pub delegate_target: u64,
    pub sponsor_target: u64,
    pub monthly_growth_rate: f64,
    pub delegate_forecast: f64,
    pub sponsor_forecast: f64,
    pub delegate_gap: f64,
    pub sponsor_gap: f64,
    pub monthly: Vec<MonthlyTargetPrediction>,
    pub on_track_delegates: bool,
    pub on_track_sponsors: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyTargetPrediction {
    pub month: u32,
    pub delegates: u64,
    pub sponsors: u64,
}

// ─── Hidden insights ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HiddenInsights {
    pub as_of: NaiveDate,
    pub stuck_deals_count: u64,
    pub stuck_deals_value: f64,
    pub common_blockers: Vec<LabelCount>,
    pub high_value_low_conversion: Vec<SourceConversion>,
    pub monthly_lead_trend: Vec<LabelCount>,
}

// ─── Recommendations ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical,
    High,
    Medium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub details: String,
    pub priority: Priority,
    pub impact: Impact,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_artifact() -> InsightsArtifact {
        InsightsArtifact {
            metadata: ArtifactMetadata {
                run_id: Uuid::nil(),
                generated_at: Utc::now(),
                random_seed: 42,
                cluster_count: 3,
                forecast_target: "Ticket Inquiry Conversions".into(),
                sheets_analyzed: vec![],
            },
            kpis: None,
            channels: None,
            roi: None,
            conversion: None,
            forecast: None,
            clusters: None,
            targets: None,
            hidden: None,
            recommendations: vec![],
            degraded: vec![DegradedAnalysis {
                analysis: "forecast".into(),
                reason: "not enough rows".into(),
            }],
            warnings: vec![],
        }
    }

    #[test]
    fn test_section_lookup() {
        let artifact = empty_artifact();
        assert_eq!(artifact.section("roi"), Some(serde_json::Value::Null));
        assert!(artifact.section("metadata").unwrap().is_object());
        assert!(artifact.section("nope").is_none());
        for name in InsightsArtifact::SECTIONS {
            assert!(artifact.section(name).is_some(), "section {name}");
        }
    }

    #[test]
    fn test_json_round_trip_keeps_absent_sections() {
        let artifact = empty_artifact();
        let json = serde_json::to_string(&artifact).unwrap();
        let back: InsightsArtifact = serde_json::from_str(&json).unwrap();
        assert_eq!(back, artifact);
        assert!(back.is_degraded("forecast"));
        assert!(!back.is_degraded("clusters"));
    }
}
