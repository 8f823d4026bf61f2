use crate::error::{InsightsError, InsightsResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root pipeline configuration. Loaded from an optional TOML file, then
/// environment variables with the prefix `CAMPAIGN_INSIGHTS__`.
///
/// The five top-level options are the ones every stage needs; the nested
/// sections tune individual analyses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_input_path")]
    pub input_path: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_cluster_count")]
    pub cluster_count: usize,
    #[serde(default = "default_forecast_target")]
    pub forecast_target: String,
    #[serde(default = "default_random_seed")]
    pub random_seed: u64,
    #[serde(default)]
    pub cleaning: CleaningConfig,
    #[serde(default)]
    pub forecast: ForecastConfig,
    #[serde(default)]
    pub clustering: ClusteringConfig,
    #[serde(default)]
    pub roi: RoiConfig,
    #[serde(default)]
    pub targets: TargetConfig,
    #[serde(default)]
    pub hidden: HiddenInsightsConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningConfig {
    /// Raw values treated as missing, compared case-sensitively after trim.
    #[serde(default = "default_missing_tokens")]
    pub missing_tokens: Vec<String>,
    #[serde(default = "default_true")]
    pub write_outputs: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    #[serde(default = "default_forecast_sheet")]
    pub sheet: String,
    #[serde(default = "default_forecast_features")]
    pub features: Vec<String>,
    #[serde(default = "default_forecast_time_column")]
    pub time_column: String,
    #[serde(default = "default_horizon")]
    pub horizon: usize,
    #[serde(default = "default_holdout_fraction")]
    pub holdout_fraction: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringConfig {
    #[serde(default = "default_clustering_sheet")]
    pub sheet: String,
    #[serde(default = "default_clustering_features")]
    pub features: Vec<String>,
    /// Column used to label each assignment in the artifact.
    #[serde(default = "default_clustering_label")]
    pub label_column: String,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

/// Cost and value assumptions used to turn channel activity into a return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoiConfig {
    #[serde(default = "default_ad_value_per_conversion")]
    pub ad_value_per_conversion: f64,
    #[serde(default = "default_email_cost")]
    pub email_cost: f64,
    #[serde(default = "default_website_cost")]
    pub website_cost: f64,
    #[serde(default = "default_website_value_per_conversion")]
    pub website_value_per_conversion: f64,
    #[serde(default = "default_social_cost")]
    pub social_cost: f64,
    #[serde(default = "default_social_click_conversion_rate")]
    pub social_click_conversion_rate: f64,
    #[serde(default = "default_social_value_per_conversion")]
    pub social_value_per_conversion: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    #[serde(default = "default_delegate_target")]
    pub delegate_target: u64,
    #[serde(default = "default_sponsor_target")]
    pub sponsor_target: u64,
    #[serde(default = "default_months_remaining")]
    pub months_remaining: u32,
    #[serde(default = "default_growth")]
    pub default_growth: f64,
    #[serde(default = "default_max_growth")]
    pub max_growth: f64,
    #[serde(default = "default_on_track_ratio")]
    pub on_track_ratio: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HiddenInsightsConfig {
    /// Reference date for deal ageing; defaults to the latest date in the data.
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
    #[serde(default = "default_stuck_after_days")]
    pub stuck_after_days: i64,
    #[serde(default = "default_stuck_stages")]
    pub stuck_stages: Vec<String>,
    #[serde(default = "default_blocker_keywords")]
    pub blocker_keywords: Vec<String>,
    #[serde(default = "default_high_value_threshold")]
    pub high_value_threshold: f64,
    #[serde(default = "default_low_conversion_threshold")]
    pub low_conversion_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_report_title")]
    pub title: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub port: u16,
}

// Default functions
fn default_input_path() -> PathBuf {
    PathBuf::from("data/POT2026_Raw_Data_Case_Study.xlsx")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("data/clean")
}
fn default_cluster_count() -> usize {
    3
}
fn default_forecast_target() -> String {
    "Ticket Inquiry Conversions".to_string()
}
fn default_random_seed() -> u64 {
    42
}
fn default_true() -> bool {
    true
}
fn default_missing_tokens() -> Vec<String> {
    ["N/A", "NA", "n/a", "nan", "NaN", "null", "NULL", "-"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_forecast_sheet() -> String {
    "Website Traffic".to_string()
}
fn default_forecast_features() -> Vec<String> {
    vec!["Sessions".to_string(), "New Users".to_string()]
}
fn default_forecast_time_column() -> String {
    "Week Starting".to_string()
}
fn default_horizon() -> usize {
    4
}
fn default_holdout_fraction() -> f64 {
    0.25
}
fn default_clustering_sheet() -> String {
    "Sales Pipeline".to_string()
}
fn default_clustering_features() -> Vec<String> {
    vec!["Deal Value (EUR)".to_string(), "Days In Pipeline".to_string()]
}
fn default_clustering_label() -> String {
    "Company Name".to_string()
}
fn default_max_iterations() -> usize {
    300
}
fn default_ad_value_per_conversion() -> f64 {
    5000.0
}
fn default_email_cost() -> f64 {
    5000.0
}
fn default_website_cost() -> f64 {
    2000.0
}
fn default_website_value_per_conversion() -> f64 {
    3000.0
}
fn default_social_cost() -> f64 {
    3000.0
}
fn default_social_click_conversion_rate() -> f64 {
    0.05
}
fn default_social_value_per_conversion() -> f64 {
    2500.0
}
fn default_delegate_target() -> u64 {
    300
}
fn default_sponsor_target() -> u64 {
    25
}
fn default_months_remaining() -> u32 {
    4
}
fn default_growth() -> f64 {
    0.15
}
fn default_max_growth() -> f64 {
    0.30
}
fn default_on_track_ratio() -> f64 {
    0.9
}
fn default_stuck_after_days() -> i64 {
    30
}
fn default_stuck_stages() -> Vec<String> {
    vec!["Negotiation".to_string(), "Proposal Sent".to_string()]
}
fn default_blocker_keywords() -> Vec<String> {
    ["board approval", "budget", "respond", "compar"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_high_value_threshold() -> f64 {
    10_000.0
}
fn default_low_conversion_threshold() -> f64 {
    0.10
}
fn default_report_title() -> String {
    "Campaign Insights".to_string()
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    8080
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            missing_tokens: default_missing_tokens(),
            write_outputs: default_true(),
        }
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            sheet: default_forecast_sheet(),
            features: default_forecast_features(),
            time_column: default_forecast_time_column(),
            horizon: default_horizon(),
            holdout_fraction: default_holdout_fraction(),
        }
    }
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            sheet: default_clustering_sheet(),
            features: default_clustering_features(),
            label_column: default_clustering_label(),
            max_iterations: default_max_iterations(),
        }
    }
}

impl Default for RoiConfig {
    fn default() -> Self {
        Self {
            ad_value_per_conversion: default_ad_value_per_conversion(),
            email_cost: default_email_cost(),
            website_cost: default_website_cost(),
            website_value_per_conversion: default_website_value_per_conversion(),
            social_cost: default_social_cost(),
            social_click_conversion_rate: default_social_click_conversion_rate(),
            social_value_per_conversion: default_social_value_per_conversion(),
        }
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            delegate_target: default_delegate_target(),
            sponsor_target: default_sponsor_target(),
            months_remaining: default_months_remaining(),
            default_growth: default_growth(),
            max_growth: default_max_growth(),
            on_track_ratio: default_on_track_ratio(),
        }
    }
}

impl Default for HiddenInsightsConfig {
    fn default() -> Self {
        Self {
            as_of: None,
            stuck_after_days: default_stuck_after_days(),
            stuck_stages: default_stuck_stages(),
            blocker_keywords: default_blocker_keywords(),
            high_value_threshold: default_high_value_threshold(),
            low_conversion_threshold: default_low_conversion_threshold(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: default_report_title(),
            host: default_host(),
            port: default_http_port(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_path: default_input_path(),
            output_dir: default_output_dir(),
            cluster_count: default_cluster_count(),
            forecast_target: default_forecast_target(),
            random_seed: default_random_seed(),
            cleaning: CleaningConfig::default(),
            forecast: ForecastConfig::default(),
            clustering: ClusteringConfig::default(),
            roi: RoiConfig::default(),
            targets: TargetConfig::default(),
            hidden: HiddenInsightsConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from an optional TOML file and environment variables.
    pub fn load(file: Option<&Path>) -> InsightsResult<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let builder = builder.add_source(
            config::Environment::with_prefix("CAMPAIGN_INSIGHTS")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("forecast.features")
                .with_list_parse_key("clustering.features")
                .with_list_parse_key("hidden.stuck_stages"),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no stage can work with.
    pub fn validate(&self) -> InsightsResult<()> {
        if self.cluster_count == 0 {
            return Err(InsightsError::Config(
                "cluster_count must be at least 1".to_string(),
            ));
        }
        if self.forecast_target.trim().is_empty() {
            return Err(InsightsError::Config(
                "forecast_target must not be empty".to_string(),
            ));
        }
        if self.forecast.features.is_empty() {
            return Err(InsightsError::Config(
                "forecast.features must name at least one column".to_string(),
            ));
        }
        if self.clustering.features.is_empty() {
            return Err(InsightsError::Config(
                "clustering.features must name at least one column".to_string(),
            ));
        }
        if !(self.forecast.holdout_fraction > 0.0 && self.forecast.holdout_fraction < 1.0) {
            return Err(InsightsError::Config(format!(
                "forecast.holdout_fraction must be in (0, 1), got {}",
                self.forecast.holdout_fraction
            )));
        }
        if self.clustering.max_iterations == 0 {
            return Err(InsightsError::Config(
                "clustering.max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
