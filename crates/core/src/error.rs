use thiserror::Error;

pub type InsightsResult<T> = Result<T, InsightsError>;

#[derive(Error, Debug)]
pub enum InsightsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Source unreadable at {path}: {reason}")]
    SourceUnreadable { path: String, reason: String },

    #[error("Schema mismatch in sheet '{sheet}': missing columns {missing:?}")]
    SchemaMismatch { sheet: String, missing: Vec<String> },

    #[error("Analysis degraded ({analysis}): {reason}")]
    AnalysisDegraded { analysis: String, reason: String },

    #[error("Render error: {0}")]
    Render(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl InsightsError {
    pub fn source_unreadable(path: impl std::fmt::Display, reason: impl std::fmt::Display) -> Self {
        Self::SourceUnreadable {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn degraded(analysis: &str, reason: impl Into<String>) -> Self {
        Self::AnalysisDegraded {
            analysis: analysis.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<config::ConfigError> for InsightsError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}
