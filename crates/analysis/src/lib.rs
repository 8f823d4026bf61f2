//! Analyses over the clean sheets: channel ROI, conversion by source, a
//! regression forecast, k-means segmentation, target progress and hidden
//! insights, gathered into one `InsightsArtifact`.

pub mod analyzer;
pub mod channels;
pub mod clustering;
pub mod conversion;
pub mod hidden;
pub mod kpis;
pub mod recommendations;
pub mod regression;
pub mod roi;
pub mod stats;
pub mod tables;
pub mod targets;

pub use analyzer::{analyze, read_artifact, write_artifact, ARTIFACT_FILE};
pub use clustering::KMeans;
pub use regression::LinearModel;
pub use tables::TableSet;
