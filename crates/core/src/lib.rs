pub mod artifact;
pub mod config;
pub mod error;
pub mod sheets;
pub mod types;

pub use artifact::InsightsArtifact;
pub use config::PipelineConfig;
pub use error::{InsightsError, InsightsResult};
pub use types::{Cell, CleanRecord, CleanTable, ColumnDef, ColumnType, RawRecord, RawTable};
