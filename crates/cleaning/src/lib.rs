pub mod cleaner;
pub mod coerce;
pub mod schema;
pub mod sheets;
pub mod writer;

pub use cleaner::{Cleaner, CleaningOutput, CleaningReport, RowRejection};
pub use schema::{ColumnSpec, DeriveMode, DerivedColumn, Formula, Imputation, Normalizer, SheetSchema};
pub use sheets::builtin_schemas;
pub use writer::{load_clean_tables, write_outputs, write_table};
