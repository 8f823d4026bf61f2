//! Ingestion: reads a multi-sheet workbook into untyped in-memory tables.

pub mod workbook;

pub use workbook::{read_sheet, read_spreadsheet, sheet_name, Workbook};
