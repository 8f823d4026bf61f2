//! Persistence of cleaned sheets and the cleaning audit, and reloading of
//! previously persisted output.

use crate::cleaner::{Cleaner, CleaningOutput};
use insights_core::{CleanTable, InsightsError, InsightsResult};
use insights_ingest::read_sheet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const REPORT_FILE: &str = "cleaning_report.json";

/// Write one `<Sheet_Name>_Clean.csv` per table plus `cleaning_report.json`
/// into `dir`. Returns the written paths.
pub fn write_outputs(output: &CleaningOutput, dir: &Path) -> InsightsResult<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(output.tables.len() + 1);

    for table in &output.tables {
        let path = dir.join(clean_file_name(&table.name));
        write_table(table, &path)?;
        written.push(path);
    }

    let report_path = dir.join(REPORT_FILE);
    fs::write(&report_path, serde_json::to_string_pretty(output)?)?;
    written.push(report_path);

    info!(dir = %dir.display(), files = written.len(), "Cleaned output written");
    Ok(written)
}

/// Write a clean table as CSV: dates ISO-8601, nulls empty.
pub fn write_table(table: &CleanTable, path: &Path) -> InsightsResult<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(table.column_names())?;
    for record in &table.records {
        wtr.write_record(record.cells.iter().map(|c| c.to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn clean_file_name(sheet: &str) -> String {
    format!("{}_Clean.csv", sheet.replace(' ', "_"))
}

/// Reload persisted clean sheets from `dir` and pass them back through
/// `cleaner`, which leaves already-clean data unchanged.
pub fn load_clean_tables(dir: &Path, cleaner: &Cleaner) -> InsightsResult<CleaningOutput> {
    if !dir.is_dir() {
        return Err(InsightsError::source_unreadable(
            dir.display(),
            "clean output directory not found",
        ));
    }

    let mut output = CleaningOutput::default();
    for schema in cleaner.schemas() {
        let path = dir.join(schema.output_file_name());
        if !path.is_file() {
            warn!(sheet = %schema.sheet, path = %path.display(), "Clean sheet not found");
            output.missing_sheets.push(schema.sheet.clone());
            continue;
        }
        let file = fs::File::open(&path)
            .map_err(|e| InsightsError::source_unreadable(path.display(), e))?;
        let raw = read_sheet(&schema.sheet, file)
            .map_err(|e| InsightsError::source_unreadable(path.display(), e))?;
        let (table, report) = cleaner.clean_table(&raw, schema)?;
        output.tables.push(table);
        output.reports.push(report);
    }

    if output.tables.is_empty() {
        return Err(InsightsError::source_unreadable(
            dir.display(),
            "no clean sheets found",
        ));
    }
    Ok(output)
}
