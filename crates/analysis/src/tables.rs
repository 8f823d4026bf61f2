//! Lookup of clean sheets and columns, failing as a degraded analysis.

use insights_core::{CleanTable, InsightsError, InsightsResult};
use std::collections::BTreeMap;

/// Clean sheets available to the analyses, keyed by sheet name.
#[derive(Debug, Clone, Default)]
pub struct TableSet<'a> {
    tables: BTreeMap<&'a str, &'a CleanTable>,
}

impl<'a> TableSet<'a> {
    pub fn new(tables: &'a [CleanTable]) -> Self {
        Self {
            tables: tables.iter().map(|t| (t.name.as_str(), t)).collect(),
        }
    }

    pub fn get(&self, sheet: &str) -> Option<&'a CleanTable> {
        self.tables.get(sheet).copied()
    }

    /// The sheet, or `AnalysisDegraded` naming `analysis`.
    pub fn require(&self, analysis: &str, sheet: &str) -> InsightsResult<&'a CleanTable> {
        self.get(sheet)
            .ok_or_else(|| InsightsError::degraded(analysis, format!("sheet '{sheet}' not available")))
    }

    pub fn names(&self) -> Vec<String> {
        self.tables.keys().map(|k| k.to_string()).collect()
    }
}

fn missing_column(analysis: &str, table: &CleanTable, column: &str) -> InsightsError {
    InsightsError::degraded(
        analysis,
        format!("column '{column}' missing from sheet '{}'", table.name),
    )
}

pub fn numbers(analysis: &str, table: &CleanTable, column: &str) -> InsightsResult<Vec<Option<f64>>> {
    table
        .numbers(column)
        .ok_or_else(|| missing_column(analysis, table, column))
}

pub fn texts<'t>(
    analysis: &str,
    table: &'t CleanTable,
    column: &str,
) -> InsightsResult<Vec<Option<&'t str>>> {
    table
        .texts(column)
        .ok_or_else(|| missing_column(analysis, table, column))
}

pub fn dates(
    analysis: &str,
    table: &CleanTable,
    column: &str,
) -> InsightsResult<Vec<Option<chrono::NaiveDate>>> {
    table
        .dates(column)
        .ok_or_else(|| missing_column(analysis, table, column))
}

/// Numeric column with nulls read as zero, for summed measures.
pub fn amounts(analysis: &str, table: &CleanTable, column: &str) -> InsightsResult<Vec<f64>> {
    Ok(numbers(analysis, table, column)?
        .into_iter()
        .map(|v| v.unwrap_or(0.0))
        .collect())
}

/// Optional numeric column: all zeros when the column is absent.
pub fn amounts_or_zero(table: &CleanTable, column: &str) -> Vec<f64> {
    table
        .numbers(column)
        .map(|values| values.into_iter().map(|v| v.unwrap_or(0.0)).collect())
        .unwrap_or_else(|| vec![0.0; table.len()])
}

/// Per-key sums of several measures, keys in sorted order. Rows whose key is
/// null are grouped under `Unknown`.
pub fn group_sums(keys: &[Option<&str>], measures: &[&[f64]]) -> BTreeMap<String, Vec<f64>> {
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for (row, key) in keys.iter().enumerate() {
        let entry = groups
            .entry(key.unwrap_or("Unknown").to_string())
            .or_insert_with(|| vec![0.0; measures.len()]);
        for (slot, measure) in entry.iter_mut().zip(measures) {
            *slot += measure.get(row).copied().unwrap_or(0.0);
        }
    }
    groups
}
