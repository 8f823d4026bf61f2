//! Per-sheet cleaning: schema check, coercion, deduplication, imputation
//! and derived columns, with an audit report per sheet.

use crate::coerce::{coerce, is_missing, normalize};
use crate::schema::{DeriveMode, Formula, Imputation, SheetSchema};
use crate::sheets::builtin_schemas;
use insights_core::config::CleaningConfig;
use insights_core::{
    Cell, CleanRecord, CleanTable, ColumnType, InsightsError, InsightsResult, RawRecord, RawTable,
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};

/// A row dropped during cleaning, with the cell that caused it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowRejection {
    /// 1-based data row number in the source sheet.
    pub row: usize,
    pub column: String,
    pub value: Option<String>,
    pub reason: String,
}

/// Audit trail for one cleaned sheet.
///
/// `rows_in == rows_out + duplicates_removed + rows_dropped` always holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleaningReport {
    pub sheet: String,
    pub rows_in: usize,
    pub rows_out: usize,
    pub duplicates_removed: usize,
    pub rows_dropped: usize,
    pub imputed: BTreeMap<String, usize>,
    pub derived: BTreeMap<String, usize>,
    pub rejections: Vec<RowRejection>,
    pub ignored_columns: Vec<String>,
}

/// Result of cleaning a whole workbook.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleaningOutput {
    #[serde(skip)]
    pub tables: Vec<CleanTable>,
    pub reports: Vec<CleaningReport>,
    /// Sheets present in the workbook with no declared schema.
    pub skipped_sheets: Vec<String>,
    /// Declared sheets absent from the workbook.
    pub missing_sheets: Vec<String>,
}

impl CleaningOutput {
    pub fn table(&self, sheet: &str) -> Option<&CleanTable> {
        self.tables.iter().find(|t| t.name == sheet)
    }

    pub fn report(&self, sheet: &str) -> Option<&CleaningReport> {
        self.reports.iter().find(|r| r.sheet == sheet)
    }
}

/// Cleans raw sheets against declared schemas.
#[derive(Debug, Clone)]
pub struct Cleaner {
    schemas: Vec<SheetSchema>,
    missing_tokens: Vec<String>,
}

impl Cleaner {
    /// A cleaner for the built-in workbook schemas.
    pub fn new(config: &CleaningConfig) -> Self {
        Self::with_schemas(config, builtin_schemas())
    }

    pub fn with_schemas(config: &CleaningConfig, schemas: Vec<SheetSchema>) -> Self {
        Self {
            schemas,
            missing_tokens: config.missing_tokens.clone(),
        }
    }

    pub fn schema(&self, sheet: &str) -> Option<&SheetSchema> {
        self.schemas.iter().find(|s| s.sheet == sheet)
    }

    pub fn schemas(&self) -> &[SheetSchema] {
        &self.schemas
    }

    /// Clean every table that has a declared schema.
    ///
    /// A schema mismatch in any sheet is fatal; undeclared and absent sheets
    /// are only reported.
    pub fn clean(&self, tables: Vec<RawTable>) -> InsightsResult<CleaningOutput> {
        let mut output = CleaningOutput::default();
        let mut by_name: BTreeMap<String, RawTable> =
            tables.into_iter().map(|t| (t.name.clone(), t)).collect();

        for schema in &self.schemas {
            match by_name.remove(&schema.sheet) {
                Some(raw) => {
                    let (table, report) = self.clean_table(&raw, schema)?;
                    output.tables.push(table);
                    output.reports.push(report);
                }
                None => {
                    warn!(sheet = %schema.sheet, "Declared sheet missing from workbook");
                    output.missing_sheets.push(schema.sheet.clone());
                }
            }
        }

        for name in by_name.into_keys() {
            warn!(sheet = %name, "No schema declared for sheet, skipping");
            output.skipped_sheets.push(name);
        }

        Ok(output)
    }

    /// Clean one raw table against `schema`.
    pub fn clean_table(
        &self,
        raw: &RawTable,
        schema: &SheetSchema,
    ) -> InsightsResult<(CleanTable, CleaningReport)> {
        let missing: Vec<String> = schema
            .required_columns()
            .filter(|c| !raw.has_column(&c.name))
            .map(|c| c.name.clone())
            .collect();
        if !missing.is_empty() {
            return Err(InsightsError::SchemaMismatch {
                sheet: raw.name.clone(),
                missing,
            });
        }

        let mut report = CleaningReport {
            sheet: schema.sheet.clone(),
            rows_in: raw.len(),
            ignored_columns: raw
                .headers
                .iter()
                .filter(|h| schema.spec(h).is_none())
                .cloned()
                .collect(),
            ..Default::default()
        };

        let mut table = CleanTable::new(schema.sheet.clone(), schema.output_schema());

        // Coercion; rows keep their source row number until the final pass.
        let mut rows: Vec<(usize, CleanRecord)> = Vec::with_capacity(raw.len());
        for record in &raw.records {
            match self.coerce_record(record, schema, &table) {
                Ok(cells) => rows.push((record.row_number, CleanRecord { cells })),
                Err(rejection) => {
                    debug!(
                        sheet = %schema.sheet,
                        row = rejection.row,
                        column = %rejection.column,
                        reason = %rejection.reason,
                        "Row rejected"
                    );
                    report.rejections.push(rejection);
                }
            }
        }

        report.duplicates_removed += dedup(&mut rows);

        for (idx, spec) in schema.columns.iter().enumerate() {
            let filled = impute_column(&mut rows, idx, spec.column_type, &spec.imputation);
            if filled > 0 {
                report.imputed.insert(spec.name.clone(), filled);
            }
        }

        for derived in &schema.derived {
            let Some(target) = table.column_index(&derived.name) else {
                continue;
            };
            let mut count = 0;
            for (_, record) in rows.iter_mut() {
                if derived.mode == DeriveMode::FillMissing && !record.cells[target].is_null() {
                    continue;
                }
                let value = evaluate(&derived.formula, derived.column_type, record, &table);
                if !value.is_null() {
                    count += 1;
                }
                record.cells[target] = value;
            }
            if count > 0 {
                report.derived.insert(derived.name.clone(), count);
            }
        }

        // Required columns with an imputation policy that found nothing to use.
        let required: Vec<(usize, &str)> = schema
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.required)
            .map(|(i, c)| (i, c.name.as_str()))
            .collect();
        rows.retain(|(row, record)| {
            match required.iter().find(|(i, _)| record.cells[*i].is_null()) {
                Some((_, column)) => {
                    report.rejections.push(RowRejection {
                        row: *row,
                        column: column.to_string(),
                        value: None,
                        reason: "required value missing after imputation".to_string(),
                    });
                    false
                }
                None => true,
            }
        });

        report.duplicates_removed += dedup(&mut rows);

        report.rejections.sort_by_key(|r| r.row);
        report.rows_dropped = report.rejections.len();
        table.records = rows.into_iter().map(|(_, r)| r).collect();
        report.rows_out = table.len();

        let imputed: usize = report.imputed.values().sum();
        metrics::counter!("cleaning.rows_dropped").increment(report.rows_dropped as u64);
        metrics::counter!("cleaning.duplicates_removed").increment(report.duplicates_removed as u64);
        metrics::counter!("cleaning.values_imputed").increment(imputed as u64);

        if report.rows_dropped > 0 {
            warn!(
                sheet = %schema.sheet,
                dropped = report.rows_dropped,
                "Dropped malformed rows"
            );
        }
        info!(
            sheet = %schema.sheet,
            rows_in = report.rows_in,
            rows_out = report.rows_out,
            duplicates = report.duplicates_removed,
            imputed,
            "Sheet cleaned"
        );

        Ok((table, report))
    }

    fn coerce_record(
        &self,
        record: &RawRecord,
        schema: &SheetSchema,
        table: &CleanTable,
    ) -> Result<Vec<Cell>, RowRejection> {
        let mut cells = vec![Cell::Null; table.schema.len()];
        for (idx, spec) in schema.columns.iter().enumerate() {
            let raw = record
                .get(&spec.name)
                .filter(|v| !is_missing(v, &self.missing_tokens));

            let Some(raw) = raw else {
                if spec.required && spec.imputation == Imputation::None {
                    return Err(RowRejection {
                        row: record.row_number,
                        column: spec.name.clone(),
                        value: None,
                        reason: "required value missing".to_string(),
                    });
                }
                continue;
            };

            let cell = coerce(raw, spec.column_type).map_err(|reason| RowRejection {
                row: record.row_number,
                column: spec.name.clone(),
                value: Some(raw.to_string()),
                reason,
            })?;

            cells[idx] = match cell {
                Cell::Text(text) => {
                    let text = normalize(&text, &spec.normalizer);
                    if text.is_empty() {
                        Cell::Null
                    } else {
                        Cell::Text(text)
                    }
                }
                other => other,
            };
        }
        Ok(cells)
    }
}

/// Drop exact duplicates, keeping the first occurrence. Returns the number
/// removed.
fn dedup(rows: &mut Vec<(usize, CleanRecord)>) -> usize {
    let before = rows.len();
    let mut seen: HashSet<CleanRecord> = HashSet::with_capacity(before);
    rows.retain(|(_, record)| seen.insert(record.clone()));
    before - rows.len()
}

fn impute_column(
    rows: &mut [(usize, CleanRecord)],
    idx: usize,
    column_type: ColumnType,
    imputation: &Imputation,
) -> usize {
    let fill = match imputation {
        Imputation::None => return 0,
        Imputation::Constant(value) => Some(value.clone()),
        Imputation::Mean => {
            let values: Vec<f64> = rows.iter().filter_map(|(_, r)| r.cells[idx].as_f64()).collect();
            if values.is_empty() {
                None
            } else {
                let mean = values.iter().sum::<f64>() / values.len() as f64;
                Some(if column_type == ColumnType::Integer {
                    Cell::Int(mean.round() as i64)
                } else {
                    Cell::Float(mean)
                })
            }
        }
        Imputation::Mode => mode(rows.iter().map(|(_, r)| &r.cells[idx])),
    };

    let Some(fill) = fill else {
        return 0;
    };

    let mut filled = 0;
    for (_, record) in rows.iter_mut() {
        if record.cells[idx].is_null() {
            record.cells[idx] = fill.clone();
            filled += 1;
        }
    }
    filled
}

/// Most frequent non-null cell; ties go to the smallest value.
fn mode<'a>(cells: impl Iterator<Item = &'a Cell>) -> Option<Cell> {
    let mut counts: Vec<(&Cell, usize)> = Vec::new();
    for cell in cells.filter(|c| !c.is_null()) {
        match counts.iter_mut().find(|(c, _)| *c == cell) {
            Some((_, n)) => *n += 1,
            None => counts.push((cell, 1)),
        }
    }
    counts
        .into_iter()
        .max_by(|(a, na), (b, nb)| na.cmp(nb).then_with(|| compare_cells(b, a)))
        .map(|(cell, _)| cell.clone())
}

fn compare_cells(a: &Cell, b: &Cell) -> Ordering {
    match (a, b) {
        (Cell::Date(x), Cell::Date(y)) => x.cmp(y),
        (Cell::Text(x), Cell::Text(y)) => x.cmp(y),
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            _ => a.to_string().cmp(&b.to_string()),
        },
    }
}

fn evaluate(formula: &Formula, column_type: ColumnType, record: &CleanRecord, table: &CleanTable) -> Cell {
    let get = |column: &str| table.column_index(column).and_then(|i| record.cells.get(i));

    match formula {
        Formula::Ratio {
            numerator,
            denominator,
            scale,
        } => {
            let (Some(n), Some(d)) = (
                get(numerator).and_then(Cell::as_f64),
                get(denominator).and_then(Cell::as_f64),
            ) else {
                return Cell::Null;
            };
            if d == 0.0 {
                return Cell::Null;
            }
            let value = n / d * scale;
            match column_type {
                ColumnType::Integer => Cell::Int(value.round() as i64),
                ColumnType::Rate if !(0.0..=1.0).contains(&value) => Cell::Null,
                _ => Cell::Float(value),
            }
        }
        Formula::DaysBetween { start, end } => match (
            get(start).and_then(Cell::as_date),
            get(end).and_then(Cell::as_date),
        ) {
            (Some(s), Some(e)) => Cell::Int((e - s).num_days()),
            _ => Cell::Null,
        },
        Formula::EmailFromContact { name, company } => {
            let first = get(name)
                .and_then(Cell::as_text)
                .and_then(|n| n.split_whitespace().next())
                .map(slug);
            let domain = get(company).and_then(Cell::as_text).map(slug);
            match (first, domain) {
                (Some(f), Some(d)) if !f.is_empty() && !d.is_empty() => {
                    Cell::Text(format!("{f}@{d}.com"))
                }
                _ => Cell::Null,
            }
        }
    }
}

fn slug(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnSpec, DerivedColumn, Normalizer};
    use crate::sheets;
    use chrono::NaiveDate;

    fn cleaner() -> Cleaner {
        Cleaner::new(&CleaningConfig::default())
    }

    fn raw(name: &str, headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable {
            name: name.to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            records: rows
                .iter()
                .enumerate()
                .map(|(i, row)| RawRecord {
                    row_number: i + 1,
                    values: headers
                        .iter()
                        .zip(row.iter())
                        .filter(|(_, v)| !v.is_empty())
                        .map(|(h, v)| (h.to_string(), v.to_string()))
                        .collect(),
                })
                .collect(),
        }
    }

    fn ads_schema() -> SheetSchema {
        SheetSchema::new("Ad Spend")
            .column(ColumnSpec::required("Platform", ColumnType::Text).normalize(Normalizer::Trim))
            .column(ColumnSpec::required("Spend (EUR)", ColumnType::Currency))
            .column(
                ColumnSpec::optional("Conversions", ColumnType::Integer)
                    .impute(Imputation::Constant(Cell::Int(0))),
            )
            .derive(DerivedColumn::create(
                "CPA",
                ColumnType::Currency,
                Formula::Ratio {
                    numerator: "Spend (EUR)".into(),
                    denominator: "Conversions".into(),
                    scale: 1.0,
                },
            ))
    }

    #[test]
    fn test_ten_rows_with_two_duplicates() {
        let headers = ["Platform", "Spend (EUR)", "Conversions"];
        let rows: Vec<&[&str]> = vec![
            &["Google", "100", "4"],
            &["LinkedIn", "200", "2"],
            &["Google", "100", "4"],
            &["Meta", "50", "1"],
            &["Bing", "30", "0"],
            &["LinkedIn", "200", "2"],
            &["Google", "120", "5"],
            &["Meta", "60", "2"],
            &["Bing", "35", "1"],
            &["TikTok", "10", "0"],
        ];
        let table = raw("Ad Spend", &headers, &rows);

        let c = Cleaner::with_schemas(&CleaningConfig::default(), vec![ads_schema()]);
        let (clean, report) = c.clean_table(&table, &ads_schema()).unwrap();

        assert_eq!(clean.len(), 8);
        assert_eq!(report.duplicates_removed, 2);
        assert_eq!(report.rows_in, 10);
        assert_eq!(report.rows_dropped, 0);
        assert_eq!(
            report.rows_in,
            report.rows_out + report.duplicates_removed + report.rows_dropped
        );

        let unique: HashSet<&CleanRecord> = clean.records.iter().collect();
        assert_eq!(unique.len(), clean.len());
    }

    #[test]
    fn test_cleaning_is_idempotent() {
        let headers = ["Platform", "Spend (EUR)", "Conversions"];
        let rows: Vec<&[&str]> = vec![
            &[" Google ", "€1,000", ""],
            &["Meta", "oops", "3"],
            &["LinkedIn", "250", "5"],
        ];
        let table = raw("Ad Spend", &headers, &rows);
        let c = Cleaner::with_schemas(&CleaningConfig::default(), vec![ads_schema()]);

        let first = c.clean_table(&table, &ads_schema()).unwrap();
        let second = c.clean_table(&table, &ads_schema()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_required_column_is_schema_mismatch() {
        let table = raw("Ad Spend", &["Platform", "Clicks"], &[&["Google", "5"]]);
        let err = cleaner()
            .clean_table(&table, &ads_schema())
            .unwrap_err();
        match err {
            InsightsError::SchemaMismatch { sheet, missing } => {
                assert_eq!(sheet, "Ad Spend");
                assert_eq!(missing, vec!["Spend (EUR)".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_cell_drops_only_its_row() {
        let headers = ["Platform", "Spend (EUR)", "Conversions", "Region"];
        let rows: Vec<&[&str]> = vec![
            &["Google", "100", "4", "EU"],
            &["Meta", "a lot", "2", "EU"],
            &["LinkedIn", "80", "two", "US"],
            &["Bing", "30", "1", "US"],
        ];
        let table = raw("Ad Spend", &headers, &rows);
        let (clean, report) = cleaner().clean_table(&table, &ads_schema()).unwrap();

        assert_eq!(clean.len(), 2);
        assert_eq!(report.rows_dropped, 2);
        assert_eq!(report.rejections[0].row, 2);
        assert_eq!(report.rejections[0].column, "Spend (EUR)");
        assert_eq!(report.rejections[0].value.as_deref(), Some("a lot"));
        assert_eq!(report.rejections[1].column, "Conversions");
        assert_eq!(report.ignored_columns, vec!["Region".to_string()]);
    }

    #[test]
    fn test_missing_required_value_drops_row() {
        let headers = ["Platform", "Spend (EUR)"];
        let rows: Vec<&[&str]> = vec![&["Google", "N/A"], &["Meta", "10"]];
        let table = raw("Ad Spend", &headers, &rows);
        let (clean, report) = cleaner().clean_table(&table, &ads_schema()).unwrap();

        assert_eq!(clean.len(), 1);
        assert_eq!(report.rejections[0].reason, "required value missing");
    }

    #[test]
    fn test_constant_imputation_and_derivation() {
        let headers = ["Platform", "Spend (EUR)", "Conversions"];
        let rows: Vec<&[&str]> = vec![&["Google", "100", ""], &["Meta", "90", "3"]];
        let table = raw("Ad Spend", &headers, &rows);
        let (clean, report) = cleaner().clean_table(&table, &ads_schema()).unwrap();

        assert_eq!(clean.cell(0, "Conversions"), Some(&Cell::Int(0)));
        assert_eq!(clean.cell(0, "CPA"), Some(&Cell::Null));
        assert_eq!(clean.cell(1, "CPA"), Some(&Cell::Float(30.0)));
        assert_eq!(report.imputed.get("Conversions"), Some(&1));
        assert_eq!(report.derived.get("CPA"), Some(&1));
    }

    #[test]
    fn test_mean_imputation_rounds_integers() {
        let schema = SheetSchema::new("Website Traffic")
            .column(ColumnSpec::required("Sessions", ColumnType::Integer))
            .column(ColumnSpec::optional("Users", ColumnType::Integer).impute(Imputation::Mean))
            .column(ColumnSpec::optional("Bounce Rate", ColumnType::Rate).impute(Imputation::Mean));
        let rows: Vec<&[&str]> = vec![
            &["100", "10", "40%"],
            &["200", "", "60%"],
            &["300", "13", ""],
        ];
        let table = raw("Website Traffic", &["Sessions", "Users", "Bounce Rate"], &rows);
        let (clean, report) = cleaner().clean_table(&table, &schema).unwrap();

        assert_eq!(clean.cell(1, "Users"), Some(&Cell::Int(12)));
        let bounce = clean.cell(2, "Bounce Rate").and_then(Cell::as_f64).unwrap();
        assert!((bounce - 0.5).abs() < 1e-12);
        assert_eq!(report.imputed.len(), 2);
    }

    #[test]
    fn test_mode_imputation_breaks_ties_on_smallest() {
        let schema = SheetSchema::new("Social Media")
            .column(ColumnSpec::required("Week Starting", ColumnType::Date))
            .column(
                ColumnSpec::optional("Top Post Type", ColumnType::Text)
                    .normalize(Normalizer::LowerSnake)
                    .impute(Imputation::Mode),
            );
        let rows: Vec<&[&str]> = vec![
            &["2026-01-05", "Video"],
            &["2026-01-12", "Carousel"],
            &["2026-01-19", ""],
        ];
        let table = raw("Social Media", &["Week Starting", "Top Post Type"], &rows);
        let (clean, _) = cleaner().clean_table(&table, &schema).unwrap();

        assert_eq!(clean.cell(2, "Top Post Type"), Some(&Cell::Text("carousel".into())));
    }

    #[test]
    fn test_imputation_can_create_duplicates() {
        let headers = ["Platform", "Spend (EUR)", "Conversions"];
        let rows: Vec<&[&str]> = vec![&["Google", "100", "0"], &["Google", "100", ""]];
        let table = raw("Ad Spend", &headers, &rows);
        let (clean, report) = cleaner().clean_table(&table, &ads_schema()).unwrap();

        assert_eq!(clean.len(), 1);
        assert_eq!(report.duplicates_removed, 1);
    }

    #[test]
    fn test_sales_pipeline_derivations() {
        let headers = [
            "Company Name",
            "Contact Name",
            "Contact Email",
            "Deal Stage",
            "Deal Value (EUR)",
            "First Contact Date",
            "Last Activity Date",
        ];
        let rows: Vec<&[&str]> = vec![&[
            "Acme GmbH",
            "Jana Novak",
            "",
            "closed won",
            "€12,000",
            "2026-01-01",
            "2026-01-31",
        ]];
        let table = raw("Sales Pipeline", &headers, &rows);
        let (clean, report) = cleaner()
            .clean_table(&table, &sheets::sales_pipeline())
            .unwrap();

        assert_eq!(clean.cell(0, "Contact Email"), Some(&Cell::Text("jana@acmegmbh.com".into())));
        assert_eq!(clean.cell(0, "Days In Pipeline"), Some(&Cell::Int(30)));
        assert_eq!(clean.cell(0, "Deal Stage"), Some(&Cell::Text("Closed Won".into())));
        assert_eq!(clean.cell(0, "Lead Source"), Some(&Cell::Text("Unknown".into())));
        assert_eq!(
            clean.cell(0, "First Contact Date"),
            Some(&Cell::Date(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()))
        );
        assert_eq!(report.derived.get("Days In Pipeline"), Some(&1));
    }

    #[test]
    fn test_clean_reports_skipped_and_missing_sheets() {
        let tables = vec![
            raw("Notes", &["Text"], &[&["hello"]]),
            raw(
                "Ad Spend",
                &["Month", "Platform", "Campaign Name", "Spend (EUR)"],
                &[&["January 2026", "Google", "Brand", "500"]],
            ),
        ];
        let output = cleaner().clean(tables).unwrap();

        assert_eq!(output.tables.len(), 1);
        assert_eq!(output.skipped_sheets, vec!["Notes".to_string()]);
        assert_eq!(output.missing_sheets.len(), 4);
        assert_eq!(output.report("Ad Spend").unwrap().rows_out, 1);
        assert!(output.table("Ad Spend").is_some());
    }
}
