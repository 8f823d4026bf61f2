//! Workbook reader. The source is a spreadsheet file (`.xlsx`, `.xls`,
//! `.ods`, ...) with one worksheet per sheet, a directory of per-sheet CSV
//! files, or a single CSV treated as a one-sheet workbook.

use calamine::{open_workbook_auto, Data, DataType, Reader};
use csv::{ReaderBuilder, Trim};
use insights_core::{InsightsError, InsightsResult, RawRecord, RawTable};
use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const SPREADSHEET_EXTENSIONS: [&str; 6] = ["xlsx", "xlsm", "xlsb", "xla", "xls", "ods"];

/// All sheets of a source workbook, keyed by sheet name.
#[derive(Debug, Clone)]
pub struct Workbook {
    path: PathBuf,
    sheets: BTreeMap<String, RawTable>,
}

impl Workbook {
    /// Read every sheet under `path`.
    ///
    /// Fails with `SourceUnreadable` when the path is missing, a file cannot
    /// be parsed, or the source holds no sheets.
    pub fn open(path: impl AsRef<Path>) -> InsightsResult<Self> {
        let path = path.as_ref();
        let metadata = fs::metadata(path)
            .map_err(|e| InsightsError::source_unreadable(path.display(), e))?;

        let tables = if metadata.is_file() && is_spreadsheet(path) {
            read_spreadsheet(path)?
        } else {
            read_csv_sheets(path, metadata.is_dir())?
        };

        if tables.is_empty() {
            return Err(InsightsError::source_unreadable(path.display(), "no sheets found"));
        }

        let mut sheets = BTreeMap::new();
        for table in tables {
            info!(sheet = %table.name, rows = table.len(), "Loaded sheet");
            let name = table.name.clone();
            if sheets.insert(name.clone(), table).is_some() {
                return Err(InsightsError::source_unreadable(
                    path.display(),
                    format!("sheet '{name}' appears more than once"),
                ));
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            sheets,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sheet(&self, name: &str) -> Option<&RawTable> {
        self.sheets.get(name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Hand the sheets over by value, in sheet-name order.
    pub fn into_tables(self) -> Vec<RawTable> {
        self.sheets.into_values().collect()
    }
}

/// Every non-empty worksheet of a spreadsheet file, in workbook order. The
/// first row of each worksheet is its header.
pub fn read_spreadsheet(path: &Path) -> InsightsResult<Vec<RawTable>> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| InsightsError::source_unreadable(path.display(), e))?;

    let mut tables = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| InsightsError::source_unreadable(path.display(), e))?;
        if range.is_empty() {
            warn!(sheet = %name, "Empty worksheet skipped");
            continue;
        }

        let mut rows = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect::<Vec<String>>());
        let headers = rows.next().unwrap_or_default();
        let body = rows
            .filter(|row| row.iter().any(|v| !v.is_empty()))
            .map(Ok);
        let table = build_table(&name, headers, body).map_err(|e| {
            InsightsError::source_unreadable(path.display(), format!("sheet '{name}': {e}"))
        })?;
        tables.push(table);
    }
    Ok(tables)
}

/// Spreadsheet cell as the string a CSV export would hold. Dates become
/// ISO `YYYY-MM-DD`; error cells read as missing.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(_) => match cell.as_date() {
            Some(date) => date.format("%Y-%m-%d").to_string(),
            None => cell.as_f64().map(|f| f.to_string()).unwrap_or_default(),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => match cell.as_date() {
            Some(date) => date.format("%Y-%m-%d").to_string(),
            None => s.clone(),
        },
    }
}

fn read_csv_sheets(path: &Path, is_dir: bool) -> InsightsResult<Vec<RawTable>> {
    let files = if is_dir {
        let mut files = Vec::new();
        let entries = fs::read_dir(path)
            .map_err(|e| InsightsError::source_unreadable(path.display(), e))?;
        for entry in entries {
            let entry = entry.map_err(|e| InsightsError::source_unreadable(path.display(), e))?;
            let file = entry.path();
            if file.is_file() && is_csv(&file) {
                files.push(file);
            }
        }
        files.sort();
        files
    } else {
        vec![path.to_path_buf()]
    };

    files
        .iter()
        .map(|file| {
            let reader = fs::File::open(file)
                .map_err(|e| InsightsError::source_unreadable(file.display(), e))?;
            read_sheet(&sheet_name(file), reader)
                .map_err(|e| InsightsError::source_unreadable(file.display(), e))
        })
        .collect()
}

/// Parse one sheet from CSV text. The first row is the header.
pub fn read_sheet<R: Read>(name: &str, reader: R) -> Result<RawTable, String> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .trim(Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| e.to_string())?
        .iter()
        .map(str::to_string)
        .collect();

    let rows = rdr.into_records().map(|record| {
        record
            .map(|r| r.iter().map(str::to_string).collect::<Vec<String>>())
            .map_err(|e| e.to_string())
    });
    build_table(name, headers, rows)
}

/// Validate the header row and key each data row by column name.
fn build_table<I>(name: &str, headers: Vec<String>, rows: I) -> Result<RawTable, String>
where
    I: IntoIterator<Item = Result<Vec<String>, String>>,
{
    let headers: Vec<String> = headers
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    if headers.iter().all(String::is_empty) {
        return Err("sheet has no header row".to_string());
    }
    for (i, header) in headers.iter().enumerate() {
        if !header.is_empty() && headers[..i].contains(header) {
            return Err(format!("duplicate column '{header}'"));
        }
    }

    let mut records = Vec::new();
    for (i, row) in rows.into_iter().enumerate() {
        let row = row?;
        let values: BTreeMap<String, String> = headers
            .iter()
            .zip(row.iter())
            .filter(|(h, v)| !h.is_empty() && !v.is_empty())
            .map(|(h, v)| (h.clone(), v.clone()))
            .collect();
        records.push(RawRecord {
            row_number: i + 1,
            values,
        });
    }

    debug!(sheet = name, columns = headers.len(), rows = records.len(), "Parsed sheet");

    Ok(RawTable {
        name: name.to_string(),
        headers: headers.into_iter().filter(|h| !h.is_empty()).collect(),
        records,
    })
}

/// `Website_Traffic.csv` → `Website Traffic`.
pub fn sheet_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().replace('_', " ").trim().to_string())
        .unwrap_or_default()
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .map(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

fn is_csv(path: &Path) -> bool {
    has_extension(path, &["csv"])
}

fn is_spreadsheet(path: &Path) -> bool {
    has_extension(path, &SPREADSHEET_EXTENSIONS)
}
