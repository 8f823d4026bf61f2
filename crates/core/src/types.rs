//! Row and table types shared by every stage of the pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

// ─── Raw (untyped) rows ─────────────────────────────────────────────────────

/// One row as read from a source sheet. Values are keyed by header name;
/// empty cells are absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// 1-based data row number within the sheet (header excluded).
    pub row_number: usize,
    pub values: BTreeMap<String, String>,
}

impl RawRecord {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }
}

/// A sheet exactly as ingested: header order plus untyped rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    pub name: String,
    pub headers: Vec<String>,
    pub records: Vec<RawRecord>,
}

impl RawTable {
    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ─── Typed cells ────────────────────────────────────────────────────────────

/// Declared type of a clean column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Text,
    Integer,
    Float,
    /// Fraction in [0, 1]; accepts `12%`, `12` and `0.12`.
    Rate,
    /// Amount with currency symbols and thousands separators stripped.
    Currency,
    Date,
    /// `January 2026`, stored as the first day of the month.
    Month,
}

impl ColumnType {
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ColumnType::Integer | ColumnType::Float | ColumnType::Rate | ColumnType::Currency
        )
    }

    pub fn is_temporal(self) -> bool {
        matches!(self, ColumnType::Date | ColumnType::Month)
    }
}

/// A single typed value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    #[default]
    Null,
    Int(i64),
    Float(f64),
    Date(NaiveDate),
    Text(String),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Numeric view of the cell; integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(v) => Some(*v as f64),
            Cell::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Cell::Date(d) => Some(*d),
            _ => None,
        }
    }

    fn float_bits(v: f64) -> u64 {
        if v == 0.0 {
            0.0f64.to_bits()
        } else if v.is_nan() {
            f64::NAN.to_bits()
        } else {
            v.to_bits()
        }
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Cell::Null, Cell::Null) => true,
            (Cell::Int(a), Cell::Int(b)) => a == b,
            (Cell::Float(a), Cell::Float(b)) => Cell::float_bits(*a) == Cell::float_bits(*b),
            (Cell::Date(a), Cell::Date(b)) => a == b,
            (Cell::Text(a), Cell::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Cell {}

impl Hash for Cell {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Cell::Null => {}
            Cell::Int(v) => v.hash(state),
            Cell::Float(v) => Cell::float_bits(*v).hash(state),
            Cell::Date(d) => d.hash(state),
            Cell::Text(s) => s.hash(state),
        }
    }
}

/// CSV rendering: null is empty, dates are ISO-8601.
impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Int(v) => write!(f, "{v}"),
            Cell::Float(v) => write!(f, "{v}"),
            Cell::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

// ─── Clean (typed) tables ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
}

/// A typed row; cells are positional against the owning table's schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CleanRecord {
    pub cells: Vec<Cell>,
}

/// A cleaned sheet. Every record has exactly `schema.len()` cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanTable {
    pub name: String,
    pub schema: Vec<ColumnDef>,
    pub records: Vec<CleanRecord>,
}

impl CleanTable {
    pub fn new(name: impl Into<String>, schema: Vec<ColumnDef>) -> Self {
        Self {
            name: name.into(),
            schema,
            records: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.schema.iter().position(|c| c.name == column)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.schema.iter().map(|c| c.name.as_str()).collect()
    }

    /// Cell at `(row, column)`; `None` when the column is not in the schema.
    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.records.get(row).and_then(|r| r.cells.get(idx))
    }

    /// Numeric values of a column, `None` entries for null cells.
    pub fn numbers(&self, column: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.column_index(column)?;
        Some(self.records.iter().map(|r| r.cells[idx].as_f64()).collect())
    }

    pub fn texts(&self, column: &str) -> Option<Vec<Option<&str>>> {
        let idx = self.column_index(column)?;
        Some(self.records.iter().map(|r| r.cells[idx].as_text()).collect())
    }

    pub fn dates(&self, column: &str) -> Option<Vec<Option<NaiveDate>>> {
        let idx = self.column_index(column)?;
        Some(self.records.iter().map(|r| r.cells[idx].as_date()).collect())
    }

    /// Sum of the non-null numeric values of a column.
    pub fn sum(&self, column: &str) -> Option<f64> {
        self.numbers(column)
            .map(|values| values.into_iter().flatten().sum())
    }
}
