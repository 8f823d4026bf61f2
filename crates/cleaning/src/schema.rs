//! Declared sheet schemas: column types, requiredness, imputation policy,
//! text normalisation, and derived-column formulas.

use insights_core::{Cell, ColumnDef, ColumnType};
use serde::{Deserialize, Serialize};

/// How a null cell is filled after coercion. Always declared per column,
/// never inferred from the data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Imputation {
    None,
    /// Mean of the non-null values; rounded for integer columns.
    Mean,
    /// Most frequent non-null value; ties go to the smallest value.
    Mode,
    Constant(Cell),
}

/// Text standardisation applied to coerced text cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalizer {
    None,
    Trim,
    Lowercase,
    /// `Paid Search` → `paid_search`.
    LowerSnake,
    /// `linkedin outreach` → `Linkedin Outreach`.
    TitleCase,
    /// Exact-match replacements, first match wins.
    Mapping(Vec<(String, String)>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub column_type: ColumnType,
    pub required: bool,
    pub imputation: Imputation,
    pub normalizer: Normalizer,
}

impl ColumnSpec {
    pub fn required(name: &str, column_type: ColumnType) -> Self {
        Self {
            name: name.to_string(),
            column_type,
            required: true,
            imputation: Imputation::None,
            normalizer: Normalizer::None,
        }
    }

    pub fn optional(name: &str, column_type: ColumnType) -> Self {
        Self {
            required: false,
            ..Self::required(name, column_type)
        }
    }

    pub fn impute(mut self, imputation: Imputation) -> Self {
        self.imputation = imputation;
        self
    }

    pub fn normalize(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }
}

/// Row-level formula for a derived column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formula {
    /// `numerator / denominator * scale`; null on a zero or missing operand.
    Ratio {
        numerator: String,
        denominator: String,
        scale: f64,
    },
    /// Whole days from `start` to `end`.
    DaysBetween { start: String, end: String },
    /// `first-name@company.com` from a contact and company name.
    EmailFromContact { name: String, company: String },
}

impl Formula {
    /// Columns the formula reads.
    pub fn inputs(&self) -> Vec<&str> {
        match self {
            Formula::Ratio {
                numerator,
                denominator,
                ..
            } => vec![numerator.as_str(), denominator.as_str()],
            Formula::DaysBetween { start, end } => vec![start.as_str(), end.as_str()],
            Formula::EmailFromContact { name, company } => vec![name.as_str(), company.as_str()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeriveMode {
    /// Always computed; overwrites any source value.
    Create,
    /// Only fills cells that are null after imputation.
    FillMissing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedColumn {
    pub name: String,
    pub column_type: ColumnType,
    pub formula: Formula,
    pub mode: DeriveMode,
}

impl DerivedColumn {
    pub fn create(name: &str, column_type: ColumnType, formula: Formula) -> Self {
        Self {
            name: name.to_string(),
            column_type,
            formula,
            mode: DeriveMode::Create,
        }
    }

    pub fn fill_missing(name: &str, column_type: ColumnType, formula: Formula) -> Self {
        Self {
            mode: DeriveMode::FillMissing,
            ..Self::create(name, column_type, formula)
        }
    }
}

/// The declared shape of one sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetSchema {
    pub sheet: String,
    pub columns: Vec<ColumnSpec>,
    pub derived: Vec<DerivedColumn>,
}

impl SheetSchema {
    pub fn new(sheet: &str) -> Self {
        Self {
            sheet: sheet.to_string(),
            columns: Vec::new(),
            derived: Vec::new(),
        }
    }

    pub fn column(mut self, spec: ColumnSpec) -> Self {
        self.columns.push(spec);
        self
    }

    pub fn derive(mut self, derived: DerivedColumn) -> Self {
        self.derived.push(derived);
        self
    }

    pub fn spec(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn required_columns(&self) -> impl Iterator<Item = &ColumnSpec> {
        self.columns.iter().filter(|c| c.required)
    }

    /// Output schema: declared columns in order, then derived columns that
    /// are not declared.
    pub fn output_schema(&self) -> Vec<ColumnDef> {
        let mut schema: Vec<ColumnDef> = self
            .columns
            .iter()
            .map(|c| ColumnDef {
                name: c.name.clone(),
                column_type: c.column_type,
            })
            .collect();
        for d in &self.derived {
            if !schema.iter().any(|c| c.name == d.name) {
                schema.push(ColumnDef {
                    name: d.name.clone(),
                    column_type: d.column_type,
                });
            }
        }
        schema
    }

    /// File name the cleaned sheet is persisted under.
    pub fn output_file_name(&self) -> String {
        format!("{}_Clean.csv", self.sheet.replace(' ', "_"))
    }
}
