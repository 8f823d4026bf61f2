//! Raw string → typed cell coercion and text normalisation.

use crate::schema::Normalizer;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use insights_core::{Cell, ColumnType};

const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%d/%m/%Y",
    "%B %d, %Y",
    "%d %B %Y",
];

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M"];

const CURRENCY_MARKERS: [&str; 5] = ["€", "$", "£", "EUR", "USD"];

/// Coerce one raw value to `column_type`. An `Err` is an irrecoverable type
/// mismatch and fails the row.
pub fn coerce(raw: &str, column_type: ColumnType) -> Result<Cell, String> {
    let raw = raw.trim();
    match column_type {
        ColumnType::Text => Ok(Cell::Text(raw.to_string())),
        ColumnType::Integer => parse_integer(raw).map(Cell::Int),
        ColumnType::Float => parse_number(raw).map(Cell::Float),
        ColumnType::Rate => parse_rate(raw).map(Cell::Float),
        ColumnType::Currency => parse_currency(raw).map(Cell::Float),
        ColumnType::Date => parse_date(raw).map(Cell::Date),
        ColumnType::Month => parse_month(raw).map(Cell::Date),
    }
}

/// Whether a raw value stands for "no value".
pub fn is_missing(raw: &str, missing_tokens: &[String]) -> bool {
    let raw = raw.trim();
    raw.is_empty() || missing_tokens.iter().any(|t| t == raw)
}

fn strip_thousands(raw: &str) -> String {
    raw.chars().filter(|c| *c != ',' && *c != '_' && !c.is_whitespace()).collect()
}

fn parse_number(raw: &str) -> Result<f64, String> {
    let cleaned = strip_thousands(raw);
    let value: f64 = cleaned
        .parse()
        .map_err(|_| format!("'{raw}' is not a number"))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("'{raw}' is not a finite number"))
    }
}

fn parse_integer(raw: &str) -> Result<i64, String> {
    let cleaned = strip_thousands(raw);
    if let Ok(v) = cleaned.parse::<i64>() {
        return Ok(v);
    }
    // Spreadsheet exports often write whole numbers as `12.0`.
    let value = parse_number(raw)?;
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Ok(value as i64)
    } else {
        Err(format!("'{raw}' is not a whole number"))
    }
}

/// `45%` and `45` both read as 0.45; `0.45` stays as is.
fn parse_rate(raw: &str) -> Result<f64, String> {
    let (body, percent) = match raw.strip_suffix('%') {
        Some(body) => (body.trim(), true),
        None => (raw, false),
    };
    let mut value = parse_number(body)?;
    if percent || value > 1.0 {
        value /= 100.0;
    }
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("'{raw}' is not a rate between 0% and 100%"))
    }
}

fn parse_currency(raw: &str) -> Result<f64, String> {
    let mut body = raw.to_string();
    for marker in CURRENCY_MARKERS {
        body = body.replace(marker, "");
    }
    parse_number(body.trim()).map_err(|_| format!("'{raw}' is not an amount"))
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    for format in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(raw, format) {
            return Ok(d);
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(dt.date());
        }
    }
    Err(format!("'{raw}' is not a date"))
}

/// `January 2026` / `Jan 2026` / any full date → first day of that month.
fn parse_month(raw: &str) -> Result<NaiveDate, String> {
    let padded = format!("1 {raw}");
    for format in ["%d %B %Y", "%d %b %Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(&padded, format) {
            return Ok(d);
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d") {
        return Ok(d);
    }
    parse_date(raw)
        .ok()
        .and_then(|d| d.with_day(1))
        .ok_or_else(|| format!("'{raw}' is not a month"))
}

/// Apply a text normaliser. Every normaliser is idempotent.
pub fn normalize(value: &str, normalizer: &Normalizer) -> String {
    match normalizer {
        Normalizer::None => value.to_string(),
        Normalizer::Trim => value.split_whitespace().collect::<Vec<_>>().join(" "),
        Normalizer::Lowercase => value.to_lowercase(),
        Normalizer::LowerSnake => value
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_")
            .to_lowercase(),
        Normalizer::TitleCase => title_case(value),
        Normalizer::Mapping(pairs) => pairs
            .iter()
            .find(|(from, _)| from == value)
            .map(|(_, to)| to.clone())
            .unwrap_or_else(|| value.to_string()),
    }
}

/// Upper-case each letter that follows a non-letter, lower-case the rest.
fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut prev_alpha = false;
    for c in value.split_whitespace().collect::<Vec<_>>().join(" ").chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}
