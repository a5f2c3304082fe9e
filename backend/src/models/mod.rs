//! Domain models for the Shelflife import pipeline.
//!
//! This module contains the core data structures used throughout the pipeline:
//!
//! - [`FieldRole`] - Logical inventory field the importer must locate
//! - [`CellValue`] - Raw spreadsheet cell as handed over by a source reader
//! - [`RawRow`] - One source row, header → cell, in column order
//! - [`StagedRecord`] - Normalized, import-ready inventory entry
//! - [`SkippedRow`] - A row rejected during import, with its reason
//! - [`SourceLabel`] - Human-readable name/size of the imported file

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Category assigned when the source has no usable category cell.
pub const DEFAULT_CATEGORY: &str = "Geral";

/// Quantity assigned when the source has no usable quantity cell.
pub const DEFAULT_QUANTITY: u32 = 1;

// =============================================================================
// Field Role
// =============================================================================

/// Logical inventory field that must be located among arbitrary headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldRole {
    /// Product name (required).
    Name,
    /// Expiry date (required).
    Expiry,
    /// Product category.
    Category,
    /// Units in stock.
    Quantity,
    /// Storage location (shelf, room, fridge...).
    Location,
    /// EAN/GTIN or internal code.
    Barcode,
}

impl FieldRole {
    /// All roles, in resolution order.
    pub const ALL: [FieldRole; 6] = [
        FieldRole::Name,
        FieldRole::Expiry,
        FieldRole::Category,
        FieldRole::Quantity,
        FieldRole::Location,
        FieldRole::Barcode,
    ];

    /// Roles without which no record can be staged.
    pub const REQUIRED: [FieldRole; 2] = [FieldRole::Name, FieldRole::Expiry];

    pub fn is_required(&self) -> bool {
        Self::REQUIRED.contains(self)
    }

    /// Label shown to end users in diagnostics and error messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Name => "product name",
            Self::Expiry => "expiry date",
            Self::Category => "category",
            Self::Quantity => "quantity",
            Self::Location => "location",
            Self::Barcode => "barcode",
        }
    }
}

impl fmt::Display for FieldRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Raw cells and rows
// =============================================================================

/// A raw cell value of the kind a spreadsheet reader produces.
///
/// `Date` carries the offset the reader attached. Readers that only know a
/// calendar day should use [`CellValue::from_date`], which pins midnight at
/// offset zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Date(DateTime<FixedOffset>),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self::Date(date.and_time(NaiveTime::MIN).and_utc().fixed_offset())
    }

    /// Convert a JSON cell (as emitted by an upstream reader) into a typed cell.
    ///
    /// Strings stay text even when they look like dates; only the reader knows
    /// whether a cell was a native date.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Empty,
            Value::String(s) if s.is_empty() => Self::Empty,
            Value::String(s) => Self::Text(s.clone()),
            Value::Number(n) => n.as_f64().map(Self::Number).unwrap_or(Self::Empty),
            Value::Bool(b) => Self::Text(b.to_string()),
            other => Self::Text(other.to_string()),
        }
    }

    /// True for `Empty` and for text that is blank after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::Number(_) | Self::Date(_) => false,
        }
    }

    /// Trimmed textual rendering used for free-text fields.
    ///
    /// Integral numbers render without a fractional part so numeric barcodes
    /// survive; dates render as their own calendar day.
    pub fn as_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.trim().to_string(),
            Self::Number(n) => format_number(*n),
            Self::Date(dt) => dt.date_naive().format("%Y-%m-%d").to_string(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("(empty)"),
            Self::Text(s) => write!(f, "\"{}\"", s),
            Self::Number(n) => f.write_str(&format_number(*n)),
            Self::Date(dt) => write!(f, "{}", dt.to_rfc3339()),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// One source row: observed header → raw cell, in column order.
pub type RawRow = IndexMap<String, CellValue>;

/// Build a [`RawRow`] from a JSON object, preserving key order when the
/// object was decoded with an order-preserving map.
pub fn raw_row_from_json(value: &Value) -> RawRow {
    value
        .as_object()
        .map(|obj| {
            obj.iter()
                .map(|(k, v)| (k.clone(), CellValue::from_json(v)))
                .collect()
        })
        .unwrap_or_default()
}

// =============================================================================
// Output records
// =============================================================================

/// A fully normalized inventory entry, ready for a record sink.
///
/// `name` is never blank and `expiry_date` always has the `YYYY-MM-DD` shape;
/// the remaining fields carry defaults when the source had nothing usable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedRecord {
    pub name: String,
    pub expiry_date: String,
    pub category: String,
    pub quantity: u32,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub barcode: String,
}

/// A row rejected during import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRow {
    /// Physical row number in the source, header rows included.
    pub row_number: usize,
    /// Human-readable reason, quoting the offending raw value.
    pub reason: String,
}

/// Name and size of the imported source, used only in the step log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLabel {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}

impl SourceLabel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size_bytes: None,
        }
    }

    pub fn with_size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = Some(size_bytes);
        self
    }
}

impl fmt::Display for SourceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.size_bytes {
            Some(size) => write!(f, "{} ({} bytes)", self.name, size),
            None => f.write_str(&self.name),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
