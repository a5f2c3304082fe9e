//! Error types for the Shelflife import pipeline.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`CsvError`] - Text source decoding errors
//! - [`ImportError`] - Fatal import conditions (empty table, missing columns)
//! - [`ImportFailure`] - An [`ImportError`] together with the diagnostics
//!   collected before the import stopped
//! - [`ConfigError`] - Alias table loading errors
//! - [`ValidationError`] - Staged record schema errors
//! - [`ServerError`] - HTTP layer errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use serde::Serialize;
use thiserror::Error;

use crate::diagnostics::ImportDiagnostics;
use crate::models::FieldRole;

// =============================================================================
// CSV Source Errors
// =============================================================================

/// Errors while turning raw bytes into a table.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to decode the text encoding.
    #[error("Failed to decode text: {0}")]
    EncodingError(String),

    /// Invalid CSV format.
    #[error("Invalid CSV format at line {line}: {message}")]
    ParseError { line: u64, message: String },

    /// Empty file.
    #[error("File is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in the first line")]
    NoHeaders,

    /// JSON input is not an array of row objects.
    #[error("Invalid JSON rows: {0}")]
    JsonRows(String),
}

impl From<csv::Error> for CsvError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        CsvError::ParseError {
            line,
            message: err.to_string(),
        }
    }
}

// =============================================================================
// Import Errors
// =============================================================================

/// Conditions that stop an import before any record is staged.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The table has no rows at all.
    #[error("The spreadsheet has no rows to import")]
    EmptySource,

    /// `Name` or `Expiry` could not be matched to any header.
    #[error(
        "Could not find the {} column(s). Columns found in the file: {}",
        join_roles(.missing),
        quote_headers(.found)
    )]
    MissingRequiredColumns {
        missing: Vec<FieldRole>,
        found: Vec<String>,
    },

    /// The source reader could not decode the input.
    #[error("Could not read the file: {0}")]
    Source(#[from] CsvError),
}

fn join_roles(roles: &[FieldRole]) -> String {
    roles
        .iter()
        .map(|r| r.label())
        .collect::<Vec<_>>()
        .join(" and ")
}

fn quote_headers(headers: &[String]) -> String {
    if headers.is_empty() {
        return "(none)".to_string();
    }
    headers
        .iter()
        .map(|h| format!("\"{}\"", h))
        .collect::<Vec<_>>()
        .join(", ")
}

/// A fatal import error carrying whatever diagnostics were collected.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct ImportFailure {
    pub error: ImportError,
    pub diagnostics: ImportDiagnostics,
}

impl ImportFailure {
    pub fn new(error: ImportError, diagnostics: ImportDiagnostics) -> Self {
        Self { error, diagnostics }
    }

    /// User-facing description of what went wrong.
    pub fn message(&self) -> String {
        self.error.to_string()
    }

    pub fn report(&self) -> FailureReport<'_> {
        FailureReport {
            status: "error",
            error: self.message(),
            diagnostics: &self.diagnostics,
        }
    }
}

/// Serializable view of an [`ImportFailure`].
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureReport<'a> {
    pub status: &'static str,
    pub error: String,
    pub diagnostics: &'a ImportDiagnostics,
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading an alias table.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error.
    #[error("Cannot read alias table '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON error.
    #[error("Invalid alias table JSON: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors during staged record validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Schema validation failed.
    #[error("Validation failed: {errors:?}")]
    SchemaError { errors: Vec<String> },

    /// Invalid field value.
    #[error("Invalid value for field '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Import failed.
    #[error("Import failed: {0}")]
    Import(#[from] ImportFailure),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for source decoding.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for alias table loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_lists_headers() {
        let err = ImportError::MissingRequiredColumns {
            missing: vec![FieldRole::Expiry],
            found: vec!["Produto".into(), "Preço".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("expiry date"));
        assert!(msg.contains("\"Produto\""));
        assert!(msg.contains("\"Preço\""));
    }

    #[test]
    fn test_missing_columns_without_headers() {
        let err = ImportError::MissingRequiredColumns {
            missing: vec![FieldRole::Name, FieldRole::Expiry],
            found: vec![],
        };
        let msg = err.to_string();
        assert!(msg.contains("product name and expiry date"));
        assert!(msg.contains("(none)"));
    }

    #[test]
    fn test_error_conversion_chain() {
        let csv_err = CsvError::EmptyFile;
        let import_err: ImportError = csv_err.into();
        assert!(import_err.to_string().contains("empty"));
    }

    #[test]
    fn test_failure_keeps_diagnostics() {
        let mut diagnostics = ImportDiagnostics::default();
        diagnostics.total_rows_found = 4;
        let failure = ImportFailure::new(ImportError::EmptySource, diagnostics);
        assert_eq!(failure.message(), failure.to_string());
        assert_eq!(failure.report().diagnostics.total_rows_found, 4);
        assert_eq!(failure.report().status, "error");
    }
}
