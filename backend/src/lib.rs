//! # Shelflife - Header-tolerant inventory spreadsheet importer
//!
//! Shelflife turns loosely structured spreadsheets (pantry lists, pharmacy
//! stock sheets, small-shop exports) into normalized inventory records with
//! an expiry date, and explains every row it could not use.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  CSV / JSON │────▶│   Parser    │────▶│  Resolver   │────▶│    Rows     │
//! │  (ISO/UTF8) │     │  (auto-enc) │     │  (aliases)  │     │ (dates etc) │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//!                                                                    │
//!                                         records + diagnostics ◀────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use shelflife::{import_file, AliasTable, ImportOptions};
//!
//! let success = import_file("estoque.csv", &AliasTable::default(), &ImportOptions::default())?;
//! println!("{} records staged", success.records.len());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (FieldRole, CellValue, StagedRecord)
//! - [`config`] - Alias table and import options
//! - [`diagnostics`] - Import trace returned with every attempt
//! - [`parser`] - CSV decoding with auto-detection
//! - [`transform`] - Header resolution, date coercion, row processing, pipeline
//! - [`validation`] - Staged record schema validation
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Configuration
pub mod config;

// Diagnostics
pub mod diagnostics;

// Parsing
pub mod parser;

// Import engine
pub mod transform;

// Validation
pub mod validation;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError, CsvError, FailureReport, ImportError, ImportFailure, ServerError, ValidationError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{CellValue, FieldRole, RawRow, SkippedRow, SourceLabel, StagedRecord};

// =============================================================================
// Re-exports - Configuration & diagnostics
// =============================================================================

pub use config::{load_alias_table, AliasTable, ImportOptions, ALIASES_ENV};
pub use diagnostics::ImportDiagnostics;

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content, delimiter_name, detect_delimiter, detect_encoding, parse_bytes_auto,
    parse_file_auto, parse_str, rows_from_json, rows_from_json_str, ParseResult,
};

// =============================================================================
// Re-exports - Import engine
// =============================================================================

pub use transform::{
    coerce_date, import_bytes, import_file, import_rows, normalize, process_row, resolve_columns,
    ColumnMap, ImportOutcome, ImportSuccess, RowOutcome,
};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{
    is_valid, is_valid_staged_record, validate, validate_document, validate_records,
    validate_staged_record,
};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::logs::LOG_BROADCASTER;
pub use api::types::{
    error_response, failure_response, ImportResponse, RecordErrors, ValidationStats,
};
pub use api::AppState;

// Server
pub mod server {
    pub use crate::api::server::{router, start_server};
}
