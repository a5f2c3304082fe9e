//! High-level import API.
//!
//! Combines resolution, row processing and diagnostics into one call:
//!
//! ```rust,ignore
//! use shelflife::{import_file, AliasTable, ImportOptions};
//!
//! match import_file("estoque.csv", &AliasTable::default(), &ImportOptions::default()) {
//!     Ok(success) => println!("{} records staged", success.records.len()),
//!     Err(failure) => eprintln!("{}\n{:#?}", failure, failure.diagnostics.steps),
//! }
//! ```
//!
//! Every entry point returns an [`ImportOutcome`]; diagnostics travel with
//! both the success and the failure side.

use serde::Serialize;
use std::path::Path;

use super::resolver::resolve_columns;
use super::rows::{process_row, RowOutcome};
use crate::api::logs::log_warning_indent;
use crate::config::{AliasTable, ImportOptions};
use crate::diagnostics::ImportDiagnostics;
use crate::error::{CsvError, ImportError, ImportFailure};
use crate::models::{RawRow, SourceLabel, StagedRecord};
use crate::parser::{delimiter_name, parse_bytes_auto};

/// Records staged by a completed import.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSuccess {
    /// Accepted records, in source row order.
    pub records: Vec<StagedRecord>,
    pub diagnostics: ImportDiagnostics,
}

impl ImportSuccess {
    /// True when the user should look at the diagnostics before
    /// committing: some rows were skipped, or nothing was staged at all.
    pub fn needs_review(&self) -> bool {
        self.diagnostics.skipped_count() > 0 || self.records.is_empty()
    }
}

/// Result of any import entry point.
pub type ImportOutcome = Result<ImportSuccess, ImportFailure>;

/// Import an already-materialized table.
pub fn import_rows(
    rows: Vec<RawRow>,
    source: SourceLabel,
    aliases: &AliasTable,
    options: &ImportOptions,
) -> ImportOutcome {
    let mut diagnostics = ImportDiagnostics::new(source);
    diagnostics.step(format!("Reading {}", diagnostics.source));
    run(rows, diagnostics, aliases, options)
}

/// Decode CSV bytes and import them.
pub fn import_bytes(
    bytes: &[u8],
    source: SourceLabel,
    aliases: &AliasTable,
    options: &ImportOptions,
) -> ImportOutcome {
    let mut diagnostics = ImportDiagnostics::new(source);
    diagnostics.step(format!("Reading {}", diagnostics.source));

    let parsed = match parse_bytes_auto(bytes) {
        Ok(parsed) => parsed,
        // Nothing to decode is an empty table, not a broken file.
        Err(CsvError::EmptyFile) => return Err(fail(diagnostics, ImportError::EmptySource)),
        Err(e) => return Err(fail(diagnostics, ImportError::Source(e))),
    };
    diagnostics.step(format!(
        "Decoded as {} with separator '{}'",
        parsed.encoding,
        delimiter_name(parsed.delimiter)
    ));
    diagnostics.set_columns(&parsed.headers);

    run(parsed.rows, diagnostics, aliases, options)
}

/// Read a CSV file from disk and import it.
pub fn import_file(
    path: impl AsRef<Path>,
    aliases: &AliasTable,
    options: &ImportOptions,
) -> ImportOutcome {
    let path = path.as_ref();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    match std::fs::read(path) {
        Ok(bytes) => {
            let source = SourceLabel::new(name).with_size(bytes.len() as u64);
            import_bytes(&bytes, source, aliases, options)
        }
        Err(e) => {
            let mut diagnostics = ImportDiagnostics::new(SourceLabel::new(name));
            diagnostics.step(format!("Reading {}", diagnostics.source));
            Err(fail(diagnostics, ImportError::Source(CsvError::IoError(e))))
        }
    }
}

fn run(
    rows: Vec<RawRow>,
    mut diagnostics: ImportDiagnostics,
    aliases: &AliasTable,
    options: &ImportOptions,
) -> ImportOutcome {
    diagnostics.set_preview(&rows, options.preview_rows);

    if rows.is_empty() {
        return Err(fail(diagnostics, ImportError::EmptySource));
    }

    let headers = first_populated_headers(&rows);
    diagnostics.set_columns(&headers);
    diagnostics.step(format!(
        "Found {} rows and {} columns: {}",
        rows.len(),
        headers.len(),
        headers.join(", ")
    ));

    let columns = resolve_columns(&headers, aliases);
    diagnostics.set_column_map(columns.clone());
    if let Err(e) = columns.ensure_required(&headers) {
        return Err(fail(diagnostics, e));
    }
    diagnostics.step(format!("Resolved columns: {}", columns.describe()));

    for (header, roles) in columns.shared_headers() {
        let roles = roles.iter().map(|r| r.label()).collect::<Vec<_>>().join(" and ");
        diagnostics.warn(format!("Column \"{}\" is used for both {}", header, roles));
    }

    let mut records = Vec::new();
    for (index, row) in rows.iter().enumerate() {
        let outcome = process_row(row, &columns, index, options);
        diagnostics.record(&outcome);
        if let RowOutcome::Accepted(record) = outcome {
            records.push(record);
        }
    }
    diagnostics.step(format!(
        "Processed {} rows: {} accepted, {} skipped, {} ignored",
        diagnostics.total_rows_found,
        diagnostics.success_count,
        diagnostics.skipped_count(),
        diagnostics.ignored_count
    ));
    for skipped in diagnostics.skipped_rows.iter().take(3) {
        log_warning_indent(format!("Row {}: {}", skipped.row_number, skipped.reason), 1);
    }

    diagnostics.finish(format!("{} records ready to import", records.len()));

    Ok(ImportSuccess { records, diagnostics })
}

/// Headers of the first row that has any, in column order.
fn first_populated_headers(rows: &[RawRow]) -> Vec<String> {
    rows.iter()
        .find(|row| !row.is_empty())
        .map(|row| row.keys().cloned().collect())
        .unwrap_or_default()
}

fn fail(mut diagnostics: ImportDiagnostics, error: ImportError) -> ImportFailure {
    diagnostics.fail(error.to_string());
    ImportFailure::new(error, diagnostics)
}
