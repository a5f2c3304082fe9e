//! Import diagnostics: the trace returned with every import attempt.
//!
//! The collector is append-only. Each macro-phase of the pipeline adds one
//! entry to `steps` (and mirrors it to the log broadcaster), the header list
//! and raw preview are captured once, and every visited row bumps exactly one
//! of the success/skipped/ignored counters.

use serde::Serialize;

use crate::api::logs::{log_error, log_info, log_success, log_warning};
use crate::models::{RawRow, SkippedRow, SourceLabel};
use crate::transform::resolver::ColumnMap;
use crate::transform::rows::RowOutcome;

/// Lower and upper bound for the number of raw rows kept for debugging.
pub const MIN_PREVIEW_ROWS: usize = 2;
pub const MAX_PREVIEW_ROWS: usize = 3;

/// Structured trace of one import attempt.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportDiagnostics {
    /// File the rows came from.
    pub source: SourceLabel,
    /// Rows visited by the row loop.
    pub total_rows_found: usize,
    /// Rows staged as records.
    pub success_count: usize,
    /// Rows dropped silently because the name cell was blank.
    pub ignored_count: usize,
    /// Rows rejected with a reason.
    pub skipped_rows: Vec<SkippedRow>,
    /// Headers of the first populated row, in column order.
    pub columns_found: Vec<String>,
    /// Role bindings chosen by the resolver.
    pub column_map: ColumnMap,
    /// Human-readable progress messages.
    pub steps: Vec<String>,
    /// First raw rows exactly as received.
    pub raw_preview: Vec<RawRow>,
}

impl ImportDiagnostics {
    pub fn new(source: SourceLabel) -> Self {
        Self {
            source,
            ..Self::default()
        }
    }

    /// Append a progress step.
    pub fn step(&mut self, message: impl Into<String>) {
        let message = message.into();
        log_info(message.clone());
        self.steps.push(message);
    }

    /// Append a step describing something the user should double-check.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        log_warning(message.clone());
        self.steps.push(format!("Warning: {}", message));
    }

    /// Append the terminal step of a successful import.
    pub fn finish(&mut self, message: impl Into<String>) {
        let message = message.into();
        log_success(message.clone());
        self.steps.push(message);
    }

    /// Append the terminal step of a failed import.
    pub fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        log_error(message.clone());
        self.steps.push(format!("Import failed: {}", message));
    }

    /// Capture the observed header list. Later calls are ignored.
    pub fn set_columns(&mut self, headers: &[String]) {
        if self.columns_found.is_empty() {
            self.columns_found = headers.to_vec();
        }
    }

    /// Keep a copy of the first rows for user-facing debugging.
    /// Later calls are ignored.
    pub fn set_preview(&mut self, rows: &[RawRow], limit: usize) {
        if !self.raw_preview.is_empty() {
            return;
        }
        let limit = limit.clamp(MIN_PREVIEW_ROWS, MAX_PREVIEW_ROWS);
        self.raw_preview = rows.iter().take(limit).cloned().collect();
    }

    pub fn set_column_map(&mut self, map: ColumnMap) {
        self.column_map = map;
    }

    /// Account for one processed row.
    pub fn record(&mut self, outcome: &RowOutcome) {
        self.total_rows_found += 1;
        match outcome {
            RowOutcome::Accepted(_) => self.success_count += 1,
            RowOutcome::Skipped(skipped) => self.skipped_rows.push(skipped.clone()),
            RowOutcome::Ignored => self.ignored_count += 1,
        }
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped_rows.len()
    }

    /// Counters add up to the number of visited rows.
    pub fn is_consistent(&self) -> bool {
        self.success_count + self.skipped_rows.len() + self.ignored_count == self.total_rows_found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CellValue, StagedRecord};

    fn row(name: &str) -> RawRow {
        let mut row = RawRow::new();
        row.insert("Produto".into(), CellValue::text(name));
        row
    }

    #[test]
    fn test_preview_is_bounded() {
        let rows: Vec<RawRow> = (0..10).map(|i| row(&format!("Item {}", i))).collect();

        let mut diagnostics = ImportDiagnostics::default();
        diagnostics.set_preview(&rows, 50);
        assert_eq!(diagnostics.raw_preview.len(), MAX_PREVIEW_ROWS);

        let mut diagnostics = ImportDiagnostics::default();
        diagnostics.set_preview(&rows, 0);
        assert_eq!(diagnostics.raw_preview.len(), MIN_PREVIEW_ROWS);
    }

    #[test]
    fn test_preview_and_columns_set_once() {
        let mut diagnostics = ImportDiagnostics::default();
        diagnostics.set_preview(&[row("Leite")], 3);
        diagnostics.set_preview(&[row("Arroz"), row("Feijão")], 3);
        assert_eq!(diagnostics.raw_preview.len(), 1);

        diagnostics.set_columns(&["Produto".to_string()]);
        diagnostics.set_columns(&["Outro".to_string()]);
        assert_eq!(diagnostics.columns_found, vec!["Produto"]);
    }

    #[test]
    fn test_record_counts() {
        let mut diagnostics = ImportDiagnostics::default();
        diagnostics.record(&RowOutcome::Accepted(StagedRecord {
            name: "Leite".into(),
            expiry_date: "2025-12-31".into(),
            category: "Geral".into(),
            quantity: 1,
            location: String::new(),
            barcode: String::new(),
        }));
        diagnostics.record(&RowOutcome::Ignored);
        diagnostics.record(&RowOutcome::Skipped(SkippedRow {
            row_number: 4,
            reason: "bad date".into(),
        }));

        assert_eq!(diagnostics.total_rows_found, 3);
        assert_eq!(diagnostics.success_count, 1);
        assert_eq!(diagnostics.ignored_count, 1);
        assert_eq!(diagnostics.skipped_count(), 1);
        assert!(diagnostics.is_consistent());
    }

    #[test]
    fn test_steps_are_ordered() {
        let mut diagnostics = ImportDiagnostics::new(SourceLabel::new("estoque.csv"));
        diagnostics.step("Reading");
        diagnostics.warn("Header bound twice");
        diagnostics.fail("no rows");
        assert_eq!(diagnostics.steps.len(), 3);
        assert!(diagnostics.steps[1].starts_with("Warning:"));
        assert!(diagnostics.steps[2].starts_with("Import failed:"));
    }

    #[test]
    fn test_serializes_camel_case() {
        let diagnostics = ImportDiagnostics::default();
        let json = serde_json::to_value(&diagnostics).unwrap();
        assert!(json.get("totalRowsFound").is_some());
        assert!(json.get("skippedRows").is_some());
        assert!(json.get("rawPreview").is_some());
    }
}
