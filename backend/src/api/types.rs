//! REST API types for client integration.
//!
//! Records are returned in their staged form; the client decides what to
//! commit. Diagnostics are always included so the user can see why rows were
//! skipped or why the whole file was rejected.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::diagnostics::ImportDiagnostics;
use crate::error::ImportFailure;
use crate::models::StagedRecord;
use crate::transform::pipeline::ImportSuccess;
use crate::validation::validate_records;

/// Response sent after a successful upload and import.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    /// Unique job identifier
    pub job_id: String,

    /// Status: "ready" or "warning"
    pub status: String,

    /// Staged records, in source row order
    pub records: Vec<StagedRecord>,

    /// Import trace
    pub diagnostics: ImportDiagnostics,

    /// Schema check of the staged records
    pub validation: ValidationStats,
}

/// Validation statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationStats {
    pub valid: usize,
    pub invalid: usize,
    pub errors: Vec<RecordErrors>,
}

/// Schema errors of one record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordErrors {
    pub record_index: usize,
    pub errors: Vec<String>,
}

impl ValidationStats {
    pub fn for_records(records: &[StagedRecord]) -> Self {
        let errors: Vec<RecordErrors> = validate_records(records)
            .into_iter()
            .map(|(record_index, errors)| RecordErrors { record_index, errors })
            .collect();

        Self {
            valid: records.len() - errors.len(),
            invalid: errors.len(),
            errors,
        }
    }
}

impl From<ImportSuccess> for ImportResponse {
    fn from(success: ImportSuccess) -> Self {
        let validation = ValidationStats::for_records(&success.records);
        let status = if success.needs_review() || validation.invalid > 0 {
            "warning"
        } else {
            "ready"
        };

        ImportResponse {
            job_id: Uuid::new_v4().to_string(),
            status: status.to_string(),
            records: success.records,
            diagnostics: success.diagnostics,
            validation,
        }
    }
}

/// Body for a fatal import failure: `{status: "error", error, diagnostics}`.
pub fn failure_response(failure: &ImportFailure) -> Value {
    serde_json::to_value(failure.report()).unwrap_or_else(|_| error_response(&failure.message()))
}

/// Body for request-level errors (no diagnostics available).
pub fn error_response(error: &str) -> Value {
    json!({
        "status": "error",
        "error": error,
        "records": []
    })
}
