//! JSON Schema validation for staged records.
//!
//! The schema (Draft 7) is embedded at compile time from
//! `schemas/staged-record.json`. It restates what the importer guarantees
//! about its output, so record files edited by hand or produced by another
//! tool can be checked before they reach a record sink.
//!
//! # Example
//!
//! ```rust,ignore
//! use serde_json::json;
//! use shelflife::validation::is_valid_staged_record;
//!
//! let record = json!({
//!     "name": "Leite",
//!     "expiryDate": "2025-12-31",
//!     "category": "Geral",
//!     "quantity": 1
//! });
//! assert!(is_valid_staged_record(&record));
//! ```

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::error::ValidationError;
use crate::models::StagedRecord;

static STAGED_RECORD_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/staged-record.json"))
        .expect("Invalid embedded schema")
});

/// Validate a JSON value against a JSON schema.
///
/// Returns every error message when the value is invalid.
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator =
        jsonschema::draft7::new(schema).map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator.iter_errors(data).map(|e| e.to_string()).collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Simpler version: just true/false.
pub fn is_valid(schema: &Value, data: &Value) -> bool {
    jsonschema::draft7::is_valid(schema, data)
}

/// Validate one record against the staged record schema.
pub fn validate_staged_record(data: &Value) -> Result<(), Vec<String>> {
    validate(&STAGED_RECORD_SCHEMA, data)
}

/// Quick check against the staged record schema.
pub fn is_valid_staged_record(data: &Value) -> bool {
    is_valid(&STAGED_RECORD_SCHEMA, data)
}

/// Validate typed records. Returns `(record index, errors)` for every
/// invalid record.
pub fn validate_records(records: &[StagedRecord]) -> Vec<(usize, Vec<String>)> {
    records
        .iter()
        .enumerate()
        .filter_map(|(i, record)| {
            let result = serde_json::to_value(record)
                .map_err(|e| vec![e.to_string()])
                .and_then(|value| validate_staged_record(&value));
            result.err().map(|errors| (i, errors))
        })
        .collect()
}

/// Validate a records document: either a bare array of records or an
/// import result object with a `records` array.
///
/// Returns the number of records checked.
pub fn validate_document(document: &Value) -> Result<usize, ValidationError> {
    let records = match document {
        Value::Array(items) => items,
        Value::Object(obj) => obj
            .get("records")
            .and_then(Value::as_array)
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "records".to_string(),
                message: "expected an array of records".to_string(),
            })?,
        _ => {
            return Err(ValidationError::InvalidValue {
                field: "records".to_string(),
                message: "expected an array or an object with a records array".to_string(),
            })
        }
    };

    let errors: Vec<String> = records
        .iter()
        .enumerate()
        .filter_map(|(i, record)| validate_staged_record(record).err().map(|errs| (i, errs)))
        .flat_map(|(i, errs)| errs.into_iter().map(move |e| format!("Record {}: {}", i, e)))
        .collect();

    if errors.is_empty() {
        Ok(records.len())
    } else {
        Err(ValidationError::SchemaError { errors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> StagedRecord {
        StagedRecord {
            name: "Leite".into(),
            expiry_date: "2025-12-31".into(),
            category: "Geral".into(),
            quantity: 1,
            location: String::new(),
            barcode: String::new(),
        }
    }

    #[test]
    fn test_valid_record() {
        let value = json!({
            "name": "Leite",
            "expiryDate": "2025-12-31",
            "category": "Geral",
            "quantity": 1,
            "location": "",
            "barcode": "7891000100103"
        });
        assert!(is_valid_staged_record(&value));
    }

    #[test]
    fn test_unchecked_calendar_day_is_valid() {
        let value = json!({
            "name": "Arroz",
            "expiryDate": "2025-02-31",
            "category": "Geral",
            "quantity": 1
        });
        assert!(is_valid_staged_record(&value));
    }

    #[test]
    fn test_invalid_record() {
        let value = json!({
            "name": "",
            "expiryDate": "31/12/2025",
            "category": "Geral",
            "quantity": 0
        });
        let errors = validate_staged_record(&value).unwrap_err();
        assert!(errors.len() >= 3);
    }

    #[test]
    fn test_missing_fields() {
        let value = json!({ "name": "Leite" });
        assert!(!is_valid_staged_record(&value));
    }

    #[test]
    fn test_typed_records_are_valid() {
        let mut bad = record();
        bad.name = "   ".into();

        let errors = validate_records(&[record(), bad, record()]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, 1);
    }

    #[test]
    fn test_validate_document_shapes() {
        let records = json!([{
            "name": "Leite",
            "expiryDate": "2025-12-31",
            "category": "Geral",
            "quantity": 2
        }]);
        assert_eq!(validate_document(&records).unwrap(), 1);

        let wrapped = json!({ "records": records, "diagnostics": {} });
        assert_eq!(validate_document(&wrapped).unwrap(), 1);

        assert!(matches!(
            validate_document(&json!("x")),
            Err(ValidationError::InvalidValue { .. })
        ));
        assert!(matches!(
            validate_document(&json!({ "items": [] })),
            Err(ValidationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_validate_document_reports_index() {
        let doc = json!([
            { "name": "Leite", "expiryDate": "2025-12-31", "category": "Geral", "quantity": 1 },
            { "name": "Pão", "expiryDate": "amanhã", "category": "Geral", "quantity": 1 }
        ]);
        match validate_document(&doc) {
            Err(ValidationError::SchemaError { errors }) => {
                assert!(errors.iter().all(|e| e.starts_with("Record 1:")));
            }
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_generic_validate() {
        let schema = json!({
            "type": "object",
            "required": ["name"],
            "properties": { "name": { "type": "string" } }
        });
        assert!(validate(&schema, &json!({ "name": "x" })).is_ok());
        assert!(!is_valid(&schema, &json!({ "age": 42 })));
    }
}
