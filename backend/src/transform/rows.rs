//! Per-row extraction and classification.
//!
//! A row is either staged as a record, skipped with a reason the user can act
//! on, or ignored. Only two things are gate-checked: a non-blank name and a
//! structurally valid expiry date. Everything else falls back to a default.

use crate::config::ImportOptions;
use crate::models::{
    CellValue, FieldRole, RawRow, SkippedRow, StagedRecord, DEFAULT_CATEGORY, DEFAULT_QUANTITY,
};
use crate::transform::dates::coerce_date;
use crate::transform::resolver::ColumnMap;

static EMPTY_CELL: CellValue = CellValue::Empty;

/// What happened to a single source row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    /// The row produced a record.
    Accepted(StagedRecord),
    /// The row had a name but its expiry date could not be read.
    Skipped(SkippedRow),
    /// Blank name: treated as spacer/footer noise, not as an error.
    Ignored,
}

/// Classify one row. `row_index` is the 0-based position among data rows.
pub fn process_row(
    row: &RawRow,
    columns: &ColumnMap,
    row_index: usize,
    options: &ImportOptions,
) -> RowOutcome {
    let name = cell(row, columns, FieldRole::Name);
    if name.is_blank() {
        return RowOutcome::Ignored;
    }

    let expiry = cell(row, columns, FieldRole::Expiry);
    let Some(expiry_date) = coerce_date(expiry) else {
        return RowOutcome::Skipped(SkippedRow {
            row_number: row_index + options.header_offset + 1,
            reason: format!(
                "Invalid expiry date {} in column \"{}\"",
                expiry,
                columns.get(FieldRole::Expiry).unwrap_or("?")
            ),
        });
    };

    let category = cell(row, columns, FieldRole::Category).as_text();
    let quantity = parse_quantity(cell(row, columns, FieldRole::Quantity));

    RowOutcome::Accepted(StagedRecord {
        name: name.as_text(),
        expiry_date,
        category: if category.is_empty() {
            DEFAULT_CATEGORY.to_string()
        } else {
            category
        },
        quantity: quantity.unwrap_or(DEFAULT_QUANTITY),
        location: cell(row, columns, FieldRole::Location).as_text(),
        barcode: cell(row, columns, FieldRole::Barcode).as_text(),
    })
}

/// Cell bound to `role`, or an empty cell when the role is unresolved or the
/// row has no value under that header.
fn cell<'a>(row: &'a RawRow, columns: &ColumnMap, role: FieldRole) -> &'a CellValue {
    columns
        .get(role)
        .and_then(|header| row.get(header))
        .unwrap_or(&EMPTY_CELL)
}

/// Positive integer quantity, if the cell holds one.
///
/// Numbers are truncated; text contributes its leading run of digits, so
/// `"12 un"` reads as 12. Zero and negatives are rejected.
pub fn parse_quantity(cell: &CellValue) -> Option<u32> {
    let value = match cell {
        CellValue::Number(n) if n.is_finite() => n.trunc(),
        CellValue::Text(s) => {
            let s = s.trim();
            if s.starts_with('-') {
                return None;
            }
            let digits: String = s
                .trim_start_matches('+')
                .chars()
                .take_while(char::is_ascii_digit)
                .collect();
            digits.parse::<f64>().ok()?
        }
        _ => return None,
    };

    if value < 1.0 {
        return None;
    }
    Some(value.min(u32::MAX as f64) as u32)
}
