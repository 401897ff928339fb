//! Read-only accessor contract over one record state.
//!
//! # Responsibility
//! - Expose sublist line counts, field lists and values to the detector.
//! - Let hosts plug in their own record representation.
//!
//! # Invariants
//! - Accessors return typed errors instead of panicking on bad input.
//! - `sublist_fields` lists the fields of that exact line, not a schema.

use crate::model::record::{Record, SublistLine};
use crate::model::value::FieldValue;
use thiserror::Error;

pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Fault raised by a snapshot accessor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("sublist `{0}` is not present on record")]
    MissingSublist(String),
    #[error("line {line} is out of range for sublist `{sublist_id}` ({count} lines)")]
    LineOutOfRange {
        sublist_id: String,
        line: usize,
        count: usize,
    },
    #[error("malformed snapshot: {0}")]
    Malformed(String),
}

/// Accessor surface of a record snapshot.
pub trait RecordSnapshot {
    /// Number of lines in `sublist_id`.
    fn line_count(&self, sublist_id: &str) -> SnapshotResult<usize>;

    /// Field ids present on one line.
    fn sublist_fields(&self, sublist_id: &str, line: usize) -> SnapshotResult<Vec<String>>;

    /// Value of one sublist field; `Ok(None)` when the field is absent.
    fn sublist_value(
        &self,
        sublist_id: &str,
        field_id: &str,
        line: usize,
    ) -> SnapshotResult<Option<FieldValue>>;

    /// Display text of one sublist field.
    ///
    /// Prefers the `<field>_display` companion field and falls back to the
    /// raw value rendered as text.
    fn sublist_text(
        &self,
        sublist_id: &str,
        field_id: &str,
        line: usize,
    ) -> SnapshotResult<Option<String>> {
        let display_field = format!("{field_id}_display");
        if let Some(FieldValue::Text(text)) = self.sublist_value(sublist_id, &display_field, line)? {
            return Ok(Some(text));
        }
        Ok(self
            .sublist_value(sublist_id, field_id, line)?
            .map(|value| value.to_string()))
    }
}

fn line_at<'a>(record: &'a Record, sublist_id: &str, line: usize) -> SnapshotResult<&'a SublistLine> {
    let lines = record
        .lines(sublist_id)
        .ok_or_else(|| SnapshotError::MissingSublist(sublist_id.to_string()))?;
    lines.get(line).ok_or_else(|| SnapshotError::LineOutOfRange {
        sublist_id: sublist_id.to_string(),
        line,
        count: lines.len(),
    })
}

impl RecordSnapshot for Record {
    fn line_count(&self, sublist_id: &str) -> SnapshotResult<usize> {
        self.lines(sublist_id)
            .map(<[_]>::len)
            .ok_or_else(|| SnapshotError::MissingSublist(sublist_id.to_string()))
    }

    fn sublist_fields(&self, sublist_id: &str, line: usize) -> SnapshotResult<Vec<String>> {
        Ok(line_at(self, sublist_id, line)?
            .field_ids()
            .map(str::to_string)
            .collect())
    }

    fn sublist_value(
        &self,
        sublist_id: &str,
        field_id: &str,
        line: usize,
    ) -> SnapshotResult<Option<FieldValue>> {
        Ok(line_at(self, sublist_id, line)?.get(field_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::{RecordSnapshot, SnapshotError};
    use crate::model::record::{Record, RecordType, SublistLine};

    #[test]
    fn undefined_sublist_is_a_fault_not_zero() {
        let customer = Record::new(RecordType::Customer);
        assert_eq!(
            customer.line_count("contactroles"),
            Err(SnapshotError::MissingSublist("contactroles".to_string()))
        );
    }

    #[test]
    fn unpopulated_intrinsic_sublist_has_zero_lines() {
        let customer = Record::new(RecordType::Customer);
        assert_eq!(customer.line_count("addressbook"), Ok(0));
        assert!(matches!(
            customer.sublist_fields("addressbook", 0),
            Err(SnapshotError::LineOutOfRange { count: 0, .. })
        ));
    }

    #[test]
    fn sublist_text_prefers_display_companion() {
        let mut order = Record::new(RecordType::SalesOrder);
        order.add_line(
            "item",
            SublistLine::new()
                .with("item", "101")
                .with("item_display", "Widget")
                .with("quantity", 3_i64),
        );

        assert_eq!(
            order.sublist_text("item", "item", 0).unwrap().as_deref(),
            Some("Widget")
        );
        assert_eq!(
            order.sublist_text("item", "quantity", 0).unwrap().as_deref(),
            Some("3")
        );
        assert_eq!(order.sublist_text("item", "rate", 0).unwrap(), None);
    }
}
