//! Sublist change detection between two record snapshots.
//!
//! # Responsibility
//! - Decide whether a named sublist differs between previous and current.
//! - Contain every accessor fault and report it through logging.
//!
//! # Invariants
//! - `has_changed` never panics and never returns an error.
//! - Any accessor fault yields `false` (fail-open).
//! - A line-count mismatch is a change, without positional comparison.
//! - Compared fields are those present on the current line.

use crate::snapshot::{RecordSnapshot, SnapshotResult};
use log::{debug, error};

/// Stateless detector for sublist differences.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeDetector;

impl ChangeDetector {
    pub fn new() -> Self {
        Self
    }

    /// Returns whether `sublist_id` differs between the two snapshots.
    ///
    /// `previous = None` counts as zero lines. Faults are logged and turned
    /// into `false` so a detection error never blocks a record save.
    pub fn has_changed(
        &self,
        previous: Option<&dyn RecordSnapshot>,
        current: &dyn RecordSnapshot,
        sublist_id: &str,
    ) -> bool {
        match compare_sublist(previous, current, sublist_id) {
            Ok(changed) => {
                debug!(
                    "event=change_detect module=service status=ok sublist={} changed={}",
                    sublist_id, changed
                );
                changed
            }
            Err(err) => {
                error!(
                    "event=change_detect module=service status=error sublist={} error={}",
                    sublist_id, err
                );
                false
            }
        }
    }
}

fn compare_sublist(
    previous: Option<&dyn RecordSnapshot>,
    current: &dyn RecordSnapshot,
    sublist_id: &str,
) -> SnapshotResult<bool> {
    let new_count = current.line_count(sublist_id)?;
    let old_count = match previous {
        Some(previous) => previous.line_count(sublist_id)?,
        None => 0,
    };
    if new_count != old_count {
        return Ok(true);
    }
    // Equal counts with no previous snapshot means both sides are empty.
    let Some(previous) = previous else {
        return Ok(false);
    };

    for line in 0..new_count {
        for field_id in current.sublist_fields(sublist_id, line)? {
            let new_value = current.sublist_value(sublist_id, &field_id, line)?;
            let old_value = previous.sublist_value(sublist_id, &field_id, line)?;
            let same = match (&new_value, &old_value) {
                (Some(new_value), Some(old_value)) => new_value.strict_eq(old_value),
                (None, None) => true,
                _ => false,
            };
            if !same {
                return Ok(true);
            }
        }
    }

    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::ChangeDetector;
    use crate::model::record::{Record, RecordType, SublistLine};
    use crate::model::value::FieldValue;
    use crate::snapshot::{RecordSnapshot, SnapshotError, SnapshotResult};

    const ADDRESSBOOK: &str = "addressbook";

    fn customer(lines: Vec<SublistLine>) -> Record {
        let mut record = Record::new(RecordType::Customer);
        record.ensure_sublist(ADDRESSBOOK);
        for line in lines {
            record.add_line(ADDRESSBOOK, line);
        }
        record
    }

    fn address(city: &str) -> SublistLine {
        SublistLine::new()
            .with("addr1", "1 Main St")
            .with("city", city)
            .with("defaultbilling", true)
    }

    struct BrokenFieldList;

    impl RecordSnapshot for BrokenFieldList {
        fn line_count(&self, _sublist_id: &str) -> SnapshotResult<usize> {
            Ok(1)
        }

        fn sublist_fields(&self, _sublist_id: &str, _line: usize) -> SnapshotResult<Vec<String>> {
            Err(SnapshotError::Malformed("field list unavailable".to_string()))
        }

        fn sublist_value(
            &self,
            _sublist_id: &str,
            _field_id: &str,
            _line: usize,
        ) -> SnapshotResult<Option<FieldValue>> {
            Ok(None)
        }
    }

    #[test]
    fn absent_previous_changes_only_when_current_has_lines() {
        let detector = ChangeDetector::new();
        assert!(detector.has_changed(None, &customer(vec![address("Austin")]), ADDRESSBOOK));
        assert!(!detector.has_changed(None, &customer(Vec::new()), ADDRESSBOOK));
    }

    #[test]
    fn identical_snapshots_are_unchanged() {
        let previous = customer(vec![address("Austin"), address("Dallas")]);
        let current = previous.clone();
        assert!(!ChangeDetector::new().has_changed(Some(&previous), &current, ADDRESSBOOK));
    }

    #[test]
    fn added_line_is_a_change() {
        let previous = customer(vec![address("Austin"), address("Dallas")]);
        let current = customer(vec![address("Austin"), address("Dallas"), address("Waco")]);
        assert!(ChangeDetector::new().has_changed(Some(&previous), &current, ADDRESSBOOK));
    }

    #[test]
    fn single_field_edit_is_a_change() {
        let previous = customer(vec![address("Austin")]);
        let current = customer(vec![address("Dallas")]);
        assert!(ChangeDetector::new().has_changed(Some(&previous), &current, ADDRESSBOOK));
    }

    #[test]
    fn text_zero_to_number_zero_is_a_change() {
        let previous = customer(vec![SublistLine::new().with("zip", "0")]);
        let current = customer(vec![SublistLine::new().with("zip", 0_i64)]);
        assert!(ChangeDetector::new().has_changed(Some(&previous), &current, ADDRESSBOOK));
    }

    #[test]
    fn field_missing_on_previous_differs_from_null() {
        let previous = customer(vec![SublistLine::new().with("city", "Austin")]);
        let current = customer(vec![SublistLine::new()
            .with("city", "Austin")
            .with("addr2", FieldValue::Null)]);
        assert!(ChangeDetector::new().has_changed(Some(&previous), &current, ADDRESSBOOK));
    }

    #[test]
    fn fields_only_on_previous_are_not_compared() {
        let previous = customer(vec![address("Austin").with("attention", "Ops")]);
        let current = customer(vec![address("Austin")]);
        assert!(!ChangeDetector::new().has_changed(Some(&previous), &current, ADDRESSBOOK));
    }

    #[test]
    fn malformed_snapshot_fails_open() {
        let previous = customer(vec![address("Austin")]);
        assert!(!ChangeDetector::new().has_changed(
            Some(&previous),
            &BrokenFieldList,
            ADDRESSBOOK
        ));
    }

    #[test]
    fn undefined_sublist_fails_open() {
        let previous = customer(vec![address("Austin")]);
        let current = customer(vec![address("Dallas")]);
        assert!(!ChangeDetector::new().has_changed(Some(&previous), &current, "contactroles"));
    }

    #[test]
    fn first_address_on_unpopulated_book_is_a_change() {
        let previous = Record::new(RecordType::Customer);
        let current = customer(vec![address("Austin")]);
        assert!(ChangeDetector::new().has_changed(Some(&previous), &current, ADDRESSBOOK));
    }
}
