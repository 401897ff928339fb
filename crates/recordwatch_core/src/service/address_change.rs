//! Address-change user event handler.
//!
//! # Responsibility
//! - Flag customer records whose address book changed on edit.
//!
//! # Invariants
//! - Only `Edit` events are handled; all other events leave the record as is.
//! - On edit the marker field is always written, `true` or `false`.

use crate::config::CoreConfig;
use crate::model::record::Record;
use crate::service::change_detector::ChangeDetector;
use crate::snapshot::RecordSnapshot;
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Trigger type of a record user event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserEventType {
    Create,
    Edit,
    Delete,
    View,
    Copy,
    XEdit,
}

/// Before-submit hook writing the address-changed marker.
#[derive(Debug, Clone)]
pub struct AddressChangeHandler {
    detector: ChangeDetector,
    sublist_id: String,
    marker_field: String,
}

impl AddressChangeHandler {
    pub fn new(sublist_id: impl Into<String>, marker_field: impl Into<String>) -> Self {
        Self {
            detector: ChangeDetector::new(),
            sublist_id: sublist_id.into(),
            marker_field: marker_field.into(),
        }
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        Self::new(
            config.address_sublist.as_str(),
            config.address_marker_field.as_str(),
        )
    }

    pub fn marker_field(&self) -> &str {
        &self.marker_field
    }

    /// Runs detection on edit and writes the marker onto `new_record`.
    ///
    /// Returns the written marker value, or `None` when the event was skipped.
    pub fn before_submit(
        &self,
        event: UserEventType,
        new_record: &mut Record,
        old_record: Option<&Record>,
    ) -> Option<bool> {
        if event != UserEventType::Edit {
            debug!(
                "event=address_change module=service status=skipped trigger={:?}",
                event
            );
            return None;
        }

        let changed = self.detector.has_changed(
            old_record.map(|record| record as &dyn RecordSnapshot),
            &*new_record,
            &self.sublist_id,
        );
        new_record.set_value(self.marker_field.as_str(), changed);

        info!(
            "event=address_change module=service status=ok record_id={} changed={}",
            new_record.id.map_or_else(|| "new".to_string(), |id| id.to_string()),
            changed
        );
        Some(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::{AddressChangeHandler, UserEventType};
    use crate::config::CoreConfig;
    use crate::model::record::{Record, RecordType, SublistLine};
    use crate::model::value::FieldValue;

    fn customer(city: &str) -> Record {
        let mut record = Record::new(RecordType::Customer);
        record.id = Some(7);
        record.add_line("addressbook", SublistLine::new().with("city", city));
        record
    }

    #[test]
    fn edit_with_changed_address_sets_marker_true() {
        let handler = AddressChangeHandler::from_config(&CoreConfig::default());
        let old_record = customer("Austin");
        let mut new_record = customer("Dallas");

        let written = handler.before_submit(UserEventType::Edit, &mut new_record, Some(&old_record));

        assert_eq!(written, Some(true));
        assert_eq!(
            new_record.get_value(handler.marker_field()),
            Some(&FieldValue::Bool(true))
        );
    }

    #[test]
    fn edit_without_change_clears_marker() {
        let handler = AddressChangeHandler::new("addressbook", "custentity_flag");
        let old_record = customer("Austin");
        let mut new_record = customer("Austin");
        new_record.set_value("custentity_flag", true);

        let written = handler.before_submit(UserEventType::Edit, &mut new_record, Some(&old_record));

        assert_eq!(written, Some(false));
        assert_eq!(
            new_record.get_value("custentity_flag"),
            Some(&FieldValue::Bool(false))
        );
    }

    #[test]
    fn non_edit_events_leave_record_untouched() {
        let handler = AddressChangeHandler::new("addressbook", "custentity_flag");
        for event in [UserEventType::Create, UserEventType::Delete, UserEventType::XEdit] {
            let mut new_record = customer("Austin");
            assert_eq!(handler.before_submit(event, &mut new_record, None), None);
            assert_eq!(new_record.get_value("custentity_flag"), None);
        }
    }
}
