//! Record model: body fields plus named sublists.
//!
//! # Responsibility
//! - Carry one record state (snapshot) for detection, storage and transform.
//! - Provide line lookup/mutation helpers used by endpoint handlers.
//!
//! # Invariants
//! - `id` is `None` until the record store assigns one on first save.
//! - Sublist line indexes are 0-based and dense.

use crate::model::value::FieldValue;
use crate::snapshot::{SnapshotError, SnapshotResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Internal id assigned by the record store.
pub type RecordId = i64;

/// Record types known by this workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    Customer,
    SalesOrder,
    ItemFulfillment,
}

impl RecordType {
    /// Stable storage/wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::SalesOrder => "salesorder",
            Self::ItemFulfillment => "itemfulfillment",
        }
    }

    /// Sublists every record of this type carries, even with zero lines.
    pub fn sublist_ids(self) -> &'static [&'static str] {
        match self {
            Self::Customer => &["addressbook"],
            Self::SalesOrder | Self::ItemFulfillment => &["item"],
        }
    }

    pub fn defines_sublist(self, sublist_id: &str) -> bool {
        self.sublist_ids().contains(&sublist_id)
    }
}

impl Display for RecordType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "customer" => Ok(Self::Customer),
            "salesorder" => Ok(Self::SalesOrder),
            "itemfulfillment" => Ok(Self::ItemFulfillment),
            other => Err(format!("unknown record type `{other}`")),
        }
    }
}

/// One line of a sublist: field id to scalar value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SublistLine {
    fields: BTreeMap<String, FieldValue>,
}

impl SublistLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter used by fixtures and transforms.
    pub fn with(mut self, field_id: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(field_id.into(), value.into());
        self
    }

    pub fn get(&self, field_id: &str) -> Option<&FieldValue> {
        self.fields.get(field_id)
    }

    pub fn set(&mut self, field_id: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(field_id.into(), value.into());
    }

    /// Field ids present on this line, in stable sorted order.
    pub fn field_ids(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

/// Canonical record state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "type")]
    pub record_type: RecordType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
    #[serde(default)]
    pub sublists: BTreeMap<String, Vec<SublistLine>>,
}

impl Record {
    /// Creates an unsaved record with no fields and no sublists.
    pub fn new(record_type: RecordType) -> Self {
        Self {
            record_type,
            id: None,
            fields: BTreeMap::new(),
            sublists: BTreeMap::new(),
        }
    }

    pub fn get_value(&self, field_id: &str) -> Option<&FieldValue> {
        self.fields.get(field_id)
    }

    pub fn set_value(&mut self, field_id: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(field_id.into(), value.into());
    }

    /// Returns the lines of a sublist.
    ///
    /// A sublist defined by the record type but never populated has zero
    /// lines; `None` means the type has no such sublist.
    pub fn lines(&self, sublist_id: &str) -> Option<&[SublistLine]> {
        match self.sublists.get(sublist_id) {
            Some(lines) => Some(lines.as_slice()),
            None => self
                .record_type
                .defines_sublist(sublist_id)
                .then_some(&[] as &[SublistLine]),
        }
    }

    /// Appends a line, creating the sublist on first use.
    pub fn add_line(&mut self, sublist_id: impl Into<String>, line: SublistLine) -> usize {
        let lines = self.sublists.entry(sublist_id.into()).or_default();
        lines.push(line);
        lines.len() - 1
    }

    /// Creates an empty sublist if it does not exist yet.
    pub fn ensure_sublist(&mut self, sublist_id: impl Into<String>) {
        self.sublists.entry(sublist_id.into()).or_default();
    }

    /// Returns the first line whose `field_id` strictly equals `value`.
    pub fn find_sublist_line_with_value(
        &self,
        sublist_id: &str,
        field_id: &str,
        value: &FieldValue,
    ) -> Option<usize> {
        self.lines(sublist_id)?.iter().position(|line| {
            line.get(field_id)
                .is_some_and(|candidate| candidate.strict_eq(value))
        })
    }

    /// Overwrites one sublist field on an existing line.
    ///
    /// # Errors
    /// - `MissingSublist` when the record type has no such sublist.
    /// - `LineOutOfRange` when `line` is past the last line.
    pub fn set_sublist_value(
        &mut self,
        sublist_id: &str,
        line: usize,
        field_id: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> SnapshotResult<()> {
        let record_type = self.record_type;
        let lines = match self.sublists.get_mut(sublist_id) {
            Some(lines) => lines,
            None if record_type.defines_sublist(sublist_id) => {
                return Err(SnapshotError::LineOutOfRange {
                    sublist_id: sublist_id.to_string(),
                    line,
                    count: 0,
                })
            }
            None => return Err(SnapshotError::MissingSublist(sublist_id.to_string())),
        };
        let count = lines.len();
        let entry = lines.get_mut(line).ok_or_else(|| SnapshotError::LineOutOfRange {
            sublist_id: sublist_id.to_string(),
            line,
            count,
        })?;
        entry.set(field_id, value);
        Ok(())
    }
}
