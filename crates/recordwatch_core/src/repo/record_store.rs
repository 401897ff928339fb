//! Record store trait and SQLite implementation.
//!
//! # Responsibility
//! - Persist whole records as JSON bodies keyed by internal id.
//! - Derive fulfillment records from sales orders.
//!
//! # Invariants
//! - The stored body never carries the id; the row key is the only source.
//! - `transform` returns an unsaved record (`id = None`).

use crate::db::DbError;
use crate::model::record::{Record, RecordId, RecordType, SublistLine};
use crate::model::value::FieldValue;
use log::{debug, warn};
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

/// Sublist carrying item lines on orders and fulfillments.
pub const ITEM_SUBLIST: &str = "item";

/// Line fields carried from a sales order onto its fulfillment.
const FULFILLMENT_LINE_FIELDS: &[&str] = &["item", "item_display", "quantity"];

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("{record_type} record not found: {id}")]
    NotFound {
        record_type: RecordType,
        id: RecordId,
    },
    #[error("invalid persisted record data: {0}")]
    InvalidData(String),
    #[error("cannot transform {from} into {to}")]
    UnsupportedTransform { from: RecordType, to: RecordType },
    #[error("failed to encode record body: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Load/save/transform collaborator over typed records.
pub trait RecordStore {
    /// Loads one record; `Ok(None)` when no record of that type has `id`.
    fn load(&self, record_type: RecordType, id: RecordId) -> RepoResult<Option<Record>>;
    /// Inserts (`id = None`) or updates the record and returns its id.
    fn save(&self, record: &mut Record) -> RepoResult<RecordId>;
    /// Builds an unsaved `to_type` record derived from a stored source.
    fn transform(
        &self,
        from_type: RecordType,
        from_id: RecordId,
        to_type: RecordType,
    ) -> RepoResult<Record>;
    /// Deletes one record.
    fn delete(&self, record_type: RecordType, id: RecordId) -> RepoResult<()>;
}

/// SQLite-backed record store.
pub struct SqliteRecordStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRecordStore<'conn> {
    /// Wraps a migrated connection (see [`crate::db::open_db`]).
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl RecordStore for SqliteRecordStore<'_> {
    fn load(&self, record_type: RecordType, id: RecordId) -> RepoResult<Option<Record>> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM records WHERE internal_id = ?1 AND record_type = ?2;",
                params![id, record_type.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        body.map(|body| decode_body(id, record_type, &body)).transpose()
    }

    fn save(&self, record: &mut Record) -> RepoResult<RecordId> {
        let body = encode_body(record)?;

        let Some(id) = record.id else {
            self.conn.execute(
                "INSERT INTO records (record_type, body) VALUES (?1, ?2);",
                params![record.record_type.as_str(), body],
            )?;
            let id = self.conn.last_insert_rowid();
            record.id = Some(id);
            debug!(
                "event=record_save module=repo status=ok op=insert type={} id={}",
                record.record_type, id
            );
            return Ok(id);
        };

        let changed = self.conn.execute(
            "UPDATE records
             SET
                body = ?1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE internal_id = ?2
               AND record_type = ?3;",
            params![body, id, record.record_type.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                record_type: record.record_type,
                id,
            });
        }

        debug!(
            "event=record_save module=repo status=ok op=update type={} id={}",
            record.record_type, id
        );
        Ok(id)
    }

    fn transform(
        &self,
        from_type: RecordType,
        from_id: RecordId,
        to_type: RecordType,
    ) -> RepoResult<Record> {
        if (from_type, to_type) != (RecordType::SalesOrder, RecordType::ItemFulfillment) {
            warn!(
                "event=record_transform module=repo status=error from={} to={} error_code=unsupported",
                from_type, to_type
            );
            return Err(RepoError::UnsupportedTransform {
                from: from_type,
                to: to_type,
            });
        }

        let source = self
            .load(from_type, from_id)?
            .ok_or(RepoError::NotFound {
                record_type: from_type,
                id: from_id,
            })?;
        Ok(fulfillment_from_order(&source, from_id))
    }

    fn delete(&self, record_type: RecordType, id: RecordId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM records WHERE internal_id = ?1 AND record_type = ?2;",
            params![id, record_type.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound { record_type, id });
        }
        Ok(())
    }
}

/// Copies order item lines onto a new fulfillment.
///
/// `orderline` keeps the 1-based position of the source line.
fn fulfillment_from_order(order: &Record, order_id: RecordId) -> Record {
    let mut fulfillment = Record::new(RecordType::ItemFulfillment);
    fulfillment.set_value("createdfrom", order_id);
    if let Some(entity) = order.get_value("entity") {
        fulfillment.set_value("entity", entity.clone());
    }

    fulfillment.ensure_sublist(ITEM_SUBLIST);
    for (index, source_line) in order.lines(ITEM_SUBLIST).unwrap_or_default().iter().enumerate() {
        let mut line = SublistLine::new().with("orderline", FieldValue::from(index as i64 + 1));
        for field_id in FULFILLMENT_LINE_FIELDS {
            if let Some(value) = source_line.get(field_id) {
                line.set(*field_id, value.clone());
            }
        }
        fulfillment.add_line(ITEM_SUBLIST, line);
    }
    fulfillment
}

fn encode_body(record: &Record) -> RepoResult<String> {
    let mut stored = record.clone();
    stored.id = None;
    Ok(serde_json::to_string(&stored)?)
}

fn decode_body(id: RecordId, record_type: RecordType, body: &str) -> RepoResult<Record> {
    let mut record: Record = serde_json::from_str(body).map_err(|err| {
        RepoError::InvalidData(format!("record {id} has an undecodable body: {err}"))
    })?;
    if record.record_type != record_type {
        return Err(RepoError::InvalidData(format!(
            "record {id} body type `{}` does not match row type `{record_type}`",
            record.record_type
        )));
    }
    record.id = Some(id);
    Ok(record)
}
