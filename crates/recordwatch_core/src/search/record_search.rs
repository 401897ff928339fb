//! Record search over the SQLite record store.
//!
//! # Responsibility
//! - Evaluate body-field filters against stored records of one type.
//! - Project matching records into rows with named columns.
//!
//! # Invariants
//! - Rows are decoded lazily from the cursor and visited in id order.
//! - Visiting stops as soon as the visitor returns `false`.
//! - Filters compare with strict (non-coercing) equality.

use crate::db::DbError;
use crate::model::record::{Record, RecordId, RecordType};
use crate::model::value::FieldValue;
use log::debug;
use rusqlite::{params, Connection};
use std::collections::BTreeMap;
use thiserror::Error;

/// Virtual column/filter name resolving to the record id.
pub const INTERNAL_ID_COLUMN: &str = "internalid";

pub type SearchResult<T> = Result<T, SearchError>;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid search on {record_type}: {message}")]
    InvalidQuery {
        record_type: RecordType,
        message: String,
    },
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("invalid search row: {0}")]
    InvalidData(String),
}

impl From<rusqlite::Error> for SearchError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// One filter term; all terms of a search must match.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchFilter {
    /// Field equals any of `values`.
    AnyOf {
        field: String,
        values: Vec<FieldValue>,
    },
    /// Field equals `value`.
    Is { field: String, value: FieldValue },
}

impl SearchFilter {
    pub fn any_of(field: impl Into<String>, values: Vec<FieldValue>) -> Self {
        Self::AnyOf {
            field: field.into(),
            values,
        }
    }

    pub fn is(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::Is {
            field: field.into(),
            value: value.into(),
        }
    }

    fn matches(&self, record: &Record) -> bool {
        match self {
            Self::AnyOf { field, values } => column_value(record, field)
                .is_some_and(|actual| values.iter().any(|value| actual.strict_eq(value))),
            Self::Is { field, value } => {
                column_value(record, field).is_some_and(|actual| actual.strict_eq(value))
            }
        }
    }
}

/// Search definition: record type, filters and projected columns.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSearch {
    pub record_type: RecordType,
    pub filters: Vec<SearchFilter>,
    pub columns: Vec<String>,
}

impl RecordSearch {
    pub fn new(record_type: RecordType) -> Self {
        Self {
            record_type,
            filters: Vec::new(),
            columns: Vec::new(),
        }
    }

    pub fn filter(mut self, filter: SearchFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    fn validate(&self) -> SearchResult<()> {
        if self.columns.is_empty() {
            return Err(self.invalid("at least one column is required"));
        }
        for filter in &self.filters {
            if let SearchFilter::AnyOf { field, values } = filter {
                if values.is_empty() {
                    return Err(self.invalid(&format!("`anyof` on `{field}` has no values")));
                }
            }
        }
        Ok(())
    }

    fn invalid(&self, message: &str) -> SearchError {
        SearchError::InvalidQuery {
            record_type: self.record_type,
            message: message.to_string(),
        }
    }
}

/// One projected result row.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRow {
    pub id: RecordId,
    values: BTreeMap<String, FieldValue>,
}

impl SearchRow {
    /// Column value; `Null` columns are reported as `Some(Null)`.
    pub fn get_value(&self, column: &str) -> Option<&FieldValue> {
        self.values.get(column)
    }
}

/// Runs `search` and passes each matching row to `visitor`.
///
/// Returns the number of rows visited.
pub fn run_each<F>(conn: &Connection, search: &RecordSearch, mut visitor: F) -> SearchResult<usize>
where
    F: FnMut(SearchRow) -> bool,
{
    search.validate()?;

    let mut stmt = conn.prepare(
        "SELECT internal_id, body
         FROM records
         WHERE record_type = ?1
         ORDER BY internal_id ASC;",
    )?;
    let mut rows = stmt.query(params![search.record_type.as_str()])?;
    let mut visited = 0;

    while let Some(row) = rows.next()? {
        let id: RecordId = row.get(0)?;
        let body: String = row.get(1)?;
        let mut record: Record = serde_json::from_str(&body).map_err(|err| {
            SearchError::InvalidData(format!("record {id} has an undecodable body: {err}"))
        })?;
        record.id = Some(id);

        if !search.filters.iter().all(|filter| filter.matches(&record)) {
            continue;
        }

        visited += 1;
        if !visitor(project_row(&record, id, &search.columns)) {
            break;
        }
    }

    debug!(
        "event=record_search module=search status=ok type={} visited={}",
        search.record_type, visited
    );
    Ok(visited)
}

/// Search collaborator consumed by endpoint services.
pub trait SearchService {
    /// Visits matching rows until `visitor` returns `false`.
    fn run_each(
        &self,
        search: &RecordSearch,
        visitor: &mut dyn FnMut(SearchRow) -> bool,
    ) -> SearchResult<usize>;
}

/// SQLite-backed search over the `records` table.
pub struct SqliteRecordSearch<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRecordSearch<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl SearchService for SqliteRecordSearch<'_> {
    fn run_each(
        &self,
        search: &RecordSearch,
        visitor: &mut dyn FnMut(SearchRow) -> bool,
    ) -> SearchResult<usize> {
        run_each(self.conn, search, visitor)
    }
}

/// Collects every matching row.
pub fn collect_rows(conn: &Connection, search: &RecordSearch) -> SearchResult<Vec<SearchRow>> {
    let mut rows = Vec::new();
    run_each(conn, search, |row| {
        rows.push(row);
        true
    })?;
    Ok(rows)
}

fn project_row(record: &Record, id: RecordId, columns: &[String]) -> SearchRow {
    let values = columns
        .iter()
        .map(|column| {
            let value = column_value(record, column).unwrap_or(FieldValue::Null);
            (column.clone(), value)
        })
        .collect();
    SearchRow { id, values }
}

fn column_value(record: &Record, column: &str) -> Option<FieldValue> {
    if column == INTERNAL_ID_COLUMN {
        return record.id.map(FieldValue::from);
    }
    record.get_value(column).cloned()
}
