//! Core domain logic for recordwatch.
//!
//! Sublist change detection plus the record store, search and endpoint
//! handlers built around it.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod restlet;
pub mod search;
pub mod service;
pub mod snapshot;

pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::record::{Record, RecordId, RecordType, SublistLine};
pub use model::value::FieldValue;
pub use repo::record_store::{RecordStore, RepoError, RepoResult, SqliteRecordStore};
pub use restlet::{HttpMethod, RestletRequest, SalesOrderRestlet, NOT_FOUND_SENTINEL};
pub use search::record_search::{
    RecordSearch, SearchError, SearchFilter, SearchRow, SearchService, SqliteRecordSearch,
};
pub use service::address_change::{AddressChangeHandler, UserEventType};
pub use service::change_detector::ChangeDetector;
pub use service::sales_order_service::{
    FetchOutcome, FulfillmentRequest, ItemAdjustment, SalesOrderLine, SalesOrderService,
    SalesOrderSummary, ServiceError,
};
pub use snapshot::{RecordSnapshot, SnapshotError, SnapshotResult};

/// Minimal health-check API for wiring checks.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
