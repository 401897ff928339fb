//! Record store contracts and persistence implementation.
//!
//! # Responsibility
//! - Define the load/save/transform collaborator used by handlers.
//! - Keep SQLite and JSON encoding details out of service code.
//!
//! # Invariants
//! - Lookups by an unknown id are `Ok(None)`, not errors.
//! - Writes to a vanished row report `NotFound`.

pub mod record_store;
