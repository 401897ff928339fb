//! Record domain model shared by handlers, store and detector.
//!
//! # Responsibility
//! - Define the scalar value and record shapes used across core.
//! - Keep sublist lines as ordered `field -> value` maps.
//!
//! # Invariants
//! - Scalar values never coerce between kinds (`0` and `"0"` differ).
//! - A record id is `None` until the record has been saved once.

pub mod record;
pub mod value;
