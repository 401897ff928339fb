//! Filtered record search.
//!
//! # Responsibility
//! - Run typed filters over stored records of one type.
//! - Hand result rows to the caller one at a time.

pub mod record_search;
