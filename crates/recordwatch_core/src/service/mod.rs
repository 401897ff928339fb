//! Core use-case services.
//!
//! # Responsibility
//! - Host the change detector and the handlers built on top of it.
//! - Orchestrate record store and search calls into endpoint use-cases.

pub mod address_change;
pub mod change_detector;
pub mod sales_order_service;
