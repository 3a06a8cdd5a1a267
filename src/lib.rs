//! Delivery slot scheduling and reservation engine.
//!
//! Materializes bookable time windows per delivery method and date, and
//! guarantees that a contested slot transitions to reserved exactly once
//! under concurrent requests. Transport (HTTP routing, marshaling,
//! request-field presence checks) lives with the embedding service.

pub mod clock;
pub mod config;
pub mod engine;
pub mod model;
pub mod observability;
pub mod wal;
