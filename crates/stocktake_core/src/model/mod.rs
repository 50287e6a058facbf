//! Domain model of the inventory entity layer.
//!
//! # Responsibility
//! - Typed identifiers and per-kind table metadata.
//! - The coercion kernel shared by every read path.
//! - Entity snapshots and the change messages they emit.
//!
//! # Invariants
//! - Identifier zero means "none" for every kind.
//! - Snapshots never perform store I/O themselves.

pub mod catalog;
pub mod change;
pub mod coerce;
pub mod columns;
pub mod ids;
pub mod item;
pub mod units;
