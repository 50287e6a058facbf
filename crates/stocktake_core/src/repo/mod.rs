//! Persistence layer of the entity cache.
//!
//! # Responsibility
//! - Generic single-column reads/writes keyed by typed identifiers.
//! - Full-row loads and structural inserts/deletes.
//!
//! # Invariants
//! - SQL identifiers come only from per-kind descriptors.
//! - Errors carry the kind and id they concern.

pub mod accessor;
pub mod entity_repo;
