//! Entity services.
//!
//! # Responsibility
//! - Cache live snapshots and persist their edits.
//! - Apply derivation rules between related entities.
//! - Keep presentation callers away from the column accessor.

pub mod cascade;
pub mod entity_cache;
pub mod inventory;
