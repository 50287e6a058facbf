//! Typed-identifier entity layer for the stocktake inventory.
//! This crate owns coercion, column access, live snapshots and derivation rules.

pub mod db;
pub mod journal;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;
pub mod settings;

pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use journal::{AuditLevel, AuditSink, LogAuditSink, SqliteJournal};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::catalog::{Category, Manufacturer, Model};
pub use model::change::FieldEvent;
pub use model::coerce::{coerce, CoercionError, RawValue};
pub use model::ids::{CatId, EntityId, EntityKind, ItemId, MfrId, ModelId, UnitId};
pub use model::item::{Dimensions, Item, ItemStatus};
pub use repo::accessor::{AccessError, AccessResult, ColumnAccessor, SetOutcome};
pub use search::query::{
    ItemSearch, MatchMode, SearchConfig, SearchError, SearchKey, SearchOutcome, SearchResult,
    SortOrder,
};
pub use service::entity_cache::EntityHandle;
pub use service::inventory::Inventory;
pub use settings::IdFormat;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
