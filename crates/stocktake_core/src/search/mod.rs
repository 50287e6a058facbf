//! Item search entry points.
//!
//! # Responsibility
//! - Compose filter + order queries over items from enumerated settings.
//! - Keep completion shaping inside core.

pub mod query;
