//! Shared display settings for the entity layer.
//!
//! # Responsibility
//! - Hold the Item identifier display width as one explicit settings object.
//!
//! # Invariants
//! - Clones share the same width; a change is visible to every holder on the
//!   next `display()` call without re-creating identifiers.
//! - Width always stays within `MIN_ITEM_ID_WIDTH..=MAX_ITEM_ID_WIDTH`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const DEFAULT_ITEM_ID_WIDTH: usize = 6;
pub const MIN_ITEM_ID_WIDTH: usize = 1;
pub const MAX_ITEM_ID_WIDTH: usize = 18;

/// Identifier display configuration shared between the cache, the search
/// composer and presentation callers.
#[derive(Debug, Clone)]
pub struct IdFormat {
    item_width: Arc<AtomicUsize>,
}

impl IdFormat {
    pub fn new(item_width: usize) -> Self {
        Self {
            item_width: Arc::new(AtomicUsize::new(clamp_width(item_width))),
        }
    }

    pub fn item_width(&self) -> usize {
        self.item_width.load(Ordering::Relaxed)
    }

    /// Changes the padding width for every holder of this settings object.
    ///
    /// Returns the width actually applied after clamping.
    pub fn set_item_width(&self, width: usize) -> usize {
        let applied = clamp_width(width);
        self.item_width.store(applied, Ordering::Relaxed);
        applied
    }

    /// Zero-pads `value` to the current item width.
    pub fn pad(&self, value: i64) -> String {
        format!("{:0width$}", value, width = self.item_width())
    }
}

impl Default for IdFormat {
    fn default() -> Self {
        Self::new(DEFAULT_ITEM_ID_WIDTH)
    }
}

fn clamp_width(width: usize) -> usize {
    width.clamp(MIN_ITEM_ID_WIDTH, MAX_ITEM_ID_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::{IdFormat, DEFAULT_ITEM_ID_WIDTH, MAX_ITEM_ID_WIDTH};

    #[test]
    fn default_width_pads_to_six() {
        let format = IdFormat::default();
        assert_eq!(format.item_width(), DEFAULT_ITEM_ID_WIDTH);
        assert_eq!(format.pad(17), "000017");
    }

    #[test]
    fn width_change_is_shared_between_clones() {
        let format = IdFormat::new(4);
        let shared = format.clone();
        shared.set_item_width(8);
        assert_eq!(format.pad(3), "00000003");
    }

    #[test]
    fn width_is_clamped() {
        let format = IdFormat::new(0);
        assert_eq!(format.item_width(), 1);
        assert_eq!(format.set_item_width(99), MAX_ITEM_ID_WIDTH);
    }

    #[test]
    fn values_longer_than_width_are_not_truncated() {
        let format = IdFormat::new(2);
        assert_eq!(format.pad(12345), "12345");
    }
}
