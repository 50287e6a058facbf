//! Default-inheritance rules between items and their linked models.
//!
//! # Responsibility
//! - Plan the writes a model link implies for one item.
//! - Compute read-time dimension fallback for items without own dimensions.
//!
//! # Invariants
//! - Category and description are always taken from the model.
//! - The width/height/depth trio is inherited only as a whole, and only when
//!   all three item values are zero.
//! - Volume and weight are inherited independently, each only when zero.
//! - Planning is pure; applying the plan is the inventory's job.

use crate::model::catalog::Model;
use crate::model::coerce::RawValue;
use crate::model::columns::item as cols;
use crate::model::item::{Dimensions, Item};

/// One column write planned by a cascade.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldWrite {
    pub column: &'static str,
    pub value: RawValue,
}

impl FieldWrite {
    fn new(column: &'static str, value: impl Into<RawValue>) -> Self {
        Self {
            column,
            value: value.into(),
        }
    }
}

/// Plans the writes implied by linking `item` to `model`.
pub fn model_link_writes(item: &Item, model: &Model) -> Vec<FieldWrite> {
    let mut writes = vec![
        FieldWrite::new(cols::CAT_ID, model.cat_id()),
        FieldWrite::new(cols::MODEL_NAME, model.desc()),
    ];

    if item.mfr_id().is_none() && !model.mfr_id().is_none() {
        writes.push(FieldWrite::new(cols::MFR_ID, model.mfr_id()));
    }

    if item.stored_dimensions().is_unset() {
        let inherited = model.dimensions();
        writes.push(FieldWrite::new(cols::WIDTH, inherited.width));
        writes.push(FieldWrite::new(cols::HEIGHT, inherited.height));
        writes.push(FieldWrite::new(cols::DEPTH, inherited.depth));
        if item.length_unit() != model.length_unit() {
            writes.push(FieldWrite::new(cols::LENGTH_UNIT_ID, model.length_unit()));
        }
    }

    if item.volume() == 0.0 {
        writes.push(FieldWrite::new(cols::VOLUME, model.volume()));
        if item.volume_unit() != model.volume_unit() {
            writes.push(FieldWrite::new(cols::VOLUME_UNIT_ID, model.volume_unit()));
        }
    }

    if item.weight() == 0.0 {
        writes.push(FieldWrite::new(cols::WEIGHT, model.weight()));
        if item.weight_unit() != model.weight_unit() {
            writes.push(FieldWrite::new(cols::WEIGHT_UNIT_ID, model.weight_unit()));
        }
    }

    writes
}

/// Dimensions to display for `item`.
///
/// Falls back to the linked model when the item has no own dimensions. The
/// substitution is never persisted.
pub fn effective_dimensions(item: &Item, model: Option<&Model>) -> Dimensions {
    let stored = item.stored_dimensions();
    match model {
        Some(model) if stored.is_unset() && model.id() == item.model_id() => model.dimensions(),
        _ => stored,
    }
}
