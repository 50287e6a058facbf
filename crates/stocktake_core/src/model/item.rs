//! Item entity snapshot.
//!
//! # Responsibility
//! - Hold the in-memory projection of one `Item` row plus joined names.
//! - Emit a `FieldChange` for every genuine field edit.
//!
//! # Invariants
//! - Setters emit only when the in-memory value actually changes, so a
//!   confirmatory write can never feed back into another write.
//! - Joined projections (category/manufacturer names, `DateModified`) are
//!   refreshed by the owning inventory, never emitted.

use crate::model::change::ChangeSink;
use crate::model::coerce::{coerce_saturating, RawValue, Scalar};
use crate::model::columns::item as cols;
use crate::model::ids::{CatId, EntityKind, ItemId, MfrId, ModelId, UnitId};
use crate::model::units::{self, Dimension};
use crate::repo::accessor::{AccessError, AccessResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static CURRENCY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{3}$").expect("valid currency regex"));

/// Lifecycle state persisted in `Item.ItemStatusID`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Active,
    Deleted,
}

impl ItemStatus {
    pub fn to_db(self) -> i64 {
        match self {
            Self::Active => 1,
            Self::Deleted => 2,
        }
    }

    pub fn from_db(value: i64) -> Option<Self> {
        match value {
            1 => Some(Self::Active),
            2 => Some(Self::Deleted),
            _ => None,
        }
    }
}

/// Width/height/depth triple with its length unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
    pub unit: UnitId,
}

impl Dimensions {
    /// `true` when no dimension has been authored.
    pub fn is_unset(&self) -> bool {
        self.width == 0.0 && self.height == 0.0 && self.depth == 0.0
    }

    pub fn unit_symbol(&self) -> &'static str {
        units::symbol(self.unit)
    }
}

/// Live snapshot of one inventory item.
#[derive(Debug, Clone, Serialize)]
pub struct Item {
    #[serde(rename = "ItemID")]
    pub(crate) id: ItemId,
    #[serde(rename = "Name")]
    pub(crate) name: String,
    #[serde(rename = "CatID")]
    pub(crate) cat_id: CatId,
    #[serde(rename = "Category")]
    pub(crate) category: String,
    #[serde(rename = "Price")]
    pub(crate) price: f64,
    #[serde(rename = "Currency")]
    pub(crate) currency: String,
    #[serde(rename = "Unit")]
    pub(crate) unit: String,
    #[serde(rename = "Vat")]
    pub(crate) vat: f64,
    #[serde(rename = "Priority")]
    pub(crate) priority: i64,
    #[serde(rename = "Stock")]
    pub(crate) stock: i64,
    #[serde(rename = "Notes")]
    pub(crate) notes: String,
    #[serde(rename = "MfrID")]
    pub(crate) mfr_id: MfrId,
    #[serde(rename = "Manufacturer")]
    pub(crate) manufacturer: String,
    #[serde(rename = "ModelID")]
    pub(crate) model_id: ModelId,
    #[serde(rename = "ModelName")]
    pub(crate) model_name: String,
    #[serde(rename = "Width")]
    pub(crate) width: f64,
    #[serde(rename = "Height")]
    pub(crate) height: f64,
    #[serde(rename = "Depth")]
    pub(crate) depth: f64,
    #[serde(rename = "Volume")]
    pub(crate) volume: f64,
    #[serde(rename = "Weight")]
    pub(crate) weight: f64,
    #[serde(rename = "LengthUnitID")]
    pub(crate) length_unit: UnitId,
    #[serde(rename = "VolumeUnitID")]
    pub(crate) volume_unit: UnitId,
    #[serde(rename = "WeightUnitID")]
    pub(crate) weight_unit: UnitId,
    #[serde(rename = "ItemStatus")]
    pub(crate) status: ItemStatus,
    #[serde(rename = "DateCreated")]
    pub(crate) date_created: String,
    #[serde(rename = "DateModified")]
    pub(crate) date_modified: String,
    #[serde(skip)]
    pub(crate) sink: Option<ChangeSink>,
}

impl Item {
    /// Creates a detached, empty snapshot for `id`.
    ///
    /// Detached snapshots emit nothing until attached to a change sink.
    pub fn detached(id: ItemId) -> Self {
        Self {
            id,
            name: String::new(),
            cat_id: CatId::NONE,
            category: String::new(),
            price: 0.0,
            currency: String::new(),
            unit: String::new(),
            vat: 0.0,
            priority: 0,
            stock: 0,
            notes: String::new(),
            mfr_id: MfrId::NONE,
            manufacturer: String::new(),
            model_id: ModelId::NONE,
            model_name: String::new(),
            width: 0.0,
            height: 0.0,
            depth: 0.0,
            volume: 0.0,
            weight: 0.0,
            length_unit: UnitId::NONE,
            volume_unit: UnitId::NONE,
            weight_unit: UnitId::NONE,
            status: ItemStatus::Active,
            date_created: String::new(),
            date_modified: String::new(),
            sink: None,
        }
    }

    pub(crate) fn attach(&mut self, sink: ChangeSink) {
        self.sink = Some(sink);
    }

    fn emit(&self, column: &'static str, value: RawValue) {
        if let Some(sink) = &self.sink {
            sink.send(EntityKind::Item, self.id.value(), column, value);
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cat_id(&self) -> CatId {
        self.cat_id
    }

    /// Name of the linked category; empty when unset or unresolved.
    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn vat(&self) -> f64 {
        self.vat
    }

    pub fn priority(&self) -> i64 {
        self.priority
    }

    pub fn stock(&self) -> i64 {
        self.stock
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn mfr_id(&self) -> MfrId {
        self.mfr_id
    }

    pub fn manufacturer(&self) -> &str {
        &self.manufacturer
    }

    pub fn model_id(&self) -> ModelId {
        self.model_id
    }

    /// Free-text model description copied from the linked model.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Stored dimensions only; see `Inventory::item_dimensions` for the
    /// model fallback.
    pub fn stored_dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width,
            height: self.height,
            depth: self.depth,
            unit: self.length_unit,
        }
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn length_unit(&self) -> UnitId {
        self.length_unit
    }

    pub fn volume_unit(&self) -> UnitId {
        self.volume_unit
    }

    pub fn weight_unit(&self) -> UnitId {
        self.weight_unit
    }

    pub fn status(&self) -> ItemStatus {
        self.status
    }

    pub fn date_created(&self) -> &str {
        &self.date_created
    }

    pub fn date_modified(&self) -> &str {
        &self.date_modified
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        if self.name != name {
            self.name = name.clone();
            self.emit(cols::NAME, RawValue::Text(name));
        }
    }

    pub fn set_category(&mut self, cat_id: CatId) {
        if self.cat_id != cat_id {
            self.cat_id = cat_id;
            self.emit(cols::CAT_ID, cat_id.into());
        }
    }

    pub fn set_price(&mut self, price: f64) {
        if self.price != price {
            self.price = price;
            self.emit(cols::PRICE, RawValue::F64(price));
        }
    }

    /// Sets the ISO 4217 currency code; empty clears it.
    ///
    /// # Errors
    /// - `InvalidConfiguration` when the code is not three upper-case letters.
    pub fn set_currency(&mut self, code: &str) -> AccessResult<()> {
        let code = code.trim();
        if !code.is_empty() && !CURRENCY_RE.is_match(code) {
            return Err(AccessError::InvalidConfiguration(format!(
                "currency `{code}` is not an ISO 4217 code"
            )));
        }
        if self.currency != code {
            self.currency = code.to_string();
            self.emit(cols::CURRENCY, RawValue::from(code));
        }
        Ok(())
    }

    pub fn set_unit(&mut self, unit: impl Into<String>) {
        let unit = unit.into();
        if self.unit != unit {
            self.unit = unit.clone();
            self.emit(cols::UNIT, RawValue::Text(unit));
        }
    }

    pub fn set_vat(&mut self, vat: f64) {
        if self.vat != vat {
            self.vat = vat;
            self.emit(cols::VAT, RawValue::F64(vat));
        }
    }

    pub fn set_priority(&mut self, priority: i64) {
        if self.priority != priority {
            self.priority = priority;
            self.emit(cols::PRIORITY, RawValue::I64(priority));
        }
    }

    pub fn set_stock(&mut self, stock: i64) {
        if self.stock != stock {
            self.stock = stock;
            self.emit(cols::STOCK, RawValue::I64(stock));
        }
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        let notes = notes.into();
        if self.notes != notes {
            self.notes = notes.clone();
            self.emit(cols::NOTES, RawValue::Text(notes));
        }
    }

    pub fn set_manufacturer(&mut self, mfr_id: MfrId) {
        if self.mfr_id != mfr_id {
            self.mfr_id = mfr_id;
            self.emit(cols::MFR_ID, mfr_id.into());
        }
    }

    /// Links a model. Persisting a non-zero change triggers the model cascade.
    pub fn set_model(&mut self, model_id: ModelId) {
        if self.model_id != model_id {
            self.model_id = model_id;
            self.emit(cols::MODEL_ID, model_id.into());
        }
    }

    pub fn set_model_name(&mut self, model_name: impl Into<String>) {
        let model_name = model_name.into();
        if self.model_name != model_name {
            self.model_name = model_name.clone();
            self.emit(cols::MODEL_NAME, RawValue::Text(model_name));
        }
    }

    pub fn set_width(&mut self, width: f64) {
        if self.width != width {
            self.width = width;
            self.emit(cols::WIDTH, RawValue::F64(width));
        }
    }

    pub fn set_height(&mut self, height: f64) {
        if self.height != height {
            self.height = height;
            self.emit(cols::HEIGHT, RawValue::F64(height));
        }
    }

    pub fn set_depth(&mut self, depth: f64) {
        if self.depth != depth {
            self.depth = depth;
            self.emit(cols::DEPTH, RawValue::F64(depth));
        }
    }

    pub fn set_volume(&mut self, volume: f64) {
        if self.volume != volume {
            self.volume = volume;
            self.emit(cols::VOLUME, RawValue::F64(volume));
        }
    }

    pub fn set_weight(&mut self, weight: f64) {
        if self.weight != weight {
            self.weight = weight;
            self.emit(cols::WEIGHT, RawValue::F64(weight));
        }
    }

    /// Sets the length unit by display symbol (`mm`, `cm`, ...).
    pub fn set_length_unit(&mut self, symbol: &str) -> AccessResult<()> {
        let unit = unit_for(symbol, Dimension::Length)?;
        if self.length_unit != unit {
            self.length_unit = unit;
            self.emit(cols::LENGTH_UNIT_ID, unit.into());
        }
        Ok(())
    }

    pub fn set_volume_unit(&mut self, symbol: &str) -> AccessResult<()> {
        let unit = unit_for(symbol, Dimension::Volume)?;
        if self.volume_unit != unit {
            self.volume_unit = unit;
            self.emit(cols::VOLUME_UNIT_ID, unit.into());
        }
        Ok(())
    }

    pub fn set_weight_unit(&mut self, symbol: &str) -> AccessResult<()> {
        let unit = unit_for(symbol, Dimension::Weight)?;
        if self.weight_unit != unit {
            self.weight_unit = unit;
            self.emit(cols::WEIGHT_UNIT_ID, unit.into());
        }
        Ok(())
    }

    pub(crate) fn refresh_category_name(&mut self, name: String) {
        self.category = name;
    }

    pub(crate) fn refresh_manufacturer_name(&mut self, name: String) {
        self.manufacturer = name;
    }

    pub(crate) fn refresh_date_modified(&mut self, modified: String) {
        self.date_modified = modified;
    }

    /// Applies an already-persisted value without emitting a change.
    pub(crate) fn absorb(&mut self, column: &'static str, value: &RawValue) -> AccessResult<()> {
        let id = self.id.value();
        match column {
            cols::NAME => self.name = absorbed(id, column, value)?,
            cols::CAT_ID => self.cat_id = CatId::new(absorbed(id, column, value)?),
            cols::PRICE => self.price = absorbed(id, column, value)?,
            cols::CURRENCY => self.currency = absorbed(id, column, value)?,
            cols::UNIT => self.unit = absorbed(id, column, value)?,
            cols::VAT => self.vat = absorbed(id, column, value)?,
            cols::PRIORITY => self.priority = absorbed(id, column, value)?,
            cols::STOCK => self.stock = absorbed(id, column, value)?,
            cols::NOTES => self.notes = absorbed(id, column, value)?,
            cols::MFR_ID => self.mfr_id = MfrId::new(absorbed(id, column, value)?),
            cols::MODEL_ID => self.model_id = ModelId::new(absorbed(id, column, value)?),
            cols::MODEL_NAME => self.model_name = absorbed(id, column, value)?,
            cols::WIDTH => self.width = absorbed(id, column, value)?,
            cols::HEIGHT => self.height = absorbed(id, column, value)?,
            cols::DEPTH => self.depth = absorbed(id, column, value)?,
            cols::VOLUME => self.volume = absorbed(id, column, value)?,
            cols::WEIGHT => self.weight = absorbed(id, column, value)?,
            cols::LENGTH_UNIT_ID => self.length_unit = UnitId::new(absorbed(id, column, value)?),
            cols::VOLUME_UNIT_ID => self.volume_unit = UnitId::new(absorbed(id, column, value)?),
            cols::WEIGHT_UNIT_ID => self.weight_unit = UnitId::new(absorbed(id, column, value)?),
            other => {
                return Err(AccessError::InvalidConfiguration(format!(
                    "column `{other}` cannot be absorbed into an item snapshot"
                )))
            }
        }
        Ok(())
    }
}

pub(crate) fn unit_for(symbol: &str, dimension: Dimension) -> AccessResult<UnitId> {
    if symbol.trim().is_empty() {
        return Ok(UnitId::NONE);
    }
    match units::by_symbol(symbol) {
        Some(def) if def.dimension == dimension => Ok(def.id),
        Some(def) => Err(AccessError::InvalidConfiguration(format!(
            "unit `{}` measures {}, expected {}",
            def.symbol,
            def.dimension.as_str(),
            dimension.as_str()
        ))),
        None => Err(AccessError::InvalidConfiguration(format!(
            "unknown unit symbol `{}`",
            symbol.trim()
        ))),
    }
}

fn absorbed<T: Scalar>(id: i64, column: &str, value: &RawValue) -> AccessResult<T> {
    match coerce_saturating::<T>(value) {
        Ok((coerced, None)) => Ok(coerced.value),
        Ok((_, Some(err))) | Err(err) => Err(AccessError::coercion(EntityKind::Item, id, column, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::{Item, ItemStatus};
    use crate::model::change::change_channel;
    use crate::model::coerce::RawValue;
    use crate::model::columns::item as cols;
    use crate::model::ids::{ItemId, UnitId};
    use crate::repo::accessor::AccessError;

    fn attached(id: i64) -> (Item, std::sync::mpsc::Receiver<crate::model::change::FieldChange>) {
        let (sink, rx) = change_channel();
        let mut item = Item::detached(ItemId::new(id));
        item.attach(sink);
        (item, rx)
    }

    #[test]
    fn setters_emit_only_on_change() {
        let (mut item, rx) = attached(4);
        item.set_name("Desk");
        item.set_name("Desk");
        item.set_price(0.0);

        let change = rx.try_recv().unwrap();
        assert_eq!(change.id, 4);
        assert_eq!(change.column, cols::NAME);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn stock_setter_targets_stock_column() {
        let (mut item, rx) = attached(1);
        item.set_stock(12);
        let change = rx.try_recv().unwrap();
        assert_eq!(change.column, cols::STOCK);
        assert_ne!(change.column, cols::VAT);
        assert_eq!(change.value, RawValue::I64(12));
    }

    #[test]
    fn unit_setters_validate_symbol_and_dimension() {
        let (mut item, rx) = attached(1);
        item.set_length_unit("cm").unwrap();
        assert_eq!(item.length_unit(), UnitId::new(2));
        assert_eq!(rx.try_recv().unwrap().column, cols::LENGTH_UNIT_ID);

        let err = item.set_length_unit("kg").unwrap_err();
        assert!(matches!(err, AccessError::InvalidConfiguration(_)));
        let err = item.set_weight_unit("stone").unwrap_err();
        assert!(matches!(err, AccessError::InvalidConfiguration(_)));
        assert_eq!(item.length_unit(), UnitId::new(2));
    }

    #[test]
    fn currency_must_be_iso_code() {
        let (mut item, _rx) = attached(1);
        item.set_currency("EUR").unwrap();
        assert!(item.set_currency("euro").is_err());
        assert_eq!(item.currency(), "EUR");
        item.set_currency("").unwrap();
        assert_eq!(item.currency(), "");
    }

    #[test]
    fn absorb_updates_without_emitting() {
        let (mut item, rx) = attached(9);
        item.absorb(cols::WIDTH, &RawValue::F64(3.5)).unwrap();
        item.absorb(cols::CAT_ID, &RawValue::I64(7)).unwrap();
        assert_eq!(item.stored_dimensions().width, 3.5);
        assert_eq!(item.cat_id().value(), 7);
        assert!(rx.try_recv().is_err());

        let err = item
            .absorb(cols::NAME, &RawValue::Blob(vec![0]))
            .unwrap_err();
        assert!(matches!(err, AccessError::InvalidType { .. }));
    }

    #[test]
    fn status_roundtrips_through_db_codes() {
        assert_eq!(ItemStatus::from_db(ItemStatus::Deleted.to_db()), Some(ItemStatus::Deleted));
        assert_eq!(ItemStatus::from_db(9), None);
    }
}
