//! Category, manufacturer and model snapshots.
//!
//! Same contract as `Item`: setters emit only on an in-memory change and
//! joined names are refreshed by the owning inventory.

use crate::model::change::ChangeSink;
use crate::model::coerce::RawValue;
use crate::model::columns;
use crate::model::ids::{CatId, EntityKind, MfrId, ModelId, UnitId};
use crate::model::item::{unit_for, Dimensions};
use crate::model::units::Dimension;
use crate::repo::accessor::AccessResult;
use serde::Serialize;

/// Live snapshot of one category.
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    #[serde(rename = "CatID")]
    pub(crate) id: CatId,
    #[serde(rename = "ParentID")]
    pub(crate) parent_id: CatId,
    #[serde(rename = "Name")]
    pub(crate) name: String,
    #[serde(skip)]
    pub(crate) sink: Option<ChangeSink>,
}

impl Category {
    pub(crate) fn attach(&mut self, sink: ChangeSink) {
        self.sink = Some(sink);
    }

    pub fn id(&self) -> CatId {
        self.id
    }

    /// Parent category; `CatId::NONE` for roots.
    pub fn parent_id(&self) -> CatId {
        self.parent_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        if self.name != name {
            self.name = name.clone();
            if let Some(sink) = &self.sink {
                sink.send(
                    EntityKind::Category,
                    self.id.value(),
                    columns::category::NAME,
                    RawValue::Text(name),
                );
            }
        }
    }

    pub fn set_parent(&mut self, parent_id: CatId) {
        if self.parent_id != parent_id {
            self.parent_id = parent_id;
            if let Some(sink) = &self.sink {
                sink.send(
                    EntityKind::Category,
                    self.id.value(),
                    columns::category::PARENT_ID,
                    parent_id.into(),
                );
            }
        }
    }
}

/// Live snapshot of one manufacturer.
#[derive(Debug, Clone, Serialize)]
pub struct Manufacturer {
    #[serde(rename = "MfrID")]
    pub(crate) id: MfrId,
    #[serde(rename = "Name")]
    pub(crate) name: String,
    #[serde(skip)]
    pub(crate) sink: Option<ChangeSink>,
}

impl Manufacturer {
    pub(crate) fn attach(&mut self, sink: ChangeSink) {
        self.sink = Some(sink);
    }

    pub fn id(&self) -> MfrId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        if self.name != name {
            self.name = name.clone();
            if let Some(sink) = &self.sink {
                sink.send(
                    EntityKind::Manufacturer,
                    self.id.value(),
                    columns::manufacturer::NAME,
                    RawValue::Text(name),
                );
            }
        }
    }
}

/// Live snapshot of one product model.
///
/// Models are the source of inherited defaults for linked items.
#[derive(Debug, Clone, Serialize)]
pub struct Model {
    #[serde(rename = "ModelID")]
    pub(crate) id: ModelId,
    #[serde(rename = "Name")]
    pub(crate) name: String,
    #[serde(rename = "MfrID")]
    pub(crate) mfr_id: MfrId,
    #[serde(rename = "Manufacturer")]
    pub(crate) manufacturer: String,
    #[serde(rename = "CatID")]
    pub(crate) cat_id: CatId,
    #[serde(rename = "Category")]
    pub(crate) category: String,
    #[serde(rename = "Desc")]
    pub(crate) desc: String,
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
    #[serde(skip)]
    pub(crate) sink: Option<ChangeSink>,
}

impl Model {
    /// Creates a detached, empty model snapshot.
    pub fn detached(id: ModelId) -> Self {
        Self {
            id,
            name: String::new(),
            mfr_id: MfrId::NONE,
            manufacturer: String::new(),
            cat_id: CatId::NONE,
            category: String::new(),
            desc: String::new(),
            width: 0.0,
            height: 0.0,
            depth: 0.0,
            volume: 0.0,
            weight: 0.0,
            length_unit: UnitId::NONE,
            volume_unit: UnitId::NONE,
            weight_unit: UnitId::NONE,
            sink: None,
        }
    }

    pub(crate) fn attach(&mut self, sink: ChangeSink) {
        self.sink = Some(sink);
    }

    fn emit(&self, column: &'static str, value: RawValue) {
        if let Some(sink) = &self.sink {
            sink.send(EntityKind::Model, self.id.value(), column, value);
        }
    }

    pub fn id(&self) -> ModelId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mfr_id(&self) -> MfrId {
        self.mfr_id
    }

    pub fn manufacturer(&self) -> &str {
        &self.manufacturer
    }

    pub fn cat_id(&self) -> CatId {
        self.cat_id
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn desc(&self) -> &str {
        &self.desc
    }

    pub fn dimensions(&self) -> Dimensions {
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

    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        if self.name != name {
            self.name = name.clone();
            self.emit(columns::model::NAME, RawValue::Text(name));
        }
    }

    pub fn set_manufacturer(&mut self, mfr_id: MfrId) {
        if self.mfr_id != mfr_id {
            self.mfr_id = mfr_id;
            self.emit(columns::model::MFR_ID, mfr_id.into());
        }
    }

    pub fn set_category(&mut self, cat_id: CatId) {
        if self.cat_id != cat_id {
            self.cat_id = cat_id;
            self.emit(columns::model::CAT_ID, cat_id.into());
        }
    }

    pub fn set_desc(&mut self, desc: impl Into<String>) {
        let desc = desc.into();
        if self.desc != desc {
            self.desc = desc.clone();
            self.emit(columns::model::DESC, RawValue::Text(desc));
        }
    }

    pub fn set_dimensions(&mut self, width: f64, height: f64, depth: f64) {
        if self.width != width {
            self.width = width;
            self.emit(columns::model::WIDTH, RawValue::F64(width));
        }
        if self.height != height {
            self.height = height;
            self.emit(columns::model::HEIGHT, RawValue::F64(height));
        }
        if self.depth != depth {
            self.depth = depth;
            self.emit(columns::model::DEPTH, RawValue::F64(depth));
        }
    }

    pub fn set_volume(&mut self, volume: f64) {
        if self.volume != volume {
            self.volume = volume;
            self.emit(columns::model::VOLUME, RawValue::F64(volume));
        }
    }

    pub fn set_weight(&mut self, weight: f64) {
        if self.weight != weight {
            self.weight = weight;
            self.emit(columns::model::WEIGHT, RawValue::F64(weight));
        }
    }

    pub fn set_length_unit(&mut self, symbol: &str) -> AccessResult<()> {
        let unit = unit_for(symbol, Dimension::Length)?;
        if self.length_unit != unit {
            self.length_unit = unit;
            self.emit(columns::model::LENGTH_UNIT_ID, unit.into());
        }
        Ok(())
    }

    pub fn set_volume_unit(&mut self, symbol: &str) -> AccessResult<()> {
        let unit = unit_for(symbol, Dimension::Volume)?;
        if self.volume_unit != unit {
            self.volume_unit = unit;
            self.emit(columns::model::VOLUME_UNIT_ID, unit.into());
        }
        Ok(())
    }

    pub fn set_weight_unit(&mut self, symbol: &str) -> AccessResult<()> {
        let unit = unit_for(symbol, Dimension::Weight)?;
        if self.weight_unit != unit {
            self.weight_unit = unit;
            self.emit(columns::model::WEIGHT_UNIT_ID, unit.into());
        }
        Ok(())
    }

    pub(crate) fn refresh_category_name(&mut self, name: String) {
        self.category = name;
    }

    pub(crate) fn refresh_manufacturer_name(&mut self, name: String) {
        self.manufacturer = name;
    }
}
