//! Closed unit catalog for length, volume and weight.
//!
//! # Invariants
//! - The table is fixed at compile time and mirrors the seeded `Metric` rows.
//! - Lookups are total in both directions; `UnitId::NONE` maps to an empty
//!   symbol.

use crate::model::ids::UnitId;
use serde::Serialize;

/// Physical dimension a unit measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Length,
    Volume,
    Weight,
}

impl Dimension {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Length => "length",
            Self::Volume => "volume",
            Self::Weight => "weight",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitDef {
    pub id: UnitId,
    pub symbol: &'static str,
    pub dimension: Dimension,
}

const fn unit(id: i64, symbol: &'static str, dimension: Dimension) -> UnitDef {
    UnitDef {
        id: UnitId::new(id),
        symbol,
        dimension,
    }
}

pub const UNITS: &[UnitDef] = &[
    unit(1, "mm", Dimension::Length),
    unit(2, "cm", Dimension::Length),
    unit(3, "m", Dimension::Length),
    unit(4, "in", Dimension::Length),
    unit(5, "ft", Dimension::Length),
    unit(10, "ml", Dimension::Volume),
    unit(11, "l", Dimension::Volume),
    unit(12, "m3", Dimension::Volume),
    unit(13, "gal", Dimension::Volume),
    unit(20, "g", Dimension::Weight),
    unit(21, "kg", Dimension::Weight),
    unit(22, "t", Dimension::Weight),
    unit(23, "lb", Dimension::Weight),
    unit(24, "oz", Dimension::Weight),
];

pub fn lookup(id: UnitId) -> Option<&'static UnitDef> {
    UNITS.iter().find(|def| def.id == id)
}

/// Display symbol for `id`; empty for `NONE` and unknown ids.
pub fn symbol(id: UnitId) -> &'static str {
    lookup(id).map_or("", |def| def.symbol)
}

/// Resolves a display symbol to its unit id.
pub fn by_symbol(symbol: &str) -> Option<&'static UnitDef> {
    let symbol = symbol.trim();
    UNITS.iter().find(|def| def.symbol == symbol)
}

impl UnitId {
    /// Resolves this id against the closed catalog.
    pub fn resolve(self) -> Option<&'static UnitDef> {
        lookup(self)
    }
}
