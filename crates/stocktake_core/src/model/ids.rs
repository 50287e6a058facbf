//! Typed surrogate identifiers and per-kind table metadata.
//!
//! # Responsibility
//! - Give every entity kind its own integer newtype key.
//! - Describe, per kind, the table/key/column metadata used by the generic
//!   column accessor.
//!
//! # Invariants
//! - Identifier value `0` is reserved and means "none"; it never names a row.
//! - Identifiers carry no state besides the integer; copying is free.
//! - Column names accepted by the accessor come only from `KindDescriptor`.

use crate::model::coerce::RawValue;
use crate::model::columns;
use crate::settings::IdFormat;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::hash::Hash;

/// Entity kinds managed by the layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Item,
    Category,
    Manufacturer,
    Model,
    Unit,
}

/// Static table metadata for one entity kind.
#[derive(Debug)]
pub struct KindDescriptor {
    pub kind: EntityKind,
    pub table: &'static str,
    pub key_column: &'static str,
    /// Whitelist of columns reachable through the generic accessor.
    pub columns: &'static [&'static str],
    /// Columns that may be read but never written through `set`.
    pub protected: &'static [&'static str],
    /// Whether writes refresh a `DateModified` column.
    pub tracks_modified: bool,
    /// Whether identifiers are rendered zero-padded.
    pub padded_display: bool,
    /// Closed catalogs reject every write.
    pub read_only: bool,
}

impl KindDescriptor {
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains(&column)
    }

    pub fn is_writable(&self, column: &str) -> bool {
        !self.read_only && self.has_column(column) && !self.protected.contains(&column)
    }
}

static ITEM: KindDescriptor = KindDescriptor {
    kind: EntityKind::Item,
    table: "Item",
    key_column: columns::item::ITEM_ID,
    columns: columns::item::ALL,
    protected: columns::item::PROTECTED,
    tracks_modified: true,
    padded_display: true,
    read_only: false,
};

static CATEGORY: KindDescriptor = KindDescriptor {
    kind: EntityKind::Category,
    table: "Category",
    key_column: columns::category::CAT_ID,
    columns: columns::category::ALL,
    protected: columns::category::PROTECTED,
    tracks_modified: false,
    padded_display: false,
    read_only: false,
};

static MANUFACTURER: KindDescriptor = KindDescriptor {
    kind: EntityKind::Manufacturer,
    table: "Manufacturer",
    key_column: columns::manufacturer::MFR_ID,
    columns: columns::manufacturer::ALL,
    protected: columns::manufacturer::PROTECTED,
    tracks_modified: false,
    padded_display: false,
    read_only: false,
};

static MODEL: KindDescriptor = KindDescriptor {
    kind: EntityKind::Model,
    table: "Model",
    key_column: columns::model::MODEL_ID,
    columns: columns::model::ALL,
    protected: columns::model::PROTECTED,
    tracks_modified: false,
    padded_display: false,
    read_only: false,
};

static UNIT: KindDescriptor = KindDescriptor {
    kind: EntityKind::Unit,
    table: "Metric",
    key_column: columns::unit::UNIT_ID,
    columns: columns::unit::ALL,
    protected: columns::unit::PROTECTED,
    tracks_modified: false,
    padded_display: false,
    read_only: true,
};

impl EntityKind {
    pub fn descriptor(self) -> &'static KindDescriptor {
        match self {
            Self::Item => &ITEM,
            Self::Category => &CATEGORY,
            Self::Manufacturer => &MANUFACTURER,
            Self::Model => &MODEL,
            Self::Unit => &UNIT,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Item => "item",
            Self::Category => "category",
            Self::Manufacturer => "manufacturer",
            Self::Model => "model",
            Self::Unit => "unit",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Behaviour shared by every typed identifier.
pub trait EntityId: Copy + Eq + Ord + Hash + fmt::Debug + Display {
    const KIND: EntityKind;

    fn from_raw(value: i64) -> Self;

    fn raw(self) -> i64;

    fn is_unset(self) -> bool {
        self.raw() == 0
    }

    /// Renders the identifier for display.
    ///
    /// Item identifiers are zero-padded to the width currently held by
    /// `format`; every other kind renders plain decimal.
    fn display(self, format: &IdFormat) -> String {
        if Self::KIND.descriptor().padded_display {
            format.pad(self.raw())
        } else {
            self.raw().to_string()
        }
    }
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident => $kind:expr) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub const NONE: Self = Self(0);

            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn value(self) -> i64 {
                self.0
            }

            pub const fn is_none(self) -> bool {
                self.0 == 0
            }
        }

        impl EntityId for $name {
            const KIND: EntityKind = $kind;

            fn from_raw(value: i64) -> Self {
                Self(value)
            }

            fn raw(self) -> i64 {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$name> for RawValue {
            fn from(value: $name) -> Self {
                RawValue::I64(value.0)
            }
        }
    };
}

entity_id!(
    /// Inventory item key (`Item.ItemID`).
    ItemId => EntityKind::Item
);
entity_id!(
    /// Category key (`Category.CatID`).
    CatId => EntityKind::Category
);
entity_id!(
    /// Manufacturer key (`Manufacturer.MfrID`).
    MfrId => EntityKind::Manufacturer
);
entity_id!(
    /// Model key (`Model.ModelID`).
    ModelId => EntityKind::Model
);
entity_id!(
    /// Unit catalog key (`Metric.UnitID`).
    UnitId => EntityKind::Unit
);
