//! Persisted column names, kept compatible with the existing database layout.

pub mod item {
    pub const ITEM_ID: &str = "ItemID";
    pub const NAME: &str = "Name";
    pub const CAT_ID: &str = "CatID";
    pub const PRICE: &str = "Price";
    pub const CURRENCY: &str = "Currency";
    pub const UNIT: &str = "Unit";
    pub const VAT: &str = "Vat";
    pub const PRIORITY: &str = "Priority";
    pub const STOCK: &str = "Stock";
    pub const NOTES: &str = "Notes";
    pub const MFR_ID: &str = "MfrID";
    pub const MODEL_ID: &str = "ModelID";
    pub const MODEL_NAME: &str = "ModelName";
    pub const WIDTH: &str = "Width";
    pub const HEIGHT: &str = "Height";
    pub const DEPTH: &str = "Depth";
    pub const VOLUME: &str = "Volume";
    pub const WEIGHT: &str = "Weight";
    pub const LENGTH_UNIT_ID: &str = "LengthUnitID";
    pub const VOLUME_UNIT_ID: &str = "VolumeUnitID";
    pub const WEIGHT_UNIT_ID: &str = "WeightUnitID";
    pub const ITEM_STATUS_ID: &str = "ItemStatusID";
    pub const DATE_CREATED: &str = "DateCreated";
    pub const DATE_MODIFIED: &str = "DateModified";

    pub const ALL: &[&str] = &[
        ITEM_ID,
        NAME,
        CAT_ID,
        PRICE,
        CURRENCY,
        UNIT,
        VAT,
        PRIORITY,
        STOCK,
        NOTES,
        MFR_ID,
        MODEL_ID,
        MODEL_NAME,
        WIDTH,
        HEIGHT,
        DEPTH,
        VOLUME,
        WEIGHT,
        LENGTH_UNIT_ID,
        VOLUME_UNIT_ID,
        WEIGHT_UNIT_ID,
        ITEM_STATUS_ID,
        DATE_CREATED,
        DATE_MODIFIED,
    ];

    /// Columns duplicated by `copy_item`.
    pub const COPYABLE: &[&str] = &[
        NAME,
        CAT_ID,
        PRICE,
        CURRENCY,
        UNIT,
        VAT,
        PRIORITY,
        STOCK,
        NOTES,
        MFR_ID,
        MODEL_ID,
        MODEL_NAME,
        WIDTH,
        HEIGHT,
        DEPTH,
        VOLUME,
        WEIGHT,
        LENGTH_UNIT_ID,
        VOLUME_UNIT_ID,
        WEIGHT_UNIT_ID,
    ];

    pub const PROTECTED: &[&str] = &[ITEM_ID, DATE_CREATED, DATE_MODIFIED];
}

pub mod category {
    pub const CAT_ID: &str = "CatID";
    pub const PARENT_ID: &str = "ParentID";
    pub const NAME: &str = "Name";

    pub const ALL: &[&str] = &[CAT_ID, PARENT_ID, NAME];
    pub const PROTECTED: &[&str] = &[CAT_ID];
}

pub mod manufacturer {
    pub const MFR_ID: &str = "MfrID";
    pub const NAME: &str = "Name";

    pub const ALL: &[&str] = &[MFR_ID, NAME];
    pub const PROTECTED: &[&str] = &[MFR_ID];
}

pub mod model {
    pub const MODEL_ID: &str = "ModelID";
    pub const NAME: &str = "Name";
    pub const MFR_ID: &str = "MfrID";
    pub const CAT_ID: &str = "CatID";
    pub const DESC: &str = "Desc";
    pub const WIDTH: &str = "Width";
    pub const HEIGHT: &str = "Height";
    pub const DEPTH: &str = "Depth";
    pub const VOLUME: &str = "Volume";
    pub const WEIGHT: &str = "Weight";
    pub const LENGTH_UNIT_ID: &str = "LengthUnitID";
    pub const VOLUME_UNIT_ID: &str = "VolumeUnitID";
    pub const WEIGHT_UNIT_ID: &str = "WeightUnitID";

    pub const ALL: &[&str] = &[
        MODEL_ID,
        NAME,
        MFR_ID,
        CAT_ID,
        DESC,
        WIDTH,
        HEIGHT,
        DEPTH,
        VOLUME,
        WEIGHT,
        LENGTH_UNIT_ID,
        VOLUME_UNIT_ID,
        WEIGHT_UNIT_ID,
    ];
    pub const PROTECTED: &[&str] = &[MODEL_ID];
}

pub mod unit {
    pub const UNIT_ID: &str = "UnitID";
    pub const TEXT: &str = "Text";
    pub const KIND: &str = "Kind";

    pub const ALL: &[&str] = &[UNIT_ID, TEXT, KIND];
    pub const PROTECTED: &[&str] = &[UNIT_ID, TEXT, KIND];
}
