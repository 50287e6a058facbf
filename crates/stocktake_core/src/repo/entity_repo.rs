//! Full-row loaders and structural writes for entity snapshots.
//!
//! # Responsibility
//! - Fetch every column of one row (plus joined names) in a single query.
//! - Insert, copy and delete rows for lifecycle operations.
//!
//! # Invariants
//! - Loaders resolve joined display names eagerly; snapshots never query.
//! - NULL in a display column becomes the zero value and is logged at debug.
//! - Coercion failures abort the load instead of guessing a value.

use crate::db::migrations::{current_user_version, latest_version};
use crate::model::catalog::{Category, Manufacturer, Model};
use crate::model::coerce::{coerce, RawValue, Scalar};
use crate::model::columns;
use crate::model::ids::{CatId, EntityId, EntityKind, ItemId, MfrId, ModelId, UnitId};
use crate::model::item::{Item, ItemStatus};
use crate::repo::accessor::{AccessError, AccessResult};
use log::debug;
use rusqlite::{params, Connection, Row};

const REQUIRED_TABLES: &[&str] = &["Item", "Category", "Manufacturer", "Model", "Metric"];

const ITEM_SELECT_SQL: &str = "SELECT
    i.ItemID,
    i.Name,
    i.CatID,
    COALESCE(c.Name, '') AS CategoryName,
    i.Price,
    i.Currency,
    i.Unit,
    i.Vat,
    i.Priority,
    i.Stock,
    i.Notes,
    i.MfrID,
    COALESCE(m.Name, '') AS ManufacturerName,
    i.ModelID,
    i.ModelName,
    i.Width,
    i.Height,
    i.Depth,
    i.Volume,
    i.Weight,
    i.LengthUnitID,
    i.VolumeUnitID,
    i.WeightUnitID,
    i.ItemStatusID,
    i.DateCreated,
    i.DateModified
FROM Item i
LEFT JOIN Category c ON c.CatID = i.CatID
LEFT JOIN Manufacturer m ON m.MfrID = i.MfrID
WHERE i.ItemID = ?1;";

const MODEL_SELECT_SQL: &str = "SELECT
    o.ModelID,
    o.Name,
    o.MfrID,
    COALESCE(m.Name, '') AS ManufacturerName,
    o.CatID,
    COALESCE(c.Name, '') AS CategoryName,
    o.\"Desc\",
    o.Width,
    o.Height,
    o.Depth,
    o.Volume,
    o.Weight,
    o.LengthUnitID,
    o.VolumeUnitID,
    o.WeightUnitID
FROM Model o
LEFT JOIN Manufacturer m ON m.MfrID = o.MfrID
LEFT JOIN Category c ON c.CatID = o.CatID
WHERE o.ModelID = ?1;";

/// Verifies the connection is migrated and carries the entity tables.
pub fn ensure_connection_ready(conn: &Connection) -> AccessResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(AccessError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in REQUIRED_TABLES {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(AccessError::InvalidData(format!(
                "required table `{table}` is missing"
            )));
        }
    }
    Ok(())
}

struct RowReader<'a, 'stmt> {
    row: &'a Row<'stmt>,
    kind: EntityKind,
    id: i64,
}

impl RowReader<'_, '_> {
    fn raw(&self, column: &str) -> AccessResult<RawValue> {
        Ok(RawValue::from(self.row.get_ref(column)?))
    }

    fn required<T: Scalar>(&self, column: &str) -> AccessResult<T> {
        let raw = self.raw(column)?;
        let coerced = coerce::<T>(&raw)
            .map_err(|err| AccessError::coercion(self.kind, self.id, column, err))?;
        if coerced.is_null {
            return Err(AccessError::NullValue {
                kind: self.kind,
                id: self.id,
                column: column.to_string(),
            });
        }
        Ok(coerced.value)
    }

    fn or_default<T: Scalar>(&self, column: &str) -> AccessResult<T> {
        let raw = self.raw(column)?;
        let coerced = coerce::<T>(&raw)
            .map_err(|err| AccessError::coercion(self.kind, self.id, column, err))?;
        if coerced.is_null {
            debug!(
                "event=row_load module=entity_repo status=default kind={} id={} column={}",
                self.kind, self.id, column
            );
        }
        Ok(coerced.value)
    }
}

/// Loads one item with category and manufacturer names resolved.
pub fn load_item(conn: &Connection, id: ItemId) -> AccessResult<Item> {
    if id.is_none() {
        return Err(AccessError::NotFound {
            kind: EntityKind::Item,
            id: id.value(),
        });
    }

    let mut stmt = conn.prepare(ITEM_SELECT_SQL)?;
    let mut rows = stmt.query([id.value()])?;
    let Some(row) = rows.next()? else {
        return Err(AccessError::NotFound {
            kind: EntityKind::Item,
            id: id.value(),
        });
    };

    let reader = RowReader {
        row,
        kind: EntityKind::Item,
        id: id.value(),
    };
    let status_code: i64 = reader.required(columns::item::ITEM_STATUS_ID)?;
    let status = ItemStatus::from_db(status_code).ok_or_else(|| {
        AccessError::InvalidData(format!(
            "invalid ItemStatusID `{status_code}` for item {id}"
        ))
    })?;

    Ok(Item {
        id,
        name: reader.or_default(columns::item::NAME)?,
        cat_id: CatId::new(reader.or_default(columns::item::CAT_ID)?),
        category: reader.or_default("CategoryName")?,
        price: reader.or_default(columns::item::PRICE)?,
        currency: reader.or_default(columns::item::CURRENCY)?,
        unit: reader.or_default(columns::item::UNIT)?,
        vat: reader.or_default(columns::item::VAT)?,
        priority: reader.or_default(columns::item::PRIORITY)?,
        stock: reader.or_default(columns::item::STOCK)?,
        notes: reader.or_default(columns::item::NOTES)?,
        mfr_id: MfrId::new(reader.or_default(columns::item::MFR_ID)?),
        manufacturer: reader.or_default("ManufacturerName")?,
        model_id: ModelId::new(reader.or_default(columns::item::MODEL_ID)?),
        model_name: reader.or_default(columns::item::MODEL_NAME)?,
        width: reader.or_default(columns::item::WIDTH)?,
        height: reader.or_default(columns::item::HEIGHT)?,
        depth: reader.or_default(columns::item::DEPTH)?,
        volume: reader.or_default(columns::item::VOLUME)?,
        weight: reader.or_default(columns::item::WEIGHT)?,
        length_unit: UnitId::new(reader.or_default(columns::item::LENGTH_UNIT_ID)?),
        volume_unit: UnitId::new(reader.or_default(columns::item::VOLUME_UNIT_ID)?),
        weight_unit: UnitId::new(reader.or_default(columns::item::WEIGHT_UNIT_ID)?),
        status,
        date_created: reader.required(columns::item::DATE_CREATED)?,
        date_modified: reader.required(columns::item::DATE_MODIFIED)?,
        sink: None,
    })
}

pub fn load_category(conn: &Connection, id: CatId) -> AccessResult<Category> {
    let not_found = || AccessError::NotFound {
        kind: EntityKind::Category,
        id: id.value(),
    };
    if id.is_none() {
        return Err(not_found());
    }

    let mut stmt = conn.prepare("SELECT CatID, ParentID, Name FROM Category WHERE CatID = ?1;")?;
    let mut rows = stmt.query([id.value()])?;
    let row = rows.next()?.ok_or_else(not_found)?;
    let reader = RowReader {
        row,
        kind: EntityKind::Category,
        id: id.value(),
    };

    Ok(Category {
        id,
        parent_id: CatId::new(reader.or_default(columns::category::PARENT_ID)?),
        name: reader.or_default(columns::category::NAME)?,
        sink: None,
    })
}

pub fn load_manufacturer(conn: &Connection, id: MfrId) -> AccessResult<Manufacturer> {
    let not_found = || AccessError::NotFound {
        kind: EntityKind::Manufacturer,
        id: id.value(),
    };
    if id.is_none() {
        return Err(not_found());
    }

    let mut stmt = conn.prepare("SELECT MfrID, Name FROM Manufacturer WHERE MfrID = ?1;")?;
    let mut rows = stmt.query([id.value()])?;
    let row = rows.next()?.ok_or_else(not_found)?;
    let reader = RowReader {
        row,
        kind: EntityKind::Manufacturer,
        id: id.value(),
    };

    Ok(Manufacturer {
        id,
        name: reader.or_default(columns::manufacturer::NAME)?,
        sink: None,
    })
}

pub fn load_model(conn: &Connection, id: ModelId) -> AccessResult<Model> {
    let not_found = || AccessError::NotFound {
        kind: EntityKind::Model,
        id: id.value(),
    };
    if id.is_none() {
        return Err(not_found());
    }

    let mut stmt = conn.prepare(MODEL_SELECT_SQL)?;
    let mut rows = stmt.query([id.value()])?;
    let row = rows.next()?.ok_or_else(not_found)?;
    let reader = RowReader {
        row,
        kind: EntityKind::Model,
        id: id.value(),
    };

    Ok(Model {
        id,
        name: reader.or_default(columns::model::NAME)?,
        mfr_id: MfrId::new(reader.or_default(columns::model::MFR_ID)?),
        manufacturer: reader.or_default("ManufacturerName")?,
        cat_id: CatId::new(reader.or_default(columns::model::CAT_ID)?),
        category: reader.or_default("CategoryName")?,
        desc: reader.or_default(columns::model::DESC)?,
        width: reader.or_default(columns::model::WIDTH)?,
        height: reader.or_default(columns::model::HEIGHT)?,
        depth: reader.or_default(columns::model::DEPTH)?,
        volume: reader.or_default(columns::model::VOLUME)?,
        weight: reader.or_default(columns::model::WEIGHT)?,
        length_unit: UnitId::new(reader.or_default(columns::model::LENGTH_UNIT_ID)?),
        volume_unit: UnitId::new(reader.or_default(columns::model::VOLUME_UNIT_ID)?),
        weight_unit: UnitId::new(reader.or_default(columns::model::WEIGHT_UNIT_ID)?),
        sink: None,
    })
}

pub fn insert_item(conn: &Connection, name: &str) -> AccessResult<ItemId> {
    conn.execute("INSERT INTO Item (Name) VALUES (?1);", [name])?;
    Ok(ItemId::new(conn.last_insert_rowid()))
}

/// Duplicates every user column of `source` into a fresh active row.
pub fn copy_item_row(conn: &Connection, source: ItemId) -> AccessResult<ItemId> {
    let column_list = columns::item::COPYABLE
        .iter()
        .map(|column| format!("\"{column}\""))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO Item ({column_list})
         SELECT {column_list} FROM Item WHERE ItemID = ?1;"
    );
    let inserted = conn.execute(&sql, [source.value()])?;
    if inserted == 0 {
        return Err(AccessError::NotFound {
            kind: EntityKind::Item,
            id: source.value(),
        });
    }
    Ok(ItemId::new(conn.last_insert_rowid()))
}

/// Marks one item deleted. Repeating the call is harmless.
pub fn soft_delete_item(conn: &Connection, id: ItemId) -> AccessResult<()> {
    let changed = conn.execute(
        "UPDATE Item
         SET ItemStatusID = ?1,
             DateModified = strftime('%Y-%m-%d %H:%M:%f', 'now')
         WHERE ItemID = ?2;",
        params![ItemStatus::Deleted.to_db(), id.value()],
    )?;
    if changed == 0 {
        return Err(AccessError::NotFound {
            kind: EntityKind::Item,
            id: id.value(),
        });
    }
    Ok(())
}

/// Removes one row of any writable kind.
pub fn delete_row<I: EntityId>(conn: &Connection, id: I) -> AccessResult<()> {
    let descriptor = I::KIND.descriptor();
    if descriptor.read_only {
        return Err(AccessError::InvalidConfiguration(format!(
            "`{}` is a read-only catalog",
            descriptor.table
        )));
    }
    let sql = format!(
        "DELETE FROM \"{}\" WHERE \"{}\" = ?1;",
        descriptor.table, descriptor.key_column
    );
    let changed = conn.execute(&sql, [id.raw()])?;
    if changed == 0 {
        return Err(AccessError::NotFound {
            kind: I::KIND,
            id: id.raw(),
        });
    }
    Ok(())
}

pub fn insert_category(conn: &Connection, name: &str, parent_id: CatId) -> AccessResult<CatId> {
    conn.execute(
        "INSERT INTO Category (Name, ParentID) VALUES (?1, ?2);",
        params![name, parent_id.value()],
    )?;
    Ok(CatId::new(conn.last_insert_rowid()))
}

pub fn insert_manufacturer(conn: &Connection, name: &str) -> AccessResult<MfrId> {
    conn.execute("INSERT INTO Manufacturer (Name) VALUES (?1);", [name])?;
    Ok(MfrId::new(conn.last_insert_rowid()))
}

pub fn insert_model(conn: &Connection, name: &str, mfr_id: MfrId) -> AccessResult<ModelId> {
    conn.execute(
        "INSERT INTO Model (Name, MfrID) VALUES (?1, ?2);",
        params![name, mfr_id.value()],
    )?;
    Ok(ModelId::new(conn.last_insert_rowid()))
}
