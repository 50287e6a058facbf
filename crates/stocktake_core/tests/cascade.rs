use rusqlite::Connection;
use std::cell::RefCell;
use std::rc::Rc;
use stocktake_core::db::open_db_in_memory;
use stocktake_core::model::columns::item;
use stocktake_core::{CatId, FieldEvent, IdFormat, Inventory, ItemId, MfrId, ModelId};

struct Fixture {
    chairs: CatId,
    acme: MfrId,
    model: ModelId,
}

fn seed_model(inventory: &mut Inventory<'_>) -> Fixture {
    let chairs = inventory.create_category("Chairs", CatId::NONE).unwrap();
    let acme = inventory.create_manufacturer("Acme").unwrap();
    let model = inventory.create_model("AC-100", acme).unwrap();
    inventory
        .edit_model(model, |model| -> stocktake_core::AccessResult<()> {
            model.set_category(chairs);
            model.set_desc("Oak office chair");
            model.set_dimensions(60.0, 110.0, 55.0);
            model.set_length_unit("cm")?;
            model.set_volume(0.36);
            model.set_volume_unit("m3")?;
            model.set_weight(14.5);
            model.set_weight_unit("kg")
        })
        .unwrap()
        .unwrap();
    Fixture { chairs, acme, model }
}

fn stored_opt_f64(conn: &Connection, column: &str, id: ItemId) -> Option<f64> {
    conn.query_row(
        &format!("SELECT \"{column}\" FROM Item WHERE ItemID = ?1;"),
        [id.value()],
        |row| row.get(0),
    )
    .unwrap()
}

fn stored_i64(conn: &Connection, column: &str, id: ItemId) -> i64 {
    conn.query_row(
        &format!("SELECT \"{column}\" FROM Item WHERE ItemID = ?1;"),
        [id.value()],
        |row| row.get(0),
    )
    .unwrap()
}

#[test]
fn linking_a_model_inherits_into_an_empty_item() {
    let conn = open_db_in_memory().unwrap();
    let mut inventory = Inventory::new(&conn, IdFormat::default()).unwrap();
    let fixture = seed_model(&mut inventory);
    let id = inventory.create_item("Office chair").unwrap();

    inventory
        .edit_item(id, |item| item.set_model(fixture.model))
        .unwrap();

    assert_eq!(stored_i64(&conn, "CatID", id), fixture.chairs.value());
    assert_eq!(stored_i64(&conn, "MfrID", id), fixture.acme.value());
    assert_eq!(stored_opt_f64(&conn, "Width", id), Some(60.0));
    assert_eq!(stored_opt_f64(&conn, "Height", id), Some(110.0));
    assert_eq!(stored_opt_f64(&conn, "Depth", id), Some(55.0));
    assert_eq!(stored_i64(&conn, "LengthUnitID", id), 2);
    assert_eq!(stored_opt_f64(&conn, "Volume", id), Some(0.36));
    assert_eq!(stored_i64(&conn, "VolumeUnitID", id), 12);
    assert_eq!(stored_opt_f64(&conn, "Weight", id), Some(14.5));
    assert_eq!(stored_i64(&conn, "WeightUnitID", id), 21);

    let handle = inventory.item(id).unwrap();
    let snapshot = handle.borrow();
    assert_eq!(snapshot.category(), "Chairs");
    assert_eq!(snapshot.manufacturer(), "Acme");
    assert_eq!(snapshot.model_name(), "Oak office chair");
    assert_eq!(snapshot.stored_dimensions().width, 60.0);
    assert_eq!(snapshot.stored_dimensions().unit_symbol(), "cm");
}

#[test]
fn one_authored_dimension_blocks_the_whole_trio() {
    let conn = open_db_in_memory().unwrap();
    let mut inventory = Inventory::new(&conn, IdFormat::default()).unwrap();
    let fixture = seed_model(&mut inventory);
    let id = inventory.create_item("Custom chair").unwrap();
    inventory.edit_item(id, |item| item.set_width(5.0)).unwrap();

    inventory
        .edit_item(id, |item| item.set_model(fixture.model))
        .unwrap();

    assert_eq!(stored_opt_f64(&conn, "Width", id), Some(5.0));
    assert_eq!(stored_opt_f64(&conn, "Height", id), None);
    assert_eq!(stored_opt_f64(&conn, "Depth", id), None);
    assert_eq!(stored_i64(&conn, "LengthUnitID", id), 0);

    assert_eq!(stored_i64(&conn, "CatID", id), fixture.chairs.value());
    let model_name: String = conn
        .query_row(
            "SELECT ModelName FROM Item WHERE ItemID = ?1;",
            [id.value()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(model_name, "Oak office chair");

    // Volume and weight are independent of the trio.
    assert_eq!(stored_opt_f64(&conn, "Volume", id), Some(0.36));
    assert_eq!(stored_opt_f64(&conn, "Weight", id), Some(14.5));
}

#[test]
fn authored_volume_survives_while_weight_is_inherited() {
    let conn = open_db_in_memory().unwrap();
    let mut inventory = Inventory::new(&conn, IdFormat::default()).unwrap();
    let fixture = seed_model(&mut inventory);
    let id = inventory.create_item("Crate").unwrap();
    inventory
        .edit_item(id, |item| {
            item.set_volume(2.0);
            item.set_volume_unit("l")
        })
        .unwrap()
        .unwrap();

    inventory
        .edit_item(id, |item| item.set_model(fixture.model))
        .unwrap();

    assert_eq!(stored_opt_f64(&conn, "Volume", id), Some(2.0));
    assert_eq!(stored_i64(&conn, "VolumeUnitID", id), 11);
    assert_eq!(stored_opt_f64(&conn, "Weight", id), Some(14.5));
    assert_eq!(stored_i64(&conn, "WeightUnitID", id), 21);
}

#[test]
fn existing_manufacturer_is_not_overwritten() {
    let conn = open_db_in_memory().unwrap();
    let mut inventory = Inventory::new(&conn, IdFormat::default()).unwrap();
    let fixture = seed_model(&mut inventory);
    let other = inventory.create_manufacturer("Globex").unwrap();
    let id = inventory.create_item("Rebadged chair").unwrap();
    inventory
        .edit_item(id, |item| item.set_manufacturer(other))
        .unwrap();
    assert_eq!(inventory.item(id).unwrap().borrow().manufacturer(), "Globex");

    inventory
        .edit_item(id, |item| item.set_model(fixture.model))
        .unwrap();

    assert_eq!(stored_i64(&conn, "MfrID", id), other.value());
    assert_eq!(inventory.item(id).unwrap().borrow().manufacturer(), "Globex");
}

#[test]
fn edits_batched_after_a_model_link_win_in_store_and_snapshot() {
    let conn = open_db_in_memory().unwrap();
    let mut inventory = Inventory::new(&conn, IdFormat::default()).unwrap();
    let fixture = seed_model(&mut inventory);
    let tables = inventory.create_category("Tables", CatId::NONE).unwrap();
    let id = inventory.create_item("Desk").unwrap();

    inventory
        .edit_item(id, |item| {
            item.set_model(fixture.model);
            item.set_category(tables);
            item.set_weight(3.0);
        })
        .unwrap();

    assert_eq!(stored_i64(&conn, "CatID", id), tables.value());
    assert_eq!(stored_opt_f64(&conn, "Weight", id), Some(3.0));
    assert_eq!(stored_i64(&conn, "MfrID", id), fixture.acme.value());

    let handle = inventory.item(id).unwrap();
    let snapshot = handle.borrow();
    assert_eq!(snapshot.cat_id(), tables);
    assert_eq!(snapshot.category(), "Tables");
    assert_eq!(snapshot.weight(), 3.0);
    assert_eq!(snapshot.mfr_id(), fixture.acme);
    assert_eq!(snapshot.manufacturer(), "Acme");
}

#[test]
fn relinking_the_same_model_changes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let mut inventory = Inventory::new(&conn, IdFormat::default()).unwrap();
    let fixture = seed_model(&mut inventory);
    let id = inventory.create_item("Office chair").unwrap();
    inventory
        .edit_item(id, |item| item.set_model(fixture.model))
        .unwrap();
    let first = serde_json::to_value(&*inventory.item(id).unwrap().borrow()).unwrap();

    let events: Rc<RefCell<Vec<FieldEvent>>> = Rc::default();
    let sink = Rc::clone(&events);
    inventory.subscribe(move |event| sink.borrow_mut().push(*event));

    inventory
        .edit_item(id, |item| item.set_model(ModelId::NONE))
        .unwrap();
    inventory
        .edit_item(id, |item| item.set_model(fixture.model))
        .unwrap();
    let second = serde_json::to_value(&*inventory.item(id).unwrap().borrow()).unwrap();

    for column in ["CatID", "MfrID", "ModelName", "Width", "Height", "Depth", "Volume", "Weight"] {
        assert_eq!(first[column], second[column], "column {column} changed");
    }
    let columns = events
        .borrow()
        .iter()
        .filter(|event| event.column != item::DATE_MODIFIED)
        .map(|event| event.column)
        .collect::<Vec<_>>();
    assert_eq!(columns, vec![item::MODEL_ID, item::MODEL_ID]);
}

#[test]
fn unlinking_does_not_cascade() {
    let conn = open_db_in_memory().unwrap();
    let mut inventory = Inventory::new(&conn, IdFormat::default()).unwrap();
    let fixture = seed_model(&mut inventory);
    let id = inventory.create_item("Office chair").unwrap();
    inventory
        .edit_item(id, |item| item.set_model(fixture.model))
        .unwrap();

    inventory
        .edit_item(id, |item| item.set_model(ModelId::NONE))
        .unwrap();

    assert_eq!(stored_i64(&conn, "ModelID", id), 0);
    assert_eq!(stored_i64(&conn, "CatID", id), fixture.chairs.value());
    assert_eq!(stored_opt_f64(&conn, "Width", id), Some(60.0));
}

#[test]
fn dimensions_fall_back_to_the_model_on_read() {
    let conn = open_db_in_memory().unwrap();
    let mut inventory = Inventory::new(&conn, IdFormat::default()).unwrap();
    let fixture = seed_model(&mut inventory);
    let id = inventory.create_item("Imported chair").unwrap();
    conn.execute(
        "UPDATE Item SET ModelID = ?1 WHERE ItemID = ?2;",
        [fixture.model.value(), id.value()],
    )
    .unwrap();

    let dims = inventory.item_dimensions(id).unwrap();
    assert_eq!((dims.width, dims.height, dims.depth), (60.0, 110.0, 55.0));
    assert_eq!(dims.unit_symbol(), "cm");
    assert_eq!(stored_opt_f64(&conn, "Width", id), None);

    inventory.edit_item(id, |item| item.set_depth(12.0)).unwrap();
    let dims = inventory.item_dimensions(id).unwrap();
    assert_eq!((dims.width, dims.height, dims.depth), (0.0, 0.0, 12.0));
}

#[test]
fn renames_propagate_to_cached_snapshots() {
    let conn = open_db_in_memory().unwrap();
    let mut inventory = Inventory::new(&conn, IdFormat::default()).unwrap();
    let fixture = seed_model(&mut inventory);
    let id = inventory.create_item("Office chair").unwrap();
    inventory
        .edit_item(id, |item| item.set_model(fixture.model))
        .unwrap();
    let item_handle = inventory.item(id).unwrap();
    let model_handle = inventory.model(fixture.model).unwrap();

    inventory
        .edit_category(fixture.chairs, |category| category.set_name("Seating"))
        .unwrap();
    inventory
        .edit_manufacturer(fixture.acme, |manufacturer| manufacturer.set_name("Acme Corp"))
        .unwrap();

    assert_eq!(item_handle.borrow().category(), "Seating");
    assert_eq!(item_handle.borrow().manufacturer(), "Acme Corp");
    assert_eq!(model_handle.borrow().category(), "Seating");
    assert_eq!(model_handle.borrow().manufacturer(), "Acme Corp");

    inventory.remove_category(fixture.chairs).unwrap();
    assert_eq!(item_handle.borrow().category(), "");
}

#[test]
fn category_path_walks_parents_and_stops_on_cycles() {
    let conn = open_db_in_memory().unwrap();
    let mut inventory = Inventory::new(&conn, IdFormat::default()).unwrap();
    let furniture = inventory.create_category("Furniture", CatId::NONE).unwrap();
    let chairs = inventory.create_category("Chairs", furniture).unwrap();
    let office = inventory.create_category("Office", chairs).unwrap();

    assert_eq!(
        inventory.category_path(office).unwrap(),
        "Furniture / Chairs / Office"
    );

    inventory
        .edit_category(furniture, |category| category.set_parent(office))
        .unwrap();
    assert_eq!(
        inventory.category_path(office).unwrap(),
        "Furniture / Chairs / Office"
    );
    assert_eq!(inventory.category_path(CatId::NONE).unwrap(), "");
}
