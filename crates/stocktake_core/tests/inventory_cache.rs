use rusqlite::Connection;
use std::cell::RefCell;
use std::rc::Rc;
use stocktake_core::db::open_db_in_memory;
use stocktake_core::model::columns::item;
use stocktake_core::{AccessError, CatId, EntityKind, FieldEvent, IdFormat, Inventory, ItemId};

fn stored<T: rusqlite::types::FromSql>(conn: &Connection, column: &str, id: ItemId) -> T {
    conn.query_row(
        &format!("SELECT \"{column}\" FROM Item WHERE ItemID = ?1;"),
        [id.value()],
        |row| row.get(0),
    )
    .unwrap()
}

#[test]
fn resolve_twice_returns_the_same_snapshot() {
    let conn = open_db_in_memory().unwrap();
    let mut inventory = Inventory::new(&conn, IdFormat::default()).unwrap();
    let id = inventory.create_item("Chair").unwrap();

    let first = id.resolve(&mut inventory).unwrap();
    let second = inventory.item(id).unwrap();
    assert!(Rc::ptr_eq(&first, &second));
    assert_eq!(first.borrow().name(), "Chair");
}

#[test]
fn eviction_forces_a_fresh_snapshot() {
    let conn = open_db_in_memory().unwrap();
    let mut inventory = Inventory::new(&conn, IdFormat::default()).unwrap();
    let id = inventory.create_item("Chair").unwrap();

    let before = inventory.item(id).unwrap();
    assert!(inventory.is_cached(id));
    assert!(inventory.evict(id));
    assert!(!inventory.is_cached(id));
    assert!(!inventory.evict(id));

    let after = inventory.item(id).unwrap();
    assert!(!Rc::ptr_eq(&before, &after));
}

#[test]
fn stale_handles_do_not_persist_edits() {
    let conn = open_db_in_memory().unwrap();
    let mut inventory = Inventory::new(&conn, IdFormat::default()).unwrap();
    let id = inventory.create_item("Chair").unwrap();

    let stale = inventory.item(id).unwrap();
    inventory.evict(id);
    stale.borrow_mut().set_name("Ghost");
    assert_eq!(inventory.sync().unwrap(), 0);

    assert_eq!(stored::<String>(&conn, "Name", id), "Chair");
    assert_eq!(inventory.item(id).unwrap().borrow().name(), "Chair");
}

#[test]
fn evicting_while_a_handle_is_borrowed_still_detaches_it() {
    let conn = open_db_in_memory().unwrap();
    let mut inventory = Inventory::new(&conn, IdFormat::default()).unwrap();
    let id = inventory.create_item("Chair").unwrap();

    let stale = inventory.item(id).unwrap();
    let mut borrowed = stale.borrow_mut();
    assert!(inventory.evict(id));
    borrowed.set_name("Ghost");
    drop(borrowed);
    assert_eq!(inventory.sync().unwrap(), 0);

    assert_eq!(stored::<String>(&conn, "Name", id), "Chair");
    let fresh = inventory.item(id).unwrap();
    assert!(!Rc::ptr_eq(&stale, &fresh));
    fresh.borrow_mut().set_name("Desk");
    assert_eq!(inventory.sync().unwrap(), 1);
    assert_eq!(stored::<String>(&conn, "Name", id), "Desk");
}

#[test]
fn missing_and_unset_ids_are_not_found() {
    let conn = open_db_in_memory().unwrap();
    let mut inventory = Inventory::new(&conn, IdFormat::default()).unwrap();

    assert!(matches!(
        inventory.item(ItemId::new(77)),
        Err(AccessError::NotFound { kind: EntityKind::Item, id: 77 })
    ));
    assert!(matches!(
        inventory.category(CatId::NONE),
        Err(AccessError::NotFound { .. })
    ));
    assert!(!inventory.is_cached(ItemId::new(77)));
}

#[test]
fn field_edits_persist_without_explicit_save() {
    let conn = open_db_in_memory().unwrap();
    let mut inventory = Inventory::new(&conn, IdFormat::default()).unwrap();
    let id = inventory.create_item("Chair").unwrap();

    inventory
        .edit_item(id, |item| {
            item.set_name("Armchair");
            item.set_price(89.5);
            item.set_notes("blue fabric");
        })
        .unwrap();

    assert_eq!(stored::<String>(&conn, "Name", id), "Armchair");
    assert_eq!(stored::<f64>(&conn, "Price", id), 89.5);
    assert_eq!(stored::<String>(&conn, "Notes", id), "blue fabric");
}

#[test]
fn persisted_edit_refreshes_cached_date_modified() {
    let conn = open_db_in_memory().unwrap();
    let mut inventory = Inventory::new(&conn, IdFormat::default()).unwrap();
    let id = inventory.create_item("Chair").unwrap();
    conn.execute(
        "UPDATE Item SET DateModified = '2000-01-01 00:00:00.000' WHERE ItemID = ?1;",
        [id.value()],
    )
    .unwrap();

    let handle = inventory.item(id).unwrap();
    assert_eq!(handle.borrow().date_modified(), "2000-01-01 00:00:00.000");

    inventory.edit_item(id, |item| item.set_stock(5)).unwrap();
    let stored_modified = stored::<String>(&conn, "DateModified", id);
    assert_ne!(stored_modified, "2000-01-01 00:00:00.000");
    assert_eq!(handle.borrow().date_modified(), stored_modified);
}

#[test]
fn stock_setter_writes_stock_and_leaves_vat_alone() {
    let conn = open_db_in_memory().unwrap();
    let mut inventory = Inventory::new(&conn, IdFormat::default()).unwrap();
    let id = inventory.create_item("Screws").unwrap();
    inventory.edit_item(id, |item| item.set_vat(0.2)).unwrap();

    inventory.edit_item(id, |item| item.set_stock(250)).unwrap();

    assert_eq!(stored::<i64>(&conn, "Stock", id), 250);
    assert_eq!(stored::<f64>(&conn, "Vat", id), 0.2);
}

#[test]
fn observers_see_persisted_changes_only() {
    let conn = open_db_in_memory().unwrap();
    let mut inventory = Inventory::new(&conn, IdFormat::default()).unwrap();
    let id = inventory.create_item("Chair").unwrap();

    let events: Rc<RefCell<Vec<FieldEvent>>> = Rc::default();
    let sink = Rc::clone(&events);
    inventory.subscribe(move |event| sink.borrow_mut().push(*event));

    inventory.edit_item(id, |item| item.set_stock(2)).unwrap();
    inventory.edit_item(id, |item| item.set_stock(2)).unwrap();

    let columns = events
        .borrow()
        .iter()
        .map(|event| event.column)
        .collect::<Vec<_>>();
    assert_eq!(columns, vec![item::STOCK, item::DATE_MODIFIED]);
    assert!(events
        .borrow()
        .iter()
        .all(|event| event.kind == EntityKind::Item && event.id == id.value()));
}

#[test]
fn invalid_unit_symbol_is_rejected_without_a_write() {
    let conn = open_db_in_memory().unwrap();
    let mut inventory = Inventory::new(&conn, IdFormat::default()).unwrap();
    let id = inventory.create_item("Rope").unwrap();

    let wrong_dimension = inventory
        .edit_item(id, |item| item.set_length_unit("kg"))
        .unwrap();
    assert!(matches!(
        wrong_dimension,
        Err(AccessError::InvalidConfiguration(_))
    ));
    let unknown = inventory
        .edit_item(id, |item| item.set_weight_unit("stone"))
        .unwrap();
    assert!(matches!(unknown, Err(AccessError::InvalidConfiguration(_))));
    assert_eq!(stored::<i64>(&conn, "LengthUnitID", id), 0);

    inventory
        .edit_item(id, |item| item.set_length_unit("m"))
        .unwrap()
        .unwrap();
    assert_eq!(stored::<i64>(&conn, "LengthUnitID", id), 3);
    assert_eq!(
        inventory.item(id).unwrap().borrow().stored_dimensions().unit_symbol(),
        "m"
    );
}

#[test]
fn currency_must_be_an_iso_code() {
    let conn = open_db_in_memory().unwrap();
    let mut inventory = Inventory::new(&conn, IdFormat::default()).unwrap();
    let id = inventory.create_item("Lamp").unwrap();

    let rejected = inventory
        .edit_item(id, |item| item.set_currency("euro"))
        .unwrap();
    assert!(matches!(rejected, Err(AccessError::InvalidConfiguration(_))));

    inventory
        .edit_item(id, |item| item.set_currency("EUR"))
        .unwrap()
        .unwrap();
    assert_eq!(stored::<String>(&conn, "Currency", id), "EUR");
}

#[test]
fn failed_persist_evicts_the_snapshot() {
    let conn = open_db_in_memory().unwrap();
    let mut inventory = Inventory::new(&conn, IdFormat::default()).unwrap();
    let id = inventory.create_item("Chair").unwrap();
    let handle = inventory.item(id).unwrap();

    conn.execute("DELETE FROM Item WHERE ItemID = ?1;", [id.value()])
        .unwrap();
    handle.borrow_mut().set_name("Orphan");

    assert!(matches!(
        inventory.sync(),
        Err(AccessError::NotFound { kind: EntityKind::Item, .. })
    ));
    assert!(!inventory.is_cached(id));
}

#[test]
fn item_display_follows_shared_width() {
    let conn = open_db_in_memory().unwrap();
    let format = IdFormat::default();
    let mut inventory = Inventory::new(&conn, format.clone()).unwrap();
    let id = inventory.create_item("Chair").unwrap();
    let cat = inventory.create_category("Seating", CatId::NONE).unwrap();

    assert_eq!(inventory.display_id(id), "000001");
    format.set_item_width(3);
    assert_eq!(inventory.display_id(id), "001");
    assert_eq!(inventory.display_id(cat), "1");
}
