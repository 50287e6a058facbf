//! Inventory entity service.
//!
//! # Responsibility
//! - Own one identity-preserving cache per entity kind.
//! - Drain field changes emitted by live snapshots and persist them.
//! - Run derivation cascades and keep joined projections current.
//! - Provide lifecycle operations and journal their structural events.
//!
//! # Invariants
//! - At most one live snapshot per (kind, id); `resolve` twice without an
//!   eviction yields the same `Rc`.
//! - A change that does not alter the stored value fires no observer, no
//!   cascade and no timestamp refresh.
//! - A failed persist evicts the affected snapshot so the next resolve
//!   reloads the stored truth.
//! - Single owner thread. Callers must not hold a snapshot borrow across
//!   `sync` or any lifecycle call.

use crate::model::catalog::{Category, Manufacturer, Model};
use crate::model::change::{change_channel, ChangeSink, FieldChange, FieldEvent};
use crate::model::columns;
use crate::model::ids::{CatId, EntityId, EntityKind, ItemId, MfrId, ModelId};
use crate::model::item::{Dimensions, Item, ItemStatus};
use crate::repo::accessor::{AccessError, AccessResult, ColumnAccessor};
use crate::repo::entity_repo;
use crate::journal::{AuditLevel, AuditSink, LogAuditSink};
use crate::search::query::{search_items, SearchConfig, SearchOutcome, SearchResult};
use crate::service::cascade;
use crate::service::entity_cache::{EntityCache, EntityHandle};
use crate::settings::IdFormat;
use log::{debug, error, info, warn};
use rusqlite::Connection;
use std::collections::{HashMap, HashSet};
use std::sync::mpsc::Receiver;

type Observer<'conn> = Box<dyn FnMut(&FieldEvent) + 'conn>;

/// Entry point of the entity layer for presentation callers.
pub struct Inventory<'conn> {
    conn: &'conn Connection,
    accessor: ColumnAccessor<'conn>,
    format: IdFormat,
    audit: Box<dyn AuditSink + 'conn>,
    items: EntityCache<ItemId, Item>,
    categories: EntityCache<CatId, Category>,
    manufacturers: EntityCache<MfrId, Manufacturer>,
    models: EntityCache<ModelId, Model>,
    sink: ChangeSink,
    links: HashMap<(EntityKind, i64), ChangeSink>,
    changes: Receiver<FieldChange>,
    observers: Vec<Observer<'conn>>,
}

impl<'conn> Inventory<'conn> {
    /// Creates an inventory journaling to the process log.
    pub fn new(conn: &'conn Connection, format: IdFormat) -> AccessResult<Self> {
        Self::with_audit(conn, format, Box::new(LogAuditSink))
    }

    /// Creates an inventory with an explicit audit sink.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations are not applied.
    pub fn with_audit(
        conn: &'conn Connection,
        format: IdFormat,
        audit: Box<dyn AuditSink + 'conn>,
    ) -> AccessResult<Self> {
        entity_repo::ensure_connection_ready(conn)?;
        let (sink, changes) = change_channel();
        Ok(Self {
            conn,
            accessor: ColumnAccessor::new(conn),
            format,
            audit,
            items: EntityCache::new(),
            categories: EntityCache::new(),
            manufacturers: EntityCache::new(),
            models: EntityCache::new(),
            sink,
            links: HashMap::new(),
            changes,
            observers: Vec::new(),
        })
    }

    pub fn format(&self) -> &IdFormat {
        &self.format
    }

    /// Renders any identifier with the shared display settings.
    pub fn display_id<I: EntityId>(&self, id: I) -> String {
        id.display(&self.format)
    }

    /// Registers an observer for persisted field changes.
    pub fn subscribe(&mut self, observer: impl FnMut(&FieldEvent) + 'conn) {
        self.observers.push(Box::new(observer));
    }

    /// Resolves the live item snapshot. Deleted items resolve as `NotFound`.
    pub fn item(&mut self, id: ItemId) -> AccessResult<EntityHandle<Item>> {
        let conn = self.conn;
        let sink = &self.sink;
        let links = &mut self.links;
        self.items.get_or_try_insert_with(id, || {
            let mut item = entity_repo::load_item(conn, id)?;
            if item.status() == ItemStatus::Deleted {
                return Err(AccessError::NotFound {
                    kind: EntityKind::Item,
                    id: id.value(),
                });
            }
            item.attach(link(links, sink, EntityKind::Item, id.value()));
            Ok(item)
        })
    }

    pub fn category(&mut self, id: CatId) -> AccessResult<EntityHandle<Category>> {
        let conn = self.conn;
        let sink = &self.sink;
        let links = &mut self.links;
        self.categories.get_or_try_insert_with(id, || {
            let mut category = entity_repo::load_category(conn, id)?;
            category.attach(link(links, sink, EntityKind::Category, id.value()));
            Ok(category)
        })
    }

    pub fn manufacturer(&mut self, id: MfrId) -> AccessResult<EntityHandle<Manufacturer>> {
        let conn = self.conn;
        let sink = &self.sink;
        let links = &mut self.links;
        self.manufacturers.get_or_try_insert_with(id, || {
            let mut manufacturer = entity_repo::load_manufacturer(conn, id)?;
            manufacturer.attach(link(links, sink, EntityKind::Manufacturer, id.value()));
            Ok(manufacturer)
        })
    }

    pub fn model(&mut self, id: ModelId) -> AccessResult<EntityHandle<Model>> {
        let conn = self.conn;
        let sink = &self.sink;
        let links = &mut self.links;
        self.models.get_or_try_insert_with(id, || {
            let mut model = entity_repo::load_model(conn, id)?;
            model.attach(link(links, sink, EntityKind::Model, id.value()));
            Ok(model)
        })
    }

    /// Whether a live snapshot is cached for `id`.
    pub fn is_cached<I: EntityId>(&self, id: I) -> bool {
        let raw = id.raw();
        match I::KIND {
            EntityKind::Item => self.items.contains(ItemId::new(raw)),
            EntityKind::Category => self.categories.contains(CatId::new(raw)),
            EntityKind::Manufacturer => self.manufacturers.contains(MfrId::new(raw)),
            EntityKind::Model => self.models.contains(ModelId::new(raw)),
            EntityKind::Unit => false,
        }
    }

    /// Drops the cached snapshot for `id`.
    ///
    /// The evicted snapshot is detached from the change channel, so edits
    /// through a stale handle are never persisted.
    pub fn evict<I: EntityId>(&mut self, id: I) -> bool {
        self.evict_raw(I::KIND, id.raw())
    }

    fn evict_raw(&mut self, kind: EntityKind, id: i64) -> bool {
        let evicted = match kind {
            EntityKind::Item => self.items.evict(ItemId::new(id)).is_some(),
            EntityKind::Category => self.categories.evict(CatId::new(id)).is_some(),
            EntityKind::Manufacturer => self.manufacturers.evict(MfrId::new(id)).is_some(),
            EntityKind::Model => self.models.evict(ModelId::new(id)).is_some(),
            EntityKind::Unit => false,
        };
        // Closing the link needs no borrow of the snapshot itself.
        if let Some(link) = self.links.remove(&(kind, id)) {
            link.close();
        }
        if evicted {
            debug!("event=cache_evict module=inventory status=ok kind={kind} id={id}");
        }
        evicted
    }

    /// Persists every pending field change.
    ///
    /// Returns the number of changes drained. Stops at the first failure,
    /// evicting the snapshot the failed change belonged to.
    pub fn sync(&mut self) -> AccessResult<usize> {
        let mut drained = 0;
        while let Ok(change) = self.changes.try_recv() {
            let (kind, id, column) = (change.kind, change.id, change.column);
            if let Err(err) = self.apply_change(change) {
                error!(
                    "event=field_persist module=inventory status=error kind={} id={} column={} error={}",
                    kind, id, column, err
                );
                self.evict_raw(kind, id);
                return Err(err);
            }
            drained += 1;
        }
        Ok(drained)
    }

    /// Edits one item and persists the edit.
    pub fn edit_item<R>(&mut self, id: ItemId, edit: impl FnOnce(&mut Item) -> R) -> AccessResult<R> {
        let handle = self.item(id)?;
        let result = edit(&mut handle.borrow_mut());
        self.sync()?;
        Ok(result)
    }

    pub fn edit_category<R>(
        &mut self,
        id: CatId,
        edit: impl FnOnce(&mut Category) -> R,
    ) -> AccessResult<R> {
        let handle = self.category(id)?;
        let result = edit(&mut handle.borrow_mut());
        self.sync()?;
        Ok(result)
    }

    pub fn edit_manufacturer<R>(
        &mut self,
        id: MfrId,
        edit: impl FnOnce(&mut Manufacturer) -> R,
    ) -> AccessResult<R> {
        let handle = self.manufacturer(id)?;
        let result = edit(&mut handle.borrow_mut());
        self.sync()?;
        Ok(result)
    }

    pub fn edit_model<R>(
        &mut self,
        id: ModelId,
        edit: impl FnOnce(&mut Model) -> R,
    ) -> AccessResult<R> {
        let handle = self.model(id)?;
        let result = edit(&mut handle.borrow_mut());
        self.sync()?;
        Ok(result)
    }

    /// Item dimensions with read-through fallback to the linked model.
    pub fn item_dimensions(&mut self, id: ItemId) -> AccessResult<Dimensions> {
        let handle = self.item(id)?;
        let (stored, model_id) = {
            let item = handle.borrow();
            (item.stored_dimensions(), item.model_id())
        };
        if !stored.is_unset() || model_id.is_none() {
            return Ok(stored);
        }

        let model = match self.model(model_id) {
            Ok(model) => model,
            Err(AccessError::NotFound { .. }) => {
                warn!(
                    "event=dimension_fallback module=inventory status=error item_id={} model_id={} error_code=model_missing",
                    id, model_id
                );
                return Ok(stored);
            }
            Err(err) => return Err(err),
        };
        let item = handle.borrow();
        let model = model.borrow();
        Ok(cascade::effective_dimensions(&item, Some(&model)))
    }

    /// Category names from the root down to `id`, joined by `" / "`.
    ///
    /// Walking stops at a zero parent, a missing parent or a cycle.
    pub fn category_path(&mut self, id: CatId) -> AccessResult<String> {
        let mut names = Vec::new();
        let mut visited = HashSet::new();
        let mut current = id;
        while !current.is_none() && visited.insert(current) {
            let handle = match self.category(current) {
                Ok(handle) => handle,
                Err(AccessError::NotFound { .. }) if current != id => break,
                Err(err) => return Err(err),
            };
            let category = handle.borrow();
            names.push(category.name().to_string());
            current = category.parent_id();
        }
        names.reverse();
        Ok(names.join(" / "))
    }

    /// Runs an item search after flushing pending edits.
    pub fn search(&mut self, config: &SearchConfig, text: &str) -> SearchResult<SearchOutcome> {
        self.sync()?;
        search_items(self.conn, config, text, &self.format)
    }

    pub fn create_item(&mut self, name: &str) -> AccessResult<ItemId> {
        let id = entity_repo::insert_item(self.conn, name)?;
        self.journal(AuditLevel::Info, "item_create", format!("item {} created", self.display_id(id)));
        info!("event=item_create module=inventory status=ok item_id={id}");
        Ok(id)
    }

    /// Duplicates an item into a new active row with fresh timestamps.
    pub fn copy_item(&mut self, source: ItemId) -> AccessResult<ItemId> {
        self.sync()?;
        let id = entity_repo::copy_item_row(self.conn, source)?;
        self.journal(
            AuditLevel::Info,
            "item_copy",
            format!(
                "item {} copied from {}",
                self.display_id(id),
                self.display_id(source)
            ),
        );
        info!("event=item_copy module=inventory status=ok item_id={id} source_id={source}");
        Ok(id)
    }

    /// Soft-deletes an item and evicts its snapshot.
    pub fn delete_item(&mut self, id: ItemId) -> AccessResult<()> {
        self.sync()?;
        entity_repo::soft_delete_item(self.conn, id)?;
        self.evict(id);
        self.journal(AuditLevel::Info, "item_delete", format!("item {} deleted", self.display_id(id)));
        info!("event=item_delete module=inventory status=ok item_id={id}");
        Ok(())
    }

    /// Removes an item row permanently and evicts its snapshot.
    pub fn purge_item(&mut self, id: ItemId) -> AccessResult<()> {
        self.sync()?;
        entity_repo::delete_row(self.conn, id)?;
        self.evict(id);
        self.journal(AuditLevel::Warning, "item_purge", format!("item {} purged", self.display_id(id)));
        info!("event=item_purge module=inventory status=ok item_id={id}");
        Ok(())
    }

    pub fn create_category(&mut self, name: &str, parent_id: CatId) -> AccessResult<CatId> {
        let id = entity_repo::insert_category(self.conn, name, parent_id)?;
        self.journal(AuditLevel::Info, "category_create", format!("category {id} created"));
        info!("event=category_create module=inventory status=ok cat_id={id}");
        Ok(id)
    }

    pub fn create_manufacturer(&mut self, name: &str) -> AccessResult<MfrId> {
        let id = entity_repo::insert_manufacturer(self.conn, name)?;
        self.journal(AuditLevel::Info, "manufacturer_create", format!("manufacturer {id} created"));
        info!("event=manufacturer_create module=inventory status=ok mfr_id={id}");
        Ok(id)
    }

    pub fn create_model(&mut self, name: &str, mfr_id: MfrId) -> AccessResult<ModelId> {
        let id = entity_repo::insert_model(self.conn, name, mfr_id)?;
        self.journal(AuditLevel::Info, "model_create", format!("model {id} created"));
        info!("event=model_create module=inventory status=ok model_id={id}");
        Ok(id)
    }

    /// Deletes a category row; cached items and models show an empty name.
    pub fn remove_category(&mut self, id: CatId) -> AccessResult<()> {
        self.sync()?;
        entity_repo::delete_row(self.conn, id)?;
        self.evict(id);
        self.propagate_category_name(id)?;
        self.journal(AuditLevel::Info, "category_remove", format!("category {id} removed"));
        Ok(())
    }

    pub fn remove_manufacturer(&mut self, id: MfrId) -> AccessResult<()> {
        self.sync()?;
        entity_repo::delete_row(self.conn, id)?;
        self.evict(id);
        self.propagate_manufacturer_name(id)?;
        self.journal(AuditLevel::Info, "manufacturer_remove", format!("manufacturer {id} removed"));
        Ok(())
    }

    pub fn remove_model(&mut self, id: ModelId) -> AccessResult<()> {
        self.sync()?;
        entity_repo::delete_row(self.conn, id)?;
        self.evict(id);
        self.journal(AuditLevel::Info, "model_remove", format!("model {id} removed"));
        Ok(())
    }

    fn journal(&self, level: AuditLevel, event: &str, message: String) {
        self.audit.record(level, event, &message);
    }

    fn notify(&mut self, kind: EntityKind, id: i64, column: &'static str) {
        let event = FieldEvent { kind, id, column };
        for observer in &mut self.observers {
            observer(&event);
        }
    }

    fn apply_change(&mut self, change: FieldChange) -> AccessResult<()> {
        let outcome = self
            .accessor
            .set_value(change.kind, change.id, change.column, &change.value)?;
        // A cascade earlier in the batch may have overwritten this field in
        // the snapshot; the last write wins in both places.
        if change.kind == EntityKind::Item {
            if let Some(handle) = self.items.get(ItemId::new(change.id)) {
                handle.borrow_mut().absorb(change.column, &change.value)?;
            }
        }
        if !outcome.changed {
            return Ok(());
        }
        self.after_write(change.kind, change.id, change.column, outcome.modified);

        match (change.kind, change.column) {
            (EntityKind::Item, columns::item::MODEL_ID) => {
                self.cascade_model_link(ItemId::new(change.id))
            }
            (EntityKind::Item, columns::item::CAT_ID) => {
                self.refresh_item_category(ItemId::new(change.id))
            }
            (EntityKind::Item, columns::item::MFR_ID) => {
                self.refresh_item_manufacturer(ItemId::new(change.id))
            }
            (EntityKind::Category, columns::category::NAME) => {
                self.propagate_category_name(CatId::new(change.id))
            }
            (EntityKind::Manufacturer, columns::manufacturer::NAME) => {
                self.propagate_manufacturer_name(MfrId::new(change.id))
            }
            (EntityKind::Model, columns::model::CAT_ID | columns::model::MFR_ID) => {
                self.refresh_model_names(ModelId::new(change.id))
            }
            _ => Ok(()),
        }
    }

    fn after_write(
        &mut self,
        kind: EntityKind,
        id: i64,
        column: &'static str,
        modified: Option<String>,
    ) {
        self.notify(kind, id, column);
        if let Some(modified) = modified {
            if let Some(handle) = self.items.get(ItemId::new(id)) {
                handle.borrow_mut().refresh_date_modified(modified);
            }
            self.notify(kind, id, columns::item::DATE_MODIFIED);
        }
    }

    fn cascade_model_link(&mut self, id: ItemId) -> AccessResult<()> {
        let handle = self.item(id)?;
        let model_id = handle.borrow().model_id();
        if model_id.is_none() {
            return Ok(());
        }

        let model = self.model(model_id)?;
        let writes = cascade::model_link_writes(&handle.borrow(), &model.borrow());
        let mut applied = 0;
        for write in &writes {
            let outcome = self.accessor.set(id, write.column, write.value.clone())?;
            handle.borrow_mut().absorb(write.column, &write.value)?;
            if outcome.changed {
                applied += 1;
                self.after_write(EntityKind::Item, id.value(), write.column, outcome.modified);
            }
        }

        self.refresh_item_category(id)?;
        self.refresh_item_manufacturer(id)?;
        info!(
            "event=model_cascade module=inventory status=ok item_id={} model_id={} planned={} applied={}",
            id,
            model_id,
            writes.len(),
            applied
        );
        Ok(())
    }

    fn category_name(&mut self, id: CatId) -> AccessResult<String> {
        if id.is_none() {
            return Ok(String::new());
        }
        match self.category(id) {
            Ok(handle) => Ok(handle.borrow().name().to_string()),
            Err(AccessError::NotFound { .. }) => {
                warn!("event=name_lookup module=inventory status=error kind=category id={id} error_code=not_found");
                Ok(String::new())
            }
            Err(err) => Err(err),
        }
    }

    fn manufacturer_name(&mut self, id: MfrId) -> AccessResult<String> {
        if id.is_none() {
            return Ok(String::new());
        }
        match self.manufacturer(id) {
            Ok(handle) => Ok(handle.borrow().name().to_string()),
            Err(AccessError::NotFound { .. }) => {
                warn!("event=name_lookup module=inventory status=error kind=manufacturer id={id} error_code=not_found");
                Ok(String::new())
            }
            Err(err) => Err(err),
        }
    }

    fn refresh_item_category(&mut self, id: ItemId) -> AccessResult<()> {
        let Some(handle) = self.items.get(id) else {
            return Ok(());
        };
        let cat_id = handle.borrow().cat_id();
        let name = self.category_name(cat_id)?;
        handle.borrow_mut().refresh_category_name(name);
        Ok(())
    }

    fn refresh_item_manufacturer(&mut self, id: ItemId) -> AccessResult<()> {
        let Some(handle) = self.items.get(id) else {
            return Ok(());
        };
        let mfr_id = handle.borrow().mfr_id();
        let name = self.manufacturer_name(mfr_id)?;
        handle.borrow_mut().refresh_manufacturer_name(name);
        Ok(())
    }

    fn refresh_model_names(&mut self, id: ModelId) -> AccessResult<()> {
        let Some(handle) = self.models.get(id) else {
            return Ok(());
        };
        let (cat_id, mfr_id) = {
            let model = handle.borrow();
            (model.cat_id(), model.mfr_id())
        };
        let category = self.category_name(cat_id)?;
        let manufacturer = self.manufacturer_name(mfr_id)?;
        let mut model = handle.borrow_mut();
        model.refresh_category_name(category);
        model.refresh_manufacturer_name(manufacturer);
        Ok(())
    }

    fn propagate_category_name(&mut self, id: CatId) -> AccessResult<()> {
        let name = self.category_name(id)?;
        for handle in self.items.handles() {
            let mut item = handle.borrow_mut();
            if item.cat_id() == id {
                item.refresh_category_name(name.clone());
            }
        }
        for handle in self.models.handles() {
            let mut model = handle.borrow_mut();
            if model.cat_id() == id {
                model.refresh_category_name(name.clone());
            }
        }
        Ok(())
    }

    fn propagate_manufacturer_name(&mut self, id: MfrId) -> AccessResult<()> {
        let name = self.manufacturer_name(id)?;
        for handle in self.items.handles() {
            let mut item = handle.borrow_mut();
            if item.mfr_id() == id {
                item.refresh_manufacturer_name(name.clone());
            }
        }
        for handle in self.models.handles() {
            let mut model = handle.borrow_mut();
            if model.mfr_id() == id {
                model.refresh_manufacturer_name(name.clone());
            }
        }
        Ok(())
    }
}

/// Hands a snapshot its own sink on the shared channel, remembered so
/// eviction can close it.
fn link(
    links: &mut HashMap<(EntityKind, i64), ChangeSink>,
    sink: &ChangeSink,
    kind: EntityKind,
    id: i64,
) -> ChangeSink {
    let linked = sink.linked();
    links.insert((kind, id), linked.clone());
    linked
}

impl ItemId {
    /// Resolves this id through the inventory cache.
    pub fn resolve(self, inventory: &mut Inventory<'_>) -> AccessResult<EntityHandle<Item>> {
        inventory.item(self)
    }
}

impl CatId {
    pub fn resolve(self, inventory: &mut Inventory<'_>) -> AccessResult<EntityHandle<Category>> {
        inventory.category(self)
    }
}

impl MfrId {
    pub fn resolve(
        self,
        inventory: &mut Inventory<'_>,
    ) -> AccessResult<EntityHandle<Manufacturer>> {
        inventory.manufacturer(self)
    }
}

impl ModelId {
    pub fn resolve(self, inventory: &mut Inventory<'_>) -> AccessResult<EntityHandle<Model>> {
        inventory.model(self)
    }
}
