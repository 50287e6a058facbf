//! Change messages flowing from entity snapshots to the persistence side.
//!
//! Entity setters never touch the store. They emit a `FieldChange` into the
//! channel wired at construction; the owning `Inventory` drains it and
//! persists. Store I/O scheduling stays out of the entity types.

use crate::model::coerce::RawValue;
use crate::model::ids::EntityKind;
use log::{debug, warn};
use serde::Serialize;
use std::cell::Cell;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, Sender};

/// One pending field write.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub kind: EntityKind,
    pub id: i64,
    pub column: &'static str,
    pub value: RawValue,
}

/// Notification delivered to observers after a change reached the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldEvent {
    pub kind: EntityKind,
    pub id: i64,
    pub column: &'static str,
}

/// Sending half of the change channel held by every live snapshot.
///
/// Clones share one open flag; `linked` starts a new flag so a single
/// snapshot can be cut off without touching the others.
#[derive(Debug, Clone)]
pub struct ChangeSink {
    tx: Sender<FieldChange>,
    open: Rc<Cell<bool>>,
}

impl ChangeSink {
    /// A sink on the same channel with its own open flag.
    pub fn linked(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            open: Rc::new(Cell::new(true)),
        }
    }

    /// Stops delivery from this sink and every clone sharing its flag.
    pub fn close(&self) {
        self.open.set(false);
    }

    pub fn is_open(&self) -> bool {
        self.open.get()
    }

    pub fn send(&self, kind: EntityKind, id: i64, column: &'static str, value: RawValue) {
        if !self.is_open() {
            debug!(
                "event=field_change module=change status=noop kind={} id={} column={} reason=detached",
                kind, id, column
            );
            return;
        }
        let change = FieldChange {
            kind,
            id,
            column,
            value,
        };
        if self.tx.send(change).is_err() {
            warn!(
                "event=field_change module=change status=error kind={} id={} column={} error_code=receiver_dropped",
                kind, id, column
            );
        }
    }
}

/// Creates a connected sink/receiver pair.
pub fn change_channel() -> (ChangeSink, Receiver<FieldChange>) {
    let (tx, rx) = mpsc::channel();
    (
        ChangeSink {
            tx,
            open: Rc::new(Cell::new(true)),
        },
        rx,
    )
}

#[cfg(test)]
mod tests {
    use super::change_channel;
    use crate::model::coerce::RawValue;
    use crate::model::ids::EntityKind;

    #[test]
    fn sink_delivers_changes_in_order() {
        let (sink, rx) = change_channel();
        sink.send(EntityKind::Item, 1, "Name", RawValue::from("a"));
        sink.send(EntityKind::Item, 1, "Stock", RawValue::I64(3));

        let first = rx.try_recv().unwrap();
        let second = rx.try_recv().unwrap();
        assert_eq!(first.column, "Name");
        assert_eq!(second.value, RawValue::I64(3));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn sending_after_receiver_drop_does_not_panic() {
        let (sink, rx) = change_channel();
        drop(rx);
        sink.send(EntityKind::Category, 2, "Name", RawValue::from("x"));
    }

    #[test]
    fn closing_a_linked_sink_leaves_the_root_open() {
        let (sink, rx) = change_channel();
        let link = sink.linked();
        let held_by_snapshot = link.clone();
        link.close();

        held_by_snapshot.send(EntityKind::Item, 1, "Name", RawValue::from("stale"));
        sink.send(EntityKind::Item, 2, "Name", RawValue::from("live"));

        let delivered = rx.try_recv().unwrap();
        assert_eq!(delivered.id, 2);
        assert!(rx.try_recv().is_err());
        assert!(sink.is_open());
        assert!(!held_by_snapshot.is_open());
    }
}
