//! In-process change feed and live-collection reconciliation.
//!
//! Row mutations are broadcast as [`ChangeEvent`]s; consumers hold a
//! scoped [`LiveCollection`] and patch it from the feed. Inserts are
//! deduplicated by row id (an optimistic local insert and the feed
//! delivery of the same row must not produce two copies). Updates and
//! deletes are not diffed in place: the collection is marked stale and
//! the consumer refetches the whole scope from the database.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

const FEED_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOp {
    Insert,
    Update,
    Delete,
}

/// A single row-level change, carrying the full row as JSON so
/// subscribers can filter without another query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: String,
    pub op: ChangeOp,
    pub row_id: Uuid,
    pub row: serde_json::Value,
}

impl ChangeEvent {
    pub fn insert(table: impl Into<String>, row_id: Uuid, row: serde_json::Value) -> Self {
        Self { table: table.into(), op: ChangeOp::Insert, row_id, row }
    }

    pub fn update(table: impl Into<String>, row_id: Uuid, row: serde_json::Value) -> Self {
        Self { table: table.into(), op: ChangeOp::Update, row_id, row }
    }

    pub fn delete(table: impl Into<String>, row_id: Uuid, row: serde_json::Value) -> Self {
        Self { table: table.into(), op: ChangeOp::Delete, row_id, row }
    }
}

/// Broadcast bus fanning row changes out to every open subscription.
#[derive(Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(FEED_CAPACITY);
        Self { tx }
    }

    /// Emit an event to all current subscribers. Returns the number of
    /// subscriptions that received it (0 when nobody is listening).
    pub fn emit(&self, event: ChangeEvent) -> usize {
        match self.tx.send(event) {
            Ok(n) => n,
            Err(_) => 0,
        }
    }

    pub fn subscribe(&self) -> FeedSubscription {
        FeedSubscription { rx: self.tx.subscribe() }
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// A live subscription to the change feed.
///
/// Teardown is the `Drop` impl: dropping the subscription detaches the
/// receiver immediately and unconditionally, so a consumer that has gone
/// away can never be delivered another event.
pub struct FeedSubscription {
    rx: broadcast::Receiver<ChangeEvent>,
}

#[derive(Debug, Clone)]
pub enum FeedItem {
    Event(ChangeEvent),
    /// The receiver fell behind and `skipped` events were dropped; the
    /// scoped collection can no longer be patched incrementally and
    /// should be refetched.
    Lagged(u64),
}

impl FeedSubscription {
    /// Await the next feed item. `None` once the feed itself is gone.
    pub async fn next(&mut self) -> Option<FeedItem> {
        match self.rx.recv().await {
            Ok(event) => Some(FeedItem::Event(event)),
            Err(broadcast::error::RecvError::Lagged(skipped)) => Some(FeedItem::Lagged(skipped)),
            Err(broadcast::error::RecvError::Closed) => None,
        }
    }
}

/// Types that expose the row id events are deduplicated on.
pub trait Keyed {
    fn key(&self) -> Uuid;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Appended at the end, in receipt order.
    Inserted,
    /// An item with this id is already present; the event was discarded.
    Duplicate,
    /// The change cannot be patched in place; the collection is stale
    /// and the caller should refetch the full scope.
    NeedsRefetch,
}

/// A local materialization of one scoped query, kept consistent with
/// the backend by applying feed events.
#[derive(Debug)]
pub struct LiveCollection<T: Keyed> {
    items: Vec<T>,
    stale: bool,
}

impl<T: Keyed> LiveCollection<T> {
    pub fn new() -> Self {
        Self { items: Vec::new(), stale: false }
    }

    pub fn from_items(items: Vec<T>) -> Self {
        Self { items, stale: false }
    }

    /// Apply one event. Inserts deduplicate on id; anything else marks
    /// the collection stale.
    pub fn apply(&mut self, op: ChangeOp, item: Option<T>) -> Applied {
        match (op, item) {
            (ChangeOp::Insert, Some(item)) => {
                if self.apply_insert(item) {
                    Applied::Inserted
                } else {
                    Applied::Duplicate
                }
            }
            _ => {
                self.mark_stale();
                Applied::NeedsRefetch
            }
        }
    }

    /// Append unless an item with the same id is already held. Returns
    /// true when the item was appended.
    pub fn apply_insert(&mut self, item: T) -> bool {
        let id = item.key();
        if self.items.iter().any(|existing| existing.key() == id) {
            return false;
        }
        self.items.push(item);
        true
    }

    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Reconcile after a full refetch of the scope.
    pub fn replace_all(&mut self, items: Vec<T>) {
        self.items = items;
        self.stale = false;
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Keyed> Default for LiveCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: Uuid,
        body: &'static str,
    }

    impl Keyed for Row {
        fn key(&self) -> Uuid {
            self.id
        }
    }

    fn row(body: &'static str) -> Row {
        Row { id: Uuid::new_v4(), body }
    }

    #[test]
    fn insert_is_idempotent() {
        let mut coll = LiveCollection::new();
        let r = row("hello");

        assert_eq!(coll.apply(ChangeOp::Insert, Some(r.clone())), Applied::Inserted);
        assert_eq!(coll.apply(ChangeOp::Insert, Some(r.clone())), Applied::Duplicate);

        assert_eq!(coll.len(), 1);
        assert_eq!(coll.items()[0], r);
        assert!(!coll.is_stale());
    }

    #[test]
    fn inserts_keep_receipt_order() {
        let mut coll = LiveCollection::new();
        let (a, b, c) = (row("a"), row("b"), row("c"));

        coll.apply_insert(a.clone());
        coll.apply_insert(b.clone());
        coll.apply_insert(b.clone()); // duplicate delivery in the middle
        coll.apply_insert(c.clone());

        let bodies: Vec<_> = coll.items().iter().map(|r| r.body).collect();
        assert_eq!(bodies, vec!["a", "b", "c"]);
    }

    #[test]
    fn update_and_delete_force_refetch() {
        let mut coll = LiveCollection::from_items(vec![row("a")]);

        assert_eq!(coll.apply(ChangeOp::Update, Some(row("a2"))), Applied::NeedsRefetch);
        assert!(coll.is_stale());

        coll.replace_all(vec![row("a2"), row("b")]);
        assert!(!coll.is_stale());
        assert_eq!(coll.len(), 2);

        assert_eq!(coll.apply(ChangeOp::Delete, None), Applied::NeedsRefetch);
        assert!(coll.is_stale());
    }

    #[tokio::test]
    async fn feed_fans_out_to_all_subscribers() {
        let feed = ChangeFeed::new();
        let mut sub1 = feed.subscribe();
        let mut sub2 = feed.subscribe();

        let event = ChangeEvent::insert("chat_messages", Uuid::new_v4(), serde_json::json!({}));
        assert_eq!(feed.emit(event.clone()), 2);

        match sub1.next().await {
            Some(FeedItem::Event(e)) => assert_eq!(e.row_id, event.row_id),
            other => panic!("unexpected item: {other:?}"),
        }
        match sub2.next().await {
            Some(FeedItem::Event(e)) => assert_eq!(e.row_id, event.row_id),
            other => panic!("unexpected item: {other:?}"),
        }
    }

    #[tokio::test]
    async fn dropped_subscription_stops_receiving() {
        let feed = ChangeFeed::new();
        let sub = feed.subscribe();
        drop(sub);

        let event = ChangeEvent::insert("friendships", Uuid::new_v4(), serde_json::json!({}));
        assert_eq!(feed.emit(event), 0);
    }
}
