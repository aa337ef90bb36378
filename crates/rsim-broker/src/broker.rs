//! The [`MessageBroker`]: subscription table plus batched delivery.
//!
//! # Batching
//!
//! The broker keeps two [`BatchBuffer`]s. `publish` always appends to
//! the *pending* buffer. `drain_batch` flips which buffer is pending,
//! then delivers everything in the buffer it just retired. A handler
//! that publishes during delivery therefore writes into the new pending
//! buffer, and its message is delivered by the next `drain_batch` call,
//! never by the current one.
//!
//! # Ordering
//!
//! Within one batch the broker walks component priority from highest to
//! lowest, and within each component priority, message priority from
//! highest to lowest. Each cell of that grid lists the components with
//! queued work in first-publish order; each component's queue is FIFO.

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use rsim_core::{ComponentId, Message, MessageType, Priority};
use slotmap::SecondaryMap;
use tracing::{debug, trace, warn};

use crate::error::BrokerError;
use crate::mailbox::BatchBuffer;

// ── BrokerStats ─────────────────────────────────────────────────

/// Cumulative delivery counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BrokerStats {
    /// Messages handed to `publish`.
    pub published: u64,
    /// Published messages that had no subscribers and were dropped.
    pub discarded: u64,
    /// Handler invocations (one per subscriber per message).
    pub delivered: u64,
    /// Completed `drain_batch` calls.
    pub batches: u64,
}

// ── Subscriber ──────────────────────────────────────────────────

struct Subscriber {
    priority: Priority,
    /// Reverse index for `unsubscribe_all`.
    types: IndexSet<MessageType>,
}

// ── MessageBroker ───────────────────────────────────────────────

/// Maps message types to subscribed components and batches deliveries.
///
/// Components must be [`attach`](Self::attach)ed (with their priority)
/// before they can subscribe. Subscriptions have set semantics:
/// subscribing the same `(component, type)` pair twice is a no-op.
///
/// # Examples
///
/// ```
/// use rsim_broker::MessageBroker;
/// use rsim_core::{ComponentId, KeyPressed, Message, MessageKind, Priority};
/// use slotmap::SlotMap;
///
/// let mut ids: SlotMap<ComponentId, ()> = SlotMap::with_key();
/// let a = ids.insert(());
///
/// let mut broker = MessageBroker::new();
/// broker.attach(a, Priority::Normal).unwrap();
/// broker.subscribe(a, KeyPressed::TYPE).unwrap();
/// broker.publish(Message::new(KeyPressed { key: 32 }));
///
/// let mut seen = Vec::new();
/// broker.drain_batch(|_, id, msg| seen.push((id, msg.decode::<KeyPressed>())));
/// assert_eq!(seen, vec![(a, Some(KeyPressed { key: 32 }))]);
/// ```
pub struct MessageBroker {
    subscriptions: IndexMap<MessageType, IndexSet<ComponentId>>,
    subscribers: SecondaryMap<ComponentId, Subscriber>,
    buffers: [BatchBuffer; 2],
    /// Index of the buffer that receives `publish`.
    pending: usize,
    draining: bool,
    stats: BrokerStats,
}

impl MessageBroker {
    /// Create an empty broker.
    pub fn new() -> Self {
        Self {
            subscriptions: IndexMap::new(),
            subscribers: SecondaryMap::new(),
            buffers: Default::default(),
            pending: 0,
            draining: false,
            stats: BrokerStats::default(),
        }
    }

    // ── Membership ──────────────────────────────────────────────

    /// Register a component and its delivery priority.
    pub fn attach(&mut self, id: ComponentId, priority: Priority) -> Result<(), BrokerError> {
        if self.subscribers.contains_key(id) {
            return Err(BrokerError::AlreadyAttached(id));
        }
        self.subscribers.insert(
            id,
            Subscriber {
                priority,
                types: IndexSet::new(),
            },
        );
        debug!(component = %id, %priority, "attached to broker");
        Ok(())
    }

    /// Remove a component: drops its subscriptions and everything queued
    /// for it in the pending batch.
    ///
    /// Messages already retired into a batch that is being delivered are
    /// not touched; the caller is expected to skip detached ids.
    pub fn detach(&mut self, id: ComponentId) -> Result<(), BrokerError> {
        self.unsubscribe_all(id)?;
        let Some(sub) = self.subscribers.remove(id) else {
            return Err(BrokerError::UnknownComponent(id));
        };
        let dropped = self.buffers[self.pending].purge(id, sub.priority);
        debug!(component = %id, dropped, "detached from broker");
        Ok(())
    }

    /// Whether the component is attached.
    pub fn is_attached(&self, id: ComponentId) -> bool {
        self.subscribers.contains_key(id)
    }

    /// Delivery priority the component was attached with.
    pub fn priority_of(&self, id: ComponentId) -> Option<Priority> {
        self.subscribers.get(id).map(|s| s.priority)
    }

    // ── Subscriptions ───────────────────────────────────────────

    /// Subscribe `id` to `message_type`.
    ///
    /// Returns `Ok(false)` if the subscription already existed.
    pub fn subscribe(&mut self, id: ComponentId, message_type: MessageType) -> Result<bool, BrokerError> {
        let sub = self
            .subscribers
            .get_mut(id)
            .ok_or(BrokerError::UnknownComponent(id))?;
        if !sub.types.insert(message_type) {
            return Ok(false);
        }
        self.subscriptions.entry(message_type).or_default().insert(id);
        trace!(component = %id, %message_type, "subscribed");
        Ok(true)
    }

    /// Remove one subscription.
    ///
    /// Returns `Ok(false)` if `id` was not subscribed to `message_type`.
    /// Messages already queued for `id` stay queued.
    pub fn unsubscribe(&mut self, id: ComponentId, message_type: MessageType) -> Result<bool, BrokerError> {
        let sub = self
            .subscribers
            .get_mut(id)
            .ok_or(BrokerError::UnknownComponent(id))?;
        if !sub.types.shift_remove(&message_type) {
            return Ok(false);
        }
        self.remove_from_table(id, message_type);
        trace!(component = %id, %message_type, "unsubscribed");
        Ok(true)
    }

    /// Remove every subscription of `id`. Returns how many were removed.
    pub fn unsubscribe_all(&mut self, id: ComponentId) -> Result<usize, BrokerError> {
        let sub = self
            .subscribers
            .get_mut(id)
            .ok_or(BrokerError::UnknownComponent(id))?;
        let types = std::mem::take(&mut sub.types);
        for message_type in &types {
            self.remove_from_table(id, *message_type);
        }
        Ok(types.len())
    }

    fn remove_from_table(&mut self, id: ComponentId, message_type: MessageType) {
        if let Some(set) = self.subscriptions.get_mut(&message_type) {
            set.shift_remove(&id);
            if set.is_empty() {
                self.subscriptions.shift_remove(&message_type);
            }
        }
    }

    /// Whether `id` is subscribed to `message_type`.
    pub fn is_subscribed(&self, id: ComponentId, message_type: MessageType) -> bool {
        self.subscribers
            .get(id)
            .is_some_and(|s| s.types.contains(&message_type))
    }

    /// Subscribers of `message_type`, in subscription order.
    pub fn subscribers(&self, message_type: MessageType) -> impl Iterator<Item = ComponentId> + '_ {
        self.subscriptions
            .get(&message_type)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Number of message types `id` is subscribed to.
    pub fn subscription_count(&self, id: ComponentId) -> usize {
        self.subscribers.get(id).map_or(0, |s| s.types.len())
    }

    // ── Publish / drain ─────────────────────────────────────────

    /// Queue `message` for every current subscriber of its type.
    ///
    /// The message lands in the pending batch, never in a batch that is
    /// being delivered. With no subscribers it is dropped immediately.
    /// Returns the number of subscribers it was queued for.
    pub fn publish(&mut self, message: Message) -> usize {
        self.stats.published += 1;
        let message_type = message.message_type();
        let Some(set) = self.subscriptions.get(&message_type) else {
            self.stats.discarded += 1;
            trace!(%message_type, "no subscribers, message discarded");
            return 0;
        };

        let message = Arc::new(message);
        let buffer = &mut self.buffers[self.pending];
        let mut queued = 0;
        for &id in set {
            let Some(sub) = self.subscribers.get(id) else {
                continue;
            };
            if buffer.enqueue(id, sub.priority, &message) {
                queued += 1;
            }
        }
        if queued == 0 {
            self.stats.discarded += 1;
        }
        queued
    }

    /// Deliver the pending batch.
    ///
    /// `deliver` is invoked once per `(component, message)` pair, in
    /// priority order. It receives the broker so handlers can publish,
    /// subscribe or unsubscribe; anything they publish is delivered by
    /// the next call. Every message of the batch is dropped before this
    /// returns. Returns the number of deliveries.
    ///
    /// A nested call from inside `deliver` delivers nothing and returns 0.
    pub fn drain_batch<F>(&mut self, mut deliver: F) -> usize
    where
        F: FnMut(&mut MessageBroker, ComponentId, &Message),
    {
        if self.draining {
            warn!("drain_batch called while a batch is being delivered; ignoring");
            return 0;
        }

        let retired = self.pending;
        self.pending ^= 1;
        self.draining = true;
        let mut batch = std::mem::take(&mut self.buffers[retired]);

        let mut delivered = 0;
        for cp in 0..Priority::COUNT {
            for mp in 0..Priority::COUNT {
                let cell = batch.take_cell(cp, mp);
                for &id in &cell {
                    let queue = batch.take_queue(id, mp);
                    for message in &queue {
                        trace!(component = %id, message_type = %message.message_type(), "deliver");
                        deliver(self, id, message);
                        delivered += 1;
                    }
                }
            }
        }

        batch.clear();
        self.buffers[retired] = batch;
        self.draining = false;
        self.stats.delivered += delivered as u64;
        self.stats.batches += 1;
        delivered
    }

    /// Whether a batch is currently being delivered.
    pub fn is_draining(&self) -> bool {
        self.draining
    }

    // ── Introspection ───────────────────────────────────────────

    /// Deliveries queued for the next batch.
    pub fn pending_deliveries(&self) -> usize {
        self.buffers[self.pending].queued()
    }

    /// Whether `id` has anything queued for the next batch.
    pub fn has_pending(&self, id: ComponentId) -> bool {
        self.buffers[self.pending].has_pending(id)
    }

    /// Components with queued work for the next batch, in delivery order.
    ///
    /// Reads the active index only; idle components are never visited.
    pub fn active_components(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.buffers[self.pending].active_components()
    }

    /// Cumulative counters.
    pub fn stats(&self) -> BrokerStats {
        self.stats
    }

    #[cfg(test)]
    fn check_invariant(&self) {
        let prio = |id| self.priority_of(id).unwrap_or_default();
        self.buffers[0].check_invariant(prio);
        self.buffers[1].check_invariant(prio);
    }
}

impl Default for MessageBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MessageBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageBroker")
            .field("message_types", &self.subscriptions.len())
            .field("subscribers", &self.subscribers.len())
            .field("pending_deliveries", &self.pending_deliveries())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsim_core::{KeyPressed, MessageKind};
    use slotmap::SlotMap;

    const T: MessageType = MessageType::new(10, 0);
    const U: MessageType = MessageType::new(11, 0);

    fn ids(n: usize) -> Vec<ComponentId> {
        let mut map: SlotMap<ComponentId, ()> = SlotMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    fn collect(broker: &mut MessageBroker) -> Vec<(ComponentId, MessageType, Priority)> {
        let mut out = Vec::new();
        broker.drain_batch(|_, id, m| out.push((id, m.message_type(), m.priority())));
        out
    }

    #[test]
    fn subscribe_is_idempotent() {
        let c = ids(1)[0];
        let mut b = MessageBroker::new();
        b.attach(c, Priority::Normal).unwrap();
        assert!(b.subscribe(c, T).unwrap());
        assert!(!b.subscribe(c, T).unwrap());
        assert_eq!(b.subscribers(T).count(), 1);

        b.publish(Message::signal(T));
        assert_eq!(collect(&mut b).len(), 1);
        b.check_invariant();
    }

    #[test]
    fn unknown_component_is_rejected() {
        let c = ids(1)[0];
        let mut b = MessageBroker::new();
        assert_eq!(b.subscribe(c, T), Err(BrokerError::UnknownComponent(c)));
        b.attach(c, Priority::Normal).unwrap();
        assert_eq!(b.attach(c, Priority::Lower), Err(BrokerError::AlreadyAttached(c)));
    }

    #[test]
    fn no_subscribers_discards() {
        let mut b = MessageBroker::new();
        assert_eq!(b.publish(Message::signal(T)), 0);
        assert_eq!(b.pending_deliveries(), 0);
        assert!(collect(&mut b).is_empty());
        assert_eq!(b.stats().discarded, 1);
        assert_eq!(b.stats().delivered, 0);
    }

    #[test]
    fn component_priority_orders_delivery() {
        let c = ids(3);
        let mut b = MessageBroker::new();
        b.attach(c[0], Priority::Lowest).unwrap();
        b.attach(c[1], Priority::Highest).unwrap();
        b.attach(c[2], Priority::Normal).unwrap();
        for id in &c {
            b.subscribe(*id, T).unwrap();
        }
        b.publish(Message::signal(T));
        let order: Vec<_> = collect(&mut b).into_iter().map(|(id, _, _)| id).collect();
        assert_eq!(order, vec![c[1], c[2], c[0]]);
    }

    #[test]
    fn message_priority_orders_within_component() {
        let c = ids(1)[0];
        let mut b = MessageBroker::new();
        b.attach(c, Priority::Normal).unwrap();
        b.subscribe(c, T).unwrap();
        b.publish(Message::from_parts(T, Priority::Lowest, Default::default()));
        b.publish(Message::from_parts(T, Priority::Normal, Default::default()));
        b.publish(Message::from_parts(T, Priority::Highest, Default::default()));
        b.check_invariant();
        let prios: Vec<_> = collect(&mut b).into_iter().map(|(_, _, p)| p).collect();
        assert_eq!(prios, vec![Priority::Highest, Priority::Normal, Priority::Lowest]);
    }

    #[test]
    fn fifo_within_bucket() {
        let c = ids(1)[0];
        let mut b = MessageBroker::new();
        b.attach(c, Priority::Normal).unwrap();
        b.subscribe(c, KeyPressed::TYPE).unwrap();
        for key in 0..5 {
            b.publish(Message::new(KeyPressed { key }));
        }
        let mut keys = Vec::new();
        b.drain_batch(|_, _, m| keys.push(m.decode::<KeyPressed>().unwrap().key));
        assert_eq!(keys, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn publish_during_drain_lands_in_next_batch() {
        let c = ids(1)[0];
        let mut b = MessageBroker::new();
        b.attach(c, Priority::Normal).unwrap();
        b.subscribe(c, T).unwrap();
        b.publish(Message::signal(T));

        let mut first = 0;
        b.drain_batch(|broker, _, _| {
            first += 1;
            broker.publish(Message::signal(T));
        });
        assert_eq!(first, 1);
        assert_eq!(b.pending_deliveries(), 1);
        b.check_invariant();

        assert_eq!(collect(&mut b).len(), 1);
        assert_eq!(b.pending_deliveries(), 0);
    }

    #[test]
    fn nested_drain_is_ignored() {
        let c = ids(1)[0];
        let mut b = MessageBroker::new();
        b.attach(c, Priority::Normal).unwrap();
        b.subscribe(c, T).unwrap();
        b.publish(Message::signal(T));
        let mut nested = usize::MAX;
        b.drain_batch(|broker, _, _| {
            broker.publish(Message::signal(T));
            nested = broker.drain_batch(|_, _, _| {});
        });
        assert_eq!(nested, 0);
        assert_eq!(b.pending_deliveries(), 1);
    }

    #[test]
    fn detach_purges_pending_and_subscriptions() {
        let c = ids(2);
        let mut b = MessageBroker::new();
        b.attach(c[0], Priority::Normal).unwrap();
        b.attach(c[1], Priority::Normal).unwrap();
        b.subscribe(c[0], T).unwrap();
        b.subscribe(c[0], U).unwrap();
        b.subscribe(c[1], T).unwrap();
        b.publish(Message::signal(T));
        b.publish(Message::signal(U));
        assert_eq!(b.pending_deliveries(), 3);

        b.detach(c[0]).unwrap();
        b.check_invariant();
        assert!(!b.is_attached(c[0]));
        assert_eq!(b.pending_deliveries(), 1);
        assert_eq!(b.subscribers(U).count(), 0);
        let got: Vec<_> = collect(&mut b).into_iter().map(|(id, _, _)| id).collect();
        assert_eq!(got, vec![c[1]]);
    }

    #[test]
    fn unsubscribe_all_reports_count() {
        let c = ids(1)[0];
        let mut b = MessageBroker::new();
        b.attach(c, Priority::Normal).unwrap();
        b.subscribe(c, T).unwrap();
        b.subscribe(c, U).unwrap();
        assert_eq!(b.unsubscribe_all(c), Ok(2));
        assert_eq!(b.subscription_count(c), 0);
        assert!(!b.is_subscribed(c, T));
        assert_eq!(b.publish(Message::signal(T)), 0);
    }

    #[test]
    fn active_components_lists_only_pending_work() {
        let c = ids(3);
        let mut b = MessageBroker::new();
        for id in &c {
            b.attach(*id, Priority::Normal).unwrap();
        }
        b.subscribe(c[2], T).unwrap();
        b.subscribe(c[2], U).unwrap();
        b.publish(Message::signal(T));
        b.publish(Message::from_parts(U, Priority::Highest, Default::default()));
        let active: Vec<_> = b.active_components().collect();
        assert_eq!(active, vec![c[2]]);
        assert!(b.has_pending(c[2]));
        assert!(!b.has_pending(c[0]));
    }
}
