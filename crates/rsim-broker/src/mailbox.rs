//! Per-component message queues and the active index of one batch buffer.

use std::collections::VecDeque;
use std::sync::Arc;

use rsim_core::{ComponentId, Message, Priority};
use slotmap::SecondaryMap;

/// One FIFO queue per message priority.
#[derive(Default)]
pub(crate) struct Mailbox {
    queues: [VecDeque<Arc<Message>>; Priority::COUNT],
}

impl Mailbox {
    fn is_empty(&self) -> bool {
        self.queues.iter().all(VecDeque::is_empty)
    }

    fn len(&self) -> usize {
        self.queues.iter().map(VecDeque::len).sum()
    }
}

/// Everything queued for one batch.
///
/// Invariant: `mailboxes[c].queues[p]` is non-empty iff `c` appears
/// exactly once in `active[priority(c)][p]`.
#[derive(Default)]
pub(crate) struct BatchBuffer {
    mailboxes: SecondaryMap<ComponentId, Mailbox>,
    /// Indexed `[component priority][message priority]`, in first-publish order.
    active: [[Vec<ComponentId>; Priority::COUNT]; Priority::COUNT],
    queued: usize,
}

impl BatchBuffer {
    /// Append `message` to `id`'s queue, indexing `id` if the bucket was empty.
    pub(crate) fn enqueue(
        &mut self,
        id: ComponentId,
        component_priority: Priority,
        message: &Arc<Message>,
    ) -> bool {
        let Some(entry) = self.mailboxes.entry(id) else {
            return false;
        };
        let mp = message.priority().index();
        let queue = &mut entry.or_default().queues[mp];
        if queue.is_empty() {
            self.active[component_priority.index()][mp].push(id);
        }
        queue.push_back(Arc::clone(message));
        self.queued += 1;
        true
    }

    /// Drop everything queued for `id`. Returns the number of messages dropped.
    pub(crate) fn purge(&mut self, id: ComponentId, component_priority: Priority) -> usize {
        let Some(mailbox) = self.mailboxes.remove(id) else {
            return 0;
        };
        for cell in &mut self.active[component_priority.index()] {
            cell.retain(|c| *c != id);
        }
        let dropped = mailbox.len();
        self.queued -= dropped;
        dropped
    }

    /// Take the component list of one active-index cell.
    pub(crate) fn take_cell(&mut self, cp: usize, mp: usize) -> Vec<ComponentId> {
        std::mem::take(&mut self.active[cp][mp])
    }

    /// Take `id`'s queue for message priority `mp`.
    pub(crate) fn take_queue(&mut self, id: ComponentId, mp: usize) -> VecDeque<Arc<Message>> {
        match self.mailboxes.get_mut(id) {
            Some(mailbox) => std::mem::take(&mut mailbox.queues[mp]),
            None => VecDeque::new(),
        }
    }

    /// Reset after delivery, keeping the cell allocations.
    pub(crate) fn clear(&mut self) {
        self.mailboxes.clear();
        for row in &mut self.active {
            for cell in row {
                cell.clear();
            }
        }
        self.queued = 0;
    }

    pub(crate) fn queued(&self) -> usize {
        self.queued
    }

    pub(crate) fn has_pending(&self, id: ComponentId) -> bool {
        self.mailboxes.get(id).is_some_and(|m| !m.is_empty())
    }

    /// Components with queued work, in delivery order. Never visits idle
    /// components.
    pub(crate) fn active_components(&self) -> impl Iterator<Item = ComponentId> + '_ {
        let mut seen = SecondaryMap::new();
        self.active
            .iter()
            .flat_map(|row| row.iter().flatten().copied())
            .filter(move |id| seen.insert(*id, ()).is_none())
    }

    /// Check the mailbox/active-index invariant.
    #[cfg(test)]
    pub(crate) fn check_invariant(&self, priority_of: impl Fn(ComponentId) -> Priority) {
        let mut total = 0;
        for (id, mailbox) in &self.mailboxes {
            let cp = priority_of(id).index();
            for (mp, queue) in mailbox.queues.iter().enumerate() {
                let hits = self.active[cp][mp].iter().filter(|c| **c == id).count();
                if queue.is_empty() {
                    assert_eq!(hits, 0, "{id} indexed at [{cp}][{mp}] with an empty queue");
                } else {
                    assert_eq!(hits, 1, "{id} must be indexed once at [{cp}][{mp}]");
                }
                total += queue.len();
            }
        }
        for row in &self.active {
            for cell in row {
                for id in cell {
                    assert!(self.mailboxes.contains_key(*id), "{id} indexed without mailbox");
                }
            }
        }
        assert_eq!(total, self.queued);
    }
}
