//! Pre-step / post-step registration lists with deferred unregistration.

use indexmap::IndexSet;
use rsim_core::ComponentId;

/// Components registered for one tick hook, in registration order.
///
/// While a round is in progress, unregistration is queued and applied
/// by [`end_round`](Self::end_round); everything else applies at once.
#[derive(Debug, Default)]
pub(crate) struct TickList {
    members: IndexSet<ComponentId>,
    in_round: bool,
    deferred: Vec<ComponentId>,
}

impl TickList {
    /// Returns `false` if already registered.
    pub(crate) fn register(&mut self, id: ComponentId) -> bool {
        if let Some(pos) = self.deferred.iter().position(|d| *d == id) {
            // Re-registered in the same round it unregistered.
            self.deferred.swap_remove(pos);
            return true;
        }
        self.members.insert(id)
    }

    /// Returns `false` if not registered.
    pub(crate) fn unregister(&mut self, id: ComponentId) -> bool {
        if !self.is_registered(id) {
            return false;
        }
        if self.in_round {
            self.deferred.push(id);
        } else {
            self.members.shift_remove(&id);
        }
        true
    }

    pub(crate) fn is_registered(&self, id: ComponentId) -> bool {
        self.members.contains(&id) && !self.deferred.contains(&id)
    }

    /// Start a round. Returns the members to call, fixed for the round.
    pub(crate) fn begin_round(&mut self) -> Vec<ComponentId> {
        self.in_round = true;
        self.members.iter().copied().collect()
    }

    /// Finish the round and apply queued unregistrations.
    pub(crate) fn end_round(&mut self) {
        self.in_round = false;
        for id in self.deferred.drain(..) {
            self.members.shift_remove(&id);
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.members.len() - self.deferred.len()
    }
}
