//! Component ownership and the per-component lifecycle state machine.
//!
//! ```text
//! add ──► Added ──(safe point: init)──► Initialized
//!           │                               │
//!           └──── remove ──► PendingRemoval ◄┘
//!                                 │
//!                     (safe point or immediately)
//!                                 ▼
//!                              Removed
//! ```
//!
//! The registry is the single source of truth for whether a component
//! may receive hooks. Tick lists and the broker are cleaned eagerly when
//! removal is requested; the entry itself is dropped when the removal is
//! applied.

use std::collections::VecDeque;
use std::fmt;

use rsim_core::{Component, ComponentId, Priority};
use slotmap::SlotMap;

/// Where a component is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Attached, waiting for `init` at the next safe point.
    Added,
    /// `init` has run; the component receives ticks and messages.
    Initialized,
    /// Removal requested; applied at the next safe point.
    PendingRemoval,
    /// Gone. Also reported for ids this kernel does not know.
    Removed,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Added => "added",
            Self::Initialized => "initialized",
            Self::PendingRemoval => "pending-removal",
            Self::Removed => "removed",
        };
        f.write_str(s)
    }
}

pub(crate) struct Entry {
    /// `None` while one of the component's hooks is running.
    pub(crate) component: Option<Box<dyn Component>>,
    pub(crate) state: LifecycleState,
    pub(crate) name: String,
    pub(crate) priority: Priority,
    /// `init` ran, so `finish` is owed.
    pub(crate) initialized: bool,
}

#[derive(Default)]
pub(crate) struct Registry {
    entries: SlotMap<ComponentId, Entry>,
    pending_init: VecDeque<ComponentId>,
    pending_removal: VecDeque<ComponentId>,
}

impl Registry {
    pub(crate) fn insert(&mut self, component: Box<dyn Component>) -> ComponentId {
        let name = component.name().to_owned();
        let priority = component.priority();
        let id = self.entries.insert(Entry {
            component: Some(component),
            state: LifecycleState::Added,
            name,
            priority,
            initialized: false,
        });
        self.pending_init.push_back(id);
        id
    }

    pub(crate) fn state(&self, id: ComponentId) -> LifecycleState {
        self.entries
            .get(id)
            .map_or(LifecycleState::Removed, |e| e.state)
    }

    pub(crate) fn get(&self, id: ComponentId) -> Option<&Entry> {
        self.entries.get(id)
    }

    pub(crate) fn name(&self, id: ComponentId) -> &str {
        self.entries.get(id).map_or("<removed>", |e| e.name.as_str())
    }

    /// Take the component out of its slot for the duration of a hook.
    pub(crate) fn take(&mut self, id: ComponentId) -> Option<Box<dyn Component>> {
        self.entries.get_mut(id)?.component.take()
    }

    /// Put a component back after its hook returned.
    pub(crate) fn restore(&mut self, id: ComponentId, component: Box<dyn Component>) {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.component = Some(component);
        }
    }

    /// Record that `init` ran.
    pub(crate) fn mark_initialized(&mut self, id: ComponentId) {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.initialized = true;
            if entry.state == LifecycleState::Added {
                entry.state = LifecycleState::Initialized;
            }
        }
    }

    /// Move a live component to `PendingRemoval`. Returns `false` if it
    /// is unknown or already on its way out.
    pub(crate) fn request_removal(&mut self, id: ComponentId) -> bool {
        match self.entries.get_mut(id) {
            Some(entry)
                if matches!(entry.state, LifecycleState::Added | LifecycleState::Initialized) =>
            {
                entry.state = LifecycleState::PendingRemoval;
                self.pending_removal.push_back(id);
                true
            }
            _ => false,
        }
    }

    /// Next component still waiting for `init`.
    pub(crate) fn next_init(&mut self) -> Option<ComponentId> {
        while let Some(id) = self.pending_init.pop_front() {
            if self.state(id) == LifecycleState::Added {
                return Some(id);
            }
        }
        None
    }

    #[cfg(test)]
    pub(crate) fn has_pending_init(&self) -> bool {
        self.pending_init
            .iter()
            .any(|id| self.state(*id) == LifecycleState::Added)
    }

    /// Pop the next pending removal and drop its entry from the registry.
    pub(crate) fn next_removal(&mut self) -> Option<(ComponentId, Entry)> {
        while let Some(id) = self.pending_removal.pop_front() {
            if let Some(entry) = self.entries.remove(id) {
                return Some((id, entry));
            }
        }
        None
    }

    /// Drop an entry without any further transition.
    pub(crate) fn evict(&mut self, id: ComponentId) -> Option<Entry> {
        self.entries.remove(id)
    }

    /// Remove every entry, in insertion-slot order.
    pub(crate) fn drain(&mut self) -> Vec<(ComponentId, Entry)> {
        self.pending_init.clear();
        self.pending_removal.clear();
        self.entries.drain().collect()
    }

    /// Number of entries not yet removed.
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn ids(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.entries.keys()
    }
}
