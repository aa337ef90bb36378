//! Test utilities and mock types for rsim development.
//!
//! Provides mock collaborators ([`MockWorld`], [`MockVisWorld`]) whose
//! state stays observable through probes after they are moved into a
//! kernel, a shared [`EventLog`] for asserting call order across
//! components and collaborators, and the scriptable component in
//! [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rsim_core::{BodyId, CollaboratorError, PhysicsWorld, VisWorld};

pub use fixtures::ScriptedComponent;

// ── EventLog ─────────────────────────────────────────────────────

/// Shared, append-only list of event strings.
///
/// Clones share the same storage, so a test keeps one clone and hands
/// others to components and mocks.
#[derive(Clone, Debug, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, Vec<String>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, event: impl Into<String>) {
        self.inner().push(event.into());
    }

    /// Snapshot of all events so far.
    pub fn entries(&self) -> Vec<String> {
        self.inner().clone()
    }

    /// Events starting with `prefix`, in order.
    pub fn matching(&self, prefix: &str) -> Vec<String> {
        self.inner()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Number of events equal to `event`.
    pub fn count(&self, event: &str) -> usize {
        self.inner().iter().filter(|e| *e == event).count()
    }

    /// Index of the first event equal to `event`.
    pub fn position(&self, event: &str) -> Option<usize> {
        self.inner().iter().position(|e| e == event)
    }

    pub fn len(&self) -> usize {
        self.inner().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner().is_empty()
    }

    pub fn clear(&self) {
        self.inner().clear();
    }
}

// ── MockWorld ────────────────────────────────────────────────────

/// Observable state of a [`MockWorld`].
#[derive(Clone, Debug, Default)]
pub struct WorldProbe {
    steps: Arc<AtomicU64>,
    failing: Arc<AtomicBool>,
    done: Arc<AtomicBool>,
    last_step: Arc<Mutex<Option<(Duration, u32)>>>,
}

impl WorldProbe {
    /// Successful `step` calls so far.
    pub fn steps(&self) -> u64 {
        self.steps.load(Ordering::Acquire)
    }

    /// Make subsequent `step` calls fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Release);
    }

    /// Make `done()` report completion.
    pub fn set_done(&self, done: bool) {
        self.done.store(done, Ordering::Release);
    }

    /// Arguments of the most recent `step` call.
    pub fn last_step(&self) -> Option<(Duration, u32)> {
        *self.last_step.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Physics collaborator that records calls instead of simulating.
///
/// Logs `world:init`, `world:step`, and `world:finish`.
#[derive(Debug)]
pub struct MockWorld {
    log: EventLog,
    probe: WorldProbe,
    done_after: Option<u64>,
}

impl MockWorld {
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            probe: WorldProbe::default(),
            done_after: None,
        }
    }

    /// Report `done()` once `steps` successful steps have run.
    pub fn done_after(mut self, steps: u64) -> Self {
        self.done_after = Some(steps);
        self
    }

    pub fn probe(&self) -> WorldProbe {
        self.probe.clone()
    }
}

impl PhysicsWorld for MockWorld {
    fn init(&mut self) -> Result<(), CollaboratorError> {
        self.log.push("world:init");
        Ok(())
    }

    fn finish(&mut self) -> Result<(), CollaboratorError> {
        self.log.push("world:finish");
        Ok(())
    }

    fn step(&mut self, dt: Duration, substeps: u32) -> Result<(), CollaboratorError> {
        *self
            .probe
            .last_step
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some((dt, substeps));
        if self.probe.failing.load(Ordering::Acquire) {
            self.log.push("world:step-failed");
            return Err(CollaboratorError::StepFailed {
                reason: "mock failure".into(),
            });
        }
        self.log.push("world:step");
        self.probe.steps.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn done(&self) -> bool {
        self.probe.done.load(Ordering::Acquire)
            || self
                .done_after
                .is_some_and(|n| self.probe.steps.load(Ordering::Acquire) >= n)
    }
}

// ── MockVisWorld ─────────────────────────────────────────────────

/// Observable state of a [`MockVisWorld`].
#[derive(Clone, Debug, Default)]
pub struct VisProbe {
    frames: Arc<AtomicU64>,
    closed: Arc<AtomicBool>,
    bodies: Arc<Mutex<Vec<BodyId>>>,
}

impl VisProbe {
    /// Frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }

    /// Simulate the user closing the window.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// Bodies currently visible.
    pub fn bodies(&self) -> Vec<BodyId> {
        self.bodies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Rendering collaborator that counts frames.
///
/// Logs `vis:init` and `vis:finish`; frames are only counted, since a
/// realtime run renders many of them.
#[derive(Debug)]
pub struct MockVisWorld {
    log: EventLog,
    probe: VisProbe,
}

impl MockVisWorld {
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            probe: VisProbe::default(),
        }
    }

    pub fn probe(&self) -> VisProbe {
        self.probe.clone()
    }
}

impl VisWorld for MockVisWorld {
    fn init(&mut self) -> Result<(), CollaboratorError> {
        self.log.push("vis:init");
        Ok(())
    }

    fn finish(&mut self) -> Result<(), CollaboratorError> {
        self.log.push("vis:finish");
        Ok(())
    }

    fn step(&mut self) -> Result<(), CollaboratorError> {
        self.probe.frames.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn done(&self) -> bool {
        self.probe.closed.load(Ordering::Acquire)
    }

    fn add_body(&mut self, body: BodyId) {
        self.probe
            .bodies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(body);
    }

    fn remove_body(&mut self, body: BodyId) {
        self.probe
            .bodies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|b| *b != body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_log_is_shared_between_clones() {
        let log = EventLog::new();
        let other = log.clone();
        other.push("a");
        log.push("b");
        assert_eq!(log.entries(), vec!["a", "b"]);
        assert_eq!(log.position("b"), Some(1));
    }

    #[test]
    fn mock_world_done_after() {
        let log = EventLog::new();
        let mut w = MockWorld::new(&log).done_after(2);
        let probe = w.probe();
        w.step(Duration::from_millis(1), 1).unwrap();
        assert!(!w.done());
        w.step(Duration::from_millis(1), 3).unwrap();
        assert!(w.done());
        assert_eq!(probe.steps(), 2);
        assert_eq!(probe.last_step(), Some((Duration::from_millis(1), 3)));
    }

    #[test]
    fn mock_world_failing_step() {
        let log = EventLog::new();
        let mut w = MockWorld::new(&log);
        w.probe().set_failing(true);
        assert!(w.step(Duration::from_millis(1), 1).is_err());
        assert_eq!(w.probe().steps(), 0);
        assert_eq!(log.entries(), vec!["world:step-failed"]);
    }

    #[test]
    fn mock_vis_tracks_bodies_and_close() {
        let log = EventLog::new();
        let mut v = MockVisWorld::new(&log);
        let probe = v.probe();
        v.add_body(BodyId(1));
        v.add_body(BodyId(2));
        v.remove_body(BodyId(1));
        assert_eq!(probe.bodies(), vec![BodyId(2)]);
        assert!(!v.done());
        probe.close();
        assert!(v.done());
    }
}
