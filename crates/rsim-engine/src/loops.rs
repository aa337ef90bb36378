//! The physics and render loops run by [`RealtimeSim`](crate::RealtimeSim).
//!
//! Both loops hold the kernel lock for exactly one iteration and sleep
//! with `park_timeout`, so [`SimHandle::terminate`](crate::SimHandle::terminate)
//! can wake them immediately. A loop that unwinds takes its peer down
//! with it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread::{self, Thread};
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use rsim_core::Message;
use tracing::{debug, info_span};

use crate::kernel::{SimKernel, StepOutcome};

/// Lock the kernel, recovering from a poisoned mutex.
///
/// Hooks run under `catch_unwind`, so poisoning only follows a
/// collaborator panic. The panicking loop has already stopped its peer
/// through [`ExitGuard`]; what remains is finishing the kernel.
pub(crate) fn lock(kernel: &Mutex<SimKernel>) -> MutexGuard<'_, SimKernel> {
    kernel.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Park until `duration` has passed or `terminate` is set.
fn sleep_for(duration: Duration, terminate: &AtomicBool) {
    let deadline = Instant::now() + duration;
    while !terminate.load(Ordering::Acquire) {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        thread::park_timeout(deadline - now);
    }
}

/// The other loop's thread, filled in once it has been spawned.
pub(crate) type Peer = Arc<OnceLock<Thread>>;

/// Held by a running loop. If the loop unwinds, sets the terminate flag
/// and wakes the peer so it exits too.
struct ExitGuard<'a> {
    terminate: &'a AtomicBool,
    peer: &'a Peer,
}

impl Drop for ExitGuard<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.terminate.store(true, Ordering::Release);
            if let Some(peer) = self.peer.get() {
                peer.unpark();
            }
        }
    }
}

/// What one loop did over its lifetime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct LoopReport {
    /// Iterations that did work (steps or frames).
    pub iterations: u64,
    /// Iterations spent paused.
    pub idle: u64,
    /// Messages moved from the ingress channel into the broker.
    pub ingested: u64,
}

// ── PhysicsLoop ────────────────────────────────────────────────────

pub(crate) struct PhysicsLoop {
    pub(crate) kernel: Arc<Mutex<SimKernel>>,
    pub(crate) ingress: Receiver<Message>,
    pub(crate) terminate: Arc<AtomicBool>,
    pub(crate) peer: Peer,
}

impl PhysicsLoop {
    /// Run until terminated. Exits after finishing the current iteration.
    pub(crate) fn run(self) -> LoopReport {
        let span = info_span!("physics_loop");
        let _guard = span.enter();
        let _exit = ExitGuard {
            terminate: &self.terminate,
            peer: &self.peer,
        };
        debug!("physics loop started");

        let mut report = LoopReport::default();
        while !self.terminate.load(Ordering::Acquire) {
            let (outcome, delay, step) = {
                let mut kernel = lock(&self.kernel);
                for message in self.ingress.try_iter() {
                    kernel.publish(message);
                    report.ingested += 1;
                }
                let outcome = kernel.step();
                (outcome, kernel.throttle_delay(), kernel.time_step())
            };

            match outcome {
                StepOutcome::Terminated => {
                    self.terminate.store(true, Ordering::Release);
                    break;
                }
                StepOutcome::Paused => {
                    report.idle += 1;
                    sleep_for(step, &self.terminate);
                }
                StepOutcome::Stepped => {
                    report.iterations += 1;
                    if let Some(delay) = delay {
                        sleep_for(delay, &self.terminate);
                    }
                }
                StepOutcome::NoPhysics | StepOutcome::PhysicsFailed => {
                    // Simulated time did not move, so throttling cannot
                    // pace the loop.
                    report.iterations += 1;
                    sleep_for(step, &self.terminate);
                }
            }
        }

        debug!(?report, "physics loop stopped");
        report
    }
}

// ── RenderLoop ─────────────────────────────────────────────────────

pub(crate) struct RenderLoop {
    pub(crate) kernel: Arc<Mutex<SimKernel>>,
    pub(crate) terminate: Arc<AtomicBool>,
    pub(crate) peer: Peer,
}

impl RenderLoop {
    /// Run until terminated. Checks the termination predicate itself so
    /// a closed window ends the run even while physics is paused.
    pub(crate) fn run(self) -> LoopReport {
        let span = info_span!("render_loop");
        let _guard = span.enter();
        let _exit = ExitGuard {
            terminate: &self.terminate,
            peer: &self.peer,
        };
        debug!("render loop started");

        let mut report = LoopReport::default();
        while !self.terminate.load(Ordering::Acquire) {
            let period = {
                let mut kernel = lock(&self.kernel);
                if kernel.done() {
                    self.terminate.store(true, Ordering::Release);
                    break;
                }
                if kernel.render() {
                    report.iterations += 1;
                }
                kernel.config().render_period
            };
            sleep_for(period, &self.terminate);
        }

        debug!(?report, "render loop stopped");
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sleep_for_returns_early_on_terminate() {
        let flag = AtomicBool::new(true);
        let start = Instant::now();
        sleep_for(Duration::from_secs(10), &flag);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn exit_guard_stops_peer_on_panic() {
        let terminate = Arc::new(AtomicBool::new(false));
        let peer: Peer = Arc::new(OnceLock::new());
        let waiter = {
            let terminate = Arc::clone(&terminate);
            thread::spawn(move || sleep_for(Duration::from_secs(30), &terminate))
        };
        let _ = peer.set(waiter.thread().clone());

        let panicking = {
            let terminate = Arc::clone(&terminate);
            let peer = Arc::clone(&peer);
            thread::spawn(move || {
                let _exit = ExitGuard {
                    terminate: &terminate,
                    peer: &peer,
                };
                panic!("collaborator blew up");
            })
        };
        assert!(panicking.join().is_err());
        assert!(terminate.load(Ordering::Acquire));
        let start = Instant::now();
        waiter.join().unwrap();
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn exit_guard_is_silent_on_normal_exit() {
        let terminate = AtomicBool::new(false);
        let peer: Peer = Arc::new(OnceLock::new());
        drop(ExitGuard {
            terminate: &terminate,
            peer: &peer,
        });
        assert!(!terminate.load(Ordering::Acquire));
    }

    #[test]
    fn sleep_for_waits_out_duration() {
        let flag = AtomicBool::new(false);
        let start = Instant::now();
        sleep_for(Duration::from_millis(5), &flag);
        assert!(start.elapsed() >= Duration::from_millis(5));
    }
}
