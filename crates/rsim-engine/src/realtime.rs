//! Two-thread driver: a physics loop and a render loop sharing one kernel.
//!
//! [`RealtimeSim`] initializes the kernel, spawns both loops, and on
//! [`join`](RealtimeSim::join) or [`shutdown`](RealtimeSim::shutdown)
//! waits for them and finishes the kernel. Dropping a running
//! `RealtimeSim` shuts it down.
//!
//! Other threads interact through a cloneable [`SimHandle`]. Messages
//! sent with [`SimHandle::publish`] travel over a bounded channel and
//! enter the broker at the start of the next physics iteration, so a
//! publisher never waits for the kernel lock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread::{self, JoinHandle, Thread};
use std::time::{Duration, Instant};

use crossbeam_channel::{Sender, TrySendError};
use rsim_core::{Component, ComponentId, KeyPressed, Message, MessageType};
use tracing::{debug, info, warn};

use crate::error::{KernelError, RunError, SubmitError};
use crate::kernel::SimKernel;
use crate::loops::{lock, LoopReport, PhysicsLoop, RenderLoop};
use crate::metrics::KernelCounters;

const PHYSICS_THREAD: &str = "rsim-physics";
const RENDER_THREAD: &str = "rsim-render";

// ── RunReport ──────────────────────────────────────────────────────

/// Summary of a finished run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Physics iterations that did work.
    pub steps: u64,
    /// Physics iterations spent paused.
    pub paused_iterations: u64,
    /// Frames rendered.
    pub frames: u64,
    /// Messages that arrived through [`SimHandle::publish`].
    pub ingested: u64,
    /// Wall-clock time from start to join.
    pub elapsed: Duration,
    /// Simulated time at shutdown.
    pub time_simulated: Duration,
    /// Whether the physics thread exited normally.
    pub physics_joined: bool,
    /// Whether the render thread exited normally.
    pub render_joined: bool,
    /// Kernel counters at shutdown.
    pub counters: KernelCounters,
}

// ── RealtimeSim ────────────────────────────────────────────────────

/// A running simulation.
pub struct RealtimeSim {
    kernel: Arc<Mutex<SimKernel>>,
    terminate: Arc<AtomicBool>,
    ingress: Sender<Message>,
    physics: Option<JoinHandle<LoopReport>>,
    render: Option<JoinHandle<LoopReport>>,
    started: Instant,
}

impl RealtimeSim {
    /// Initialize `kernel` and start both loops.
    pub fn start(mut kernel: SimKernel) -> Result<Self, RunError> {
        kernel.init().map_err(RunError::Init)?;
        let terminate = kernel.terminate_flag();
        let (ingress_tx, ingress_rx) = crossbeam_channel::bounded(kernel.config().ingress_capacity);
        let kernel = Arc::new(Mutex::new(kernel));
        let started = Instant::now();

        let physics_peer = Arc::new(OnceLock::new());
        let render_peer = Arc::new(OnceLock::new());

        let physics_loop = PhysicsLoop {
            kernel: Arc::clone(&kernel),
            ingress: ingress_rx,
            terminate: Arc::clone(&terminate),
            peer: Arc::clone(&physics_peer),
        };
        let physics = match thread::Builder::new()
            .name(PHYSICS_THREAD.into())
            .spawn(move || physics_loop.run())
        {
            Ok(handle) => handle,
            Err(source) => {
                finish_kernel(&kernel);
                return Err(RunError::Spawn {
                    name: PHYSICS_THREAD,
                    source,
                });
            }
        };

        let _ = render_peer.set(physics.thread().clone());
        let render_loop = RenderLoop {
            kernel: Arc::clone(&kernel),
            terminate: Arc::clone(&terminate),
            peer: render_peer,
        };
        let render = match thread::Builder::new()
            .name(RENDER_THREAD.into())
            .spawn(move || render_loop.run())
        {
            Ok(handle) => handle,
            Err(source) => {
                terminate.store(true, Ordering::Release);
                physics.thread().unpark();
                if physics.join().is_err() {
                    warn!("physics thread panicked during aborted start");
                }
                finish_kernel(&kernel);
                return Err(RunError::Spawn {
                    name: RENDER_THREAD,
                    source,
                });
            }
        };

        let _ = physics_peer.set(render.thread().clone());
        info!("simulation started");
        Ok(Self {
            kernel,
            terminate,
            ingress: ingress_tx,
            physics: Some(physics),
            render: Some(render),
            started,
        })
    }

    /// Start, then block until the run terminates on its own.
    pub fn run(kernel: SimKernel) -> Result<RunReport, RunError> {
        Self::start(kernel)?.join()
    }

    /// A handle for interacting with the running simulation.
    pub fn handle(&self) -> SimHandle {
        SimHandle {
            kernel: Arc::clone(&self.kernel),
            ingress: self.ingress.clone(),
            terminate: Arc::clone(&self.terminate),
            threads: self.threads(),
        }
    }

    fn threads(&self) -> Vec<Thread> {
        self.physics
            .iter()
            .map(|h| h.thread().clone())
            .chain(self.render.iter().map(|h| h.thread().clone()))
            .collect()
    }

    /// Whether both loops are still running.
    pub fn is_running(&self) -> bool {
        self.physics.as_ref().is_some_and(|h| !h.is_finished())
            && self.render.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Run `f` with the kernel locked.
    pub fn with_kernel<R>(&self, f: impl FnOnce(&mut SimKernel) -> R) -> R {
        f(&mut lock(&self.kernel))
    }

    /// Block until both loops exit on their own, then finish the kernel.
    ///
    /// Returns [`RunError::LoopPanicked`] if either loop thread panicked;
    /// the kernel is finished regardless.
    pub fn join(mut self) -> Result<RunReport, RunError> {
        let report = self.collect();
        if !report.physics_joined {
            return Err(RunError::LoopPanicked {
                name: PHYSICS_THREAD,
            });
        }
        if !report.render_joined {
            return Err(RunError::LoopPanicked {
                name: RENDER_THREAD,
            });
        }
        Ok(report)
    }

    /// Ask both loops to stop, wait for them, and finish the kernel.
    ///
    /// Each loop completes its current iteration first. Calling this
    /// again returns an empty report.
    pub fn shutdown(&mut self) -> RunReport {
        if self.physics.is_none() && self.render.is_none() {
            return RunReport::default();
        }
        self.terminate.store(true, Ordering::Release);
        for thread in self.threads() {
            thread.unpark();
        }
        self.collect()
    }

    fn collect(&mut self) -> RunReport {
        let physics = self.physics.take().map(JoinHandle::join);
        let render = self.render.take().map(JoinHandle::join);

        let mut report = RunReport {
            elapsed: self.started.elapsed(),
            ..RunReport::default()
        };
        if let Some(Ok(p)) = &physics {
            report.steps = p.iterations;
            report.paused_iterations = p.idle;
            report.ingested = p.ingested;
        }
        if let Some(Ok(r)) = &render {
            report.frames = r.iterations;
        }
        report.physics_joined = matches!(physics, Some(Ok(_)));
        report.render_joined = matches!(render, Some(Ok(_)));

        let mut kernel = lock(&self.kernel);
        if let Err(err) = kernel.finish() {
            warn!(%err, "kernel finish reported an error");
        }
        report.time_simulated = kernel.time_simulated();
        report.counters = kernel.counters();
        drop(kernel);

        info!(
            steps = report.steps,
            frames = report.frames,
            elapsed = ?report.elapsed,
            "simulation stopped"
        );
        report
    }
}

impl Drop for RealtimeSim {
    fn drop(&mut self) {
        if self.physics.is_some() || self.render.is_some() {
            self.shutdown();
        }
    }
}

fn finish_kernel(kernel: &Mutex<SimKernel>) {
    if let Err(err) = lock(kernel).finish() {
        warn!(%err, "kernel finish reported an error");
    }
}

// ── SimHandle ──────────────────────────────────────────────────────

/// Cloneable access to a running simulation from other threads.
#[derive(Clone)]
pub struct SimHandle {
    kernel: Arc<Mutex<SimKernel>>,
    ingress: Sender<Message>,
    terminate: Arc<AtomicBool>,
    threads: Vec<Thread>,
}

impl SimHandle {
    /// Queue a message without taking the kernel lock. It is published
    /// at the start of the next physics iteration.
    pub fn publish(&self, message: Message) -> Result<(), SubmitError> {
        self.ingress.try_send(message).map_err(|e| match e {
            TrySendError::Full(_) => SubmitError::ChannelFull,
            TrySendError::Disconnected(_) => SubmitError::Shutdown,
        })
    }

    /// Publish a [`KeyPressed`] event.
    pub fn press_key(&self, key: i32) -> Result<(), SubmitError> {
        debug!(key, "key pressed");
        self.publish(Message::new(KeyPressed { key }))
    }

    /// Ask both loops to stop after their current iteration.
    pub fn terminate(&self) {
        self.terminate.store(true, Ordering::Release);
        for thread in &self.threads {
            thread.unpark();
        }
    }

    /// Whether termination was requested or the run ended.
    pub fn is_terminated(&self) -> bool {
        self.terminate.load(Ordering::Acquire)
    }

    /// Pause simulated time.
    pub fn pause(&self) {
        lock(&self.kernel).pause();
    }

    /// Resume simulated time.
    pub fn resume(&self) {
        lock(&self.kernel).resume();
    }

    /// Add a component. It is initialized at the next safe point.
    pub fn add_component<C: Component>(&self, component: C) -> ComponentId {
        lock(&self.kernel).add_component(component)
    }

    /// Remove a component, running its `finish` hook if it was initialized.
    pub fn remove_component(&self, id: ComponentId) -> bool {
        lock(&self.kernel).remove_component(id)
    }

    /// Simulated time so far.
    pub fn time_simulated(&self) -> Duration {
        lock(&self.kernel).time_simulated()
    }

    /// Run `f` with the kernel locked.
    pub fn with_kernel<R>(&self, f: impl FnOnce(&mut SimKernel) -> R) -> R {
        f(&mut lock(&self.kernel))
    }

    /// Subscribe a component through the kernel lock.
    pub fn subscribe(&self, id: ComponentId, message_type: MessageType) -> Result<bool, KernelError> {
        lock(&self.kernel).subscribe(id, message_type)
    }
}

impl std::fmt::Debug for SimHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimHandle")
            .field("terminated", &self.is_terminated())
            .finish_non_exhaustive()
    }
}
