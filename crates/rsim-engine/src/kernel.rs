//! [`SimKernel`]: component lifecycle, tick rounds, message drain and
//! physics stepping.
//!
//! The kernel is single-threaded. [`RealtimeSim`](crate::RealtimeSim)
//! shares one kernel between its two loops behind a mutex; tests and
//! lockstep callers drive it directly with [`SimKernel::step`] and
//! [`SimKernel::render`].

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rsim_broker::MessageBroker;
use rsim_core::{
    Component, ComponentId, KeyPressed, Message, MessageType, PhysicsWorld, VisWorld,
};
use tracing::{debug, error, trace, warn};

use crate::clock::SimClock;
use crate::config::{ConfigError, KernelConfig};
use crate::context::KernelCtx;
use crate::error::KernelError;
use crate::metrics::{KernelCounters, StepMetrics};
use crate::registry::{Entry, LifecycleState, Registry};
use crate::ticks::TickList;

// ── StepOutcome ────────────────────────────────────────────────────

/// What a call to [`SimKernel::step`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// A full step ran and simulated time advanced by one step.
    Stepped,
    /// The kernel is paused. Only the leading safe point ran.
    Paused,
    /// Callbacks ran but no physics collaborator is attached, so
    /// simulated time did not advance.
    NoPhysics,
    /// Callbacks ran but the physics collaborator reported an error;
    /// simulated time did not advance.
    PhysicsFailed,
    /// The termination predicate holds. Nothing ran.
    Terminated,
}

// ── Hook ───────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
enum Hook<'m> {
    Init,
    PreStep,
    PostStep,
    Message(&'m Message),
}

impl Hook<'_> {
    fn name(&self) -> &'static str {
        match self {
            Hook::Init => "init",
            Hook::PreStep => "on_pre_step",
            Hook::PostStep => "on_post_step",
            Hook::Message(_) => "on_message",
        }
    }
}

#[derive(Clone, Copy)]
enum Phase {
    Pre,
    Post,
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>")
}

fn micros(since: Instant) -> u64 {
    since.elapsed().as_micros() as u64
}

// ── KernelState ────────────────────────────────────────────────────

/// Everything except the broker. Split out so a drain can lend the
/// broker to handlers while they reach the rest of the kernel.
pub(crate) struct KernelState {
    pub(crate) config: KernelConfig,
    pub(crate) registry: Registry,
    pub(crate) pre_step: TickList,
    pub(crate) post_step: TickList,
    pub(crate) clock: SimClock,
    pub(crate) paused: bool,
    pub(crate) terminate: Arc<AtomicBool>,
    pub(crate) world: Option<Box<dyn PhysicsWorld>>,
    pub(crate) vis: Option<Box<dyn VisWorld>>,
    counters: KernelCounters,
    warned_no_world: bool,
    warned_no_vis: bool,
}

impl KernelState {
    pub(crate) fn is_live(&self, id: ComponentId) -> bool {
        matches!(
            self.registry.state(id),
            LifecycleState::Added | LifecycleState::Initialized
        )
    }

    fn check_live(&self, id: ComponentId) -> Result<(), KernelError> {
        match self.registry.state(id) {
            LifecycleState::Added | LifecycleState::Initialized => Ok(()),
            LifecycleState::PendingRemoval => Err(KernelError::Removing(id)),
            LifecycleState::Removed => Err(KernelError::UnknownComponent(id)),
        }
    }

    pub(crate) fn add(
        &mut self,
        broker: &mut MessageBroker,
        component: Box<dyn Component>,
    ) -> ComponentId {
        let id = self.registry.insert(component);
        let priority = self.registry.get(id).map(|e| e.priority).unwrap_or_default();
        if let Err(err) = broker.attach(id, priority) {
            warn!(component = %id, %err, "broker attach failed");
        }
        self.counters.components_added += 1;
        debug!(component = %id, name = self.registry.name(id), %priority, "component added");
        id
    }

    /// Detach from the broker and tick lists now; drop the entry at the
    /// next [`apply_removals`](Self::apply_removals).
    pub(crate) fn request_removal(&mut self, broker: &mut MessageBroker, id: ComponentId) -> bool {
        if !self.registry.request_removal(id) {
            return false;
        }
        if let Err(err) = broker.detach(id) {
            trace!(component = %id, %err, "detach skipped");
        }
        self.pre_step.unregister(id);
        self.post_step.unregister(id);
        debug!(component = %id, name = self.registry.name(id), "removal requested");
        true
    }

    pub(crate) fn apply_removals(&mut self) {
        while let Some((id, entry)) = self.registry.next_removal() {
            self.retire(id, entry);
            self.counters.components_removed += 1;
        }
    }

    /// Run `finish` if it is owed and drop the component.
    fn retire(&mut self, id: ComponentId, entry: Entry) {
        let Entry {
            component,
            name,
            initialized,
            ..
        } = entry;
        if let (true, Some(mut component)) = (initialized, component) {
            match panic::catch_unwind(AssertUnwindSafe(|| component.finish())) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    warn!(component = %id, %name, hook = "finish", %err, "hook failed");
                    self.counters.hook_errors += 1;
                }
                Err(payload) => {
                    error!(
                        component = %id,
                        %name,
                        hook = "finish",
                        panic = panic_message(&*payload),
                        "hook panicked"
                    );
                    self.counters.hook_panics += 1;
                }
            }
        }
        debug!(component = %id, %name, "component removed");
    }

    /// Drop a component that panicked, without `finish`.
    fn evict(&mut self, broker: &mut MessageBroker, id: ComponentId) {
        if self.registry.evict(id).is_none() {
            return;
        }
        if let Err(err) = broker.detach(id) {
            trace!(component = %id, %err, "detach skipped");
        }
        self.pre_step.unregister(id);
        self.post_step.unregister(id);
        self.counters.components_evicted += 1;
    }

    pub(crate) fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            self.clock.real.stop();
            debug!(time_simulated = ?self.clock.simulated(), "paused");
        }
    }

    pub(crate) fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.clock.real.start();
            debug!(time_simulated = ?self.clock.simulated(), "resumed");
        }
    }

    fn tick_list(&mut self, phase: Phase) -> &mut TickList {
        match phase {
            Phase::Pre => &mut self.pre_step,
            Phase::Post => &mut self.post_step,
        }
    }
}

/// Call one hook of one component, isolating errors and panics.
///
/// The component is taken out of its slot for the call. An `Err` is
/// logged and the component kept; a panic evicts it.
fn run_hook(broker: &mut MessageBroker, state: &mut KernelState, id: ComponentId, hook: Hook<'_>) {
    let Some(mut component) = state.registry.take(id) else {
        return;
    };
    let result = {
        let mut ctx = KernelCtx::new(id, broker, state);
        panic::catch_unwind(AssertUnwindSafe(|| match hook {
            Hook::Init => component.init(&mut ctx),
            Hook::PreStep => component.on_pre_step(&mut ctx),
            Hook::PostStep => component.on_post_step(&mut ctx),
            Hook::Message(message) => component.on_message(&mut ctx, message),
        }))
    };
    match result {
        Ok(Ok(())) => state.registry.restore(id, component),
        Ok(Err(err)) => {
            warn!(
                component = %id,
                name = component.name(),
                hook = hook.name(),
                %err,
                "hook failed"
            );
            state.counters.hook_errors += 1;
            state.registry.restore(id, component);
        }
        Err(payload) => {
            error!(
                component = %id,
                name = component.name(),
                hook = hook.name(),
                panic = panic_message(&*payload),
                "hook panicked; evicting component"
            );
            state.counters.hook_panics += 1;
            drop(component);
            state.evict(broker, id);
        }
    }
}

// ── SimKernel ──────────────────────────────────────────────────────

/// The scheduler.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use rsim_core::{CollaboratorError, PhysicsWorld};
/// use rsim_engine::{KernelConfig, SimKernel, StepOutcome};
///
/// struct Flat;
/// impl PhysicsWorld for Flat {
///     fn step(&mut self, _dt: Duration, _substeps: u32) -> Result<(), CollaboratorError> {
///         Ok(())
///     }
/// }
///
/// let config = KernelConfig {
///     step: Duration::from_millis(20),
///     time_end: Some(Duration::from_millis(40)),
///     simulate_real: false,
///     ..KernelConfig::default()
/// };
/// let mut kernel = SimKernel::new(config).unwrap();
/// kernel.set_world(Flat);
/// kernel.init().unwrap();
/// assert_eq!(kernel.step(), StepOutcome::Stepped);
/// assert_eq!(kernel.step(), StepOutcome::Stepped);
/// assert_eq!(kernel.step(), StepOutcome::Terminated);
/// assert_eq!(kernel.time_simulated(), Duration::from_millis(40));
/// kernel.finish().unwrap();
/// ```
pub struct SimKernel {
    broker: MessageBroker,
    state: KernelState,
    last_metrics: StepMetrics,
    finished: bool,
}

impl SimKernel {
    /// Create a kernel with no collaborators and no components.
    pub fn new(config: KernelConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            broker: MessageBroker::new(),
            state: KernelState {
                config,
                registry: Registry::default(),
                pre_step: TickList::default(),
                post_step: TickList::default(),
                clock: SimClock::new(),
                paused: false,
                terminate: Arc::new(AtomicBool::new(false)),
                world: None,
                vis: None,
                counters: KernelCounters::default(),
                warned_no_world: false,
                warned_no_vis: false,
            },
            last_metrics: StepMetrics::default(),
            finished: false,
        })
    }

    /// Current configuration.
    pub fn config(&self) -> &KernelConfig {
        &self.state.config
    }

    // ── Collaborators ──────────────────────────────────────────────

    /// Attach the physics collaborator, replacing any previous one.
    pub fn set_world(&mut self, world: impl PhysicsWorld) {
        self.state.world = Some(Box::new(world));
        self.state.warned_no_world = false;
    }

    /// Attach the rendering collaborator, replacing any previous one.
    pub fn set_vis_world(&mut self, vis: impl VisWorld) {
        self.state.vis = Some(Box::new(vis));
        self.state.warned_no_vis = false;
    }

    /// The physics collaborator, if attached.
    pub fn world_mut(&mut self) -> Option<&mut dyn PhysicsWorld> {
        match self.state.world.as_mut() {
            Some(world) => Some(world.as_mut()),
            None => None,
        }
    }

    /// The rendering collaborator, if attached.
    pub fn vis_world_mut(&mut self) -> Option<&mut dyn VisWorld> {
        match self.state.vis.as_mut() {
            Some(vis) => Some(vis.as_mut()),
            None => None,
        }
    }

    // ── Components ─────────────────────────────────────────────────

    /// Attach a component. It is initialized at the next safe point.
    pub fn add_component<C: Component>(&mut self, component: C) -> ComponentId {
        self.add_boxed(Box::new(component))
    }

    /// Attach an already boxed component.
    pub fn add_boxed(&mut self, component: Box<dyn Component>) -> ComponentId {
        self.state.add(&mut self.broker, component)
    }

    /// Remove a component, calling its `finish` hook if it was
    /// initialized. Returns `false` if the id is unknown or already
    /// being removed.
    pub fn remove_component(&mut self, id: ComponentId) -> bool {
        let removed = self.state.request_removal(&mut self.broker, id);
        self.state.apply_removals();
        removed
    }

    /// Lifecycle state of `id`. Unknown ids report
    /// [`Removed`](LifecycleState::Removed).
    pub fn lifecycle(&self, id: ComponentId) -> LifecycleState {
        self.state.registry.state(id)
    }

    /// Name the component reported when it was added.
    pub fn component_name(&self, id: ComponentId) -> Option<&str> {
        self.state.registry.get(id).map(|e| e.name.as_str())
    }

    /// Number of components not yet removed.
    pub fn component_count(&self) -> usize {
        self.state.registry.len()
    }

    /// Ids of all components not yet removed.
    pub fn component_ids(&self) -> Vec<ComponentId> {
        self.state.registry.ids().collect()
    }

    // ── Messaging ──────────────────────────────────────────────────

    /// Subscribe a component to a message type. Returns `Ok(false)` if
    /// it already was.
    pub fn subscribe(&mut self, id: ComponentId, message_type: MessageType) -> Result<bool, KernelError> {
        self.state.check_live(id)?;
        Ok(self.broker.subscribe(id, message_type)?)
    }

    /// Drop one subscription. Returns `Ok(false)` if it did not exist.
    pub fn unsubscribe(&mut self, id: ComponentId, message_type: MessageType) -> Result<bool, KernelError> {
        self.state.check_live(id)?;
        Ok(self.broker.unsubscribe(id, message_type)?)
    }

    /// Drop every subscription of a component.
    pub fn unsubscribe_all(&mut self, id: ComponentId) -> Result<usize, KernelError> {
        self.state.check_live(id)?;
        Ok(self.broker.unsubscribe_all(id)?)
    }

    /// Whether `id` is subscribed to `message_type`.
    pub fn is_subscribed(&self, id: ComponentId, message_type: MessageType) -> bool {
        self.broker.is_subscribed(id, message_type)
    }

    /// Queue a message for the next drain. Returns the number of
    /// subscribers it was queued for.
    pub fn publish(&mut self, message: Message) -> usize {
        self.broker.publish(message)
    }

    /// Publish a [`KeyPressed`] event.
    pub fn press_key(&mut self, key: i32) -> usize {
        debug!(key, "key pressed");
        self.publish(Message::new(KeyPressed { key }))
    }

    /// Read access to the broker.
    pub fn broker(&self) -> &MessageBroker {
        &self.broker
    }

    // ── Tick registration ──────────────────────────────────────────

    /// Register a component for `on_pre_step`.
    pub fn register_pre_step(&mut self, id: ComponentId) -> Result<bool, KernelError> {
        self.state.check_live(id)?;
        Ok(self.state.pre_step.register(id))
    }

    /// Unregister a component from `on_pre_step`.
    pub fn unregister_pre_step(&mut self, id: ComponentId) -> bool {
        self.state.pre_step.unregister(id)
    }

    /// Register a component for `on_post_step`.
    pub fn register_post_step(&mut self, id: ComponentId) -> Result<bool, KernelError> {
        self.state.check_live(id)?;
        Ok(self.state.post_step.register(id))
    }

    /// Unregister a component from `on_post_step`.
    pub fn unregister_post_step(&mut self, id: ComponentId) -> bool {
        self.state.post_step.unregister(id)
    }

    /// Whether `id` receives `on_pre_step`.
    pub fn is_registered_pre_step(&self, id: ComponentId) -> bool {
        self.state.pre_step.is_registered(id)
    }

    /// Whether `id` receives `on_post_step`.
    pub fn is_registered_post_step(&self, id: ComponentId) -> bool {
        self.state.post_step.is_registered(id)
    }

    // ── Driving ────────────────────────────────────────────────────

    /// Initialize both collaborators, start the real-time clock and
    /// initialize every component added so far.
    pub fn init(&mut self) -> Result<(), KernelError> {
        if let Some(world) = self.state.world.as_mut() {
            world.init()?;
        }
        if let Some(vis) = self.state.vis.as_mut() {
            vis.init()?;
        }
        self.state.clock.real.restart();
        if !self.state.paused {
            self.state.clock.real.start();
        }
        self.safe_point();
        debug!(components = self.component_count(), "kernel initialized");
        Ok(())
    }

    /// Run one physics iteration: pre-step round, message drain,
    /// physics step, post-step round, with a safe point before and
    /// after each phase.
    pub fn step(&mut self) -> StepOutcome {
        if self.done() {
            return StepOutcome::Terminated;
        }
        self.safe_point();
        if self.state.paused {
            self.state.counters.paused_steps += 1;
            return StepOutcome::Paused;
        }
        self.state.clock.real.start();

        let start = Instant::now();
        let errors_before = self.state.counters.hook_errors;
        let panics_before = self.state.counters.hook_panics;
        let mut metrics = StepMetrics::default();

        let t = Instant::now();
        self.tick_round(Phase::Pre);
        self.safe_point();
        metrics.pre_step_us = micros(t);

        let t = Instant::now();
        metrics.messages_delivered = self.drain();
        self.safe_point();
        metrics.drain_us = micros(t);

        let t = Instant::now();
        let outcome = self.step_physics();
        metrics.physics_us = micros(t);

        let t = Instant::now();
        self.tick_round(Phase::Post);
        self.safe_point();
        metrics.post_step_us = micros(t);

        metrics.hook_errors = (self.state.counters.hook_errors - errors_before) as u32;
        metrics.hook_panics = (self.state.counters.hook_panics - panics_before) as u32;
        metrics.total_us = micros(start);
        self.last_metrics = metrics;
        outcome
    }

    /// Render one frame. Returns `false` if no rendering collaborator
    /// is attached or the frame failed.
    pub fn render(&mut self) -> bool {
        let state = &mut self.state;
        let Some(vis) = state.vis.as_mut() else {
            if !state.warned_no_vis {
                warn!("no rendering collaborator attached; frames are skipped");
                state.warned_no_vis = true;
            }
            return false;
        };
        match vis.step() {
            Ok(()) => {
                state.counters.frames += 1;
                true
            }
            Err(err) => {
                warn!(%err, "render failed");
                state.counters.failed_frames += 1;
                false
            }
        }
    }

    /// The termination predicate: terminate requested, rendering
    /// surface closed, physics complete, or time ceiling reached.
    pub fn done(&self) -> bool {
        let s = &self.state;
        s.terminate.load(Ordering::Acquire)
            || s.vis.as_ref().is_some_and(|v| v.done())
            || s.world.as_ref().is_some_and(|w| w.done())
            || s
                .config
                .time_end
                .is_some_and(|end| s.clock.simulated() >= end)
    }

    /// Finish every initialized component, then both collaborators.
    ///
    /// Idempotent. Returns the first collaborator error, after still
    /// attempting the other collaborator.
    pub fn finish(&mut self) -> Result<(), KernelError> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.state.apply_removals();
        for (id, entry) in self.state.registry.drain() {
            if let Err(err) = self.broker.detach(id) {
                trace!(component = %id, %err, "detach skipped");
            }
            self.state.pre_step.unregister(id);
            self.state.post_step.unregister(id);
            self.state.retire(id, entry);
        }
        self.state.clock.real.stop();

        let mut result = Ok(());
        if let Some(vis) = self.state.vis.as_mut() {
            if let Err(err) = vis.finish() {
                warn!(%err, "rendering collaborator finish failed");
                result = Err(err.into());
            }
        }
        if let Some(world) = self.state.world.as_mut() {
            if let Err(err) = world.finish() {
                warn!(%err, "physics collaborator finish failed");
                if result.is_ok() {
                    result = Err(err.into());
                }
            }
        }
        debug!(counters = ?self.state.counters, "kernel finished");
        result
    }

    // ── Time ───────────────────────────────────────────────────────

    /// Stop simulated time from advancing. Real time stops too.
    pub fn pause(&mut self) {
        self.state.pause();
    }

    /// Resume after [`pause`](Self::pause).
    pub fn resume(&mut self) {
        self.state.resume();
    }

    /// Whether the kernel is paused.
    pub fn is_paused(&self) -> bool {
        self.state.paused
    }

    /// Simulated time accumulated by successful steps.
    pub fn time_simulated(&self) -> Duration {
        self.state.clock.simulated()
    }

    /// Unpaused real time since `init` or the last restart.
    pub fn time_real(&self) -> Duration {
        self.state.clock.real.elapsed()
    }

    /// Reset the real-time accumulator to zero.
    pub fn restart_real_time(&mut self) {
        self.state.clock.real.restart();
    }

    /// Fixed physics step.
    pub fn time_step(&self) -> Duration {
        self.state.config.step
    }

    /// Change the fixed physics step.
    pub fn set_time_step(&mut self, step: Duration) -> Result<(), KernelError> {
        if step.is_zero() {
            return Err(ConfigError::ZeroStep.into());
        }
        self.state.config.step = step;
        Ok(())
    }

    /// Change the substep count.
    pub fn set_time_substeps(&mut self, substeps: u32) -> Result<(), KernelError> {
        if substeps == 0 {
            return Err(ConfigError::ZeroSubsteps.into());
        }
        self.state.config.substeps = substeps;
        Ok(())
    }

    /// Set or clear the simulated-time ceiling.
    pub fn set_time_end(&mut self, time_end: Option<Duration>) -> Result<(), KernelError> {
        if time_end.is_some_and(|t| t.is_zero()) {
            return Err(ConfigError::ZeroTimeEnd.into());
        }
        self.state.config.time_end = time_end;
        Ok(())
    }

    /// Change the render loop period.
    pub fn set_render_period(&mut self, period: Duration) -> Result<(), KernelError> {
        if period.is_zero() {
            return Err(ConfigError::ZeroRenderPeriod.into());
        }
        self.state.config.render_period = period;
        Ok(())
    }

    /// Enable or disable real-time throttling.
    pub fn set_simulate_real(&mut self, simulate_real: bool) {
        self.state.config.simulate_real = simulate_real;
    }

    /// How long the physics loop should sleep to keep simulated time
    /// from running ahead of real time. `None` if no sleep is needed.
    pub fn throttle_delay(&self) -> Option<Duration> {
        if !self.state.config.simulate_real || self.state.paused {
            return None;
        }
        self.state.clock.lead()
    }

    // ── Termination ────────────────────────────────────────────────

    /// Ask both loops to stop after their current iteration.
    pub fn request_terminate(&self) {
        self.state.terminate.store(true, Ordering::Release);
    }

    /// Whether termination was requested explicitly.
    pub fn is_terminate_requested(&self) -> bool {
        self.state.terminate.load(Ordering::Acquire)
    }

    /// The shared terminate flag. Setting it is equivalent to
    /// [`request_terminate`](Self::request_terminate).
    pub fn terminate_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.state.terminate)
    }

    // ── Metrics ────────────────────────────────────────────────────

    /// Metrics of the most recent step that was not paused or terminated.
    pub fn last_metrics(&self) -> &StepMetrics {
        &self.last_metrics
    }

    /// Cumulative counters.
    pub fn counters(&self) -> KernelCounters {
        self.state.counters
    }

    // ── Internals ──────────────────────────────────────────────────

    /// Apply pending removals, then initialize pending components,
    /// until neither is left.
    fn safe_point(&mut self) {
        let Self { broker, state, .. } = self;
        loop {
            state.apply_removals();
            let Some(id) = state.registry.next_init() else {
                break;
            };
            run_hook(broker, state, id, Hook::Init);
            state.registry.mark_initialized(id);
            if state.registry.get(id).is_some() {
                debug!(component = %id, name = state.registry.name(id), "component initialized");
            }
        }
    }

    fn tick_round(&mut self, phase: Phase) {
        let Self { broker, state, .. } = self;
        let hook = match phase {
            Phase::Pre => Hook::PreStep,
            Phase::Post => Hook::PostStep,
        };
        let round = state.tick_list(phase).begin_round();
        for id in round {
            if state.registry.state(id) == LifecycleState::Initialized {
                run_hook(broker, state, id, hook);
            }
        }
        state.tick_list(phase).end_round();
    }

    fn drain(&mut self) -> usize {
        let Self { broker, state, .. } = self;
        broker.drain_batch(|broker, id, message| {
            if state.registry.state(id) == LifecycleState::Initialized {
                run_hook(broker, state, id, Hook::Message(message));
            } else {
                trace!(component = %id, message_type = %message.message_type(), "dropped for inactive component");
            }
        })
    }

    fn step_physics(&mut self) -> StepOutcome {
        let state = &mut self.state;
        if state.paused {
            state.counters.paused_steps += 1;
            return StepOutcome::Paused;
        }
        let Some(world) = state.world.as_mut() else {
            if !state.warned_no_world {
                warn!("no physics collaborator attached; steps do not advance time");
                state.warned_no_world = true;
            }
            state.counters.skipped_steps += 1;
            return StepOutcome::NoPhysics;
        };
        let step = state.config.step;
        match world.step(step, state.config.substeps) {
            Ok(()) => {
                state.clock.advance(step);
                state.counters.steps += 1;
                StepOutcome::Stepped
            }
            Err(err) => {
                warn!(%err, time_simulated = ?state.clock.simulated(), "physics step failed");
                state.counters.failed_steps += 1;
                StepOutcome::PhysicsFailed
            }
        }
    }
}

impl std::fmt::Debug for SimKernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimKernel")
            .field("components", &self.state.registry.len())
            .field("time_simulated", &self.state.clock.simulated())
            .field("paused", &self.state.paused)
            .field("has_world", &self.state.world.is_some())
            .field("has_vis", &self.state.vis.is_some())
            .field("broker", &self.broker)
            .finish_non_exhaustive()
    }
}
