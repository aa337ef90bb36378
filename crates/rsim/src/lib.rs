//! rsim: a scheduling kernel for robotics simulation.
//!
//! This is the facade crate that re-exports the public API of the rsim
//! sub-crates. Most users only need `rsim` as a dependency.
//!
//! # Quick start
//!
//! ```rust
//! use std::time::Duration;
//! use rsim::prelude::*;
//!
//! struct Flat;
//! impl PhysicsWorld for Flat {
//!     fn step(&mut self, _dt: Duration, _substeps: u32) -> Result<(), CollaboratorError> {
//!         Ok(())
//!     }
//! }
//!
//! struct Logger;
//! impl Component for Logger {
//!     fn name(&self) -> &str { "logger" }
//!     fn init(&mut self, ctx: &mut dyn ComponentContext) -> Result<(), ComponentError> {
//!         ctx.register_post_step();
//!         Ok(())
//!     }
//! }
//!
//! let mut kernel = SimKernel::new(KernelConfig {
//!     simulate_real: false,
//!     ..KernelConfig::default()
//! })
//! .unwrap();
//! kernel.set_world(Flat);
//! kernel.add_component(Logger);
//! kernel.init().unwrap();
//! assert_eq!(kernel.step(), StepOutcome::Stepped);
//! assert_eq!(kernel.time_simulated(), kernel.time_step());
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `rsim-core` | IDs, priorities, messages, component and collaborator traits |
//! | [`broker`] | `rsim-broker` | Priority-ordered, double-buffered message broker |
//! | [`engine`] | `rsim-engine` | `SimKernel`, lockstep stepping and the realtime loop pair |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and traits (`rsim-core`).
///
/// Defines [`types::Message`], [`types::Priority`] and the
/// [`types::Component`] extension point.
pub use rsim_core as types;

/// Publish/subscribe routing (`rsim-broker`).
///
/// [`broker::MessageBroker`] delivers each batch in priority order.
pub use rsim_broker as broker;

/// Simulation kernel and loops (`rsim-engine`).
///
/// [`engine::SimKernel`] for stepping by hand,
/// [`engine::RealtimeSim`] for the background physics and render loops.
pub use rsim_engine as engine;

/// Common imports for typical rsim usage.
///
/// ```rust
/// use rsim::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use rsim_core::{
        BodyId, Component, ComponentContext, ComponentId, JoystickButtons, KeyPressed, Message,
        MessageKind, MessageType, Payload, PhysicsWorld, Priority, VisWorld,
    };

    // Errors
    pub use rsim_core::{CollaboratorError, ComponentError};
    pub use rsim_engine::{ConfigError, KernelError, RunError, SubmitError};

    // Broker
    pub use rsim_broker::MessageBroker;

    // Engine
    pub use rsim_engine::{
        KernelConfig, LifecycleState, RealtimeSim, RunReport, SimHandle, SimKernel, StepMetrics,
        StepOutcome, Watchdog,
    };
}
