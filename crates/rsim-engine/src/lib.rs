//! Scheduling kernel for the rsim simulation harness.
//!
//! [`SimKernel`] owns the components, the message broker and the two
//! external collaborators, and advances the simulation one fixed step
//! at a time. It can be driven directly (lockstep, as in tests) or by
//! [`RealtimeSim`], which runs a physics loop and a render loop on two
//! threads that serialize on one kernel lock.
//!
//! # Safe points
//!
//! Component initialization and removal are applied only between
//! callback rounds: at the start of each step, after the pre-step round,
//! after the message drain, and after the post-step round. A hook never
//! observes a list it is being called from change underneath it.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod builtin;
mod clock;
pub mod config;
mod context;
pub mod error;
pub mod kernel;
mod loops;
pub mod metrics;
pub mod realtime;
mod registry;
mod ticks;

pub use builtin::Watchdog;
pub use config::{ConfigError, KernelConfig};
pub use error::{KernelError, RunError, SubmitError};
pub use kernel::{SimKernel, StepOutcome};
pub use metrics::{KernelCounters, StepMetrics};
pub use realtime::{RealtimeSim, RunReport, SimHandle};
pub use registry::LifecycleState;
