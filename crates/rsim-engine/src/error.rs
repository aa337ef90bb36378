//! Kernel and driver error types.

use rsim_broker::BrokerError;
use rsim_core::{CollaboratorError, ComponentId};
use thiserror::Error;

use crate::config::ConfigError;

/// Errors from [`SimKernel`](crate::SimKernel) operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum KernelError {
    /// The id does not name a live component of this kernel.
    #[error("unknown component {0}")]
    UnknownComponent(ComponentId),
    /// The component is being removed and no longer accepts changes.
    #[error("component {0} is being removed")]
    Removing(ComponentId),
    /// A collaborator `init` or `finish` failed.
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
    /// The broker rejected a subscription change.
    #[error(transparent)]
    Broker(#[from] BrokerError),
    /// Invalid timing setting.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors from starting or joining the [`RealtimeSim`](crate::RealtimeSim) driver.
#[derive(Debug, Error)]
pub enum RunError {
    /// Kernel initialization failed before the loops started.
    #[error("kernel init failed: {0}")]
    Init(#[from] KernelError),
    /// A loop thread could not be spawned.
    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        /// Thread name.
        name: &'static str,
        /// OS error.
        #[source]
        source: std::io::Error,
    },
    /// A loop thread panicked. The kernel was still finished.
    #[error("{name} thread panicked")]
    LoopPanicked {
        /// Thread name.
        name: &'static str,
    },
}

/// Errors from [`SimHandle::publish`](crate::SimHandle::publish).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// The ingress channel is full; the message was not queued.
    #[error("ingress channel full")]
    ChannelFull,
    /// The physics loop has exited.
    #[error("simulation has shut down")]
    Shutdown,
}
