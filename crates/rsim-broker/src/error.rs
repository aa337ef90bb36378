//! Broker error types.

use rsim_core::ComponentId;
use thiserror::Error;

/// Errors from subscription management.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BrokerError {
    /// The component was never attached, or has been detached.
    #[error("component {0} is not attached to the broker")]
    UnknownComponent(ComponentId),
    /// The component is already attached.
    #[error("component {0} is already attached to the broker")]
    AlreadyAttached(ComponentId),
}
