//! Publish/subscribe message broker for the rsim kernel.
//!
//! [`MessageBroker`] maps message types to subscribed components and
//! delivers published messages in batches. Each batch is served in
//! strict priority order (component priority first, then message
//! priority, then publish order) and messages published while a batch
//! is being delivered always land in the following batch.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod broker;
pub mod error;
mod mailbox;

pub use broker::{BrokerStats, MessageBroker};
pub use error::BrokerError;
