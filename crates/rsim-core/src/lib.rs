//! Core types and traits for the rsim simulation kernel.
//!
//! This is the leaf crate of the workspace. It defines the vocabulary
//! shared by the broker and the engine: component and message
//! identifiers, the five-level [`Priority`] scale, immutable
//! [`Message`] values, the [`Component`] contract, and the traits the
//! kernel consumes from its physics and rendering collaborators.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod collaborator;
pub mod component;
pub mod error;
pub mod id;
pub mod message;
pub mod priority;

pub use collaborator::{BodyId, PhysicsWorld, VisWorld};
pub use component::{Component, ComponentContext};
pub use error::{CollaboratorError, ComponentError};
pub use id::{ComponentId, MessageType};
pub use message::{JoystickButtons, KeyPressed, Message, MessageKind, Payload};
pub use priority::Priority;
