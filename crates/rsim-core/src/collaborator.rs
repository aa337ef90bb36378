//! Interfaces the kernel consumes from its external engines.
//!
//! The rigid-body dynamics engine and the rendering engine are not part
//! of rsim. The kernel drives them through these two traits and never
//! calls them from two threads at once: both loops hold the kernel lock
//! while touching either collaborator.

use std::time::Duration;

use crate::error::CollaboratorError;

/// Physics collaborator: advances rigid-body dynamics.
pub trait PhysicsWorld: Send + 'static {
    /// Prepare the world before the first step.
    fn init(&mut self) -> Result<(), CollaboratorError> {
        Ok(())
    }

    /// Release resources after the last step.
    fn finish(&mut self) -> Result<(), CollaboratorError> {
        Ok(())
    }

    /// Advance by `dt`, split into `substeps` equal sub-intervals.
    ///
    /// On `Err` the kernel does not count the step toward simulated time.
    fn step(&mut self, dt: Duration, substeps: u32) -> Result<(), CollaboratorError>;

    /// Whether the world considers the simulation complete.
    fn done(&self) -> bool {
        false
    }
}

/// Opaque handle for a renderable body owned by the rendering engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub u64);

/// Rendering collaborator: produces frames of the scene.
pub trait VisWorld: Send + 'static {
    /// Open the output surface.
    fn init(&mut self) -> Result<(), CollaboratorError> {
        Ok(())
    }

    /// Close the output surface.
    fn finish(&mut self) -> Result<(), CollaboratorError> {
        Ok(())
    }

    /// Render one frame.
    fn step(&mut self) -> Result<(), CollaboratorError>;

    /// Whether the output surface has been closed.
    fn done(&self) -> bool {
        false
    }

    /// Make a body visible.
    fn add_body(&mut self, _body: BodyId) {}

    /// Stop drawing a body.
    fn remove_body(&mut self, _body: BodyId) {}
}
