//! Error types shared across the rsim workspace.
//!
//! Hooks and collaborators report failures through these enums; the
//! kernel logs them and keeps running rather than propagating them out
//! of its loops.

use thiserror::Error;

/// Errors returned from [`Component`](crate::Component) hooks.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ComponentError {
    /// The hook could not complete.
    #[error("component hook failed: {reason}")]
    Failed {
        /// Human-readable description of the failure.
        reason: String,
    },
    /// The hook was asked to do something the component does not support.
    #[error("unsupported by component: {what}")]
    Unsupported {
        /// What was requested.
        what: String,
    },
}

impl ComponentError {
    /// Shorthand for [`ComponentError::Failed`].
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }
}

/// Errors reported by the physics or rendering collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    /// `init()` failed.
    #[error("collaborator init failed: {reason}")]
    InitFailed {
        /// Description of the failure.
        reason: String,
    },
    /// `step()` failed; simulated time is not advanced for this step.
    #[error("collaborator step failed: {reason}")]
    StepFailed {
        /// Description of the failure.
        reason: String,
    },
    /// `finish()` failed.
    #[error("collaborator finish failed: {reason}")]
    FinishFailed {
        /// Description of the failure.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_error_display() {
        let e = ComponentError::failed("joint missing");
        assert_eq!(e.to_string(), "component hook failed: joint missing");
    }

    #[test]
    fn collaborator_error_display() {
        let e = CollaboratorError::StepFailed {
            reason: "solver diverged".into(),
        };
        assert_eq!(e.to_string(), "collaborator step failed: solver diverged");
    }
}
