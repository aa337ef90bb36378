//! Per-step timing and cumulative kernel counters.
//!
//! [`StepMetrics`] describes the most recent [`SimKernel::step`](crate::SimKernel::step);
//! [`KernelCounters`] accumulates over the kernel's lifetime.

/// Timing and delivery data collected during a single step.
///
/// All durations are in microseconds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepMetrics {
    /// Wall-clock time for the entire step.
    pub total_us: u64,
    /// Time spent in the pre-step round.
    pub pre_step_us: u64,
    /// Time spent delivering the message batch.
    pub drain_us: u64,
    /// Time spent in the physics collaborator.
    pub physics_us: u64,
    /// Time spent in the post-step round.
    pub post_step_us: u64,
    /// `on_message` calls made during the drain.
    pub messages_delivered: usize,
    /// Hooks that returned an error during this step.
    pub hook_errors: u32,
    /// Hooks that panicked during this step.
    pub hook_panics: u32,
}

/// Cumulative counters since the kernel was created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KernelCounters {
    /// Steps that advanced simulated time.
    pub steps: u64,
    /// Steps whose physics call failed.
    pub failed_steps: u64,
    /// Steps run without a physics collaborator.
    pub skipped_steps: u64,
    /// `step` calls that found the kernel paused.
    pub paused_steps: u64,
    /// Frames rendered.
    pub frames: u64,
    /// Frames whose render call failed.
    pub failed_frames: u64,
    /// Hooks that returned an error.
    pub hook_errors: u64,
    /// Hooks that panicked.
    pub hook_panics: u64,
    /// Components added.
    pub components_added: u64,
    /// Components removed through the normal path.
    pub components_removed: u64,
    /// Components evicted after a panic.
    pub components_evicted: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = StepMetrics::default();
        assert_eq!(m.total_us, 0);
        assert_eq!(m.messages_delivered, 0);
        assert_eq!(m.hook_panics, 0);
        assert_eq!(KernelCounters::default().steps, 0);
    }
}
