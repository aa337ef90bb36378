//! Components shipped with the kernel.

use std::time::Duration;

use rsim_core::{Component, ComponentContext, ComponentError, Priority};
use tracing::info;

/// Terminates the run once simulated time reaches a timeout.
///
/// Registers itself for post-step ticks on `init` and checks the clock
/// after every step. The clock is simulated time, not wall-clock time:
/// a paused or throttled run does not trip it early.
#[derive(Clone, Debug)]
pub struct Watchdog {
    timeout: Duration,
    fired: bool,
}

impl Watchdog {
    /// A watchdog that fires at `timeout` of simulated time.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            fired: false,
        }
    }

    /// Configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Component for Watchdog {
    fn name(&self) -> &str {
        "watchdog"
    }

    fn priority(&self) -> Priority {
        Priority::Highest
    }

    fn init(&mut self, ctx: &mut dyn ComponentContext) -> Result<(), ComponentError> {
        ctx.register_post_step();
        Ok(())
    }

    fn on_post_step(&mut self, ctx: &mut dyn ComponentContext) -> Result<(), ComponentError> {
        if !self.fired && ctx.time_simulated() >= self.timeout {
            self.fired = true;
            info!(timeout = ?self.timeout, "watchdog timeout reached; terminating");
            ctx.request_terminate();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{KernelConfig, SimKernel, StepOutcome};

    #[test]
    fn never_fires_without_simulated_time() {
        let mut k = SimKernel::new(KernelConfig {
            simulate_real: false,
            ..KernelConfig::default()
        })
        .unwrap();
        k.add_component(Watchdog::new(Duration::from_millis(10)));
        k.init().unwrap();
        // No physics collaborator: simulated time never advances, so real
        // time passing the timeout does not fire it.
        std::thread::sleep(Duration::from_millis(15));
        assert!(k.time_real() >= Duration::from_millis(10));
        for _ in 0..3 {
            assert_eq!(k.step(), StepOutcome::NoPhysics);
        }
        assert!(!k.is_terminate_requested());
    }

    #[test]
    fn timeout_is_reported() {
        assert_eq!(Watchdog::new(Duration::from_secs(3)).timeout(), Duration::from_secs(3));
    }
}
