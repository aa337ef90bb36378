//! Simulated and real time accounting.

use std::time::{Duration, Instant};

/// Pausable monotonic stopwatch.
#[derive(Debug)]
pub(crate) struct RealTimer {
    accumulated: Duration,
    /// `Some` while running.
    running_since: Option<Instant>,
}

impl RealTimer {
    /// A stopped timer at zero.
    pub(crate) fn new() -> Self {
        Self {
            accumulated: Duration::ZERO,
            running_since: None,
        }
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.accumulated + self.running_since.map_or(Duration::ZERO, |t| t.elapsed())
    }

    #[cfg(test)]
    pub(crate) fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    pub(crate) fn start(&mut self) {
        if self.running_since.is_none() {
            self.running_since = Some(Instant::now());
        }
    }

    pub(crate) fn stop(&mut self) {
        if let Some(since) = self.running_since.take() {
            self.accumulated += since.elapsed();
        }
    }

    /// Reset to zero, keeping the running state.
    pub(crate) fn restart(&mut self) {
        self.accumulated = Duration::ZERO;
        if self.running_since.is_some() {
            self.running_since = Some(Instant::now());
        }
    }
}

/// Both kernel clocks.
#[derive(Debug)]
pub(crate) struct SimClock {
    simulated: Duration,
    pub(crate) real: RealTimer,
}

impl SimClock {
    pub(crate) fn new() -> Self {
        Self {
            simulated: Duration::ZERO,
            real: RealTimer::new(),
        }
    }

    pub(crate) fn simulated(&self) -> Duration {
        self.simulated
    }

    /// Credit one successful physics step.
    pub(crate) fn advance(&mut self, step: Duration) {
        self.simulated += step;
    }

    /// How far simulated time is ahead of real time, if at all.
    pub(crate) fn lead(&self) -> Option<Duration> {
        self.simulated
            .checked_sub(self.real.elapsed())
            .filter(|d| !d.is_zero())
    }
}
