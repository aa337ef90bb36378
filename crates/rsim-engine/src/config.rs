//! Kernel configuration, validation, and TOML loading.
//!
//! [`KernelConfig`] is the input for [`SimKernel::new`](crate::SimKernel::new).
//! [`validate()`](KernelConfig::validate) checks the timing invariants at
//! construction; the runtime setters on the kernel re-check the field
//! they change.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected by [`KernelConfig::validate()`] and the kernel's
/// timing setters.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The physics step duration is zero.
    #[error("step duration must be positive")]
    ZeroStep,
    /// The substep count is zero.
    #[error("substeps must be at least 1")]
    ZeroSubsteps,
    /// The render period is zero.
    #[error("render period must be positive")]
    ZeroRenderPeriod,
    /// A simulated-time ceiling of zero would end the run before it starts.
    #[error("time_end must be positive when set")]
    ZeroTimeEnd,
    /// Ingress channel capacity is zero.
    #[error("ingress_capacity must be at least 1")]
    IngressCapacityZero,
    /// The TOML document could not be parsed.
    #[error("invalid config document: {reason}")]
    Parse {
        /// Parser message.
        reason: String,
    },
}

// ── KernelConfig ───────────────────────────────────────────────────

/// Timing and driver settings for a [`SimKernel`](crate::SimKernel).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KernelConfig {
    /// Fixed physics step. Default: 10 ms.
    pub step: Duration,
    /// Substeps per physics step. Default: 1.
    pub substeps: u32,
    /// Period of the render loop. Default: 40 ms.
    pub render_period: Duration,
    /// Simulated-time ceiling; the run terminates once reached. Default: none.
    pub time_end: Option<Duration>,
    /// Throttle the physics loop so simulated time does not run ahead of
    /// real time. Default: true.
    pub simulate_real: bool,
    /// Capacity of the channel carrying messages published from outside
    /// the loops. Default: 256.
    pub ingress_capacity: usize,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            step: Duration::from_millis(10),
            substeps: 1,
            render_period: Duration::from_millis(40),
            time_end: None,
            simulate_real: true,
            ingress_capacity: 256,
        }
    }
}

impl KernelConfig {
    /// Check all invariants. Returns the first violation found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.step.is_zero() {
            return Err(ConfigError::ZeroStep);
        }
        if self.substeps == 0 {
            return Err(ConfigError::ZeroSubsteps);
        }
        if self.render_period.is_zero() {
            return Err(ConfigError::ZeroRenderPeriod);
        }
        if self.time_end.is_some_and(|t| t.is_zero()) {
            return Err(ConfigError::ZeroTimeEnd);
        }
        if self.ingress_capacity == 0 {
            return Err(ConfigError::IngressCapacityZero);
        }
        Ok(())
    }

    /// Parse a TOML document and validate the result.
    ///
    /// Durations are given in whole milliseconds. Missing keys take
    /// their default; unknown keys are rejected.
    ///
    /// ```
    /// use std::time::Duration;
    /// use rsim_engine::KernelConfig;
    ///
    /// let cfg = KernelConfig::from_toml_str("step_ms = 20\ntime_end_ms = 100\n").unwrap();
    /// assert_eq!(cfg.step, Duration::from_millis(20));
    /// assert_eq!(cfg.time_end, Some(Duration::from_millis(100)));
    /// assert_eq!(cfg.substeps, 1);
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(source).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;
        let config = Self::from(raw);
        config.validate()?;
        Ok(config)
    }
}

/// On-disk shape of [`KernelConfig`].
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    step_ms: u64,
    substeps: u32,
    render_period_ms: u64,
    time_end_ms: Option<u64>,
    simulate_real: bool,
    ingress_capacity: usize,
}

impl Default for RawConfig {
    fn default() -> Self {
        let d = KernelConfig::default();
        Self {
            step_ms: d.step.as_millis() as u64,
            substeps: d.substeps,
            render_period_ms: d.render_period.as_millis() as u64,
            time_end_ms: d.time_end.map(|t| t.as_millis() as u64),
            simulate_real: d.simulate_real,
            ingress_capacity: d.ingress_capacity,
        }
    }
}

impl From<RawConfig> for KernelConfig {
    fn from(raw: RawConfig) -> Self {
        Self {
            step: Duration::from_millis(raw.step_ms),
            substeps: raw.substeps,
            render_period: Duration::from_millis(raw.render_period_ms),
            time_end: raw.time_end_ms.map(Duration::from_millis),
            simulate_real: raw.simulate_real,
            ingress_capacity: raw.ingress_capacity,
        }
    }
}
