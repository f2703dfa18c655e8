//! Static runtime configuration, validated at construction.
use thiserror::Error;

/// Errors produced by [`RuntimeConfig::validate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A tick must be allowed to carry at least one delta.
    #[error("max_deltas_per_tick must be at least 1")]
    ZeroDeltaBudget,
}

/// Tuning knobs for the tick pipeline.
///
/// The arbiter budgets configure the preflight/finalize stages that the
/// current pipeline bypasses; they are retained so hosts can set them
/// ahead of that stage being wired in.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RuntimeConfig {
    /// Fencing threshold: deltas beyond this count are deferred from the
    /// tick (see the ingestion step).
    pub max_deltas_per_tick: usize,
    /// Millisecond budget for per-delta arbiter preflight.
    pub ap_preflight_budget_ms: u32,
    /// Millisecond budget for arbiter snapshot finalization.
    pub ap_finalize_budget_ms: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_deltas_per_tick: 1024,
            ap_preflight_budget_ms: 5,
            ap_finalize_budget_ms: 10,
        }
    }
}

impl RuntimeConfig {
    /// Checks the configuration invariants.
    ///
    /// # Errors
    /// Returns [`ConfigError::ZeroDeltaBudget`] when `max_deltas_per_tick`
    /// is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_deltas_per_tick == 0 {
            return Err(ConfigError::ZeroDeltaBudget);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = RuntimeConfig::default();
        assert_eq!(config.max_deltas_per_tick, 1024);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn zero_delta_budget_is_rejected() {
        let config = RuntimeConfig {
            max_deltas_per_tick: 0,
            ..RuntimeConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroDeltaBudget));
    }
}
