use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const CYCLE_MIN: Duration = Duration::from_secs(4);
pub const CYCLE_MAX: Duration = Duration::from_secs(6);
pub const POLL_INTERVAL: Duration = Duration::from_millis(1);

pub const ACCELERATED_CYCLE_MIN: Duration = Duration::from_millis(10);
pub const ACCELERATED_CYCLE_MAX: Duration = Duration::from_millis(20);

/// Timing for one light. Cycle lengths are drawn uniformly from
/// `[min_cycle, max_cycle)`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct LightConfig {
    pub min_cycle: Duration,
    pub max_cycle: Duration,
    pub poll_interval: Duration,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            min_cycle: CYCLE_MIN,
            max_cycle: CYCLE_MAX,
            poll_interval: POLL_INTERVAL,
        }
    }
}

impl LightConfig {
    pub fn accelerated() -> Self {
        Self {
            min_cycle: ACCELERATED_CYCLE_MIN,
            max_cycle: ACCELERATED_CYCLE_MAX,
            poll_interval: POLL_INTERVAL,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.min_cycle.is_zero() {
            return Err(Error::InvalidConfig("min_cycle must be positive".to_string()));
        }
        if self.min_cycle >= self.max_cycle {
            return Err(Error::InvalidConfig(format!(
                "min_cycle ({:?}) must be less than max_cycle ({:?})",
                self.min_cycle, self.max_cycle
            )));
        }
        // cycle lengths are drawn as u64 nanoseconds
        if u64::try_from(self.max_cycle.as_nanos()).is_err() {
            return Err(Error::InvalidConfig(format!(
                "max_cycle ({:?}) is too long",
                self.max_cycle
            )));
        }
        if self.poll_interval.is_zero() {
            return Err(Error::InvalidConfig("poll_interval must be positive".to_string()));
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, Error> {
        let config: LightConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }
}
