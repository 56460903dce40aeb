use crate::config::LightConfig;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Uniform};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Stop,
    Go,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Stop => write!(f, "Stop"),
            Phase::Go => write!(f, "Go"),
        }
    }
}

impl Phase {
    pub fn toggled(self) -> Self {
        match self {
            Phase::Stop => Phase::Go,
            Phase::Go => Phase::Stop,
        }
    }

    pub(crate) fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Phase::Stop,
            _ => Phase::Go,
        }
    }
}

impl From<Phase> for u8 {
    fn from(phase: Phase) -> u8 {
        match phase {
            Phase::Stop => 0,
            Phase::Go => 1,
        }
    }
}

/// Draws cycle lengths uniformly from `[min_cycle, max_cycle)` at nanosecond
/// resolution.
pub struct CycleTimer {
    rng: StdRng,
    distribution: Uniform<u64>,
}

impl CycleTimer {
    /// Seeded from OS entropy so that separate lights drift apart.
    pub fn new(config: &LightConfig) -> Self {
        Self::from_rng(config, StdRng::from_entropy())
    }

    pub fn with_seed(config: &LightConfig, seed: u64) -> Self {
        Self::from_rng(config, StdRng::seed_from_u64(seed))
    }

    // callers hand in a validated config: min < max and max fits in u64 nanos
    fn from_rng(config: &LightConfig, rng: StdRng) -> Self {
        let low = config.min_cycle.as_nanos() as u64;
        let high = config.max_cycle.as_nanos() as u64;
        Self {
            rng,
            distribution: Uniform::new(low, high),
        }
    }

    pub fn next_duration(&mut self) -> Duration {
        Duration::from_nanos(self.distribution.sample(&mut self.rng))
    }
}

/// The toggle decision, driven by whatever clock the caller polls with.
pub struct PhaseCycle {
    phase: Phase,
    timer: CycleTimer,
    started: Instant,
    duration: Duration,
}

impl PhaseCycle {
    pub fn new(mut timer: CycleTimer, now: Instant) -> Self {
        let duration = timer.next_duration();
        Self {
            phase: Phase::Stop,
            timer,
            started: now,
            duration,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Returns the new phase once more than the drawn duration has passed
    /// since the last toggle, and starts the next cycle from `now`.
    pub fn poll(&mut self, now: Instant) -> Option<Phase> {
        if now.saturating_duration_since(self.started) <= self.duration {
            return None;
        }

        self.phase = self.phase.toggled();
        self.duration = self.timer.next_duration();
        self.started = now;
        Some(self.phase)
    }
}
