//! Channel-Occupancy Monte Carlo — the trunking model made visible
//!
//! Simulates the same M/M/C/C birth–death process the Erlang-B formula
//! solves in closed form, one fixed timestep at a time, so learners can
//! watch the empirical blocking rate wander toward the theoretical
//! value.
//!
//! Each tick runs an ordered two-phase step: the arrival phase draws
//! against `λ·dt` (a blocked arrival counts as a drop), then the
//! departure phase independently draws against `busy·μ·dt`. When both
//! phases fire in one tick the arrival owns the tick's slot in the
//! bounded event log; the departure still frees its channel.
//!
//! ## Example
//!
//! ```rust
//! use wirelab_sim::occupancy::{OccupancyConfig, OccupancySimulator};
//!
//! let config = OccupancyConfig::new(10, 5.0, 1.0).unwrap();
//! let mut sim = OccupancySimulator::with_seed(config, 42);
//! for _ in 0..1000 {
//!     sim.tick(0.1);
//! }
//! let state = sim.state();
//! assert!(state.busy_channels <= 10);
//! assert!(state.total_calls >= state.dropped_calls);
//! ```

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use wirelab_core::erlang::erlang_b;
use wirelab_core::types::{ModelError, ModelResult};

/// The event ring keeps only this many recent entries — a strip of
/// recent activity for the display, not a full history.
pub const EVENT_LOG_CAPACITY: usize = 5;

/// What happened in a logged tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OccupancyEventKind {
    /// An arriving call found a free channel.
    Success,
    /// An arriving call found every channel busy and was lost.
    Drop,
    /// A call finished and released its channel.
    End,
}

/// One entry in the bounded event log.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OccupancyEvent {
    pub kind: OccupancyEventKind,
    /// Simulation time at which the event occurred.
    pub time: f64,
}

/// Validated simulator parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OccupancyConfig {
    /// Number of trunked channels.
    pub channels: u32,
    /// Call arrival rate λ (calls per unit time).
    pub arrival_rate: f64,
    /// Per-call service rate μ (1 / mean holding time).
    pub service_rate: f64,
}

impl OccupancyConfig {
    /// At least one channel, strictly positive rates.
    pub fn new(channels: u32, arrival_rate: f64, service_rate: f64) -> ModelResult<Self> {
        if channels == 0 {
            return Err(ModelError::NonPositiveParameter {
                name: "channels",
                value: 0.0,
            });
        }
        if arrival_rate <= 0.0 {
            return Err(ModelError::NonPositiveParameter {
                name: "arrival_rate",
                value: arrival_rate,
            });
        }
        if service_rate <= 0.0 {
            return Err(ModelError::NonPositiveParameter {
                name: "service_rate",
                value: service_rate,
            });
        }
        Ok(Self {
            channels,
            arrival_rate,
            service_rate,
        })
    }

    /// Offered traffic in Erlangs, `λ/μ`.
    pub fn offered_load(&self) -> f64 {
        self.arrival_rate / self.service_rate
    }
}

/// Read-only snapshot for the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupancyState {
    pub busy_channels: u32,
    pub total_calls: u64,
    pub dropped_calls: u64,
    pub time: f64,
    /// Most recent events, oldest first, at most [`EVENT_LOG_CAPACITY`].
    pub events: Vec<OccupancyEvent>,
}

/// Fixed-timestep birth–death simulator of a trunked channel pool.
#[derive(Debug)]
pub struct OccupancySimulator {
    config: OccupancyConfig,
    busy: u32,
    total_calls: u64,
    dropped_calls: u64,
    time: f64,
    events: VecDeque<OccupancyEvent>,
    rng: StdRng,
    seed: Option<u64>,
}

impl OccupancySimulator {
    /// Create a simulator with entropy-seeded randomness.
    pub fn new(config: OccupancyConfig) -> Self {
        Self::build(config, StdRng::from_entropy(), None)
    }

    /// Create a simulator with a fixed seed for reproducible runs.
    pub fn with_seed(config: OccupancyConfig, seed: u64) -> Self {
        Self::build(config, StdRng::seed_from_u64(seed), Some(seed))
    }

    fn build(config: OccupancyConfig, rng: StdRng, seed: Option<u64>) -> Self {
        Self {
            config,
            busy: 0,
            total_calls: 0,
            dropped_calls: 0,
            time: 0.0,
            events: VecDeque::with_capacity(EVENT_LOG_CAPACITY),
            rng,
            seed,
        }
    }

    /// Current configuration.
    pub fn config(&self) -> &OccupancyConfig {
        &self.config
    }

    /// Advance the simulation by one timestep.
    ///
    /// # Panics
    ///
    /// Panics if `dt` is not positive, or if `dt` is large enough that
    /// either event probability exceeds one — the caller owns choosing a
    /// timestep small enough for the discretization to be valid; this is
    /// never clamped silently.
    pub fn tick(&mut self, dt: f64) {
        assert!(dt > 0.0, "tick length must be positive, got {dt}");
        let arrival_p = self.config.arrival_rate * dt;
        let departure_p = self.busy as f64 * self.config.service_rate * dt;
        assert!(
            arrival_p <= 1.0 && departure_p <= 1.0,
            "tick length {dt} pushes an event probability above 1; pick a smaller dt"
        );

        self.time += dt;

        // Arrival phase: a blocked arrival wins the tick's log slot
        let mut slot_taken = false;
        if self.rng.gen::<f64>() < arrival_p {
            self.total_calls += 1;
            if self.busy < self.config.channels {
                self.busy += 1;
                self.log(OccupancyEventKind::Success);
            } else {
                self.dropped_calls += 1;
                debug!(time = self.time, "call blocked, all channels busy");
                self.log(OccupancyEventKind::Drop);
            }
            slot_taken = true;
        }

        // Departure phase: always frees the channel, only logs when the
        // arrival phase left the slot open
        if self.rng.gen::<f64>() < departure_p && self.busy > 0 {
            self.busy -= 1;
            if !slot_taken {
                self.log(OccupancyEventKind::End);
            }
        }
    }

    fn log(&mut self, kind: OccupancyEventKind) {
        self.events.push_back(OccupancyEvent {
            kind,
            time: self.time,
        });
        while self.events.len() > EVENT_LOG_CAPACITY {
            self.events.pop_front();
        }
    }

    /// Number of busy channels right now.
    pub fn busy_channels(&self) -> u32 {
        self.busy
    }

    /// Fraction of arrivals blocked so far; zero before the first arrival.
    pub fn empirical_blocking(&self) -> f64 {
        if self.total_calls == 0 {
            0.0
        } else {
            self.dropped_calls as f64 / self.total_calls as f64
        }
    }

    /// The Erlang-B prediction for this configuration, for side-by-side
    /// display against [`Self::empirical_blocking`].
    pub fn theoretical_blocking(&self) -> f64 {
        erlang_b(self.config.channels, self.config.offered_load())
    }

    /// Read-only snapshot for rendering.
    pub fn state(&self) -> OccupancyState {
        OccupancyState {
            busy_channels: self.busy,
            total_calls: self.total_calls,
            dropped_calls: self.dropped_calls,
            time: self.time,
            events: self.events.iter().copied().collect(),
        }
    }

    /// Zero every counter and clear the event log. A fixed seed (if
    /// any) is reapplied so a re-run reproduces the same draws.
    pub fn reset(&mut self) {
        self.busy = 0;
        self.total_calls = 0;
        self.dropped_calls = 0;
        self.time = 0.0;
        self.events.clear();
        if let Some(seed) = self.seed {
            self.rng = StdRng::seed_from_u64(seed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn saturated_config() -> OccupancyConfig {
        // λ·dt = 1 and μ·dt = 1 at dt = 0.1: every draw fires, making
        // the trajectory deterministic regardless of the RNG
        OccupancyConfig::new(1, 10.0, 10.0).expect("valid config")
    }

    #[test]
    fn test_config_validation() {
        assert!(OccupancyConfig::new(5, 2.0, 1.0).is_ok());
        assert!(OccupancyConfig::new(0, 2.0, 1.0).is_err());
        assert!(OccupancyConfig::new(5, 0.0, 1.0).is_err());
        assert!(OccupancyConfig::new(5, 2.0, -1.0).is_err());
    }

    #[test]
    fn test_saturated_alternation() {
        // Odd ticks admit a call, even ticks block one and free the
        // channel: Success, Drop, Success, Drop, ...
        let mut sim = OccupancySimulator::with_seed(saturated_config(), 0);
        for _ in 0..6 {
            sim.tick(0.1);
        }
        let state = sim.state();
        assert_eq!(state.total_calls, 6);
        assert_eq!(state.dropped_calls, 3);
        assert_eq!(state.busy_channels, 0);
        assert_relative_eq!(sim.empirical_blocking(), 0.5, epsilon = 1e-12);

        let kinds: Vec<_> = state.events.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                OccupancyEventKind::Drop,
                OccupancyEventKind::Success,
                OccupancyEventKind::Drop,
                OccupancyEventKind::Success,
                OccupancyEventKind::Drop,
            ]
        );
    }

    #[test]
    fn test_event_log_stays_bounded() {
        let mut sim = OccupancySimulator::with_seed(saturated_config(), 1);
        for _ in 0..50 {
            sim.tick(0.1);
            assert!(sim.state().events.len() <= EVENT_LOG_CAPACITY);
        }
        assert_eq!(sim.state().events.len(), EVENT_LOG_CAPACITY);
    }

    #[test]
    fn test_invariants_hold_over_random_run() {
        let config = OccupancyConfig::new(6, 4.0, 1.5).expect("valid config");
        let mut sim = OccupancySimulator::with_seed(config, 123);
        for _ in 0..5000 {
            sim.tick(0.05);
            let state = sim.state();
            assert!(state.busy_channels <= config.channels);
            assert!(state.dropped_calls <= state.total_calls);
        }
        let blocking = sim.empirical_blocking();
        assert!((0.0..=1.0).contains(&blocking));
    }

    #[test]
    fn test_empirical_blocking_approaches_erlang_b() {
        // Illustrative simulator, loose tolerance: 4 channels at 4
        // Erlangs should land near B(4, 4) ~ 0.3106
        let config = OccupancyConfig::new(4, 4.0, 1.0).expect("valid config");
        let mut sim = OccupancySimulator::with_seed(config, 7);
        for _ in 0..150_000 {
            sim.tick(0.02);
        }
        let empirical = sim.empirical_blocking();
        let theoretical = sim.theoretical_blocking();
        assert_relative_eq!(theoretical, 0.3106, epsilon = 1e-3);
        assert!(
            (empirical - theoretical).abs() < 0.05,
            "empirical {empirical} too far from theoretical {theoretical}"
        );
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let config = OccupancyConfig::new(6, 4.0, 1.5).expect("valid config");
        let run = |seed| {
            let mut sim = OccupancySimulator::with_seed(config, seed);
            for _ in 0..1000 {
                sim.tick(0.05);
            }
            sim.state()
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn test_reset_reproduces_the_run() {
        let config = OccupancyConfig::new(6, 4.0, 1.5).expect("valid config");
        let mut sim = OccupancySimulator::with_seed(config, 9);
        for _ in 0..500 {
            sim.tick(0.05);
        }
        let first = sim.state();

        sim.reset();
        let cleared = sim.state();
        assert_eq!(cleared.busy_channels, 0);
        assert_eq!(cleared.total_calls, 0);
        assert_eq!(cleared.time, 0.0);
        assert!(cleared.events.is_empty());

        for _ in 0..500 {
            sim.tick(0.05);
        }
        assert_eq!(sim.state(), first);
    }

    #[test]
    #[should_panic(expected = "pick a smaller dt")]
    fn test_oversized_dt_panics() {
        let config = OccupancyConfig::new(1, 10.0, 1.0).expect("valid config");
        let mut sim = OccupancySimulator::with_seed(config, 0);
        sim.tick(0.5); // arrival probability would be 5
    }

    #[test]
    #[should_panic(expected = "must be positive")]
    fn test_zero_dt_panics() {
        let mut sim = OccupancySimulator::with_seed(saturated_config(), 0);
        sim.tick(0.0);
    }
}
