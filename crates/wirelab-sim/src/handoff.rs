//! Handoff State Machine — a drive between two base stations
//!
//! A vehicle drives the straight line between two base stations
//! `total_distance_m` apart. Each tick re-evaluates both received
//! signals from the log-distance model (with optional jitter) and runs
//! the selected handoff rule:
//!
//! - **Threshold**: hand off as soon as the *serving* signal sinks
//!   below `min_usable + margin`, ignoring the other cell entirely.
//!   Deliberately unstable — near the midpoint both signals are weak,
//!   so the serving cell flips every tick and the ping-pong flag lights
//!   up. That oscillation is the lesson.
//! - **Hysteresis**: hand off only when the *other* signal beats the
//!   serving one by `margin` dB. Requires a comparative advantage, so a
//!   single crossing of the midpoint produces a single handoff.
//!
//! The drop check runs before the handoff rule each tick: once the
//! serving signal falls below `min_usable` the call is lost, the run
//! halts, and movement stops.
//!
//! ## Example
//!
//! ```rust
//! use wirelab_sim::handoff::{HandoffAlgorithm, HandoffConfig, HandoffSimulator};
//!
//! let config = HandoffConfig {
//!     tx_power_dbm: 40.0,
//!     path_loss_exponent: 3.0,
//!     min_usable_dbm: -65.0,
//!     total_distance_m: 1000.0,
//!     speed_kmh: 72.0,
//!     noise_scale_db: 0.0,
//!     algorithm: HandoffAlgorithm::Hysteresis { margin_db: 6.0 },
//! };
//! let mut sim = HandoffSimulator::new(config).unwrap();
//! while !sim.is_finished() {
//!     sim.advance(0.5);
//! }
//! assert!(!sim.state().ping_pong);
//! ```

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use wirelab_core::path_loss::{jittered_power_dbm, received_power_dbm};
use wirelab_core::types::{kmh_to_ms, ModelError, ModelResult};

/// Handoff decision rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HandoffAlgorithm {
    /// Absolute rule: leave the serving cell when its signal falls
    /// below `min_usable + margin_db`.
    Threshold { margin_db: f64 },
    /// Relative rule: leave only when the other cell is `margin_db`
    /// stronger than the serving one.
    Hysteresis { margin_db: f64 },
}

/// Which base station currently carries the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServingCell {
    /// Base station at position 0.
    Cell1,
    /// Base station at `total_distance_m`.
    Cell2,
}

impl ServingCell {
    fn other(self) -> Self {
        match self {
            ServingCell::Cell1 => ServingCell::Cell2,
            ServingCell::Cell2 => ServingCell::Cell1,
        }
    }
}

/// What happened at a recorded position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandoffEventKind {
    /// The serving cell changed.
    Handoff,
    /// The call was lost; the run halted here.
    Drop,
}

/// One entry in the run's event trace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HandoffEvent {
    pub position_m: f64,
    pub kind: HandoffEventKind,
}

/// Scenario parameters. Both base stations transmit at the same power
/// over the same environment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HandoffConfig {
    pub tx_power_dbm: f64,
    /// Path-loss exponent γ of the environment.
    pub path_loss_exponent: f64,
    /// Signal floor below which a call cannot be sustained.
    pub min_usable_dbm: f64,
    /// Base-station separation in metres.
    pub total_distance_m: f64,
    pub speed_kmh: f64,
    /// Total width of the zero-mean uniform jitter on each signal, dB.
    pub noise_scale_db: f64,
    pub algorithm: HandoffAlgorithm,
}

impl HandoffConfig {
    fn validate(&self) -> ModelResult<()> {
        if self.path_loss_exponent <= 0.0 {
            return Err(ModelError::NonPositiveParameter {
                name: "path_loss_exponent",
                value: self.path_loss_exponent,
            });
        }
        if self.total_distance_m <= 0.0 {
            return Err(ModelError::NonPositiveParameter {
                name: "total_distance_m",
                value: self.total_distance_m,
            });
        }
        if self.speed_kmh <= 0.0 {
            return Err(ModelError::NonPositiveParameter {
                name: "speed_kmh",
                value: self.speed_kmh,
            });
        }
        if self.noise_scale_db < 0.0 {
            return Err(ModelError::NegativeParameter {
                name: "noise_scale_db",
                value: self.noise_scale_db,
            });
        }
        let margin = match self.algorithm {
            HandoffAlgorithm::Threshold { margin_db } => margin_db,
            HandoffAlgorithm::Hysteresis { margin_db } => margin_db,
        };
        if margin < 0.0 {
            return Err(ModelError::NegativeParameter {
                name: "margin_db",
                value: margin,
            });
        }
        Ok(())
    }
}

/// Read-only snapshot for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandoffState {
    pub serving_cell: ServingCell,
    pub position_m: f64,
    pub algorithm: HandoffAlgorithm,
    pub dropped: bool,
    pub ping_pong: bool,
    pub events: Vec<HandoffEvent>,
}

/// Tick-driven two-cell handoff simulator.
#[derive(Debug)]
pub struct HandoffSimulator {
    config: HandoffConfig,
    position_m: f64,
    serving: ServingCell,
    dropped: bool,
    ping_pong: bool,
    handoff_last_tick: bool,
    events: Vec<HandoffEvent>,
    rng: StdRng,
}

impl HandoffSimulator {
    /// Start a run at position 0, served by cell 1.
    pub fn new(config: HandoffConfig) -> ModelResult<Self> {
        config.validate()?;
        Ok(Self::build(config, StdRng::from_entropy()))
    }

    /// Start a run with a fixed jitter seed for reproducible trajectories.
    pub fn with_seed(config: HandoffConfig, seed: u64) -> ModelResult<Self> {
        config.validate()?;
        Ok(Self::build(config, StdRng::seed_from_u64(seed)))
    }

    fn build(config: HandoffConfig, rng: StdRng) -> Self {
        Self {
            config,
            position_m: 0.0,
            serving: ServingCell::Cell1,
            dropped: false,
            ping_pong: false,
            handoff_last_tick: false,
            events: Vec::new(),
            rng,
        }
    }

    /// Current configuration.
    pub fn config(&self) -> &HandoffConfig {
        &self.config
    }

    /// True once the run has halted: dropped, or arrived at cell 2.
    pub fn is_finished(&self) -> bool {
        self.dropped || self.position_m >= self.config.total_distance_m
    }

    /// Jitter-free mean signals `(cell1, cell2)` at the current
    /// position, for the overlay curves.
    pub fn signal_levels(&self) -> (f64, f64) {
        (
            self.mean_signal(ServingCell::Cell1, self.position_m),
            self.mean_signal(ServingCell::Cell2, self.position_m),
        )
    }

    fn mean_signal(&self, cell: ServingCell, position_m: f64) -> f64 {
        let distance = match cell {
            ServingCell::Cell1 => position_m,
            ServingCell::Cell2 => self.config.total_distance_m - position_m,
        };
        received_power_dbm(
            self.config.tx_power_dbm,
            distance,
            self.config.path_loss_exponent,
        )
    }

    /// Advance the drive by one timestep.
    ///
    /// Order within a tick: move, drop check on the serving signal,
    /// then the handoff rule. No-op once the run has finished.
    ///
    /// # Panics
    ///
    /// Panics if `dt` is not positive.
    pub fn advance(&mut self, dt: f64) {
        assert!(dt > 0.0, "tick length must be positive, got {dt}");
        if self.is_finished() {
            return;
        }

        self.position_m = (self.position_m + kmh_to_ms(self.config.speed_kmh) * dt)
            .min(self.config.total_distance_m);

        let signal1 = jittered_power_dbm(
            self.mean_signal(ServingCell::Cell1, self.position_m),
            self.config.noise_scale_db,
            &mut self.rng,
        );
        let signal2 = jittered_power_dbm(
            self.mean_signal(ServingCell::Cell2, self.position_m),
            self.config.noise_scale_db,
            &mut self.rng,
        );
        let (serving_signal, other_signal) = match self.serving {
            ServingCell::Cell1 => (signal1, signal2),
            ServingCell::Cell2 => (signal2, signal1),
        };

        if serving_signal < self.config.min_usable_dbm {
            self.dropped = true;
            self.ping_pong = false;
            self.handoff_last_tick = false;
            self.events.push(HandoffEvent {
                position_m: self.position_m,
                kind: HandoffEventKind::Drop,
            });
            warn!(
                position_m = self.position_m,
                serving_signal, "call dropped below usable floor"
            );
            return;
        }

        let switch = match self.config.algorithm {
            HandoffAlgorithm::Threshold { margin_db } => {
                serving_signal < self.config.min_usable_dbm + margin_db
            }
            HandoffAlgorithm::Hysteresis { margin_db } => {
                other_signal > serving_signal + margin_db
            }
        };

        if switch {
            self.serving = self.serving.other();
            self.events.push(HandoffEvent {
                position_m: self.position_m,
                kind: HandoffEventKind::Handoff,
            });
            debug!(
                position_m = self.position_m,
                serving = ?self.serving,
                "handoff"
            );
            if self.handoff_last_tick {
                self.ping_pong = true;
            }
            self.handoff_last_tick = true;
        } else {
            self.ping_pong = false;
            self.handoff_last_tick = false;
        }
    }

    /// Read-only snapshot for rendering.
    pub fn state(&self) -> HandoffState {
        HandoffState {
            serving_cell: self.serving,
            position_m: self.position_m,
            algorithm: self.config.algorithm,
            dropped: self.dropped,
            ping_pong: self.ping_pong,
            events: self.events.clone(),
        }
    }
}

/// Position where the hysteresis rule predicts the handoff: the point
/// where cell 2's signal exceeds cell 1's by exactly the margin.
///
/// With `f = 10^(H / 10γ)` the closed form is `D·f / (1 + f)`.
///
/// # Panics
///
/// Panics if `total_distance_m` or `exponent` is not positive, or the
/// margin is negative.
pub fn hysteresis_crossover(total_distance_m: f64, margin_db: f64, exponent: f64) -> f64 {
    assert!(
        total_distance_m > 0.0,
        "total distance must be positive, got {total_distance_m}"
    );
    assert!(exponent > 0.0, "exponent must be positive, got {exponent}");
    assert!(margin_db >= 0.0, "margin must not be negative, got {margin_db}");

    let factor = 10f64.powf(margin_db / (10.0 * exponent));
    total_distance_m * factor / (1.0 + factor)
}

/// Position where the threshold rule predicts the handoff: where the
/// serving signal crosses `min_usable + margin`.
///
/// # Panics
///
/// Panics if `exponent` is not positive or the margin is negative.
pub fn threshold_crossover(
    tx_power_dbm: f64,
    min_usable_dbm: f64,
    margin_db: f64,
    exponent: f64,
) -> f64 {
    assert!(exponent > 0.0, "exponent must be positive, got {exponent}");
    assert!(margin_db >= 0.0, "margin must not be negative, got {margin_db}");

    10f64.powf((tx_power_dbm - min_usable_dbm - margin_db) / (10.0 * exponent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn hysteresis_config() -> HandoffConfig {
        HandoffConfig {
            tx_power_dbm: 40.0,
            path_loss_exponent: 3.0,
            min_usable_dbm: -65.0,
            total_distance_m: 1000.0,
            speed_kmh: 72.0, // 20 m/s
            noise_scale_db: 0.0,
            algorithm: HandoffAlgorithm::Hysteresis { margin_db: 6.0 },
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(HandoffSimulator::new(hysteresis_config()).is_ok());

        let mut bad = hysteresis_config();
        bad.total_distance_m = 0.0;
        assert!(HandoffSimulator::new(bad).is_err());

        let mut bad = hysteresis_config();
        bad.noise_scale_db = -1.0;
        assert!(HandoffSimulator::new(bad).is_err());

        let mut bad = hysteresis_config();
        bad.algorithm = HandoffAlgorithm::Hysteresis { margin_db: -2.0 };
        assert!(HandoffSimulator::new(bad).is_err());
    }

    #[test]
    fn test_hysteresis_single_handoff_no_ping_pong() {
        let config = hysteresis_config();
        let mut sim = HandoffSimulator::with_seed(config, 42).expect("valid config");

        let mut ever_ping_ponged = false;
        for _ in 0..200 {
            sim.advance(0.5);
            ever_ping_ponged |= sim.state().ping_pong;
            if sim.is_finished() {
                break;
            }
        }

        let state = sim.state();
        assert!(!state.dropped, "run dropped unexpectedly");
        assert!(!ever_ping_ponged, "hysteresis rule ping-ponged");
        assert_eq!(state.serving_cell, ServingCell::Cell2);

        let handoffs: Vec<_> = state
            .events
            .iter()
            .filter(|e| e.kind == HandoffEventKind::Handoff)
            .collect();
        assert_eq!(handoffs.len(), 1, "expected exactly one handoff");

        // Handoff fires within one tick (10 m) of the predicted point
        let predicted = hysteresis_crossover(
            config.total_distance_m,
            6.0,
            config.path_loss_exponent,
        );
        assert!(
            (handoffs[0].position_m - predicted).abs() < 15.0,
            "handoff at {} m, predicted {} m",
            handoffs[0].position_m,
            predicted
        );
    }

    #[test]
    fn test_threshold_rule_ping_pongs_near_midpoint() {
        // Near the midpoint both signals sit below min_usable + margin,
        // so the serving cell flips every tick until the car clears the
        // weak zone
        let config = HandoffConfig {
            tx_power_dbm: 40.0,
            path_loss_exponent: 3.0,
            min_usable_dbm: -50.0,
            total_distance_m: 1000.0,
            speed_kmh: 36.0, // 10 m/s
            noise_scale_db: 1.0,
            algorithm: HandoffAlgorithm::Threshold { margin_db: 10.0 },
        };
        let mut sim = HandoffSimulator::with_seed(config, 1234).expect("valid config");

        let mut ping_pong_seen_after = None;
        for ticks in 0..400 {
            sim.advance(0.25);
            if sim.state().ping_pong {
                ping_pong_seen_after = Some(ticks + 1);
                break;
            }
            if sim.is_finished() {
                break;
            }
        }

        let ticks = ping_pong_seen_after.expect("threshold rule never ping-ponged");
        assert!(ticks < 250, "ping-pong took {ticks} ticks to appear");

        let handoffs = sim
            .state()
            .events
            .iter()
            .filter(|e| e.kind == HandoffEventKind::Handoff)
            .count();
        assert!(handoffs >= 2, "ping-pong flag with {handoffs} handoffs");
    }

    #[test]
    fn test_drop_halts_the_run() {
        // Usable floor high enough that the far cell is unusable when
        // the threshold rule hands the call over
        let config = HandoffConfig {
            tx_power_dbm: 40.0,
            path_loss_exponent: 3.0,
            min_usable_dbm: -30.0,
            total_distance_m: 1000.0,
            speed_kmh: 36.0,
            noise_scale_db: 0.0,
            algorithm: HandoffAlgorithm::Threshold { margin_db: 5.0 },
        };
        let mut sim = HandoffSimulator::with_seed(config, 5).expect("valid config");

        for _ in 0..400 {
            sim.advance(0.5);
            if sim.is_finished() {
                break;
            }
        }

        let state = sim.state();
        assert!(state.dropped);
        assert!(sim.is_finished());
        let last = state.events.last().expect("drop event recorded");
        assert_eq!(last.kind, HandoffEventKind::Drop);

        // Movement stops: further ticks leave the position untouched
        let frozen = state.position_m;
        sim.advance(0.5);
        sim.advance(0.5);
        assert_eq!(sim.state().position_m, frozen);
    }

    #[test]
    fn test_position_clamps_at_far_boundary() {
        let config = hysteresis_config();
        let mut sim = HandoffSimulator::with_seed(config, 2).expect("valid config");
        for _ in 0..500 {
            sim.advance(0.5);
        }
        assert!(sim.state().position_m <= config.total_distance_m);
        assert!(sim.is_finished());
    }

    #[test]
    fn test_hysteresis_crossover_closed_form() {
        // Zero margin: equal signals, exactly the midpoint
        assert_relative_eq!(hysteresis_crossover(1000.0, 0.0, 3.0), 500.0, epsilon = 1e-9);

        // At the predicted position the signal difference equals the margin
        let (total, margin, gamma) = (1000.0, 6.0, 3.0);
        let p = hysteresis_crossover(total, margin, gamma);
        let s1 = received_power_dbm(40.0, p, gamma);
        let s2 = received_power_dbm(40.0, total - p, gamma);
        assert_relative_eq!(s2 - s1, margin, epsilon = 1e-9);
    }

    #[test]
    fn test_threshold_crossover_closed_form() {
        let (tx, min, margin, gamma) = (40.0, -50.0, 10.0, 3.0);
        let p = threshold_crossover(tx, min, margin, gamma);
        assert_relative_eq!(p, 464.16, epsilon = 0.01);
        // The serving signal at the crossover equals min_usable + margin
        assert_relative_eq!(received_power_dbm(tx, p, gamma), min + margin, epsilon = 1e-9);
    }

    #[test]
    fn test_signal_levels_are_symmetric_at_midpoint() {
        let config = hysteresis_config();
        let mut sim = HandoffSimulator::with_seed(config, 3).expect("valid config");
        // Drive to the midpoint: 500 m at 20 m/s
        for _ in 0..50 {
            sim.advance(0.5);
        }
        assert_relative_eq!(sim.state().position_m, 500.0, epsilon = 1e-9);
        let (s1, s2) = sim.signal_levels();
        assert_relative_eq!(s1, s2, epsilon = 1e-9);
    }

    #[test]
    #[should_panic(expected = "must be positive")]
    fn test_zero_dt_panics() {
        let mut sim = HandoffSimulator::with_seed(hysteresis_config(), 0).expect("valid config");
        sim.advance(0.0);
    }
}
