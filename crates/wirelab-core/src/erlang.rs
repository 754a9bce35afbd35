//! Erlang-B Traffic Theory — blocking probability for a loss system
//!
//! Implements the classic M/M/C/C trunking model used to dimension
//! channel pools: `C` servers, Poisson arrivals, exponential holding
//! times, no queue. An arrival that finds every channel busy is blocked
//! and lost.
//!
//! The blocking probability is evaluated with the numerically stable
//! recursion
//!
//! ```text
//! B(0) = 1
//! B(c) = A·B(c-1) / (c + A·B(c-1))
//! ```
//!
//! rather than the textbook factorial form, which overflows past a few
//! hundred channels.
//!
//! ## Example
//!
//! ```rust
//! use wirelab_core::erlang::{erlang_b, state_probabilities};
//!
//! // One channel offered one Erlang blocks half the traffic
//! assert!((erlang_b(1, 1.0) - 0.5).abs() < 1e-12);
//!
//! // State occupancy distribution sums to one
//! let p = state_probabilities(10, 5.0);
//! assert_eq!(p.len(), 11);
//! let total: f64 = p.iter().sum();
//! assert!((total - 1.0).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};

use crate::types::{ModelError, ModelResult};

/// Blocking probability of a loss system with `channels` servers and
/// `load` Erlangs of offered traffic.
///
/// Returns `0.0` for zero offered load. With `channels == 0` and a
/// positive load the recursion base case is returned unchanged: a
/// zero-server system blocks every arrival, so `B = 1`.
///
/// # Panics
///
/// Panics if `load` is negative.
pub fn erlang_b(channels: u32, load: f64) -> f64 {
    assert!(load >= 0.0, "offered load must not be negative, got {load}");
    if load == 0.0 {
        return 0.0;
    }

    let mut b = 1.0;
    for c in 1..=channels {
        b = load * b / (c as f64 + load * b);
    }
    b
}

/// Steady-state probability of finding `i` channels busy, for
/// `i = 0..=channels`.
///
/// Computes the unnormalized terms `p_0 = 1`, `p_i = p_{i-1}·load/i`
/// and normalizes by their sum, so the result always sums to one.
///
/// # Panics
///
/// Panics if `load` is negative.
pub fn state_probabilities(channels: u32, load: f64) -> Vec<f64> {
    assert!(load >= 0.0, "offered load must not be negative, got {load}");

    let mut terms = Vec::with_capacity(channels as usize + 1);
    let mut p = 1.0;
    terms.push(p);
    for i in 1..=channels {
        p *= load / i as f64;
        terms.push(p);
    }

    let sum: f64 = terms.iter().sum();
    terms.iter().map(|t| t / sum).collect()
}

/// Smallest channel count whose blocking probability does not exceed
/// `target` for the given offered load.
///
/// Walks the Erlang-B recursion incrementally, so large answers stay
/// cheap and overflow-free.
///
/// # Panics
///
/// Panics if `load` is negative or `target` is outside `(0, 1]`.
pub fn channels_for_blocking(load: f64, target: f64) -> u32 {
    assert!(load >= 0.0, "offered load must not be negative, got {load}");
    assert!(
        target > 0.0 && target <= 1.0,
        "target blocking must be in (0, 1], got {target}"
    );
    if load == 0.0 {
        return 0;
    }

    let mut b = 1.0;
    let mut c = 0u32;
    while b > target {
        c += 1;
        b = load * b / (c as f64 + load * b);
    }
    c
}

/// Offered-traffic description of a trunked channel pool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrafficParameters {
    /// Number of trunked channels (servers).
    pub channels: u32,
    /// Call arrival rate (calls per unit time).
    pub arrival_rate: f64,
    /// Per-call service rate (1 / mean holding time).
    pub service_rate: f64,
}

impl TrafficParameters {
    /// Validated constructor: at least one channel, strictly positive rates.
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

    /// Evaluate the closed-form model for these parameters.
    pub fn blocking(&self) -> BlockingResult {
        let load = self.offered_load();
        BlockingResult {
            blocking_probability: erlang_b(self.channels, load),
            state_probabilities: state_probabilities(self.channels, load),
        }
    }
}

/// Read-only snapshot of an Erlang-B evaluation, consumed by the
/// rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockingResult {
    /// Probability an arriving call finds all channels busy.
    pub blocking_probability: f64,
    /// Probability of `i` busy channels, indexed `0..=channels`.
    pub state_probabilities: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_known_value_one_channel() {
        assert_relative_eq!(erlang_b(1, 1.0), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_known_value_erlang_table() {
        // Standard Erlang-B table: 10 channels, 5 Erlangs -> ~1.84%
        assert_relative_eq!(erlang_b(10, 5.0), 0.0184, epsilon = 5e-4);
    }

    #[test]
    fn test_zero_load_never_blocks() {
        assert_eq!(erlang_b(0, 0.0), 0.0);
        assert_eq!(erlang_b(10, 0.0), 0.0);
    }

    #[test]
    fn test_zero_channels_block_everything() {
        assert_relative_eq!(erlang_b(0, 3.0), 1.0, epsilon = 1e-12);
    }

    #[test]
    #[should_panic(expected = "must not be negative")]
    fn test_negative_load_panics() {
        erlang_b(4, -1.0);
    }

    #[test]
    fn test_monotone_in_load() {
        let mut prev = 0.0;
        for i in 1..=50 {
            let load = i as f64 * 0.5;
            let b = erlang_b(8, load);
            assert!(
                b >= prev,
                "blocking decreased from {prev} to {b} at load {load}"
            );
            prev = b;
        }
    }

    #[test]
    fn test_monotone_in_channels() {
        let mut prev = 1.0;
        for channels in 1..=40 {
            let b = erlang_b(channels, 6.0);
            assert!(
                b <= prev,
                "blocking increased from {prev} to {b} at {channels} channels"
            );
            prev = b;
        }
    }

    #[test]
    fn test_state_probabilities_normalize() {
        for &(channels, load) in &[(1u32, 0.5), (5, 2.0), (10, 5.0), (30, 25.0), (50, 10.0)] {
            let p = state_probabilities(channels, load);
            assert_eq!(p.len(), channels as usize + 1);
            let sum: f64 = p.iter().sum();
            assert_relative_eq!(sum, 1.0, epsilon = 1e-9);
            assert!(p.iter().all(|&v| (0.0..=1.0).contains(&v)));
        }
    }

    #[test]
    fn test_state_probabilities_known_distribution() {
        // channels=2, load=1: unnormalized terms [1, 1, 0.5] -> [0.4, 0.4, 0.2]
        let p = state_probabilities(2, 1.0);
        assert_relative_eq!(p[0], 0.4, epsilon = 1e-12);
        assert_relative_eq!(p[1], 0.4, epsilon = 1e-12);
        assert_relative_eq!(p[2], 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_tail_state_matches_blocking() {
        // P(all busy) from the state distribution is the blocking probability
        let p = state_probabilities(10, 5.0);
        assert_relative_eq!(p[10], erlang_b(10, 5.0), epsilon = 1e-12);
    }

    #[test]
    fn test_channels_for_blocking() {
        // B(9, 5.0) ~ 2.9% > 2%, B(10, 5.0) ~ 1.84% <= 2%
        assert_eq!(channels_for_blocking(5.0, 0.02), 10);
        assert_eq!(channels_for_blocking(0.0, 0.01), 0);

        let c = channels_for_blocking(12.0, 0.05);
        assert!(erlang_b(c, 12.0) <= 0.05);
        assert!(erlang_b(c - 1, 12.0) > 0.05);
    }

    #[test]
    fn test_traffic_parameters_validation() {
        assert!(TrafficParameters::new(10, 2.0, 0.5).is_ok());
        assert!(TrafficParameters::new(0, 2.0, 0.5).is_err());
        assert!(TrafficParameters::new(10, 0.0, 0.5).is_err());
        assert!(TrafficParameters::new(10, 2.0, -0.5).is_err());
    }

    #[test]
    fn test_traffic_parameters_blocking() {
        let params = TrafficParameters::new(10, 5.0, 1.0).expect("valid parameters");
        assert_relative_eq!(params.offered_load(), 5.0, epsilon = 1e-12);

        let result = params.blocking();
        assert_relative_eq!(result.blocking_probability, erlang_b(10, 5.0), epsilon = 1e-12);
        assert_eq!(result.state_probabilities.len(), 11);
    }
}
