//! Geometric Multipath Channel — power-delay profile from scene geometry
//!
//! Builds a power-delay profile for a transmitter, a receiver, and a set
//! of reflecting buildings laid out on a 2-D canvas. The line-of-sight
//! path travels directly; each reflector contributes one non-LOS path
//! whose length is the two-segment route transmitter→reflector→receiver.
//!
//! Per path:
//!
//! ```text
//! delay     = distance / propagation_speed
//! amplitude = K / distance^γ            (LOS)
//! amplitude = K·Γ / distance^γ          (NLOS, Γ = reflection coefficient)
//! ```
//!
//! The profile is sorted ascending by delay. The LOS path normally sorts
//! first because it is the geometrically shortest route, but that is
//! established by the sort, never assumed.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::SPEED_OF_LIGHT;

/// A point on the 2-D scene canvas, metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Channel-model constants for the scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MultipathConfig {
    /// Propagation speed in scene units per second. Defaults to c; the
    /// rendering layer may substitute a scaled value so delays land in a
    /// range its animation can show.
    pub propagation_speed: f64,
    /// Path-loss exponent `γ` for the amplitude law.
    pub path_loss_exponent: f64,
    /// Reference amplitude `K` at one metre.
    pub reference_amplitude: f64,
    /// Energy fraction surviving a bounce, `Γ` in (0, 1].
    pub reflection_coefficient: f64,
}

impl Default for MultipathConfig {
    fn default() -> Self {
        Self {
            propagation_speed: SPEED_OF_LIGHT,
            path_loss_exponent: 2.0,
            reference_amplitude: 1.0,
            reflection_coefficient: 0.7,
        }
    }
}

/// Identifies which route a path took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathKind {
    /// Direct line-of-sight path.
    Los,
    /// Reflected path via reflector `k` (1-based for display).
    Nlos(usize),
}

impl fmt::Display for PathKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathKind::Los => write!(f, "LOS"),
            PathKind::Nlos(k) => write!(f, "NLOS {k}"),
        }
    }
}

/// One arrival in the power-delay profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MultipathPath {
    pub kind: PathKind,
    /// Total route length in metres.
    pub distance_m: f64,
    /// Arrival delay in seconds.
    pub delay_s: f64,
    /// Linear amplitude (> 0).
    pub amplitude: f64,
}

/// The channel's multipath structure: one LOS arrival plus one NLOS
/// arrival per reflector, sorted ascending by delay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerDelayProfile {
    paths: Vec<MultipathPath>,
}

impl PowerDelayProfile {
    /// All arrivals, ascending by delay.
    pub fn paths(&self) -> &[MultipathPath] {
        &self.paths
    }

    /// The line-of-sight arrival.
    pub fn los(&self) -> &MultipathPath {
        self.paths
            .iter()
            .find(|p| p.kind == PathKind::Los)
            .expect("profile always contains the LOS path")
    }

    /// Maximum delay spread: last arrival minus first arrival.
    pub fn max_delay_spread(&self) -> f64 {
        match (self.paths.first(), self.paths.last()) {
            (Some(first), Some(last)) => last.delay_s - first.delay_s,
            _ => 0.0,
        }
    }

    /// RMS delay spread, the power-weighted second moment of the
    /// arrival delays. The standard single-number ISI indicator.
    pub fn rms_delay_spread(&self) -> f64 {
        let total_power: f64 = self.paths.iter().map(|p| p.amplitude * p.amplitude).sum();
        if total_power == 0.0 {
            return 0.0;
        }
        let mean_delay: f64 = self
            .paths
            .iter()
            .map(|p| p.amplitude * p.amplitude * p.delay_s)
            .sum::<f64>()
            / total_power;
        let second_moment: f64 = self
            .paths
            .iter()
            .map(|p| {
                let d = p.delay_s - mean_delay;
                p.amplitude * p.amplitude * d * d
            })
            .sum::<f64>()
            / total_power;
        second_moment.sqrt()
    }
}

/// Recompute the power-delay profile for the current scene geometry.
///
/// Route lengths below one metre are clamped before the amplitude law,
/// consistent with the path-loss model's treatment of degenerate
/// geometry.
///
/// # Panics
///
/// Panics if any configuration constant is out of domain.
pub fn power_delay_profile(
    tx: Point,
    rx: Point,
    reflectors: &[Point],
    config: &MultipathConfig,
) -> PowerDelayProfile {
    assert!(
        config.propagation_speed > 0.0,
        "propagation speed must be positive, got {}",
        config.propagation_speed
    );
    assert!(
        config.path_loss_exponent > 0.0,
        "path-loss exponent must be positive, got {}",
        config.path_loss_exponent
    );
    assert!(
        config.reference_amplitude > 0.0,
        "reference amplitude must be positive, got {}",
        config.reference_amplitude
    );
    assert!(
        config.reflection_coefficient > 0.0 && config.reflection_coefficient <= 1.0,
        "reflection coefficient must be in (0, 1], got {}",
        config.reflection_coefficient
    );

    let mut paths = Vec::with_capacity(reflectors.len() + 1);

    let los_distance = tx.distance_to(&rx).max(1.0);
    paths.push(MultipathPath {
        kind: PathKind::Los,
        distance_m: los_distance,
        delay_s: los_distance / config.propagation_speed,
        amplitude: config.reference_amplitude / los_distance.powf(config.path_loss_exponent),
    });

    for (i, reflector) in reflectors.iter().enumerate() {
        let distance = (tx.distance_to(reflector) + reflector.distance_to(&rx)).max(1.0);
        paths.push(MultipathPath {
            kind: PathKind::Nlos(i + 1),
            distance_m: distance,
            delay_s: distance / config.propagation_speed,
            amplitude: config.reference_amplitude * config.reflection_coefficient
                / distance.powf(config.path_loss_exponent),
        });
    }

    paths.sort_by(|a, b| a.delay_s.total_cmp(&b.delay_s));

    PowerDelayProfile { paths }
}
