//! Doppler Kinematics — frequency shift for a vehicle passing a tower
//!
//! A car drives along a straight road with a fixed transmitter standing
//! off to one side. Each animation frame recomputes the closed-form
//! shift from the instantaneous geometry; there is no state between
//! frames.
//!
//! ```text
//!            tower (tx)
//!               |
//!               | dy (perpendicular offset)
//!               |
//!   ────────────●──────────────► road (car moves in +x)
//!          car  θ
//! ```
//!
//! The shift follows `Δf = (v/λ)·cos θ`, with `θ` the angle between the
//! velocity vector `(1, 0)` and the car→tower direction. Approaching the
//! tower gives a positive shift, receding a negative one, and passing
//! the closest point reads zero.
//!
//! ## Example
//!
//! ```rust
//! use wirelab_core::doppler::{doppler_frame, DopplerScene};
//!
//! let scene = DopplerScene::default();
//! // Car well to the left of the tower, driving toward it
//! let frame = doppler_frame(&scene, 0.0, 100.0, 1.0);
//! assert!(frame.delta_f_hz > 0.0);
//! assert!(frame.angle_deg < 90.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::types::{kmh_to_ms, SPEED_OF_LIGHT};

/// Fixed transmitter geometry relative to the straight road the car
/// drives along. The road is the x axis; the tower stands
/// `tower_offset_m` away from it at `x = tower_x_m`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DopplerScene {
    /// Tower position along the road axis, metres.
    pub tower_x_m: f64,
    /// Perpendicular distance from the road to the tower, metres.
    pub tower_offset_m: f64,
}

impl Default for DopplerScene {
    fn default() -> Self {
        Self {
            tower_x_m: 250.0,
            tower_offset_m: 50.0,
        }
    }
}

/// Stateless per-frame snapshot of the Doppler computation, consumed by
/// the rendering layer. Never mutated in place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DopplerFrame {
    /// Vehicle speed in m/s.
    pub velocity_ms: f64,
    /// Carrier wavelength in metres.
    pub wavelength_m: f64,
    /// Angle between velocity and the car→tower direction, degrees.
    pub angle_deg: f64,
    /// Slant distance from car to tower, metres.
    pub distance_m: f64,
    /// Doppler shift in Hz; positive approaching, negative receding.
    pub delta_f_hz: f64,
}

/// Evaluate the Doppler geometry for one animation frame.
///
/// # Panics
///
/// Panics if `carrier_ghz` is not positive (zero wavelength), if
/// `speed_kmh` is negative, or if the car sits exactly on the tower
/// (`distance == 0`) — coincident geometry is a caller bug, not a case
/// this model silently patches over.
pub fn doppler_frame(
    scene: &DopplerScene,
    car_x_m: f64,
    speed_kmh: f64,
    carrier_ghz: f64,
) -> DopplerFrame {
    assert!(
        carrier_ghz > 0.0,
        "carrier frequency must be positive, got {carrier_ghz} GHz"
    );
    assert!(
        speed_kmh >= 0.0,
        "speed must not be negative, got {speed_kmh} km/h"
    );

    let velocity_ms = kmh_to_ms(speed_kmh);
    let wavelength_m = SPEED_OF_LIGHT / (carrier_ghz * 1e9);

    // Car→tower vector; the car's velocity is the unit vector (1, 0)
    let dx = scene.tower_x_m - car_x_m;
    let dy = scene.tower_offset_m;
    let distance_m = (dx * dx + dy * dy).sqrt();
    assert!(
        distance_m > 0.0,
        "car is coincident with the tower; Doppler geometry is undefined"
    );

    let cos_theta = dx / distance_m;
    let angle_deg = cos_theta.acos().to_degrees();
    let delta_f_hz = velocity_ms / wavelength_m * cos_theta;

    DopplerFrame {
        velocity_ms,
        wavelength_m,
        angle_deg,
        distance_m,
        delta_f_hz,
    }
}

/// Maximum possible shift magnitude for the given speed and carrier,
/// reached when the motion points straight at (or away from) the tower.
pub fn max_doppler_shift(speed_kmh: f64, carrier_ghz: f64) -> f64 {
    assert!(
        carrier_ghz > 0.0,
        "carrier frequency must be positive, got {carrier_ghz} GHz"
    );
    assert!(
        speed_kmh >= 0.0,
        "speed must not be negative, got {speed_kmh} km/h"
    );
    kmh_to_ms(speed_kmh) * (carrier_ghz * 1e9) / SPEED_OF_LIGHT
}
