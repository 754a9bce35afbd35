//! Log-Distance Path Loss — received power for the handoff scenario
//!
//! The handoff teaching module drives its two base-station signals from a
//! log-distance law:
//!
//! ```text
//! P_rx(d) = P_tx - 10·γ·log10(max(d, 1))
//! ```
//!
//! where `γ` is the environment's path-loss exponent. Distances below one
//! metre are clamped before the logarithm so a receiver standing on top
//! of the transmitter reads full transmit power instead of producing
//! `log(0)`.
//!
//! An optional zero-mean uniform jitter (`±scale/2`) can be layered on
//! top per evaluation for realism; the jitter never shifts the mean.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Propagation environment presets for the exponent slider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    /// Open highway corridor, little clutter.
    OpenHighway,
    /// Mixed suburban build-up.
    Suburban,
    /// Dense urban canyon.
    DenseUrban,
}

impl Environment {
    /// Path-loss exponent `γ` for this environment.
    pub fn path_loss_exponent(self) -> f64 {
        match self {
            Environment::OpenHighway => 3.0,
            Environment::Suburban => 3.5,
            Environment::DenseUrban => 4.0,
        }
    }
}

/// Mean received power in dBm at `distance_m` from a transmitter.
///
/// Distances below one metre are clamped to one metre.
///
/// # Panics
///
/// Panics if `exponent` is not positive or `distance_m` is negative.
pub fn received_power_dbm(tx_power_dbm: f64, distance_m: f64, exponent: f64) -> f64 {
    assert!(
        exponent > 0.0,
        "path-loss exponent must be positive, got {exponent}"
    );
    assert!(
        distance_m >= 0.0,
        "distance must not be negative, got {distance_m}"
    );

    tx_power_dbm - 10.0 * exponent * distance_m.max(1.0).log10()
}

/// Layer zero-mean uniform jitter of total width `noise_scale_db` on a
/// mean power value.
///
/// # Panics
///
/// Panics if `noise_scale_db` is negative.
pub fn jittered_power_dbm<R: Rng>(power_dbm: f64, noise_scale_db: f64, rng: &mut R) -> f64 {
    assert!(
        noise_scale_db >= 0.0,
        "noise scale must not be negative, got {noise_scale_db}"
    );
    power_dbm + (rng.gen::<f64>() - 0.5) * noise_scale_db
}
