//! Core types and numeric conventions shared across the wirelab models
//!
//! Every model in this workspace speaks the same units: powers in dBm,
//! frequencies in Hz (carrier inputs in GHz where the UI sliders work in
//! GHz), distances in metres, speeds in km/h at the boundary and m/s
//! internally, traffic in Erlangs.
//!
//! Failures split into two families:
//!
//! - Contract violations on pure closed-form math (negative load, zero
//!   distance) panic via `assert!` with a descriptive message — they
//!   indicate a caller bug, never a runtime condition to recover from.
//! - Misuse of the stateful/staged APIs (pipeline stage out of order,
//!   malformed bit strings, invalid construction parameters) returns a
//!   [`ModelError`] so the calling layer can present it.

use num_complex::Complex64;

/// Type alias for complex spectrum samples using f64 precision.
pub type Complex = Complex64;

/// A real-valued time-domain sample.
pub type Sample = f64;

/// Speed of light in m/s.
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Convert a road speed in km/h to m/s.
#[inline]
pub fn kmh_to_ms(speed_kmh: f64) -> f64 {
    speed_kmh / 3.6
}

/// Convert a power ratio in dB to linear scale.
#[inline]
pub fn db_to_linear(db: f64) -> f64 {
    10f64.powf(db / 10.0)
}

/// Convert a linear power ratio to dB.
#[inline]
pub fn linear_to_db(linear: f64) -> f64 {
    10.0 * linear.log10()
}

/// Result type for model operations that can reject their inputs.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors reported by the stateful and staged model APIs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("{name} must be positive, got {value}")]
    NonPositiveParameter { name: &'static str, value: f64 },

    #[error("{name} must not be negative, got {value}")]
    NegativeParameter { name: &'static str, value: f64 },

    #[error("bit string must not be empty")]
    EmptyBitString,

    #[error("bit string may only contain '0' and '1', found {found:?} at offset {offset}")]
    InvalidBit { offset: usize, found: char },

    #[error("channel needs at least one tap")]
    EmptyTaps,

    #[error("pipeline stage out of order: {expected} requested while pipeline is at {actual}")]
    StageOrder {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("noise variance is locked once the signal has passed through the channel")]
    NoiseLocked,
}
