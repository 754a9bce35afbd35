//! # Wirelab Core Numeric Models
//!
//! This crate provides the numeric and DSP engine behind an interactive
//! toolset for teaching wireless-communication concepts. Each module
//! pairs a classroom topic with the closed-form or iterative model the
//! visualization layer renders:
//!
//! - **Trunking**: Erlang-B blocking probability and the M/M/C/C state
//!   occupancy distribution ([`erlang`])
//! - **Propagation**: log-distance path loss with optional jitter
//!   ([`path_loss`])
//! - **Mobility**: Doppler shift from vehicle/tower geometry
//!   ([`doppler`])
//! - **Fading**: geometric multipath power-delay profiles
//!   ([`multipath`])
//! - **Equalization**: the five-stage zero-forcing signal-recovery
//!   pipeline ([`recovery_pipeline`]), built on [`convolution`] and
//!   [`fft_utils`]
//!
//! Everything here is synchronous and UI-framework-agnostic: the
//! rendering layer supplies parameters, calls a compute or advance
//! entry point, and reads back serializable snapshots. The companion
//! `wirelab-sim` crate adds the tick-driven stateful simulators
//! (channel occupancy, handoff) on top of these models.
//!
//! ## Example
//!
//! ```rust
//! use wirelab_core::erlang::erlang_b;
//! use wirelab_core::doppler::{doppler_frame, DopplerScene};
//!
//! // Ten trunked channels offered five Erlangs block ~1.8% of calls
//! assert!((erlang_b(10, 5.0) - 0.0184).abs() < 5e-4);
//!
//! // A car approaching the tower sees a positive Doppler shift
//! let frame = doppler_frame(&DopplerScene::default(), 0.0, 100.0, 2.4);
//! assert!(frame.delta_f_hz > 0.0);
//! ```

pub mod convolution;
pub mod doppler;
pub mod erlang;
pub mod fft_utils;
pub mod multipath;
pub mod path_loss;
pub mod recovery_pipeline;
pub mod types;

pub use erlang::{erlang_b, state_probabilities, BlockingResult, TrafficParameters};
pub use multipath::{power_delay_profile, MultipathConfig, Point, PowerDelayProfile};
pub use recovery_pipeline::{ChannelTap, RecoveryPipeline, Stage};
pub use types::{Complex, ModelError, ModelResult};
