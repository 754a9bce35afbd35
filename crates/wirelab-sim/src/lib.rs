//! # Wirelab Simulators
//!
//! Tick-driven stateful simulators for the wireless teaching toolset,
//! layered on the closed-form models in `wirelab-core`:
//!
//! - [`occupancy`] — fixed-timestep Monte Carlo of an M/M/C/C trunked
//!   channel pool, rendered side by side with the Erlang-B prediction
//! - [`handoff`] — a vehicle driving between two base stations under a
//!   selectable handoff rule (absolute threshold vs relative
//!   hysteresis), with drop detection and ping-pong flagging
//!
//! Both simulators are advanced by an external scheduler (the UI's
//! timer) through a synchronous `tick`/`advance` call and expose
//! serializable snapshots for rendering. Nothing here spawns threads,
//! blocks, or keeps its own clock. Randomness is injectable: every
//! simulator has a `with_seed` constructor so tests and replays are
//! reproducible.

pub mod handoff;
pub mod occupancy;

pub use handoff::{HandoffAlgorithm, HandoffConfig, HandoffSimulator, HandoffState};
pub use occupancy::{OccupancyConfig, OccupancySimulator, OccupancyState};
