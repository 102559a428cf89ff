//! State module for tracking retry progress
//!
//! A target only gets a state once its first attempt has failed; it then moves
//! through retry rounds until it either succeeds or runs out of rounds.

mod target_state;

pub use target_state::TargetState;
