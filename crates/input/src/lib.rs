//! Input: edge-triggered directional flags and the pointer-lock session.
//!
//! # Invariants
//! - The core consumes [`Action`]s and the resulting [`InputState`], never raw
//!   device events.
//! - Last state wins: no buffering, no repeat counts.
//! - Movement is only applied while the pointer lock is fully acquired.

pub mod action;
pub mod pointer;
pub mod state;

pub use action::Action;
pub use pointer::{LockPhase, PointerLock};
pub use state::{Direction, InputState};
