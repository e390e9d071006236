//! The acquire → transmit → sleep cycle
//!
//! [`controller`] owns the per-cycle state sequence and the timing
//! budget; [`sender`] maps one reading to one wire message and delivers
//! it.

pub mod controller;
pub mod sender;

pub use controller::{sleep_budget, CycleController};
pub use sender::send_reading;
