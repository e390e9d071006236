//! Testing utilities
//!
//! Mock capability implementations for exercising the cycle controller
//! and connectivity manager without hardware or a broker.

pub mod mocks;
