//! Foundation utilities shared across the engine
//!
//! Math types, frame timing, and logging setup. Everything here is
//! dependency-light and usable without a rendering context.

pub mod logging;
pub mod math;
pub mod time;
