//! The primary value types implemented by the engine.

pub mod core;

pub use self::core::*;
