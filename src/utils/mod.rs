//! Utility functions and helpers

pub mod units;

pub use units::UnitSystem;
