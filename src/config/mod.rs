//! Configuration management
//!
//! This module handles loading and layering configuration settings
//! for the login, polling and inspection commands.

pub mod loader;
pub mod settings;

pub use loader::ConfigLoader;
pub use settings::Settings;

// Environment variables are process-global; tests touching them take this lock
#[cfg(test)]
pub(crate) static ENV_TEST_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
