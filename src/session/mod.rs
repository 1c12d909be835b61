//! Session lifecycle
//!
//! Persisting the long-lived tokens, logging in, bootstrapping the
//! per-process CSRF pair and the HTTP transport underneath all of it.

pub mod auth;
pub mod network;
pub mod store;

pub use auth::AuthClient;
pub use network::{NetworkManager, ProxySpec};
pub use store::{SESSION_ENV_VAR, SessionStore};
