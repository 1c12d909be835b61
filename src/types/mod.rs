//! Type definitions
//!
//! Credentials, vehicle snapshots and the GraphQL envelopes exchanged with the gateway.

pub mod graphql;
pub mod session;
pub mod snapshot;

pub use graphql::{GraphQlError, GraphQlRequest};
pub use session::{CsrfTokens, HeaderSet, LoginOutcome, OtpChallenge, Session};
pub use snapshot::{Location, OtaStatus, PowerPhase, VehicleSnapshot};
