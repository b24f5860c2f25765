//! Identity module: authentication and principal resolution
//!
//! Contains the `IdentityService` used by the login endpoint and the auth
//! middleware.

pub mod service;

pub use service::{AuthResult, IdentityService};
