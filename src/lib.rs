//! # User Directory
//!
//! Scoped user management service: administrators list, create, edit and
//! soft-delete users, while holders of the privileged `super_admin` role
//! stay invisible to everyone who does not hold it.
//!
//! ## Architecture
//!
//! - **domain**: entities, principal and visibility scope, validation, repository traits
//! - **application**: `UserDirectory`, `IdentityService`, startup seeding
//! - **infrastructure**: SeaORM persistence, migrations, bcrypt, JWT
//! - **interfaces**: Axum REST API with Swagger documentation
//! - **server**: runtime lifecycle and tracing setup

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig};

// Re-export database types for easy access
pub use infrastructure::{init_database, DatabaseConfig};

// Re-export API router
pub use interfaces::http::create_api_router;
