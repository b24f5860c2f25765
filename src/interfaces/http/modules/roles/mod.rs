//! Roles module: options for the role select and filter

pub mod handlers;

pub use handlers::*;
