//! User directory: scoped listing and management of users

pub mod resource;
pub mod service;

pub use resource::{user_resource, ResourceSchema, UserRow};
pub use service::{DirectorySettings, UserDirectory};
