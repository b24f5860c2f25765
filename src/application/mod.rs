pub mod bootstrap;
pub mod directory;
pub mod identity;

// Re-export key types for convenience
pub use bootstrap::bootstrap;
pub use directory::{user_resource, DirectorySettings, ResourceSchema, UserDirectory, UserRow};
pub use identity::{AuthResult, IdentityService};
