//! User aggregate
//!
//! Contains the User entity, submitted form fields, persistence DTOs,
//! and the repository interface.

pub mod fields;
pub mod model;
pub mod repository;

mod dto_create;
mod dto_get;
mod dto_update;

// Re-export model types
pub use fields::{UserFields, EMAIL_TAKEN_MESSAGE, INVALID_ROLE_MESSAGE, NAME_MAX_LENGTH};
pub use model::{EmailUniqueness, User};

// Re-export DTOs
pub use dto_create::CreateUserDto;
pub use dto_get::{GetUserDto, SortDirection, UserSortField};
pub use dto_update::UpdateUserDto;

// Re-export repository trait
pub use repository::UserRepositoryInterface;
