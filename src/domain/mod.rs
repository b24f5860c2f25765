//! Domain layer: entities, visibility rules and repository interfaces

pub mod error;
pub mod principal;
pub mod repositories;
pub mod role;
pub mod user;

pub use error::{DomainError, DomainResult, FieldError, ValidationFailure};
pub use principal::{Principal, VisibilityScope, SUPER_ADMIN};
pub use repositories::RepositoryProvider;
pub use role::{Role, RoleRepository};
pub use user::{
    CreateUserDto, EmailUniqueness, GetUserDto, SortDirection, UpdateUserDto, User, UserFields,
    UserRepositoryInterface, UserSortField,
};
