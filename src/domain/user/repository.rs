use async_trait::async_trait;

use super::{CreateUserDto, EmailUniqueness, GetUserDto, UpdateUserDto, User};
use crate::domain::{DomainResult, VisibilityScope};
use crate::shared::PaginatedResult;

/// Persistence for users and their role links.
///
/// Every write that must keep emails unique performs the uniqueness check
/// and the write inside one transaction.
#[async_trait]
pub trait UserRepositoryInterface: Send + Sync {
    /// Live users admitted by `scope`. `dto.page` / `dto.page_size` are
    /// expected to be already clamped.
    async fn list_users(
        &self,
        scope: &VisibilityScope,
        dto: GetUserDto,
    ) -> DomainResult<PaginatedResult<User>>;

    async fn count_users(&self, scope: &VisibilityScope) -> DomainResult<u64>;

    /// Any user, live or soft-deleted.
    async fn get_user_by_id(&self, id: &str) -> DomainResult<Option<User>>;

    /// Live user with the given (normalised) email.
    async fn get_user_by_email(&self, email: &str) -> DomainResult<Option<User>>;

    /// Total rows including soft-deleted ones.
    async fn count_all(&self) -> DomainResult<u64>;

    async fn create_user(
        &self,
        dto: CreateUserDto,
        uniqueness: EmailUniqueness,
    ) -> DomainResult<User>;

    /// Fails with `NotFound` when the user is missing or soft-deleted.
    async fn update_user(
        &self,
        id: &str,
        dto: UpdateUserDto,
        uniqueness: EmailUniqueness,
    ) -> DomainResult<User>;

    /// Marks live users deleted; returns how many rows changed.
    async fn soft_delete_users(&self, ids: &[String]) -> DomainResult<u64>;

    /// Clears the deletion marker after re-checking email uniqueness
    /// against live users.
    async fn restore_user(&self, id: &str) -> DomainResult<User>;
}
