//! Repository access for the domain layer

use super::role::RoleRepository;
use super::user::UserRepositoryInterface;

/// Provides access to all domain repositories.
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) {
///     let user = repos.users().get_user_by_id("u-1").await?;
///     let roles = repos.roles().list_roles(None).await?;
/// }
/// ```
pub trait RepositoryProvider: Send + Sync {
    fn users(&self) -> &dyn UserRepositoryInterface;
    fn roles(&self) -> &dyn RoleRepository;
}
