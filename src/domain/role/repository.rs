use async_trait::async_trait;

use super::Role;
use crate::domain::DomainResult;

#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// All roles ordered by name, optionally leaving one name out.
    async fn list_roles(&self, exclude: Option<&str>) -> DomainResult<Vec<Role>>;

    async fn find_by_name(&self, name: &str) -> DomainResult<Option<Role>>;

    /// Roles matching the given names; names without a role are skipped.
    async fn find_by_names(&self, names: &[String]) -> DomainResult<Vec<Role>>;

    /// Returns the existing role or creates it.
    async fn ensure_role(&self, name: &str) -> DomainResult<Role>;
}
