//! Scoped user directory: application-layer orchestration
//!
//! Every operation receives the requesting [`Principal`] and derives a
//! [`VisibilityScope`] from it. Users outside the scope behave exactly like
//! missing users, and roles outside the scope behave exactly like unknown
//! roles, so nothing about them leaks to the caller.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::AppConfig;
use crate::domain::user::INVALID_ROLE_MESSAGE;
use crate::domain::{
    CreateUserDto, DomainError, DomainResult, EmailUniqueness, FieldError, GetUserDto, Principal,
    RepositoryProvider, Role, UpdateUserDto, User, UserFields, ValidationFailure,
    VisibilityScope,
};
use crate::infrastructure::crypto::password::{hash_password, DEFAULT_COST};
use crate::shared::{validate_pagination, PaginatedResult};

/// Policy knobs of the directory.
#[derive(Debug, Clone)]
pub struct DirectorySettings {
    pub email_uniqueness: EmailUniqueness,
    pub require_password_on_create: bool,
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub bcrypt_cost: u32,
}

impl Default for DirectorySettings {
    fn default() -> Self {
        Self {
            email_uniqueness: EmailUniqueness::ActiveOnly,
            require_password_on_create: false,
            default_page_size: 10,
            max_page_size: 100,
            bcrypt_cost: DEFAULT_COST,
        }
    }
}

impl From<&AppConfig> for DirectorySettings {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            email_uniqueness: cfg.directory.email_uniqueness,
            require_password_on_create: cfg.directory.require_password_on_create,
            default_page_size: cfg.directory.default_page_size,
            max_page_size: cfg.directory.max_page_size,
            bcrypt_cost: cfg.security.bcrypt_cost,
        }
    }
}

pub struct UserDirectory {
    repos: Arc<dyn RepositoryProvider>,
    settings: DirectorySettings,
}

impl UserDirectory {
    pub fn new(repos: Arc<dyn RepositoryProvider>, settings: DirectorySettings) -> Self {
        Self { repos, settings }
    }

    pub fn settings(&self) -> &DirectorySettings {
        &self.settings
    }

    // ── Queries ─────────────────────────────────────────────────

    /// Page of live users visible to `principal`.
    pub async fn list_users(
        &self,
        principal: &Principal,
        mut query: GetUserDto,
    ) -> DomainResult<PaginatedResult<User>> {
        let scope = principal.scope();
        let (page, page_size) = validate_pagination(
            query.page,
            query.page_size,
            self.settings.default_page_size,
            self.settings.max_page_size,
        );
        query.page = Some(page);
        query.page_size = Some(page_size);

        if !query.roles.is_empty() {
            query.roles.retain(|r| scope.allows_role(r));
            // Only hidden roles were requested: nothing the principal may see matches.
            if query.roles.is_empty() {
                return Ok(PaginatedResult::empty(page, page_size));
            }
        }

        self.repos.users().list_users(&scope, query).await
    }

    /// Number of live users visible to `principal` (navigation badge).
    pub async fn count_visible_users(&self, principal: &Principal) -> DomainResult<u64> {
        self.repos.users().count_users(&principal.scope()).await
    }

    /// Live user for the edit form.
    pub async fn get_user(&self, principal: &Principal, id: &str) -> DomainResult<User> {
        self.visible_live_user(&principal.scope(), id).await
    }

    /// Role options for the role select and the role filter.
    pub async fn assignable_roles(&self, principal: &Principal) -> DomainResult<Vec<Role>> {
        self.repos
            .roles()
            .list_roles(principal.scope().hidden_role())
            .await
    }

    // ── Commands (mutations) ────────────────────────────────────

    pub async fn create_user(&self, principal: &Principal, fields: UserFields) -> DomainResult<User> {
        let scope = principal.scope();
        let fields = fields.normalized();

        let mut failure = fields.check().err().unwrap_or_default();
        if self.settings.require_password_on_create && fields.password.is_none() {
            failure.push(FieldError::new(
                "password",
                "required",
                "The password field is required.",
            ));
        }
        let role_ids = self
            .resolve_roles(principal, &scope, &fields.roles, &mut failure)
            .await?;
        failure.into_result()?;

        let dto = CreateUserDto {
            password_hash: self.hash(fields.password.as_deref())?,
            name: fields.name,
            email: fields.email,
            is_active: fields.is_active.unwrap_or(true),
            role_ids,
        };

        let user = self
            .repos
            .users()
            .create_user(dto, self.settings.email_uniqueness)
            .await?;

        metrics::counter!("user_directory_users_created_total").increment(1);
        info!(user_id = %user.id, actor = %principal.user_id, roles = %user.roles_display(), "User created");
        Ok(user)
    }

    /// Updates a visible live user. The role set is replaced; the stored
    /// password is kept unless a new one is supplied.
    pub async fn update_user(
        &self,
        principal: &Principal,
        id: &str,
        fields: UserFields,
    ) -> DomainResult<User> {
        let scope = principal.scope();
        self.visible_live_user(&scope, id).await?;

        let fields = fields.normalized();
        let mut failure = fields.check().err().unwrap_or_default();
        let role_ids = self
            .resolve_roles(principal, &scope, &fields.roles, &mut failure)
            .await?;
        failure.into_result()?;

        let password_changed = fields.password.is_some();
        let dto = UpdateUserDto {
            password_hash: self.hash(fields.password.as_deref())?,
            name: fields.name,
            email: fields.email,
            is_active: fields.is_active,
            role_ids,
        };

        let user = self
            .repos
            .users()
            .update_user(id, dto, self.settings.email_uniqueness)
            .await?;

        metrics::counter!("user_directory_users_updated_total").increment(1);
        info!(user_id = %user.id, actor = %principal.user_id, password_changed, "User updated");
        Ok(user)
    }

    /// Soft-deletes a visible live user. A second call for the same id is
    /// `NotFound`.
    pub async fn soft_delete_user(&self, principal: &Principal, id: &str) -> DomainResult<()> {
        self.visible_live_user(&principal.scope(), id).await?;

        let affected = self.repos.users().soft_delete_users(&[id.to_string()]).await?;
        if affected == 0 {
            return Err(DomainError::user_not_found(id));
        }

        metrics::counter!("user_directory_users_deleted_total").increment(1);
        info!(user_id = %id, actor = %principal.user_id, "User soft-deleted");
        Ok(())
    }

    /// Bulk soft-delete. Ids that are missing, already deleted or hidden
    /// are skipped; returns how many users were deleted.
    pub async fn soft_delete_users(&self, principal: &Principal, ids: &[String]) -> DomainResult<u64> {
        let scope = principal.scope();
        let unique: BTreeSet<&String> = ids.iter().collect();

        let mut targets = Vec::with_capacity(unique.len());
        for id in unique {
            match self.visible_live_user(&scope, id).await {
                Ok(user) => targets.push(user.id),
                Err(DomainError::NotFound { .. }) => continue,
                Err(e) => return Err(e),
            }
        }

        let affected = self.repos.users().soft_delete_users(&targets).await?;

        metrics::counter!("user_directory_users_deleted_total").increment(affected);
        info!(requested = ids.len(), deleted = affected, actor = %principal.user_id, "Users bulk soft-deleted");
        Ok(affected)
    }

    /// Brings back a soft-deleted user the principal is allowed to see.
    pub async fn restore_user(&self, principal: &Principal, id: &str) -> DomainResult<User> {
        let scope = principal.scope();
        match self.repos.users().get_user_by_id(id).await? {
            Some(user) if user.is_deleted() && scope.admits(&user.roles) => {}
            _ => return Err(DomainError::user_not_found(id)),
        }

        let user = self.repos.users().restore_user(id).await?;

        metrics::counter!("user_directory_users_restored_total").increment(1);
        info!(user_id = %id, actor = %principal.user_id, "User restored");
        Ok(user)
    }

    // ── Helpers ─────────────────────────────────────────────────

    async fn visible_live_user(&self, scope: &VisibilityScope, id: &str) -> DomainResult<User> {
        match self.repos.users().get_user_by_id(id).await? {
            Some(user) if !user.is_deleted() && scope.admits(&user.roles) => Ok(user),
            _ => Err(DomainError::user_not_found(id)),
        }
    }

    /// Maps submitted role names to role ids. Unknown names and names the
    /// scope hides produce the same field error.
    async fn resolve_roles(
        &self,
        principal: &Principal,
        scope: &VisibilityScope,
        names: &BTreeSet<String>,
        failure: &mut ValidationFailure,
    ) -> DomainResult<Vec<String>> {
        let requested: Vec<String> = names.iter().cloned().collect();
        let found = self.repos.roles().find_by_names(&requested).await?;

        let mut ids = Vec::with_capacity(found.len());
        let mut rejected = false;
        for name in &requested {
            if !scope.allows_role(name) {
                warn!(actor = %principal.user_id, role = %name, "Rejected assignment of a hidden role");
                rejected = true;
                continue;
            }
            match found.iter().find(|r| &r.name == name) {
                Some(role) => ids.push(role.id.clone()),
                None => rejected = true,
            }
        }

        if rejected {
            failure.push(FieldError::new("roles", "unknown_role", INVALID_ROLE_MESSAGE));
        }
        Ok(ids)
    }

    fn hash(&self, password: Option<&str>) -> DomainResult<Option<String>> {
        password
            .map(|p| hash_password(p, self.settings.bcrypt_cost))
            .transpose()
            .map_err(|e| DomainError::Internal(format!("Failed to hash password: {}", e)))
    }
}
