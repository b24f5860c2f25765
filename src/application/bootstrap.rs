//! Startup seeding: roles and the default administrator

use tracing::{info, warn};

use crate::config::AppConfig;
use crate::domain::{CreateUserDto, DomainError, DomainResult, RepositoryProvider, SUPER_ADMIN};
use crate::infrastructure::crypto::password::hash_password;

/// What [`bootstrap`] changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    pub roles: Vec<String>,
    pub admin_created: bool,
}

/// Ensures the configured roles exist and, when `create_admin` is set and
/// the users table is completely empty, creates the default admin holding
/// `super_admin`.
pub async fn bootstrap(
    repos: &dyn RepositoryProvider,
    config: &AppConfig,
    create_admin: bool,
) -> DomainResult<BootstrapReport> {
    let mut report = BootstrapReport::default();

    for name in config.directory.roles_to_seed() {
        repos.roles().ensure_role(&name).await?;
        report.roles.push(name);
    }
    info!(roles = ?report.roles, "Roles ensured");

    if !create_admin || repos.users().count_all().await? > 0 {
        return Ok(report);
    }

    info!("Creating default admin user...");
    let admin_role = repos.roles().ensure_role(SUPER_ADMIN).await?;
    let password_hash = hash_password(&config.admin.password, config.security.bcrypt_cost)
        .map_err(|e| DomainError::Internal(format!("Failed to hash admin password: {}", e)))?;

    let admin = repos
        .users()
        .create_user(
            CreateUserDto {
                name: config.admin.name.trim().to_string(),
                email: config.admin.email.trim().to_lowercase(),
                password_hash: Some(password_hash),
                is_active: true,
                role_ids: vec![admin_role.id],
            },
            config.directory.email_uniqueness,
        )
        .await?;

    info!(user_id = %admin.id, email = %admin.email, "Default admin created");
    warn!("Please change the default admin password immediately");
    report.admin_created = true;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GetUserDto, VisibilityScope};
    use crate::infrastructure::database::repositories::SeaOrmRepositoryProvider;
    use crate::infrastructure::database::testing::memory_db;

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.security.bcrypt_cost = 4;
        config.directory.seed_roles = vec!["editor".into()];
        config
    }

    #[tokio::test]
    async fn seeds_roles_and_admin_once() {
        let repos = SeaOrmRepositoryProvider::new(memory_db().await);
        let config = config();

        let first = bootstrap(&repos, &config, true).await.unwrap();
        assert_eq!(first.roles, vec!["editor", SUPER_ADMIN]);
        assert!(first.admin_created);

        let second = bootstrap(&repos, &config, true).await.unwrap();
        assert!(!second.admin_created);
        assert_eq!(repos.users().count_all().await.unwrap(), 1);

        let page = repos
            .users()
            .list_users(&VisibilityScope::All, GetUserDto::default())
            .await
            .unwrap();
        let admin = &page.items[0];
        assert_eq!(admin.email, "admin@example.com");
        assert!(admin.has_role(SUPER_ADMIN));
    }

    #[tokio::test]
    async fn admin_creation_can_be_disabled() {
        let repos = SeaOrmRepositoryProvider::new(memory_db().await);

        let report = bootstrap(&repos, &config(), false).await.unwrap();
        assert!(!report.admin_created);
        assert_eq!(repos.users().count_all().await.unwrap(), 0);
        assert_eq!(repos.roles().list_roles(None).await.unwrap().len(), 2);
    }
}
