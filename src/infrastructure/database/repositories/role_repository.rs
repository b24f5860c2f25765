use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::info;

use crate::domain::{DomainResult, Role, RoleRepository};
use crate::infrastructure::database::entities::role;

pub struct SeaOrmRoleRepository {
    db: DatabaseConnection,
}

impl SeaOrmRoleRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn role_model_to_domain(model: role::Model) -> Role {
    Role {
        id: model.id,
        name: model.name,
        created_at: model.created_at,
    }
}

#[async_trait]
impl RoleRepository for SeaOrmRoleRepository {
    async fn list_roles(&self, exclude: Option<&str>) -> DomainResult<Vec<Role>> {
        let mut query = role::Entity::find().order_by_asc(role::Column::Name);
        if let Some(name) = exclude {
            query = query.filter(role::Column::Name.ne(name));
        }

        let models = query.all(&self.db).await?;
        Ok(models.into_iter().map(role_model_to_domain).collect())
    }

    async fn find_by_name(&self, name: &str) -> DomainResult<Option<Role>> {
        let model = role::Entity::find()
            .filter(role::Column::Name.eq(name))
            .one(&self.db)
            .await?;

        Ok(model.map(role_model_to_domain))
    }

    async fn find_by_names(&self, names: &[String]) -> DomainResult<Vec<Role>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let models = role::Entity::find()
            .filter(role::Column::Name.is_in(names.iter().cloned()))
            .order_by_asc(role::Column::Name)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(role_model_to_domain).collect())
    }

    async fn ensure_role(&self, name: &str) -> DomainResult<Role> {
        if let Some(existing) = self.find_by_name(name).await? {
            return Ok(existing);
        }

        let model = role::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            name: Set(name.to_string()),
            created_at: Set(Utc::now()),
        };

        match model.insert(&self.db).await {
            Ok(created) => {
                info!(role = %created.name, "Role created");
                Ok(role_model_to_domain(created))
            }
            // Lost a race against a concurrent insert of the same name
            Err(e) => match self.find_by_name(name).await? {
                Some(existing) => Ok(existing),
                None => Err(e.into()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SUPER_ADMIN;
    use crate::infrastructure::database::testing::memory_db;

    #[tokio::test]
    async fn ensure_role_is_idempotent() {
        let repo = SeaOrmRoleRepository::new(memory_db().await);

        let first = repo.ensure_role("editor").await.unwrap();
        let second = repo.ensure_role("editor").await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(repo.list_roles(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn lists_by_name_with_exclusion() {
        let repo = SeaOrmRoleRepository::new(memory_db().await);
        for name in ["viewer", SUPER_ADMIN, "editor"] {
            repo.ensure_role(name).await.unwrap();
        }

        let all: Vec<_> = repo
            .list_roles(None)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(all, vec!["editor", SUPER_ADMIN, "viewer"]);

        let visible: Vec<_> = repo
            .list_roles(Some(SUPER_ADMIN))
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(visible, vec!["editor", "viewer"]);

        let found = repo
            .find_by_names(&["viewer".to_string(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "viewer");
    }
}
