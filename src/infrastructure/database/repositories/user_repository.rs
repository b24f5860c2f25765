use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, LikeExpr, Query, SelectStatement};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
    TransactionTrait,
};
use tracing::debug;

use crate::domain::user::EMAIL_TAKEN_MESSAGE;
use crate::domain::{
    CreateUserDto, DomainError, DomainResult, EmailUniqueness, GetUserDto, SortDirection,
    UpdateUserDto, User, UserRepositoryInterface, UserSortField, ValidationFailure,
    VisibilityScope,
};
use crate::infrastructure::database::entities::{role, user, user_role};
use crate::shared::PaginatedResult;

pub struct SeaOrmUserRepository {
    db: DatabaseConnection,
}

impl SeaOrmUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Query helpers ───────────────────────────────────────────────

/// `SELECT user_roles.user_id FROM user_roles JOIN roles ... WHERE roles.name IN (...)`
fn holders_of(role_names: Vec<String>) -> SelectStatement {
    Query::select()
        .column((user_role::Entity, user_role::Column::UserId))
        .from(user_role::Entity)
        .inner_join(
            role::Entity,
            Expr::col((role::Entity, role::Column::Id))
                .equals((user_role::Entity, user_role::Column::RoleId)),
        )
        .and_where(Expr::col((role::Entity, role::Column::Name)).is_in(role_names))
        .to_owned()
}

/// Live rows admitted by the scope.
fn visible(scope: &VisibilityScope) -> Condition {
    let condition = Condition::all().add(user::Column::DeletedAt.is_null());
    match scope.hidden_role() {
        None => condition,
        Some(hidden) => {
            condition.add(user::Column::Id.not_in_subquery(holders_of(vec![hidden.to_string()])))
        }
    }
}

/// `%text%` with LIKE metacharacters taken literally.
fn substring_pattern(text: &str) -> LikeExpr {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    LikeExpr::new(format!("%{escaped}%")).escape('\\')
}

/// A write that lost the race for a live email trips the partial unique
/// index; report it like the pre-write check does.
fn email_conflict(err: DbErr) -> DomainError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => DomainError::Validation(
            ValidationFailure::single("email", "unique", EMAIL_TAKEN_MESSAGE),
        ),
        _ => err.into(),
    }
}

fn user_model_to_domain(model: user::Model, roles: BTreeSet<String>) -> User {
    User {
        id: model.id,
        name: model.name,
        email: model.email,
        password_hash: model.password_hash,
        is_active: model.is_active,
        roles,
        created_at: model.created_at,
        updated_at: model.updated_at,
        deleted_at: model.deleted_at,
    }
}

async fn load_roles<C>(db: &C, user_ids: &[String]) -> DomainResult<HashMap<String, BTreeSet<String>>>
where
    C: ConnectionTrait,
{
    let mut by_user: HashMap<String, BTreeSet<String>> = HashMap::new();
    if user_ids.is_empty() {
        return Ok(by_user);
    }

    let rows = user_role::Entity::find()
        .filter(user_role::Column::UserId.is_in(user_ids.iter().cloned()))
        .find_also_related(role::Entity)
        .all(db)
        .await?;

    for (link, role) in rows {
        if let Some(role) = role {
            by_user.entry(link.user_id).or_default().insert(role.name);
        }
    }
    Ok(by_user)
}

async fn fetch_user<C>(db: &C, id: &str) -> DomainResult<Option<User>>
where
    C: ConnectionTrait,
{
    let Some(model) = user::Entity::find_by_id(id).one(db).await? else {
        return Ok(None);
    };
    let mut roles = load_roles(db, &[model.id.clone()]).await?;
    let user_roles = roles.remove(&model.id).unwrap_or_default();
    Ok(Some(user_model_to_domain(model, user_roles)))
}

async fn ensure_email_available<C>(
    db: &C,
    email: &str,
    ignore_id: Option<&str>,
    uniqueness: EmailUniqueness,
) -> DomainResult<()>
where
    C: ConnectionTrait,
{
    let mut query = user::Entity::find().filter(user::Column::Email.eq(email));
    if uniqueness == EmailUniqueness::ActiveOnly {
        query = query.filter(user::Column::DeletedAt.is_null());
    }
    if let Some(id) = ignore_id {
        query = query.filter(user::Column::Id.ne(id));
    }

    if query.count(db).await? > 0 {
        return Err(DomainError::Validation(ValidationFailure::single(
            "email",
            "unique",
            EMAIL_TAKEN_MESSAGE,
        )));
    }
    Ok(())
}

/// Full-set replacement of a user's role links.
async fn replace_roles<C>(db: &C, user_id: &str, role_ids: &[String]) -> DomainResult<()>
where
    C: ConnectionTrait,
{
    user_role::Entity::delete_many()
        .filter(user_role::Column::UserId.eq(user_id))
        .exec(db)
        .await?;

    let unique: BTreeSet<&String> = role_ids.iter().collect();
    if unique.is_empty() {
        return Ok(());
    }

    let links = unique.into_iter().map(|role_id| user_role::ActiveModel {
        user_id: Set(user_id.to_string()),
        role_id: Set(role_id.clone()),
    });
    user_role::Entity::insert_many(links)
        .exec_without_returning(db)
        .await?;
    Ok(())
}

// ── Repository implementation ───────────────────────────────────

#[async_trait]
impl UserRepositoryInterface for SeaOrmUserRepository {
    async fn list_users(
        &self,
        scope: &VisibilityScope,
        dto: GetUserDto,
    ) -> DomainResult<PaginatedResult<User>> {
        let page = dto.page.unwrap_or(1).max(1);
        let page_size = dto.page_size.unwrap_or(20).max(1);

        let mut query = user::Entity::find().filter(visible(scope));

        // Apply search filter (name or email)
        if let Some(search) = dto.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(user::Column::Name.like(substring_pattern(search)))
                    .add(user::Column::Email.like(substring_pattern(search))),
            );
        }

        // Apply role filter (any of)
        if !dto.roles.is_empty() {
            query = query.filter(user::Column::Id.in_subquery(holders_of(dto.roles)));
        }

        // Apply sorting
        let order = match dto.sort_dir {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        };
        query = match dto.sort_by {
            UserSortField::Name => query.order_by(user::Column::Name, order),
            UserSortField::Email => query.order_by(user::Column::Email, order),
            UserSortField::CreatedAt => query.order_by(user::Column::CreatedAt, order),
        }
        .order_by_asc(user::Column::Id);

        // Count total
        let total = query.clone().count(&self.db).await?;

        // Paginate
        let models = query
            .offset(PaginatedResult::<User>::offset(page, page_size))
            .limit(page_size as u64)
            .all(&self.db)
            .await?;

        let ids: Vec<String> = models.iter().map(|m| m.id.clone()).collect();
        let mut roles = load_roles(&self.db, &ids).await?;

        let items: Vec<User> = models
            .into_iter()
            .map(|m| {
                let user_roles = roles.remove(&m.id).unwrap_or_default();
                user_model_to_domain(m, user_roles)
            })
            .collect();

        debug!(total, page, page_size, "Listed users");
        Ok(PaginatedResult::new(items, total, page, page_size))
    }

    async fn count_users(&self, scope: &VisibilityScope) -> DomainResult<u64> {
        Ok(user::Entity::find()
            .filter(visible(scope))
            .count(&self.db)
            .await?)
    }

    async fn get_user_by_id(&self, id: &str) -> DomainResult<Option<User>> {
        fetch_user(&self.db, id).await
    }

    async fn get_user_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        let model = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .filter(user::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?;

        match model {
            Some(m) => fetch_user(&self.db, &m.id).await,
            None => Ok(None),
        }
    }

    async fn count_all(&self) -> DomainResult<u64> {
        Ok(user::Entity::find().count(&self.db).await?)
    }

    async fn create_user(
        &self,
        dto: CreateUserDto,
        uniqueness: EmailUniqueness,
    ) -> DomainResult<User> {
        let txn = self.db.begin().await?;

        ensure_email_available(&txn, &dto.email, None, uniqueness).await?;

        let now = Utc::now();
        let id = uuid::Uuid::new_v4().to_string();

        let new_user = user::ActiveModel {
            id: Set(id.clone()),
            name: Set(dto.name),
            email: Set(dto.email),
            password_hash: Set(dto.password_hash),
            is_active: Set(dto.is_active),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        };
        new_user.insert(&txn).await.map_err(email_conflict)?;

        replace_roles(&txn, &id, &dto.role_ids).await?;

        let created = fetch_user(&txn, &id)
            .await?
            .ok_or_else(|| DomainError::user_not_found(&id))?;

        txn.commit().await?;
        Ok(created)
    }

    async fn update_user(
        &self,
        id: &str,
        dto: UpdateUserDto,
        uniqueness: EmailUniqueness,
    ) -> DomainResult<User> {
        let txn = self.db.begin().await?;

        let existing = user::Entity::find_by_id(id)
            .filter(user::Column::DeletedAt.is_null())
            .one(&txn)
            .await?
            .ok_or_else(|| DomainError::user_not_found(id))?;

        ensure_email_available(&txn, &dto.email, Some(id), uniqueness).await?;

        let mut active: user::ActiveModel = existing.into();
        active.name = Set(dto.name);
        active.email = Set(dto.email);
        if let Some(hash) = dto.password_hash {
            active.password_hash = Set(Some(hash));
        }
        if let Some(is_active) = dto.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());
        active.update(&txn).await.map_err(email_conflict)?;

        replace_roles(&txn, id, &dto.role_ids).await?;

        let updated = fetch_user(&txn, id)
            .await?
            .ok_or_else(|| DomainError::user_not_found(id))?;

        txn.commit().await?;
        Ok(updated)
    }

    async fn soft_delete_users(&self, ids: &[String]) -> DomainResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();
        let result = user::Entity::update_many()
            .col_expr(user::Column::DeletedAt, Expr::value(now))
            .col_expr(user::Column::UpdatedAt, Expr::value(now))
            .filter(user::Column::Id.is_in(ids.iter().cloned()))
            .filter(user::Column::DeletedAt.is_null())
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }

    async fn restore_user(&self, id: &str) -> DomainResult<User> {
        let txn = self.db.begin().await?;

        let existing = user::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .filter(|m| m.deleted_at.is_some())
            .ok_or_else(|| DomainError::user_not_found(id))?;

        ensure_email_available(&txn, &existing.email, Some(id), EmailUniqueness::ActiveOnly)
            .await?;

        let mut active: user::ActiveModel = existing.into();
        active.deleted_at = Set(None);
        active.updated_at = Set(Utc::now());
        active.update(&txn).await.map_err(email_conflict)?;

        let restored = fetch_user(&txn, id)
            .await?
            .ok_or_else(|| DomainError::user_not_found(id))?;

        txn.commit().await?;
        Ok(restored)
    }
}
