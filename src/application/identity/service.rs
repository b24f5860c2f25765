//! Identity service: authentication and principal resolution
//!
//! HTTP handlers and the auth middleware are thin wrappers around this.

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::{DomainError, DomainResult, Principal, RepositoryProvider, User};
use crate::infrastructure::crypto::jwt::{create_token, verify_token, JwtConfig, TokenError};
use crate::infrastructure::crypto::password::verify_password;

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Authentication result returned after a successful login
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: User,
}

pub struct IdentityService {
    repos: Arc<dyn RepositoryProvider>,
    jwt_config: JwtConfig,
}

impl IdentityService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, jwt_config: JwtConfig) -> Self {
        Self { repos, jwt_config }
    }

    /// Authenticate a live user by email + password and return a JWT.
    pub async fn login(&self, email: &str, password: &str) -> DomainResult<AuthResult> {
        let email = email.trim().to_lowercase();
        let Some(user) = self.repos.users().get_user_by_email(&email).await? else {
            debug!(email = %email, "Login for unknown email");
            return Err(DomainError::Unauthorized(INVALID_CREDENTIALS.into()));
        };

        // Users created without a password cannot log in.
        let valid = user
            .password_hash
            .as_deref()
            .map(|hash| verify_password(password, hash).unwrap_or(false))
            .unwrap_or(false);
        if !valid {
            return Err(DomainError::Unauthorized(INVALID_CREDENTIALS.into()));
        }

        if !user.is_active {
            return Err(DomainError::Unauthorized("Account is disabled".into()));
        }

        let token = create_token(&user.id, &user.email, &self.jwt_config)
            .map_err(|e| DomainError::Internal(format!("Failed to create token: {}", e)))?;

        info!(user_id = %user.id, "User logged in");
        Ok(AuthResult {
            token,
            token_type: "Bearer".into(),
            expires_in: self.jwt_config.lifetime_secs(),
            user,
        })
    }

    /// The live, active user behind a principal id.
    pub async fn current_user(&self, user_id: &str) -> DomainResult<User> {
        match self.repos.users().get_user_by_id(user_id).await? {
            Some(user) if !user.is_deleted() && user.is_active => Ok(user),
            _ => Err(DomainError::Unauthorized("User no longer exists".into())),
        }
    }

    /// Current role set of a live, active user.
    pub async fn resolve_principal(&self, user_id: &str) -> DomainResult<Principal> {
        let user = self.current_user(user_id).await?;
        Ok(Principal::new(user.id, user.roles))
    }

    /// Verifies a bearer token and resolves the principal behind it.
    pub async fn authenticate_token(&self, token: &str) -> DomainResult<Principal> {
        let claims = verify_token(token, &self.jwt_config).map_err(|e| match e {
            TokenError::Expired => DomainError::Unauthorized("Token expired".into()),
            other => {
                debug!("Rejected bearer token: {}", other);
                DomainError::Unauthorized("Invalid token".into())
            }
        })?;
        self.resolve_principal(&claims.sub).await
    }
}
