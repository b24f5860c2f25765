//! User domain entity

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Directory user. `password_hash` never leaves the service layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub is_active: bool,
    pub roles: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    /// Role names joined for display, in name order.
    pub fn roles_display(&self) -> String {
        self.roles
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Which rows reserve an email address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailUniqueness {
    /// Only live users; a soft-deleted user's email can be reused.
    #[default]
    ActiveOnly,
    /// Soft-deleted users keep their email reserved.
    IncludingDeleted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_are_joined_in_name_order() {
        let now = Utc::now();
        let user = User {
            id: "u1".into(),
            name: "Ann".into(),
            email: "ann@example.com".into(),
            password_hash: None,
            is_active: true,
            roles: ["manager", "editor"].iter().map(|s| s.to_string()).collect(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        assert_eq!(user.roles_display(), "editor, manager");
        assert!(!user.is_deleted());
    }

    #[test]
    fn uniqueness_policy_parses_snake_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            policy: EmailUniqueness,
        }
        let w: Wrapper = toml::from_str("policy = \"including_deleted\"").unwrap();
        assert_eq!(w.policy, EmailUniqueness::IncludingDeleted);
    }
}
