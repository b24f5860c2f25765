//! Requesting principal and the visibility scope derived from it

use std::collections::BTreeSet;

/// Name of the privileged role.
pub const SUPER_ADMIN: &str = "super_admin";

/// The authenticated actor behind a directory operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    pub roles: BTreeSet<String>,
}

impl Principal {
    pub fn new<I, S>(user_id: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            user_id: user_id.into(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    pub fn is_super_admin(&self) -> bool {
        self.has_role(SUPER_ADMIN)
    }

    pub fn scope(&self) -> VisibilityScope {
        VisibilityScope::for_principal(self)
    }
}

/// Row predicate applied to every user query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisibilityScope {
    /// Every live user is visible.
    All,
    /// Users holding the named role are hidden, and the role itself can be
    /// neither filtered by nor assigned.
    ExcludingRole(String),
}

impl VisibilityScope {
    pub fn for_principal(principal: &Principal) -> Self {
        if principal.is_super_admin() {
            Self::All
        } else {
            Self::ExcludingRole(SUPER_ADMIN.to_string())
        }
    }

    pub fn hidden_role(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::ExcludingRole(role) => Some(role.as_str()),
        }
    }

    /// Whether a user with the given role set is visible.
    pub fn admits<'a, I>(&self, user_roles: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        match self.hidden_role() {
            None => true,
            Some(hidden) => !user_roles.into_iter().any(|r| r == hidden),
        }
    }

    /// Whether the role may be shown, filtered by, or assigned.
    pub fn allows_role(&self, role: &str) -> bool {
        self.hidden_role() != Some(role)
    }
}
