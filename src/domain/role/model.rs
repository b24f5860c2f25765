//! Role domain entity

use chrono::{DateTime, Utc};

/// Named permission group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
