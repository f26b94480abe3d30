use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::auth::responses::{AccountStatus, Role, UserSummary};

/// Full account row, including the credential hash.
///
/// Internal only: this type deliberately does not derive `Serialize`, so the
/// hash cannot cross the wire by accident. Role and status stay as the raw
/// column text here and are narrowed to their enums at the edge.
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub id: i32,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub status: String,
    pub token_version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn role(&self) -> Role {
        Role::from_str(&self.role)
    }

    pub fn status(&self) -> AccountStatus {
        AccountStatus::from_str(&self.status)
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            role: self.role(),
            status: self.status(),
            created_at: self.created_at,
        }
    }
}

/// Hash-free projection used by list queries and `RETURNING` clauses.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i32,
    pub full_name: String,
    pub email: String,
    pub role: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    pub fn into_summary(self) -> UserSummary {
        UserSummary {
            id: self.id,
            role: Role::from_str(&self.role),
            status: AccountStatus::from_str(&self.status),
            full_name: self.full_name,
            email: self.email,
            created_at: self.created_at,
        }
    }
}
