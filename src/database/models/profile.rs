use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::database::manager::DatabaseError;

/// Application role stored on the profile row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Assistant,
    Client,
}

impl Role {
    /// Staff roles that may read practice-wide data
    pub const STAFF: &'static [Role] = &[Role::Admin, Role::Assistant];
    pub const ADMIN_ONLY: &'static [Role] = &[Role::Admin];
    pub const CLIENT_ONLY: &'static [Role] = &[Role::Client];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Assistant => "assistant",
            Role::Client => "client",
        }
    }

    pub fn is_staff(&self) -> bool {
        Self::STAFF.contains(self)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "assistant" => Ok(Role::Assistant),
            "client" => Ok(Role::Client),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Application-level user record, one-to-one with an identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub email: String,
    pub role: Role,
    pub active: bool,
    pub must_change_password: bool,
    pub created_at: DateTime<Utc>,
}

/// Raw `profiles` row; role is plain text in the table
#[derive(Debug, Clone, FromRow)]
pub(crate) struct ProfileRow {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub role: String,
    pub active: bool,
    pub must_change_password: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = DatabaseError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<Role>()
            .map_err(|e| DatabaseError::Corrupt(format!("profile {}: {}", row.id, e)))?;

        Ok(Profile {
            id: row.id,
            full_name: row.full_name,
            email: row.email.unwrap_or_default(),
            role,
            active: row.active,
            must_change_password: row.must_change_password,
            created_at: row.created_at,
        })
    }
}

/// Fields the gateway and self-service flows may change.
/// `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfilePatch {
    pub role: Option<Role>,
    pub active: Option<bool>,
    pub must_change_password: Option<bool>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.role.is_none() && self.active.is_none() && self.must_change_password.is_none()
    }

    pub fn apply(&self, profile: &mut Profile) {
        if let Some(role) = self.role {
            profile.role = role;
        }
        if let Some(active) = self.active {
            profile.active = active;
        }
        if let Some(flag) = self.must_change_password {
            profile.must_change_password = flag;
        }
    }
}

/// Row shape returned by admin-list-users
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub email: String,
    pub role: Role,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Profile> for UserSummary {
    fn from(p: Profile) -> Self {
        Self {
            id: p.id,
            full_name: p.full_name,
            email: p.email,
            role: p.role,
            active: p.active,
            created_at: p.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(role: &str) -> ProfileRow {
        ProfileRow {
            id: Uuid::new_v4(),
            full_name: Some("Ana".to_string()),
            email: None,
            role: role.to_string(),
            active: true,
            must_change_password: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn parses_known_roles_only() {
        assert_eq!("assistant".parse::<Role>(), Ok(Role::Assistant));
        assert!("superuser".parse::<Role>().is_err());
        assert!(Role::Admin.is_staff());
        assert!(!Role::Client.is_staff());
    }

    #[test]
    fn row_with_unknown_role_is_corrupt() {
        assert!(matches!(Profile::try_from(row("root")), Err(DatabaseError::Corrupt(_))));
        let profile = Profile::try_from(row("client")).unwrap();
        assert_eq!(profile.email, "");
    }

    #[test]
    fn patch_only_touches_given_fields() {
        let mut profile = Profile::try_from(row("client")).unwrap();
        let patch = ProfilePatch { active: Some(false), ..Default::default() };
        patch.apply(&mut profile);
        assert!(!profile.active);
        assert_eq!(profile.role, Role::Client);
        assert!(ProfilePatch::default().is_empty());
    }
}
