//! User accounts as mirrored from the backend.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::envelope::{attributes, first_bool, first_id, first_str, first_timestamp};

/// Authorization role of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
    SuperAdmin,
}

impl Role {
    /// Maps a backend role name. Unknown names (e.g. `Bidder`,
    /// `Authenticated`) are plain users.
    pub fn from_backend_name(name: &str) -> Self {
        let normalized: String = name
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "admin" | "administrator" => Role::Admin,
            "superadmin" => Role::SuperAdmin,
            _ => Role::User,
        }
    }

    /// Accepts either a role string or a users-permissions role object.
    fn from_backend_value(value: &Value) -> Self {
        match value {
            Value::String(name) => Self::from_backend_name(name),
            Value::Object(_) => first_str(value, &["type", "name"])
                .map(Self::from_backend_name)
                .unwrap_or_default(),
            _ => Role::User,
        }
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::SuperAdmin => "superadmin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            "superadmin" => Ok(Role::SuperAdmin),
            other => Err(format!(
                "unknown role '{other}' (expected user, admin or superadmin)"
            )),
        }
    }
}

/// Account category chosen at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    #[default]
    Particular,
    Profesional,
}

impl UserType {
    pub fn as_str(self) -> &'static str {
        match self {
            UserType::Particular => "particular",
            UserType::Profesional => "profesional",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "particular" => Ok(UserType::Particular),
            "profesional" | "professional" => Ok(UserType::Profesional),
            other => Err(format!(
                "unknown user type '{other}' (expected particular or profesional)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub user_type: UserType,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub is_blocked: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Builds a user from a backend record. Returns `None` without an id.
    pub fn from_api(record: &Value) -> Option<Self> {
        let attrs = attributes(record);
        let id = first_id(record, &["id"]).or_else(|| first_id(attrs, &["id"]))?;
        let user_type = first_str(attrs, &["userType"])
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default();
        let role = attrs
            .get("role")
            .map(Role::from_backend_value)
            .unwrap_or_default();

        Some(Self {
            id,
            document_id: first_str(record, &["documentId"])
                .or_else(|| first_str(attrs, &["documentId"]))
                .map(ToString::to_string),
            username: first_str(attrs, &["username"]).unwrap_or_default().to_string(),
            email: first_str(attrs, &["email"]).unwrap_or_default().to_string(),
            user_type,
            phone: first_str(attrs, &["phone"]).unwrap_or_default().to_string(),
            role,
            is_blocked: first_bool(attrs, &["isBlocked", "blocked"]).unwrap_or(false),
            created_at: first_timestamp(attrs, &["createdAt"]).unwrap_or_default(),
        })
    }

    /// Applies a partial update in place.
    pub fn merge(&mut self, changes: &UserUpdate) {
        if let Some(username) = &changes.username {
            self.username.clone_from(username);
        }
        if let Some(email) = &changes.email {
            self.email.clone_from(email);
        }
        if let Some(phone) = &changes.phone {
            self.phone.clone_from(phone);
        }
        if let Some(user_type) = changes.user_type {
            self.user_type = user_type;
        }
        if let Some(role) = changes.role {
            self.role = role;
        }
        if let Some(blocked) = changes.is_blocked {
            self.is_blocked = blocked;
        }
    }
}

/// Partial user update. Only set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_type: Option<UserType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_blocked: Option<bool>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn blocked(blocked: bool) -> Self {
        Self {
            is_blocked: Some(blocked),
            ..Self::default()
        }
    }

    pub fn role(role: Role) -> Self {
        Self {
            role: Some(role),
            ..Self::default()
        }
    }
}

/// Authentication state of the client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    pub user: Option<User>,
    pub is_authenticated: bool,
    pub is_loading: bool,
}

impl AuthState {
    pub fn loading() -> Self {
        Self {
            is_loading: true,
            ..Self::default()
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn signed_in(user: User) -> Self {
        Self {
            user: Some(user),
            is_authenticated: true,
            is_loading: false,
        }
    }
}
