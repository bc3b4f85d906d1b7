//! User management for administrators.
//!
//! Offline sessions (no token or the root token) never reach the backend:
//! listings come back empty and writes report success.

use anyhow::{Context, Result};
use babieca_types::{Role, User, UserType, UserUpdate};

use crate::api::{ApiClient, RegisterRequest};
use crate::session::SessionStore;

/// Account created from the admin panel.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub user_type: UserType,
    pub phone: String,
    pub role: Role,
}

/// Header counters of the users tab.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserStats {
    pub total: usize,
    pub active: usize,
    pub blocked: usize,
}

impl UserStats {
    pub fn from_users(users: &[User]) -> Self {
        let blocked = users.iter().filter(|u| u.is_blocked).count();
        Self {
            total: users.len(),
            active: users.len() - blocked,
            blocked,
        }
    }
}

#[derive(Debug)]
pub struct AdminService {
    api: ApiClient,
    offline: bool,
}

impl AdminService {
    pub fn new(api: ApiClient, session: &SessionStore) -> Self {
        Self {
            api,
            offline: session.is_offline(),
        }
    }

    pub fn is_offline(&self) -> bool {
        self.offline
    }

    /// # Errors
    /// Returns an error if the backend request fails.
    pub async fn list_users(&self) -> Result<Vec<User>> {
        if self.offline {
            return Ok(Vec::new());
        }
        self.api.list_users().await.context("Error loading users")
    }

    /// Blocks, unblocks or changes the role of a user.
    ///
    /// # Errors
    /// Returns an error if the backend refuses the update.
    pub async fn update_user_status(&self, id: &str, updates: &UserUpdate) -> Result<()> {
        if self.offline {
            tracing::debug!(user = id, "offline session, user update kept local");
            return Ok(());
        }
        self.api
            .update_user(id, updates)
            .await
            .context("Error updating user")
    }

    /// # Errors
    /// Returns an error if the backend refuses the deletion.
    pub async fn delete_user(&self, id: &str) -> Result<()> {
        if self.offline {
            return Ok(());
        }
        self.api.delete_user(id).await.context("Error deleting user")?;
        tracing::info!(user = id, "user deleted");
        Ok(())
    }

    /// Creates an account with the chosen role through the registration
    /// endpoint, authorized with the administrator's token.
    ///
    /// # Errors
    /// Returns an error if the backend refuses the account.
    pub async fn create_user(&self, user: NewUser) -> Result<()> {
        if self.offline {
            return Ok(());
        }
        let request = RegisterRequest::bidder(
            user.username,
            user.email,
            user.password,
            user.user_type,
            user.phone,
        )
        .with_role(user.role);
        self.api
            .register(&request)
            .await
            .context("Error creating user")?;
        Ok(())
    }
}
