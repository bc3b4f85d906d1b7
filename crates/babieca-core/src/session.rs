//! Persisted client session.
//!
//! Three keys survive between runs: the auth token, the signed-in user
//! record and the bidder identifier. They live in `<base>/session.json`
//! with restricted permissions (0600). Tokens are never logged.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use babieca_types::User;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::config::paths;

/// Token of the offline root account. Writes made with it stay local.
pub const ROOT_TOKEN: &str = "root-token";

/// A single persisted key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKey {
    AuthToken,
    UserData,
    BidderId,
}

impl SessionKey {
    pub const ALL: [SessionKey; 3] = [
        SessionKey::AuthToken,
        SessionKey::UserData,
        SessionKey::BidderId,
    ];
}

/// On-disk layout of the session file.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_data: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bidder_id: Option<String>,
}

/// Session backed by a file. Every mutation is written through immediately.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
    session: Session,
}

impl SessionStore {
    /// Opens the session at the default location.
    ///
    /// # Errors
    /// Returns an error if an existing session file cannot be read or parsed.
    pub fn open_default() -> Result<Self> {
        Self::open(paths::session_path())
    }

    /// Opens the session stored at `path`. A missing file is an empty session.
    ///
    /// # Errors
    /// Returns an error if an existing session file cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let session = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read session from {}", path.display()))?;
            if contents.trim().is_empty() {
                Session::default()
            } else {
                serde_json::from_str(&contents)
                    .with_context(|| format!("Failed to parse session from {}", path.display()))?
            }
        } else {
            Session::default()
        };
        Ok(Self { path, session })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn token(&self) -> Option<&str> {
        self.session.auth_token.as_deref()
    }

    pub fn user(&self) -> Option<&User> {
        self.session.user_data.as_ref()
    }

    pub fn bidder_id(&self) -> Option<&str> {
        self.session.bidder_id.as_deref()
    }

    /// Whether writes should skip the backend (no token or the root token).
    pub fn is_offline(&self) -> bool {
        self.token().is_none_or(|t| t == ROOT_TOKEN)
    }

    /// # Errors
    /// Returns an error if the session file cannot be written.
    pub fn set_token(&mut self, token: impl Into<String>) -> Result<()> {
        self.session.auth_token = Some(token.into());
        self.save()
    }

    /// # Errors
    /// Returns an error if the session file cannot be written.
    pub fn set_user(&mut self, user: User) -> Result<()> {
        self.session.user_data = Some(user);
        self.save()
    }

    /// # Errors
    /// Returns an error if the session file cannot be written.
    pub fn set_bidder_id(&mut self, bidder_id: impl Into<String>) -> Result<()> {
        self.session.bidder_id = Some(bidder_id.into());
        self.save()
    }

    /// Removes one key.
    ///
    /// # Errors
    /// Returns an error if the session file cannot be written.
    pub fn remove(&mut self, key: SessionKey) -> Result<()> {
        match key {
            SessionKey::AuthToken => self.session.auth_token = None,
            SessionKey::UserData => self.session.user_data = None,
            SessionKey::BidderId => self.session.bidder_id = None,
        }
        self.save()
    }

    /// Removes all three keys.
    ///
    /// # Errors
    /// Returns an error if the session file cannot be written.
    pub fn clear(&mut self) -> Result<()> {
        self.session = Session::default();
        self.save()
    }

    /// Replaces the session file atomically. The file is private (0600)
    /// even when an older copy had wider permissions.
    fn save(&self) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;

        let contents =
            serde_json::to_string_pretty(&self.session).context("Failed to serialize session")?;

        let mut tmp = NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(fs::Permissions::from_mode(0o600))
                .context("Failed to restrict session permissions")?;
        }
        tmp.write_all(contents.as_bytes())
            .with_context(|| format!("Failed to write to {}", tmp.path().display()))?;
        tmp.persist(&self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;

        Ok(())
    }
}
