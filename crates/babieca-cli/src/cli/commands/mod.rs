//! CLI command handlers.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result, bail};
use babieca_core::admin::AdminService;
use babieca_core::api::ApiClient;
use babieca_core::auctions::AuctionStore;
use babieca_core::auth::AuthService;
use babieca_core::config::Config;
use babieca_core::session::SessionStore;
use babieca_types::User;

pub mod admin;
pub mod auctions;
pub mod auth;
pub mod bid;
pub mod config;
pub mod profile;

/// Config plus the auth service built from the stored session.
pub struct ClientContext {
    pub config: Config,
    pub auth: AuthService,
}

impl ClientContext {
    /// Loads config and session without contacting the backend.
    pub fn load() -> Result<Self> {
        let config = Config::load().context("load config")?;
        let api = ApiClient::from_config(&config)?;
        tracing::debug!(base_url = api.base_url(), "api client configured");
        let session = SessionStore::open_default().context("open session")?;
        Ok(Self {
            config,
            auth: AuthService::new(api, session),
        })
    }

    /// Loads and validates the stored session.
    pub async fn restore() -> Result<Self> {
        let mut ctx = Self::load()?;
        ctx.auth.restore().await.context("restore session")?;
        Ok(ctx)
    }

    pub fn require_user(&self) -> Result<&User> {
        match self.auth.user() {
            Some(user) => Ok(user),
            None => bail!("Not logged in. Run `babieca login` first."),
        }
    }

    pub fn require_admin(&self) -> Result<&User> {
        let user = self.require_user()?;
        if !self.auth.can_access_admin() {
            bail!("Admin access required (logged in as {})", user.username);
        }
        Ok(user)
    }

    /// Bidder id for the signed-in user: the stored one, else the user id.
    pub fn bidder_id(&self) -> Option<String> {
        self.auth
            .session()
            .bidder_id()
            .map(ToString::to_string)
            .or_else(|| self.auth.user().map(|u| u.id.clone()))
    }

    pub fn auction_store(&self) -> AuctionStore {
        AuctionStore::new(self.auth.api().clone(), self.bidder_id())
    }

    pub fn admin(&self) -> AdminService {
        AdminService::new(self.auth.api().clone(), self.auth.session())
    }
}

/// Reads one trimmed line after printing `label`.
pub fn prompt(label: &str) -> Result<String> {
    print!("{label}: ");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Uses the given value, or asks for it.
pub fn value_or_prompt(value: Option<String>, label: &str) -> Result<String> {
    match value {
        Some(value) => Ok(value),
        None => prompt(label),
    }
}

/// Asks a yes/no question. Only `y` confirms.
pub fn confirm(question: &str) -> Result<bool> {
    print!("{question} [y/N] ");
    io::stdout().flush()?;
    let mut response = String::new();
    io::stdin().lock().read_line(&mut response)?;
    Ok(response.trim().eq_ignore_ascii_case("y"))
}
