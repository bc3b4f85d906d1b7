//! HTTP client for the auction backend REST API.
//!
//! Every call is a single request/response. List endpoints accept both the
//! `{ "data": [...] }` envelope and bare arrays; records that cannot be
//! identified are skipped.

mod error;

use std::time::Duration;

use babieca_types::envelope::{attributes, first_id, unwrap_data, unwrap_list};
use babieca_types::{Auction, AuctionUpdate, Bid, NewAuction, NewBid, Role, User, UserType, UserUpdate};
use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde_json::{Value, json};

pub use self::error::{ApiError, ApiErrorKind, ApiResult};
use self::error::classify_reqwest_error;
use crate::config::Config;

const USER_AGENT: &str = concat!("babieca/", env!("CARGO_PKG_VERSION"));

/// Successful login or registration.
#[derive(Debug, Clone)]
pub struct AuthResponse {
    pub jwt: String,
    pub user: User,
}

/// Account details sent to the registration endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub user_type: UserType,
    pub phone: String,
    /// Backend role name (`Bidder` for self-registration).
    pub role: String,
    pub blocked: bool,
}

impl RegisterRequest {
    /// Self-registration as a bidder.
    pub fn bidder(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        user_type: UserType,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            user_type,
            phone: phone.into(),
            role: "Bidder".to_string(),
            blocked: false,
        }
    }

    /// Account created by an administrator with an explicit role.
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role.as_str().to_string();
        self
    }
}

/// REST client bound to a base URL and an optional bearer token.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl ApiClient {
    /// Creates a client for `base_url` (no trailing slash).
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> ApiResult<Self> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ApiError::new(ApiErrorKind::Network, format!("HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            http,
        })
    }

    /// Creates a client from the effective configuration.
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the client cannot be built.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let base_url = config.effective_api_base_url()?;
        Ok(Self::new(base_url, config.request_timeout())?)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    /// Returns a copy of this client that authenticates with `token`.
    #[must_use]
    pub fn authorized(&self, token: &str) -> Self {
        Self {
            token: Some(token.to_string()),
            ..self.clone()
        }
    }

    // ---------------------------------------------------------------------
    // Auth
    // ---------------------------------------------------------------------

    /// `POST /auth/local`
    ///
    /// # Errors
    /// Returns an error on transport failure, non-success status, or a
    /// response without `jwt`/`user`.
    pub async fn login(&self, identifier: &str, password: &str) -> ApiResult<AuthResponse> {
        let body = json!({ "identifier": identifier, "password": password });
        let value = self
            .send(self.anonymous(Method::POST, "/auth/local").json(&body))
            .await?;
        parse_auth_response(&value)
    }

    /// `POST /auth/local/register`
    ///
    /// # Errors
    /// Returns an error on transport failure, non-success status, or a
    /// response without `jwt`/`user`.
    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<AuthResponse> {
        let value = self
            .send(self.request(Method::POST, "/auth/local/register").json(request))
            .await?;
        parse_auth_response(&value)
    }

    /// `POST /auth/forgot-password`
    ///
    /// # Errors
    /// Returns an error on transport failure or non-success status.
    pub async fn forgot_password(&self, email: &str) -> ApiResult<()> {
        let body = json!({ "email": email });
        self.send(self.anonymous(Method::POST, "/auth/forgot-password").json(&body))
            .await
            .map(drop)
    }

    /// `GET /users/me`, used to check that the stored token is still valid.
    ///
    /// # Errors
    /// Returns an error on transport failure or non-success status.
    pub async fn me(&self) -> ApiResult<Value> {
        self.send(self.request(Method::GET, "/users/me")).await
    }

    // ---------------------------------------------------------------------
    // Users
    // ---------------------------------------------------------------------

    /// `GET /users`
    ///
    /// # Errors
    /// Returns an error on transport failure or non-success status.
    pub async fn list_users(&self) -> ApiResult<Vec<User>> {
        let value = self.send(self.request(Method::GET, "/users")).await?;
        Ok(unwrap_list(&value).iter().filter_map(User::from_api).collect())
    }

    /// `GET /users/{id}?populate=*`, the bidder record of an account.
    ///
    /// # Errors
    /// Returns an error on transport failure or non-success status.
    pub async fn get_user(&self, id: &str) -> ApiResult<Value> {
        let path = format!("/users/{id}");
        self.send(self.request(Method::GET, &path).query(&[("populate", "*")]))
            .await
    }

    /// `PUT /users/{id}`
    ///
    /// # Errors
    /// Returns an error on transport failure or non-success status.
    pub async fn update_user(&self, id: &str, changes: &UserUpdate) -> ApiResult<()> {
        let path = format!("/users/{id}");
        self.send(self.request(Method::PUT, &path).json(changes))
            .await
            .map(drop)
    }

    /// `DELETE /users/{id}`
    ///
    /// # Errors
    /// Returns an error on transport failure or non-success status.
    pub async fn delete_user(&self, id: &str) -> ApiResult<()> {
        let path = format!("/users/{id}");
        self.send(self.request(Method::DELETE, &path)).await.map(drop)
    }

    // ---------------------------------------------------------------------
    // Auctions
    // ---------------------------------------------------------------------

    /// `GET /auctions?populate=*`
    ///
    /// # Errors
    /// Returns an error on transport failure or non-success status.
    pub async fn list_auctions(&self) -> ApiResult<Vec<Auction>> {
        let value = self
            .send(self.request(Method::GET, "/auctions").query(&[("populate", "*")]))
            .await?;
        Ok(unwrap_list(&value)
            .iter()
            .filter_map(Auction::from_api)
            .collect())
    }

    /// Auctions the bidder has bid on, with their bids and bidders populated.
    ///
    /// # Errors
    /// Returns an error on transport failure or non-success status.
    pub async fn list_bidder_auctions(&self, bidder_id: &str) -> ApiResult<Vec<Auction>> {
        let query = [
            ("populate[bids][populate]", "bidder"),
            ("filters[bids][bidder][id][$eq]", bidder_id),
        ];
        let value = self
            .send(self.request(Method::GET, "/auctions").query(&query))
            .await?;
        Ok(unwrap_list(&value)
            .iter()
            .filter_map(Auction::from_api)
            .collect())
    }

    /// `POST /auctions`
    ///
    /// # Errors
    /// Returns an error on transport failure or non-success status.
    pub async fn create_auction(&self, auction: &NewAuction, now: DateTime<Utc>) -> ApiResult<()> {
        let payload = auction.to_payload(now);
        self.send(self.request(Method::POST, "/auctions").json(&payload))
            .await
            .map(drop)
    }

    /// `PUT /auctions/{key}` with `{ "data": updates }`
    ///
    /// # Errors
    /// Returns an error on transport failure or non-success status.
    pub async fn update_auction(&self, key: &str, updates: &AuctionUpdate) -> ApiResult<()> {
        let path = format!("/auctions/{key}");
        let payload = json!({ "data": updates });
        self.send(self.request(Method::PUT, &path).json(&payload))
            .await
            .map(drop)
    }

    // ---------------------------------------------------------------------
    // Bids
    // ---------------------------------------------------------------------

    /// `GET /bids?populate=*`
    ///
    /// # Errors
    /// Returns an error on transport failure or non-success status.
    pub async fn list_bids(&self) -> ApiResult<Vec<Bid>> {
        let value = self
            .send(self.request(Method::GET, "/bids").query(&[("populate", "*")]))
            .await?;
        Ok(unwrap_list(&value).iter().filter_map(Bid::from_api).collect())
    }

    /// `POST /bids`
    ///
    /// # Errors
    /// Returns an error on transport failure or non-success status.
    pub async fn create_bid(&self, bid: &NewBid) -> ApiResult<()> {
        self.send(self.request(Method::POST, "/bids").json(&bid.to_payload()))
            .await
            .map(drop)
    }

    // ---------------------------------------------------------------------
    // Plumbing
    // ---------------------------------------------------------------------

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Request carrying the bearer token when one is set.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.anonymous(method, path);
        match self.token.as_deref() {
            Some(token) => builder.header(AUTHORIZATION, format!("Bearer {token}")),
            None => builder,
        }
    }

    /// Request without credentials (login, forgot-password).
    fn anonymous(&self, method: Method, path: &str) -> RequestBuilder {
        tracing::debug!(%method, path, "api request");
        self.http
            .request(method, self.url(path))
            .headers(default_headers())
    }

    /// Sends a request and decodes the JSON body. Empty bodies decode to `null`.
    async fn send(&self, builder: RequestBuilder) -> ApiResult<Value> {
        let response = builder.send().await.map_err(|e| classify_reqwest_error(&e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;

        if !status.is_success() {
            let err = ApiError::http_status(status.as_u16(), &body);
            tracing::warn!(status = status.as_u16(), error = %err, "api request failed");
            return Err(err);
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body)
            .map_err(|e| ApiError::parse(format!("Failed to parse response JSON: {e}")))
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers
}

fn parse_auth_response(value: &Value) -> ApiResult<AuthResponse> {
    let jwt = value
        .get("jwt")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::parse("Auth response is missing `jwt`"))?;
    let user = value
        .get("user")
        .and_then(User::from_api)
        .ok_or_else(|| ApiError::parse("Auth response is missing `user`"))?;
    Ok(AuthResponse {
        jwt: jwt.to_string(),
        user,
    })
}

/// Identifier of a bidder record returned by `GET /users/{id}`.
pub fn bidder_id_of(record: &Value) -> Option<String> {
    let record = unwrap_data(record);
    first_id(record, &["id"]).or_else(|| first_id(attributes(record), &["id"]))
}
