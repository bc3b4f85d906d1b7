//! Authentication: login, registration, logout and session restore.

use std::fmt;

use anyhow::{Context, Result};
use babieca_types::{AuthState, User, UserType, UserUpdate};

use crate::api::{ApiClient, ApiErrorKind, RegisterRequest, bidder_id_of};
use crate::session::{ROOT_TOKEN, SessionKey, SessionStore};

/// Authentication failures the user can act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Wrong email or password.
    InvalidCredentials,
    /// The account exists but is blocked by an administrator.
    Blocked,
    /// The backend refused the registration (usually a duplicate account).
    Registration(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "Incorrect email or password"),
            AuthError::Blocked => write!(f, "This account is blocked"),
            AuthError::Registration(reason) => write!(f, "Registration failed: {reason}"),
        }
    }
}

impl std::error::Error for AuthError {}

/// Details collected by the registration form.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub username: String,
    pub user_type: UserType,
    pub phone: String,
}

/// Owns the session and the signed-in state.
#[derive(Debug)]
pub struct AuthService {
    api: ApiClient,
    session: SessionStore,
    state: AuthState,
}

impl AuthService {
    /// The client picks up the stored token; the state stays `loading` until
    /// [`AuthService::restore`] runs.
    pub fn new(mut api: ApiClient, session: SessionStore) -> Self {
        api.set_token(session.token().map(ToString::to_string));
        Self {
            api,
            session,
            state: AuthState::loading(),
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn user(&self) -> Option<&User> {
        self.state.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated
    }

    /// Client authorized with the current token, if any.
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Administrators and super administrators may manage auctions and users.
    pub fn can_access_admin(&self) -> bool {
        self.user().is_some_and(|u| u.role.is_admin())
    }

    /// Validates the stored session.
    ///
    /// With both a token and a user on disk, the token is checked against
    /// `GET /users/me`. A rejected token (or an unreachable backend) drops the
    /// token and user data and leaves the client signed out. The root token is
    /// accepted without a round trip.
    ///
    /// # Errors
    /// Returns an error only if the session file cannot be written.
    pub async fn restore(&mut self) -> Result<&AuthState> {
        let (Some(token), Some(user)) = (
            self.session.token().map(ToString::to_string),
            self.session.user().cloned(),
        ) else {
            self.state = AuthState::signed_out();
            return Ok(&self.state);
        };

        if token == ROOT_TOKEN {
            self.state = AuthState::signed_in(user);
            return Ok(&self.state);
        }

        match self.api.authorized(&token).me().await {
            Ok(_) => {
                tracing::debug!(user = %user.username, "session restored");
                self.state = AuthState::signed_in(user);
            }
            Err(e) => {
                tracing::warn!(error = %e, "stored token rejected, signing out");
                self.session.remove(SessionKey::AuthToken)?;
                self.session.remove(SessionKey::UserData)?;
                self.api.set_token(None);
                self.state = AuthState::signed_out();
            }
        }
        Ok(&self.state)
    }

    /// Signs in and persists the token, user and bidder id.
    ///
    /// Blocked accounts are refused and nothing is stored.
    ///
    /// # Errors
    /// [`AuthError::InvalidCredentials`] when the backend rejects the
    /// credentials, [`AuthError::Blocked`] for blocked accounts, or a
    /// transport/session error.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<User> {
        let response = match self.api.login(email, password).await {
            Ok(response) => response,
            Err(e) if e.kind == ApiErrorKind::HttpStatus => {
                tracing::warn!(error = %e, "login rejected");
                return Err(AuthError::InvalidCredentials.into());
            }
            Err(e) => return Err(e).context("Server error"),
        };

        if response.user.is_blocked {
            tracing::warn!(user = %response.user.username, "blocked account tried to log in");
            return Err(AuthError::Blocked.into());
        }

        let authorized = self.api.authorized(&response.jwt);
        let bidder_id = match authorized.get_user(&response.user.id).await {
            Ok(record) => bidder_id_of(&record).unwrap_or_else(|| response.user.id.clone()),
            Err(e) => {
                tracing::warn!(error = %e, "bidder lookup failed, using user id");
                response.user.id.clone()
            }
        };

        self.session.set_token(response.jwt.clone())?;
        self.session.set_user(response.user.clone())?;
        self.session.set_bidder_id(bidder_id)?;
        self.api = authorized;
        self.state = AuthState::signed_in(response.user.clone());
        tracing::info!("logged in");

        Ok(response.user)
    }

    /// Registers a bidder account and signs it in.
    ///
    /// # Errors
    /// [`AuthError::Registration`] with the backend's reason when refused,
    /// or a transport/session error.
    pub async fn register(&mut self, input: RegisterInput) -> Result<User> {
        let request = RegisterRequest::bidder(
            input.username,
            input.email,
            input.password,
            input.user_type,
            input.phone,
        );

        let response = match self.api.register(&request).await {
            Ok(response) => response,
            Err(e) if e.kind == ApiErrorKind::HttpStatus => {
                tracing::warn!(error = %e, "registration rejected");
                let reason = e.backend_message().unwrap_or("User already exists");
                return Err(AuthError::Registration(reason.to_string()).into());
            }
            Err(e) => return Err(e).context("Server error"),
        };

        self.session.set_token(response.jwt.clone())?;
        self.session.set_user(response.user.clone())?;
        self.session.set_bidder_id(response.user.id.clone())?;
        self.api.set_token(Some(response.jwt));
        self.state = AuthState::signed_in(response.user.clone());

        Ok(response.user)
    }

    /// Clears all three session keys. Safe to call when signed out.
    ///
    /// # Errors
    /// Returns an error if the session file cannot be written.
    pub fn logout(&mut self) -> Result<()> {
        self.session.clear()?;
        self.api.set_token(None);
        self.state = AuthState::signed_out();
        Ok(())
    }

    /// Updates the signed-in user's profile.
    ///
    /// Without a user this does nothing. Offline sessions (no token or the
    /// root token) only update the local copy. Otherwise the backend is
    /// updated first and the local copy follows on success.
    ///
    /// # Errors
    /// Returns an error if the backend refuses the update or the session file
    /// cannot be written. The local user is unchanged on failure.
    pub async fn update_user(&mut self, changes: &UserUpdate) -> Result<()> {
        let Some(mut user) = self.state.user.clone() else {
            return Ok(());
        };

        if !self.session.is_offline() {
            self.api
                .update_user(&user.id, changes)
                .await
                .context("Failed to update profile")?;
        }

        user.merge(changes);
        self.session.set_user(user.clone())?;
        self.state.user = Some(user);
        Ok(())
    }

    /// Asks the backend to send a password recovery email.
    pub async fn send_password_reset(&self, email: &str) -> bool {
        match self.api.forgot_password(email).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "password reset failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::{TempDir, tempdir};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn service(server: &MockServer, dir: &TempDir) -> AuthService {
        let api = ApiClient::new(server.uri(), None).unwrap();
        let session = SessionStore::open(dir.path().join("session.json")).unwrap();
        AuthService::new(api, session)
    }

    fn login_body(blocked: bool) -> serde_json::Value {
        json!({
            "jwt": "jwt-ana",
            "user": {
                "id": 5,
                "username": "ana",
                "email": "ana@example.com",
                "role": { "type": "admin" },
                "blocked": blocked
            }
        })
    }

    #[tokio::test]
    async fn login_stores_token_user_and_bidder() {
        let server = MockServer::start().await;
        let dir = tempdir().unwrap();
        Mock::given(method("POST"))
            .and(path("/auth/local"))
            .respond_with(ResponseTemplate::new(200).set_body_json(login_body(false)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users/5"))
            .and(header("authorization", "Bearer jwt-ana"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 15 })))
            .expect(1)
            .mount(&server)
            .await;

        let mut auth = service(&server, &dir);
        let user = auth.login("ana@example.com", "pw").await.unwrap();
        assert_eq!(user.username, "ana");
        assert!(auth.is_authenticated());
        assert!(auth.can_access_admin());

        let stored = SessionStore::open(dir.path().join("session.json")).unwrap();
        assert_eq!(stored.token(), Some("jwt-ana"));
        assert_eq!(stored.bidder_id(), Some("15"));
        assert_eq!(stored.user().map(|u| u.id.as_str()), Some("5"));
    }

    #[tokio::test]
    async fn login_rejects_blocked_user_without_storing() {
        let server = MockServer::start().await;
        let dir = tempdir().unwrap();
        Mock::given(method("POST"))
            .and(path("/auth/local"))
            .respond_with(ResponseTemplate::new(200).set_body_json(login_body(true)))
            .mount(&server)
            .await;

        let mut auth = service(&server, &dir);
        let err = auth.login("ana@example.com", "pw").await.unwrap_err();
        assert_eq!(err.downcast_ref::<AuthError>(), Some(&AuthError::Blocked));
        assert!(!auth.is_authenticated());
        assert!(!dir.path().join("session.json").exists());
    }

    #[tokio::test]
    async fn login_with_bad_password_is_invalid_credentials() {
        let server = MockServer::start().await;
        let dir = tempdir().unwrap();
        Mock::given(method("POST"))
            .and(path("/auth/local"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": { "message": "Invalid identifier or password" }
            })))
            .mount(&server)
            .await;

        let mut auth = service(&server, &dir);
        let err = auth.login("ana@example.com", "nope").await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<AuthError>(),
            Some(&AuthError::InvalidCredentials)
        );
    }

    #[tokio::test]
    async fn register_signs_in_as_bidder() {
        let server = MockServer::start().await;
        let dir = tempdir().unwrap();
        Mock::given(method("POST"))
            .and(path("/auth/local/register"))
            .and(body_partial_json(json!({ "role": "Bidder", "blocked": false, "userType": "profesional" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jwt": "jwt-new",
                "user": { "id": 21, "username": "leo", "email": "leo@example.com" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut auth = service(&server, &dir);
        let user = auth
            .register(RegisterInput {
                email: "leo@example.com".to_string(),
                password: "secret".to_string(),
                username: "leo".to_string(),
                user_type: UserType::Profesional,
                phone: "600000000".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(user.id, "21");
        assert_eq!(auth.session().bidder_id(), Some("21"));
        assert_eq!(auth.api().token(), Some("jwt-new"));
    }

    #[tokio::test]
    async fn register_duplicate_reports_backend_reason() {
        let server = MockServer::start().await;
        let dir = tempdir().unwrap();
        Mock::given(method("POST"))
            .and(path("/auth/local/register"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": { "message": "Email or Username are already taken" }
            })))
            .mount(&server)
            .await;

        let mut auth = service(&server, &dir);
        let err = auth
            .register(RegisterInput {
                email: "ana@example.com".to_string(),
                password: "pw".to_string(),
                username: "ana".to_string(),
                user_type: UserType::Particular,
                phone: String::new(),
            })
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Registration failed: Email or Username are already taken"
        );
    }

    #[tokio::test]
    async fn restore_with_rejected_token_clears_token_and_user() {
        let server = MockServer::start().await;
        let dir = tempdir().unwrap();
        Mock::given(method("GET"))
            .and(path("/users/me"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let session_path = dir.path().join("session.json");
        let mut session = SessionStore::open(&session_path).unwrap();
        session.set_token("expired").unwrap();
        session
            .set_user(User::from_api(&json!({ "id": 5, "username": "ana" })).unwrap())
            .unwrap();
        session.set_bidder_id("15").unwrap();

        let mut auth = AuthService::new(ApiClient::new(server.uri(), None).unwrap(), session);
        let state = auth.restore().await.unwrap();
        assert!(!state.is_authenticated);
        assert!(!state.is_loading);

        let stored = SessionStore::open(&session_path).unwrap();
        assert_eq!(stored.token(), None);
        assert!(stored.user().is_none());
        assert_eq!(stored.bidder_id(), Some("15"));
    }

    #[tokio::test]
    async fn restore_accepts_root_token_offline() {
        let server = MockServer::start().await;
        let dir = tempdir().unwrap();
        Mock::given(method("GET"))
            .and(path("/users/me"))
            .respond_with(ResponseTemplate::new(401))
            .expect(0)
            .mount(&server)
            .await;

        let mut session = SessionStore::open(dir.path().join("session.json")).unwrap();
        session.set_token(ROOT_TOKEN).unwrap();
        session
            .set_user(User::from_api(&json!({ "id": 1, "username": "root" })).unwrap())
            .unwrap();

        let mut auth = AuthService::new(ApiClient::new(server.uri(), None).unwrap(), session);
        assert!(auth.restore().await.unwrap().is_authenticated);
        assert_eq!(auth.session().token(), Some(ROOT_TOKEN));
    }

    #[tokio::test]
    async fn restore_with_valid_token_signs_in() {
        let server = MockServer::start().await;
        let dir = tempdir().unwrap();
        Mock::given(method("GET"))
            .and(path("/users/me"))
            .and(header("authorization", "Bearer good"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 5 })))
            .mount(&server)
            .await;

        let mut session = SessionStore::open(dir.path().join("session.json")).unwrap();
        session.set_token("good").unwrap();
        session
            .set_user(User::from_api(&json!({ "id": 5, "username": "ana" })).unwrap())
            .unwrap();

        let mut auth = AuthService::new(ApiClient::new(server.uri(), None).unwrap(), session);
        assert!(auth.restore().await.unwrap().is_authenticated);
        assert_eq!(auth.user().map(|u| u.username.as_str()), Some("ana"));
    }

    #[tokio::test]
    async fn restore_without_user_stays_signed_out() {
        let server = MockServer::start().await;
        let dir = tempdir().unwrap();
        let mut session = SessionStore::open(dir.path().join("session.json")).unwrap();
        session.set_token("orphan").unwrap();

        let mut auth = AuthService::new(ApiClient::new(server.uri(), None).unwrap(), session);
        assert!(!auth.restore().await.unwrap().is_authenticated);
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn logout_clears_all_keys() {
        let server = MockServer::start().await;
        let dir = tempdir().unwrap();
        let mut session = SessionStore::open(dir.path().join("session.json")).unwrap();
        session.set_token("t").unwrap();
        session.set_bidder_id("15").unwrap();

        let mut auth = AuthService::new(ApiClient::new(server.uri(), None).unwrap(), session);
        auth.logout().unwrap();

        let stored = SessionStore::open(dir.path().join("session.json")).unwrap();
        assert_eq!(stored.token(), None);
        assert_eq!(stored.bidder_id(), None);
        assert!(stored.user().is_none());
        assert_eq!(auth.api().token(), None);
    }

    #[tokio::test]
    async fn offline_profile_update_is_local_only() {
        let server = MockServer::start().await;
        let dir = tempdir().unwrap();
        let mut session = SessionStore::open(dir.path().join("session.json")).unwrap();
        session.set_token(ROOT_TOKEN).unwrap();
        session
            .set_user(User::from_api(&json!({ "id": 1, "username": "root" })).unwrap())
            .unwrap();

        let mut auth = AuthService::new(ApiClient::new(server.uri(), None).unwrap(), session);
        auth.restore().await.unwrap();
        auth.update_user(&UserUpdate {
            phone: Some("123".to_string()),
            ..UserUpdate::default()
        })
        .await
        .unwrap();

        assert_eq!(auth.user().map(|u| u.phone.as_str()), Some("123"));
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn failed_profile_update_keeps_local_user() {
        let server = MockServer::start().await;
        let dir = tempdir().unwrap();
        Mock::given(method("GET"))
            .and(path("/users/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 5 })))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/users/5"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let mut session = SessionStore::open(dir.path().join("session.json")).unwrap();
        session.set_token("good").unwrap();
        session
            .set_user(User::from_api(&json!({ "id": 5, "username": "ana" })).unwrap())
            .unwrap();

        let mut auth = AuthService::new(ApiClient::new(server.uri(), None).unwrap(), session);
        auth.restore().await.unwrap();
        let result = auth
            .update_user(&UserUpdate {
                username: Some("ana2".to_string()),
                ..UserUpdate::default()
            })
            .await;
        assert!(result.is_err());
        assert_eq!(auth.user().map(|u| u.username.as_str()), Some("ana"));
    }

    #[tokio::test]
    async fn password_reset_reports_backend_answer() {
        let server = MockServer::start().await;
        let dir = tempdir().unwrap();
        Mock::given(method("POST"))
            .and(path("/auth/forgot-password"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .mount(&server)
            .await;

        let auth = service(&server, &dir);
        assert!(auth.send_password_reset("ana@example.com").await);

        let refusing = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&refusing)
            .await;
        let auth = service(&refusing, &dir);
        assert!(!auth.send_password_reset("ana@example.com").await);
    }
}
