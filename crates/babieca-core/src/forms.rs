//! Input handling for the login form, the bid dialog and the auction dialog.
//!
//! Each form turns raw text into a domain request and maps failures to the
//! message shown to the user.

use std::fmt;

use babieca_types::envelope::parse_timestamp;
use babieca_types::{Auction, NewAuction, User, UserType};
use chrono::{DateTime, NaiveDateTime, Utc};

use crate::auth::{AuthError, AuthService, RegisterInput};

/// A message meant for the person filling the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormError(pub String);

impl FormError {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for FormError {}

const SERVER_ERROR: &str = "Server error";

// ---------------------------------------------------------------------------
// Login form
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginMode {
    Login,
    Register,
    Forgot,
}

impl LoginMode {
    /// Message shown when the backend refuses the request.
    pub fn failure_message(self) -> &'static str {
        match self {
            LoginMode::Login => "Incorrect email or password",
            LoginMode::Register => "User already exists",
            LoginMode::Forgot => "Could not send the recovery email",
        }
    }
}

/// Fields of the login form. Only the ones the mode needs are read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoginFields {
    pub email: String,
    pub password: String,
    pub username: String,
    pub user_type: UserType,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    SignedIn(User),
    Registered(User),
    ResetSent,
}

/// Submits the login form in the given mode.
///
/// # Errors
/// Returns the user-facing message for the failure.
pub async fn submit_login(
    mode: LoginMode,
    auth: &mut AuthService,
    fields: LoginFields,
) -> Result<LoginOutcome, FormError> {
    match mode {
        LoginMode::Login => auth
            .login(&fields.email, &fields.password)
            .await
            .map(LoginOutcome::SignedIn)
            .map_err(|e| auth_failure(mode, &e)),
        LoginMode::Register => auth
            .register(RegisterInput {
                email: fields.email,
                password: fields.password,
                username: fields.username,
                user_type: fields.user_type,
                phone: fields.phone,
            })
            .await
            .map(LoginOutcome::Registered)
            .map_err(|e| auth_failure(mode, &e)),
        LoginMode::Forgot => {
            if auth.send_password_reset(&fields.email).await {
                Ok(LoginOutcome::ResetSent)
            } else {
                Err(FormError::new(mode.failure_message()))
            }
        }
    }
}

fn auth_failure(mode: LoginMode, err: &anyhow::Error) -> FormError {
    match err.downcast_ref::<AuthError>() {
        Some(AuthError::Blocked) => FormError::new(AuthError::Blocked.to_string()),
        Some(_) => FormError::new(mode.failure_message()),
        None => FormError::new(SERVER_ERROR),
    }
}

// ---------------------------------------------------------------------------
// Bid dialog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormStep {
    Enter,
    Confirm,
}

/// What the dialog asks for after a submit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BidAction {
    /// Show the confirmation step for this amount.
    Confirm(f64),
    /// Confirmed; place the bid.
    Place(f64),
}

/// Two-step bid entry: enter an amount, confirm it, then place it.
#[derive(Debug, Clone)]
pub struct BidForm {
    current_bid: f64,
    step: FormStep,
}

impl BidForm {
    pub fn new(auction: &Auction) -> Self {
        Self {
            current_bid: auction.current_bid,
            step: FormStep::Enter,
        }
    }

    pub fn step(&self) -> FormStep {
        self.step
    }

    pub fn current_bid(&self) -> f64 {
        self.current_bid
    }

    /// Suggested lowest amount.
    pub fn minimum_bid(&self) -> f64 {
        self.current_bid + 1.0
    }

    /// # Errors
    /// Returns a message when the amount is not a number or does not exceed
    /// the current bid. The step does not change on error.
    pub fn submit(&mut self, input: &str) -> Result<BidAction, FormError> {
        let amount = parse_amount(input).ok_or_else(|| FormError::new("Enter a valid amount"))?;
        if amount <= self.current_bid {
            return Err(FormError::new("Bid must be higher than the current bid"));
        }
        match self.step {
            FormStep::Enter => {
                self.step = FormStep::Confirm;
                Ok(BidAction::Confirm(amount))
            }
            FormStep::Confirm => Ok(BidAction::Place(amount)),
        }
    }

    /// Backs out one step. Returns `false` when the dialog should close.
    pub fn cancel(&mut self) -> bool {
        match self.step {
            FormStep::Confirm => {
                self.step = FormStep::Enter;
                true
            }
            FormStep::Enter => false,
        }
    }
}

/// Accepts `150`, `150.5` and `150,5`.
fn parse_amount(input: &str) -> Option<f64> {
    let normalized = input.trim().replace(',', ".");
    normalized
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite())
}

// ---------------------------------------------------------------------------
// Auction dialog
// ---------------------------------------------------------------------------

/// Raw fields of the create-auction dialog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuctionForm {
    pub name: String,
    pub description: String,
    pub images: Vec<String>,
    pub documents: String,
    pub start_date: String,
    pub end_date: String,
    pub starting_price: String,
}

impl AuctionForm {
    /// Builds the auction request.
    ///
    /// Without images the auction gets `default_image`. The creator is the
    /// signed-in user id, or `anonymous`.
    ///
    /// # Errors
    /// Returns a message naming the first field that does not parse.
    pub fn to_new_auction(
        &self,
        created_by: Option<&str>,
        default_image: &str,
    ) -> Result<NewAuction, FormError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(FormError::new("Product name is required"));
        }
        let starting_price = parse_amount(&self.starting_price)
            .filter(|price| *price >= 0.0)
            .ok_or_else(|| FormError::new("Enter a valid starting price"))?;
        let start_date = parse_form_date(&self.start_date)
            .ok_or_else(|| FormError::new("Enter a valid start date"))?;
        let end_date = parse_form_date(&self.end_date)
            .ok_or_else(|| FormError::new("Enter a valid end date"))?;

        let images = if self.images.is_empty() {
            vec![default_image.to_string()]
        } else {
            self.images.clone()
        };
        let documents = Some(self.documents.trim())
            .filter(|d| !d.is_empty())
            .map(ToString::to_string);

        Ok(NewAuction {
            name: name.to_string(),
            description: self.description.trim().to_string(),
            images,
            documents,
            starting_price,
            start_date,
            end_date,
            created_by: created_by.unwrap_or("anonymous").to_string(),
        })
    }
}

/// RFC 3339, `YYYY-MM-DDTHH:MM`, `YYYY-MM-DD HH:MM` or a bare date (UTC).
fn parse_form_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    parse_timestamp(raw).or_else(|| {
        ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|dt| dt.and_utc())
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;
    use tempfile::tempdir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::ApiClient;
    use crate::session::SessionStore;

    fn auction(current_bid: f64) -> Auction {
        Auction::from_api(&json!({
            "id": 1,
            "productName": "Lot",
            "startingPrice": 100,
            "currentBid": current_bid,
            "startDate": "2026-01-01",
            "endDate": "2026-12-31"
        }))
        .unwrap()
    }

    #[test]
    fn bid_form_walks_enter_confirm_place() {
        let mut form = BidForm::new(&auction(150.0));
        assert_eq!(form.minimum_bid(), 151.0);

        assert_eq!(form.submit("160").unwrap(), BidAction::Confirm(160.0));
        assert_eq!(form.step(), FormStep::Confirm);
        assert_eq!(form.submit("160,5").unwrap(), BidAction::Place(160.5));
    }

    #[test]
    fn bid_form_rejects_amount_not_above_current() {
        let mut form = BidForm::new(&auction(150.0));
        let err = form.submit("150").unwrap_err();
        assert_eq!(err.to_string(), "Bid must be higher than the current bid");
        assert_eq!(form.step(), FormStep::Enter);
        assert!(form.submit("abc").is_err());
    }

    #[test]
    fn bid_form_cancel_backs_out_of_confirm() {
        let mut form = BidForm::new(&auction(10.0));
        form.submit("20").unwrap();
        assert!(form.cancel());
        assert_eq!(form.step(), FormStep::Enter);
        assert!(!form.cancel());
    }

    #[test]
    fn auction_form_fills_defaults() {
        let form = AuctionForm {
            name: " Clock ".to_string(),
            description: "Old clock".to_string(),
            starting_price: "250".to_string(),
            start_date: "2026-10-20T10:00".to_string(),
            end_date: "2026-10-27".to_string(),
            ..AuctionForm::default()
        };
        let auction = form.to_new_auction(None, "https://img/default.jpg").unwrap();
        assert_eq!(auction.name, "Clock");
        assert_eq!(auction.images, ["https://img/default.jpg"]);
        assert_eq!(auction.documents, None);
        assert_eq!(auction.created_by, "anonymous");
        assert_eq!(
            auction.start_date,
            Utc.with_ymd_and_hms(2026, 10, 20, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn auction_form_keeps_given_images_and_creator() {
        let form = AuctionForm {
            name: "Vase".to_string(),
            images: vec!["https://img/vase.jpg".to_string()],
            documents: "https://docs/vase.pdf".to_string(),
            starting_price: "99.5".to_string(),
            start_date: "2026-10-20T10:00:00Z".to_string(),
            end_date: "2026-10-21T10:00:00Z".to_string(),
            ..AuctionForm::default()
        };
        let auction = form.to_new_auction(Some("5"), "unused").unwrap();
        assert_eq!(auction.images, ["https://img/vase.jpg"]);
        assert_eq!(auction.documents.as_deref(), Some("https://docs/vase.pdf"));
        assert_eq!(auction.created_by, "5");
        assert_eq!(auction.starting_price, 99.5);
    }

    #[test]
    fn auction_form_reports_bad_fields() {
        let form = AuctionForm {
            name: "Vase".to_string(),
            starting_price: "cheap".to_string(),
            ..AuctionForm::default()
        };
        assert_eq!(
            form.to_new_auction(None, "x").unwrap_err().to_string(),
            "Enter a valid starting price"
        );
        let form = AuctionForm {
            starting_price: "10".to_string(),
            ..form
        };
        assert_eq!(
            form.to_new_auction(None, "x").unwrap_err().to_string(),
            "Enter a valid start date"
        );
    }

    #[tokio::test]
    async fn login_failures_map_to_form_messages() {
        let server = MockServer::start().await;
        let dir = tempdir().unwrap();
        Mock::given(method("POST"))
            .and(path("/auth/local"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/auth/forgot-password"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let session = SessionStore::open(dir.path().join("session.json")).unwrap();
        let mut auth = AuthService::new(ApiClient::new(server.uri(), None).unwrap(), session);

        let err = submit_login(LoginMode::Login, &mut auth, LoginFields::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Incorrect email or password");

        let err = submit_login(LoginMode::Forgot, &mut auth, LoginFields::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Could not send the recovery email");
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_server_error() {
        let dir = tempdir().unwrap();
        let session = SessionStore::open(dir.path().join("session.json")).unwrap();
        let api = ApiClient::new("http://127.0.0.1:9", None).unwrap();
        let mut auth = AuthService::new(api, session);

        let err = submit_login(LoginMode::Login, &mut auth, LoginFields::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Server error");
    }
}
