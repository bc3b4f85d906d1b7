//! Auth command handlers.

use anyhow::Result;
use babieca_core::forms::{LoginFields, LoginMode, LoginOutcome, submit_login};
use babieca_types::UserType;

use super::{ClientContext, value_or_prompt};

pub struct RegisterOptions {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub user_type: UserType,
    pub phone: String,
}

pub async fn login(email: Option<String>, password: Option<String>) -> Result<()> {
    let mut ctx = ClientContext::load()?;
    let fields = LoginFields {
        email: value_or_prompt(email, "Email")?,
        password: value_or_prompt(password, "Password")?,
        ..LoginFields::default()
    };

    if let LoginOutcome::SignedIn(user) =
        submit_login(LoginMode::Login, &mut ctx.auth, fields).await?
    {
        println!("Logged in as {} ({})", user.username, user.role);
    }
    Ok(())
}

pub async fn register(options: RegisterOptions) -> Result<()> {
    let mut ctx = ClientContext::load()?;
    let fields = LoginFields {
        email: value_or_prompt(options.email, "Email")?,
        username: value_or_prompt(options.username, "Username")?,
        password: value_or_prompt(options.password, "Password")?,
        user_type: options.user_type,
        phone: options.phone,
    };

    if let LoginOutcome::Registered(user) =
        submit_login(LoginMode::Register, &mut ctx.auth, fields).await?
    {
        println!("Welcome, {}! Your account is ready.", user.username);
    }
    Ok(())
}

pub async fn forgot_password(email: Option<String>) -> Result<()> {
    let mut ctx = ClientContext::load()?;
    let fields = LoginFields {
        email: value_or_prompt(email, "Email")?,
        ..LoginFields::default()
    };

    submit_login(LoginMode::Forgot, &mut ctx.auth, fields).await?;
    println!("A recovery email has been sent.");
    Ok(())
}

pub fn logout() -> Result<()> {
    let mut ctx = ClientContext::load()?;
    ctx.auth.logout()?;
    println!("Logged out.");
    Ok(())
}

pub async fn whoami() -> Result<()> {
    let ctx = ClientContext::restore().await?;
    match ctx.auth.user() {
        Some(user) => println!("{} <{}> ({})", user.username, user.email, user.role),
        None => println!("Not logged in."),
    }
    Ok(())
}
