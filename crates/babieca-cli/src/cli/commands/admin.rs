//! Admin panel: auction moderation and user management.

use anyhow::{Result, bail};
use babieca_core::admin::{NewUser, UserStats};
use babieca_core::format;
use babieca_core::forms::AuctionForm;
use babieca_types::{AuctionUpdate, Role, UserType, UserUpdate};
use chrono::Utc;
use comfy_table::{ContentArrangement, Table};

use super::auctions::{auction_table, report_fetch_error};
use super::{ClientContext, confirm, value_or_prompt};

pub struct CreateUserOptions {
    pub username: String,
    pub email: String,
    pub password: Option<String>,
    pub role: Role,
    pub user_type: UserType,
    pub phone: String,
}

pub async fn list_auctions(finished: bool) -> Result<()> {
    let ctx = ClientContext::restore().await?;
    ctx.require_admin()?;
    let mut store = ctx.auction_store();
    store.refresh_data().await;
    report_fetch_error(&store);

    let now = Utc::now();
    if !finished {
        let active = store.active_auctions(now);
        if active.is_empty() {
            println!("No active auctions.");
        } else {
            println!("{}", auction_table(&active));
        }
        return Ok(());
    }

    let ended = store.finished_auctions(now);
    if ended.is_empty() {
        println!("No finished auctions.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(["ID", "Product", "Ended", "Winner", "Winning bid", "Paid", "Collected"]);
    for auction in ended {
        let (winner, amount) = match store.winner_info(&auction.id) {
            Some(info) => (info.username, format::currency(info.amount)),
            None => ("-".to_string(), "-".to_string()),
        };
        table.add_row([
            auction.id.clone(),
            auction.product.name.clone(),
            format::date(&auction.end_date),
            winner,
            amount,
            yes_no(auction.is_paid).to_string(),
            yes_no(auction.is_collected).to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub async fn create_auction(form: AuctionForm, yes: bool) -> Result<()> {
    let ctx = ClientContext::restore().await?;
    let user = ctx.require_admin()?;
    let auction = form.to_new_auction(Some(&user.id), &ctx.config.default_image_url)?;

    println!("Product:        {}", auction.name);
    println!("Starting price: {}", format::currency(auction.starting_price));
    println!("Starts:         {}", format::date(&auction.start_date));
    println!("Ends:           {}", format::date(&auction.end_date));
    if !yes && !confirm("Create this auction?")? {
        println!("Auction not created.");
        return Ok(());
    }

    let mut store = ctx.auction_store();
    store.create_auction(&auction).await?;
    println!("Auction '{}' created.", auction.name);
    Ok(())
}

pub async fn cancel_auction(id: &str, yes: bool) -> Result<()> {
    let ctx = ClientContext::restore().await?;
    ctx.require_admin()?;
    if !yes && !confirm(&format!("Cancel auction {id}?"))? {
        println!("Auction kept.");
        return Ok(());
    }

    let mut store = ctx.auction_store();
    store.refresh_data().await;
    store.cancel_auction(id).await?;
    println!("Auction {id} cancelled.");
    Ok(())
}

pub async fn update_auction(id: &str, updates: &AuctionUpdate) -> Result<()> {
    if updates.is_empty() {
        bail!("Nothing to update: pass --paid, --collected or --winner");
    }
    let ctx = ClientContext::restore().await?;
    ctx.require_admin()?;

    let mut store = ctx.auction_store();
    store.refresh_data().await;
    store.update_auction_status(id, updates).await?;
    println!("Auction {id} updated.");
    Ok(())
}

pub async fn list_users() -> Result<()> {
    let ctx = ClientContext::restore().await?;
    ctx.require_admin()?;
    let users = ctx.admin().list_users().await?;

    let stats = UserStats::from_users(&users);
    println!(
        "{} users: {} active, {} blocked",
        stats.total, stats.active, stats.blocked
    );
    if users.is_empty() {
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(["ID", "Username", "Email", "Type", "Role", "Status", "Registered"]);
    for user in &users {
        table.add_row([
            user.id.clone(),
            user.username.clone(),
            user.email.clone(),
            user.user_type.to_string(),
            user.role.to_string(),
            if user.is_blocked { "blocked" } else { "active" }.to_string(),
            format::date(&user.created_at),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub async fn create_user(options: CreateUserOptions) -> Result<()> {
    let ctx = ClientContext::restore().await?;
    ctx.require_admin()?;
    let password = value_or_prompt(options.password, "Password")?;

    ctx.admin()
        .create_user(NewUser {
            username: options.username.clone(),
            email: options.email,
            password,
            user_type: options.user_type,
            phone: options.phone,
            role: options.role,
        })
        .await?;
    println!("User {} created ({}).", options.username, options.role);
    Ok(())
}

pub async fn set_blocked(id: &str, blocked: bool) -> Result<()> {
    let ctx = ClientContext::restore().await?;
    ctx.require_admin()?;
    ctx.admin()
        .update_user_status(id, &UserUpdate::blocked(blocked))
        .await?;
    if blocked {
        println!("User {id} blocked.");
    } else {
        println!("User {id} unblocked.");
    }
    Ok(())
}

pub async fn set_role(id: &str, role: Role) -> Result<()> {
    let ctx = ClientContext::restore().await?;
    ctx.require_admin()?;
    ctx.admin()
        .update_user_status(id, &UserUpdate::role(role))
        .await?;
    println!("User {id} is now {role}.");
    Ok(())
}

pub async fn delete_user(id: &str, yes: bool) -> Result<()> {
    let ctx = ClientContext::restore().await?;
    ctx.require_admin()?;
    if !yes && !confirm(&format!("Delete user {id}? This cannot be undone."))? {
        println!("User kept.");
        return Ok(());
    }
    ctx.admin().delete_user(id).await?;
    println!("User {id} deleted.");
    Ok(())
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}
