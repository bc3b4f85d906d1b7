//! Profile command handlers.

use anyhow::{Result, bail};
use babieca_core::format;
use babieca_types::UserUpdate;
use comfy_table::{ContentArrangement, Table};

use super::ClientContext;
use super::auctions::report_fetch_error;

/// Bids listed under the profile.
const RECENT_BIDS: usize = 5;

pub async fn show() -> Result<()> {
    let ctx = ClientContext::restore().await?;
    let user = ctx.require_user()?;

    println!("Username:  {}", user.username);
    println!("Email:     {}", user.email);
    println!("Phone:     {}", if user.phone.is_empty() { "-" } else { user.phone.as_str() });
    println!("Type:      {}", user.user_type);
    println!("Role:      {}", user.role);
    println!("Member since {}", format::date(&user.created_at));

    let Some(bidder) = ctx.bidder_id() else {
        return Ok(());
    };
    let mut store = ctx.auction_store();
    store.refresh_data().await;
    report_fetch_error(&store);

    println!();
    let bids = store.user_bids(&bidder);
    if bids.is_empty() {
        println!("You have not placed any bids yet.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(["Auction", "Amount", "Date", "Status"]);
    for bid in bids.into_iter().take(RECENT_BIDS) {
        let auction = store.auction(&bid.auction_id);
        let name = auction.map_or("Unknown auction", |a| a.product.name.as_str());
        let winning = auction.is_some_and(|a| bid.amount >= a.current_bid);
        table.add_row([
            name.to_string(),
            format::currency(bid.amount),
            format::date(&bid.timestamp),
            if winning { "winning" } else { "outbid" }.to_string(),
        ]);
    }
    println!("My bids");
    println!("{table}");
    Ok(())
}

pub async fn update(
    username: Option<String>,
    email: Option<String>,
    phone: Option<String>,
) -> Result<()> {
    let changes = UserUpdate {
        username,
        email,
        phone,
        ..UserUpdate::default()
    };
    if changes.is_empty() {
        bail!("Nothing to update: pass --username, --email or --phone");
    }

    let mut ctx = ClientContext::restore().await?;
    ctx.require_user()?;
    ctx.auth.update_user(&changes).await?;
    println!("Profile updated.");
    Ok(())
}
