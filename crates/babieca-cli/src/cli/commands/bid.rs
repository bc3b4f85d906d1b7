//! Bid command: the two-step bid dialog on the terminal.

use anyhow::{Result, bail};
use babieca_core::auctions::BidError;
use babieca_core::format;
use babieca_core::forms::{BidAction, BidForm};
use chrono::Utc;

use super::{ClientContext, confirm};

pub async fn place(auction_id: &str, amount: &str, yes: bool) -> Result<()> {
    let ctx = ClientContext::restore().await?;
    let user = ctx.require_user()?.clone();
    let mut store = ctx.auction_store();
    store.refresh_data().await;

    let Some(auction) = store.auction(auction_id) else {
        bail!("Auction {auction_id} not found");
    };
    if !auction.is_open_at(Utc::now()) {
        return Err(BidError::Closed(auction.id.clone()).into());
    }
    let name = auction.product.name.clone();
    let mut form = BidForm::new(auction);

    let BidAction::Confirm(amount_value) = form.submit(amount)? else {
        bail!("Bid dialog out of sync");
    };
    println!(
        "{name}: current bid {}, minimum {}",
        format::currency(form.current_bid()),
        format::currency(form.minimum_bid())
    );
    if !yes && !confirm(&format!("Place a bid of {}?", format::currency(amount_value)))? {
        form.cancel();
        println!("Bid cancelled.");
        return Ok(());
    }

    let BidAction::Place(amount_value) = form.submit(amount)? else {
        bail!("Bid dialog out of sync");
    };
    store
        .place_bid(auction_id, amount_value, &user.id, &user.username)
        .await?;
    println!("Bid of {} placed on {name}.", format::currency(amount_value));
    Ok(())
}
