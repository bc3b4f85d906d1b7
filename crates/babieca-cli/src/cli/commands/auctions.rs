//! Auction browsing: the home page tabs and the auction detail view.

use anyhow::{Result, bail};
use babieca_core::auctions::AuctionStore;
use babieca_core::format;
use babieca_types::Auction;
use chrono::Utc;
use comfy_table::{ContentArrangement, Table};

use super::ClientContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    All,
    Active,
    Finished,
}

pub async fn list(filter: Filter) -> Result<()> {
    let ctx = ClientContext::restore().await?;
    let mut store = ctx.auction_store();
    store.refresh_data().await;
    report_fetch_error(&store);

    let now = Utc::now();
    let auctions: Vec<&Auction> = match filter {
        Filter::All => store.auctions().iter().collect(),
        Filter::Active => store.active_auctions(now),
        Filter::Finished => store.finished_auctions(now),
    };

    if auctions.is_empty() {
        println!("No auctions found.");
        return Ok(());
    }
    println!("{}", auction_table(&auctions));
    Ok(())
}

pub async fn mine() -> Result<()> {
    let ctx = ClientContext::restore().await?;
    ctx.require_user()?;
    let mut store = ctx.auction_store();
    store.refresh_data().await;
    report_fetch_error(&store);

    if store.my_auctions().is_empty() {
        println!("You have not bid on any auction yet.");
        return Ok(());
    }

    let bidder = ctx.bidder_id().unwrap_or_default();
    let now = Utc::now();
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(["ID", "Product", "Current bid", "Your last bid", "Time left"]);
    for auction in store.my_auctions() {
        let last_bid = store
            .user_last_bid(&bidder, &auction.id)
            .map_or_else(|| "-".to_string(), |b| format::currency(b.amount));
        table.add_row([
            auction.id.clone(),
            auction.product.name.clone(),
            format::currency(auction.current_bid),
            last_bid,
            format::time_remaining(auction.end_date, now),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub async fn show(id: &str) -> Result<()> {
    let ctx = ClientContext::restore().await?;
    let mut store = ctx.auction_store();
    store.refresh_data().await;
    report_fetch_error(&store);

    let Some(auction) = store.auction(id) else {
        bail!("Auction {id} not found");
    };

    let now = Utc::now();
    println!("{}", auction.product.name);
    if !auction.product.description.is_empty() {
        println!("{}", auction.product.description);
    }
    println!();
    println!("Starting price: {}", format::currency(auction.product.starting_price));
    println!("Current bid:    {}", format::currency(auction.current_bid));
    println!("Minimum bid:    {}", format::currency(auction.current_bid + 1.0));
    println!("Bids:           {}", auction.bid_count);
    println!("Starts:         {}", format::date(&auction.start_date));
    println!("Ends:           {}", format::date(&auction.end_date));
    println!("Time left:      {}", format::time_remaining(auction.end_date, now));
    println!("Status:         {}", status(auction, now));
    for image in &auction.product.images {
        println!("Image:          {image}");
    }
    if let Some(documents) = &auction.product.documents {
        println!("Documents:      {documents}");
    }

    let history = store.auction_bids(&auction.id);
    if history.is_empty() {
        println!();
        println!("No bids yet.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(["Bidder", "Amount", "Date"]);
    for bid in history {
        table.add_row([
            bid.username.clone(),
            format::currency(bid.amount),
            format::date(&bid.timestamp),
        ]);
    }
    println!();
    println!("{table}");
    Ok(())
}

pub(crate) fn auction_table(auctions: &[&Auction]) -> Table {
    let now = Utc::now();
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(["ID", "Product", "Current bid", "Bids", "Time left", "Status"]);
    for auction in auctions {
        table.add_row([
            auction.id.clone(),
            auction.product.name.clone(),
            format::currency(auction.current_bid),
            auction.bid_count.to_string(),
            format::time_remaining(auction.end_date, now),
            status(auction, now).to_string(),
        ]);
    }
    table
}

pub(crate) fn status(auction: &Auction, now: chrono::DateTime<Utc>) -> &'static str {
    if auction.is_open_at(now) {
        "active"
    } else if auction.is_active {
        "ended"
    } else {
        "cancelled"
    }
}

/// Fetch failures do not abort listing; they are reported on stderr.
pub(crate) fn report_fetch_error(store: &AuctionStore) {
    if let Some(error) = store.error() {
        eprintln!("warning: {error}");
    }
}
