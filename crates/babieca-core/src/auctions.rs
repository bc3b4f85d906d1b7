//! Auction state: listings, the bidder's auctions and all bids.
//!
//! The store holds the last fetched snapshot. Every mutation clears the
//! previous error, talks to the backend and, on success, refreshes the whole
//! snapshot so the local view matches the server.

use std::cmp::Ordering;
use std::fmt;

use anyhow::{Context, Result};
use babieca_types::{Auction, AuctionUpdate, Bid, NewAuction, NewBid};
use chrono::{DateTime, Utc};

use crate::api::{ApiClient, ApiError, ApiResult, bidder_id_of};

/// Bids refused before anything is sent.
#[derive(Debug, Clone, PartialEq)]
pub enum BidError {
    /// The amount does not exceed the auction's current bid.
    TooLow { amount: f64, current_bid: f64 },
    /// No auction with this identifier in the last snapshot.
    UnknownAuction(String),
    /// The auction was cancelled or has passed its end date.
    Closed(String),
}

impl fmt::Display for BidError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BidError::TooLow { .. } => write!(f, "Bid must be higher than the current bid"),
            BidError::UnknownAuction(id) => write!(f, "Auction {id} not found"),
            BidError::Closed(id) => write!(f, "Auction {id} is closed for bidding"),
        }
    }
}

impl std::error::Error for BidError {}

/// Who a bid wins an auction for.
#[derive(Debug, Clone, PartialEq)]
pub struct WinnerInfo {
    pub username: String,
    pub amount: f64,
    pub user_id: String,
}

#[derive(Debug)]
pub struct AuctionStore {
    api: ApiClient,
    bidder_id: Option<String>,
    auctions: Vec<Auction>,
    my_auctions: Vec<Auction>,
    bids: Vec<Bid>,
    loading: bool,
    error: Option<String>,
}

impl AuctionStore {
    /// `bidder_id` selects the "my auctions" listing; without one it stays empty.
    pub fn new(api: ApiClient, bidder_id: Option<String>) -> Self {
        Self {
            api,
            bidder_id,
            auctions: Vec::new(),
            my_auctions: Vec::new(),
            bids: Vec::new(),
            loading: false,
            error: None,
        }
    }

    pub fn auctions(&self) -> &[Auction] {
        &self.auctions
    }

    pub fn my_auctions(&self) -> &[Auction] {
        &self.my_auctions
    }

    pub fn bids(&self) -> &[Bid] {
        &self.bids
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Message of the last failed fetch or mutation.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn auction(&self, key: &str) -> Option<&Auction> {
        self.auctions.iter().find(|a| a.matches_key(key))
    }

    /// Fetches auctions, the bidder's auctions and bids concurrently.
    ///
    /// A failed fetch leaves its collection empty and records the message in
    /// [`AuctionStore::error`]; the others still apply.
    pub async fn refresh_data(&mut self) {
        self.loading = true;
        self.error = None;

        let api = &self.api;
        let bidder_id = self.bidder_id.as_deref();
        let (auctions, mine, bids) = tokio::join!(
            api.list_auctions(),
            async {
                match bidder_id {
                    Some(id) => api.list_bidder_auctions(id).await,
                    None => Ok(Vec::new()),
                }
            },
            api.list_bids(),
        );

        let mut failures = Vec::new();
        self.auctions = collect("auctions", auctions, &mut failures);
        self.my_auctions = collect("my auctions", mine, &mut failures);
        self.bids = collect("bids", bids, &mut failures);
        if !failures.is_empty() {
            self.error = Some(failures.join("; "));
        }

        self.loading = false;
    }

    /// Creates an auction, then refreshes.
    ///
    /// # Errors
    /// Returns an error if the backend refuses the auction.
    pub async fn create_auction(&mut self, auction: &NewAuction) -> Result<()> {
        self.begin();
        let result = self.api.create_auction(auction, Utc::now()).await;
        self.finish(result, "Error creating auction").await
    }

    /// Places a bid for `user_id`, then refreshes.
    ///
    /// The auction must be open and the amount must exceed its current bid;
    /// otherwise nothing is sent. The bid is recorded against the user's
    /// bidder record.
    ///
    /// # Errors
    /// [`BidError`] for closed or unknown auctions and refused amounts, or the backend
    /// error when the bidder lookup or the bid itself fails.
    pub async fn place_bid(
        &mut self,
        auction_id: &str,
        amount: f64,
        user_id: &str,
        username: &str,
    ) -> Result<()> {
        let auction = self
            .auction(auction_id)
            .ok_or_else(|| BidError::UnknownAuction(auction_id.to_string()))?;
        if !auction.is_open_at(Utc::now()) {
            return Err(BidError::Closed(auction.id.clone()).into());
        }
        if amount <= auction.current_bid {
            return Err(BidError::TooLow {
                amount,
                current_bid: auction.current_bid,
            }
            .into());
        }
        let auction_key = auction.api_key().to_string();

        self.begin();
        let bidder = match self.api.get_user(user_id).await {
            Ok(record) => bidder_id_of(&record).unwrap_or_else(|| user_id.to_string()),
            Err(e) => return self.finish(Err(e), "Error placing bid").await,
        };

        tracing::info!(auction = %auction_key, %username, amount, "placing bid");
        let bid = NewBid {
            auction: auction_key,
            bidder,
            amount,
            placed_at: Utc::now(),
        };
        let result = self.api.create_bid(&bid).await;
        self.finish(result, "Error placing bid").await
    }

    /// Deactivates an auction, then refreshes.
    ///
    /// # Errors
    /// Returns an error if the backend refuses the update.
    pub async fn cancel_auction(&mut self, auction_id: &str) -> Result<()> {
        self.update_auction_status(auction_id, &AuctionUpdate::cancel())
            .await
    }

    /// Applies a partial status update, then refreshes.
    ///
    /// # Errors
    /// Returns an error if the backend refuses the update.
    pub async fn update_auction_status(
        &mut self,
        auction_id: &str,
        updates: &AuctionUpdate,
    ) -> Result<()> {
        let key = self
            .auction(auction_id)
            .map_or_else(|| auction_id.to_string(), |a| a.api_key().to_string());

        self.begin();
        let result = self.api.update_auction(&key, updates).await;
        self.finish(result, "Error updating auction status").await
    }

    /// Bids placed by a bidder, newest first.
    pub fn user_bids(&self, user_id: &str) -> Vec<&Bid> {
        let mut bids: Vec<&Bid> = self.bids.iter().filter(|b| b.user_id == user_id).collect();
        bids.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        bids
    }

    /// Bids on an auction, newest first.
    pub fn auction_bids(&self, auction_id: &str) -> Vec<&Bid> {
        let mut bids: Vec<&Bid> = self
            .bids
            .iter()
            .filter(|b| b.auction_id == auction_id)
            .collect();
        bids.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        bids
    }

    /// Active auctions that have not reached their end date.
    pub fn active_auctions(&self, now: DateTime<Utc>) -> Vec<&Auction> {
        self.auctions.iter().filter(|a| a.is_open_at(now)).collect()
    }

    /// Inactive auctions and auctions past their end date.
    pub fn finished_auctions(&self, now: DateTime<Utc>) -> Vec<&Auction> {
        self.auctions.iter().filter(|a| !a.is_open_at(now)).collect()
    }

    /// The user's most recent bid on an auction.
    pub fn user_last_bid(&self, user_id: &str, auction_id: &str) -> Option<&Bid> {
        self.bids
            .iter()
            .filter(|b| b.user_id == user_id && b.auction_id == auction_id)
            .max_by_key(|b| b.timestamp)
    }

    /// Highest bid on an auction.
    pub fn winner_info(&self, auction_id: &str) -> Option<WinnerInfo> {
        self.bids
            .iter()
            .filter(|b| b.auction_id == auction_id)
            .max_by(|a, b| a.amount.partial_cmp(&b.amount).unwrap_or(Ordering::Equal))
            .map(|bid| WinnerInfo {
                username: bid.username.clone(),
                amount: bid.amount,
                user_id: bid.user_id.clone(),
            })
    }

    fn begin(&mut self) {
        self.loading = true;
        self.error = None;
    }

    async fn finish(&mut self, result: ApiResult<()>, action: &'static str) -> Result<()> {
        match result {
            Ok(()) => {
                self.refresh_data().await;
                self.loading = false;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "{action}");
                self.error = Some(format!("{action}: {e}"));
                self.loading = false;
                Err(e).context(action)
            }
        }
    }
}

fn collect<T>(what: &str, result: ApiResult<Vec<T>>, failures: &mut Vec<String>) -> Vec<T> {
    result.unwrap_or_else(|e: ApiError| {
        tracing::warn!(error = %e, "failed to fetch {what}");
        failures.push(format!("Error fetching {what}: {e}"));
        Vec::new()
    })
}
