//! Records mirrored from the auction backend.

pub mod auction;
pub mod bid;
pub mod envelope;
pub mod user;

pub use auction::{Auction, AuctionUpdate, NewAuction, Product};
pub use bid::{Bid, NewBid};
pub use user::{AuthState, Role, User, UserType, UserUpdate};
