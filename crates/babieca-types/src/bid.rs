use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::envelope::{attributes, first_id, first_number, first_str, first_timestamp, unwrap_data};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
    pub id: String,
    pub auction_id: String,
    pub user_id: String,
    pub amount: f64,
    pub timestamp: DateTime<Utc>,
    pub username: String,
}

impl Bid {
    /// Builds a bid from a backend record. Returns `None` without an id.
    pub fn from_api(record: &Value) -> Option<Self> {
        let attrs = attributes(record);
        let id = first_id(record, &["id"]).or_else(|| first_id(attrs, &["id"]))?;
        let bidder = attrs
            .get("bidder")
            .map(|b| attributes(unwrap_data(b)))
            .filter(|b| b.is_object());

        Some(Self {
            id,
            auction_id: first_id(attrs, &["auctionId", "auction"]).unwrap_or_default(),
            user_id: first_id(attrs, &["userId", "user", "bidder"]).unwrap_or_default(),
            amount: first_number(attrs, &["amount", "bidPrice"]).unwrap_or(0.0),
            timestamp: first_timestamp(attrs, &["timestamp", "bidDate", "createdAt"])
                .unwrap_or_default(),
            username: first_str(attrs, &["username"])
                .or_else(|| bidder.and_then(|b| first_str(b, &["username"])))
                .unwrap_or("Unknown")
                .to_string(),
        })
    }
}

/// A bid about to be submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBid {
    /// Auction identifier as used in URLs.
    pub auction: String,
    /// Bidder record id.
    pub bidder: String,
    pub amount: f64,
    pub placed_at: DateTime<Utc>,
}

impl NewBid {
    /// Request body for `POST /bids`.
    pub fn to_payload(&self) -> Value {
        serde_json::json!({
            "data": {
                "auction": self.auction,
                "isWinner": true,
                "bidder": self.bidder,
                "bidPrice": self.amount,
                "bidDate": self.placed_at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    #[test]
    fn from_api_reads_populated_bidder() {
        let record = json!({
            "id": 44,
            "attributes": {
                "auction": { "data": { "id": 3 } },
                "bidder": { "data": { "id": 15, "attributes": { "username": "ana" } } },
                "bidPrice": 130.5,
                "bidDate": "2026-02-02T12:00:00.000Z"
            }
        });

        let bid = Bid::from_api(&record).unwrap();
        assert_eq!(bid.id, "44");
        assert_eq!(bid.auction_id, "3");
        assert_eq!(bid.user_id, "15");
        assert_eq!(bid.username, "ana");
        assert!((bid.amount - 130.5).abs() < f64::EPSILON);
    }

    #[test]
    fn from_api_reads_flat_bid() {
        let record = json!({
            "id": 1,
            "auctionId": 9,
            "userId": "u1",
            "amount": 20,
            "createdAt": "2026-01-01T00:00:00Z"
        });

        let bid = Bid::from_api(&record).unwrap();
        assert_eq!(bid.auction_id, "9");
        assert_eq!(bid.user_id, "u1");
        assert_eq!(bid.username, "Unknown");
        assert_eq!(bid.timestamp.to_rfc3339(), "2026-01-01T00:00:00+00:00");
    }

    #[test]
    fn payload_carries_bid_fields() {
        let bid = NewBid {
            auction: "doc8".to_string(),
            bidder: "15".to_string(),
            amount: 99.0,
            placed_at: Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap(),
        };
        let payload = bid.to_payload();
        assert_eq!(payload["data"]["auction"], "doc8");
        assert_eq!(payload["data"]["bidder"], "15");
        assert_eq!(payload["data"]["isWinner"], true);
        assert_eq!(payload["data"]["bidDate"], "2026-03-01T08:00:00.000Z");
    }
}
