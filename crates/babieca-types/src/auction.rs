//! Auctions and the products they sell.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::envelope::{
    attributes, first_bool, first_id, first_number, first_str, first_timestamp, unwrap_data,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents: Option<String>,
    pub starting_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Auction {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    pub product: Product,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub current_bid: f64,
    pub bid_count: u64,
    pub participant_count: u64,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
    pub is_paid: bool,
    pub is_collected: bool,
    pub created_by: String,
}

impl Auction {
    /// Builds an auction from a backend record. Returns `None` without an id.
    pub fn from_api(record: &Value) -> Option<Self> {
        let attrs = attributes(record);
        let id = first_id(record, &["id"]).or_else(|| first_id(attrs, &["id"]))?;
        let document_id = first_str(record, &["documentId"])
            .or_else(|| first_str(attrs, &["documentId"]))
            .map(ToString::to_string);

        let product = attrs
            .get("product")
            .map(|p| attributes(unwrap_data(p)))
            .filter(|p| p.is_object());
        let product_str = |product_keys: &[&str], flat_keys: &[&str]| {
            product
                .and_then(|p| first_str(p, product_keys))
                .or_else(|| first_str(attrs, flat_keys))
                .map(ToString::to_string)
        };

        let starting_price = product
            .and_then(|p| first_number(p, &["startingPrice"]))
            .or_else(|| first_number(attrs, &["startingPrice", "initBid"]))
            .unwrap_or(0.0);

        let images = product
            .and_then(|p| string_list(p.get("images")))
            .or_else(|| string_list(attrs.get("productImages")))
            .unwrap_or_default();

        let description = product_str(&["description"], &["productDescription"])
            .or_else(|| rich_text_first(attrs.get("auctionDescription")))
            .unwrap_or_default();

        let bid_count = first_number(attrs, &["bidCount"])
            .map(|n| n as u64)
            .or_else(|| {
                attrs
                    .get("bids")
                    .map(unwrap_data)
                    .and_then(Value::as_array)
                    .map(|bids| bids.len() as u64)
            })
            .unwrap_or(0);

        Some(Self {
            id,
            document_id,
            product: Product {
                id: product
                    .and_then(|p| first_id(p, &["documentId", "id"]))
                    .or_else(|| first_id(attrs, &["productId"]))
                    .unwrap_or_else(|| "1".to_string()),
                name: product_str(&["name"], &["productName", "name"]).unwrap_or_default(),
                description,
                images,
                documents: product_str(&["documents"], &["productDocuments"]),
                starting_price,
            },
            start_date: first_timestamp(attrs, &["startDate", "auctionStartDate"])
                .unwrap_or_default(),
            end_date: first_timestamp(attrs, &["endDate", "auctionEndDate"]).unwrap_or_default(),
            current_bid: first_number(attrs, &["currentBid"]).unwrap_or(starting_price),
            bid_count,
            participant_count: first_number(attrs, &["participantCount"])
                .map_or(0, |n| n as u64),
            is_active: first_bool(attrs, &["isActive"]).unwrap_or(true),
            winner: first_id(attrs, &["winner"]),
            is_paid: first_bool(attrs, &["isPaid"]).unwrap_or(false),
            is_collected: first_bool(attrs, &["isCollected"]).unwrap_or(false),
            created_by: first_id(attrs, &["createdBy"]).unwrap_or_else(|| "unknown".to_string()),
        })
    }

    /// Identifier used in item URLs: the document id when the backend has
    /// one, else the numeric id.
    pub fn api_key(&self) -> &str {
        self.document_id.as_deref().unwrap_or(&self.id)
    }

    /// Whether `key` names this auction by either identifier.
    pub fn matches_key(&self, key: &str) -> bool {
        self.id == key || self.document_id.as_deref() == Some(key)
    }

    /// Open for bids: flagged active and not past its end date.
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && now <= self.end_date
    }
}

/// Input for creating an auction.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuction {
    pub name: String,
    pub description: String,
    pub images: Vec<String>,
    pub documents: Option<String>,
    pub starting_price: f64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_by: String,
}

impl NewAuction {
    /// Request body for `POST /auctions`.
    ///
    /// Counters start at zero, the current bid at the starting price, and the
    /// auction is active when `now` falls inside its window.
    pub fn to_payload(&self, now: DateTime<Utc>) -> Value {
        serde_json::json!({
            "data": {
                "productName": self.name,
                "productDescription": self.description,
                "productImages": self.images,
                "productDocuments": self.documents,
                "startingPrice": self.starting_price,
                "startDate": self.start_date.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
                "endDate": self.end_date.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
                "currentBid": self.starting_price,
                "bidCount": 0,
                "participantCount": 0,
                "isActive": now >= self.start_date && now <= self.end_date,
                "isPaid": false,
                "isCollected": false,
                "createdBy": self.created_by,
            }
        })
    }
}

/// Partial auction update sent as `{ "data": .. }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_paid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_collected: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
}

impl AuctionUpdate {
    pub fn cancel() -> Self {
        Self {
            is_active: Some(false),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn string_list(value: Option<&Value>) -> Option<Vec<String>> {
    let items = value.map(unwrap_data)?.as_array()?;
    let list: Vec<String> = items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.clone()),
            // Media objects carry their location in `url`.
            Value::Object(_) => first_str(attributes(item), &["url"]).map(ToString::to_string),
            _ => None,
        })
        .collect();
    (!list.is_empty()).then_some(list)
}

/// Text of the first child of the first block of a rich-text field.
fn rich_text_first(value: Option<&Value>) -> Option<String> {
    value?
        .get(0)?
        .get("children")?
        .get(0)?
        .get("text")?
        .as_str()
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}
