//! Shared helpers for CLI integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use serde_json::{Value, json};
use tempfile::TempDir;

/// Creates a temp BABIECA_HOME directory for test isolation.
pub fn temp_home() -> TempDir {
    TempDir::new().expect("create temp babieca home")
}

pub fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

/// Writes a signed-in session for `role` with token `token`.
pub fn write_session(home: &Path, token: &str, role: &str) {
    let session = json!({
        "auth_token": token,
        "user_data": {
            "id": "5",
            "username": "ana",
            "email": "ana@example.com",
            "userType": "particular",
            "phone": "",
            "role": role,
            "isBlocked": false,
            "createdAt": "2026-01-01T00:00:00Z"
        },
        "bidder_id": "15"
    });
    fs::write(
        home.join("session.json"),
        serde_json::to_string_pretty(&session).unwrap(),
    )
    .unwrap();
}

pub fn read_session(home: &Path) -> Value {
    let contents = fs::read_to_string(home.join("session.json")).unwrap();
    serde_json::from_str(&contents).unwrap()
}

pub fn auction(id: u64, name: &str, current_bid: f64, active: bool, end: &str) -> Value {
    json!({
        "id": id,
        "documentId": format!("doc{id}"),
        "productName": name,
        "productDescription": format!("{name} in good condition"),
        "startingPrice": 100,
        "currentBid": current_bid,
        "bidCount": 1,
        "startDate": "2026-01-01T00:00:00.000Z",
        "endDate": end,
        "isActive": active
    })
}

pub fn bid(id: u64, auction: u64, bidder: u64, username: &str, amount: f64, at: &str) -> Value {
    json!({
        "id": id,
        "auction": auction,
        "bidder": { "id": bidder, "username": username },
        "bidPrice": amount,
        "bidDate": at
    })
}
