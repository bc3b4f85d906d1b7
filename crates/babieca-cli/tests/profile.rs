//! Integration tests for the profile view.

mod fixtures;

use assert_cmd::cargo::cargo_bin_cmd;
use fixtures::{auction, bid, can_bind_localhost, temp_home, write_session};
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FAR_FUTURE: &str = "2099-12-31T00:00:00.000Z";

async fn backend() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 5 })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auctions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                auction(1, "Grandfather clock", 150.0, true, FAR_FUTURE),
                auction(2, "Oak table", 80.0, true, FAR_FUTURE),
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/bids"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                bid(20, 1, 15, "ana", 101.0, "2026-03-01T10:00:00.000Z"),
                bid(21, 1, 15, "ana", 102.0, "2026-03-02T10:00:00.000Z"),
                bid(22, 1, 15, "ana", 103.0, "2026-03-03T10:00:00.000Z"),
                bid(23, 1, 15, "ana", 104.0, "2026-03-04T10:00:00.000Z"),
                bid(24, 1, 15, "ana", 105.0, "2026-03-05T10:00:00.000Z"),
                bid(25, 2, 15, "ana", 80.0, "2026-03-06T10:00:00.000Z"),
                bid(26, 1, 16, "leo", 150.0, "2026-03-07T10:00:00.000Z"),
            ]
        })))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_profile_lists_five_most_recent_bids() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = backend().await;
    write_session(home.path(), "jwt-ana", "user");

    cargo_bin_cmd!("babieca")
        .env("BABIECA_HOME", home.path())
        .env("BABIECA_API_BASE_URL", server.uri())
        .args(["profile", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Username:  ana"))
        .stdout(predicate::str::contains("My bids"))
        .stdout(predicate::str::contains("Oak table"))
        .stdout(predicate::str::contains("winning"))
        .stdout(predicate::str::contains("105,00 €"))
        .stdout(predicate::str::contains("outbid"))
        .stdout(predicate::str::contains("101,00 €").not())
        .stdout(predicate::str::contains("150,00 €").not());
}

#[tokio::test]
async fn test_profile_without_bids() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 5 })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auctions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/bids"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&server)
        .await;
    write_session(home.path(), "jwt-ana", "user");

    cargo_bin_cmd!("babieca")
        .env("BABIECA_HOME", home.path())
        .env("BABIECA_API_BASE_URL", server.uri())
        .args(["profile", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("You have not placed any bids yet."));
}

#[test]
fn test_profile_requires_login() {
    let home = temp_home();

    cargo_bin_cmd!("babieca")
        .env("BABIECA_HOME", home.path())
        .args(["profile", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not logged in"));
}
