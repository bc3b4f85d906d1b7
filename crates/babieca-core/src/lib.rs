//! Core Babieca library (REST client, session, auctions, admin, config).

pub mod admin;
pub mod api;
pub mod auctions;
pub mod auth;
pub mod config;
pub mod format;
pub mod forms;
pub mod logging;
pub mod session;
