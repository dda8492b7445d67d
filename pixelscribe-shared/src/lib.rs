//! # PixelScribe Shared Library
//!
//! This crate contains the types and business logic behind the PixelScribe
//! gateway: accounts and their credit balance, the vendor clients, and the
//! credit-gated enhancement proxy.
//!
//! ## Module Organization
//!
//! - `auth`: JWT tokens, password hashing, request auth context
//! - `db`: Connection pool and migrations
//! - `models`: Database models (accounts)
//! - `credits`: Credit ledger (atomic reserve/refund)
//! - `vendor`: ClipDrop image client and OpenAI chat client
//! - `enhance`: The credit-gated vendor proxy
//! - `search`: Read-only document index used by the chat widget

pub mod auth;
pub mod credits;
pub mod db;
pub mod enhance;
pub mod models;
pub mod search;
pub mod vendor;

/// Current version of the PixelScribe shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
