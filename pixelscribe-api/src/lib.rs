//! # PixelScribe API Server Library
//!
//! HTTP gateway in front of the ClipDrop image API and the PixelBot chat
//! provider.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Failure envelope and error mapping
//! - `middleware`: Token gate and security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
