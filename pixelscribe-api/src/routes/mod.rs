/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Liveness and health check endpoints
/// - `user`: Registration, login and balance lookup
/// - `enhance`: The nine credit-gated upload operations
/// - `image`: Credit-gated image generation from a prompt
/// - `chat`: PixelBot chat and document search

pub mod chat;
pub mod enhance;
pub mod health;
pub mod image;
pub mod user;
