/// Middleware modules for the API server
///
/// - `auth`: Token gate for protected routes
/// - `security`: Security response headers

pub mod auth;
pub mod security;
