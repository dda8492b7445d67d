/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `JWT_SECRET`: Secret key for JWT signing, at least 32 characters (required)
/// - `CLIPDROP_API`: ClipDrop API key (required)
/// - `API_HOST` / `PORT`: Bind address (default: 0.0.0.0:4000)
/// - `OPENAI_API_KEY`: Enables provider-backed chat (default: local replies)
/// - `CORS_ORIGINS`: Comma-separated origins, `*` for permissive
/// - `STARTING_CREDITS`: Balance given to new accounts (default: 5)
/// - `SEARCH_ROOTS`: Comma-separated directories for the document index
/// - `LOG_FORMAT`: `json` for structured logs (default: human readable)
///
/// # Example
///
/// ```no_run
/// use pixelscribe_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use pixelscribe_shared::enhance::DEFAULT_UNCROP_MAX_EXTENT;
use pixelscribe_shared::vendor::{clipdrop, openai};

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,https://pixelscribe-frontend.onrender.com";

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub clipdrop: ClipDropSettings,
    pub openai: OpenAiSettings,
    pub credits: CreditsConfig,
    pub search: SearchConfig,
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `*` means permissive
    pub cors_origins: Vec<String>,

    /// Production mode (enables HSTS)
    pub production: bool,

    /// Request body limit for uploads
    pub max_upload_bytes: usize,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// IMPORTANT: This must be kept secret and should be at least 32 bytes.
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    /// Token lifetime
    pub expiry_hours: i64,
}

/// ClipDrop vendor configuration
#[derive(Debug, Clone)]
pub struct ClipDropSettings {
    pub api_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

/// Chat provider configuration
#[derive(Debug, Clone)]
pub struct OpenAiSettings {
    /// `None` selects the local canned reply
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

/// Credit policy
#[derive(Debug, Clone)]
pub struct CreditsConfig {
    /// Balance for newly registered accounts
    pub starting_credits: i32,

    /// Per-direction uncrop limit in pixels
    pub uncrop_max_extent: u32,
}

/// Document index configuration
#[derive(Debug, Clone, Default)]
pub struct SearchConfig {
    pub roots: Vec<PathBuf>,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// Reads `LOG_FORMAT`; anything other than `json` is human readable
    pub fn from_env() -> Self {
        match env::var("LOG_FORMAT") {
            Ok(value) if value.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing
    /// - Environment variables have invalid values
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &str| {
            var(key).ok_or_else(|| anyhow::anyhow!("{} environment variable is required", key))
        };

        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;
        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }
        let clipdrop_key = required("CLIPDROP_API")?;

        let cors_origins = var("CORS_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let search_roots = var("SEARCH_ROOTS")
            .map(|roots| {
                roots
                    .split(',')
                    .map(str::trim)
                    .filter(|root| !root.is_empty())
                    .map(PathBuf::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            api: ApiConfig {
                host: var("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(&var, "PORT", 4000)?,
                cors_origins,
                production: parse_or(&var, "PRODUCTION", false)?,
                max_upload_bytes: parse_or(&var, "MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: parse_or(&var, "DATABASE_MAX_CONNECTIONS", 10)?,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                expiry_hours: parse_or(&var, "JWT_EXPIRY_HOURS", 168)?,
            },
            clipdrop: ClipDropSettings {
                api_key: clipdrop_key,
                base_url: var("CLIPDROP_BASE_URL")
                    .unwrap_or_else(|| clipdrop::DEFAULT_BASE_URL.to_string()),
                timeout_secs: parse_or(&var, "VENDOR_TIMEOUT_SECS", clipdrop::DEFAULT_TIMEOUT_SECS)?,
            },
            openai: OpenAiSettings {
                api_key: var("OPENAI_API_KEY"),
                base_url: var("OPENAI_BASE_URL")
                    .unwrap_or_else(|| openai::DEFAULT_BASE_URL.to_string()),
                model: var("OPENAI_MODEL").unwrap_or_else(|| openai::DEFAULT_MODEL.to_string()),
            },
            credits: CreditsConfig {
                starting_credits: parse_or(&var, "STARTING_CREDITS", 5)?,
                uncrop_max_extent: parse_or(&var, "UNCROP_MAX_EXTENT", DEFAULT_UNCROP_MAX_EXTENT)?,
            },
            search: SearchConfig {
                roots: search_roots,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// True when CORS should allow any origin
    pub fn cors_permissive(&self) -> bool {
        self.api.cors_origins.iter().any(|origin| origin == "*")
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{} has an invalid value: {}", key, raw)),
        None => Ok(default),
    }
}
