/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use pixelscribe_api::{app::{build_router, AppState}, config::Config};
/// use pixelscribe_shared::credits::PgLedger;
/// use pixelscribe_shared::search::DocIndex;
/// use sqlx::PgPool;
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let ledger = Arc::new(PgLedger::new(pool.clone()));
/// let state = AppState::new(pool, config, ledger, DocIndex::empty())?;
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use pixelscribe_shared::credits::DynCreditLedger;
use pixelscribe_shared::enhance::EnhanceService;
use pixelscribe_shared::search::DocIndex;
use pixelscribe_shared::vendor::openai::{ChatClient, ChatConfig, ChatError};
use pixelscribe_shared::vendor::{ClipDropClient, ClipDropConfig, OperationKind, VendorError};
use sqlx::PgPool;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{
    config::Config,
    middleware::{auth::require_auth, security::SecurityHeadersLayer},
    routes,
};

/// Failure while assembling application state
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Failed to build image vendor client: {0}")]
    Vendor(#[from] VendorError),

    #[error("Failed to build chat client: {0}")]
    Chat(#[from] ChatError),
}

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Every field is behind an `Arc` (or is a pool handle), so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Credit-gated image proxy
    pub enhance: EnhanceService,

    /// PixelBot chat client
    pub chat: Arc<ChatClient>,

    /// Document index built at startup
    pub docs: Arc<DocIndex>,
}

impl AppState {
    /// Creates application state, building the vendor clients from `config`
    pub fn new(
        db: PgPool,
        config: Config,
        ledger: DynCreditLedger,
        docs: DocIndex,
    ) -> Result<Self, StateError> {
        let clipdrop = ClipDropClient::new(
            ClipDropConfig::new(config.clipdrop.api_key.clone())
                .with_base_url(config.clipdrop.base_url.clone())
                .with_timeout(Duration::from_secs(config.clipdrop.timeout_secs)),
        )?;

        let chat = ChatClient::new(
            ChatConfig::default()
                .with_api_key(config.openai.api_key.clone())
                .with_base_url(config.openai.base_url.clone())
                .with_model(config.openai.model.clone()),
        )?;

        let enhance = EnhanceService::new(ledger, Arc::new(clipdrop))
            .with_uncrop_max_extent(config.credits.uncrop_max_extent);

        Ok(Self {
            db,
            config: Arc::new(config),
            enhance,
            chat: Arc::new(chat),
            docs: Arc::new(docs),
        })
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET /                          # Liveness text
/// ├── GET /health                    # Health check
/// └── /api/
///     ├── /user/
///     │   ├── POST /register
///     │   ├── POST /login
///     │   └── GET  /credits          # token required
///     ├── /enhance/                  # token required, multipart
///     │   ├── POST /enhance-image
///     │   ├── POST /remove-background
///     │   ├── POST /colorize-image
///     │   ├── POST /style-transfer
///     │   ├── POST /reimagine
///     │   ├── POST /replace-background
///     │   ├── POST /uncrop
///     │   ├── POST /remove-text
///     │   ├── POST /cleanup
///     │   └── POST /remove-objects   # alias of cleanup
///     ├── /image/                    # token required, JSON
///     │   └── POST /generate-image
///     └── /chat/
///         ├── POST /ai
///         └── POST /search
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Security headers
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. Authentication (per-route basis)
pub fn build_router(state: AppState) -> Router {
    let auth = || axum::middleware::from_fn_with_state(state.clone(), require_auth);

    let user_routes = Router::new()
        .route("/register", post(routes::user::register))
        .route("/login", post(routes::user::login))
        .route("/credits", get(routes::user::credits).layer(auth()));

    let enhance_routes = Router::new()
        .route("/enhance-image", routes::enhance::route(OperationKind::Upscale))
        .route("/remove-background", routes::enhance::route(OperationKind::RemoveBackground))
        .route("/colorize-image", routes::enhance::route(OperationKind::Colorize))
        .route("/style-transfer", routes::enhance::route(OperationKind::StyleTransfer))
        .route("/reimagine", routes::enhance::route(OperationKind::Reimagine))
        .route("/replace-background", routes::enhance::route(OperationKind::ReplaceBackground))
        .route("/uncrop", routes::enhance::route(OperationKind::Uncrop))
        .route("/remove-text", routes::enhance::route(OperationKind::RemoveText))
        .route("/cleanup", routes::enhance::route(OperationKind::Cleanup))
        .route("/remove-objects", routes::enhance::route(OperationKind::Cleanup))
        .layer(DefaultBodyLimit::max(state.config.api.max_upload_bytes))
        .layer(auth());

    let image_routes = Router::new()
        .route("/generate-image", post(routes::image::generate_image))
        .layer(auth());

    let chat_routes = Router::new()
        .route("/ai", post(routes::chat::chat))
        .route("/search", post(routes::chat::search));

    let api_routes = Router::new()
        .nest("/user", user_routes)
        .nest("/enhance", enhance_routes)
        .nest("/image", image_routes)
        .nest("/chat", chat_routes);

    Router::new()
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_permissive() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("token"),
        ])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}
