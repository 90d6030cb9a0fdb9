use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::auth::JwtManager;
use crate::config::AppConfig;
use crate::database::{DatabaseManager, PgProductStore, PgUserStore};
use crate::handlers::{self, protected::products, public};
use crate::middleware::{cors_layer, jwt_auth_middleware, rate_limit_middleware, with_security_headers, RateLimiter};
use crate::services::{AuthService, ProductService};

/// Shared handler state. Every member is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseManager,
    pub jwt: JwtManager,
    pub auth: Arc<AuthService>,
    pub products: Arc<ProductService>,
}

impl AppState {
    /// Wire Postgres-backed services onto the pool.
    pub fn new(db: DatabaseManager, jwt: JwtManager, config: &AppConfig) -> Self {
        let pool = db.pool().clone();
        let auth = AuthService::new(Arc::new(PgUserStore::new(pool.clone())), jwt.clone());
        let products = ProductService::new(Arc::new(PgProductStore::new(pool)), config.filter.max_limit)
            .with_debug_logging(config.filter.debug_logging);

        Self {
            db,
            jwt,
            auth: Arc::new(auth),
            products: Arc::new(products),
        }
    }
}

/// Build the complete application router.
///
/// ```text
/// GET  /ping
/// GET  /health
/// POST {prefix}/{version}/auth/register
/// POST {prefix}/{version}/auth/login
/// GET  {prefix}/{version}/products/all      (bearer token)
/// ```
pub fn router(state: AppState, config: &AppConfig) -> Router {
    let protected = Router::new()
        .route("/products/all", get(products::list_all))
        .route_layer(from_fn_with_state(state.jwt.clone(), jwt_auth_middleware));

    let mut api = Router::new()
        .route("/auth/register", post(public::auth::register))
        .route("/auth/login", post(public::auth::login))
        .merge(protected);

    if config.api.enable_rate_limiting {
        let limiter = Arc::new(RateLimiter::new(config.api.rate_limit_requests, config.api.rate_limit_window));
        api = api.layer(from_fn_with_state(limiter, rate_limit_middleware));
    }

    let mut app = Router::new()
        .route("/ping", get(public::ping))
        .route("/health", get(public::health))
        .nest(&config.api.base_path(), api)
        .fallback(handlers::not_found)
        .with_state(state);

    if config.api.enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }
    if config.api.enable_response_compression {
        app = app.layer(CompressionLayer::new());
    }
    if config.security.enable_cors {
        app = app.layer(cors_layer(&config.security));
    }

    with_security_headers(app)
}

/// Bind, serve until ctrl-c, then close the pool.
pub async fn serve(config: &AppConfig) -> anyhow::Result<()> {
    let jwt = JwtManager::from_config(&config.jwt)
        .map_err(|e| anyhow::anyhow!("JWT_SECRET must be set for the {} environment: {}", config.environment.as_str(), e))?;
    let db = DatabaseManager::connect_lazy(&config.database)?;

    if config.is_production() && config.security.cors_origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS accepts any origin with credentials in production");
    }

    let app = router(AppState::new(db.clone(), jwt, config), config);

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;

    tracing::info!(
        "catalog-api listening on http://{} ({} mode, api at {})",
        listener.local_addr()?,
        config.environment.as_str(),
        config.api.base_path()
    );

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
