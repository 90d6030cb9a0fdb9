use catalog_api::config::{self, Environment};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    let config = config::config();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_ansi(matches!(config.environment, Environment::Local | Environment::Development))
        .init();

    tracing::info!("Starting catalog-api in {} mode", config.environment.as_str());

    catalog_api::server::serve(config).await
}
