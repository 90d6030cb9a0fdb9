use crate::cli::{utils::output_success, OutputFormat};
use crate::config::AppConfig;
use crate::database::DatabaseManager;

pub async fn handle(config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let db = DatabaseManager::connect_lazy(&config.database)?;
    db.migrate().await?;
    db.close().await;

    output_success(output_format, "Migrations applied", None)
}
