use std::path::PathBuf;

use anyhow::{Context, Result};
use deepsearch_config::ConfigLoader;
use tracing::info;

pub async fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let config = ConfigLoader::load(config_path.as_deref()).context("Failed to load configuration")?;
    info!(
        address = %config.server.bind_address(),
        provider = ?config.chat.provider,
        search = ?config.search.provider,
        "Configuration loaded"
    );

    deepsearch_web::start_server(&config)
        .await
        .context("Server failed")
}
