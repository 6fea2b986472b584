use std::env;

use tracing::{error, info};

use grafton_bff::{load_config_from_dir, util::logger, Builder, Error};

const CONFIG_DIR_ENV: &str = "GRAFTON_BFF_CONFIG_DIR";

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config_dir = env::var(CONFIG_DIR_ENV).unwrap_or_else(|_| "config".to_string());
    let config = load_config_from_dir(&config_dir)?;

    logger::init(&config)?;
    info!(%config_dir, run_mode = ?config.run_mode, "Configuration loaded");

    let server = Builder::new(config)?.build().await?;

    server.start().await.map_err(|e| {
        error!("Server failed: {:?}", e);
        e
    })
}
