use anyhow::Context;
use axum::Router;
use tracing::{info, warn, Level};

mod routes;
mod models;
mod utils;
mod state;

use crate::utils::conf_helper::{get_cached_config, init_config_and_bind, load_config, CONFIG_FILE};
use crate::state::app_state::AppState;
use race_stats::{RaceArchive, Statistic};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1).unwrap_or_else(|| CONFIG_FILE.to_string());

    let config = load_config(&config_path)
        .await
        .map_err(anyhow::Error::msg)
        .context("CRITICAL INIT FAILURE")?;

    let level = config.log_level.parse::<Level>().unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .init();

    let default_stat = config.default_stat.parse::<Statistic>().unwrap_or_else(|e| {
        warn!("{}, falling back to speed", e);
        Statistic::Speed
    });

    let archive = RaceArchive::open(&config.data_dir)
        .with_context(|| format!("opening race archive {}", config.data_dir))?;
    let state = AppState::new(archive, default_stat);

    // === CONFIG + LISTENER ===
    let listener = init_config_and_bind(config)
        .await
        .map_err(anyhow::Error::msg)?;

    if let Some(config) = get_cached_config() {
        info!(
            "{} serving {} on {}:{}",
            config.name,
            config.data_dir,
            config.connection.ip,
            config.connection.port
        );
    }

    let app = Router::new()
        .merge(routes::info_routes::health_routes())
        .merge(routes::data_routes::data_routes(state));

    axum::serve(listener, app).await?;
    Ok(())
}
