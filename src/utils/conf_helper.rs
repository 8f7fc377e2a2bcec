use tokio::fs;
use std::sync::OnceLock;
use tracing::info;
use crate::models::config_model::DashboardConfig;
use tokio::net::TcpListener;

static CONFIG_CACHE: OnceLock<DashboardConfig> = OnceLock::new();

pub const CONFIG_FILE: &str = "dashboard.json";

pub async fn load_config(file_path: &str) -> Result<DashboardConfig, String> {
    let data = fs::read_to_string(file_path)
        .await
        .map_err(|e| format!("File read Error: {e} {file_path}"))?;

    serde_json::from_str(&data).map_err(|e| format!("JSON Parse Error: {e}"))
}

pub async fn init_config_and_bind(mut config: DashboardConfig) -> Result<TcpListener, String> {
    let bind_addr = format!(
        "{}:{}",
        config.connection.ip,
        config.connection.port
    );

    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| format!("Bind failed: {e}"))?;

    let actual_port = listener
        .local_addr()
        .map_err(|e| format!("Addr error: {e}"))?
        .port();

    // port 0 lets the OS choose, report the real one
    config.connection.port = actual_port;

    CONFIG_CACHE
        .set(config)
        .map_err(|_| "Config already initialized".to_string())?;

    info!("Config initialized with port: {}", actual_port);

    Ok(listener)
}

pub fn get_cached_config() -> Option<&'static DashboardConfig> {
    CONFIG_CACHE.get()
}
