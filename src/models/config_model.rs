use serde::{Deserialize, Serialize};

fn default_stat() -> String {
    "speed".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub name: String,
    pub version: String,
    pub data_dir: String,
    #[serde(default = "default_stat")]
    pub default_stat: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    pub connection: Connection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Connection {
    pub ip: String,
    pub port: u16,
}
