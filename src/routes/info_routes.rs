use axum::{
    routing::get,
    Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use tracing::debug;
use serde::Serialize;

use race_stats::Statistic;

pub fn health_routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/info", get(info_check))
        .route("/statistics", get(list_statistics))
}

pub async fn info_check() -> Response {
    match crate::utils::conf_helper::get_cached_config() {
        Some(config) => {
            debug!("{} info requested", config.name);
            Json(config).into_response()
        }
        None => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}

async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_owned(),
    })
}

async fn list_statistics() -> Json<Vec<StatisticInfo>> {
    Json(
        Statistic::ALL
            .iter()
            .map(|stat| StatisticInfo {
                name: stat.name(),
                unit: stat.unit(),
                derived: stat.is_derived(),
            })
            .collect(),
    )
}

#[derive(Serialize)]
pub struct HealthStatus {
    status: String,
}

#[derive(Serialize)]
pub struct StatisticInfo {
    name: &'static str,
    unit: &'static str,
    derived: bool,
}
