use axum::{
    routing::{get, post},
    Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
    extract::{
        Path,
        Query,
        State,
        ws::WebSocketUpgrade,
    },
};

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, debug, error, warn};
use serde::{Serialize, Deserialize};

use crate::state::app_state::AppState;
use race_stats::{
    handle_ws_fetch, snapshot, to_race_time, BoatRecord, DerivedSeries, RaceData, SeriesKey,
    Statistic, StatsError,
};

#[derive(Deserialize, Debug)]
pub struct SeriesQuery {
    pub stat: Option<String>,
    #[serde(default)]
    pub elapsed: bool,
}

#[derive(Serialize)]
pub struct SeriesResponse {
    pub stat: &'static str,
    pub unit: &'static str,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

#[derive(Serialize)]
pub struct BoatSummary {
    pub id: String,
    pub team_id: String,
    pub name: String,
    pub color: String,
    /// Leg index -> seconds since the start gun, empty without a start gun
    pub legs: BTreeMap<i64, f64>,
}

#[derive(Serialize)]
pub struct LoadResponse {
    pub id: String,
    pub race: String,
    pub boats: Vec<String>,
    pub evicted: usize,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Handler failure carrying a message the dashboard can show as is.
#[derive(Debug)]
pub enum ApiError {
    Stats(StatsError),
    BoatNotFound { race: String, boat: String },
}

impl From<StatsError> for ApiError {
    fn from(e: StatsError) -> Self {
        ApiError::Stats(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Stats(e) => {
                let status = match &e {
                    StatsError::UnknownStatistic(_) => StatusCode::BAD_REQUEST,
                    StatsError::InsufficientData(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    StatsError::RaceNotFound(_) => StatusCode::NOT_FOUND,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, e.to_string())
            }
            ApiError::BoatNotFound { race, boat } => (
                StatusCode::NOT_FOUND,
                format!("Race {} has no boat {}", race, boat),
            ),
        };

        if status.is_server_error() {
            error!("{}", message);
        } else {
            warn!("{}", message);
        }
        (status, Json(ErrorBody { error: message })).into_response()
    }
}


/// =======================
/// ROUTER
/// =======================

pub fn data_routes(state: AppState) -> Router {
    Router::new()
        .route("/races", get(list_races))
        .route("/races/{race}/boats", get(race_boats))
        .route("/races/{race}/reload", post(reload_race))
        .route("/series/{race}/{boat}", get(series))
        .route("/snapshot/{race}/{boat}", get(boat_snapshot))
        .route("/fetch/{race}/{boat}", get(ws_fetch))
        .with_state(state)
}


/// =======================
/// HELPERS
/// =======================

async fn loaded_race(state: &AppState, race: &str) -> Result<Arc<RaceData>, ApiError> {
    if let Some(loaded) = state.races.read().await.get(race).cloned() {
        return Ok(loaded);
    }

    let loaded = Arc::new(state.archive.load_race(race)?);
    state
        .races
        .write()
        .await
        .insert(race.to_string(), loaded.clone());
    Ok(loaded)
}

fn find_boat<'a>(race: &'a RaceData, boat: &str) -> Result<&'a BoatRecord, ApiError> {
    race.boat(boat).ok_or_else(|| ApiError::BoatNotFound {
        race: race.race.clone(),
        boat: boat.to_string(),
    })
}

fn parse_stat(state: &AppState, name: Option<&str>) -> Result<Statistic, ApiError> {
    match name {
        Some(name) => Ok(name.parse()?),
        None => Ok(state.default_stat),
    }
}

/// Reloads a race from disk and evicts its cached series.
///
/// Lock order is cache then races, same as `cached_series`.
async fn reload(state: &AppState, race_id: &str) -> Result<(Arc<RaceData>, usize), ApiError> {
    let race = Arc::new(state.archive.load_race(race_id)?);

    let mut cache = state.cache.write().await;
    state
        .races
        .write()
        .await
        .insert(race_id.to_string(), race.clone());
    let evicted = cache.invalidate_race(race_id);

    Ok((race, evicted))
}

/// Computes a series for `race`, caching it only while `race` is still the
/// loaded version.
async fn cached_series(
    state: &AppState,
    race_id: &str,
    boat_id: &str,
    race: &Arc<RaceData>,
    stat: Statistic,
) -> Result<Arc<DerivedSeries>, ApiError> {
    let boat = find_boat(race, boat_id)?;

    let mut cache = state.cache.write().await;
    let current = state
        .races
        .read()
        .await
        .get(race_id)
        .is_some_and(|loaded| Arc::ptr_eq(loaded, race));

    if !current {
        debug!("Race {} was reloaded, not caching {}", race_id, stat);
        return Ok(Arc::new(state.engine.stat(stat, boat)?));
    }

    Ok(cache.get_or_try_insert_with(SeriesKey::new(race_id, boat_id, stat), || {
        state.engine.stat(stat, boat)
    })?)
}

/// Series for one boat, absolute or race-relative, through the cache.
async fn resolve_series(
    state: &AppState,
    race_id: &str,
    boat_id: &str,
    stat: Statistic,
    elapsed: bool,
) -> Result<Arc<DerivedSeries>, ApiError> {
    let race = loaded_race(state, race_id).await?;
    let series = cached_series(state, race_id, boat_id, &race, stat).await?;
    let boat = find_boat(&race, boat_id)?;

    if elapsed {
        Ok(Arc::new(to_race_time(&series, boat)?))
    } else {
        Ok(series)
    }
}


/// =======================
/// HANDLERS
/// =======================

async fn list_races(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.archive.list_races()?))
}

async fn race_boats(
    State(state): State<AppState>,
    Path(race_id): Path<String>,
) -> Result<Json<Vec<BoatSummary>>, ApiError> {
    let race = loaded_race(&state, &race_id).await?;

    let summaries = race
        .boats
        .iter()
        .enumerate()
        .map(|(i, boat)| boat_summary(&(i + 1).to_string(), boat))
        .collect();

    Ok(Json(summaries))
}

fn boat_summary(id: &str, boat: &BoatRecord) -> BoatSummary {
    let legs = match boat.legs.race_start() {
        Ok(start) => boat
            .legs
            .marks()
            .iter()
            .map(|m| (m.leg, m.timestamp - start))
            .collect(),
        Err(_) => BTreeMap::new(),
    };

    BoatSummary {
        id: id.to_string(),
        team_id: boat.team_id.clone(),
        name: boat.name.clone(),
        color: boat.color.clone(),
        legs,
    }
}

async fn reload_race(
    State(state): State<AppState>,
    Path(race_id): Path<String>,
) -> Result<Json<LoadResponse>, ApiError> {
    let (race, evicted) = reload(&state, &race_id).await?;

    let load_id = uuid::Uuid::new_v4().to_string();
    info!("Reloaded race {} as {} ({} cached series evicted)", race_id, load_id, evicted);

    Ok(Json(LoadResponse {
        id: load_id,
        race: race_id,
        boats: race.boats.iter().map(|b| b.name.clone()).collect(),
        evicted,
    }))
}

async fn series(
    State(state): State<AppState>,
    Path((race_id, boat_id)): Path<(String, String)>,
    Query(query): Query<SeriesQuery>,
) -> Result<Json<SeriesResponse>, ApiError> {
    debug!("Series request: race={} boat={} {:?}", race_id, boat_id, query);

    let stat = parse_stat(&state, query.stat.as_deref())?;
    let series = resolve_series(&state, &race_id, &boat_id, stat, query.elapsed).await?;

    Ok(Json(SeriesResponse {
        stat: stat.name(),
        unit: stat.unit(),
        x: series.x.clone(),
        y: series.y.clone(),
    }))
}

async fn boat_snapshot(
    State(state): State<AppState>,
    Path((race_id, boat_id)): Path<(String, String)>,
) -> Response {
    let race = match loaded_race(&state, &race_id).await {
        Ok(r) => r,
        Err(e) => return e.into_response(),
    };
    let boat = match find_boat(&race, &boat_id) {
        Ok(b) => b,
        Err(e) => return e.into_response(),
    };

    match snapshot(&state.engine, boat) {
        Ok(snap) => Json(snap).into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

async fn ws_fetch(
    State(state): State<AppState>,
    Path((race_id, boat_id)): Path<(String, String)>,
    Query(query): Query<SeriesQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    let stat = match parse_stat(&state, query.stat.as_deref()) {
        Ok(s) => s,
        Err(e) => return e.into_response(),
    };

    let series = match resolve_series(&state, &race_id, &boat_id, stat, query.elapsed).await {
        Ok(s) => s,
        Err(e) => return e.into_response(),
    };

    let label = format!("race {} boat {} {}", race_id, boat_id, stat);
    ws.on_upgrade(move |socket| handle_ws_fetch(socket, series, label))
}
