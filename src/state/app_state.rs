use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use race_stats::{RaceArchive, RaceData, SeriesCache, Statistic, StatsEngine};

#[derive(Clone)]
pub struct AppState {
    pub archive: Arc<RaceArchive>,
    pub engine: Arc<StatsEngine>,
    // race id -> loaded race
    pub races: Arc<RwLock<HashMap<String, Arc<RaceData>>>>,
    pub cache: Arc<RwLock<SeriesCache>>,
    pub default_stat: Statistic,
}

impl AppState {
    pub fn new(archive: RaceArchive, default_stat: Statistic) -> Self {
        Self {
            archive: Arc::new(archive),
            engine: Arc::new(StatsEngine::default()),
            races: Arc::new(RwLock::new(HashMap::new())),
            cache: Arc::new(RwLock::new(SeriesCache::new())),
            default_stat,
        }
    }
}
