// Derived-series cache keyed by (race, boat, statistic)

use crate::core::error::Result;
use crate::core::format::DerivedSeries;
use crate::core::stats::Statistic;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeriesKey {
    pub race: String,
    pub boat: String,
    pub stat: Statistic,
}

impl SeriesKey {
    pub fn new(race: &str, boat: &str, stat: Statistic) -> Self {
        Self {
            race: race.to_string(),
            boat: boat.to_string(),
            stat,
        }
    }
}

/// Holds series with absolute x. Race-relative views are derived on read.
#[derive(Debug, Default)]
pub struct SeriesCache {
    entries: HashMap<SeriesKey, Arc<DerivedSeries>>,
}

impl SeriesCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &SeriesKey) -> Option<Arc<DerivedSeries>> {
        self.entries.get(key).cloned()
    }

    pub fn insert(&mut self, key: SeriesKey, series: DerivedSeries) -> Arc<DerivedSeries> {
        let series = Arc::new(series);
        self.entries.insert(key, series.clone());
        series
    }

    /// Returns the cached series or computes and stores it. Failures are not cached.
    pub fn get_or_try_insert_with<F>(
        &mut self,
        key: SeriesKey,
        compute: F,
    ) -> Result<Arc<DerivedSeries>>
    where
        F: FnOnce() -> Result<DerivedSeries>,
    {
        if let Some(series) = self.entries.get(&key) {
            debug!("Cache hit: race {} boat {} {}", key.race, key.boat, key.stat);
            return Ok(series.clone());
        }
        debug!("Cache miss: race {} boat {} {}", key.race, key.boat, key.stat);
        let series = compute()?;
        Ok(self.insert(key, series))
    }

    /// Drops every series of a race, e.g. after it is reloaded.
    pub fn invalidate_race(&mut self, race: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.race != race);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
