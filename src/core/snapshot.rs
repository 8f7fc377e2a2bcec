// Per-boat resampled snapshot driving the map dashboard

use crate::core::error::{Result, StatsError};
use crate::core::format::BoatRecord;
use crate::core::interp::{interp, linspace};
use crate::core::stats::{StatsEngine, Statistic};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

/// Every statistic of one boat on a shared whole-second axis.
#[derive(Debug, Clone, Serialize)]
pub struct BoatSnapshot {
    pub team_id: String,
    pub name: String,
    pub color: String,
    pub race_start: DateTime<Utc>,
    /// Seconds since the start gun.
    pub x: Vec<f64>,
    /// Leg index → seconds since the start gun.
    pub legs: BTreeMap<i64, f64>,
    pub stats: BTreeMap<String, Vec<f64>>,
}

pub fn snapshot(engine: &StatsEngine, boat: &BoatRecord) -> Result<BoatSnapshot> {
    let heading = engine.stat(Statistic::Heading, boat)?;
    let (t0, t1) = (heading.x[0].trunc(), heading.x[heading.len() - 1].trunc());
    let axis: Vec<f64> = linspace(t0, t1, (t1 - t0) as usize)
        .into_iter()
        .map(f64::trunc)
        .collect();
    if axis.is_empty() {
        return Err(StatsError::InsufficientData(
            "heading spans less than one second".into(),
        ));
    }

    let mut stats = BTreeMap::new();
    for stat in Statistic::ALL {
        // interleaved foils have no monotonic axis to resample against
        if stat == Statistic::BothFoils {
            continue;
        }
        match engine.stat(stat, boat) {
            Ok(series) => {
                stats.insert(stat.name().to_string(), interp(&axis, &series.x, &series.y));
            }
            Err(StatsError::InsufficientData(reason)) => {
                warn!("Snapshot of team {} skips {}: {}", boat.team_id, stat, reason);
            }
            Err(e) => return Err(e),
        }
    }

    let start = boat.legs.race_start()?;
    let nanos = (start.fract() * 1e9) as u32;
    let race_start = DateTime::<Utc>::from_timestamp(start.trunc() as i64, nanos)
        .ok_or_else(|| StatsError::InsufficientData(format!("race start {} out of range", start)))?;

    Ok(BoatSnapshot {
        team_id: boat.team_id.clone(),
        name: boat.name.clone(),
        color: boat.color.clone(),
        race_start,
        x: axis.iter().map(|t| t - start).collect(),
        legs: boat
            .legs
            .marks()
            .iter()
            .map(|m| (m.leg, m.timestamp - start))
            .collect(),
        stats,
    })
}
