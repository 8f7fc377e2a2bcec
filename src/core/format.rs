// Data structures for race telemetry

use crate::core::constants::{HISTORY_KEY, LEG_KEY, TEAM_ID_KEY};
use crate::core::error::{Result, StatsError};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// `{ "valHistory": [[value, timestamp], ...] }` as found in the boat feed.
#[derive(Debug, Clone, Deserialize)]
pub struct ValHistory {
    #[serde(rename = "valHistory")]
    pub val_history: Vec<(f64, f64)>,
}

/// One irregularly sampled channel, timestamps non-decreasing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawChannel {
    pub timestamps: Vec<f64>,
    pub values: Vec<f64>,
}

impl RawChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a channel from feed-ordered `(value, timestamp)` pairs.
    pub fn from_pairs(pairs: &[(f64, f64)]) -> Self {
        let mut channel = Self {
            timestamps: Vec::with_capacity(pairs.len()),
            values: Vec::with_capacity(pairs.len()),
        };
        for &(value, ts) in pairs {
            channel.timestamps.push(ts);
            channel.values.push(value);
        }
        channel
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegMark {
    pub leg: i64,
    pub timestamp: f64,
}

/// Leg transitions of one boat. Even legs are upwind, odd legs downwind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LegHistory {
    marks: Vec<LegMark>,
}

impl LegHistory {
    pub fn new(marks: Vec<LegMark>) -> Self {
        Self { marks }
    }

    pub fn from_pairs(pairs: &[(f64, f64)]) -> Self {
        let marks = pairs
            .iter()
            .map(|&(leg, timestamp)| LegMark {
                leg: leg.round() as i64,
                timestamp,
            })
            .collect();
        Self { marks }
    }

    pub fn marks(&self) -> &[LegMark] {
        &self.marks
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// The second transition is the start gun; the first marks the pre-start.
    pub fn race_start(&self) -> Result<f64> {
        self.marks
            .get(1)
            .map(|m| m.timestamp)
            .ok_or_else(|| StatsError::InsufficientData("leg history has no race start".into()))
    }
}

/// All telemetry of one boat in one race. Read-only input to the engine.
#[derive(Debug, Clone, Default)]
pub struct BoatRecord {
    pub team_id: String,
    pub name: String,
    pub color: String,
    pub channels: HashMap<String, RawChannel>,
    pub legs: LegHistory,
}

impl BoatRecord {
    pub fn new(team_id: impl Into<String>) -> Self {
        Self {
            team_id: team_id.into(),
            ..Self::default()
        }
    }

    pub fn with_channel(mut self, key: impl Into<String>, pairs: &[(f64, f64)]) -> Self {
        self.channels.insert(key.into(), RawChannel::from_pairs(pairs));
        self
    }

    pub fn with_legs(mut self, pairs: &[(f64, f64)]) -> Self {
        self.legs = LegHistory::from_pairs(pairs);
        self
    }

    /// Parses a boat feed document. Entries that are not `valHistory`
    /// channels are ignored.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let doc: Value = serde_json::from_slice(data)?;
        let Value::Object(entries) = doc else {
            return Err(StatsError::InsufficientData(
                "boat document is not a JSON object".into(),
            ));
        };

        let mut boat = BoatRecord::default();
        for (key, entry) in entries {
            if key == TEAM_ID_KEY {
                boat.team_id = match entry {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
            } else if key == LEG_KEY {
                let history: ValHistory = serde_json::from_value(entry)?;
                boat.legs = LegHistory::from_pairs(&history.val_history);
            } else if entry.get(HISTORY_KEY).is_some() {
                match serde_json::from_value::<ValHistory>(entry) {
                    Ok(history) => {
                        boat.channels
                            .insert(key, RawChannel::from_pairs(&history.val_history));
                    }
                    Err(e) => debug!("Skipping channel {}: {}", key, e),
                }
            }
        }

        Ok(boat)
    }

    /// A present, non-empty raw channel.
    pub fn channel(&self, key: &str) -> Result<&RawChannel> {
        match self.channels.get(key) {
            Some(channel) if !channel.is_empty() => Ok(channel),
            Some(_) => Err(StatsError::InsufficientData(format!("channel {} is empty", key))),
            None => Err(StatsError::InsufficientData(format!("channel {} is missing", key))),
        }
    }
}

/// A computed `(x, y)` pair ready for plotting.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DerivedSeries {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl DerivedSeries {
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Self {
        debug_assert_eq!(x.len(), y.len());
        Self { x, y }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Shifts x so that `origin` becomes zero.
    pub fn shifted(&self, origin: f64) -> Self {
        Self {
            x: self.x.iter().map(|t| t - origin).collect(),
            y: self.y.clone(),
        }
    }

    /// x values read as elapsed durations, millisecond resolution.
    pub fn elapsed(&self) -> Vec<Duration> {
        self.x
            .iter()
            .map(|secs| Duration::milliseconds((secs * 1000.0).round() as i64))
            .collect()
    }
}

/// Race leg-stats manifest (`stats.json`). Only the fields the dashboard uses.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RaceManifest {
    #[serde(default)]
    pub race: Option<RaceHeader>,
    #[serde(default)]
    pub leg_stats: Vec<LegStats>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RaceHeader {
    #[serde(default)]
    pub race_number: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LegStats {
    #[serde(default)]
    pub boat: Vec<ManifestBoat>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ManifestBoat {
    #[serde(rename = "TeamID")]
    pub team_id: String,
    pub team_colour: String,
    pub country: String,
}

impl RaceManifest {
    pub fn from_json(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Manifest entry for a boat: the first boat if the team ids match,
    /// otherwise the second.
    pub fn boat_entry(&self, team_id: &str) -> Result<&ManifestBoat> {
        let boats = &self
            .leg_stats
            .first()
            .ok_or_else(|| StatsError::Manifest("no leg stats".into()))?
            .boat;

        match boats.first() {
            Some(first) if first.team_id == team_id => Ok(first),
            _ => boats
                .get(1)
                .ok_or_else(|| StatsError::Manifest(format!("no entry for team {}", team_id))),
        }
    }

    /// Copies display colour and country name onto the boat.
    pub fn resolve_identity(&self, boat: &mut BoatRecord) -> Result<()> {
        let entry = self.boat_entry(&boat.team_id)?;
        boat.color = entry.team_colour.clone();
        boat.name = entry.country.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOAT_JSON: &str = r#"{
        "teamId": 3,
        "speedInterp": {"valHistory": [[20.5, 100.0], [21.0, 101.5]]},
        "legInterp": {"valHistory": [[0, 50.0], [1, 100.0], [2, 400.0]]},
        "boatName": "Patriot",
        "coordIntep": {"xCord": []}
    }"#;

    const MANIFEST_JSON: &str = r##"{
        "Race": {"RaceNumber": "8"},
        "LegStats": [{"Boat": [
            {"TeamID": "3", "TeamColour": "#cc0000", "Country": "ITA"},
            {"TeamID": "5", "TeamColour": "#000000", "Country": "NZL"}
        ]}]
    }"##;

    #[test]
    fn parses_boat_feed() {
        let boat = BoatRecord::from_json(BOAT_JSON.as_bytes()).unwrap();
        assert_eq!(boat.team_id, "3");
        assert_eq!(boat.channels.len(), 1);

        let speed = boat.channel("speedInterp").unwrap();
        assert_eq!(speed.timestamps, vec![100.0, 101.5]);
        assert_eq!(speed.values, vec![20.5, 21.0]);

        assert_eq!(boat.legs.len(), 3);
        assert_eq!(boat.legs.race_start().unwrap(), 100.0);
    }

    #[test]
    fn missing_and_empty_channels_are_insufficient() {
        let boat = BoatRecord::new("1").with_channel("twsInterp", &[]);
        assert!(matches!(
            boat.channel("twsInterp"),
            Err(StatsError::InsufficientData(_))
        ));
        assert!(matches!(
            boat.channel("twdInterp"),
            Err(StatsError::InsufficientData(_))
        ));
    }

    #[test]
    fn race_start_needs_two_marks() {
        let legs = LegHistory::from_pairs(&[(0.0, 10.0)]);
        assert!(legs.race_start().is_err());
    }

    #[test]
    fn resolves_identity_from_manifest() {
        let manifest = RaceManifest::from_json(MANIFEST_JSON.as_bytes()).unwrap();

        let mut first = BoatRecord::new("3");
        manifest.resolve_identity(&mut first).unwrap();
        assert_eq!(first.name, "ITA");
        assert_eq!(first.color, "#cc0000");

        // anything that is not the first entry falls through to the second
        let mut other = BoatRecord::new("99");
        manifest.resolve_identity(&mut other).unwrap();
        assert_eq!(other.name, "NZL");
    }

    #[test]
    fn elapsed_is_in_seconds() {
        let series = DerivedSeries::new(vec![0.0, 10.0, 50.5], vec![1.0, 2.0, 3.0]);
        let elapsed = series.elapsed();
        assert_eq!(elapsed[1], Duration::seconds(10));
        assert_eq!(elapsed[2], Duration::milliseconds(50_500));
    }
}
