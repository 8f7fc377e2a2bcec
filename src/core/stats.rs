//! Derived statistics over one boat's telemetry.
//!
//! Every call resamples from the raw channels; nothing is cached here.

use crate::core::constants::*;
use crate::core::error::{Result, StatsError};
use crate::core::format::{BoatRecord, DerivedSeries, LegHistory};
use crate::core::interp::{interp, linspace, uniform_axis};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Statistic {
    Heading,
    Heel,
    Pitch,
    Height,
    Speed,
    Tws,
    Twd,
    PortFoil,
    StbdFoil,
    BothFoils,
    Vmg,
    Twa,
    TwaAbs,
    VmgTws,
}

impl Statistic {
    /// Dashboard order.
    pub const ALL: [Statistic; 14] = [
        Statistic::Heading,
        Statistic::Heel,
        Statistic::Pitch,
        Statistic::Height,
        Statistic::Speed,
        Statistic::Tws,
        Statistic::Twd,
        Statistic::PortFoil,
        Statistic::StbdFoil,
        Statistic::BothFoils,
        Statistic::Vmg,
        Statistic::Twa,
        Statistic::TwaAbs,
        Statistic::VmgTws,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Statistic::Heading => "heading",
            Statistic::Heel => "heel",
            Statistic::Pitch => "pitch",
            Statistic::Height => "height",
            Statistic::Speed => "speed",
            Statistic::Tws => "tws",
            Statistic::Twd => "twd",
            Statistic::PortFoil => "port foil",
            Statistic::StbdFoil => "stbd foil",
            Statistic::BothFoils => "both foils",
            Statistic::Vmg => "vmg",
            Statistic::Twa => "twa",
            Statistic::TwaAbs => "twa_abs",
            Statistic::VmgTws => "vmg/tws",
        }
    }

    /// Axis unit label.
    pub fn unit(self) -> &'static str {
        match self {
            Statistic::Heading
            | Statistic::Heel
            | Statistic::Pitch
            | Statistic::Twd
            | Statistic::PortFoil
            | Statistic::StbdFoil
            | Statistic::BothFoils => "deg",
            Statistic::Height => "m",
            Statistic::Speed | Statistic::Tws | Statistic::Vmg => "kn",
            Statistic::Twa => "deg(-180:180)",
            Statistic::TwaAbs => "deg(0:180)",
            Statistic::VmgTws => "vmg/tws",
        }
    }

    pub fn is_derived(self) -> bool {
        matches!(
            self,
            Statistic::BothFoils
                | Statistic::Vmg
                | Statistic::Twa
                | Statistic::TwaAbs
                | Statistic::VmgTws
        )
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Statistic {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self> {
        if s == "both_foils" {
            return Ok(Statistic::BothFoils);
        }
        Statistic::ALL
            .iter()
            .copied()
            .find(|stat| stat.name() == s)
            .ok_or_else(|| StatsError::UnknownStatistic(s.to_string()))
    }
}

/// Where a raw statistic lives in the boat feed and how it is scaled.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSpec {
    pub key: String,
    pub multiplier: f64,
}

/// Immutable name → raw channel mapping captured by the engine.
#[derive(Debug, Clone)]
pub struct StatTable {
    channels: HashMap<Statistic, ChannelSpec>,
}

impl StatTable {
    pub fn empty() -> Self {
        Self {
            channels: HashMap::new(),
        }
    }

    /// Channel layout of the America's Cup race feed.
    pub fn americas_cup() -> Self {
        Self::empty()
            .with_channel(Statistic::Heading, HEADING_KEY, 1.0)
            .with_channel(Statistic::Heel, HEEL_KEY, 1.0)
            .with_channel(Statistic::Pitch, PITCH_KEY, 1.0)
            .with_channel(Statistic::Height, HEIGHT_KEY, 1.0)
            .with_channel(Statistic::Speed, SPEED_KEY, 1.0)
            .with_channel(Statistic::Tws, TWS_KEY, KNOTS_PER_MPS)
            .with_channel(Statistic::Twd, TWD_KEY, 1.0)
            .with_channel(Statistic::PortFoil, PORT_FOIL_KEY, 1.0)
            .with_channel(Statistic::StbdFoil, STBD_FOIL_KEY, 1.0)
    }

    pub fn with_channel(mut self, stat: Statistic, key: &str, multiplier: f64) -> Self {
        self.channels.insert(
            stat,
            ChannelSpec {
                key: key.to_string(),
                multiplier,
            },
        );
        self
    }

    pub fn channel(&self, stat: Statistic) -> Result<&ChannelSpec> {
        self.channels
            .get(&stat)
            .ok_or_else(|| StatsError::UnknownStatistic(stat.name().to_string()))
    }
}

impl Default for StatTable {
    fn default() -> Self {
        Self::americas_cup()
    }
}

/// Stateless producer of named statistics for a boat.
#[derive(Debug, Clone, Default)]
pub struct StatsEngine {
    table: StatTable,
}

impl StatsEngine {
    pub fn new(table: StatTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &StatTable {
        &self.table
    }

    /// Looks up a statistic by its dashboard name.
    pub fn stat_by_name(&self, name: &str, boat: &BoatRecord) -> Result<DerivedSeries> {
        self.stat(name.parse()?, boat)
    }

    pub fn stat(&self, stat: Statistic, boat: &BoatRecord) -> Result<DerivedSeries> {
        let series = match stat {
            Statistic::Heading
            | Statistic::Heel
            | Statistic::Pitch
            | Statistic::Height
            | Statistic::Speed
            | Statistic::Tws
            | Statistic::Twd
            | Statistic::PortFoil
            | Statistic::StbdFoil => self.raw(stat, boat)?,
            Statistic::BothFoils => self.both_foils(boat)?,
            Statistic::Vmg => self.vmg(boat)?,
            Statistic::Twa => self.twa(boat)?,
            Statistic::TwaAbs => self.twa_abs(boat)?,
            Statistic::VmgTws => self.vmg_tws(boat)?,
        };
        debug!("{} for team {}: {} samples", stat, boat.team_id, series.len());
        Ok(series)
    }

    /// Same as [`stat`](Self::stat) with x as seconds since the start gun.
    pub fn stat_elapsed(&self, stat: Statistic, boat: &BoatRecord) -> Result<DerivedSeries> {
        to_race_time(&self.stat(stat, boat)?, boat)
    }

    fn raw(&self, stat: Statistic, boat: &BoatRecord) -> Result<DerivedSeries> {
        let spec = self.table.channel(stat)?;
        let channel = boat.channel(&spec.key)?;
        let y = channel.values.iter().map(|v| v * spec.multiplier).collect();
        Ok(DerivedSeries::new(channel.timestamps.clone(), y))
    }

    pub fn twa(&self, boat: &BoatRecord) -> Result<DerivedSeries> {
        let twd = self.raw(Statistic::Twd, boat)?;
        let cog = self.raw(Statistic::Heading, boat)?;

        let x = uniform_axis(&cog.x);
        if x.is_empty() {
            return Err(StatsError::InsufficientData(
                "heading spans less than one second".into(),
            ));
        }

        let twd = interp(&x, &twd.x, &twd.y);
        let cog = interp(&x, &cog.x, &cog.y);
        let y = twd
            .iter()
            .zip(&cog)
            .map(|(wind, course)| normalize_angle(wind - course))
            .collect();
        Ok(DerivedSeries::new(x, y))
    }

    pub fn twa_abs(&self, boat: &BoatRecord) -> Result<DerivedSeries> {
        let twa = self.twa(boat)?;
        Ok(DerivedSeries::new(
            twa.x.iter().map(|t| t.abs()).collect(),
            twa.y.iter().map(|a| a.abs()).collect(),
        ))
    }

    pub fn vmg(&self, boat: &BoatRecord) -> Result<DerivedSeries> {
        let twa = self.twa_abs(boat)?;
        let sog = self.raw(Statistic::Speed, boat)?;

        // twa_abs guarantees a non-empty axis
        let x = linspace(twa.x[0], twa.x[twa.x.len() - 1], twa.x.len());
        let sog = interp(&x, &sog.x, &sog.y);
        let mut y: Vec<f64> = twa
            .y
            .iter()
            .zip(&sog)
            .map(|(angle, speed)| angle.to_radians().cos() * speed)
            .collect();
        flip_upwind_legs(&x, &mut y, &boat.legs);
        Ok(DerivedSeries::new(x, y))
    }

    /// Starboard then port, laid end to end. The x axis is not monotonic.
    pub fn both_foils(&self, boat: &BoatRecord) -> Result<DerivedSeries> {
        let mut both = self.raw(Statistic::StbdFoil, boat)?;
        let port = self.raw(Statistic::PortFoil, boat)?;
        both.x.extend(port.x);
        both.y.extend(port.y);
        Ok(both)
    }

    /// VMG over true wind speed. Zero wind yields non-finite values.
    pub fn vmg_tws(&self, boat: &BoatRecord) -> Result<DerivedSeries> {
        let vmg = self.vmg(boat)?;
        let tws = self.raw(Statistic::Tws, boat)?;
        let tws = interp(&vmg.x, &tws.x, &tws.y);
        let y = vmg.y.iter().zip(&tws).map(|(v, w)| v / w).collect();
        Ok(DerivedSeries::new(vmg.x, y))
    }
}

/// Re-expresses x as seconds since the boat's start gun.
pub fn to_race_time(series: &DerivedSeries, boat: &BoatRecord) -> Result<DerivedSeries> {
    Ok(series.shifted(boat.legs.race_start()?))
}

/// Folds a wind-minus-course difference into (-180, 180].
fn normalize_angle(mut angle: f64) -> f64 {
    if angle < 0.0 {
        angle += 360.0;
    }
    if angle > 180.0 {
        angle -= 360.0;
    }
    angle
}

/// Negates samples strictly inside every even leg, except the one opened by
/// the final transition. The first transition is never considered.
fn flip_upwind_legs(x: &[f64], y: &mut [f64], legs: &LegHistory) {
    let marks = legs.marks();
    for i in 1..marks.len().saturating_sub(1) {
        if marks[i].leg.rem_euclid(2) != 0 {
            continue;
        }
        let (start, end) = (marks[i].timestamp, marks[i + 1].timestamp);
        for (t, v) in x.iter().zip(y.iter_mut()) {
            if *t > start && *t < end {
                *v = -*v;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn constant(value: f64, from: f64, to: f64, step: f64) -> Vec<(f64, f64)> {
        let mut out = Vec::new();
        let mut t = from;
        while t <= to {
            out.push((value, t));
            t += step;
        }
        out
    }

    fn race_boat() -> BoatRecord {
        BoatRecord::new("1")
            .with_channel(HEADING_KEY, &constant(0.0, 0.0, 300.0, 1.0))
            .with_channel(TWD_KEY, &constant(0.0, 0.0, 300.0, 2.5))
            .with_channel(SPEED_KEY, &constant(10.0, 0.0, 300.0, 0.7))
            .with_legs(&[(0.0, 0.0), (1.0, 0.0), (2.0, 100.0), (3.0, 200.0), (4.0, 300.0)])
    }

    fn random_boat(rng: &mut StdRng) -> BoatRecord {
        let mut heading = Vec::new();
        let mut twd = Vec::new();
        let mut t = 1_000.0;
        for _ in 0..400 {
            heading.push((rng.gen_range(0.0..360.0), t));
            t += rng.gen_range(0.2..3.0);
        }
        let mut t = 990.0;
        while t < 2_500.0 {
            twd.push((rng.gen_range(0.0..360.0), t));
            t += rng.gen_range(0.5..10.0);
        }
        BoatRecord::new("7")
            .with_channel(HEADING_KEY, &heading)
            .with_channel(TWD_KEY, &twd)
    }

    #[test]
    fn parses_dashboard_names() {
        for stat in Statistic::ALL {
            assert_eq!(stat.name().parse::<Statistic>().unwrap(), stat);
        }
        assert_eq!("both_foils".parse::<Statistic>().unwrap(), Statistic::BothFoils);
        assert!(matches!(
            "cvmg".parse::<Statistic>(),
            Err(StatsError::UnknownStatistic(name)) if name == "cvmg"
        ));
    }

    #[test]
    fn unknown_name_is_recoverable() {
        let engine = StatsEngine::default();
        let err = engine.stat_by_name("boatspeed", &race_boat()).unwrap_err();
        assert!(matches!(err, StatsError::UnknownStatistic(_)));
    }

    #[test]
    fn tws_is_converted_to_knots() {
        let boat = BoatRecord::new("1").with_channel(TWS_KEY, &[(10.0, 5.0), (10.0, 6.0)]);
        let tws = StatsEngine::default().stat_by_name("tws", &boat).unwrap();
        assert_eq!(tws.x, vec![5.0, 6.0]);
        assert!((tws.y[0] - 19.4384).abs() < 1e-9);
    }

    #[test]
    fn other_raw_channels_pass_through() {
        let pairs = [(3.5, 1.0), (-2.0, 4.0)];
        let boat = BoatRecord::new("1").with_channel(HEEL_KEY, &pairs);
        let heel = StatsEngine::default().stat(Statistic::Heel, &boat).unwrap();
        assert_eq!(heel, DerivedSeries::new(vec![1.0, 4.0], vec![3.5, -2.0]));
    }

    #[test]
    fn repeated_calls_are_identical() {
        let engine = StatsEngine::default();
        let boat = race_boat();
        assert_eq!(
            engine.stat(Statistic::Heading, &boat).unwrap(),
            engine.stat(Statistic::Heading, &boat).unwrap()
        );
        assert_eq!(
            engine.stat(Statistic::Vmg, &boat).unwrap(),
            engine.stat(Statistic::Vmg, &boat).unwrap()
        );
    }

    #[test]
    fn twa_stays_within_half_turn() {
        let engine = StatsEngine::default();
        let mut rng = StdRng::seed_from_u64(36);
        for _ in 0..50 {
            let boat = random_boat(&mut rng);
            let twa = engine.twa(&boat).unwrap();
            assert!(!twa.is_empty());
            assert!(twa.y.iter().all(|a| *a > -180.0 && *a <= 180.0));

            let abs = engine.twa_abs(&boat).unwrap();
            assert_eq!(abs.x, twa.x);
            assert!(abs.y.iter().all(|a| *a >= 0.0));
        }
    }

    #[test]
    fn twa_wraps_across_north() {
        let boat = BoatRecord::new("1")
            .with_channel(HEADING_KEY, &[(350.0, 0.0), (350.0, 10.0)])
            .with_channel(TWD_KEY, &[(10.0, 0.0), (10.0, 10.0)]);
        let twa = StatsEngine::default().twa(&boat).unwrap();
        assert_eq!(twa.len(), 10);
        assert!(twa.y.iter().all(|a| (*a - 20.0).abs() < 1e-9));

        let boat = BoatRecord::new("1")
            .with_channel(HEADING_KEY, &[(10.0, 0.0), (10.0, 10.0)])
            .with_channel(TWD_KEY, &[(350.0, 0.0), (350.0, 10.0)]);
        let twa = StatsEngine::default().twa(&boat).unwrap();
        assert!(twa.y.iter().all(|a| (*a + 20.0).abs() < 1e-9));

        assert_eq!(normalize_angle(180.0), 180.0);
        assert_eq!(normalize_angle(-180.0), 180.0);
    }

    #[test]
    fn twa_needs_heading_and_wind() {
        let engine = StatsEngine::default();
        let boat = BoatRecord::new("1").with_channel(HEADING_KEY, &[(0.0, 0.0), (0.0, 10.0)]);
        assert!(matches!(engine.twa(&boat), Err(StatsError::InsufficientData(_))));

        let short = BoatRecord::new("1")
            .with_channel(HEADING_KEY, &[(0.0, 0.0), (0.0, 0.5)])
            .with_channel(TWD_KEY, &[(0.0, 0.0)]);
        assert!(matches!(engine.twa(&short), Err(StatsError::InsufficientData(_))));
    }

    #[test]
    fn vmg_is_negated_inside_upwind_legs_only() {
        let vmg = StatsEngine::default().vmg(&race_boat()).unwrap();
        assert_eq!(vmg.len(), 300);

        for (t, v) in vmg.x.iter().zip(&vmg.y) {
            if *t > 100.0 && *t < 200.0 {
                assert!((*v + 10.0).abs() < 1e-9, "t={} v={}", t, v);
            } else {
                assert!((*v - 10.0).abs() < 1e-9, "t={} v={}", t, v);
            }
        }
    }

    #[test]
    fn vmg_ignores_legs_on_boundaries() {
        let x = [100.0, 150.0, 200.0, 250.0, 300.0];
        let mut y = [1.0; 5];
        let legs =
            LegHistory::from_pairs(&[(0.0, 0.0), (2.0, 100.0), (3.0, 200.0), (4.0, 250.0)]);
        flip_upwind_legs(&x, &mut y, &legs);
        // leg 2 opens at 100 (strict), final leg 4 is never flipped
        assert_eq!(y, [1.0, -1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn vmg_needs_speed_over_ground() {
        let boat = BoatRecord::new("1")
            .with_channel(HEADING_KEY, &[(0.0, 0.0), (0.0, 20.0)])
            .with_channel(TWD_KEY, &[(45.0, 0.0), (45.0, 20.0)]);
        let engine = StatsEngine::default();
        assert!(matches!(engine.vmg(&boat), Err(StatsError::InsufficientData(_))));
        assert!(matches!(
            engine.stat(Statistic::VmgTws, &boat),
            Err(StatsError::InsufficientData(_))
        ));
    }

    #[test]
    fn vmg_uses_cosine_of_wind_angle() {
        let boat = BoatRecord::new("1")
            .with_channel(HEADING_KEY, &[(0.0, 0.0), (0.0, 20.0)])
            .with_channel(TWD_KEY, &[(120.0, 0.0), (120.0, 20.0)])
            .with_channel(SPEED_KEY, &[(30.0, 0.0), (30.0, 20.0)]);
        let vmg = StatsEngine::default().vmg(&boat).unwrap();
        assert!(vmg.y.iter().all(|v| (*v + 15.0).abs() < 1e-9));
    }

    #[test]
    fn both_foils_concatenates_without_sorting() {
        let stbd = [(1.0, 10.0), (2.0, 11.0), (3.0, 12.0), (4.0, 13.0), (5.0, 14.0)];
        let port = [(-1.0, 10.5), (-2.0, 11.5), (-3.0, 12.5)];
        let boat = BoatRecord::new("1")
            .with_channel(STBD_FOIL_KEY, &stbd)
            .with_channel(PORT_FOIL_KEY, &port);

        let both = StatsEngine::default().stat_by_name("both foils", &boat).unwrap();
        assert_eq!(both.len(), 8);
        assert_eq!(both.y, vec![1.0, 2.0, 3.0, 4.0, 5.0, -1.0, -2.0, -3.0]);
        assert_eq!(both.x, vec![10.0, 11.0, 12.0, 13.0, 14.0, 10.5, 11.5, 12.5]);
        // x drops back at the seam
        assert!(both.x[5] < both.x[4]);
    }

    #[test]
    fn vmg_over_tws_divides_by_knots() {
        let boat = race_boat().with_channel(TWS_KEY, &constant(5.0, 0.0, 300.0, 3.0));
        let engine = StatsEngine::default();
        let ratio = engine.vmg_tws(&boat).unwrap();
        let vmg = engine.vmg(&boat).unwrap();
        assert_eq!(ratio.x, vmg.x);
        let tws = 5.0 * KNOTS_PER_MPS;
        for (r, v) in ratio.y.iter().zip(&vmg.y) {
            assert!((r - v / tws).abs() < 1e-12);
        }
    }

    #[test]
    fn vmg_over_calm_wind_is_not_finite() {
        let boat = race_boat().with_channel(TWS_KEY, &[(0.0, 0.0), (0.0, 300.0)]);
        let ratio = StatsEngine::default().vmg_tws(&boat).unwrap();
        assert!(ratio.y.iter().all(|r| !r.is_finite()));
    }

    #[test]
    fn race_time_is_relative_to_start_gun() {
        let boat = BoatRecord::new("1")
            .with_channel(SPEED_KEY, &[(1.0, 1000.0), (2.0, 1010.0), (3.0, 1050.0)])
            .with_legs(&[(0.0, 900.0), (1.0, 1000.0)]);
        let engine = StatsEngine::default();

        let speed = engine.stat_elapsed(Statistic::Speed, &boat).unwrap();
        assert_eq!(speed.x, vec![0.0, 10.0, 50.0]);
        assert_eq!(speed.y, vec![1.0, 2.0, 3.0]);

        let no_start = BoatRecord::new("1").with_channel(SPEED_KEY, &[(1.0, 1000.0)]);
        assert!(engine.stat_elapsed(Statistic::Speed, &no_start).is_err());
    }

    #[test]
    fn custom_table_replaces_channel_keys() {
        let table = StatTable::empty().with_channel(Statistic::Speed, "sog", 0.5);
        let engine = StatsEngine::new(table);
        let boat = BoatRecord::new("1").with_channel("sog", &[(4.0, 0.0)]);
        assert_eq!(engine.stat(Statistic::Speed, &boat).unwrap().y, vec![2.0]);
        assert!(matches!(
            engine.stat(Statistic::Heel, &boat),
            Err(StatsError::UnknownStatistic(_))
        ));
    }
}
