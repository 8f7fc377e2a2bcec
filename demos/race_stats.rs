// Example usage of the race statistics engine

use race_stats::{snapshot, RaceArchive, Result, Statistic, StatsEngine};
use tracing::{debug, info, warn, Level};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .init();

    let archive = RaceArchive::open("data")?;
    let engine = StatsEngine::default();

    info!("Available races: {:?}", archive.list_races()?);

    let race = archive.load_race("1")?;
    for boat in &race.boats {
        info!("{} (team {}, colour {})", boat.name, boat.team_id, boat.color);

        for stat in Statistic::ALL {
            match engine.stat_elapsed(stat, boat) {
                Ok(series) if !series.is_empty() => {
                    let last = series.len() - 1;
                    info!(
                        "  {:<10} {:>6} samples  {:>8.1}s .. {:>8.1}s  last={:.2} {}",
                        stat.name(),
                        series.len(),
                        series.x[0],
                        series.x[last],
                        series.y[last],
                        stat.unit()
                    );
                }
                Ok(_) => debug!("  {} is empty", stat),
                Err(e) => warn!("  {}: {}", stat, e),
            }
        }

        let snap = snapshot(&engine, boat)?;
        info!(
            "  snapshot: {} seconds from {}, {} legs",
            snap.x.len(),
            snap.race_start,
            snap.legs.len()
        );
    }

    Ok(())
}
