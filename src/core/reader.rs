// Race archive reader: <root>/<race>/{stats.json, boat1.json, boat2.json}

use crate::core::compression::decompress;
use crate::core::constants::*;
use crate::core::error::{Result, StatsError};
use crate::core::format::{BoatRecord, RaceManifest};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One race with both boats' identities resolved from the manifest.
#[derive(Debug, Clone)]
pub struct RaceData {
    pub race: String,
    pub manifest: RaceManifest,
    pub boats: Vec<BoatRecord>,
}

impl RaceData {
    /// Boats are addressed by their archive slot, "1" or "2".
    pub fn boat(&self, id: &str) -> Option<&BoatRecord> {
        let slot: usize = id.parse().ok()?;
        self.boats.get(slot.checked_sub(1)?)
    }
}

pub struct RaceArchive {
    root: PathBuf,
}

impl RaceArchive {
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(StatsError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("race archive {} is not a directory", root.display()),
            )));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Race directories, numbered races in numeric order first.
    pub fn list_races(&self) -> Result<Vec<String>> {
        let mut races = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                races.push(name.to_string());
            }
        }

        races.sort_by(|a, b| match (a.parse::<u32>(), b.parse::<u32>()) {
            (Ok(x), Ok(y)) => x.cmp(&y),
            (Ok(_), Err(_)) => std::cmp::Ordering::Less,
            (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
            (Err(_), Err(_)) => a.cmp(b),
        });
        Ok(races)
    }

    fn race_dir(&self, race: &str) -> Result<PathBuf> {
        // race ids come from URLs, keep them inside the archive
        if race.is_empty() || race.contains(['/', '\\']) || race == ".." || race == "." {
            return Err(StatsError::RaceNotFound(race.to_string()));
        }
        let dir = self.root.join(race);
        if !dir.is_dir() {
            return Err(StatsError::RaceNotFound(race.to_string()));
        }
        Ok(dir)
    }

    pub fn read_manifest(&self, race: &str) -> Result<RaceManifest> {
        let path = self.race_dir(race)?.join(MANIFEST_FILE);
        debug!("Reading manifest {}", path.display());
        RaceManifest::from_json(&fs::read(&path)?)
    }

    /// Reads `boat<slot>` in whichever compression it was archived with.
    pub fn read_boat(&self, race: &str, stem: &str) -> Result<BoatRecord> {
        let dir = self.race_dir(race)?;
        for compression in CompressionType::ALL {
            let path = dir.join(format!("{}{}", stem, compression.file_suffix()));
            if !path.is_file() {
                continue;
            }
            debug!("Reading boat {} ({:?})", path.display(), compression);
            let raw = fs::read(&path)?;
            let data = decompress(&raw, compression)?;
            return BoatRecord::from_json(&data);
        }
        Err(StatsError::InsufficientData(format!(
            "race {} has no {} file",
            race, stem
        )))
    }

    pub fn load_race(&self, race: &str) -> Result<RaceData> {
        let manifest = self.read_manifest(race)?;

        let mut boats = Vec::with_capacity(BOAT_FILE_STEMS.len());
        for stem in BOAT_FILE_STEMS {
            let mut boat = self.read_boat(race, stem)?;
            manifest.resolve_identity(&mut boat)?;
            boats.push(boat);
        }

        info!(
            "Loaded race {}: {}",
            race,
            boats
                .iter()
                .map(|b| b.name.as_str())
                .collect::<Vec<_>>()
                .join(" vs ")
        );

        Ok(RaceData {
            race: race.to_string(),
            manifest,
            boats,
        })
    }
}
