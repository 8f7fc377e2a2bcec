// Feed constants for America's Cup race telemetry

use std::path::Path;

/// m/s to knots, applied to the true wind speed channel.
pub const KNOTS_PER_MPS: f64 = 1.94384;

// Raw channel keys as they appear in the boat feed ("headingIntep" is the feed's spelling)
pub const HEADING_KEY: &str = "headingIntep";
pub const HEEL_KEY: &str = "heelInterp";
pub const PITCH_KEY: &str = "pitchInterp";
pub const HEIGHT_KEY: &str = "elevInterp";
pub const SPEED_KEY: &str = "speedInterp";
pub const TWS_KEY: &str = "twsInterp";
pub const TWD_KEY: &str = "twdInterp";
pub const PORT_FOIL_KEY: &str = "leftFoilPosition";
pub const STBD_FOIL_KEY: &str = "rightFoilPosition";
pub const LEG_KEY: &str = "legInterp";
pub const TEAM_ID_KEY: &str = "teamId";
pub const HISTORY_KEY: &str = "valHistory";

// Race archive layout: <root>/<race>/{stats.json, boat1.json, boat2.json}
pub const MANIFEST_FILE: &str = "stats.json";
pub const BOAT_FILE_STEMS: [&str; 2] = ["boat1", "boat2"];

// Compression codes for archived boat files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionType {
    None,
    Zlib,
    Lz4,
    Zstd,
}

impl CompressionType {
    /// Lookup order when probing the archive for a boat file.
    pub const ALL: [CompressionType; 4] = [
        CompressionType::None,
        CompressionType::Zlib,
        CompressionType::Lz4,
        CompressionType::Zstd,
    ];

    pub fn file_suffix(self) -> &'static str {
        match self {
            CompressionType::None => ".json",
            CompressionType::Zlib => ".json.zz",
            CompressionType::Lz4 => ".json.lz4",
            CompressionType::Zstd => ".json.zst",
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        Self::ALL
            .iter()
            .copied()
            .find(|c| name.ends_with(c.file_suffix()))
    }
}
