// America's Cup race statistics
// Main library entry point

pub mod core;

// Re-export main types
pub use crate::core::cache::{SeriesCache, SeriesKey};
pub use crate::core::data_handle::handle_ws_fetch;
pub use crate::core::error::{Result, StatsError};
pub use crate::core::format::{BoatRecord, DerivedSeries, LegHistory, LegMark, RaceManifest, RawChannel};
pub use crate::core::reader::{RaceArchive, RaceData};
pub use crate::core::snapshot::{snapshot, BoatSnapshot};
pub use crate::core::stats::{to_race_time, StatTable, Statistic, StatsEngine};
