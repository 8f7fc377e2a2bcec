pub mod cache;
pub mod compression;
pub mod constants;
pub mod data_handle;
pub mod error;
pub mod format;
pub mod interp;
pub mod reader;
pub mod snapshot;
pub mod stats;
