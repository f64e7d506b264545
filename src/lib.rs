//! bandforge: convert a dumphfdl system table into a JSON station and band table
//!
//! Stations are read from a libconfig system table; their frequencies are
//! grouped into bands of nearby frequencies shared across all stations.

pub mod bands;
pub mod cli;
pub mod convert;
pub mod error;
pub mod libconfig;
pub mod logging;
pub mod output;
pub mod station;

// Re-export public items for easier access
pub use bands::{cluster, BandTable, Placement, StationTable, BAND_PROXIMITY};
pub use cli::{Args, Verbosity};
pub use convert::{convert, Summary};
pub use error::ConvertError;
pub use station::{StationEntry, StationId, StationRecord};

/// Common result type used throughout the application
pub type Result<T> = anyhow::Result<T>;
