//! End-to-end conversion of a system table file into the JSON document

use std::path::Path;
use tracing::{debug, info};

use crate::bands::cluster;
use crate::libconfig;
use crate::output::{write_json, SystemTable};
use crate::station::stations_from_config;

/// Counts reported after a successful conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub stations: usize,
    pub bands: usize,
    pub frequencies: usize,
}

/// Read `systable`, infer its bands and write the JSON document to `output`.
/// Nothing is written unless every station converts.
pub fn convert(systable: &Path, output: &Path) -> crate::Result<Summary> {
    debug!(input = %systable.display(), "loading system table");
    let config = libconfig::load(systable)?;

    let records = stations_from_config(&config)?;
    debug!(stations = records.len(), "read stations");

    let (stations, bands) = cluster(&records);
    write_json(
        output,
        &SystemTable {
            stations: &stations,
            bands: &bands,
        },
    )?;

    let summary = Summary {
        stations: stations.len(),
        bands: bands.len(),
        frequencies: bands.frequency_count(),
    };
    info!(
        output = %output.display(),
        stations = summary.stations,
        bands = summary.bands,
        frequencies = summary.frequencies,
        "converted system table"
    );
    Ok(summary)
}
