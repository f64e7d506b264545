//! Frequency band inference
//!
//! Frequencies of all stations are grouped into bands: a frequency joins the
//! first band (in ascending key order) whose lowest frequency lies within
//! [`BAND_PROXIMITY`] of it, otherwise it opens a new band keyed by its
//! value in thousands.

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};

use crate::station::{StationEntry, StationRecord};

/// Largest distance from a band's lowest frequency that still joins the band
pub const BAND_PROXIMITY: u64 = 660;

/// Station entries keyed by station name, in first-seen order
pub type StationTable = IndexMap<String, StationEntry>;

/// Key of a band opened by `freq`: its value in thousands, truncated toward zero
pub fn band_key(freq: i64) -> i64 {
    freq / 1000
}

/// Outcome of placing one frequency into a [`BandTable`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Added to an existing band
    Joined { key: i64 },
    /// Opened a new band
    Created { key: i64 },
    /// Opened a new band whose key was already taken by a band it did not
    /// match; that band's frequencies are dropped
    Replaced { key: i64, displaced: Vec<i64> },
}

impl Placement {
    pub fn key(&self) -> i64 {
        match self {
            Placement::Joined { key }
            | Placement::Created { key }
            | Placement::Replaced { key, .. } => *key,
        }
    }
}

/// Bands keyed by band key, in creation order. Every band holds at least
/// one frequency and is kept sorted ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BandTable {
    bands: IndexMap<i64, Vec<i64>>,
}

impl BandTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a single frequency. Bands are tried in ascending key order
    /// against their current lowest frequency; the first within range wins.
    pub fn place(&mut self, freq: i64) -> Placement {
        let mut keys: Vec<i64> = self.bands.keys().copied().collect();
        keys.sort_unstable();

        for key in keys {
            let Some(band) = self.bands.get_mut(&key) else {
                continue;
            };
            let Some(&lowest) = band.first() else {
                continue;
            };
            if freq.abs_diff(lowest) <= BAND_PROXIMITY {
                let at = band.partition_point(|&f| f <= freq);
                band.insert(at, freq);
                return Placement::Joined { key };
            }
        }

        let key = band_key(freq);
        match self.bands.insert(key, vec![freq]) {
            Some(displaced) => Placement::Replaced { key, displaced },
            None => Placement::Created { key },
        }
    }

    pub fn get(&self, key: i64) -> Option<&[i64]> {
        self.bands.get(&key).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Bands in creation order
    pub fn iter(&self) -> impl Iterator<Item = (i64, &[i64])> {
        self.bands.iter().map(|(key, band)| (*key, band.as_slice()))
    }

    /// Band keys in ascending order
    pub fn sorted_keys(&self) -> Vec<i64> {
        let mut keys: Vec<i64> = self.bands.keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    /// Total number of frequencies across all bands
    pub fn frequency_count(&self) -> usize {
        self.bands.values().map(Vec::len).sum()
    }
}

/// Build the station table and the shared band table from stations in
/// table order. A later station with an already seen name replaces the
/// earlier entry.
pub fn cluster(stations: &[StationRecord]) -> (StationTable, BandTable) {
    let mut table = StationTable::new();
    let mut bands = BandTable::new();

    for station in stations {
        if table
            .insert(station.name.clone(), station.entry())
            .is_some()
        {
            debug!(name = %station.name, "duplicate station name, keeping the later entry");
        }

        let mut frequencies = station.frequencies.clone();
        frequencies.sort_unstable();

        for freq in frequencies {
            match bands.place(freq) {
                Placement::Joined { key } => {
                    debug!(station = %station.name, freq, band = key, "joined band");
                }
                Placement::Created { key } => {
                    debug!(station = %station.name, freq, band = key, "created band");
                }
                Placement::Replaced { key, displaced } => {
                    warn!(
                        station = %station.name,
                        freq,
                        band = key,
                        "band key collision, dropping frequencies {:?}",
                        displaced
                    );
                }
            }
        }
    }

    debug!(
        stations = table.len(),
        bands = bands.len(),
        frequencies = bands.frequency_count(),
        "clustered frequencies"
    );

    (table, bands)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::station::{Coordinate, StationId};
    use proptest::prelude::*;

    fn station(name: &str, frequencies: &[i64]) -> StationRecord {
        StationRecord {
            id: StationId::Int(1),
            name: name.to_string(),
            lon: Coordinate::Float(10.0),
            lat: Coordinate::Float(20.0),
            frequencies: frequencies.to_vec(),
        }
    }

    #[test]
    fn test_single_station_scenario() {
        let (table, bands) = cluster(&[station("A", &[100500, 100600, 200000])]);

        assert_eq!(table["A"].wkt_coords, "POINT (10.0 20.0)");
        assert_eq!(bands.sorted_keys(), vec![100, 200]);
        assert_eq!(bands.get(100), Some(&[100500, 100600][..]));
        assert_eq!(bands.get(200), Some(&[200000][..]));
    }

    #[test]
    fn test_distant_frequencies_do_not_share_a_band() {
        let (_, bands) = cluster(&[station("A", &[50000]), station("B", &[51000])]);
        assert_eq!(bands.len(), 2);
        assert_eq!(bands.get(50), Some(&[50000][..]));
        assert_eq!(bands.get(51), Some(&[51000][..]));
    }

    #[test]
    fn test_key_collision_replaces_band() {
        // 700 apart, but both open key 50
        let (_, bands) = cluster(&[station("A", &[50000]), station("B", &[50700])]);
        assert_eq!(bands.len(), 1);
        assert_eq!(bands.get(50), Some(&[50700][..]));

        let mut bands = BandTable::new();
        bands.place(50000);
        assert_eq!(
            bands.place(50700),
            Placement::Replaced {
                key: 50,
                displaced: vec![50000],
            }
        );
    }

    #[test]
    fn test_proximity_is_inclusive() {
        let mut bands = BandTable::new();
        assert_eq!(bands.place(10000), Placement::Created { key: 10 });
        assert_eq!(bands.place(10660), Placement::Joined { key: 10 });
        assert_eq!(bands.place(9340), Placement::Joined { key: 10 });
        assert_eq!(bands.get(10), Some(&[9340, 10000, 10660][..]));
    }

    #[test]
    fn test_representative_drifts_to_lowest() {
        let mut bands = BandTable::new();
        bands.place(10000);
        bands.place(9400);
        // 10100 is within 660 of the creation value but not of the new lowest
        assert_eq!(
            bands.place(10100),
            Placement::Replaced {
                key: 10,
                displaced: vec![9400, 10000],
            }
        );
        assert_eq!(bands.get(10), Some(&[10100][..]));
    }

    #[test]
    fn test_first_band_in_key_order_wins() {
        let mut bands = BandTable::new();
        bands.place(2000);
        bands.place(3000);
        // 640 from band 2, 360 from band 3; the lower key wins
        assert_eq!(bands.place(2640), Placement::Joined { key: 2 });
        assert_eq!(bands.get(2), Some(&[2000, 2640][..]));
        assert_eq!(bands.get(3), Some(&[3000][..]));
    }

    #[test]
    fn test_negative_frequencies_truncate_toward_zero() {
        let mut bands = BandTable::new();
        assert_eq!(bands.place(-1500), Placement::Created { key: -1 });
        assert_eq!(band_key(-999), 0);
    }

    #[test]
    fn test_duplicate_frequencies_share_a_band() {
        let (_, bands) = cluster(&[station("A", &[8912, 8912]), station("B", &[8912])]);
        assert_eq!(bands.get(8), Some(&[8912, 8912, 8912][..]));
    }

    #[test]
    fn test_duplicate_station_name_keeps_last() {
        let mut second = station("A", &[]);
        second.id = StationId::Int(2);
        let (table, _) = cluster(&[station("A", &[]), station("B", &[]), second]);

        assert_eq!(table.len(), 2);
        assert_eq!(table["A"].id, StationId::Int(2));
        let names: Vec<&str> = table.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_station_frequencies_visited_in_ascending_order() {
        // 11000 first would open band 11 and let 10500 join it
        let (_, bands) = cluster(&[station("A", &[11000, 10500])]);
        assert_eq!(bands.iter().next(), Some((10, &[10500, 11000][..])));
    }

    proptest! {
        #[test]
        fn prop_bands_stay_sorted(freqs in prop::collection::vec(0i64..100_000, 0..60)) {
            let mut bands = BandTable::new();
            for freq in freqs {
                bands.place(freq);
                for (_, band) in bands.iter() {
                    prop_assert!(!band.is_empty());
                    prop_assert!(band.windows(2).all(|w| w[0] <= w[1]));
                }
            }
        }

        #[test]
        fn prop_no_frequency_lost_without_collision(
            stations in prop::collection::vec(prop::collection::vec(0i64..2_000_000, 0..6), 1..5)
        ) {
            let mut bands = BandTable::new();
            let mut expected = Vec::new();
            let mut collided = false;
            for freqs in &stations {
                let mut freqs = freqs.clone();
                freqs.sort_unstable();
                for freq in freqs {
                    collided |= matches!(bands.place(freq), Placement::Replaced { .. });
                    expected.push(freq);
                }
            }
            prop_assume!(!collided);

            let mut seen: Vec<i64> = bands.iter().flat_map(|(_, band)| band.iter().copied()).collect();
            seen.sort_unstable();
            expected.sort_unstable();
            prop_assert_eq!(seen, expected);
        }

        #[test]
        fn prop_close_pair_shares_band(base in 0i64..1_000_000, offset in 0i64..=660) {
            let mut bands = BandTable::new();
            let first = bands.place(base);
            let second = bands.place(base + offset);
            prop_assert_eq!(second, Placement::Joined { key: first.key() });
            prop_assert_eq!(bands.len(), 1);
        }

        #[test]
        fn prop_distant_pair_splits(base in 0i64..1_000_000, offset in 661i64..100_000) {
            let mut bands = BandTable::new();
            bands.place(base);
            let second = bands.place(base + offset);
            prop_assert!(
                !matches!(second, Placement::Joined { .. }),
                "{} and {} ended up in one band",
                base,
                base + offset
            );
        }
    }
}
