#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod ids;
mod stop_times;
pub mod supplement;
mod trips;

use std::collections::BTreeMap;

use anyhow::Result;
use zip::ZipArchive;

pub use ids::{orig, BlockID, TripShortName};
pub use stop_times::StopTime;
pub use supplement::SupplementTrip;
pub use trips::Trip;

/// The subset of a GTFS feed needed to reason about when trips are scheduled.
#[derive(Clone)]
pub struct GTFS {
    pub trips: BTreeMap<orig::TripID, Trip>,
    pub stop_times: BTreeMap<orig::TripID, Vec<StopTime>>,
}

impl GTFS {
    /// Reads from a directory containing the feed, or a .zip with the feed under `gtfs/`.
    pub fn load(path: &str) -> Result<Self> {
        if path.ends_with(".zip") {
            let mut archive = ZipArchive::new(fs_err::File::open(path)?)?;
            Self::load_from_zip(&mut archive)
        } else {
            Self::load_from_dir(path)
        }
    }

    pub fn load_from_dir(path: &str) -> Result<Self> {
        Self::from_readers(
            fs_err::File::open(format!("{path}/trips.txt"))?,
            fs_err::File::open(format!("{path}/stop_times.txt"))?,
        )
    }

    pub fn load_from_zip<R: std::io::Read + std::io::Seek>(
        archive: &mut ZipArchive<R>,
    ) -> Result<Self> {
        let trips = trips::load(get_zip_file(archive, "gtfs/trips.txt")?)?;
        let stop_times = stop_times::load(get_zip_file(archive, "gtfs/stop_times.txt")?)?;
        Ok(Self::new(trips, stop_times))
    }

    pub fn from_readers<R1: std::io::Read, R2: std::io::Read>(
        trips: R1,
        stop_times: R2,
    ) -> Result<Self> {
        Ok(Self::new(trips::load(trips)?, stop_times::load(stop_times)?))
    }

    fn new(
        trips: BTreeMap<orig::TripID, Trip>,
        stop_times: BTreeMap<orig::TripID, Vec<StopTime>>,
    ) -> Self {
        let unknown: Vec<&orig::TripID> = stop_times
            .keys()
            .filter(|id| !trips.contains_key(id))
            .collect();
        if !unknown.is_empty() {
            warn!("Stop times defined for unknown trips: {:?}", unknown);
        }

        let no_short_name = trips.values().filter(|t| t.short_name.is_none()).count();
        if no_short_name > 0 {
            warn!(
                "{} of {} trips have no trip_short_name",
                no_short_name,
                trips.len()
            );
        }
        let with_block = trips.values().filter(|t| t.block_id.is_some()).count();
        info!(
            "Loaded {} trips, {} already with a block_id",
            trips.len(),
            with_block
        );

        Self { trips, stop_times }
    }

    /// Only trips that have a short name are included.
    pub fn trip_short_names(&self) -> BTreeMap<orig::TripID, TripShortName> {
        self.trips
            .values()
            .filter_map(|trip| {
                trip.short_name
                    .clone()
                    .map(|name| (trip.orig_id.clone(), name))
            })
            .collect()
    }

    /// Every timed stop event, as (trip, arrival time).
    pub fn arrivals(&self) -> impl Iterator<Item = (&orig::TripID, geom::Time)> {
        self.stop_times
            .iter()
            .flat_map(|(id, list)| list.iter().map(move |st| (id, st.arrival_time)))
    }
}

// Adds the path in the error message
pub fn get_zip_file<'a, R: std::io::Read + std::io::Seek>(
    archive: &'a mut ZipArchive<R>,
    path: &str,
) -> Result<zip::read::ZipFile<'a>> {
    archive
        .by_name(path)
        .map_err(|err| anyhow!("{path}: {err}"))
}
