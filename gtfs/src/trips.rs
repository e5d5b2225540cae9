use std::collections::BTreeMap;

use anyhow::Result;
use serde::Deserialize;

use super::{orig, BlockID, TripShortName};

#[derive(Clone, Debug)]
pub struct Trip {
    pub orig_id: orig::TripID,
    /// Some feeds only fill this out for a subset of trips. Without it, AVL reports can't refer
    /// to the trip.
    pub short_name: Option<TripShortName>,
    pub block_id: Option<BlockID>,
}

pub fn load<R: std::io::Read>(reader: R) -> Result<BTreeMap<orig::TripID, Trip>> {
    let mut trips = BTreeMap::new();
    for rec in csv::Reader::from_reader(reader).deserialize() {
        let rec: Record = rec?;
        if trips.contains_key(&rec.trip_id) {
            bail!("Duplicate {:?}", rec.trip_id);
        }
        trips.insert(
            rec.trip_id.clone(),
            Trip {
                orig_id: rec.trip_id,
                short_name: rec.trip_short_name,
                block_id: rec.block_id,
            },
        );
    }
    Ok(trips)
}

#[derive(Deserialize)]
struct Record {
    trip_id: orig::TripID,
    trip_short_name: Option<TripShortName>,
    block_id: Option<BlockID>,
}
