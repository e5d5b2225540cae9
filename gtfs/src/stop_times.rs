use std::collections::BTreeMap;

use anyhow::Result;
use geom::Time;
use serde::Deserialize;

use super::orig;

#[derive(Clone, Debug)]
pub struct StopTime {
    pub arrival_time: Time,
    pub stop_sequence: usize,
}

/// Stop times per trip, sorted by stop_sequence. Stops without an arrival time (untimed stops
/// between timepoints) are skipped.
pub fn load<R: std::io::Read>(reader: R) -> Result<BTreeMap<orig::TripID, Vec<StopTime>>> {
    let mut stop_times = BTreeMap::new();
    for rec in csv::Reader::from_reader(reader).deserialize() {
        let rec: Record = rec?;
        let arrival_time = match rec.arrival_time {
            Some(x) if !x.trim().is_empty() => Time::parse(x.trim())?,
            _ => continue,
        };
        stop_times
            .entry(rec.trip_id)
            .or_insert_with(Vec::new)
            .push(StopTime {
                arrival_time,
                stop_sequence: rec.stop_sequence,
            });
    }

    // Sort by stop_sequence, in case the file isn't in order
    for list in stop_times.values_mut() {
        list.sort_by_key(|st: &StopTime| st.stop_sequence);
    }
    Ok(stop_times)
}

#[derive(Deserialize)]
struct Record {
    trip_id: orig::TripID,
    arrival_time: Option<String>,
    stop_sequence: usize,
}
