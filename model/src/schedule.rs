use std::collections::BTreeMap;

use geom::Time;

use gtfs::{orig, TripShortName, GTFS};

/// When a trip is scheduled to run, over all of its stop times.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScheduleWindow {
    pub start: Time,
    pub end: Time,
}

/// Scheduled windows keyed by trip short name. Read-only once built.
pub struct ScheduleIndex {
    windows: BTreeMap<TripShortName, ScheduleWindow>,
}

impl ScheduleIndex {
    pub fn from_gtfs(gtfs: &GTFS) -> Self {
        build_schedule_index(&gtfs.trip_short_names(), gtfs.arrivals())
    }

    /// None means there's no schedule to judge an assignment against.
    pub fn get(&self, trip: &TripShortName) -> Option<ScheduleWindow> {
        self.windows.get(trip).copied()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

/// Stop times for trips without a short name are skipped. Several trip IDs may share one short
/// name (different service days, for instance); the window covers all of them. The result
/// doesn't depend on input order.
pub fn build_schedule_index<'a, I: IntoIterator<Item = (&'a orig::TripID, Time)>>(
    short_names: &BTreeMap<orig::TripID, TripShortName>,
    arrivals: I,
) -> ScheduleIndex {
    let mut windows: BTreeMap<TripShortName, ScheduleWindow> = BTreeMap::new();
    for (trip_id, time) in arrivals {
        let short_name = match short_names.get(trip_id) {
            Some(x) => x,
            None => continue,
        };
        if let Some(window) = windows.get_mut(short_name) {
            window.start = window.start.min(time);
            window.end = window.end.max(time);
        } else {
            windows.insert(
                short_name.clone(),
                ScheduleWindow {
                    start: time,
                    end: time,
                },
            );
        }
    }
    ScheduleIndex { windows }
}
