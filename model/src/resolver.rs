use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use gtfs::{BlockID, TripShortName};

/// The best known block for every trip, over all vehicles and days processed so far.
#[derive(Default)]
pub struct Resolver {
    trip_to_block: BTreeMap<TripShortName, BlockID>,
    // Every block ever accepted for a trip, once more than one was seen
    conflicts: BTreeMap<TripShortName, BTreeSet<BlockID>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    Inserted,
    Unchanged,
    /// The trip was previously assigned to a different block. The new one wins.
    Conflict { previous: BlockID },
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `trip` ran under `block`. Operators sometimes enter the wrong block and fix it
    /// later, so the most recent observation wins. Callers must apply one vehicle's assignments
    /// in time order.
    pub fn accept(&mut self, trip: &TripShortName, block: &BlockID, day: NaiveDate) -> Resolution {
        let previous = match self.trip_to_block.get(trip) {
            None => {
                self.trip_to_block.insert(trip.clone(), block.clone());
                return Resolution::Inserted;
            }
            Some(x) if x == block => {
                return Resolution::Unchanged;
            }
            Some(x) => x.clone(),
        };

        warn!(
            "Mismatched block for trip {trip}. It was {previous}, but on {day} it's {block}"
        );
        let blocks = self
            .conflicts
            .entry(trip.clone())
            .or_insert_with(BTreeSet::new);
        blocks.insert(block.clone());
        blocks.insert(previous.clone());
        self.trip_to_block.insert(trip.clone(), block.clone());
        Resolution::Conflict { previous }
    }

    pub fn block_for(&self, trip: &TripShortName) -> Option<&BlockID> {
        self.trip_to_block.get(trip)
    }

    pub fn trip_to_block(&self) -> &BTreeMap<TripShortName, BlockID> {
        &self.trip_to_block
    }

    /// Trips observed with more than one block
    pub fn conflicts(&self) -> &BTreeMap<TripShortName, BTreeSet<BlockID>> {
        &self.conflicts
    }
}
