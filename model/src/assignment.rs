use std::fmt;

use gtfs::{BlockID, TripShortName};

/// Feed noise; a report with this trip code carries no assignment at all. Blocks use the same
/// code to mean "no block".
const PLACEHOLDER: &str = "000";
/// Operators enter this at the end of a trip, before picking the next one.
const END_OF_TRIP: &str = "9999";

/// Early data from the feed padded codes, so "dd00" actually means "dd". Applies the same way to
/// trip and block codes.
pub fn normalize(code: &str) -> &str {
    if code.chars().count() == 4 && code.ends_with("00") {
        if let Some((idx, _)) = code.char_indices().nth(2) {
            return &code[..idx];
        }
    }
    code
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TripCode {
    Placeholder,
    EndOfTrip,
    Trip(TripShortName),
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BlockCode {
    Unassigned,
    Block(BlockID),
}

/// The (trip, block) pair an operator entered, after normalization.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Assignment {
    pub trip: TripCode,
    pub block: BlockCode,
}

impl TripCode {
    /// An empty code is treated like the placeholder.
    pub fn parse(raw: &str) -> Self {
        match normalize(raw.trim()) {
            "" | PLACEHOLDER => TripCode::Placeholder,
            END_OF_TRIP => TripCode::EndOfTrip,
            x => TripCode::Trip(TripShortName::new(x)),
        }
    }

    pub fn short_name(&self) -> Option<&TripShortName> {
        match self {
            TripCode::Trip(x) => Some(x),
            _ => None,
        }
    }
}

impl BlockCode {
    pub fn parse(raw: &str) -> Self {
        match normalize(raw.trim()) {
            "" | PLACEHOLDER => BlockCode::Unassigned,
            x => BlockCode::Block(BlockID::new(x)),
        }
    }

    pub fn is_assigned(&self) -> bool {
        matches!(self, BlockCode::Block(_))
    }
}

impl Assignment {
    pub fn from_raw(trip: &str, block: &str) -> Self {
        Self {
            trip: TripCode::parse(trip),
            block: BlockCode::parse(block),
        }
    }

    /// The pair that may be recorded for the trip. End-of-trip markers and missing blocks never
    /// are, even if the assignment looks trustworthy.
    pub fn resolvable(&self) -> Option<(&TripShortName, &BlockID)> {
        match (&self.trip, &self.block) {
            (TripCode::Trip(trip), BlockCode::Block(block)) => Some((trip, block)),
            _ => None,
        }
    }
}

impl fmt::Display for TripCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TripCode::Placeholder => write!(f, "{PLACEHOLDER}"),
            TripCode::EndOfTrip => write!(f, "{END_OF_TRIP}"),
            TripCode::Trip(x) => write!(f, "{x}"),
        }
    }
}

impl fmt::Display for BlockCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BlockCode::Unassigned => write!(f, "{PLACEHOLDER}"),
            BlockCode::Block(x) => write!(f, "{x}"),
        }
    }
}
