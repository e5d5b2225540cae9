use std::fmt;

use serde::{Deserialize, Serialize};

pub mod orig {
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
    pub struct TripID(String);

    impl TripID {
        pub fn new<I: Into<String>>(x: I) -> Self {
            Self(x.into())
        }
    }
}

/// The human-facing trip identifier. Operators type this into their terminals, so it's what AVL
/// reports refer to, not the GTFS trip_id.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TripShortName(String);

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockID(String);

impl TripShortName {
    pub fn new<I: Into<String>>(x: I) -> Self {
        Self(x.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl BlockID {
    pub fn new<I: Into<String>>(x: I) -> Self {
        Self(x.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TripShortName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for BlockID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
