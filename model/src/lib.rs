//! Infers which block each scheduled trip actually ran under, using historical AVL reports with
//! operator-entered (and often wrong) trip and block codes.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod assignment;
mod avl;
mod heuristic;
mod infer;
mod report;
mod resolver;
mod schedule;
mod segment;

use serde::Deserialize;

pub use self::assignment::{normalize, Assignment, BlockCode, TripCode};
pub use self::avl::{local_to_utc, time_of_day, AvlArchive, LocationReport, ReportSource};
pub use self::heuristic::{Decision, Evaluation, Evaluator, Policy};
pub use self::infer::{service_day_bounds, BlockInference, DaySummary, Outcome};
pub use self::resolver::{Resolution, Resolver};
pub use self::schedule::{build_schedule_index, ScheduleIndex, ScheduleWindow};
pub use self::segment::{segment, AssignmentSegment};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
pub struct VehicleName(String);

impl VehicleName {
    pub fn new<I: Into<String>>(x: I) -> Self {
        Self(x.into())
    }
}
