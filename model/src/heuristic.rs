use chrono_tz::Tz;
use geom::Duration;

use crate::avl::time_of_day;
use crate::{AssignmentSegment, BlockCode, ScheduleIndex, ScheduleWindow};

/// Knobs for judging whether an assignment change is trustworthy.
#[derive(Clone, Copy, Debug)]
pub struct Policy {
    /// Changes showing up this long (or longer) before the trip is scheduled to start are
    /// suspicious.
    pub early_threshold: Duration,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            early_threshold: Duration::minutes(15),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Decision {
    Accept,
    /// Probably the operator staging their next trip while still finishing the previous one
    Reject,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Evaluation {
    pub decision: Decision,
    /// The trip's scheduled window, if the schedule knows the trip
    pub window: Option<ScheduleWindow>,
    /// Scheduled start minus when the assignment appeared. Positive means early.
    pub earliness: Option<Duration>,
}

/// Judges each assignment change of a vehicle. Only reads the schedule, so it can be shared
/// across threads.
#[derive(Clone, Copy)]
pub struct Evaluator<'a> {
    schedule: &'a ScheduleIndex,
    policy: Policy,
    tz: Tz,
}

impl<'a> Evaluator<'a> {
    pub fn new(schedule: &'a ScheduleIndex, policy: Policy, tz: Tz) -> Self {
        Self {
            schedule,
            policy,
            tz,
        }
    }

    /// An assignment that appears well before its trip starts is rejected, unless the vehicle
    /// had no block before. Sometimes the block stays unassigned for a while and only then gets
    /// set, and then even an early change is the best information available. The first segment
    /// of the day has no previous block.
    pub fn evaluate(
        &self,
        previous: Option<&AssignmentSegment>,
        segment: &AssignmentSegment,
    ) -> Evaluation {
        let window = segment
            .assignment
            .trip
            .short_name()
            .and_then(|trip| self.schedule.get(trip));
        let earliness = window.map(|w| w.start - time_of_day(self.tz, segment.time));

        let previous_block_assigned = previous
            .map(|prev| prev.assignment.block.is_assigned())
            .unwrap_or(false);
        let decision = match earliness {
            Some(early) if early >= self.policy.early_threshold && previous_block_assigned => {
                Decision::Reject
            }
            _ => Decision::Accept,
        };

        Evaluation {
            decision,
            window,
            earliness,
        }
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }
}

/// The previous block of a vehicle, as the rejection rule sees it.
pub fn previous_block(previous: Option<&AssignmentSegment>) -> BlockCode {
    previous
        .map(|prev| prev.assignment.block.clone())
        .unwrap_or(BlockCode::Unassigned)
}
