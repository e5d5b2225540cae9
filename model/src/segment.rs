use anyhow::Result;
use chrono::{DateTime, Utc};
use geom::LonLat;

use crate::{Assignment, LocationReport, TripCode, VehicleName};

/// A run of consecutive reports from one vehicle that all carry the same assignment.
#[derive(Clone, Debug)]
pub struct AssignmentSegment {
    pub vehicle: VehicleName,
    pub assignment: Assignment,
    /// When this assignment first showed up
    pub time: DateTime<Utc>,
    /// Where the vehicle was at that time
    pub pos: LonLat,
}

/// Collapses one vehicle's reports into assignment changes. Reports with the placeholder trip
/// code are dropped before collapsing, so they never split a run. End-of-trip reports are kept.
///
/// The input must all belong to one vehicle and be sorted by time.
pub fn segment(reports: &[LocationReport]) -> Result<Vec<AssignmentSegment>> {
    let mut segments: Vec<AssignmentSegment> = Vec::new();
    let mut previous: Option<&LocationReport> = None;
    for report in reports {
        if let Some(prev) = previous {
            if prev.vehicle != report.vehicle {
                bail!(
                    "segment got reports from {:?} and {:?}",
                    prev.vehicle,
                    report.vehicle
                );
            }
            if report.time < prev.time {
                bail!(
                    "{:?} has reports out of order: {} then {}",
                    report.vehicle,
                    prev.time,
                    report.time
                );
            }
        }
        previous = Some(report);

        let assignment = report.normalized();
        if assignment.trip == TripCode::Placeholder {
            continue;
        }
        if segments
            .last()
            .map(|seg| seg.assignment == assignment)
            .unwrap_or(false)
        {
            continue;
        }
        segments.push(AssignmentSegment {
            vehicle: report.vehicle.clone(),
            assignment,
            time: report.time,
            pos: report.pos,
        });
    }
    Ok(segments)
}
