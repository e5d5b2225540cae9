use std::collections::BTreeMap;

use abstutil::{prettyprint_usize, Counter, Timer};
use anyhow::Result;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use geom::Duration;

use crate::heuristic::previous_block;
use crate::{
    segment, AssignmentSegment, Decision, Evaluation, Evaluator, LocationReport, Policy,
    ReportSource, Resolution, Resolver, ScheduleIndex, VehicleName,
};

/// What happened to one assignment change
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Outcome {
    Accepted,
    Rejected,
    /// End-of-trip markers and changes without a block are never recorded
    Excluded,
}

pub struct DaySummary {
    pub day: NaiveDate,
    pub reports: usize,
    pub vehicles: usize,
    /// Vehicles whose reports couldn't be segmented
    pub skipped_vehicles: usize,
    pub segments: usize,
    pub outcomes: Counter<Outcome>,
    pub conflicts: usize,
}

/// Works through days of AVL reports, building up the trip to block mapping.
pub struct BlockInference<'a> {
    evaluator: Evaluator<'a>,
    resolver: Resolver,
}

impl<'a> BlockInference<'a> {
    pub fn new(schedule: &'a ScheduleIndex, policy: Policy, tz: Tz) -> Self {
        Self {
            evaluator: Evaluator::new(schedule, policy, tz),
            resolver: Resolver::new(),
        }
    }

    /// Processes `num_days` consecutive service days, oldest first.
    pub fn run<S: ReportSource + ?Sized>(
        &mut self,
        source: &S,
        start: NaiveDate,
        num_days: usize,
        timer: &mut Timer,
    ) -> Result<Vec<DaySummary>> {
        let mut summaries = Vec::new();
        for offset in 0..num_days {
            let day = start + chrono::Duration::days(offset as i64);
            summaries.push(self.process_day(source, day, timer)?);
        }
        Ok(summaries)
    }

    pub fn process_day<S: ReportSource + ?Sized>(
        &mut self,
        source: &S,
        day: NaiveDate,
        timer: &mut Timer,
    ) -> Result<DaySummary> {
        let tz = self.evaluator.tz();
        let (begin, end) = service_day_bounds(tz, day)?;
        timer.start(format!("process {day}"));

        let reports = source.reports_between(begin, end)?;
        let mut summary = DaySummary {
            day,
            reports: reports.len(),
            vehicles: 0,
            skipped_vehicles: 0,
            segments: 0,
            outcomes: Counter::new(),
            conflicts: 0,
        };

        let mut per_vehicle: BTreeMap<VehicleName, Vec<LocationReport>> = BTreeMap::new();
        for report in reports {
            per_vehicle
                .entry(report.vehicle.clone())
                .or_insert_with(Vec::new)
                .push(report);
        }
        // Don't trust the source to honor the ordering
        for list in per_vehicle.values_mut() {
            list.sort_by_key(|r| r.time);
        }
        summary.vehicles = per_vehicle.len();

        // Vehicles are independent until their accepted assignments are applied, which happens
        // sequentially below, in vehicle order and then time order.
        let evaluator = &self.evaluator;
        let results = timer.parallelize(
            "evaluate assignment changes per vehicle",
            per_vehicle.into_iter().collect(),
            |(vehicle, reports): (VehicleName, Vec<LocationReport>)| {
                let result = evaluate_vehicle(evaluator, &reports);
                (vehicle, result)
            },
        );

        for (vehicle, result) in results {
            // Reports are grouped and sorted above, so this only guards against segmenting
            // changing its contract
            let changes = match result {
                Ok(x) => x,
                Err(err) => {
                    error!("Skipping {:?} on {day}: {err}", vehicle);
                    summary.skipped_vehicles += 1;
                    continue;
                }
            };

            debug!("For {:?}", vehicle);
            let mut previous: Option<&AssignmentSegment> = None;
            for (segment, evaluation) in &changes {
                summary.segments += 1;
                debug!("  {}", describe(tz, previous, segment, evaluation));
                previous = Some(segment);

                let outcome = match (evaluation.decision, segment.assignment.resolvable()) {
                    (_, None) => Outcome::Excluded,
                    (Decision::Reject, Some(_)) => Outcome::Rejected,
                    (Decision::Accept, Some((trip, block))) => {
                        if let Resolution::Conflict { .. } = self.resolver.accept(trip, block, day)
                        {
                            summary.conflicts += 1;
                        }
                        Outcome::Accepted
                    }
                };
                summary.outcomes.inc(outcome);
            }
        }

        info!(
            "{day}: {} reports from {} vehicles ({} skipped), {} assignment changes. {} accepted, \
             {} rejected, {} excluded, {} conflicts",
            prettyprint_usize(summary.reports),
            prettyprint_usize(summary.vehicles),
            summary.skipped_vehicles,
            prettyprint_usize(summary.segments),
            prettyprint_usize(summary.outcomes.get(Outcome::Accepted)),
            prettyprint_usize(summary.outcomes.get(Outcome::Rejected)),
            prettyprint_usize(summary.outcomes.get(Outcome::Excluded)),
            summary.conflicts
        );
        timer.stop(format!("process {day}"));
        Ok(summary)
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn into_resolver(self) -> Resolver {
        self.resolver
    }
}

fn evaluate_vehicle(
    evaluator: &Evaluator,
    reports: &[LocationReport],
) -> Result<Vec<(AssignmentSegment, Evaluation)>> {
    let segments = segment(reports)?;
    let evaluations: Vec<Evaluation> = segments
        .iter()
        .enumerate()
        .map(|(idx, seg)| {
            let previous = if idx == 0 {
                None
            } else {
                Some(&segments[idx - 1])
            };
            evaluator.evaluate(previous, seg)
        })
        .collect();
    Ok(segments.into_iter().zip(evaluations).collect())
}

fn describe(
    tz: Tz,
    previous: Option<&AssignmentSegment>,
    segment: &AssignmentSegment,
    evaluation: &Evaluation,
) -> String {
    let earliness = match evaluation.earliness {
        Some(x) if x >= Duration::ZERO => format!("{x} early"),
        Some(x) => format!("{} LATE", Duration::ZERO - x),
        None => "-----".to_string(),
    };
    let window = match evaluation.window {
        Some(w) => format!("{} to {}", w.start, w.end),
        None => "--:--:-- to --:--:--".to_string(),
    };
    format!(
        "at {} trip {} block {} (previously {}), assignment {earliness}, trip scheduled {window}, \
         lat={} lon={}: {:?}",
        segment.time.with_timezone(&tz).format("%Y-%m-%d %H:%M:%S"),
        segment.assignment.trip,
        segment.assignment.block,
        previous_block(previous),
        segment.pos.y(),
        segment.pos.x(),
        evaluation.decision
    )
}

/// A service day runs from local midnight to the next local midnight, so it may be 23 or 25 hours
/// long.
pub fn service_day_bounds(tz: Tz, day: NaiveDate) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let next = day
        .succ_opt()
        .ok_or_else(|| anyhow!("no day after {day}"))?;
    Ok((local_midnight(tz, day)?, local_midnight(tz, next)?))
}

/// Some zones spring forward at midnight. Then the day starts at the first local time that
/// exists.
fn local_midnight(tz: Tz, day: NaiveDate) -> Result<DateTime<Utc>> {
    let midnight = day
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow!("no midnight on {day}"))?;
    for minutes in 0..24 * 60 {
        let local = midnight + chrono::Duration::minutes(minutes);
        if let Some(t) = tz.from_local_datetime(&local).earliest() {
            return Ok(t.with_timezone(&Utc));
        }
    }
    bail!("no time on {day} exists in {tz}")
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;
    use geom::{LonLat, Time};

    use gtfs::{orig, BlockID, TripShortName};

    use super::*;
    use crate::avl::local_to_utc;
    use crate::{build_schedule_index, AvlArchive};

    const NEW_YORK: Tz = chrono_tz::America::New_York;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2014, 6, d).unwrap()
    }

    // Trip 12 runs from 08:00 to 08:30
    fn schedule() -> ScheduleIndex {
        let id = orig::TripID::new("t12");
        let mut names = BTreeMap::new();
        names.insert(id.clone(), TripShortName::new("12"));
        let start = Time::START_OF_DAY + Duration::hours(8);
        build_schedule_index(&names, vec![(&id, start), (&id, start + Duration::minutes(30))])
    }

    fn report(vehicle: &str, local: &str, trip: &str, block: &str) -> LocationReport {
        let local = NaiveDateTime::parse_from_str(local, "%Y-%m-%d %H:%M:%S").unwrap();
        LocationReport {
            vehicle: VehicleName::new(vehicle),
            time: local_to_utc(NEW_YORK, local).unwrap(),
            pos: LonLat::new(-71.06, 42.35),
            assignment: trip.to_string(),
            block: block.to_string(),
        }
    }

    fn block(trip: &str, resolver: &Resolver) -> Option<String> {
        resolver
            .block_for(&TripShortName::new(trip))
            .map(|b| b.to_string())
    }

    #[test]
    fn end_to_end_day() {
        let schedule = schedule();
        let source = AvlArchive::new(vec![
            report("bus1", "2014-06-02 07:00:00", "12", "00"),
            report("bus1", "2014-06-02 07:30:00", "12", "00"),
            report("bus1", "2014-06-02 08:05:00", "12", "05"),
            report("bus1", "2014-06-02 08:40:00", "13", "05"),
        ]);
        let mut inference = BlockInference::new(&schedule, Policy::default(), NEW_YORK);
        let summary = inference
            .process_day(&source, day(2), &mut Timer::throwaway())
            .unwrap();

        assert_eq!(summary.reports, 4);
        assert_eq!(summary.vehicles, 1);
        assert_eq!(summary.segments, 3);
        assert_eq!(summary.outcomes.get(Outcome::Accepted), 3);
        assert_eq!(summary.conflicts, 1);

        let resolver = inference.into_resolver();
        assert_eq!(resolver.trip_to_block().len(), 2);
        assert_eq!(block("12", &resolver), Some("05".to_string()));
        assert_eq!(block("13", &resolver), Some("05".to_string()));
        let expected: Vec<BlockID> = vec![BlockID::new("00"), BlockID::new("05")];
        assert_eq!(
            resolver.conflicts()[&TripShortName::new("12")]
                .iter()
                .cloned()
                .collect::<Vec<_>>(),
            expected
        );
    }

    #[test]
    fn staged_next_trip_is_rejected() {
        let schedule = schedule();
        let source = AvlArchive::new(vec![
            report("bus1", "2014-06-02 07:00:00", "11", "04"),
            // Still finishing trip 11, but the terminal already says 12
            report("bus1", "2014-06-02 07:40:00", "12", "05"),
            report("bus1", "2014-06-02 08:10:00", "12", "05"),
            report("bus1", "2014-06-02 08:35:00", "9999", "05"),
            report("bus1", "2014-06-02 08:40:00", "13", "000"),
            report("bus1", "2014-06-02 08:41:00", "000", "05"),
        ]);
        let mut inference = BlockInference::new(&schedule, Policy::default(), NEW_YORK);
        let summary = inference
            .process_day(&source, day(2), &mut Timer::throwaway())
            .unwrap();

        assert_eq!(summary.segments, 4);
        assert_eq!(summary.outcomes.get(Outcome::Accepted), 1);
        assert_eq!(summary.outcomes.get(Outcome::Rejected), 1);
        assert_eq!(summary.outcomes.get(Outcome::Excluded), 2);

        let resolver = inference.resolver();
        assert_eq!(block("11", resolver), Some("04".to_string()));
        assert_eq!(block("12", resolver), None);
        assert_eq!(block("13", resolver), None);
        assert_eq!(block("9999", resolver), None);
        assert!(resolver.conflicts().is_empty());
    }

    #[test]
    fn early_assignment_after_unassigned_block() {
        let schedule = schedule();
        let source = AvlArchive::new(vec![
            report("bus1", "2014-06-02 07:00:00", "11", "000"),
            report("bus1", "2014-06-02 07:40:00", "12", "05"),
        ]);
        let mut inference = BlockInference::new(&schedule, Policy::default(), NEW_YORK);
        inference
            .process_day(&source, day(2), &mut Timer::throwaway())
            .unwrap();
        assert_eq!(block("12", inference.resolver()), Some("05".to_string()));
        assert_eq!(block("11", inference.resolver()), None);
    }

    #[test]
    fn vehicles_dont_interact() {
        let schedule = schedule();
        // bus2's early report comes right after bus1's assigned block in the overall stream
        let source = AvlArchive::new(vec![
            report("bus1", "2014-06-02 07:00:00", "11", "04"),
            report("bus2", "2014-06-02 07:40:00", "12", "05"),
        ]);
        let mut inference = BlockInference::new(&schedule, Policy::default(), NEW_YORK);
        inference
            .process_day(&source, day(2), &mut Timer::throwaway())
            .unwrap();
        assert_eq!(block("11", inference.resolver()), Some("04".to_string()));
        assert_eq!(block("12", inference.resolver()), Some("05".to_string()));
    }

    #[test]
    fn later_days_win() {
        let schedule = schedule();
        let source = AvlArchive::new(vec![
            report("bus1", "2014-06-02 08:00:00", "12", "05"),
            report("bus1", "2014-06-03 08:00:00", "12", "06"),
            // Outside the window
            report("bus1", "2014-06-05 08:00:00", "12", "07"),
        ]);
        let mut inference = BlockInference::new(&schedule, Policy::default(), NEW_YORK);
        let summaries = inference
            .run(&source, day(2), 2, &mut Timer::throwaway())
            .unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].day, day(2));
        assert_eq!(summaries[1].day, day(3));
        assert_eq!(summaries[0].conflicts, 0);
        assert_eq!(summaries[1].conflicts, 1);
        assert_eq!(block("12", inference.resolver()), Some("06".to_string()));
    }

    #[test]
    fn day_bounds_follow_local_midnight() {
        let (begin, end) = service_day_bounds(NEW_YORK, day(2)).unwrap();
        assert_eq!(begin, Utc.with_ymd_and_hms(2014, 6, 2, 4, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2014, 6, 3, 4, 0, 0).unwrap());

        // Clocks spring forward
        let dst = NaiveDate::from_ymd_opt(2014, 3, 9).unwrap();
        let (begin, end) = service_day_bounds(NEW_YORK, dst).unwrap();
        assert_eq!(end - begin, chrono::Duration::hours(23));

        // Santiago springs forward at midnight, so 2022-09-11 starts at 01:00 local (UTC-3)
        let santiago = chrono_tz::America::Santiago;
        let gap = NaiveDate::from_ymd_opt(2022, 9, 11).unwrap();
        let (begin, end) = service_day_bounds(santiago, gap).unwrap();
        assert_eq!(begin, Utc.with_ymd_and_hms(2022, 9, 11, 4, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2022, 9, 12, 3, 0, 0).unwrap());
        assert_eq!(end - begin, chrono::Duration::hours(23));

        // And the day before ends where that one begins
        let before = NaiveDate::from_ymd_opt(2022, 9, 10).unwrap();
        let (begin, end) = service_day_bounds(santiago, before).unwrap();
        assert_eq!(begin, Utc.with_ymd_and_hms(2022, 9, 10, 4, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2022, 9, 11, 4, 0, 0).unwrap());
    }

    #[test]
    fn bad_vehicle_input_is_isolated() {
        let schedule = schedule();
        let evaluator = Evaluator::new(&schedule, Policy::default(), NEW_YORK);

        let mixed = vec![
            report("bus1", "2014-06-02 07:00:00", "11", "04"),
            report("bus2", "2014-06-02 07:05:00", "12", "05"),
        ];
        assert!(evaluate_vehicle(&evaluator, &mixed).is_err());

        let unsorted = vec![
            report("bus1", "2014-06-02 08:00:00", "12", "05"),
            report("bus1", "2014-06-02 07:00:00", "11", "04"),
        ];
        assert!(evaluate_vehicle(&evaluator, &unsorted).is_err());

        let changes = evaluate_vehicle(&evaluator, &unsorted[1..]).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].1.decision, Decision::Accept);
    }

    #[test]
    fn transition_log_line() {
        let schedule = schedule();
        let evaluator = Evaluator::new(&schedule, Policy::default(), NEW_YORK);
        let reports = vec![
            report("bus1", "2014-06-02 07:00:00", "11", "04"),
            report("bus1", "2014-06-02 07:40:00", "12", "05"),
        ];
        let changes = evaluate_vehicle(&evaluator, &reports).unwrap();
        let line = describe(NEW_YORK, Some(&changes[0].0), &changes[1].0, &changes[1].1);
        assert!(line.starts_with("at 2014-06-02 07:40:00 trip 12 block 05 (previously 04)"));
        assert!(line.contains("lat=42.35 lon=-71.06"));
        assert!(line.ends_with("Reject"));
    }

    #[test]
    fn midnight_dst_gap_doesnt_stop_the_run() {
        let schedule = schedule();
        let santiago = chrono_tz::America::Santiago;
        let local = NaiveDateTime::parse_from_str("2022-09-11 08:00:00", "%Y-%m-%d %H:%M:%S")
            .unwrap();
        let source = AvlArchive::new(vec![LocationReport {
            vehicle: VehicleName::new("bus1"),
            time: local_to_utc(santiago, local).unwrap(),
            pos: LonLat::new(-70.65, -33.45),
            assignment: "12".to_string(),
            block: "05".to_string(),
        }]);
        let mut inference = BlockInference::new(&schedule, Policy::default(), santiago);
        let summaries = inference
            .run(
                &source,
                NaiveDate::from_ymd_opt(2022, 9, 10).unwrap(),
                2,
                &mut Timer::throwaway(),
            )
            .unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[1].reports, 1);
        assert_eq!(block("12", inference.resolver()), Some("05".to_string()));
    }
}
