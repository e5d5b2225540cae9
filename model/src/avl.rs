use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use geom::{Duration, LonLat, Time};
use serde::Deserialize;

use crate::{Assignment, VehicleName};

/// One AVL report, already pulled out of whatever vendor format it arrived in.
#[derive(Clone, Debug)]
pub struct LocationReport {
    pub vehicle: VehicleName,
    pub time: DateTime<Utc>,
    pub pos: LonLat,
    /// Raw trip code entered by the operator
    pub assignment: String,
    /// Raw block code entered by the operator
    pub block: String,
}

impl LocationReport {
    pub fn normalized(&self) -> Assignment {
        Assignment::from_raw(&self.assignment, &self.block)
    }
}

/// Historical AVL reports, queried over a bounded time window.
pub trait ReportSource {
    /// All reports with time in [begin, end), sorted by time.
    fn reports_between(
        &self,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<LocationReport>>;

    fn reports_for_vehicle(
        &self,
        vehicle: &VehicleName,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<LocationReport>> {
        let mut reports = self.reports_between(begin, end)?;
        reports.retain(|r| &r.vehicle == vehicle);
        Ok(reports)
    }
}

/// Reports held in memory, sorted by time.
pub struct AvlArchive {
    reports: Vec<LocationReport>,
}

impl AvlArchive {
    pub fn new(mut reports: Vec<LocationReport>) -> Self {
        // Stable, so reports at the same instant stay in the order the feed produced them
        reports.sort_by_key(|r| r.time);
        Self { reports }
    }

    /// Timestamps in the file are local to the agency.
    pub fn load<R: std::io::Read>(reader: R, tz: Tz) -> Result<Self> {
        let mut reports = Vec::new();
        for rec in csv::Reader::from_reader(reader).deserialize() {
            let rec: Record = rec?;
            let local = NaiveDateTime::parse_from_str(&rec.time, "%Y-%m-%d %H:%M:%S")
                .map_err(|err| anyhow!("bad time {}: {err}", rec.time))?;
            reports.push(LocationReport {
                vehicle: rec.vehicle_id,
                time: local_to_utc(tz, local)?,
                pos: LonLat::new(rec.lon, rec.lat),
                assignment: rec.assignment.unwrap_or_default(),
                block: rec.block.unwrap_or_default(),
            });
        }
        Ok(Self::new(reports))
    }

    pub fn load_from_file(path: &str, tz: Tz) -> Result<Self> {
        Self::load(fs_err::File::open(path)?, tz).map_err(|err| anyhow!("{path}: {err}"))
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

impl ReportSource for AvlArchive {
    fn reports_between(
        &self,
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<LocationReport>> {
        let first = self.reports.partition_point(|r| r.time < begin);
        let last = self.reports.partition_point(|r| r.time < end);
        if first >= last {
            return Ok(Vec::new());
        }
        Ok(self.reports[first..last].to_vec())
    }
}

#[derive(Deserialize)]
struct Record {
    vehicle_id: VehicleName,
    time: String,
    lat: f64,
    lon: f64,
    assignment: Option<String>,
    block: Option<String>,
}

/// Fails for local times skipped by a DST transition. Ambiguous times resolve to the earlier
/// instant.
pub fn local_to_utc(tz: Tz, local: NaiveDateTime) -> Result<DateTime<Utc>> {
    match tz.from_local_datetime(&local).earliest() {
        Some(t) => Ok(t.with_timezone(&Utc)),
        None => bail!("{local} doesn't exist in {tz}"),
    }
}

/// Seconds since local midnight in the agency's timezone
pub fn time_of_day(tz: Tz, instant: DateTime<Utc>) -> Time {
    let time = instant.with_timezone(&tz).time();
    Time::START_OF_DAY
        + Duration::hours(time.hour() as usize)
        + Duration::minutes(time.minute() as usize)
        + Duration::seconds(time.second() as f64)
}
