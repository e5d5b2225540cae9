#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

use abstutil::{prettyprint_usize, Timer};
use anyhow::Result;
use chrono::NaiveDate;
use chrono_tz::Tz;
use geom::Duration;
use structopt::StructOpt;

use gtfs::GTFS;
use model::{AvlArchive, BlockInference, Policy, ScheduleIndex};

/// Figures out which block each trip ran under, using historical AVL data, and writes a
/// supplemental GTFS trips file.
#[derive(StructOpt)]
struct Args {
    /// The first service day to process, as YYYY-MM-DD
    #[structopt(long)]
    start_date: String,
    /// How many consecutive days to process
    #[structopt(long, default_value = "1")]
    days: usize,
    /// The path to a GTFS directory or .zip
    #[structopt(long)]
    gtfs: String,
    /// The path to an AVL CSV file
    #[structopt(long)]
    avl: String,
    /// The agency's timezone. AVL timestamps are local to this.
    #[structopt(long, default_value = "America/New_York")]
    timezone: String,
    /// Assignment changes at least this early for their trip are suspicious
    #[structopt(long, default_value = "15")]
    early_threshold_minutes: usize,
    /// Where to write the supplemental trips file. Defaults to supplement/trips.txt in the GTFS
    /// directory.
    #[structopt(long)]
    output: Option<String>,
}

impl Args {
    fn start_date(&self) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(&self.start_date, "%Y-%m-%d")
            .map_err(|err| anyhow!("bad --start-date {}: {err}", self.start_date))
    }

    fn timezone(&self) -> Result<Tz> {
        self.timezone
            .parse()
            .map_err(|err| anyhow!("bad --timezone {}: {err}", self.timezone))
    }

    fn output(&self) -> Result<String> {
        if let Some(ref path) = self.output {
            return Ok(path.clone());
        }
        if self.gtfs.ends_with(".zip") {
            bail!("--output is needed when --gtfs is a .zip");
        }
        Ok(format!("{}/supplement/trips.txt", self.gtfs))
    }
}

fn main() -> Result<()> {
    abstutil::logger::setup();

    let args = Args::from_iter(abstutil::cli_args());
    run(args)
}

fn run(args: Args) -> Result<()> {
    // Fail on bad input before doing anything slow
    let start = args.start_date()?;
    let tz = args.timezone()?;
    let output = args.output()?;
    if args.days == 0 {
        bail!("--days must be at least 1");
    }
    let policy = Policy {
        early_threshold: Duration::minutes(args.early_threshold_minutes),
    };

    let mut timer = Timer::new("infer blocks");

    timer.start("load GTFS");
    let gtfs = GTFS::load(&args.gtfs)?;
    let schedule = ScheduleIndex::from_gtfs(&gtfs);
    timer.stop("load GTFS");
    info!(
        "Schedule known for {} trip short names",
        prettyprint_usize(schedule.len())
    );

    timer.start("load AVL");
    let avl = AvlArchive::load_from_file(&args.avl, tz)?;
    timer.stop("load AVL");
    info!("Read {} AVL reports", prettyprint_usize(avl.len()));

    let mut inference = BlockInference::new(&schedule, policy, tz);
    inference.run(&avl, start, args.days, &mut timer)?;
    let resolver = inference.into_resolver();

    println!();
    for line in resolver.describe_conflicts() {
        println!("{line}");
    }

    resolver.write_supplement(&output)?;
    info!(
        "Blocks found for {} trips, {} with conflicts",
        prettyprint_usize(resolver.trip_to_block().len()),
        prettyprint_usize(resolver.conflicts().len())
    );
    Ok(())
}
