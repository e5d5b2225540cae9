use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::{BlockID, TripShortName};

/// One row of the supplemental trips.txt, filling in the block that a trip was observed to run
/// under.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplementTrip {
    pub trip_short_name: TripShortName,
    pub block_id: BlockID,
}

pub fn write<W: std::io::Write, I: IntoIterator<Item = SupplementTrip>>(
    writer: W,
    rows: I,
) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Creates the parent directory if needed.
pub fn write_to_file<I: IntoIterator<Item = SupplementTrip>>(path: &str, rows: I) -> Result<()> {
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs_err::create_dir_all(parent)?;
        }
    }
    let file = fs_err::File::create(path)?;
    write(std::io::BufWriter::new(file), rows)?;
    info!("Wrote {path}");
    Ok(())
}
