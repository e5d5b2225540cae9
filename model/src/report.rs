use anyhow::Result;

use gtfs::{supplement, SupplementTrip};

use crate::Resolver;

impl Resolver {
    /// One row per resolved trip, ordered by trip short name
    pub fn supplement_rows(&self) -> Vec<SupplementTrip> {
        self.trip_to_block()
            .iter()
            .map(|(trip, block)| SupplementTrip {
                trip_short_name: trip.clone(),
                block_id: block.clone(),
            })
            .collect()
    }

    pub fn write_supplement(&self, path: &str) -> Result<()> {
        supplement::write_to_file(path, self.supplement_rows())
    }

    pub fn export_to_csv(&self) -> Result<String> {
        let mut out = Vec::new();
        supplement::write(&mut out, self.supplement_rows())?;
        let out = String::from_utf8(out)?;
        Ok(out)
    }

    /// Human-readable lines about trips associated with more than one block
    pub fn describe_conflicts(&self) -> Vec<String> {
        let mut lines = vec!["Trips associated with more than a single block:".to_string()];
        for (trip, blocks) in self.conflicts() {
            let blocks: Vec<String> = blocks.iter().map(|b| b.to_string()).collect();
            lines.push(format!(
                "For trip_short_name={trip} blocks=[{}]",
                blocks.join(", ")
            ));
        }
        lines
    }
}
