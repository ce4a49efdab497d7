//! Export module for writing scraped records to disk
//!
//! Files are overwritten in place; write failures propagate to the caller.

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{info, warn};

use crate::error::AppResult;
use crate::models::AnimeRecord;

/// Write records as a pretty-printed UTF-8 JSON array
pub fn save_json(path: impl AsRef<Path>, records: &[AnimeRecord]) -> AppResult<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.flush()?;

    info!("Data saved to {}", path.display());
    Ok(())
}

/// Sorted union of the field names present across all records
pub fn csv_columns(records: &[AnimeRecord]) -> Vec<&'static str> {
    records
        .iter()
        .flat_map(|anime| anime.fields().into_iter().map(|(name, _)| name))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Write records as CSV, one column per field seen in any record.
///
/// Missing fields are left blank. Nothing is written for an empty list.
pub fn save_csv(path: impl AsRef<Path>, records: &[AnimeRecord]) -> AppResult<()> {
    let path = path.as_ref();
    if records.is_empty() {
        warn!("No data to save");
        return Ok(());
    }

    let columns = csv_columns(records);
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&columns)?;

    for anime in records {
        let fields: HashMap<&str, String> = anime.fields().into_iter().collect();
        writer.write_record(
            columns
                .iter()
                .map(|column| fields.get(column).map(String::as_str).unwrap_or("")),
        )?;
    }
    writer.flush()?;

    info!("Data saved to {}", path.display());
    Ok(())
}
