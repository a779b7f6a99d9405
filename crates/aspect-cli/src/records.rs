//! Crag record files.

use anyhow::{Context, Result};
use aspect_sdk::CragRecord;
use std::collections::HashMap;
use std::path::Path;

/// Records in file order; [`save_records`] writes them back in the same order.
pub fn load_records(path: &Path) -> Result<Vec<CragRecord>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading crag records from {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing crag records in {}", path.display()))
}

/// Working copy of `records` ordered by name, for processing and progress output.
pub fn by_name(mut records: Vec<CragRecord>) -> Vec<CragRecord> {
    records.sort_by(|a, b| a.name.cmp(&b.name));
    records
}

pub fn save_records(path: &Path, records: &[CragRecord]) -> Result<()> {
    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(path, json + "\n")
        .with_context(|| format!("writing crag records to {}", path.display()))
}

pub fn missing_aspect(records: &[CragRecord]) -> Vec<CragRecord> {
    records
        .iter()
        .filter(|record| record.aspect.is_none())
        .cloned()
        .collect()
}

/// Copy recalculated records back over the originals, matched by id.
pub fn merge_records(records: &mut [CragRecord], updated: Vec<CragRecord>) {
    let mut by_id: HashMap<String, CragRecord> = updated
        .into_iter()
        .map(|record| (record.id.clone(), record))
        .collect();
    for record in records.iter_mut() {
        if let Some(fresh) = by_id.remove(&record.id) {
            *record = fresh;
        }
    }
}
