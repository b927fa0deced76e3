//! Category corrections
//!
//! Manually reviewed category CSVs (NAME, DATE, CATEGORY columns) matched
//! against existing hearings by date and cleaned title. Matches overwrite
//! the hearing's single category; misses go to the run log for review.

use anyhow::{Context, Result};
use std::path::Path;

use super::{clean_date, clean_encoding, RunLog};
use crate::store::Store;

/// Returns (matched, unmatched) counts.
pub fn import_category_file(
    store: &Store,
    path: &Path,
    log: &mut RunLog,
) -> Result<(usize, usize)> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let headers = reader.headers()?.clone();
    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .with_context(|| format!("missing column {name:?}"))
    };
    let name_idx = find("NAME")?;
    let date_idx = find("DATE")?;
    let category_idx = find("CATEGORY")?;

    let mut matched = 0;
    let mut unmatched = 0;
    let mut row_number = 1;

    for record in reader.records() {
        let record = record?;
        row_number += 1;

        let name = clean_encoding(record.get(name_idx).unwrap_or("").trim());
        let date = clean_date(record.get(date_idx).unwrap_or(""));
        let category = record.get(category_idx).unwrap_or("").trim().to_string();

        if name.is_empty() {
            continue;
        }

        let category_id = match store.category_type_by_name(&category)? {
            Some(id) => id,
            None => {
                log.row(row_number, format!("unknown category {category:?}"))?;
                unmatched += 1;
                continue;
            }
        };

        let events = store.events_matching_date_name(&date, &name)?;
        if events.is_empty() {
            log.row(row_number, format!("no hearing matched {date},{name}"))?;
            unmatched += 1;
            continue;
        }

        for event_id in &events {
            store.set_hearing_category(event_id, &category_id)?;
        }
        matched += 1;
    }

    Ok((matched, unmatched))
}
