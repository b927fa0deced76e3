//! Import command implementation
//!
//! Committee keys first, then hearings, one chamber at a time, then any
//! configured category-correction files. Hearing imports run inside a
//! per-chamber transaction so a consistency violation discards the whole
//! chamber.

use anyhow::Result;
use std::path::Path;

use crate::config::Config;
use crate::import::{
    import_category_file, import_committee_keys, import_hearings, Chamber, RunLog,
};
use crate::store::Store;

pub fn run(store: &Store, config: &Config) -> Result<()> {
    let mut log = RunLog::open(Path::new(&config.import.log_path))?;

    for (chamber, path) in [
        (Chamber::House, &config.import.house_committees),
        (Chamber::Senate, &config.import.senate_committees),
    ] {
        log.phase(&format!("{} Committees", chamber.name()))?;
        let (resolved, failed) =
            import_committee_keys(store, Path::new(path), chamber, &mut log)?;
        println!(
            "{} committee keys: {} resolved, {} unresolved",
            chamber.name(),
            resolved,
            failed
        );
    }

    for (chamber, path, tolerance) in [
        (
            Chamber::House,
            &config.import.house_hearings,
            config.import.house_tolerance,
        ),
        (
            Chamber::Senate,
            &config.import.senate_hearings,
            config.import.senate_tolerance,
        ),
    ] {
        log.phase(&format!("{} Hearings", chamber.name()))?;

        // One transaction per chamber; a failed consistency check rolls
        // the whole chamber back.
        let tx = store.begin()?;
        let counters = import_hearings(store, Path::new(path), chamber, tolerance, &mut log)?;
        tx.commit()?;

        println!(
            "{} hearings: {} existing, {} updated, {} created",
            chamber.name(),
            counters.existing,
            counters.updated,
            counters.created
        );
    }

    for file in &config.import.category_files {
        log.phase(&format!("Categories: {file}"))?;
        let (matched, unmatched) = import_category_file(store, Path::new(file), &mut log)?;
        println!("{file}: {matched} matched, {unmatched} unmatched");
    }

    log.flush()?;
    println!("Import complete, diagnostics in {}", config.import.log_path);
    Ok(())
}
