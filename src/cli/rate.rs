//! Rate command implementation

use anyhow::Result;
use std::path::Path;

use crate::config::Config;
use crate::import::RunLog;
use crate::rating;
use crate::store::Store;

pub fn run(store: &Store, config: &Config) -> Result<()> {
    let mut log = RunLog::open(Path::new(&config.import.log_path))?;
    log.phase("Ratings")?;

    let written = rating::rate_all(store, &config.committees.permanent, &mut log)?;
    log.flush()?;

    println!(
        "Recomputed {written} ratings across {} congresses",
        store.list_congresses()?.len()
    );
    Ok(())
}
