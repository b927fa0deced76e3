//! Ratings command implementation
//!
//! Read-out of the scored ratings table for one congress; the same
//! quantities the display layer consumes.

use anyhow::{Context, Result};
use chrono::Utc;
use std::path::Path;

use crate::config::Config;
use crate::import::RunLog;
use crate::rating::score_rating;
use crate::store::Store;

pub fn run(store: &Store, config: &Config, congress: Option<i64>) -> Result<()> {
    let mut log = RunLog::open(Path::new(&config.import.log_path))?;
    let congresses = store.list_congresses()?;
    let congress = match congress {
        Some(n) => store
            .get_congress(n)?
            .with_context(|| format!("congress {n} not seeded"))?,
        None => congresses
            .last()
            .cloned()
            .context("no congresses seeded; run `oversight seed` first")?,
    };

    let rows = store.ratings_for_congress(congress.identifier)?;
    if rows.is_empty() {
        println!(
            "No ratings for the {}. Run 'oversight rate' first.",
            congress.name
        );
        return Ok(());
    }

    println!("{}", congress.name);
    println!(
        "{:<55} {:>5} {:>5} {:>5} {:>7} {:>7} {:>5}",
        "Committee", "Inv", "Pol", "Total", "Points", "Score", "Grade"
    );
    println!("{}", "-".repeat(95));

    let today = Utc::now().date_naive();
    for (rating, name) in rows {
        let scored = score_rating(
            store,
            &rating,
            &congress,
            config.congresses.default_inactive_days,
            today,
        )?;

        println!(
            "{:<55} {:>5} {:>5} {:>5} {:>7} {:>7.1} {:>5}",
            name,
            rating.investigative_oversight_hearings,
            rating.policy_legislative_hearings,
            rating.total_hearings,
            rating.chp_points,
            scored.chp_score,
            scored.chp_grade,
        );

        if !scored.comparable {
            println!("  (no historical maximum; score fixed at 0)");
            log.note(format!(
                "{}: no historical maximum for {}; score fixed at 0",
                name, congress.name
            ))?;
        }
    }
    log.flush()?;

    Ok(())
}
