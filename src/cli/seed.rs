//! Seed command implementation
//!
//! Creates the fixed fixtures everything else assumes: jurisdiction,
//! chamber tree, category vocabulary, congress rows, and the canonical
//! committee tree from the configured CSV (the stand-in for the scraper
//! that feeds the production store). Safe to rerun.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::Path;

use crate::categories;
use crate::config::Config;
use crate::import::Chamber;
use crate::rating::congress_name;
use crate::store::{Store, JURISDICTION_ID};

pub fn run(store: &Store, config: &Config) -> Result<()> {
    store.ensure_jurisdiction(JURISDICTION_ID, "United States of America")?;

    let root = store.ensure_organization("United States Congress", "legislature", None)?;
    let house =
        store.ensure_organization(Chamber::House.organization_name(), "chamber", Some(&root))?;
    let senate =
        store.ensure_organization(Chamber::Senate.organization_name(), "chamber", Some(&root))?;

    for name in categories::ALL {
        store.ensure_category_type(name, name)?;
    }
    println!("Seeded {} categories", categories::ALL.len());

    for n in config.congresses.first..=config.congresses.last {
        let (start, end) = congress_dates(n)?;
        store.upsert_congress(n, &congress_name(n), start, end, config.inactive_days_for(n))?;
    }
    println!(
        "Seeded congresses {}..={}",
        config.congresses.first, config.congresses.last
    );

    let committees_file = Path::new(&config.committees.file);
    if committees_file.exists() {
        let count = load_committees(store, committees_file, &house, &senate)?;
        println!("Seeded {count} committees from {}", committees_file.display());
    } else {
        println!(
            "No committee file at {}, skipping committee tree",
            committees_file.display()
        );
    }

    Ok(())
}

/// A congress starts January 3 of its odd year and runs two years.
fn congress_dates(identifier: i64) -> Result<(NaiveDate, NaiveDate)> {
    let year = (1789 + 2 * (identifier - 1)) as i32;
    let start = NaiveDate::from_ymd_opt(year, 1, 3)
        .with_context(|| format!("bad start year for congress {identifier}"))?;
    let end = NaiveDate::from_ymd_opt(year + 2, 1, 3)
        .with_context(|| format!("bad end year for congress {identifier}"))?;
    Ok((start, end))
}

/// Committee CSV columns: Chamber, Name, Parent, AlternateName. A blank
/// Parent makes a top-level committee under the chamber; otherwise the
/// parent committee must appear on an earlier row.
fn load_committees(store: &Store, path: &Path, house: &str, senate: &str) -> Result<usize> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut count = 0;
    for record in reader.records() {
        let record = record?;
        let chamber = record.get(0).unwrap_or("").trim();
        let name = record.get(1).unwrap_or("").trim();
        let parent = record.get(2).unwrap_or("").trim();
        let alternate = record.get(3).unwrap_or("").trim();

        if name.is_empty() {
            continue;
        }

        let chamber_id = match chamber {
            "House" => house,
            "Senate" => senate,
            other => anyhow::bail!("unknown chamber {other:?} for committee {name:?}"),
        };

        let parent_id = if parent.is_empty() {
            chamber_id.to_string()
        } else {
            store
                .find_committee_by_name(parent)?
                .map(|org| org.id)
                .with_context(|| format!("parent committee {parent:?} not seeded before {name:?}"))?
        };

        let id = store.ensure_organization(name, "committee", Some(&parent_id))?;
        if !alternate.is_empty() {
            store.add_alternate_name(&id, alternate)?;
        }
        count += 1;
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_congress_dates() {
        let (start, end) = congress_dates(116).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2019, 1, 3).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2021, 1, 3).unwrap());
    }

    #[test]
    fn test_seed_is_idempotent() {
        let store = Store::open_in_memory().unwrap();
        let config = Config::default();
        run(&store, &config).unwrap();
        run(&store, &config).unwrap();

        assert_eq!(
            store.list_congresses().unwrap().len() as i64,
            config.congresses.last - config.congresses.first + 1
        );
        // Second run must not duplicate the chamber tree
        let house = store
            .organization_named("United States House of Representatives")
            .unwrap();
        assert!(house.is_some());
    }
}
