//! Committee-key resolution
//!
//! Maps legacy spreadsheet committee codes ("Lugar IDs") and their free-text
//! names onto canonical organizations, memoizing every outcome in
//! `legacy_committee_keys`. Three-digit codes are full committees scoped to
//! the chamber; any other length is a subcommittee scoped to the most
//! recently resolved full committee, so the resolver is stateful across the
//! rows of one committee-key file.

use anyhow::Result;
use std::path::Path;

use super::{clean_encoding, Chamber, ImportError, RunLog};
use crate::store::{OrganizationRow, Store};

/// Rows with these names record a full-committee meeting under a
/// subcommittee listing; they are skipped outright.
const SENTINEL_NAMES: [&str; 2] = ["Full Committee", "Full Commission"];

/// Outcome of one resolution attempt
pub enum Resolution {
    Match(OrganizationRow),
    Failed(ImportError),
}

pub struct CommitteeResolver<'a> {
    store: &'a Store,
    chamber_id: String,
    /// Parent scope for subcommittee keys; starts as the chamber and moves
    /// to each full committee as it resolves.
    current_parent: String,
}

impl<'a> CommitteeResolver<'a> {
    pub fn new(store: &'a Store, chamber: Chamber) -> Result<Self> {
        let chamber_id = store
            .organization_named(chamber.organization_name())?
            .map(|org| org.id)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "chamber {:?} not seeded; run `oversight seed` first",
                    chamber.organization_name()
                )
            })?;

        Ok(Self {
            store,
            current_parent: chamber_id.clone(),
            chamber_id,
        })
    }

    pub fn is_sentinel(name: &str) -> bool {
        SENTINEL_NAMES.contains(&name)
    }

    /// Resolve one (key, name) pair and memoize the outcome. Full-committee
    /// keys (three digits) also become the scope for subsequent
    /// subcommittee keys.
    pub fn resolve(&mut self, lugar_id: &str, lugar_name: &str) -> Result<Resolution> {
        let full_committee = lugar_id.len() == 3;
        let scope = if full_committee {
            self.chamber_id.clone()
        } else {
            self.current_parent.clone()
        };

        let resolution = self.lookup(lugar_id, lugar_name, &scope)?;

        match &resolution {
            Resolution::Match(org) => {
                self.store
                    .upsert_legacy_key(lugar_id, lugar_name, Some(&org.id))?;
                if full_committee {
                    self.current_parent = org.id.clone();
                }
            }
            Resolution::Failed(_) => {
                self.store.upsert_legacy_key(lugar_id, lugar_name, None)?;
            }
        }

        Ok(resolution)
    }

    /// Exact name, then case-insensitive substring, then alternate names.
    /// More than one hit at any stage is ambiguous; no fall-through.
    fn lookup(&self, lugar_id: &str, lugar_name: &str, scope: &str) -> Result<Resolution> {
        let stages = [
            self.store.committees_named(lugar_name, scope)?,
            self.store.committees_name_contains(lugar_name, scope)?,
            self.store
                .committees_alternate_name_contains(lugar_name, scope)?,
        ];

        for mut matches in stages {
            match matches.len() {
                0 => continue,
                1 => return Ok(Resolution::Match(matches.remove(0))),
                _ => {
                    return Ok(Resolution::Failed(ImportError::AmbiguousCommittee {
                        lugar_id: lugar_id.to_string(),
                        lugar_name: lugar_name.to_string(),
                    }))
                }
            }
        }

        Ok(Resolution::Failed(ImportError::UnresolvedCommittee {
            lugar_id: lugar_id.to_string(),
            lugar_name: lugar_name.to_string(),
        }))
    }
}

/// Import one chamber's committee-key CSV. Columns: legacy key, legacy
/// display name. Returns (resolved, failed) counts.
pub fn import_committee_keys(
    store: &Store,
    path: &Path,
    chamber: Chamber,
    log: &mut RunLog,
) -> Result<(usize, usize)> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut resolver = CommitteeResolver::new(store, chamber)?;

    let mut resolved = 0;
    let mut failed = 0;
    let mut row_number = 1; // header row

    for record in reader.records() {
        let record = record?;
        row_number += 1;

        let lugar_id = record.get(0).unwrap_or("").trim().to_string();
        let lugar_name = clean_encoding(record.get(1).unwrap_or("").trim());

        if lugar_id.is_empty() || lugar_name.is_empty() {
            continue;
        }
        if CommitteeResolver::is_sentinel(&lugar_name) {
            continue;
        }

        match resolver.resolve(&lugar_id, &lugar_name)? {
            Resolution::Match(_) => resolved += 1,
            Resolution::Failed(err) => {
                log.row(row_number, &err)?;
                failed += 1;
            }
        }
    }

    Ok((resolved, failed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;

    fn seeded_store() -> (Store, String, String) {
        let store = Store::open_in_memory().unwrap();
        let root = store
            .ensure_organization("United States Congress", "legislature", None)
            .unwrap();
        let house = store
            .ensure_organization("United States House of Representatives", "chamber", Some(&root))
            .unwrap();
        let agriculture = store
            .ensure_organization("House Committee on Agriculture", "committee", Some(&house))
            .unwrap();
        (store, house, agriculture)
    }

    #[test]
    fn test_exact_match_becomes_current_parent() {
        let (store, _house, agriculture) = seeded_store();
        store
            .ensure_organization("Subcommittee on Livestock", "committee", Some(&agriculture))
            .unwrap();

        let mut resolver = CommitteeResolver::new(&store, Chamber::House).unwrap();

        match resolver.resolve("201", "House Committee on Agriculture").unwrap() {
            Resolution::Match(org) => assert_eq!(org.id, agriculture),
            Resolution::Failed(err) => panic!("expected match, got {err}"),
        }

        // Two-digit key scopes under the committee just resolved
        match resolver.resolve("20", "Subcommittee on Livestock").unwrap() {
            Resolution::Match(org) => {
                assert_eq!(org.parent_id.as_deref(), Some(agriculture.as_str()))
            }
            Resolution::Failed(err) => panic!("expected match, got {err}"),
        }
    }

    #[test]
    fn test_substring_match_is_case_insensitive() {
        let (store, _house, agriculture) = seeded_store();
        let mut resolver = CommitteeResolver::new(&store, Chamber::House).unwrap();

        match resolver.resolve("201", "committee on agriculture").unwrap() {
            Resolution::Match(org) => assert_eq!(org.id, agriculture),
            Resolution::Failed(err) => panic!("expected match, got {err}"),
        }
    }

    #[test]
    fn test_alternate_name_match() {
        let (store, _house, agriculture) = seeded_store();
        store
            .add_alternate_name(&agriculture, "Committee on Farming")
            .unwrap();
        let mut resolver = CommitteeResolver::new(&store, Chamber::House).unwrap();

        match resolver.resolve("201", "Farming").unwrap() {
            Resolution::Match(org) => assert_eq!(org.id, agriculture),
            Resolution::Failed(err) => panic!("expected match, got {err}"),
        }
    }

    #[test]
    fn test_ambiguous_does_not_fall_through() {
        let (store, house, _agriculture) = seeded_store();
        store
            .ensure_organization("House Committee on Agriculture Policy", "committee", Some(&house))
            .unwrap();
        let mut resolver = CommitteeResolver::new(&store, Chamber::House).unwrap();

        // Substring stage hits both committees
        match resolver.resolve("202", "Agriculture").unwrap() {
            Resolution::Failed(ImportError::AmbiguousCommittee { .. }) => {}
            _ => panic!("expected ambiguous"),
        }
        assert_eq!(store.organization_for_legacy_key("202").unwrap(), None);
    }

    #[test]
    fn test_unresolved_is_memoized_without_organization() {
        let (store, _house, _agriculture) = seeded_store();
        let mut resolver = CommitteeResolver::new(&store, Chamber::House).unwrap();

        match resolver.resolve("999", "Committee on Mysteries").unwrap() {
            Resolution::Failed(ImportError::UnresolvedCommittee { .. }) => {}
            _ => panic!("expected unresolved"),
        }
        assert_eq!(store.organization_for_legacy_key("999").unwrap(), None);
    }

    #[test]
    fn test_sentinel_rows_are_skipped() {
        assert!(CommitteeResolver::is_sentinel("Full Committee"));
        assert!(CommitteeResolver::is_sentinel("Full Commission"));
        assert!(!CommitteeResolver::is_sentinel("Subcommittee on Livestock"));
    }
}
