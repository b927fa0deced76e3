//! Hearing reconciliation
//!
//! Per CSV row: a content-hash no-op check, then (Senate) a hearing-number
//! match, then a date + committee-set match against scraped events, then
//! creation. A row never produces a duplicate hearing; the only fatal
//! outcome is the post-chamber row-count check.

use anyhow::{Context, Result};
use regex::Regex;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::OnceLock;

use super::{clean_date, clean_encoding, Chamber, ImportError, RunLog};
use crate::categories;
use crate::store::{Store, JURISDICTION_ID};

/// Run-level tallies, reported when a chamber finishes
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportCounters {
    /// Rows whose content hash was already in the store
    pub existing: usize,
    /// Rows merged into scraped events (one row can update several)
    pub updated: usize,
    /// Rows that became new hearings
    pub created: usize,
}

/// Normalized hearing-number token, e.g. '115-42' out of '115-42 part 2'
fn hearing_number_token(raw: &str) -> Option<&str> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| Regex::new(r"\d{2,}-\d+").unwrap());
    pattern.find(raw).map(|m| m.as_str())
}

fn is_numeric_key(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit())
}

/// Collapse a (committee, subcommittee) slot pair to one legacy key. The
/// subcommittee wins unless its code is the committee code plus a '0'
/// suffix, which marks a full-committee meeting. Non-numeric keys are
/// discarded.
fn collapse_slot(committee: &str, subcommittee: &str) -> Option<String> {
    let committee = is_numeric_key(committee).then(|| committee.to_string());
    let subcommittee = is_numeric_key(subcommittee).then(|| subcommittee.to_string());

    match (committee, subcommittee) {
        (Some(c), Some(s)) => {
            if s == format!("{c}0") {
                Some(c)
            } else {
                Some(s)
            }
        }
        (Some(c), None) => Some(c),
        (None, Some(s)) => Some(s),
        (None, None) => None,
    }
}

/// Stable content hash over the row's full field set
fn row_hash(record: &csv::StringRecord) -> String {
    let mut hasher = Sha256::new();
    for field in record.iter() {
        hasher.update(field.as_bytes());
        hasher.update([0x1f]);
    }
    hex::encode(hasher.finalize())
}

/// Column positions, looked up once per file
struct Columns {
    source: usize,
    date: usize,
    name: usize,
    classification: usize,
    committee1: usize,
    committee2: usize,
    subcommittee: Option<usize>,
    subcommittee2: Option<usize>,
    category: usize,
    hearing_number: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord, chamber: Chamber) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .with_context(|| format!("missing column {name:?}"))
        };

        Ok(Self {
            source: find("source")?,
            date: find("Date")?,
            name: find("Hearing/Report")?,
            classification: find("Type")?,
            committee1: find("Committee1")?,
            committee2: find("Committee2")?,
            subcommittee: match chamber {
                Chamber::House => Some(find("Subcommittee")?),
                Chamber::Senate => None,
            },
            subcommittee2: match chamber {
                Chamber::House => Some(find("Subcommittee2")?),
                Chamber::Senate => None,
            },
            category: find("Category1")?,
            hearing_number: match chamber {
                Chamber::House => None,
                Chamber::Senate => Some(find("Hearing #")?),
            },
        })
    }
}

struct Row {
    source_url: String,
    start_date: String,
    name: String,
    classification: String,
    /// Collapsed, still-unresolved legacy keys
    committee_keys: Vec<String>,
    category: String,
    hearing_number: String,
}

impl Row {
    fn parse(record: &csv::StringRecord, columns: &Columns) -> Self {
        let get = |idx: usize| record.get(idx).unwrap_or("").trim().to_string();

        let mut committee_keys = vec![];
        let slots = [
            (columns.committee1, columns.subcommittee),
            (columns.committee2, columns.subcommittee2),
        ];
        for (committee_idx, subcommittee_idx) in slots {
            let committee = get(committee_idx);
            let subcommittee = subcommittee_idx.map(get).unwrap_or_default();
            if let Some(key) = collapse_slot(&committee, &subcommittee) {
                committee_keys.push(key);
            }
        }

        Self {
            source_url: get(columns.source),
            start_date: clean_date(&get(columns.date)),
            name: clean_encoding(&get(columns.name)),
            classification: get(columns.classification),
            committee_keys,
            category: get(columns.category),
            hearing_number: columns.hearing_number.map(get).unwrap_or_default(),
        }
    }
}

/// Import one chamber's hearing CSV. Callers wrap this in a transaction so
/// a consistency violation discards the whole chamber.
pub fn import_hearings(
    store: &Store,
    path: &Path,
    chamber: Chamber,
    tolerance: i64,
    log: &mut RunLog,
) -> Result<ImportCounters> {
    let source_file = path.to_string_lossy().to_string();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let columns = Columns::from_headers(reader.headers()?, chamber)?;

    let mut counters = ImportCounters::default();
    let mut rows_processed: i64 = 0;
    let mut row_number = 1; // header row

    for record in reader.records() {
        let record = record?;
        row_number += 1;

        let row = Row::parse(&record, &columns);
        if row.name.is_empty() {
            continue;
        }
        rows_processed += 1;

        // 1. Content hash: an unchanged row is a no-op
        let source_hash = row_hash(&record);
        if store.find_event_by_hash(&source_hash)?.is_some() {
            counters.existing += 1;
            continue;
        }

        // 2. Resolve the row's committees through the persisted mapping
        let committees = resolve_committees(store, &row, row_number, log)?;

        // 3. (Senate) hearing-number match beats the date/committee match
        if !row.hearing_number.is_empty() {
            match hearing_number_token(&row.hearing_number) {
                Some(token) => {
                    let matched = store.scraped_events_with_hearing_number_suffix(token)?;
                    if !matched.is_empty() {
                        for event in &matched {
                            merge_into_event(
                                store,
                                &event.id,
                                &row,
                                &source_hash,
                                &source_file,
                                &committees,
                                row_number,
                                log,
                            )?;
                        }
                        counters.updated += matched.len();
                        continue;
                    }
                }
                None => {
                    log.row(
                        row_number,
                        ImportError::MalformedHearingNumber(row.hearing_number.clone()),
                    )?;
                }
            }
        }

        // 4. Date + exact committee-set match against scraped events
        if let Some(event_id) = find_scraped_match(store, &row, &committees, row_number, log)? {
            merge_into_event(
                store,
                &event_id,
                &row,
                &source_hash,
                &source_file,
                &committees,
                row_number,
                log,
            )?;
            counters.updated += 1;
            continue;
        }

        // 5. No match: create the hearing
        let event_id = store.create_event(
            JURISDICTION_ID,
            &row.name,
            &row.start_date,
            &row.classification,
            Some(&source_hash),
            Some(&source_file),
            (!row.hearing_number.is_empty()).then_some(row.hearing_number.as_str()),
        )?;
        for (organization_id, name) in &committees {
            store.attach_committee_participant(&event_id, organization_id, name)?;
        }
        attach_category(store, &event_id, &row, row_number, log)?;
        store.attach_source(&event_id, "spreadsheet", Some(&row.source_url))?;
        counters.created += 1;
    }

    // Post-chamber consistency check. Multi-row collapses leave fewer
    // events than rows; anything beyond the tolerance means systemic
    // miscounting and aborts the chamber.
    let imported = store.count_events_from_file(&source_file)?;
    let shortfall = rows_processed - imported;
    if shortfall > tolerance {
        return Err(ImportError::ConsistencyViolation {
            chamber: chamber.name(),
            shortfall,
            tolerance,
        }
        .into());
    }

    Ok(counters)
}

/// Map collapsed legacy keys to (organization id, name) pairs, deduplicated.
/// Keys with no persisted resolution are logged and dropped.
fn resolve_committees(
    store: &Store,
    row: &Row,
    row_number: usize,
    log: &mut RunLog,
) -> Result<Vec<(String, String)>> {
    let mut seen = BTreeSet::new();
    let mut committees = vec![];

    for key in &row.committee_keys {
        match store.organization_for_legacy_key(key)? {
            Some(organization_id) => {
                if seen.insert(organization_id.clone()) {
                    if let Some(org) = store.get_organization(&organization_id)? {
                        committees.push((org.id, org.name));
                    }
                }
            }
            None => {
                log.row(
                    row_number,
                    format!("no resolved committee for key {key} ({})", row.name),
                )?;
            }
        }
    }

    Ok(committees)
}

/// Exactly one scraped event on the same date with the same committee set,
/// or None. Several candidates narrow by case-insensitive name; still
/// ambiguous logs the candidate set and falls through to creation.
fn find_scraped_match(
    store: &Store,
    row: &Row,
    committees: &[(String, String)],
    row_number: usize,
    log: &mut RunLog,
) -> Result<Option<String>> {
    let wanted: BTreeSet<&str> = committees.iter().map(|(id, _)| id.as_str()).collect();

    let mut candidates = vec![];
    for event in store.scraped_events_on(&row.start_date)? {
        let attached: BTreeSet<String> =
            store.event_committee_ids(&event.id)?.into_iter().collect();
        let attached: BTreeSet<&str> = attached.iter().map(|s| s.as_str()).collect();
        if attached == wanted {
            candidates.push(event);
        }
    }

    match candidates.len() {
        0 => Ok(None),
        1 => Ok(Some(candidates.remove(0).id)),
        _ => {
            let by_name: Vec<_> = candidates
                .iter()
                .filter(|e| e.name.eq_ignore_ascii_case(&row.name))
                .collect();
            if by_name.len() == 1 {
                Ok(Some(by_name[0].id.clone()))
            } else {
                let ids = candidates.iter().map(|e| e.id.clone()).collect();
                log.row(row_number, ImportError::AmbiguousHearingMatch(ids))?;
                Ok(None)
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn merge_into_event(
    store: &Store,
    event_id: &str,
    row: &Row,
    source_hash: &str,
    source_file: &str,
    committees: &[(String, String)],
    row_number: usize,
    log: &mut RunLog,
) -> Result<()> {
    store.update_event(
        event_id,
        &row.name,
        &row.start_date,
        &row.classification,
        source_hash,
        source_file,
    )?;
    store.replace_committee_participants(event_id, committees)?;
    attach_category(store, event_id, row, row_number, log)?;
    store.attach_source(event_id, "spreadsheet", Some(&row.source_url))?;
    Ok(())
}

/// Attach the row's category when it is within the legal set; an illegal
/// category is a diagnostic, never an error.
fn attach_category(
    store: &Store,
    event_id: &str,
    row: &Row,
    row_number: usize,
    log: &mut RunLog,
) -> Result<()> {
    if row.category.is_empty() {
        return Ok(());
    }
    if categories::is_legal(&row.category) {
        store.set_hearing_category(event_id, &row.category)?;
    } else {
        log.row(
            row_number,
            format!(
                "{} ({})",
                ImportError::RejectedCategory(row.category.clone()),
                row.name
            ),
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const HOUSE_HEADER: &str =
        "source,Date,Hearing/Report,Type,Committee1,Committee2,Subcommittee,Subcommittee2,Category1";
    const SENATE_HEADER: &str =
        "source,Date,Hearing/Report,Type,Committee1,Committee2,Category1,Hearing #";

    struct Fixture {
        dir: TempDir,
        store: Store,
        agriculture: String,
    }

    fn fixture() -> Fixture {
        let store = Store::open_in_memory().unwrap();
        store
            .ensure_jurisdiction(JURISDICTION_ID, "United States of America")
            .unwrap();
        for (id, name) in [("Legislative", "Legislative"), ("Agency Conduct", "Agency Conduct")] {
            store.ensure_category_type(id, name).unwrap();
        }

        let root = store
            .ensure_organization("United States Congress", "legislature", None)
            .unwrap();
        let house = store
            .ensure_organization("United States House of Representatives", "chamber", Some(&root))
            .unwrap();
        let agriculture = store
            .ensure_organization("House Committee on Agriculture", "committee", Some(&house))
            .unwrap();
        store
            .upsert_legacy_key("201", "Agriculture", Some(&agriculture))
            .unwrap();

        Fixture {
            dir: TempDir::new().unwrap(),
            store,
            agriculture,
        }
    }

    impl Fixture {
        fn write_csv(&self, name: &str, contents: &str) -> std::path::PathBuf {
            let path = self.dir.path().join(name);
            let mut file = std::fs::File::create(&path).unwrap();
            write!(file, "{contents}").unwrap();
            path
        }

        fn log(&self) -> RunLog {
            RunLog::open(&self.dir.path().join("bad_rows.txt")).unwrap()
        }
    }

    #[test]
    fn test_new_hearing_created_with_committee_and_category() {
        let fx = fixture();
        let path = fx.write_csv(
            "house.csv",
            &format!(
                "{HOUSE_HEADER}\n\
                 http://example.com,2020-01-15,Farm Bill Oversight,Hearing,201,,,,Legislative\n"
            ),
        );
        let mut log = fx.log();

        let counters =
            import_hearings(&fx.store, &path, Chamber::House, 4, &mut log).unwrap();
        assert_eq!(counters.created, 1);
        assert_eq!(counters.existing, 0);

        let ids = fx
            .store
            .events_matching_date_name("2020-01-15", "Farm Bill Oversight")
            .unwrap();
        assert_eq!(ids.len(), 1);
        assert_eq!(
            fx.store.event_committee_ids(&ids[0]).unwrap(),
            vec![fx.agriculture.clone()]
        );
        assert_eq!(
            fx.store.hearing_category(&ids[0]).unwrap().as_deref(),
            Some("Legislative")
        );
    }

    #[test]
    fn test_reimport_is_a_noop() {
        let fx = fixture();
        let path = fx.write_csv(
            "house.csv",
            &format!(
                "{HOUSE_HEADER}\n\
                 http://example.com,2020-01-15,Farm Bill Oversight,Hearing,201,,,,Legislative\n"
            ),
        );
        let mut log = fx.log();

        let first = import_hearings(&fx.store, &path, Chamber::House, 4, &mut log).unwrap();
        assert_eq!(first.created, 1);

        let second = import_hearings(&fx.store, &path, Chamber::House, 4, &mut log).unwrap();
        assert_eq!(second.existing, 1);
        assert_eq!(second.created, 0);
        assert_eq!(
            fx.store
                .events_matching_date_name("2020-01-15", "Farm Bill Oversight")
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_full_committee_sentinel_collapses_to_parent() {
        assert_eq!(collapse_slot("201", "2010"), Some("201".to_string()));
        assert_eq!(collapse_slot("201", "215"), Some("215".to_string()));
        assert_eq!(collapse_slot("201", ""), Some("201".to_string()));
        assert_eq!(collapse_slot("", "215"), Some("215".to_string()));
        assert_eq!(collapse_slot("n/a", ""), None);
        assert_eq!(collapse_slot("", ""), None);
    }

    #[test]
    fn test_scraped_event_merge_on_date_and_committee_set() {
        let fx = fixture();
        let scraped = fx
            .store
            .create_event(
                JURISDICTION_ID,
                "FARM BILL OVERSIGHT",
                "2020-01-15",
                "Hearing",
                None,
                None,
                None,
            )
            .unwrap();
        fx.store.attach_source(&scraped, "scraped", None).unwrap();
        fx.store
            .attach_committee_participant(&scraped, &fx.agriculture, "House Committee on Agriculture")
            .unwrap();

        let path = fx.write_csv(
            "house.csv",
            &format!(
                "{HOUSE_HEADER}\n\
                 http://example.com,2020-01-15,Farm Bill Oversight,Hearing,201,,,,Legislative\n"
            ),
        );
        let mut log = fx.log();

        let counters =
            import_hearings(&fx.store, &path, Chamber::House, 4, &mut log).unwrap();
        assert_eq!(counters.updated, 1);
        assert_eq!(counters.created, 0);

        // Merged, not duplicated, and renamed to the spreadsheet title
        let merged = fx.store.get_event(&scraped).unwrap().unwrap();
        assert_eq!(merged.name, "Farm Bill Oversight");
        assert!(merged.source_hash.is_some());
        assert_eq!(
            fx.store.hearing_category(&scraped).unwrap().as_deref(),
            Some("Legislative")
        );
    }

    #[test]
    fn test_ambiguous_match_falls_through_to_creation() {
        let fx = fixture();
        for name in ["Session One", "Session Two"] {
            let scraped = fx
                .store
                .create_event(JURISDICTION_ID, name, "2020-01-15", "Hearing", None, None, None)
                .unwrap();
            fx.store.attach_source(&scraped, "scraped", None).unwrap();
            fx.store
                .attach_committee_participant(
                    &scraped,
                    &fx.agriculture,
                    "House Committee on Agriculture",
                )
                .unwrap();
        }

        let path = fx.write_csv(
            "house.csv",
            &format!(
                "{HOUSE_HEADER}\n\
                 http://example.com,2020-01-15,Some Other Title,Hearing,201,,,,Legislative\n"
            ),
        );
        let mut log = fx.log();

        let counters =
            import_hearings(&fx.store, &path, Chamber::House, 4, &mut log).unwrap();
        assert_eq!(counters.created, 1);
        assert_eq!(counters.updated, 0);
    }

    #[test]
    fn test_senate_hearing_number_updates_every_session() {
        let fx = fixture();
        for name in ["Budget Request Day 1", "Budget Request Day 2"] {
            let scraped = fx
                .store
                .create_event(
                    JURISDICTION_ID,
                    name,
                    "2018-03-01",
                    "Hearing",
                    None,
                    None,
                    Some("S.Hrg. 115-42"),
                )
                .unwrap();
            fx.store.attach_source(&scraped, "scraped", None).unwrap();
        }

        let path = fx.write_csv(
            "senate.csv",
            &format!(
                "{SENATE_HEADER}\n\
                 http://example.com,2018-03-01,Budget Request,Hearing,201,,Legislative,115-42 part 2\n"
            ),
        );
        let mut log = fx.log();

        let counters =
            import_hearings(&fx.store, &path, Chamber::Senate, 79, &mut log).unwrap();
        assert_eq!(counters.updated, 2);
        assert_eq!(counters.created, 0);
    }

    #[test]
    fn test_malformed_hearing_number_is_logged_not_fatal() {
        let fx = fixture();
        let path = fx.write_csv(
            "senate.csv",
            &format!(
                "{SENATE_HEADER}\n\
                 http://example.com,2018-03-01,Budget Request,Hearing,201,,Legislative,no number here\n"
            ),
        );
        let log_path = fx.dir.path().join("bad_rows.txt");
        let mut log = RunLog::open(&log_path).unwrap();

        let counters =
            import_hearings(&fx.store, &path, Chamber::Senate, 79, &mut log).unwrap();
        assert_eq!(counters.created, 1);

        log.flush().unwrap();
        let contents = std::fs::read_to_string(&log_path).unwrap();
        assert!(contents.contains("no NN-N token"));
        assert!(contents.contains("row 2"));
    }

    #[test]
    fn test_illegal_category_skipped_hearing_still_created() {
        let fx = fixture();
        let path = fx.write_csv(
            "house.csv",
            &format!(
                "{HOUSE_HEADER}\n\
                 http://example.com,2020-01-15,Farm Bill Oversight,Hearing,201,,,,Oversight\n"
            ),
        );
        let log_path = fx.dir.path().join("bad_rows.txt");
        let mut log = RunLog::open(&log_path).unwrap();

        let counters =
            import_hearings(&fx.store, &path, Chamber::House, 4, &mut log).unwrap();
        assert_eq!(counters.created, 1);

        let ids = fx
            .store
            .events_matching_date_name("2020-01-15", "Farm Bill Oversight")
            .unwrap();
        assert_eq!(fx.store.hearing_category(&ids[0]).unwrap(), None);

        log.flush().unwrap();
        let contents = std::fs::read_to_string(&log_path).unwrap();
        assert!(contents.contains("unrecognized category"));
    }

    #[test]
    fn test_consistency_violation_when_shortfall_exceeds_tolerance() {
        let fx = fixture();
        // Two identical rows collapse to one event via the hash no-op
        let row = "http://example.com,2020-01-15,Farm Bill Oversight,Hearing,201,,,,Legislative";
        let path = fx.write_csv("house.csv", &format!("{HOUSE_HEADER}\n{row}\n{row}\n"));
        let mut log = fx.log();

        let err = import_hearings(&fx.store, &path, Chamber::House, 0, &mut log).unwrap_err();
        assert!(err.to_string().contains("shortfall"));

        // With slack for the collapse, the same file imports cleanly
        let fx2 = fixture();
        let path2 = fx2.write_csv("house.csv", &format!("{HOUSE_HEADER}\n{row}\n{row}\n"));
        let mut log2 = fx2.log();
        let counters =
            import_hearings(&fx2.store, &path2, Chamber::House, 4, &mut log2).unwrap();
        assert_eq!(counters.created, 1);
        assert_eq!(counters.existing, 1);
    }

    #[test]
    fn test_hearing_number_token() {
        assert_eq!(hearing_number_token("115-42 part 2"), Some("115-42"));
        assert_eq!(hearing_number_token("S.Hrg. 116-103"), Some("116-103"));
        assert_eq!(hearing_number_token("no digits"), None);
        assert_eq!(hearing_number_token("7-1"), None);
    }
}
