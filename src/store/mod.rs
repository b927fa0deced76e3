//! Relational storage with SQLite
//!
//! Single `Store` owning the connection. Writes are natural-key upserts
//! (legacy key, congress+committee, event id) so operator-triggered batch
//! runs can be repeated safely. The importer wraps each chamber in a
//! transaction via [`Store::begin`].

mod schema;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Transaction};
use std::path::Path;
use uuid::Uuid;

pub use schema::SCHEMA;

/// The single supported jurisdiction
pub const JURISDICTION_ID: &str = "ocd-jurisdiction/country:us/legislature";

/// Participant attachment kinds. Closed set; stored as the discriminant
/// string in `event_participants.entity_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityType {
    Committee,
    Person,
    Witness,
    CommitteeMember,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Committee => "committee",
            EntityType::Person => "person",
            EntityType::Witness => "witness",
            EntityType::CommitteeMember => "committee_member",
        }
    }
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path).context("Failed to open database")?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Begin a transaction scope. Dropped uncommitted, it rolls back.
    pub fn begin(&self) -> Result<Transaction<'_>> {
        Ok(self.conn.unchecked_transaction()?)
    }

    // ============================================
    // JURISDICTIONS & ORGANIZATIONS
    // ============================================

    pub fn ensure_jurisdiction(&self, id: &str, name: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO jurisdictions (id, name) VALUES (?, ?)",
            params![id, name],
        )?;
        Ok(())
    }

    /// Get-or-create an organization by (name, parent). Validates tree depth
    /// at creation: nothing may hang below a subcommittee.
    pub fn ensure_organization(
        &self,
        name: &str,
        classification: &str,
        parent_id: Option<&str>,
    ) -> Result<String> {
        let existing: Option<String> = match parent_id {
            Some(pid) => self
                .conn
                .query_row(
                    "SELECT id FROM organizations WHERE name = ? AND parent_id = ?",
                    params![name, pid],
                    |row| row.get(0),
                )
                .ok(),
            None => self
                .conn
                .query_row(
                    "SELECT id FROM organizations WHERE name = ? AND parent_id IS NULL",
                    params![name],
                    |row| row.get(0),
                )
                .ok(),
        };

        if let Some(id) = existing {
            return Ok(id);
        }

        if let Some(pid) = parent_id {
            let depth = self.org_depth(pid)?;
            if depth >= 3 {
                anyhow::bail!("organization tree deeper than subcommittee level under {pid}");
            }
        }

        let id = format!("ocd-organization/{}", Uuid::new_v4());
        self.conn.execute(
            "INSERT INTO organizations (id, name, classification, parent_id) VALUES (?, ?, ?, ?)",
            params![id, name, classification, parent_id],
        )?;
        Ok(id)
    }

    /// Levels above the legislature root: 0 root, 1 chamber, 2 committee,
    /// 3 subcommittee.
    fn org_depth(&self, id: &str) -> Result<i64> {
        let mut depth = 0;
        let mut current = id.to_string();
        while let Some(parent) = self.parent_of(&current)? {
            depth += 1;
            current = parent;
            if depth > 3 {
                anyhow::bail!("organization parent chain too deep at {id}");
            }
        }
        Ok(depth)
    }

    pub fn parent_of(&self, id: &str) -> Result<Option<String>> {
        let result = self.conn.query_row(
            "SELECT parent_id FROM organizations WHERE id = ?",
            params![id],
            |row| row.get(0),
        );

        match result {
            Ok(parent) => Ok(parent),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_organization(&self, id: &str) -> Result<Option<OrganizationRow>> {
        let result = self.conn.query_row(
            "SELECT id, name, classification, parent_id FROM organizations WHERE id = ?",
            params![id],
            map_organization,
        );

        match result {
            Ok(org) => Ok(Some(org)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// A committee is a subcommittee iff its grandparent is a chamber.
    pub fn is_subcommittee(&self, id: &str) -> Result<bool> {
        let grandparent: Option<String> = match self.conn.query_row(
            "SELECT p.parent_id FROM organizations o
             JOIN organizations p ON o.parent_id = p.id
             WHERE o.id = ?",
            params![id],
            |row| row.get(0),
        ) {
            Ok(parent) => parent,
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => return Err(e.into()),
        };

        match grandparent {
            Some(gp_id) => {
                let classification: String = self.conn.query_row(
                    "SELECT classification FROM organizations WHERE id = ?",
                    params![gp_id],
                    |row| row.get(0),
                )?;
                Ok(classification == "chamber")
            }
            None => Ok(false),
        }
    }

    pub fn add_alternate_name(&self, organization_id: &str, name: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO organization_names (organization_id, name) VALUES (?, ?)",
            params![organization_id, name],
        )?;
        Ok(())
    }

    /// Any organization with this exact name, regardless of classification.
    pub fn organization_named(&self, name: &str) -> Result<Option<OrganizationRow>> {
        let result = self.conn.query_row(
            "SELECT id, name, classification, parent_id FROM organizations WHERE name = ?",
            params![name],
            map_organization,
        );

        match result {
            Ok(org) => Ok(Some(org)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn find_committee_by_name(&self, name: &str) -> Result<Option<OrganizationRow>> {
        let result = self.conn.query_row(
            "SELECT id, name, classification, parent_id FROM organizations
             WHERE name = ? AND classification = 'committee'",
            params![name],
            map_organization,
        );

        match result {
            Ok(org) => Ok(Some(org)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Exact case-sensitive name match among committees under a parent.
    pub fn committees_named(&self, name: &str, parent_id: &str) -> Result<Vec<OrganizationRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, classification, parent_id FROM organizations
             WHERE name = ? AND parent_id = ? AND classification = 'committee'",
        )?;
        let rows = stmt.query_map(params![name, parent_id], map_organization)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Case-insensitive substring match among committees under a parent.
    pub fn committees_name_contains(
        &self,
        fragment: &str,
        parent_id: &str,
    ) -> Result<Vec<OrganizationRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, classification, parent_id FROM organizations
             WHERE instr(lower(name), lower(?)) > 0
               AND parent_id = ? AND classification = 'committee'",
        )?;
        let rows = stmt.query_map(params![fragment, parent_id], map_organization)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Substring match against alternate names of committees under a parent.
    pub fn committees_alternate_name_contains(
        &self,
        fragment: &str,
        parent_id: &str,
    ) -> Result<Vec<OrganizationRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT o.id, o.name, o.classification, o.parent_id
             FROM organizations o
             JOIN organization_names n ON n.organization_id = o.id
             WHERE instr(lower(n.name), lower(?)) > 0
               AND o.parent_id = ? AND o.classification = 'committee'",
        )?;
        let rows = stmt.query_map(params![fragment, parent_id], map_organization)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn subcommittee_ids(&self, committee_id: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM organizations WHERE parent_id = ?")?;
        let rows = stmt.query_map(params![committee_id], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    // ============================================
    // LEGACY COMMITTEE KEYS
    // ============================================

    /// Record a resolver result for (lugar_id, lugar_name). Never duplicated
    /// for the same pair; a later successful resolution fills in the
    /// organization.
    pub fn upsert_legacy_key(
        &self,
        lugar_id: &str,
        lugar_name: &str,
        organization_id: Option<&str>,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO legacy_committee_keys (lugar_id, lugar_name, organization_id)
             VALUES (?, ?, ?)
             ON CONFLICT(lugar_id, lugar_name) DO UPDATE SET
                 organization_id = COALESCE(excluded.organization_id, organization_id)",
            params![lugar_id, lugar_name, organization_id],
        )?;
        Ok(())
    }

    /// Resolve a spreadsheet committee code through the persisted mapping.
    /// A code memoized under several names takes its earliest resolution.
    pub fn organization_for_legacy_key(&self, lugar_id: &str) -> Result<Option<String>> {
        let result = self.conn.query_row(
            "SELECT organization_id FROM legacy_committee_keys
             WHERE lugar_id = ? AND organization_id IS NOT NULL
             ORDER BY id
             LIMIT 1",
            params![lugar_id],
            |row| row.get(0),
        );

        match result {
            Ok(id) => Ok(Some(id)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    // ============================================
    // EVENTS
    // ============================================

    pub fn find_event_by_hash(&self, source_hash: &str) -> Result<Option<String>> {
        let result = self.conn.query_row(
            "SELECT id FROM events WHERE source_hash = ?",
            params![source_hash],
            |row| row.get(0),
        );

        match result {
            Ok(id) => Ok(Some(id)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create_event(
        &self,
        jurisdiction_id: &str,
        name: &str,
        start_date: &str,
        classification: &str,
        source_hash: Option<&str>,
        source_file: Option<&str>,
        hearing_number: Option<&str>,
    ) -> Result<String> {
        let id = format!("ocd-event/{}", Uuid::new_v4());
        self.conn.execute(
            "INSERT INTO events
             (id, jurisdiction_id, name, start_date, classification,
              source_hash, source_file, hearing_number)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                id,
                jurisdiction_id,
                name,
                start_date,
                classification,
                source_hash,
                source_file,
                hearing_number
            ],
        )?;
        Ok(id)
    }

    /// Merge spreadsheet fields into an existing scraped event.
    pub fn update_event(
        &self,
        event_id: &str,
        name: &str,
        start_date: &str,
        classification: &str,
        source_hash: &str,
        source_file: &str,
    ) -> Result<()> {
        self.conn.execute(
            "UPDATE events SET name = ?, start_date = ?, classification = ?,
                               source_hash = ?, source_file = ?
             WHERE id = ?",
            params![name, start_date, classification, source_hash, source_file, event_id],
        )?;
        Ok(())
    }

    pub fn get_event(&self, event_id: &str) -> Result<Option<EventRow>> {
        let result = self.conn.query_row(
            "SELECT id, name, start_date, classification, source_hash, source_file, hearing_number
             FROM events WHERE id = ?",
            params![event_id],
            map_event,
        );

        match result {
            Ok(event) => Ok(Some(event)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Events on a date that did not come from a spreadsheet or web-form
    /// import, i.e. scraped candidates for reconciliation.
    pub fn scraped_events_on(&self, start_date: &str) -> Result<Vec<EventRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT e.id, e.name, e.start_date, e.classification,
                    e.source_hash, e.source_file, e.hearing_number
             FROM events e
             WHERE e.start_date = ?
               AND NOT EXISTS (
                   SELECT 1 FROM event_sources s
                   WHERE s.event_id = e.id AND s.note IN ('spreadsheet', 'web form')
               )",
        )?;
        let rows = stmt.query_map(params![start_date], map_event)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Scraped events whose recorded hearing number ends in the given token.
    pub fn scraped_events_with_hearing_number_suffix(
        &self,
        token: &str,
    ) -> Result<Vec<EventRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT e.id, e.name, e.start_date, e.classification,
                    e.source_hash, e.source_file, e.hearing_number
             FROM events e
             WHERE e.hearing_number LIKE '%' || ?
               AND NOT EXISTS (
                   SELECT 1 FROM event_sources s
                   WHERE s.event_id = e.id AND s.note IN ('spreadsheet', 'web form')
               )",
        )?;
        let rows = stmt.query_map(params![token], map_event)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn events_matching_date_name(&self, start_date: &str, name: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM events WHERE start_date = ? AND name = ?")?;
        let rows = stmt.query_map(params![start_date, name], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn count_events_from_file(&self, source_file: &str) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM events WHERE source_file = ?",
            params![source_file],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // ============================================
    // PARTICIPANTS, SOURCES, CATEGORIES
    // ============================================

    pub fn attach_committee_participant(
        &self,
        event_id: &str,
        organization_id: &str,
        name: &str,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO event_participants (event_id, entity_type, organization_id, name)
             VALUES (?, ?, ?, ?)",
            params![event_id, EntityType::Committee.as_str(), organization_id, name],
        )?;
        Ok(())
    }

    pub fn attach_named_participant(
        &self,
        event_id: &str,
        entity_type: EntityType,
        name: &str,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO event_participants (event_id, entity_type, organization_id, name)
             VALUES (?, ?, NULL, ?)",
            params![event_id, entity_type.as_str(), name],
        )?;
        Ok(())
    }

    /// Committee organization ids attached to an event.
    pub fn event_committee_ids(&self, event_id: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT organization_id FROM event_participants
             WHERE event_id = ? AND entity_type = 'committee'
               AND organization_id IS NOT NULL",
        )?;
        let rows = stmt.query_map(params![event_id], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Drop and reattach an event's committee participants.
    pub fn replace_committee_participants(
        &self,
        event_id: &str,
        committees: &[(String, String)],
    ) -> Result<()> {
        self.conn.execute(
            "DELETE FROM event_participants WHERE event_id = ? AND entity_type = 'committee'",
            params![event_id],
        )?;
        for (organization_id, name) in committees {
            self.attach_committee_participant(event_id, organization_id, name)?;
        }
        Ok(())
    }

    pub fn attach_source(&self, event_id: &str, note: &str, url: Option<&str>) -> Result<()> {
        self.conn.execute(
            "INSERT INTO event_sources (event_id, note, url) VALUES (?, ?, ?)",
            params![event_id, note, url],
        )?;
        Ok(())
    }

    pub fn ensure_category_type(&self, id: &str, name: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO category_types (id, name) VALUES (?, ?)",
            params![id, name],
        )?;
        Ok(())
    }

    pub fn category_type_by_name(&self, name: &str) -> Result<Option<String>> {
        let result = self.conn.query_row(
            "SELECT id FROM category_types WHERE name = ?",
            params![name],
            |row| row.get(0),
        );

        match result {
            Ok(id) => Ok(Some(id)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Attach or overwrite the single category of a hearing.
    pub fn set_hearing_category(&self, event_id: &str, category_id: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO hearing_categories (event_id, category_id) VALUES (?, ?)
             ON CONFLICT(event_id) DO UPDATE SET category_id = excluded.category_id",
            params![event_id, category_id],
        )?;
        Ok(())
    }

    pub fn hearing_category(&self, event_id: &str) -> Result<Option<String>> {
        let result = self.conn.query_row(
            "SELECT category_id FROM hearing_categories WHERE event_id = ?",
            params![event_id],
            |row| row.get(0),
        );

        match result {
            Ok(id) => Ok(Some(id)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    // ============================================
    // CONGRESSES
    // ============================================

    pub fn upsert_congress(
        &self,
        identifier: i64,
        name: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        inactive_days: i64,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO congresses (identifier, name, start_date, end_date, inactive_days)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(identifier) DO UPDATE SET
                 name = excluded.name,
                 start_date = excluded.start_date,
                 end_date = excluded.end_date,
                 inactive_days = excluded.inactive_days",
            params![
                identifier,
                name,
                start_date.to_string(),
                end_date.to_string(),
                inactive_days
            ],
        )?;
        Ok(())
    }

    pub fn list_congresses(&self) -> Result<Vec<CongressRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT identifier, name, start_date, end_date, inactive_days
             FROM congresses ORDER BY identifier",
        )?;
        let rows = stmt.query_map([], map_congress)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn get_congress(&self, identifier: i64) -> Result<Option<CongressRow>> {
        let result = self.conn.query_row(
            "SELECT identifier, name, start_date, end_date, inactive_days
             FROM congresses WHERE identifier = ?",
            params![identifier],
            map_congress,
        );

        match result {
            Ok(congress) => Ok(Some(congress)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    // ============================================
    // RATINGS
    // ============================================

    /// Count a committee's hearings per category within a date range.
    /// Hearings attached to any direct subcommittee count toward the parent.
    pub fn hearing_counts_by_category(
        &self,
        committee_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<(String, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT hc.category_id, COUNT(DISTINCT e.id)
             FROM events e
             JOIN event_participants p ON p.event_id = e.id
             JOIN organizations o ON p.organization_id = o.id
             JOIN hearing_categories hc ON hc.event_id = e.id
             WHERE (o.id = ?1 OR o.parent_id = ?1)
               AND p.entity_type = 'committee'
               AND e.start_date >= ?2 AND e.start_date <= ?3
             GROUP BY hc.category_id",
        )?;
        let rows = stmt.query_map(
            params![committee_id, start_date.to_string(), end_date.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn upsert_rating(
        &self,
        congress: i64,
        committee_id: &str,
        investigative_oversight: i64,
        policy_legislative: i64,
        total: i64,
        chp_points: i64,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO committee_ratings
             (congress, committee_id, investigative_oversight_hearings,
              policy_legislative_hearings, total_hearings, chp_points)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(congress, committee_id) DO UPDATE SET
                 investigative_oversight_hearings = excluded.investigative_oversight_hearings,
                 policy_legislative_hearings = excluded.policy_legislative_hearings,
                 total_hearings = excluded.total_hearings,
                 chp_points = excluded.chp_points",
            params![
                congress,
                committee_id,
                investigative_oversight,
                policy_legislative,
                total,
                chp_points
            ],
        )?;
        Ok(())
    }

    pub fn get_rating(&self, congress: i64, committee_id: &str) -> Result<Option<RatingRow>> {
        let result = self.conn.query_row(
            "SELECT congress, committee_id, investigative_oversight_hearings,
                    policy_legislative_hearings, total_hearings, chp_points
             FROM committee_ratings WHERE congress = ? AND committee_id = ?",
            params![congress, committee_id],
            map_rating,
        );

        match result {
            Ok(rating) => Ok(Some(rating)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// A committee's ratings, most recent congress first.
    pub fn ratings_for_committee(&self, committee_id: &str) -> Result<Vec<RatingRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT congress, committee_id, investigative_oversight_hearings,
                    policy_legislative_hearings, total_hearings, chp_points
             FROM committee_ratings WHERE committee_id = ?
             ORDER BY congress DESC",
        )?;
        let rows = stmt.query_map(params![committee_id], map_rating)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn ratings_for_congress(&self, congress: i64) -> Result<Vec<(RatingRow, String)>> {
        let mut stmt = self.conn.prepare(
            "SELECT r.congress, r.committee_id, r.investigative_oversight_hearings,
                    r.policy_legislative_hearings, r.total_hearings, r.chp_points,
                    o.name
             FROM committee_ratings r
             JOIN organizations o ON o.id = r.committee_id
             WHERE r.congress = ?
             ORDER BY r.chp_points DESC, o.name",
        )?;
        let rows = stmt.query_map(params![congress], |row| {
            Ok((map_rating(row)?, row.get::<_, String>(6)?))
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Highest chp_points a committee has posted across all congresses.
    pub fn max_chp_points(&self, committee_id: &str) -> Result<i64> {
        let max: Option<i64> = self.conn.query_row(
            "SELECT MAX(chp_points) FROM committee_ratings WHERE committee_id = ?",
            params![committee_id],
            |row| row.get(0),
        )?;
        Ok(max.unwrap_or(0))
    }

    /// Per-dimension maxima across a committee's history:
    /// (investigative, policy_legislative, total).
    pub fn max_counts(&self, committee_id: &str) -> Result<(i64, i64, i64)> {
        let row = self.conn.query_row(
            "SELECT MAX(investigative_oversight_hearings),
                    MAX(policy_legislative_hearings),
                    MAX(total_hearings)
             FROM committee_ratings WHERE committee_id = ?",
            params![committee_id],
            |row| {
                Ok((
                    row.get::<_, Option<i64>>(0)?,
                    row.get::<_, Option<i64>>(1)?,
                    row.get::<_, Option<i64>>(2)?,
                ))
            },
        )?;
        Ok((row.0.unwrap_or(0), row.1.unwrap_or(0), row.2.unwrap_or(0)))
    }

    /// Per-dimension averages across a committee's history.
    pub fn avg_counts(&self, committee_id: &str) -> Result<(f64, f64, f64)> {
        let row = self.conn.query_row(
            "SELECT AVG(investigative_oversight_hearings),
                    AVG(policy_legislative_hearings),
                    AVG(total_hearings)
             FROM committee_ratings WHERE committee_id = ?",
            params![committee_id],
            |row| {
                Ok((
                    row.get::<_, Option<f64>>(0)?,
                    row.get::<_, Option<f64>>(1)?,
                    row.get::<_, Option<f64>>(2)?,
                ))
            },
        )?;
        Ok((row.0.unwrap_or(0.0), row.1.unwrap_or(0.0), row.2.unwrap_or(0.0)))
    }
}

fn map_organization(row: &rusqlite::Row) -> rusqlite::Result<OrganizationRow> {
    Ok(OrganizationRow {
        id: row.get(0)?,
        name: row.get(1)?,
        classification: row.get(2)?,
        parent_id: row.get(3)?,
    })
}

fn map_event(row: &rusqlite::Row) -> rusqlite::Result<EventRow> {
    Ok(EventRow {
        id: row.get(0)?,
        name: row.get(1)?,
        start_date: row.get(2)?,
        classification: row.get(3)?,
        source_hash: row.get(4)?,
        source_file: row.get(5)?,
        hearing_number: row.get(6)?,
    })
}

fn map_congress(row: &rusqlite::Row) -> rusqlite::Result<CongressRow> {
    let start: String = row.get(2)?;
    let end: String = row.get(3)?;
    Ok(CongressRow {
        identifier: row.get(0)?,
        name: row.get(1)?,
        start_date: start.parse().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?,
        end_date: end.parse().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?,
        inactive_days: row.get(4)?,
    })
}

fn map_rating(row: &rusqlite::Row) -> rusqlite::Result<RatingRow> {
    Ok(RatingRow {
        congress: row.get(0)?,
        committee_id: row.get(1)?,
        investigative_oversight_hearings: row.get(2)?,
        policy_legislative_hearings: row.get(3)?,
        total_hearings: row.get(4)?,
        chp_points: row.get(5)?,
    })
}

// ============================================
// ROW TYPES
// ============================================

#[derive(Debug, Clone)]
pub struct OrganizationRow {
    pub id: String,
    pub name: String,
    pub classification: String,
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EventRow {
    pub id: String,
    pub name: String,
    pub start_date: String,
    pub classification: String,
    pub source_hash: Option<String>,
    pub source_file: Option<String>,
    pub hearing_number: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CongressRow {
    pub identifier: i64,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub inactive_days: i64,
}

#[derive(Debug, Clone)]
pub struct RatingRow {
    pub congress: i64,
    pub committee_id: String,
    pub investigative_oversight_hearings: i64,
    pub policy_legislative_hearings: i64,
    pub total_hearings: i64,
    pub chp_points: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chamber_tree(store: &Store) -> (String, String, String) {
        let root = store
            .ensure_organization("United States Congress", "legislature", None)
            .unwrap();
        let house = store
            .ensure_organization("United States House of Representatives", "chamber", Some(&root))
            .unwrap();
        let committee = store
            .ensure_organization("House Committee on Agriculture", "committee", Some(&house))
            .unwrap();
        (root, house, committee)
    }

    #[test]
    fn test_subcommittee_invariant() {
        let store = Store::open_in_memory().unwrap();
        let (_root, _house, committee) = chamber_tree(&store);
        let sub = store
            .ensure_organization("Subcommittee on Livestock", "committee", Some(&committee))
            .unwrap();

        assert!(!store.is_subcommittee(&committee).unwrap());
        assert!(store.is_subcommittee(&sub).unwrap());
    }

    #[test]
    fn test_named_participants_excluded_from_committee_ids() {
        let store = Store::open_in_memory().unwrap();
        store
            .ensure_jurisdiction(JURISDICTION_ID, "United States of America")
            .unwrap();
        let (_root, _house, committee) = chamber_tree(&store);
        let event = store
            .create_event(
                JURISDICTION_ID,
                "Farm Bill Oversight",
                "2020-01-15",
                "Hearing",
                None,
                None,
                None,
            )
            .unwrap();

        store
            .attach_committee_participant(&event, &committee, "House Committee on Agriculture")
            .unwrap();
        store
            .attach_named_participant(&event, EntityType::Witness, "Dr. Jane Smith")
            .unwrap();
        store
            .attach_named_participant(&event, EntityType::CommitteeMember, "Rep. John Doe")
            .unwrap();

        assert_eq!(store.event_committee_ids(&event).unwrap(), vec![committee]);
    }

    #[test]
    fn test_depth_validated_at_creation() {
        let store = Store::open_in_memory().unwrap();
        let (_root, _house, committee) = chamber_tree(&store);
        let sub = store
            .ensure_organization("Subcommittee on Livestock", "committee", Some(&committee))
            .unwrap();

        let err = store.ensure_organization("Too Deep", "committee", Some(&sub));
        assert!(err.is_err());
    }

    #[test]
    fn test_legacy_key_upsert_fills_in_resolution() {
        let store = Store::open_in_memory().unwrap();
        let (_root, _house, committee) = chamber_tree(&store);

        store.upsert_legacy_key("201", "Agriculture", None).unwrap();
        assert_eq!(store.organization_for_legacy_key("201").unwrap(), None);

        store
            .upsert_legacy_key("201", "Agriculture", Some(&committee))
            .unwrap();
        assert_eq!(
            store.organization_for_legacy_key("201").unwrap(),
            Some(committee.clone())
        );

        // A later unresolved upsert must not clobber the resolution
        store.upsert_legacy_key("201", "Agriculture", None).unwrap();
        assert_eq!(
            store.organization_for_legacy_key("201").unwrap(),
            Some(committee)
        );
    }

    #[test]
    fn test_legacy_key_resolution_is_stable_across_names() {
        let store = Store::open_in_memory().unwrap();
        let (_root, house, committee) = chamber_tree(&store);
        let other = store
            .ensure_organization("House Committee on Rules", "committee", Some(&house))
            .unwrap();

        // Same code memoized under two names, resolving differently
        store
            .upsert_legacy_key("215", "Agriculture", Some(&committee))
            .unwrap();
        store.upsert_legacy_key("215", "Rules", Some(&other)).unwrap();

        assert_eq!(
            store.organization_for_legacy_key("215").unwrap(),
            Some(committee)
        );
    }

    #[test]
    fn test_scraped_event_filter_excludes_spreadsheet_rows() {
        let store = Store::open_in_memory().unwrap();
        store
            .ensure_jurisdiction("ocd-jurisdiction/country:us/legislature", "United States of America")
            .unwrap();

        let scraped = store
            .create_event(
                "ocd-jurisdiction/country:us/legislature",
                "Scraped Hearing",
                "2020-01-15",
                "Hearing",
                None,
                None,
                None,
            )
            .unwrap();
        store.attach_source(&scraped, "scraped", None).unwrap();

        let imported = store
            .create_event(
                "ocd-jurisdiction/country:us/legislature",
                "Imported Hearing",
                "2020-01-15",
                "Hearing",
                Some("abc"),
                Some("house.csv"),
                None,
            )
            .unwrap();
        store.attach_source(&imported, "spreadsheet", None).unwrap();

        let candidates = store.scraped_events_on("2020-01-15").unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, scraped);
    }

    #[test]
    fn test_rating_upsert_overwrites() {
        let store = Store::open_in_memory().unwrap();
        let (_root, _house, committee) = chamber_tree(&store);
        store
            .upsert_congress(
                116,
                "116th Congress",
                NaiveDate::from_ymd_opt(2019, 1, 3).unwrap(),
                NaiveDate::from_ymd_opt(2021, 1, 3).unwrap(),
                62,
            )
            .unwrap();

        store.upsert_rating(116, &committee, 3, 2, 5, 30).unwrap();
        store.upsert_rating(116, &committee, 4, 2, 6, 38).unwrap();

        let rating = store.get_rating(116, &committee).unwrap().unwrap();
        assert_eq!(rating.investigative_oversight_hearings, 4);
        assert_eq!(rating.chp_points, 38);
        assert_eq!(store.ratings_for_committee(&committee).unwrap().len(), 1);
    }

    #[test]
    fn test_subcommittee_hearings_count_toward_parent() {
        let store = Store::open_in_memory().unwrap();
        let (_root, _house, committee) = chamber_tree(&store);
        let sub = store
            .ensure_organization("Subcommittee on Livestock", "committee", Some(&committee))
            .unwrap();
        store
            .ensure_jurisdiction("ocd-jurisdiction/country:us/legislature", "United States of America")
            .unwrap();
        store.ensure_category_type("Legislative", "Legislative").unwrap();

        let event = store
            .create_event(
                "ocd-jurisdiction/country:us/legislature",
                "Sub Hearing",
                "2020-01-15",
                "Hearing",
                None,
                None,
                None,
            )
            .unwrap();
        store
            .attach_committee_participant(&event, &sub, "Subcommittee on Livestock")
            .unwrap();
        store.set_hearing_category(&event, "Legislative").unwrap();

        let counts = store
            .hearing_counts_by_category(
                &committee,
                NaiveDate::from_ymd_opt(2019, 1, 3).unwrap(),
                NaiveDate::from_ymd_opt(2021, 1, 3).unwrap(),
            )
            .unwrap();
        assert_eq!(counts, vec![("Legislative".to_string(), 1)]);
    }
}
