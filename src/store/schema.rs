//! SQLite schema definition
//!
//! Entity layout follows the open-civic-data shape the scrapers feed:
//! organizations form a tree (legislature -> chamber -> committee ->
//! subcommittee), events are hearings, and participants join the two.
//! Provenance lives in named columns on events rather than a free-form
//! extras bag.

pub const SCHEMA: &str = r#"
-- ============================================
-- ORGANIZATIONS
-- ============================================

-- Legislature root, chambers, committees, subcommittees
CREATE TABLE IF NOT EXISTS organizations (
    id TEXT PRIMARY KEY,                   -- 'ocd-organization/<uuid>'
    name TEXT NOT NULL,
    classification TEXT NOT NULL,          -- 'legislature' | 'chamber' | 'committee'
    parent_id TEXT,                        -- NULL for the legislature root
    FOREIGN KEY(parent_id) REFERENCES organizations(id)
);

-- Alternate committee names, used by the resolver's last stage
CREATE TABLE IF NOT EXISTS organization_names (
    id INTEGER PRIMARY KEY,
    organization_id TEXT NOT NULL,
    name TEXT NOT NULL,
    UNIQUE(organization_id, name),
    FOREIGN KEY(organization_id) REFERENCES organizations(id) ON DELETE CASCADE
);

-- ============================================
-- LEGACY COMMITTEE KEYS
-- ============================================

-- Memoized resolver results for spreadsheet ("Lugar") committee codes.
-- organization_id stays NULL when the key never resolved.
CREATE TABLE IF NOT EXISTS legacy_committee_keys (
    id INTEGER PRIMARY KEY,
    lugar_id TEXT NOT NULL,
    lugar_name TEXT NOT NULL,
    organization_id TEXT,
    UNIQUE(lugar_id, lugar_name),
    FOREIGN KEY(organization_id) REFERENCES organizations(id) ON DELETE SET NULL
);

-- ============================================
-- JURISDICTIONS & EVENTS
-- ============================================

CREATE TABLE IF NOT EXISTS jurisdictions (
    id TEXT PRIMARY KEY,                   -- 'ocd-jurisdiction/country:us/legislature'
    name TEXT NOT NULL
);

-- Hearings. Reconciliation identity is (name, start_date, classification)
-- or a matching source_hash, never the synthetic id alone.
CREATE TABLE IF NOT EXISTS events (
    id TEXT PRIMARY KEY,                   -- 'ocd-event/<uuid>'
    jurisdiction_id TEXT NOT NULL,
    name TEXT NOT NULL,
    start_date TEXT NOT NULL,              -- ISO date
    classification TEXT NOT NULL,          -- hearing type
    source_hash TEXT,                      -- sha256 of the originating CSV row
    source_file TEXT,                      -- originating CSV path
    hearing_number TEXT,                   -- raw legacy 'Hearing #' text
    FOREIGN KEY(jurisdiction_id) REFERENCES jurisdictions(id)
);

-- Committee / person / witness attachment to a hearing
CREATE TABLE IF NOT EXISTS event_participants (
    id INTEGER PRIMARY KEY,
    event_id TEXT NOT NULL,
    entity_type TEXT NOT NULL,             -- 'committee' | 'person' | 'witness' | 'committee_member'
    organization_id TEXT,                  -- set for committee participants
    name TEXT NOT NULL,
    FOREIGN KEY(event_id) REFERENCES events(id) ON DELETE CASCADE,
    FOREIGN KEY(organization_id) REFERENCES organizations(id) ON DELETE CASCADE
);

-- Provenance: how a hearing entered the system
CREATE TABLE IF NOT EXISTS event_sources (
    id INTEGER PRIMARY KEY,
    event_id TEXT NOT NULL,
    note TEXT NOT NULL,                    -- 'spreadsheet' | 'web form' | 'scraped'
    url TEXT,
    FOREIGN KEY(event_id) REFERENCES events(id) ON DELETE CASCADE
);

-- ============================================
-- CATEGORIES
-- ============================================

-- Category identifiers are the fixed 13-label vocabulary itself
CREATE TABLE IF NOT EXISTS category_types (
    id TEXT PRIMARY KEY,                   -- 'Legislative', 'Agency Conduct', ...
    name TEXT NOT NULL
);

-- Single-category model: at most one category per hearing
CREATE TABLE IF NOT EXISTS hearing_categories (
    id INTEGER PRIMARY KEY,
    event_id TEXT NOT NULL UNIQUE,
    category_id TEXT NOT NULL,
    FOREIGN KEY(event_id) REFERENCES events(id) ON DELETE CASCADE,
    FOREIGN KEY(category_id) REFERENCES category_types(id)
);

-- ============================================
-- CONGRESSES & RATINGS
-- ============================================

CREATE TABLE IF NOT EXISTS congresses (
    identifier INTEGER PRIMARY KEY,        -- e.g. 116
    name TEXT NOT NULL,                    -- '116th Congress'
    start_date TEXT NOT NULL,
    end_date TEXT NOT NULL,
    inactive_days INTEGER NOT NULL DEFAULT 62
);

-- One row per (congress, committee); written only by the rating engine
CREATE TABLE IF NOT EXISTS committee_ratings (
    id INTEGER PRIMARY KEY,
    congress INTEGER NOT NULL,
    committee_id TEXT NOT NULL,
    investigative_oversight_hearings INTEGER NOT NULL DEFAULT 0,
    policy_legislative_hearings INTEGER NOT NULL DEFAULT 0,
    total_hearings INTEGER NOT NULL DEFAULT 0,
    chp_points INTEGER NOT NULL DEFAULT 0,
    UNIQUE(congress, committee_id),
    FOREIGN KEY(congress) REFERENCES congresses(identifier),
    FOREIGN KEY(committee_id) REFERENCES organizations(id) ON DELETE CASCADE
);

-- ============================================
-- INDEXES
-- ============================================

CREATE INDEX IF NOT EXISTS idx_orgs_parent ON organizations(parent_id);
CREATE INDEX IF NOT EXISTS idx_orgs_name ON organizations(name);
CREATE INDEX IF NOT EXISTS idx_legacy_keys_id ON legacy_committee_keys(lugar_id);
CREATE INDEX IF NOT EXISTS idx_events_start ON events(start_date);
CREATE INDEX IF NOT EXISTS idx_events_hash ON events(source_hash);
CREATE INDEX IF NOT EXISTS idx_events_file ON events(source_file);
CREATE INDEX IF NOT EXISTS idx_participants_event ON event_participants(event_id);
CREATE INDEX IF NOT EXISTS idx_participants_org ON event_participants(organization_id);
CREATE INDEX IF NOT EXISTS idx_sources_event ON event_sources(event_id);
CREATE INDEX IF NOT EXISTS idx_categories_event ON hearing_categories(event_id);
CREATE INDEX IF NOT EXISTS idx_ratings_committee ON committee_ratings(committee_id);
"#;
