//! The fixed hearing-category vocabulary.
//!
//! Thirteen categories total; the first eight are "tracked" and feed the
//! rating buckets, the rest are administrative classifications that never
//! count toward a score. Category identifiers are the labels themselves,
//! matching the legacy spreadsheets.

pub const NOMINATIONS: &str = "Nominations";
pub const LEGISLATIVE: &str = "Legislative";
pub const POLICY: &str = "Policy";
pub const AGENCY_CONDUCT: &str = "Agency Conduct";
pub const PRIVATE_SECTOR_OVERSIGHT: &str = "Private Sector Oversight";
pub const FACT_FINDING: &str = "Fact Finding";
pub const FIELD: &str = "Field";
pub const CLOSED: &str = "Closed";

/// Every legal category identifier
pub const ALL: [&str; 13] = [
    NOMINATIONS,
    LEGISLATIVE,
    POLICY,
    AGENCY_CONDUCT,
    PRIVATE_SECTOR_OVERSIGHT,
    FACT_FINDING,
    FIELD,
    CLOSED,
    "Markup",
    "Organizational Business",
    "Ceremonial",
    "Appropriations",
    "Other",
];

/// Categories counted as investigative oversight
pub const INVESTIGATIVE_OVERSIGHT: [&str; 2] = [AGENCY_CONDUCT, PRIVATE_SECTOR_OVERSIGHT];

/// Categories counted as policy/legislative work
pub const POLICY_LEGISLATIVE: [&str; 3] = [LEGISLATIVE, POLICY, CLOSED];

/// The eight categories that count toward a committee's total
pub const TRACKED: [&str; 8] = [
    NOMINATIONS,
    LEGISLATIVE,
    POLICY,
    AGENCY_CONDUCT,
    PRIVATE_SECTOR_OVERSIGHT,
    FACT_FINDING,
    FIELD,
    CLOSED,
];

pub fn is_legal(id: &str) -> bool {
    ALL.contains(&id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buckets_are_disjoint_subsets_of_tracked() {
        for id in INVESTIGATIVE_OVERSIGHT {
            assert!(TRACKED.contains(&id));
            assert!(!POLICY_LEGISLATIVE.contains(&id));
        }
        for id in POLICY_LEGISLATIVE {
            assert!(TRACKED.contains(&id));
        }
    }

    #[test]
    fn test_thirteen_legal_categories() {
        assert_eq!(ALL.len(), 13);
        assert!(is_legal("Other"));
        assert!(!is_legal("Oversight"));
        assert!(!is_legal(""));
    }
}
