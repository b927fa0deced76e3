//! Committee rating engine
//!
//! Recomputes, for every (congress, permanent committee) pair, the three
//! weighted hearing counts and the CHP point total, then derives the
//! read-side score, letter grade, and comparison percentages the display
//! layer consumes. Full recompute, idempotent.

use anyhow::Result;
use chrono::NaiveDate;

use crate::categories;
use crate::import::RunLog;
use crate::store::{CongressRow, RatingRow, Store};

/// Fixed policy weights: investigative oversight counts 7x, policy and
/// legislative work 2x, everything tracked 1x.
pub fn chp_points(investigative_oversight: i64, policy_legislative: i64, total: i64) -> i64 {
    7 * investigative_oversight + 2 * policy_legislative + total
}

impl CongressRow {
    pub fn is_current(&self, today: NaiveDate) -> bool {
        today >= self.start_date && today <= self.end_date
    }

    /// Elapsed fraction of the session as a percentage, capped at 100.
    pub fn percent_passed(&self, today: NaiveDate) -> f64 {
        let session = (self.end_date - self.start_date).num_days();
        if session <= 0 {
            return 100.0;
        }
        let elapsed = (today - self.start_date).num_days();
        ((elapsed as f64 / session as f64) * 100.0).clamp(0.0, 100.0)
    }

    /// Compensates sessions whose inactive-day count differs from the
    /// typical default: active days expected / active days actual.
    pub fn normalizer(&self, default_inactive_days: i64) -> f64 {
        let session = (self.end_date - self.start_date).num_days();
        let actual_active = session - self.inactive_days;
        if actual_active <= 0 {
            return 1.0;
        }
        (session - default_inactive_days) as f64 / actual_active as f64
    }
}

/// '116' -> '116th Congress'
pub fn congress_name(identifier: i64) -> String {
    let suffix = match identifier % 100 {
        11..=13 => "th",
        _ => match identifier % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        },
    };
    format!("{identifier}{suffix} Congress")
}

/// Recompute every rating row. Committees missing from the store are
/// logged once and skipped. Returns the number of rows written.
pub fn rate_all(store: &Store, permanent_committees: &[String], log: &mut RunLog) -> Result<usize> {
    let congresses = store.list_congresses()?;

    let mut committees = vec![];
    for name in permanent_committees {
        match store.find_committee_by_name(name)? {
            Some(org) => committees.push(org),
            None => log.note(format!("permanent committee not in store: {name}"))?,
        }
    }

    let mut written = 0;
    for congress in &congresses {
        for committee in &committees {
            let counts = store.hearing_counts_by_category(
                &committee.id,
                congress.start_date,
                congress.end_date,
            )?;

            let mut investigative = 0;
            let mut policy = 0;
            let mut total = 0;
            for (category, count) in counts {
                let category = category.as_str();
                if categories::INVESTIGATIVE_OVERSIGHT.contains(&category) {
                    investigative += count;
                }
                if categories::POLICY_LEGISLATIVE.contains(&category) {
                    policy += count;
                }
                if categories::TRACKED.contains(&category) {
                    total += count;
                }
            }

            store.upsert_rating(
                congress.identifier,
                &committee.id,
                investigative,
                policy,
                total,
                chp_points(investigative, policy, total),
            )?;
            written += 1;
        }
    }

    Ok(written)
}

/// Read-side view of one rating. Computed on demand, never stored.
#[derive(Debug)]
pub struct ScoredRating {
    pub rating: RatingRow,
    pub chp_score: f64,
    pub chp_grade: &'static str,
    /// False when the committee has no historical maximum to compare with
    pub comparable: bool,
    pub investigative_percent_max: f64,
    pub policy_percent_max: f64,
    pub total_percent_max: f64,
    pub investigative_percent_avg: f64,
    pub policy_percent_avg: f64,
    pub total_percent_avg: f64,
}

pub fn score_rating(
    store: &Store,
    rating: &RatingRow,
    congress: &CongressRow,
    default_inactive_days: i64,
    today: NaiveDate,
) -> Result<ScoredRating> {
    let normalizer = congress.normalizer(default_inactive_days);
    let max_points = store.max_chp_points(&rating.committee_id)?;

    let (chp_score, comparable) = if max_points == 0 {
        (0.0, false)
    } else {
        let mut score = rating.chp_points as f64 / max_points as f64 * 100.0 * normalizer;
        // Project an in-progress session to its full-session equivalent
        if congress.is_current(today) {
            let passed = congress.percent_passed(today);
            if passed > 0.0 {
                score /= passed / 100.0;
            }
        }
        (score, true)
    };

    let (max_inv, max_pol, max_total) = store.max_counts(&rating.committee_id)?;
    let (avg_inv, avg_pol, avg_total) = store.avg_counts(&rating.committee_id)?;

    Ok(ScoredRating {
        chp_score,
        chp_grade: chp_grade(chp_score),
        comparable,
        investigative_percent_max: percent_of_max(
            rating.investigative_oversight_hearings,
            max_inv,
            normalizer,
        ),
        policy_percent_max: percent_of_max(
            rating.policy_legislative_hearings,
            max_pol,
            normalizer,
        ),
        total_percent_max: percent_of_max(rating.total_hearings, max_total, normalizer),
        investigative_percent_avg: percent_of_avg(
            rating.investigative_oversight_hearings,
            avg_inv,
            normalizer,
        ),
        policy_percent_avg: percent_of_avg(
            rating.policy_legislative_hearings,
            avg_pol,
            normalizer,
        ),
        total_percent_avg: percent_of_avg(rating.total_hearings, avg_total, normalizer),
        rating: rating.clone(),
    })
}

/// The committee's rating for the most recent congress, scored.
pub fn latest_rating(
    store: &Store,
    committee_id: &str,
    default_inactive_days: i64,
    today: NaiveDate,
) -> Result<Option<ScoredRating>> {
    let ratings = store.ratings_for_committee(committee_id)?;
    let Some(rating) = ratings.first() else {
        return Ok(None);
    };
    let Some(congress) = store.get_congress(rating.congress)? else {
        return Ok(None);
    };
    Ok(Some(score_rating(
        store,
        rating,
        &congress,
        default_inactive_days,
        today,
    )?))
}

fn percent_of_max(count: i64, max: i64, normalizer: f64) -> f64 {
    if max == 0 {
        return 0.0;
    }
    (count as f64 / max as f64 * 100.0 * normalizer).min(100.0)
}

fn percent_of_avg(count: i64, avg: f64, normalizer: f64) -> f64 {
    if avg == 0.0 {
        return 0.0;
    }
    count as f64 / avg * 100.0 * normalizer
}

/// Letter grade for a CHP score. The trailing arm is unreachable for any
/// score in [0, inf); it survives from the original grading table.
pub fn chp_grade(score: f64) -> &'static str {
    if score >= 92.0 {
        "A"
    } else if score >= 90.0 {
        "A-"
    } else if score >= 88.0 {
        "B+"
    } else if score >= 82.0 {
        "B"
    } else if score >= 80.0 {
        "B-"
    } else if score >= 78.0 {
        "C+"
    } else if score >= 72.0 {
        "C"
    } else if score >= 70.0 {
        "C-"
    } else if score >= 68.0 {
        "D+"
    } else if score >= 62.0 {
        "D"
    } else if score >= 60.0 {
        "D-"
    } else if score >= 0.0 {
        "F"
    } else {
        "C"
    }
}
