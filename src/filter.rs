// 🔍 Filter Engine - which clinics get a text label
//
// Two filters compose rather than compete:
//   1. Date range narrows the candidate pool (inclusive on each set bound).
//   2. Recent-N picks the N newest clinics from whatever pool survived.
// With no filter set, every clinic is labeled.

use crate::entities::Clinic;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Quick-pick values offered for the recent-N filter
pub const RECENT_PRESETS: [i64; 4] = [5, 10, 15, 20];

// ============================================================================
// FILTER SELECTION
// ============================================================================

/// Transient filter state. Not persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    #[serde(default)]
    pub date_from: Option<NaiveDate>,

    #[serde(default)]
    pub date_to: Option<NaiveDate>,

    /// Values <= 0 behave as unset
    #[serde(default)]
    pub recent_n: Option<i64>,
}

impl FilterSelection {
    pub fn has_date_range(&self) -> bool {
        self.date_from.is_some() || self.date_to.is_some()
    }

    /// Effective top-K limit, None when unset or non-positive
    pub fn recent_limit(&self) -> Option<usize> {
        self.recent_n.filter(|n| *n > 0).map(|n| n as usize)
    }

    pub fn is_active(&self) -> bool {
        self.has_date_range() || self.recent_limit().is_some()
    }

    pub fn clear(&mut self) {
        *self = FilterSelection::default();
    }

    pub fn labeled_set(&self, clinics: &[Clinic]) -> HashSet<String> {
        compute_labeled_set(clinics, self.date_from, self.date_to, self.recent_n)
    }
}

/// Parse a recent-N text field. Non-numeric or non-positive input is unset.
pub fn parse_recent_n(s: &str) -> Option<i64> {
    s.trim().parse::<i64>().ok().filter(|n| *n > 0)
}

// ============================================================================
// LABELED SET
// ============================================================================

fn within_range(date: NaiveDate, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
    if let Some(from) = from {
        if date < from {
            return false;
        }
    }
    if let Some(to) = to {
        if date > to {
            return false;
        }
    }
    true
}

/// Newest first; clinics without a parseable date sort after all dated ones.
fn newest_first(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Compute the names of clinics that should show a label.
pub fn compute_labeled_set(
    clinics: &[Clinic],
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
    recent_n: Option<i64>,
) -> HashSet<String> {
    if clinics.is_empty() {
        return HashSet::new();
    }

    // Pair every clinic with its parsed date once
    let mut pool: Vec<(Option<NaiveDate>, &Clinic)> =
        clinics.iter().map(|c| (c.opening_date(), c)).collect();

    if date_from.is_some() || date_to.is_some() {
        pool.retain(|(date, _)| match date {
            Some(d) => within_range(*d, date_from, date_to),
            None => false,
        });
    }

    if let Some(n) = recent_n.filter(|n| *n > 0) {
        // sort_by is stable, so undated clinics keep list order among themselves
        pool.sort_by(|(a, _), (b, _)| newest_first(*a, *b));
        return pool
            .into_iter()
            .take(n as usize)
            .map(|(_, c)| c.name.clone())
            .collect();
    }

    pool.into_iter().map(|(_, c)| c.name.clone()).collect()
}

// ============================================================================
// KPI COUNTS
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelStats {
    pub total: usize,
    pub mapped: usize,
    pub labeled: usize,
}

pub fn label_stats(clinics: &[Clinic], labeled: &HashSet<String>) -> LabelStats {
    LabelStats {
        total: clinics.len(),
        mapped: clinics.iter().filter(|c| c.is_mapped()).count(),
        labeled: labeled.len(),
    }
}

// ============================================================================
// TESTS
// ============================================================================
