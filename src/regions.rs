// 🗺️ Region Classifier - state abbreviation → US census region
//
// Used for the per-region bar chart, list grouping and dot colors only.
// Unknown or empty codes land in Region::Other.

use crate::entities::Clinic;
use serde::{Deserialize, Serialize};

// ============================================================================
// REGION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    Northeast,
    Midwest,
    South,
    West,
    Other,
}

/// Regions in display order. `Other` is not part of the chart.
pub const REGION_NAMES: [Region; 4] = [
    Region::Northeast,
    Region::Midwest,
    Region::South,
    Region::West,
];

impl Region {
    /// Classify a two-letter state (or DC) code. Matching is exact and
    /// case-sensitive, like the source data.
    pub fn from_state(state: &str) -> Region {
        match state {
            "CT" | "ME" | "MA" | "NH" | "RI" | "VT" | "NJ" | "NY" | "PA" => Region::Northeast,

            "IL" | "IN" | "MI" | "OH" | "WI" | "IA" | "KS" | "MN" | "MO" | "NE" | "ND"
            | "SD" => Region::Midwest,

            "DE" | "FL" | "GA" | "MD" | "NC" | "SC" | "VA" | "DC" | "WV" | "AL" | "KY"
            | "MS" | "TN" | "AR" | "LA" | "OK" | "TX" => Region::South,

            "AZ" | "CO" | "ID" | "MT" | "NV" | "NM" | "UT" | "WY" | "AK" | "CA" | "HI"
            | "OR" | "WA" => Region::West,

            _ => Region::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Northeast => "Northeast",
            Region::Midwest => "Midwest",
            Region::South => "South",
            Region::West => "West",
            Region::Other => "Other",
        }
    }

    /// Dot and bar color as a hex string.
    pub fn color(&self) -> &'static str {
        match self {
            Region::Northeast => "#9e0621",
            Region::Midwest => "#598527",
            Region::South => "#0089cf",
            Region::West => "#da2128",
            Region::Other => "#546670",
        }
    }
}

/// Group clinics by region, in display order.
///
/// The four chart regions are always present (possibly empty); `Other` is
/// appended only when some clinic falls outside them.
pub fn group_by_region(clinics: &[Clinic]) -> Vec<(Region, Vec<&Clinic>)> {
    let mut groups: Vec<(Region, Vec<&Clinic>)> =
        REGION_NAMES.iter().map(|r| (*r, Vec::new())).collect();
    let mut other = Vec::new();

    for clinic in clinics {
        match Region::from_state(&clinic.state) {
            Region::Other => other.push(clinic),
            region => {
                if let Some((_, members)) = groups.iter_mut().find(|(r, _)| *r == region) {
                    members.push(clinic);
                }
            }
        }
    }

    if !other.is_empty() {
        groups.push((Region::Other, other));
    }
    groups
}

/// Clinic count per chart region, in display order.
pub fn region_counts(clinics: &[Clinic]) -> Vec<(Region, usize)> {
    REGION_NAMES
        .iter()
        .map(|region| {
            let count = clinics
                .iter()
                .filter(|c| Region::from_state(&c.state) == *region)
                .count();
            (*region, count)
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn clinic(name: &str, state: &str) -> Clinic {
        Clinic::new(name, "Somewhere", state)
    }

    #[test]
    fn test_from_state() {
        assert_eq!(Region::from_state("NY"), Region::Northeast);
        assert_eq!(Region::from_state("ND"), Region::Midwest);
        assert_eq!(Region::from_state("DC"), Region::South);
        assert_eq!(Region::from_state("CA"), Region::West);
        assert_eq!(Region::from_state("PR"), Region::Other);
        assert_eq!(Region::from_state(""), Region::Other);
        assert_eq!(Region::from_state("ny"), Region::Other);
    }

    #[test]
    fn test_colors() {
        assert_eq!(Region::South.color(), "#0089cf");
        assert_eq!(Region::Other.color(), "#546670");
    }

    #[test]
    fn test_group_by_region_keeps_display_order() {
        let clinics = vec![
            clinic("A", "CA"),
            clinic("B", "NY"),
            clinic("C", "TX"),
            clinic("D", "NY"),
        ];
        let groups = group_by_region(&clinics);

        let regions: Vec<Region> = groups.iter().map(|(r, _)| *r).collect();
        assert_eq!(regions, REGION_NAMES.to_vec());
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].1.len(), 0);
        assert_eq!(groups[2].1[0].name, "C");
        assert_eq!(groups[3].1[0].name, "A");
    }

    #[test]
    fn test_group_by_region_appends_other() {
        let clinics = vec![clinic("A", "GU"), clinic("B", "OH")];
        let groups = group_by_region(&clinics);

        assert_eq!(groups.len(), 5);
        assert_eq!(groups[4].0, Region::Other);
        assert_eq!(groups[4].1[0].name, "A");
    }

    #[test]
    fn test_region_counts() {
        let clinics = vec![clinic("A", "NC"), clinic("B", "SC"), clinic("C", "XX")];
        let counts = region_counts(&clinics);

        assert_eq!(counts.len(), 4);
        assert_eq!(counts[2], (Region::South, 2));
        assert_eq!(counts.iter().map(|(_, n)| n).sum::<usize>(), 2);
    }
}
