// 🏥 Clinic Entity - one mappable facility
//
// Identity is the display name. It is used verbatim as the key for label
// overrides; no case or whitespace normalization happens anywhere.

use crate::dates::parse_date;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// CLINIC ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clinic {
    /// Identity (display name, primary key everywhere)
    pub name: String,

    #[serde(default)]
    pub city: String,

    /// Jurisdiction code, usually a state abbreviation
    #[serde(default)]
    pub state: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,

    /// Opening date as entered (M/D/YYYY), may be empty or malformed
    #[serde(default)]
    pub date: String,
}

impl Clinic {
    pub fn new(name: &str, city: &str, state: &str) -> Self {
        Clinic {
            name: name.to_string(),
            city: city.to_string(),
            state: state.to_string(),
            lat: None,
            lon: None,
            date: String::new(),
        }
    }

    pub fn with_location(mut self, lat: f64, lon: f64) -> Self {
        self.lat = Some(lat);
        self.lon = Some(lon);
        self
    }

    pub fn with_date(mut self, date: &str) -> Self {
        self.date = date.to_string();
        self
    }

    /// Identity key
    pub fn identity(&self) -> &str {
        &self.name
    }

    /// A clinic is mapped when both coordinates are present.
    pub fn is_mapped(&self) -> bool {
        self.coordinate().is_some()
    }

    /// (lat, lon) if both are present
    pub fn coordinate(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }

    pub fn opening_date(&self) -> Option<NaiveDate> {
        parse_date(&self.date)
    }

    /// Case-insensitive substring match over name, city and state.
    /// An empty (or all-whitespace) query matches everything.
    pub fn matches_query(&self, query: &str) -> bool {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&q)
            || self.city.to_lowercase().contains(&q)
            || self.state.to_lowercase().contains(&q)
    }
}

// ============================================================================
// SEED DATA
// ============================================================================

/// The built-in set of 25 clinics shown before any CSV upload.
pub fn default_clinics() -> Vec<Clinic> {
    let seed: [(&str, &str, &str, f64, f64, &str); 25] = [
        ("Hamilton Clinic", "Hamilton", "OH", 39.3995, -84.5613, "2/9/2026"),
        ("Williston CBOC", "Williston", "ND", 48.1470, -103.6180, "5/5/2025"),
        ("Fergus Falls Clinic", "Fergus Falls", "MN", 46.2831, -96.0777, "5/1/2026"),
        ("Grand Forks Clinic", "Grand Forks", "ND", 47.9253, -97.0329, "5/1/2026"),
        ("Mosley Clinic (Lt. Col. John W. Mosley)", "Aurora", "CO", 39.7294, -104.8319, "2/3/2025"),
        ("Decorah CBOC", "Decorah", "IA", 43.3033, -91.7857, "5/16/2025"),
        ("Antelope Valley Clinic", "Lancaster", "CA", 34.6868, -118.1542, "8/27/2025"),
        ("Long Beach Clinic (Tibor Rubin)", "Long Beach", "CA", 33.7701, -118.1937, "9/15/2025"),
        ("Castle Rock Outpatient Clinic", "Castle Rock", "CO", 39.3722, -104.8561, "5/19/2025"),
        ("Paola CBOC", "Paola", "KS", 38.5722, -94.8791, "4/2/2025"),
        ("Victoria Outpatient Clinic", "Victoria", "TX", 28.8053, -96.9999, "3/31/2025"),
        ("North Portland Outpatient Clinic", "Oklahoma City", "OK", 35.4676, -97.5164, "10/6/2025"),
        ("Garner Clinic", "Garner", "NC", 35.7113, -78.6140, "3/30/2026"),
        ("Yonkers Clinic", "Yonkers", "NY", 40.9312, -73.8988, "8/1/2025"),
        ("Providence Mental Health Building", "Providence", "RI", 41.8240, -71.4128, "8/13/2025"),
        ("Noonan Jr. Clinic (Thomas P. Noonan Jr.)", "Sunnyside", "NY", 40.7433, -73.9133, "2/11/2025"),
        ("North Battlefield Outpatient Clinic", "Chesapeake", "VA", 36.7682, -76.2875, "1/30/2026"),
        ("Fredericksburg Clinic", "Fredericksburg", "VA", 38.3032, -77.4605, "12/1/2026"),
        ("Altoona CBOC", "Altoona", "PA", 40.5187, -78.3947, "5/4/2026"),
        ("Wilmington Clinic", "Wilmington", "NC", 34.2257, -77.9447, "12/22/2025"),
        ("Rock Hill CBOC", "Rock Hill", "SC", 34.9249, -81.0251, "7/1/2025"),
        ("Havelock Clinic", "Havelock", "NC", 34.8791, -76.9013, "10/1/2025"),
        ("Mount Pleasant Clinic", "Mount Pleasant", "SC", 32.7941, -79.8626, "9/29/2025"),
        ("Florence CBOC", "Florence", "KY", 38.9990, -84.6266, "6/2/2025"),
        ("Augusta Women's Health Clinic", "Augusta", "GA", 33.4735, -81.9748, "11/24/2025"),
    ];

    seed.iter()
        .map(|(name, city, state, lat, lon, date)| {
            Clinic::new(name, city, state)
                .with_location(*lat, *lon)
                .with_date(date)
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
