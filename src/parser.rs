// 🏗️ Clinic CSV Parser
//
// Header-driven: columns are located by name, not position.
//   name  - first header containing "clinic" or "name"
//   city  - first header containing "city"
//   state - first header containing "state"
//   date  - first header containing "date"
//   lat   - header exactly "lat" or "latitude"
//   lon   - header exactly "lon", "longitude" or "lng"
// Header matching is case-insensitive. Rows without a name are dropped.

use crate::entities::Clinic;
use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs;
use std::path::Path;

// ============================================================================
// COLUMN LAYOUT
// ============================================================================

/// Column indexes resolved from the header row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnLayout {
    pub name: Option<usize>,
    pub city: Option<usize>,
    pub state: Option<usize>,
    pub date: Option<usize>,
    pub lat: Option<usize>,
    pub lon: Option<usize>,
}

impl ColumnLayout {
    pub fn from_headers(headers: &StringRecord) -> Self {
        let lower: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();

        ColumnLayout {
            name: position(&lower, |h| h.contains("clinic") || h.contains("name")),
            city: position(&lower, |h| h.contains("city")),
            state: position(&lower, |h| h.contains("state")),
            date: position(&lower, |h| h.contains("date")),
            lat: position(&lower, |h| h == "lat" || h == "latitude"),
            lon: position(&lower, |h| h == "lon" || h == "longitude" || h == "lng"),
        }
    }

    fn field<'r>(record: &'r StringRecord, idx: Option<usize>) -> &'r str {
        idx.and_then(|i| record.get(i)).unwrap_or("")
    }

    /// Build a clinic from one data row, or None when the name is empty.
    fn clinic_from(&self, record: &StringRecord) -> Option<Clinic> {
        let name = Self::field(record, self.name);
        if name.is_empty() {
            return None;
        }

        let mut clinic = Clinic::new(
            name,
            Self::field(record, self.city),
            Self::field(record, self.state),
        )
        .with_date(Self::field(record, self.date));

        if self.lat.is_some() && self.lon.is_some() {
            let lat = parse_coordinate(Self::field(record, self.lat));
            let lon = parse_coordinate(Self::field(record, self.lon));
            if let (Some(lat), Some(lon)) = (lat, lon) {
                clinic = clinic.with_location(lat, lon);
            }
        }

        Some(clinic)
    }
}

fn position(headers: &[String], pred: impl Fn(&str) -> bool) -> Option<usize> {
    headers.iter().position(|h| pred(h.as_str()))
}

fn parse_coordinate(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

// ============================================================================
// PARSING
// ============================================================================

/// Parse CSV text into clinic records.
///
/// Never fails: a missing name column yields an empty list and a warning,
/// and unreadable rows are skipped.
pub fn parse_clinics_csv(text: &str) -> Vec<Clinic> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.trim().as_bytes());

    let mut records = reader.records();

    let headers = match records.next() {
        Some(Ok(headers)) => headers,
        Some(Err(e)) => {
            tracing::warn!(error = %e, "CSV header row unreadable");
            return Vec::new();
        }
        None => return Vec::new(),
    };

    let layout = ColumnLayout::from_headers(&headers);
    if layout.name.is_none() {
        tracing::warn!("CSV missing \"Clinic Name\" column");
        return Vec::new();
    }

    let mut clinics = Vec::new();
    let mut dropped = 0usize;

    for (line_num, result) in records.enumerate() {
        match result {
            Ok(record) => match layout.clinic_from(&record) {
                Some(clinic) => clinics.push(clinic),
                None => dropped += 1,
            },
            Err(e) => {
                // +2 because: 1-indexed + header row
                tracing::warn!(line = line_num + 2, error = %e, "skipping unreadable CSV row");
                dropped += 1;
            }
        }
    }

    tracing::debug!(parsed = clinics.len(), dropped, "clinic CSV parsed");
    clinics
}

/// Read a CSV file from disk and parse it.
pub fn load_clinics_csv(csv_path: &Path) -> Result<Vec<Clinic>> {
    let text = fs::read_to_string(csv_path)
        .with_context(|| format!("Failed to open file: {}", csv_path.display()))?;
    Ok(parse_clinics_csv(&text))
}

// ============================================================================
// TESTS
// ============================================================================
