// 📚 Clinic Registry - the working list of clinics
//
// Bulk loads either replace the whole list or append only clinics whose
// name is not already present. Appending never overwrites an existing record.

use super::clinic::{default_clinics, Clinic};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

// ============================================================================
// UPLOAD MODE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadMode {
    #[default]
    Replace,
    Append,
}

impl UploadMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadMode::Replace => "replace",
            UploadMode::Append => "append",
        }
    }
}

impl FromStr for UploadMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "replace" => Ok(UploadMode::Replace),
            "append" => Ok(UploadMode::Append),
            other => Err(format!("Unknown upload mode: {}", other)),
        }
    }
}

/// Combine an existing list with an incoming batch.
///
/// Append mode checks incoming names only against `existing`; two clinics
/// with the same name inside one incoming batch are both kept.
pub fn load_bulk(existing: &[Clinic], incoming: Vec<Clinic>, mode: UploadMode) -> Vec<Clinic> {
    match mode {
        UploadMode::Replace => incoming,
        UploadMode::Append => {
            let known: HashSet<&str> = existing.iter().map(|c| c.name.as_str()).collect();
            let mut result = existing.to_vec();
            result.extend(
                incoming
                    .into_iter()
                    .filter(|c| !known.contains(c.name.as_str())),
            );
            result
        }
    }
}

// ============================================================================
// CLINIC REGISTRY
// ============================================================================

#[derive(Debug, Clone)]
pub struct ClinicRegistry {
    clinics: Vec<Clinic>,
}

impl ClinicRegistry {
    /// Registry seeded with the built-in clinics
    pub fn new() -> Self {
        ClinicRegistry {
            clinics: default_clinics(),
        }
    }

    pub fn from_clinics(clinics: Vec<Clinic>) -> Self {
        ClinicRegistry { clinics }
    }

    pub fn all(&self) -> &[Clinic] {
        &self.clinics
    }

    pub fn count(&self) -> usize {
        self.clinics.len()
    }

    pub fn mapped_count(&self) -> usize {
        self.clinics.iter().filter(|c| c.is_mapped()).count()
    }

    /// First clinic with this exact name
    pub fn find_by_name(&self, name: &str) -> Option<&Clinic> {
        self.clinics.iter().find(|c| c.name == name)
    }

    pub fn search(&self, query: &str) -> Vec<&Clinic> {
        self.clinics.iter().filter(|c| c.matches_query(query)).collect()
    }

    /// Apply a bulk load. Returns how many clinics were added.
    pub fn load(&mut self, incoming: Vec<Clinic>, mode: UploadMode) -> usize {
        let before = match mode {
            UploadMode::Replace => 0,
            UploadMode::Append => self.clinics.len(),
        };
        self.clinics = load_bulk(&self.clinics, incoming, mode);
        let added = self.clinics.len() - before;

        tracing::info!(
            mode = mode.as_str(),
            added,
            total = self.clinics.len(),
            "clinic bulk load applied"
        );
        added
    }

    pub fn reset_to_defaults(&mut self) {
        self.clinics = default_clinics();
    }
}

impl Default for ClinicRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
