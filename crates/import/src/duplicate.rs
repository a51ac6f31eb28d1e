//! Batch-wide duplicate email / phone detection.

use std::collections::HashMap;

use crate::model::{CanonicalField, ErrorCategory, Provenance, Record, ValidationError};

/// First-holder maps for one preview. The first record seen with a key is
/// canonical; every later holder is flagged.
#[derive(Debug, Default)]
pub struct DuplicateDetector {
    by_email: HashMap<String, Provenance>,
    by_phone: HashMap<String, Provenance>,
}

impl DuplicateDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next record in extraction order; returns its duplicate flags.
    pub fn check(&mut self, record: &Record) -> Vec<ValidationError> {
        let mut flags = Vec::new();
        if let Some(first) = claim(&mut self.by_email, &record.normalized_email, &record.provenance) {
            flags.push(duplicate(record, CanonicalField::Email, &first));
        }
        if let Some(first) = claim(&mut self.by_phone, &record.normalized_phone, &record.provenance) {
            flags.push(duplicate(record, CanonicalField::Phone, &first));
        }
        flags
    }
}

/// Blank keys never claim; returns the canonical holder when `key` is already taken.
fn claim(
    map: &mut HashMap<String, Provenance>,
    key: &str,
    provenance: &Provenance,
) -> Option<Provenance> {
    if key.is_empty() {
        return None;
    }
    match map.get(key) {
        Some(first) => Some(first.clone()),
        None => {
            map.insert(key.to_string(), provenance.clone());
            None
        }
    }
}

fn duplicate(record: &Record, field: CanonicalField, first: &Provenance) -> ValidationError {
    ValidationError {
        provenance: record.provenance.clone(),
        field,
        category: ErrorCategory::Duplicate,
        message: format!("duplicate {field} (first seen at {})", first.descriptor()),
    }
}

/// One pass over a whole batch.
pub fn find_duplicates(records: &[Record]) -> Vec<ValidationError> {
    let mut detector = DuplicateDetector::new();
    records.iter().flat_map(|r| detector.check(r)).collect()
}
