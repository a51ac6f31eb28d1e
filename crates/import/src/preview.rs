//! Preview aggregation: merge per-sheet extractions, gate structurally, run
//! validation and duplicate detection, then pick one summary message.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::ImportConfig;
use crate::duplicate::DuplicateDetector;
use crate::extract::{extract_sheet, SheetSummary};
use crate::model::{CanonicalField, ErrorCategory, Provenance, Record, SheetGrid, ValidationError, Workbook};
use crate::validate::{missing_columns, validate_record};

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Structural reason the import cannot proceed at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum BlockReason {
    NoHeaders,
    OnlyHeaders,
    MissingColumns { fields: Vec<CanonicalField> },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PreviewFlags {
    pub has_headers: bool,
    pub has_only_headers: bool,
    pub missing_columns: Vec<CanonicalField>,
    pub has_duplicates: bool,
    pub has_missing_values: bool,
    pub has_field_errors: bool,
}

/// Everything one Preview action produced. Replaced wholesale on the next preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewSession {
    pub sheets: Vec<SheetSummary>,
    pub records: Vec<Record>,
    pub errors: Vec<ValidationError>,
    pub flags: PreviewFlags,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked: Option<BlockReason>,
    pub message: String,
    pub can_commit: bool,
}

impl PreviewSession {
    /// Run the whole preview pipeline over a loaded workbook.
    pub fn build(workbook: &Workbook, config: &ImportConfig) -> Self {
        let mut builder = PreviewBuilder::default();
        for sheet in &workbook.sheets {
            builder.add_sheet(sheet, config);
        }
        builder.finish()
    }

    /// Errors attached to one source row.
    pub fn errors_for<'a>(&'a self, provenance: &'a Provenance) -> impl Iterator<Item = &'a ValidationError> + 'a {
        self.errors.iter().filter(move |e| &e.provenance == provenance)
    }

    pub fn error_count(&self, category: ErrorCategory) -> usize {
        self.errors.iter().filter(|e| e.category == category).count()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Per-preview mutable state. Created fresh for every preview and consumed by `finish`.
#[derive(Default)]
struct PreviewBuilder {
    sheets: Vec<SheetSummary>,
    records: Vec<Record>,
    resolved: BTreeSet<CanonicalField>,
    header_found: bool,
}

impl PreviewBuilder {
    fn add_sheet(&mut self, sheet: &SheetGrid, config: &ImportConfig) {
        let extraction = extract_sheet(sheet, config);
        if extraction.summary.header_row.is_some() {
            self.header_found = true;
            self.resolved.extend(extraction.resolution.resolved_fields());
        }
        self.sheets.push(extraction.summary);
        self.records.extend(extraction.records);
    }

    fn finish(self) -> PreviewSession {
        let mut flags = PreviewFlags {
            has_headers: self.header_found,
            ..Default::default()
        };

        let blocked = if !self.header_found {
            Some(BlockReason::NoHeaders)
        } else if self.records.is_empty() {
            flags.has_only_headers = true;
            Some(BlockReason::OnlyHeaders)
        } else {
            let missing = missing_columns(&self.resolved);
            if missing.is_empty() {
                None
            } else {
                flags.missing_columns = missing.clone();
                Some(BlockReason::MissingColumns { fields: missing })
            }
        };

        if let Some(reason) = blocked {
            let message = block_message(&reason);
            info!(sheets = self.sheets.len(), records = self.records.len(), %message, "preview blocked");
            return PreviewSession {
                sheets: self.sheets,
                records: self.records,
                errors: Vec::new(),
                flags,
                blocked: Some(reason),
                message,
                can_commit: false,
            };
        }

        let mut errors = Vec::new();
        let mut detector = DuplicateDetector::new();
        for record in &self.records {
            errors.extend(validate_record(record));
            errors.extend(detector.check(record));
        }

        flags.has_duplicates = errors.iter().any(|e| e.category == ErrorCategory::Duplicate);
        flags.has_missing_values = errors.iter().any(|e| e.category == ErrorCategory::Missing);
        flags.has_field_errors = errors.iter().any(|e| e.category == ErrorCategory::Format);

        let can_commit = !flags.has_duplicates && !flags.has_missing_values && !flags.has_field_errors;
        let message = summary_message(&flags).to_string();

        debug!(errors = errors.len(), "per-record checks complete");
        info!(
            sheets = self.sheets.len(),
            records = self.records.len(),
            can_commit,
            "preview built"
        );

        PreviewSession {
            sheets: self.sheets,
            records: self.records,
            errors,
            flags,
            blocked: None,
            message,
            can_commit,
        }
    }
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

fn block_message(reason: &BlockReason) -> String {
    match reason {
        BlockReason::NoHeaders => "No headers found in the uploaded file.".into(),
        BlockReason::OnlyHeaders => "Only headers found, no data rows to import.".into(),
        BlockReason::MissingColumns { fields } => {
            let names: Vec<&str> = fields.iter().map(|f| f.key()).collect();
            format!("Missing required columns: {}.", names.join(", "))
        }
    }
}

fn summary_message(flags: &PreviewFlags) -> &'static str {
    match (flags.has_duplicates, flags.has_missing_values, flags.has_field_errors) {
        (false, false, false) => "Ready to import: no issues found.",
        (true, false, false) => "Duplicate emails or phone numbers found. Remove them before importing.",
        (false, true, false) => "Some rows have missing values. Fill them in before importing.",
        (false, false, true) => "Some fields have invalid formats. Correct them before importing.",
        (true, true, false) => "Duplicates and missing values found. Fix them before importing.",
        (true, false, true) => "Duplicates and invalid formats found. Fix them before importing.",
        (false, true, true) => "Missing values and invalid formats found. Fix them before importing.",
        (true, true, true) => {
            "Duplicates, missing values and invalid formats found. Fix them before importing."
        }
    }
}
