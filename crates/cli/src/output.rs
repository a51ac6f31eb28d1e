// Human-readable summaries. Always stderr; stdout is reserved for --json.

use std::path::Path;

use contactgrid_import::reconcile::Resolution;
use contactgrid_import::{CommitReport, PreviewSession};

pub fn print_preview(file: &Path, session: &PreviewSession) {
    let data_sheets = session.sheets.iter().filter(|s| !s.skipped()).count();
    eprintln!(
        "{}: {} sheet(s), {} with headers, {} record(s)",
        file.display(),
        session.sheets.len(),
        data_sheets,
        session.records.len()
    );

    for sheet in &session.sheets {
        match sheet.header_row {
            Some(row) => eprintln!(
                "  {:<20} header row {:<4} {} record(s)",
                sheet.name,
                row + 1,
                sheet.record_count
            ),
            None => eprintln!("  {:<20} skipped (no header row)", sheet.name),
        }
    }

    if !session.errors.is_empty() {
        eprintln!();
        for err in &session.errors {
            eprintln!(
                "  {:<24} {:<7} {:<10} {}",
                err.provenance.descriptor(),
                err.field,
                err.category,
                err.message
            );
        }
    }

    eprintln!();
    eprintln!("{}", session.message);
}

pub fn print_report(report: &CommitReport) {
    eprintln!(
        "submitted {}  inserted {}  modified {}  invalid {}  existing {}",
        report.submitted,
        report.inserted_count,
        report.modified_count,
        report.invalid_count,
        report.existing.items.len()
    );

    if report.existing.items.is_empty() {
        return;
    }

    eprintln!("Already existing: {}", report.existing_summary);
    for item in &report.existing.items {
        let how = match &item.resolution {
            Resolution::Matched { strategy, .. } => strategy.to_string(),
            Resolution::Unresolved => "unresolved".to_string(),
        };
        eprintln!("  {:<24} via {}", item.descriptor, how);
    }
    if report.existing.unresolved > 0 {
        eprintln!(
            "warning: {} existing row(s) could not be traced to a source row",
            report.existing.unresolved
        );
    }
}
