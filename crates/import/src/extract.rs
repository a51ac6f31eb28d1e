//! Data rows → 5-field records with provenance and derived lookup keys.

use serde::Serialize;
use tracing::debug;

use crate::config::ImportConfig;
use crate::header::{build_header_map, find_header_row, resolve_columns, ColumnResolution};
use crate::model::{CanonicalField, Provenance, Record, SheetGrid};
use crate::normalize::{collapse_whitespace, fill_header_blanks, fill_vertical_blanks, normalize_row};

/// Structural facts recovered from one sheet, surfaced even when the import is blocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetSummary {
    pub name: String,
    pub header_row: Option<usize>,
    /// Raw header cells after blank fill.
    pub headers: Vec<String>,
    /// Resolved header keys, `""` for ignored columns.
    pub header_map: Vec<String>,
    pub record_count: usize,
}

impl SheetSummary {
    pub fn skipped(&self) -> bool {
        self.header_row.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct SheetExtraction {
    pub summary: SheetSummary,
    pub resolution: ColumnResolution,
    pub records: Vec<Record>,
}

/// Extract every non-blank data row of one sheet.
pub fn extract_sheet(sheet: &SheetGrid, config: &ImportConfig) -> SheetExtraction {
    let grid: Vec<Vec<String>> = sheet.rows.iter().map(|r| normalize_row(r)).collect();

    let Some(header_idx) = find_header_row(&grid) else {
        debug!(sheet = %sheet.name, "blank sheet skipped");
        return SheetExtraction {
            summary: SheetSummary {
                name: sheet.name.clone(),
                header_row: None,
                headers: Vec::new(),
                header_map: Vec::new(),
                record_count: 0,
            },
            resolution: ColumnResolution::default(),
            records: Vec::new(),
        };
    };

    let raw_headers = &grid[header_idx];
    let header_map = build_header_map(raw_headers, &config.ignore_headers);
    let resolution = resolve_columns(&header_map);

    // Blank rows are dropped before the vertical fill so fill never revives them
    let mut offsets = Vec::new();
    let mut field_rows = Vec::new();
    for (offset, row) in grid[header_idx + 1..].iter().enumerate() {
        let fields: Vec<String> = CanonicalField::ALL
            .iter()
            .map(|f| read_field(row, resolution.columns(*f)))
            .collect();
        if fields.iter().all(|v| v.is_empty()) {
            continue;
        }
        offsets.push(offset);
        field_rows.push(fields);
    }

    let fill_cols: Vec<usize> = config.fill_down.iter().map(|f| f.index()).collect();
    let filled = fill_vertical_blanks(&field_rows, &fill_cols);

    let records: Vec<Record> = filled
        .into_iter()
        .zip(offsets)
        .map(|(fields, offset)| {
            build_record(
                fields,
                Provenance {
                    sheet_name: sheet.name.clone(),
                    row_idx: header_idx + 1 + offset,
                },
            )
        })
        .collect();

    debug!(
        sheet = %sheet.name,
        header_row = header_idx,
        records = records.len(),
        "sheet extracted"
    );

    SheetExtraction {
        summary: SheetSummary {
            name: sheet.name.clone(),
            header_row: Some(header_idx),
            headers: fill_header_blanks(raw_headers),
            header_map: header_map.keys,
            record_count: records.len(),
        },
        resolution,
        records,
    }
}

/// First non-blank value among the resolved columns.
fn read_field(row: &[String], columns: &[usize]) -> String {
    columns
        .iter()
        .filter_map(|&c| row.get(c))
        .find(|v| !v.is_empty())
        .cloned()
        .unwrap_or_default()
}

fn build_record(mut fields: Vec<String>, provenance: Provenance) -> Record {
    let mut take = |f: CanonicalField| std::mem::take(&mut fields[f.index()]);
    let name = take(CanonicalField::Name);
    let email = take(CanonicalField::Email);
    let phone = take(CanonicalField::Phone);
    let course = take(CanonicalField::Course);
    let place = take(CanonicalField::Place);

    Record {
        normalized_email: normalize_email(&email),
        normalized_phone: normalize_phone(&phone),
        name_course_place_key: name_course_place_key(&name, &course, &place),
        name,
        email,
        phone,
        course,
        place,
        provenance,
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn normalize_phone(phone: &str) -> String {
    phone.chars().filter(|c| !c.is_whitespace()).collect()
}

/// `name|course|place`, lowercased with collapsed whitespace. Blank parts stay empty.
pub fn name_course_place_key(name: &str, course: &str, place: &str) -> String {
    [name, course, place]
        .iter()
        .map(|p| collapse_whitespace(&p.to_lowercase()))
        .collect::<Vec<_>>()
        .join("|")
}
