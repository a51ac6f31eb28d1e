// CSV/TSV import

use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use contactgrid_import::header::{build_header_map, resolve_columns};
use contactgrid_import::{CanonicalField, CellValue, SheetGrid, Workbook};
use tracing::debug;

use crate::error::LoadError;

pub fn import(path: &Path) -> Result<Workbook, LoadError> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    import_from_string(&sheet_name_for(path), &content, delimiter)
}

pub fn import_tsv(path: &Path) -> Result<Workbook, LoadError> {
    let content = read_file_as_utf8(path)?;
    import_from_string(&sheet_name_for(path), &content, b'\t')
}

/// A CSV has no sheet names; the file stem stands in so row descriptors stay readable.
fn sheet_name_for(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("Sheet1")
        .to_string()
}

/// Pick the delimiter that splits the header line into the most recognised contact columns.
///
/// The header is the first non-blank line, matching how the preview finds it. Ties on
/// recognised columns go to the split with more cells, then to candidate order.
fn sniff_delimiter(content: &str) -> u8 {
    const CANDIDATES: [u8; 4] = [b',', b';', b'\t', b'|'];

    let Some(header_line) = content.lines().find(|l| !l.trim().is_empty()) else {
        return b',';
    };

    let mut best = b',';
    let mut best_score = (0usize, 0usize);
    for delim in CANDIDATES {
        let score = header_score(header_line, delim);
        if score > best_score {
            best_score = score;
            best = delim;
        }
    }
    debug!(delimiter = ?(best as char), recognised = best_score.0, cells = best_score.1, "delimiter sniffed");
    best
}

/// (distinct columns feeding a contact field, total cells) for one candidate split.
fn header_score(line: &str, delim: u8) -> (usize, usize) {
    let cells: Vec<String> = csv::ReaderBuilder::new()
        .delimiter(delim)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes())
        .records()
        .next()
        .and_then(|r| r.ok())
        .map(|r| r.iter().map(str::to_string).collect())
        .unwrap_or_default();

    // A single cell like "nameemail" resolves several fields by substring; count columns instead
    let resolution = resolve_columns(&build_header_map(&cells, &[]));
    let recognised: BTreeSet<usize> = CanonicalField::ALL
        .iter()
        .flat_map(|f| resolution.columns(*f).iter().copied())
        .collect();
    (recognised.len(), cells.len())
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, LoadError> {
    let mut file = std::fs::File::open(path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    // Excel "CSV UTF-8" exports carry a BOM
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        bytes.drain(..3);
    }

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            // Fall back to Windows-1252 (common for Excel-exported CSVs)
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

pub fn import_from_string(sheet_name: &str, content: &str, delimiter: u8) -> Result<Workbook, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows: Vec<Vec<CellValue>> = Vec::new();
    for result in reader.records() {
        let record = result?;
        // The reader skips empty lines; pad them back so grid row == file line - 1
        if let Some(pos) = record.position() {
            let line = pos.line() as usize;
            while rows.len() + 1 < line {
                rows.push(Vec::new());
            }
        }
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        CellValue::Empty
                    } else {
                        CellValue::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }

    Ok(Workbook {
        sheets: vec![SheetGrid::new(sheet_name, rows)],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_semicolons() {
        assert_eq!(sniff_delimiter("name;email;phone\nAnn;a@x.com;1\n"), b';');
        assert_eq!(sniff_delimiter("name,email\nAnn,a@x.com\n"), b',');
        assert_eq!(sniff_delimiter(""), b',');
    }

    #[test]
    fn sniff_prefers_recognised_headers_over_cell_count() {
        // Comma splits into more cells, but only semicolons separate the contact columns
        let content = "Name;Email;Place, District\nAnn;a@x.com;Goa, North\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn sniff_uses_first_non_blank_line() {
        assert_eq!(sniff_delimiter("\n\nName|Email|Phone\nAnn|a@x.com|1\n"), b'|');
    }

    #[test]
    fn sniff_falls_back_to_cell_count_for_unknown_headers() {
        assert_eq!(sniff_delimiter("Roll\tBatch\n1\t2\n"), b'\t');
        assert_eq!(sniff_delimiter("just one column\n"), b',');
    }

    #[test]
    fn blank_lines_kept_as_empty_rows() {
        let wb = import_from_string("S", "Name,Email\n\n\nAnn\n", b',').unwrap();
        let rows = &wb.sheets[0].rows;
        assert_eq!(rows.len(), 4);
        assert!(rows[1].is_empty());
        assert!(rows[2].is_empty());
        assert_eq!(rows[3], vec![CellValue::Text("Ann".into())]);
    }

    #[test]
    fn leading_blank_lines_shift_header() {
        let wb = import_from_string("S", "\nName\nAnn\n", b',').unwrap();
        let rows = &wb.sheets[0].rows;
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1], vec![CellValue::Text("Name".into())]);
    }

    #[test]
    fn sheet_name_from_stem() {
        assert_eq!(sheet_name_for(Path::new("/tmp/roster-2026.csv")), "roster-2026");
    }
}
