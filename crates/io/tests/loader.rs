use std::fs;

use contactgrid_import::{CellValue, ImportConfig, PreviewSession};
use contactgrid_io::{load_workbook, LoadError};
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn csv_loads_as_single_sheet_named_after_file() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "batch-7.csv",
        b"Name,Email,Phone,Course,Place\nAnn Lee,ann@x.com,9876543210,Art,Goa\n",
    );
    let wb = load_workbook(&path).unwrap();
    assert_eq!(wb.sheets.len(), 1);
    assert_eq!(wb.sheets[0].name, "batch-7");
    assert_eq!(wb.sheets[0].rows[1][1], CellValue::Text("ann@x.com".into()));

    let session = PreviewSession::build(&wb, &ImportConfig::default());
    assert!(session.can_commit, "{}", session.message);
    assert_eq!(session.records[0].provenance.descriptor(), "batch-7 Row 2");
}

#[test]
fn semicolon_csv_with_bom() {
    let dir = TempDir::new().unwrap();
    let mut bytes = vec![0xEF, 0xBB, 0xBF];
    bytes.extend_from_slice(b"Name;Email\nAnn;ann@x.com\n");
    let path = write(&dir, "s.csv", &bytes);
    let wb = load_workbook(&path).unwrap();
    assert_eq!(wb.sheets[0].rows[0][0], CellValue::Text("Name".into()));
    assert_eq!(wb.sheets[0].rows[1].len(), 2);
}

#[test]
fn windows_1252_csv_is_decoded() {
    let dir = TempDir::new().unwrap();
    // "José" with 0xE9 for é
    let path = write(&dir, "legacy.csv", b"Name,Place\nJos\xe9,Goa\n");
    let wb = load_workbook(&path).unwrap();
    assert_eq!(wb.sheets[0].rows[1][0], CellValue::Text("José".into()));
}

#[test]
fn tsv_uses_tabs() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "t.tsv", b"Name\tEmail\nAnn, Lee\tann@x.com\n");
    let wb = load_workbook(&path).unwrap();
    assert_eq!(wb.sheets[0].rows[1][0], CellValue::Text("Ann, Lee".into()));
}

#[test]
fn unsupported_extension_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "contacts.pdf", b"%PDF");
    let err = load_workbook(&path).unwrap_err();
    assert!(matches!(err, LoadError::UnsupportedFormat(ref e) if e == "pdf"), "{err:?}");
}

#[test]
fn missing_csv_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = load_workbook(&dir.path().join("gone.csv")).unwrap_err();
    assert!(matches!(err, LoadError::Io(_)));
}

#[test]
fn xlsx_sheets_load_in_order_with_typed_cells() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("roster.xlsx");

    let mut book = rust_xlsxwriter::Workbook::new();
    let north = book.add_worksheet();
    north.set_name("North").unwrap();
    for (col, h) in ["Name", "Email", "Phone", "Course", "Place"].iter().enumerate() {
        north.write_string(0, col as u16, *h).unwrap();
    }
    north.write_string(1, 0, "Ann Lee").unwrap();
    north.write_string(1, 1, "ann@x.com").unwrap();
    north.write_number(1, 2, 9876543210.0).unwrap();
    north.write_string(1, 3, "Art").unwrap();
    north.write_string(1, 4, "Goa").unwrap();

    // Header starts at row 3, column B
    let south = book.add_worksheet();
    south.set_name("South").unwrap();
    for (col, h) in ["Name", "Email", "Phone", "Course", "Place"].iter().enumerate() {
        south.write_string(2, col as u16 + 1, *h).unwrap();
    }
    for (col, v) in ["Bob Ray", "bob@x.com", "9876543211", "Law", "Pune"].iter().enumerate() {
        south.write_string(3, col as u16 + 1, *v).unwrap();
    }
    book.save(&path).unwrap();

    let wb = load_workbook(&path).unwrap();
    let names: Vec<&str> = wb.sheets.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["North", "South"]);
    assert_eq!(wb.sheets[1].rows.len(), 4);
    assert_eq!(wb.sheets[1].rows[2][0], CellValue::Empty);

    let session = PreviewSession::build(&wb, &ImportConfig::default());
    assert!(session.can_commit, "{:?}", session.errors);
    assert_eq!(session.records[0].phone, "9876543210");
    assert_eq!(session.records[1].provenance.descriptor(), "South Row 4");
}

#[test]
fn csv_blank_lines_keep_file_line_numbers() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "c.csv",
        b"Name,Email,Phone,Course,Place\n\nAnn Lee,ann@x.com,9876543210,Art,Goa\n\nBob Ray,bob@x.com,9876543211,Law,Pune\n",
    );
    let wb = load_workbook(&path).unwrap();
    assert_eq!(wb.sheets[0].rows.len(), 5);

    let session = PreviewSession::build(&wb, &ImportConfig::default());
    assert!(session.can_commit, "{}", session.message);
    assert_eq!(session.records[0].provenance.descriptor(), "c Row 3");
    assert_eq!(session.records[1].provenance.descriptor(), "c Row 5");
}

#[test]
fn csv_blank_line_before_header() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "lead.csv",
        b"\nName,Email,Phone,Course,Place\nAnn Lee,ann@x.com,9876543210,Art,Goa\n",
    );
    let wb = load_workbook(&path).unwrap();
    let session = PreviewSession::build(&wb, &ImportConfig::default());
    assert_eq!(session.sheets[0].header_row, Some(1));
    assert_eq!(session.records[0].provenance.descriptor(), "lead Row 3");
}

#[test]
fn oversized_xlsx_fails_to_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("huge.xlsx");
    let mut book = rust_xlsxwriter::Workbook::new();
    let sheet = book.add_worksheet();
    for (col, h) in ["Name", "Email", "Phone", "Course", "Place"].iter().enumerate() {
        sheet.write_string(0, col as u16, *h).unwrap();
    }
    sheet.write_string(70_000, 0, "Ann Lee").unwrap();
    book.save(&path).unwrap();

    let err = load_workbook(&path).unwrap_err();
    assert!(matches!(err, LoadError::SheetTooLarge { rows: 70_001, .. }), "{err:?}");
    assert!(err.to_string().contains("65536"), "{err}");
}
