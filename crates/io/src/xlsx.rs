// Excel / OpenDocument import

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use contactgrid_import::{CellValue, SheetGrid, Workbook};
use tracing::{debug, warn};

use crate::error::LoadError;

/// Maximum used dimensions accepted for a sheet
pub const MAX_ROWS: usize = 65536;
pub const MAX_COLS: usize = 256;

/// Import every sheet of an Excel file (xlsx, xlsm, xls, xlsb, ods), in workbook order.
///
/// Row and column indices match the sheet: a used range that starts below A1
/// is padded with empty cells so provenance rows line up with what users see.
/// A sheet whose used range exceeds `MAX_ROWS` x `MAX_COLS` is an error.
pub fn import(path: &Path) -> Result<Workbook, LoadError> {
    let mut workbook: Sheets<_> = open_workbook_auto(path)
        .map_err(|e| LoadError::Excel(format!("failed to open workbook: {e}")))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    if sheet_names.is_empty() {
        return Err(LoadError::NoSheets);
    }

    let mut sheets = Vec::with_capacity(sheet_names.len());
    for sheet_name in &sheet_names {
        let range = workbook
            .worksheet_range(sheet_name)
            .map_err(|e| LoadError::Excel(format!("failed to read sheet '{sheet_name}': {e}")))?;

        let (height, width) = range.get_size();
        if height == 0 || width == 0 {
            debug!(sheet = %sheet_name, "empty sheet");
            sheets.push(SheetGrid::new(sheet_name, Vec::new()));
            continue;
        }

        // Range start offset (data may not begin at A1)
        let (start_row, start_col) = range.start().unwrap_or((0, 0));
        let (start_row, start_col) = (start_row as usize, start_col as usize);

        // Refuse rather than truncate: dropped rows would never be validated or submitted
        let (used_rows, used_cols) = (start_row + height, start_col + width);
        if used_rows > MAX_ROWS || used_cols > MAX_COLS {
            warn!(sheet = %sheet_name, rows = used_rows, cols = used_cols, "sheet exceeds import limits");
            return Err(LoadError::SheetTooLarge {
                sheet: sheet_name.clone(),
                rows: used_rows,
                cols: used_cols,
                max_rows: MAX_ROWS,
                max_cols: MAX_COLS,
            });
        }

        let mut rows: Vec<Vec<CellValue>> = vec![Vec::new(); start_row];
        for row in range.rows() {
            let mut cells = vec![CellValue::Empty; start_col];
            cells.extend(row.iter().map(cell_value));
            rows.push(cells);
        }

        debug!(sheet = %sheet_name, rows = rows.len(), "sheet read");
        sheets.push(SheetGrid::new(sheet_name, rows));
    }

    Ok(Workbook { sheets })
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) if s.is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(n) => CellValue::Float(*n),
        Data::Int(n) => CellValue::Int(*n),
        Data::Bool(b) => CellValue::Bool(*b),
        // Store error as text representation
        Data::Error(e) => CellValue::Text(format!("#{e:?}")),
        // Serial number; contact fields never carry dates meaningfully
        Data::DateTime(dt) => CellValue::Float(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}
