//! Cell, header and grid string normalization.
//!
//! Every function here is pure: inputs are borrowed, results are new values.

use crate::model::CellValue;

/// Coerce a raw cell to a trimmed string. Blank is `""`.
pub fn normalize_cell(value: &CellValue) -> String {
    match value {
        CellValue::Empty => String::new(),
        CellValue::Text(s) => s.trim().to_string(),
        CellValue::Int(n) => n.to_string(),
        CellValue::Float(n) => {
            // Integral floats render without decimals (phone numbers typed as numbers)
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                format!("{}", n)
            }
        }
        CellValue::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
    }
}

pub fn normalize_row(row: &[CellValue]) -> Vec<String> {
    row.iter().map(normalize_cell).collect()
}

/// Collapse every whitespace run to a single space and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Replace each blank header with the last non-blank header to its left.
///
/// Leading blanks (before any non-blank header) stay blank.
pub fn fill_header_blanks(headers: &[String]) -> Vec<String> {
    let mut last: Option<&str> = None;
    headers
        .iter()
        .map(|h| {
            if h.is_empty() {
                last.map(str::to_string).unwrap_or_default()
            } else {
                last = Some(h.as_str());
                h.clone()
            }
        })
        .collect()
}

/// Forward-fill blank cells downwards in the given columns.
///
/// Columns not listed in `fill_cols` are copied through untouched.
/// Rows shorter than a fill column are left as they are.
pub fn fill_vertical_blanks(rows: &[Vec<String>], fill_cols: &[usize]) -> Vec<Vec<String>> {
    let mut last: Vec<Option<String>> = vec![None; fill_cols.len()];
    rows.iter()
        .map(|row| {
            let mut out = row.clone();
            for (slot, &col) in fill_cols.iter().enumerate() {
                let Some(cell) = out.get_mut(col) else {
                    continue;
                };
                if cell.is_empty() {
                    if let Some(prev) = &last[slot] {
                        *cell = prev.clone();
                    }
                } else {
                    last[slot] = Some(cell.clone());
                }
            }
            out
        })
        .collect()
}
