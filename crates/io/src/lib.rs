//! Workbook loading: raw files into sheet grids for the import pipeline.
//!
//! Decoding is this crate's concern only; the pipeline sees `Workbook`.

pub mod csv;
pub mod error;
pub mod xlsx;

use std::path::Path;

use contactgrid_import::Workbook;
use tracing::info;

pub use error::LoadError;

/// Load any supported file, choosing the decoder by extension.
pub fn load_workbook(path: &Path) -> Result<Workbook, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let workbook = match ext.as_str() {
        "csv" | "txt" => csv::import(path)?,
        "tsv" => csv::import_tsv(path)?,
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => xlsx::import(path)?,
        other => return Err(LoadError::UnsupportedFormat(other.to_string())),
    };

    info!(
        path = %path.display(),
        sheets = workbook.sheets.len(),
        "workbook loaded"
    );
    Ok(workbook)
}
