use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed CSV: {0}")]
    Csv(#[from] ::csv::Error),
    #[error("cannot open spreadsheet: {0}")]
    Excel(String),
    #[error("unsupported file type: '{0}' (expected csv, tsv, xlsx, xls, xlsb or ods)")]
    UnsupportedFormat(String),
    #[error("spreadsheet contains no sheets")]
    NoSheets,
    #[error("sheet '{sheet}' uses {rows} rows x {cols} columns; the import limit is {max_rows} x {max_cols}")]
    SheetTooLarge {
        sheet: String,
        rows: usize,
        cols: usize,
        max_rows: usize,
        max_cols: usize,
    },
}
